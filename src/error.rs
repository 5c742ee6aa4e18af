use thiserror::Error;

/// Failure taxonomy surfaced to callers.
///
/// Library functions return `anyhow::Result` and attach one of these as the
/// root cause, so callers can branch with `err.downcast_ref::<SorterError>()`.
/// "No detection" is not an error; it is `None` from the detection adapter.
#[derive(Debug, Error)]
pub enum SorterError {
    /// The detection model could not be loaded. Fatal at startup.
    #[error("detection model unavailable: {0}")]
    ModelUnavailable(String),

    /// The capture device could not be opened or produce a frame.
    #[error("capture device failure: {0}")]
    CaptureFailure(String),

    /// The waste log could not be written or read.
    #[error("waste log storage failure: {0}")]
    StorageFailure(String),

    #[error("confidence threshold {0} is outside [0, 1]")]
    InvalidThreshold(f32),

    #[error("image decode failed: {0}")]
    Decode(String),
}

impl SorterError {
    /// Returns the taxonomy entry carried by an `anyhow::Error`, if any.
    pub fn of(err: &anyhow::Error) -> Option<&SorterError> {
        err.downcast_ref::<SorterError>()
    }
}

/// Rejects thresholds outside [0, 1] (including NaN).
pub fn validate_threshold(threshold: f32) -> Result<f32, SorterError> {
    if (0.0..=1.0).contains(&threshold) {
        Ok(threshold)
    } else {
        Err(SorterError::InvalidThreshold(threshold))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn threshold_bounds_are_inclusive() {
        assert!(validate_threshold(0.0).is_ok());
        assert!(validate_threshold(1.0).is_ok());
        assert!(validate_threshold(0.4).is_ok());
        assert!(validate_threshold(-0.01).is_err());
        assert!(validate_threshold(1.5).is_err());
        assert!(validate_threshold(f32::NAN).is_err());
    }

    #[test]
    fn taxonomy_survives_context() {
        let err = anyhow::Error::new(SorterError::CaptureFailure("unplugged".into()))
            .context("read frame from /dev/video0");
        assert!(matches!(
            SorterError::of(&err),
            Some(SorterError::CaptureFailure(_))
        ));
    }
}

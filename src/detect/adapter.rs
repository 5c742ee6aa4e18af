use anyhow::{Context, Result};

use crate::detect::backend::DetectorBackend;
use crate::detect::result::Detection;
use crate::error::validate_threshold;
use crate::frame::Frame;

/// Detections returned by one backend invocation.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DetectionOutcome {
    detections: Vec<Detection>,
}

impl DetectionOutcome {
    /// The detection that gets classified: index 0 of the backend's output.
    ///
    /// Later detections are only drawn, never classified or logged, so scenes
    /// with several items are undercounted.
    pub fn primary(&self) -> Option<&Detection> {
        self.detections.first()
    }

    /// Every detection, in backend order (for annotation).
    pub fn all(&self) -> &[Detection] {
        &self.detections
    }
}

/// Owns the detection backend handle for its whole lifetime.
///
/// Created once by the composition root and passed by `&mut` to whichever
/// mode is running.
pub struct DetectionAdapter {
    backend: Box<dyn DetectorBackend>,
}

impl DetectionAdapter {
    pub fn new<B: DetectorBackend + 'static>(backend: B) -> Self {
        Self {
            backend: Box::new(backend),
        }
    }

    pub fn from_boxed(backend: Box<dyn DetectorBackend>) -> Self {
        Self { backend }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Run the backend once. A backend failure is returned as-is; no retry.
    pub fn run(&mut self, frame: &Frame, confidence_threshold: f32) -> Result<DetectionOutcome> {
        let threshold = validate_threshold(confidence_threshold)?;
        let detections = self
            .backend
            .detect(frame, threshold)
            .with_context(|| format!("{} backend detection failed", self.backend.name()))?;
        log::debug!(
            "{} backend: {} detection(s) at conf>={:.2}",
            self.backend.name(),
            detections.len(),
            threshold
        );
        Ok(DetectionOutcome { detections })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detect::{BoundingBox, StubBackend};
    use crate::error::SorterError;
    use anyhow::anyhow;

    struct FailingBackend;

    impl DetectorBackend for FailingBackend {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn detect(&mut self, _frame: &Frame, _threshold: f32) -> Result<Vec<Detection>> {
            Err(anyhow!("model crashed"))
        }
    }

    fn frame() -> Frame {
        Frame::filled(8, 8, [0, 0, 0])
    }

    fn det(label: &str, confidence: f32) -> Detection {
        Detection {
            label: label.to_string(),
            confidence,
            bbox: BoundingBox::default(),
        }
    }

    #[test]
    fn only_first_detection_is_primary() -> Result<()> {
        let mut adapter = DetectionAdapter::new(StubBackend::new(vec![vec![
            det("paper", 0.6),
            det("plastic", 0.95),
        ]]));
        let outcome = adapter.run(&frame(), 0.4)?;
        assert_eq!(outcome.all().len(), 2);
        assert_eq!(outcome.primary().map(|d| d.label.as_str()), Some("paper"));
        Ok(())
    }

    #[test]
    fn zero_detections_is_none_not_error() -> Result<()> {
        let mut adapter = DetectionAdapter::new(StubBackend::empty());
        let outcome = adapter.run(&frame(), 0.4)?;
        assert!(outcome.all().is_empty());
        assert_eq!(outcome.primary(), None);
        Ok(())
    }

    #[test]
    fn backend_failure_surfaces() {
        let mut adapter = DetectionAdapter::new(FailingBackend);
        assert_eq!(adapter.backend_name(), "failing");
        let err = adapter.run(&frame(), 0.5).unwrap_err();
        assert!(format!("{:#}", err).contains("model crashed"));
    }

    #[test]
    fn threshold_outside_unit_range_is_rejected() {
        let mut adapter = DetectionAdapter::new(StubBackend::always("glass", 0.9));
        let err = adapter.run(&frame(), 1.2).unwrap_err();
        assert!(matches!(
            SorterError::of(&err),
            Some(SorterError::InvalidThreshold(_))
        ));
    }
}

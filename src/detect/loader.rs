use anyhow::Result;

use crate::detect::backend::DetectorBackend;
use crate::detect::backends::StubBackend;
use crate::error::SorterError;

/// What to load as the detection model.
#[derive(Clone, Debug)]
pub struct ModelSpec {
    /// ONNX file path, or a `stub://` script.
    pub path: String,
    /// Square model input edge in pixels.
    pub input_size: u32,
    /// Class names indexed by model output class id.
    pub class_names: Vec<String>,
}

/// Load and warm up the detection backend.
///
/// Any failure is reported as `SorterError::ModelUnavailable`; callers treat it
/// as fatal before processing anything.
pub fn load_backend(spec: &ModelSpec) -> Result<Box<dyn DetectorBackend>> {
    let mut backend = open_backend(spec)
        .map_err(|e| SorterError::ModelUnavailable(format!("{}: {:#}", spec.path, e)))?;
    backend
        .warm_up()
        .map_err(|e| SorterError::ModelUnavailable(format!("{} warm-up: {:#}", spec.path, e)))?;
    log::info!("loaded {} detector from {}", backend.name(), spec.path);
    Ok(backend)
}

fn open_backend(spec: &ModelSpec) -> Result<Box<dyn DetectorBackend>> {
    if spec.path.starts_with("stub://") {
        return Ok(Box::new(StubBackend::from_uri(&spec.path)?));
    }

    #[cfg(feature = "backend-tract")]
    {
        let backend = crate::detect::backends::TractBackend::new(
            &spec.path,
            spec.input_size,
            spec.class_names.clone(),
        )?;
        Ok(Box::new(backend))
    }
    #[cfg(not(feature = "backend-tract"))]
    {
        Err(anyhow::anyhow!(
            "ONNX models require the backend-tract feature"
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(path: &str) -> ModelSpec {
        ModelSpec {
            path: path.to_string(),
            input_size: 640,
            class_names: vec!["plastic".to_string()],
        }
    }

    #[test]
    fn stub_paths_load() -> Result<()> {
        let backend = load_backend(&spec("stub://plastic"))?;
        assert_eq!(backend.name(), "stub");
        Ok(())
    }

    #[test]
    fn missing_model_is_model_unavailable() {
        let err = load_backend(&spec("/nonexistent/best.onnx"))
            .err()
            .expect("missing model must fail");
        assert!(matches!(
            SorterError::of(&err),
            Some(SorterError::ModelUnavailable(_))
        ));
    }

    #[test]
    fn malformed_stub_is_model_unavailable() {
        let err = load_backend(&spec("stub://glass:2.0"))
            .err()
            .expect("bad stub script must fail");
        assert!(matches!(
            SorterError::of(&err),
            Some(SorterError::ModelUnavailable(_))
        ));
    }
}

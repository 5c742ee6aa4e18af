use anyhow::Result;

use crate::detect::result::Detection;
use crate::frame::Frame;

/// Detector backend trait.
///
/// A backend wraps a pretrained detection model and is treated as a black box:
/// it returns zero or more detections at or above `confidence_threshold`, in
/// whatever order the model produces. Callers only rely on index 0.
pub trait DetectorBackend {
    /// Backend identifier.
    fn name(&self) -> &'static str;

    /// Run detection on a frame.
    fn detect(&mut self, frame: &Frame, confidence_threshold: f32) -> Result<Vec<Detection>>;

    /// Optional warm-up hook, run once after loading.
    fn warm_up(&mut self) -> Result<()> {
        Ok(())
    }
}

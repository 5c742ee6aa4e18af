mod adapter;
mod backend;
mod backends;
mod loader;
mod result;

pub use adapter::{DetectionAdapter, DetectionOutcome};
pub use backend::DetectorBackend;
pub use backends::StubBackend;
#[cfg(feature = "backend-tract")]
pub use backends::TractBackend;
pub use loader::{load_backend, ModelSpec};
pub use result::{non_max_suppression, BoundingBox, Detection};

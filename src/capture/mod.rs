//! Camera capture devices.
//!
//! A `CaptureDevice` follows an open → read* → release lifecycle. Callers never
//! drive that lifecycle by hand: `CaptureGuard::acquire` opens the device and
//! releases it exactly once when the guard drops, on every exit path.
//!
//! Device strings:
//! - `stub://<name>[?frames=N][&open=fail]`: synthetic camera (tests, demos)
//! - `dir://<path>`: replays the JPEG/PNG files in a directory, in name order
//! - anything else: a V4L2 device node (feature: ingest-v4l2)

pub mod dir;
pub mod synthetic;
#[cfg(feature = "ingest-v4l2")]
pub mod v4l2;

use anyhow::Result;

use crate::error::SorterError;
use crate::frame::Frame;

pub use dir::ImageDirCamera;
pub use synthetic::SyntheticCamera;
#[cfg(feature = "ingest-v4l2")]
pub use v4l2::V4l2Camera;

/// Lifecycle counters for a capture device.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CaptureStats {
    pub frames_captured: u64,
    pub opens: u64,
    pub releases: u64,
    pub device: String,
}

pub trait CaptureDevice {
    fn name(&self) -> &str;

    /// Acquire the underlying device.
    fn open(&mut self) -> Result<()>;

    /// Capture the next frame. Only valid between `open` and `release`.
    fn read_frame(&mut self) -> Result<Frame>;

    /// Release the underlying device. Must tolerate being called when not open.
    fn release(&mut self);

    fn stats(&self) -> CaptureStats;
}

/// Exclusive, scoped ownership of an open capture device.
pub struct CaptureGuard<'d, D: CaptureDevice + ?Sized> {
    device: &'d mut D,
}

impl<'d, D: CaptureDevice + ?Sized> CaptureGuard<'d, D> {
    /// Open the device. On failure nothing is held and nothing is released.
    pub fn acquire(device: &'d mut D) -> Result<Self> {
        let name = device.name().to_string();
        if let Err(e) = device.open() {
            return Err(SorterError::CaptureFailure(format!("open {}: {:#}", name, e)).into());
        }
        log::info!("capture device {} acquired", name);
        Ok(Self { device })
    }

    pub fn read_frame(&mut self) -> Result<Frame> {
        match self.device.read_frame() {
            Ok(frame) => Ok(frame),
            Err(e) => Err(
                SorterError::CaptureFailure(format!("read {}: {:#}", self.device.name(), e)).into(),
            ),
        }
    }

    pub fn stats(&self) -> CaptureStats {
        self.device.stats()
    }
}

impl<D: CaptureDevice + ?Sized> Drop for CaptureGuard<'_, D> {
    fn drop(&mut self) {
        self.device.release();
        log::info!("capture device {} released", self.device.name());
    }
}

/// Build a capture device from a device string (see module docs).
pub fn open_camera(device: &str, width: u32, height: u32) -> Result<Box<dyn CaptureDevice>> {
    if device.starts_with("stub://") {
        return Ok(Box::new(SyntheticCamera::from_uri(device, width, height)?));
    }
    if let Some(path) = device.strip_prefix("dir://") {
        return Ok(Box::new(ImageDirCamera::new(path)));
    }

    #[cfg(feature = "ingest-v4l2")]
    {
        Ok(Box::new(V4l2Camera::new(v4l2::V4l2Config {
            device: device.to_string(),
            width,
            height,
            ..v4l2::V4l2Config::default()
        })))
    }
    #[cfg(not(feature = "ingest-v4l2"))]
    {
        let _ = (width, height);
        Err(SorterError::CaptureFailure(format!(
            "{} needs the ingest-v4l2 feature (or use stub:// / dir://)",
            device
        ))
        .into())
    }
}

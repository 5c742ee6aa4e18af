//! V4L2 camera.
//!
//! Captures RGB frames from a local device node (e.g. /dev/video0) through
//! memory-mapped buffers. The device is opened lazily in `open` and the stream
//! and device handle are dropped in `release`.

use anyhow::{anyhow, Context, Result};
use ouroboros::self_referencing;

use super::{CaptureDevice, CaptureStats};
use crate::frame::Frame;

/// Configuration for a V4L2 camera.
#[derive(Clone, Debug)]
pub struct V4l2Config {
    /// Device path (e.g., "/dev/video0")
    pub device: String,
    /// Requested frame rate. 0 leaves the driver default.
    pub target_fps: u32,
    /// Preferred frame width.
    pub width: u32,
    /// Preferred frame height.
    pub height: u32,
}

impl Default for V4l2Config {
    fn default() -> Self {
        Self {
            device: "/dev/video0".to_string(),
            target_fps: 10,
            width: 640,
            height: 480,
        }
    }
}

pub struct V4l2Camera {
    config: V4l2Config,
    state: Option<V4l2State>,
    active_width: u32,
    active_height: u32,
    stats: CaptureStats,
}

#[self_referencing]
struct V4l2State {
    device: v4l::Device,
    #[borrows(mut device)]
    #[covariant]
    stream: v4l::prelude::MmapStream<'this, v4l::Device>,
}

impl V4l2Camera {
    pub fn new(config: V4l2Config) -> Self {
        Self {
            active_width: config.width,
            active_height: config.height,
            stats: CaptureStats {
                device: config.device.clone(),
                ..CaptureStats::default()
            },
            config,
            state: None,
        }
    }
}

impl CaptureDevice for V4l2Camera {
    fn name(&self) -> &str {
        &self.config.device
    }

    fn open(&mut self) -> Result<()> {
        use v4l::buffer::Type;
        use v4l::video::Capture;

        let device = v4l::Device::with_path(&self.config.device)
            .with_context(|| format!("open v4l2 device {}", self.config.device))?;
        let mut format = device.format().context("read v4l2 format")?;
        format.width = self.config.width;
        format.height = self.config.height;
        format.fourcc = v4l::FourCC::new(b"RGB3");

        let format = match device.set_format(&format) {
            Ok(format) => format,
            Err(err) => {
                log::warn!(
                    "V4l2Camera: failed to set format on {}: {}",
                    self.config.device,
                    err
                );
                device
                    .format()
                    .context("read v4l2 format after set failure")?
            }
        };
        if format.fourcc != v4l::FourCC::new(b"RGB3") {
            return Err(anyhow!(
                "{} does not deliver RGB3 frames (got {})",
                self.config.device,
                format.fourcc
            ));
        }

        if self.config.target_fps > 0 {
            let params = v4l::video::capture::Parameters::with_fps(self.config.target_fps);
            if let Err(err) = device.set_params(&params) {
                log::warn!(
                    "V4l2Camera: failed to set fps on {}: {}",
                    self.config.device,
                    err
                );
            }
        }

        self.active_width = format.width;
        self.active_height = format.height;

        let state = V4l2StateTryBuilder {
            device,
            stream_builder: |device| {
                v4l::prelude::MmapStream::with_buffers(device, Type::VideoCapture, 4)
                    .map_err(|err| anyhow::Error::new(err).context("create v4l2 buffer stream"))
            },
        }
        .try_build()?;
        self.state = Some(state);
        self.stats.opens += 1;

        log::info!(
            "V4l2Camera: opened {} ({}x{})",
            self.config.device,
            self.active_width,
            self.active_height
        );
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Frame> {
        use v4l::io::traits::CaptureStream;

        let state = self.state.as_mut().context("v4l2 device not open")?;
        let pixels = state.with_stream_mut(|stream| {
            stream
                .next()
                .map(|(buf, _meta)| buf.to_vec())
                .map_err(|err| anyhow::Error::new(err).context("capture v4l2 frame"))
        })?;

        let frame = Frame::from_rgb(pixels, self.active_width, self.active_height)?;
        self.stats.frames_captured += 1;
        Ok(frame)
    }

    fn release(&mut self) {
        if self.state.take().is_some() {
            self.stats.releases += 1;
            log::info!("V4l2Camera: released {}", self.config.device);
        }
    }

    fn stats(&self) -> CaptureStats {
        self.stats.clone()
    }
}

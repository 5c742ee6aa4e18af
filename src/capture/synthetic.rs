//! Synthetic camera for tests and demos.
//!
//! `stub://<name>` produces patterned frames forever. Query options:
//! - `frames=N`: reads fail after N frames (an unplugged camera)
//! - `open=fail`: `open` fails (camera busy or missing)

use anyhow::{anyhow, Result};

use super::{CaptureDevice, CaptureStats};
use crate::frame::Frame;

pub struct SyntheticCamera {
    uri: String,
    width: u32,
    height: u32,
    frame_limit: Option<u64>,
    fail_open: bool,
    is_open: bool,
    stats: CaptureStats,
    scene_state: u8,
}

impl SyntheticCamera {
    pub fn from_uri(uri: &str, width: u32, height: u32) -> Result<Self> {
        let rest = uri
            .strip_prefix("stub://")
            .ok_or_else(|| anyhow!("synthetic camera uri must start with stub://"))?;
        if width == 0 || height == 0 {
            return Err(anyhow!("synthetic camera size must be non-zero"));
        }
        let (_, query) = rest.split_once('?').unwrap_or((rest, ""));

        let mut frame_limit = None;
        let mut fail_open = false;
        for pair in query.split('&').filter(|p| !p.is_empty()) {
            match pair.split_once('=') {
                Some(("frames", n)) => {
                    frame_limit = Some(
                        n.parse()
                            .map_err(|_| anyhow!("invalid frames={} in {}", n, uri))?,
                    );
                }
                Some(("open", "fail")) => fail_open = true,
                _ => return Err(anyhow!("unknown synthetic camera option '{}'", pair)),
            }
        }

        Ok(Self {
            uri: uri.to_string(),
            width,
            height,
            frame_limit,
            fail_open,
            is_open: false,
            stats: CaptureStats {
                device: uri.to_string(),
                ..CaptureStats::default()
            },
            scene_state: 0,
        })
    }

    /// Simulates a scene that changes every 50 frames.
    fn generate_pixels(&mut self) -> Vec<u8> {
        let count = self.stats.frames_captured;
        if count % 50 == 0 {
            self.scene_state = self.scene_state.wrapping_add(1);
        }
        let pixel_count = self.width as usize * self.height as usize * 3;
        (0..pixel_count)
            .map(|i| ((i as u64 + count + self.scene_state as u64) % 256) as u8)
            .collect()
    }
}

impl CaptureDevice for SyntheticCamera {
    fn name(&self) -> &str {
        &self.uri
    }

    fn open(&mut self) -> Result<()> {
        if self.fail_open {
            return Err(anyhow!("{} is unavailable", self.uri));
        }
        self.is_open = true;
        self.stats.opens += 1;
        log::info!("SyntheticCamera: opened {} ({}x{})", self.uri, self.width, self.height);
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Frame> {
        if !self.is_open {
            return Err(anyhow!("{} is not open", self.uri));
        }
        if let Some(limit) = self.frame_limit {
            if self.stats.frames_captured >= limit {
                return Err(anyhow!("{} stopped producing frames", self.uri));
            }
        }
        let pixels = self.generate_pixels();
        self.stats.frames_captured += 1;
        Frame::from_rgb(pixels, self.width, self.height)
    }

    fn release(&mut self) {
        if self.is_open {
            self.is_open = false;
            self.stats.releases += 1;
        }
    }

    fn stats(&self) -> CaptureStats {
        self.stats.clone()
    }
}

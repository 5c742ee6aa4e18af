//! Image-directory camera.
//!
//! Replays the JPEG/PNG files of a local directory as camera frames, in file
//! name order. When the files run out, reads fail like an unplugged camera.
//! Only local paths are accepted; URL schemes are rejected.

use anyhow::{anyhow, Context, Result};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use super::{CaptureDevice, CaptureStats};
use crate::frame::Frame;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

pub struct ImageDirCamera {
    dir: PathBuf,
    label: String,
    pending: Option<VecDeque<PathBuf>>,
    stats: CaptureStats,
}

impl ImageDirCamera {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        let dir = dir.as_ref().to_path_buf();
        let label = dir.display().to_string();
        Self {
            stats: CaptureStats {
                device: label.clone(),
                ..CaptureStats::default()
            },
            dir,
            label,
            pending: None,
        }
    }

    fn list_images(&self) -> Result<VecDeque<PathBuf>> {
        let mut files: Vec<PathBuf> = std::fs::read_dir(&self.dir)
            .with_context(|| format!("list {}", self.dir.display()))?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && is_image_path(path))
            .collect();
        files.sort();
        Ok(files.into())
    }
}

impl CaptureDevice for ImageDirCamera {
    fn name(&self) -> &str {
        &self.label
    }

    fn open(&mut self) -> Result<()> {
        if self.label.contains("://") {
            return Err(anyhow!(
                "image directory capture only supports local paths (no URL schemes)"
            ));
        }
        let files = self.list_images()?;
        if files.is_empty() {
            return Err(anyhow!("no JPEG/PNG files in {}", self.dir.display()));
        }
        log::info!(
            "ImageDirCamera: opened {} ({} images)",
            self.dir.display(),
            files.len()
        );
        self.pending = Some(files);
        self.stats.opens += 1;
        Ok(())
    }

    fn read_frame(&mut self) -> Result<Frame> {
        let pending = self
            .pending
            .as_mut()
            .ok_or_else(|| anyhow!("{} is not open", self.label))?;
        let path = pending
            .pop_front()
            .ok_or_else(|| anyhow!("no more images in {}", self.dir.display()))?;
        let frame = Frame::open(&path)?;
        self.stats.frames_captured += 1;
        Ok(frame)
    }

    fn release(&mut self) {
        if self.pending.take().is_some() {
            self.stats.releases += 1;
        }
    }

    fn stats(&self) -> CaptureStats {
        self.stats.clone()
    }
}

fn is_image_path(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn replays_images_in_name_order_then_fails() -> Result<()> {
        let dir = tempfile::tempdir()?;
        Frame::filled(4, 4, [255, 0, 0]).save(dir.path().join("b.png"))?;
        Frame::filled(6, 2, [0, 255, 0]).save(dir.path().join("a.png"))?;
        std::fs::write(dir.path().join("notes.txt"), "ignored")?;

        let mut camera = ImageDirCamera::new(dir.path());
        camera.open()?;
        let first = camera.read_frame()?;
        let second = camera.read_frame()?;
        assert_eq!((first.width, first.height), (6, 2));
        assert_eq!((second.width, second.height), (4, 4));
        assert!(camera.read_frame().is_err());

        camera.release();
        assert_eq!(camera.stats().releases, 1);
        assert_eq!(camera.stats().frames_captured, 2);
        Ok(())
    }

    #[test]
    fn empty_directory_cannot_open() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let mut camera = ImageDirCamera::new(dir.path());
        assert!(camera.open().is_err());
        camera.release();
        assert_eq!(camera.stats().releases, 0);
        Ok(())
    }

    #[test]
    fn url_paths_are_rejected() {
        let mut camera = ImageDirCamera::new("http://example.com/frames");
        assert!(camera.open().is_err());
    }
}

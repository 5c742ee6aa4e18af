//! Owned image frames.
//!
//! - `Frame`: RGB8 pixel buffer produced by uploads, camera snapshots and live capture.
//! - Decoding of uploaded JPEG/PNG bytes.
//! - `Frame::annotated`: a copy with detection boxes drawn, handed to the display sink.
//!
//! Frames are never persisted by the pipeline; only the classification result
//! reaches the waste log.

use anyhow::{anyhow, Context, Result};
use image::RgbImage;
use std::path::Path;

use crate::detect::{BoundingBox, Detection};
use crate::error::SorterError;

/// Outline color for the primary (first) detection.
const PRIMARY_BOX_COLOR: [u8; 3] = [0, 200, 80];
/// Outline color for every other detection.
const SECONDARY_BOX_COLOR: [u8; 3] = [230, 160, 0];
const BOX_THICKNESS: u32 = 2;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    pixels: Vec<u8>,
    pub width: u32,
    pub height: u32,
}

impl Frame {
    /// Wrap tightly packed RGB8 pixels.
    pub fn from_rgb(pixels: Vec<u8>, width: u32, height: u32) -> Result<Self> {
        let expected_len = rgb_len(width, height)?;
        if pixels.len() != expected_len {
            return Err(anyhow!(
                "expected {} RGB bytes, received {}",
                expected_len,
                pixels.len()
            ));
        }
        Ok(Self {
            pixels,
            width,
            height,
        })
    }

    /// Solid-color frame.
    pub fn filled(width: u32, height: u32, color: [u8; 3]) -> Self {
        let pixels = color
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 3)
            .collect();
        Self {
            pixels,
            width,
            height,
        }
    }

    pub fn from_image(image: RgbImage) -> Self {
        let (width, height) = image.dimensions();
        Self {
            pixels: image.into_raw(),
            width,
            height,
        }
    }

    /// Decode an encoded image (JPEG or PNG) into RGB8.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let decoded =
            image::load_from_memory(bytes).map_err(|e| SorterError::Decode(e.to_string()))?;
        Ok(Self::from_image(decoded.to_rgb8()))
    }

    /// Read and decode an image file.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let bytes =
            std::fs::read(path).with_context(|| format!("read image {}", path.display()))?;
        Self::decode(&bytes).with_context(|| format!("decode image {}", path.display()))
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn to_image(&self) -> Result<RgbImage> {
        RgbImage::from_raw(self.width, self.height, self.pixels.clone())
            .ok_or_else(|| anyhow!("frame buffer does not match {}x{}", self.width, self.height))
    }

    /// Encode to disk; the format follows the file extension.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        self.to_image()?
            .save(path)
            .with_context(|| format!("write frame to {}", path.display()))
    }

    /// Copy of this frame with detection outlines drawn.
    ///
    /// The first detection is drawn in the primary color since it is the one
    /// that gets classified.
    pub fn annotated(&self, detections: &[Detection]) -> Frame {
        let mut out = self.clone();
        for (index, detection) in detections.iter().enumerate() {
            let color = if index == 0 {
                PRIMARY_BOX_COLOR
            } else {
                SECONDARY_BOX_COLOR
            };
            out.draw_outline(&detection.bbox, color);
        }
        out
    }

    fn draw_outline(&mut self, bbox: &BoundingBox, color: [u8; 3]) {
        if self.width == 0 || self.height == 0 {
            return;
        }
        let Some((x0, y0, x1, y1)) = bbox.to_pixels(self.width, self.height) else {
            return;
        };
        for t in 0..BOX_THICKNESS {
            let top = (y0 + t).min(y1);
            let bottom = y1.saturating_sub(t).max(y0);
            let left = (x0 + t).min(x1);
            let right = x1.saturating_sub(t).max(x0);
            for x in x0..=x1 {
                self.put_pixel(x, top, color);
                self.put_pixel(x, bottom, color);
            }
            for y in y0..=y1 {
                self.put_pixel(left, y, color);
                self.put_pixel(right, y, color);
            }
        }
    }

    fn put_pixel(&mut self, x: u32, y: u32, color: [u8; 3]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let idx = (y as usize * self.width as usize + x as usize) * 3;
        self.pixels[idx..idx + 3].copy_from_slice(&color);
    }

    #[cfg(test)]
    fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
        let idx = (y as usize * self.width as usize + x as usize) * 3;
        [self.pixels[idx], self.pixels[idx + 1], self.pixels[idx + 2]]
    }
}

fn rgb_len(width: u32, height: u32) -> Result<usize> {
    (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(3))
        .ok_or_else(|| anyhow!("frame dimensions overflow"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detection(label: &str, bbox: BoundingBox) -> Detection {
        Detection {
            label: label.to_string(),
            confidence: 0.9,
            bbox,
        }
    }

    #[test]
    fn from_rgb_rejects_wrong_length() {
        assert!(Frame::from_rgb(vec![0u8; 12], 2, 2).is_ok());
        assert!(Frame::from_rgb(vec![0u8; 11], 2, 2).is_err());
    }

    #[test]
    fn annotation_draws_primary_outline_without_touching_source() {
        let frame = Frame::filled(20, 10, [0, 0, 0]);
        let bbox = BoundingBox {
            x: 0.25,
            y: 0.2,
            w: 0.5,
            h: 0.6,
        };
        let annotated = frame.annotated(&[detection("plastic", bbox)]);

        assert_eq!(frame.pixel(5, 2), [0, 0, 0]);
        assert_eq!(annotated.pixel(5, 2), PRIMARY_BOX_COLOR);
        // interior stays untouched
        assert_eq!(annotated.pixel(10, 5), [0, 0, 0]);
    }

    #[test]
    fn annotation_clamps_boxes_outside_the_frame() {
        let frame = Frame::filled(8, 8, [10, 10, 10]);
        let bbox = BoundingBox {
            x: -0.5,
            y: 0.5,
            w: 2.0,
            h: 2.0,
        };
        let annotated = frame.annotated(&[detection("glass", bbox)]);
        assert_eq!(annotated.width, 8);
        assert_eq!(annotated.pixels().len(), frame.pixels().len());
        assert_eq!(annotated.pixel(0, 7), PRIMARY_BOX_COLOR);
    }

    #[test]
    fn decode_rejects_garbage() {
        let err = Frame::decode(b"definitely not a jpeg").unwrap_err();
        assert!(matches!(
            SorterError::of(&err),
            Some(SorterError::Decode(_))
        ));
    }

    #[test]
    fn png_round_trip_through_disk() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("frame.png");
        let frame = Frame::filled(4, 3, [1, 2, 3]);
        frame.save(&path)?;
        let loaded = Frame::open(&path)?;
        assert_eq!(loaded, frame);
        Ok(())
    }
}

/// One candidate object found in a frame.
#[derive(Clone, Debug, PartialEq)]
pub struct Detection {
    /// Class label as reported by the model (not normalized).
    pub label: String,
    pub confidence: f32,
    /// Only used to annotate frames for display.
    pub bbox: BoundingBox,
}

/// Axis-aligned box in normalized 0..1 coordinates (top-left origin).
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BoundingBox {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl BoundingBox {
    pub fn from_center(cx: f32, cy: f32, w: f32, h: f32) -> Self {
        Self {
            x: cx - w / 2.0,
            y: cy - h / 2.0,
            w,
            h,
        }
    }

    pub fn area(&self) -> f32 {
        self.w.max(0.0) * self.h.max(0.0)
    }

    pub fn intersection(&self, other: &BoundingBox) -> f32 {
        let x1 = self.x.max(other.x);
        let y1 = self.y.max(other.y);
        let x2 = (self.x + self.w).min(other.x + other.w);
        let y2 = (self.y + self.h).min(other.y + other.h);
        (x2 - x1).max(0.0) * (y2 - y1).max(0.0)
    }

    pub fn iou(&self, other: &BoundingBox) -> f32 {
        let union = self.area() + other.area() - self.intersection(other);
        if union <= 0.0 {
            0.0
        } else {
            self.intersection(other) / union
        }
    }

    /// Inclusive pixel corners clamped to a `width`x`height` frame.
    ///
    /// Returns `None` for non-finite or empty boxes.
    pub fn to_pixels(&self, width: u32, height: u32) -> Option<(u32, u32, u32, u32)> {
        if width == 0 || height == 0 {
            return None;
        }
        if ![self.x, self.y, self.w, self.h].iter().all(|v| v.is_finite()) {
            return None;
        }
        if self.w <= 0.0 || self.h <= 0.0 {
            return None;
        }
        let clamp = |v: f32, max: u32| -> u32 { (v.max(0.0) as u32).min(max - 1) };
        let x0 = clamp((self.x * width as f32).floor(), width);
        let y0 = clamp((self.y * height as f32).floor(), height);
        let x1 = clamp(((self.x + self.w) * width as f32).round() - 1.0, width);
        let y1 = clamp(((self.y + self.h) * height as f32).round() - 1.0, height);
        if x1 < x0 || y1 < y0 {
            return None;
        }
        Some((x0, y0, x1, y1))
    }
}

/// Greedy non-maximum suppression.
///
/// Output is sorted by descending confidence; a box is dropped when it overlaps
/// an already kept box of the same label by more than `iou_threshold`.
pub fn non_max_suppression(mut detections: Vec<Detection>, iou_threshold: f32) -> Vec<Detection> {
    detections.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
    let mut kept: Vec<Detection> = Vec::with_capacity(detections.len());
    for candidate in detections {
        let suppressed = kept
            .iter()
            .any(|k| k.label == candidate.label && k.bbox.iou(&candidate.bbox) > iou_threshold);
        if !suppressed {
            kept.push(candidate);
        }
    }
    kept
}

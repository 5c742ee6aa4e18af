#![cfg(feature = "backend-tract")]

use std::path::Path;

use anyhow::{anyhow, Context, Result};
use image::imageops::FilterType;
use tract_onnx::prelude::*;

use crate::detect::backend::DetectorBackend;
use crate::detect::result::{non_max_suppression, BoundingBox, Detection};
use crate::frame::Frame;

const NMS_IOU_THRESHOLD: f32 = 0.45;

/// Tract-based backend for YOLOv8-style ONNX detection models.
///
/// The model takes a `[1, 3, size, size]` RGB tensor scaled to 0..1 and emits
/// `[1, 4 + classes, anchors]` (see `decode_yolo_output`).
pub struct TractBackend {
    model: TypedRunnableModel<TypedModel>,
    input_size: u32,
    class_names: Vec<String>,
}

impl TractBackend {
    /// Load an ONNX model from disk and prepare it for inference.
    pub fn new<P: AsRef<Path>>(
        model_path: P,
        input_size: u32,
        class_names: Vec<String>,
    ) -> Result<Self> {
        let model_path = model_path.as_ref();
        if input_size == 0 {
            return Err(anyhow!("model input size must be > 0"));
        }
        let size = input_size as usize;
        let input_fact = InferenceFact::dt_shape(f32::datum_type(), tvec!(1, 3, size, size));
        let model = tract_onnx::onnx()
            .model_for_path(model_path)
            .with_context(|| format!("failed to load ONNX model from {}", model_path.display()))?
            .with_input_fact(0, input_fact)
            .context("failed to set input fact")?
            .into_optimized()
            .context("failed to optimize ONNX model")?
            .into_runnable()
            .context("failed to build runnable ONNX model")?;

        Ok(Self {
            model,
            input_size,
            class_names,
        })
    }

    fn build_input(&self, frame: &Frame) -> Result<Tensor> {
        let resized = image::imageops::resize(
            &frame.to_image()?,
            self.input_size,
            self.input_size,
            FilterType::Triangle,
        );
        let size = self.input_size as usize;
        let input = tract_ndarray::Array4::from_shape_fn((1, 3, size, size), |(_, channel, y, x)| {
            resized.get_pixel(x as u32, y as u32)[channel] as f32 / 255.0
        });
        Ok(input.into_tensor())
    }
}

impl DetectorBackend for TractBackend {
    fn name(&self) -> &'static str {
        "tract"
    }

    fn detect(&mut self, frame: &Frame, confidence_threshold: f32) -> Result<Vec<Detection>> {
        let input = self.build_input(frame)?;
        let outputs = self
            .model
            .run(tvec!(input.into()))
            .context("ONNX inference failed")?;
        let output = outputs
            .first()
            .ok_or_else(|| anyhow!("model produced no outputs"))?;
        let view = output
            .to_array_view::<f32>()
            .context("model output tensor was not f32")?
            .into_dimensionality::<tract_ndarray::Ix3>()
            .context("model output was not [batch, rows, anchors]")?;
        decode_yolo_output(
            view,
            self.input_size,
            &self.class_names,
            confidence_threshold,
            NMS_IOU_THRESHOLD,
        )
    }

    fn warm_up(&mut self) -> Result<()> {
        let blank = Frame::filled(self.input_size, self.input_size, [114, 114, 114]);
        self.detect(&blank, 1.0).map(|_| ())
    }
}

/// Decode a YOLOv8 `[1, 4 + classes, anchors]` output.
///
/// Rows 0..4 hold box center and size in input pixels, the remaining rows hold
/// per-class scores. Each anchor keeps its best class; anchors below
/// `threshold` or with non-finite scores are dropped, then NMS runs per label.
/// Class ids past `class_names` are labelled `class_<id>`.
pub fn decode_yolo_output(
    view: tract_ndarray::ArrayView3<f32>,
    input_size: u32,
    class_names: &[String],
    threshold: f32,
    iou_threshold: f32,
) -> Result<Vec<Detection>> {
    let (_, rows, anchors) = view.dim();
    if rows <= 4 {
        return Err(anyhow!("model output has {} rows, expected 4 + classes", rows));
    }
    let scale = input_size as f32;
    let mut detections = Vec::new();
    for anchor in 0..anchors {
        let mut best_class = 0usize;
        let mut best_score = f32::NEG_INFINITY;
        for class in 0..rows - 4 {
            let score = view[[0, 4 + class, anchor]];
            if score > best_score {
                best_score = score;
                best_class = class;
            }
        }
        if !best_score.is_finite() || best_score < threshold {
            continue;
        }
        let bbox = BoundingBox::from_center(
            view[[0, 0, anchor]] / scale,
            view[[0, 1, anchor]] / scale,
            view[[0, 2, anchor]] / scale,
            view[[0, 3, anchor]] / scale,
        );
        let label = class_names
            .get(best_class)
            .cloned()
            .unwrap_or_else(|| format!("class_{}", best_class));
        detections.push(Detection {
            label,
            confidence: best_score,
            bbox,
        });
    }
    Ok(non_max_suppression(detections, iou_threshold))
}

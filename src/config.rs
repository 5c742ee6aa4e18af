use anyhow::{anyhow, Result};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::animation::{BIODEGRADABLE_ANIMATION_URL, NON_BIODEGRADABLE_ANIMATION_URL};
use crate::detect::ModelSpec;
use crate::error::validate_threshold;
use crate::live::LIVE_CONFIDENCE;
use crate::pipeline::DEFAULT_IMAGE_CONFIDENCE;

const DEFAULT_DB_PATH: &str = "waste_data.db";
const DEFAULT_MODEL_PATH: &str = "models/best.onnx";
const DEFAULT_MODEL_INPUT_SIZE: u32 = 640;
const DEFAULT_CAMERA_DEVICE: &str = "/dev/video0";
const DEFAULT_CAMERA_WIDTH: u32 = 640;
const DEFAULT_CAMERA_HEIGHT: u32 = 480;
const DEFAULT_ANIMATION_TIMEOUT_SECS: u64 = 5;

/// Output classes of the bundled model, in class-id order.
pub const DEFAULT_CLASS_NAMES: &[&str] = &[
    "battery",
    "biological",
    "cardboard",
    "clothes",
    "glass",
    "metal",
    "paper",
    "plastic",
    "shoes",
    "trash",
];

#[derive(Debug, Deserialize, Default)]
struct SorterConfigFile {
    db_path: Option<String>,
    upload_confidence: Option<f32>,
    live_confidence: Option<f32>,
    model: Option<ModelConfigFile>,
    camera: Option<CameraConfigFile>,
    animations: Option<AnimationConfigFile>,
}

#[derive(Debug, Deserialize, Default)]
struct ModelConfigFile {
    path: Option<String>,
    input_size: Option<u32>,
    class_names: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Default)]
struct CameraConfigFile {
    device: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize, Default)]
struct AnimationConfigFile {
    enabled: Option<bool>,
    biodegradable_url: Option<String>,
    non_biodegradable_url: Option<String>,
    timeout_secs: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct SorterConfig {
    pub db_path: String,
    pub upload_confidence: f32,
    pub live_confidence: f32,
    pub model: ModelSettings,
    pub camera: CameraSettings,
    pub animations: AnimationSettings,
}

#[derive(Debug, Clone)]
pub struct ModelSettings {
    pub path: String,
    pub input_size: u32,
    pub class_names: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct CameraSettings {
    pub device: String,
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone)]
pub struct AnimationSettings {
    pub enabled: bool,
    pub biodegradable_url: String,
    pub non_biodegradable_url: String,
    pub timeout: Duration,
}

impl Default for SorterConfig {
    fn default() -> Self {
        Self::from_file(SorterConfigFile::default())
    }
}

impl SorterConfig {
    /// Defaults, then `WASTE_SORTER_CONFIG` (JSON), then environment overrides.
    pub fn load() -> Result<Self> {
        let config_path = std::env::var("WASTE_SORTER_CONFIG").ok();
        let file_cfg = match config_path.as_deref() {
            Some(path) => Some(read_config_file(Path::new(path))?),
            None => None,
        };
        let mut cfg = Self::from_file(file_cfg.unwrap_or_default());
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn model_spec(&self) -> ModelSpec {
        ModelSpec {
            path: self.model.path.clone(),
            input_size: self.model.input_size,
            class_names: self.model.class_names.clone(),
        }
    }

    fn from_file(file: SorterConfigFile) -> Self {
        let model = file.model.unwrap_or_default();
        let camera = file.camera.unwrap_or_default();
        let animations = file.animations.unwrap_or_default();
        Self {
            db_path: file.db_path.unwrap_or_else(|| DEFAULT_DB_PATH.to_string()),
            upload_confidence: file.upload_confidence.unwrap_or(DEFAULT_IMAGE_CONFIDENCE),
            live_confidence: file.live_confidence.unwrap_or(LIVE_CONFIDENCE),
            model: ModelSettings {
                path: model.path.unwrap_or_else(|| DEFAULT_MODEL_PATH.to_string()),
                input_size: model.input_size.unwrap_or(DEFAULT_MODEL_INPUT_SIZE),
                class_names: model.class_names.unwrap_or_else(|| {
                    DEFAULT_CLASS_NAMES.iter().map(|c| c.to_string()).collect()
                }),
            },
            camera: CameraSettings {
                device: camera
                    .device
                    .unwrap_or_else(|| DEFAULT_CAMERA_DEVICE.to_string()),
                width: camera.width.unwrap_or(DEFAULT_CAMERA_WIDTH),
                height: camera.height.unwrap_or(DEFAULT_CAMERA_HEIGHT),
            },
            animations: AnimationSettings {
                enabled: animations.enabled.unwrap_or(true),
                biodegradable_url: animations
                    .biodegradable_url
                    .unwrap_or_else(|| BIODEGRADABLE_ANIMATION_URL.to_string()),
                non_biodegradable_url: animations
                    .non_biodegradable_url
                    .unwrap_or_else(|| NON_BIODEGRADABLE_ANIMATION_URL.to_string()),
                timeout: Duration::from_secs(
                    animations
                        .timeout_secs
                        .unwrap_or(DEFAULT_ANIMATION_TIMEOUT_SECS),
                ),
            },
        }
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(db_path) = std::env::var("WASTE_SORTER_DB") {
            if !db_path.trim().is_empty() {
                self.db_path = db_path;
            }
        }
        if let Ok(model) = std::env::var("WASTE_SORTER_MODEL") {
            if !model.trim().is_empty() {
                self.model.path = model;
            }
        }
        if let Ok(camera) = std::env::var("WASTE_SORTER_CAMERA") {
            if !camera.trim().is_empty() {
                self.camera.device = camera;
            }
        }
        if let Ok(conf) = std::env::var("WASTE_SORTER_UPLOAD_CONF") {
            self.upload_confidence = conf
                .trim()
                .parse()
                .map_err(|_| anyhow!("WASTE_SORTER_UPLOAD_CONF must be a number in [0, 1]"))?;
        }
        Ok(())
    }

    fn validate(&mut self) -> Result<()> {
        self.upload_confidence = validate_threshold(self.upload_confidence)?;
        self.live_confidence = validate_threshold(self.live_confidence)?;

        if self.db_path.trim().is_empty() {
            return Err(anyhow!("db_path must not be empty"));
        }
        if self.model.input_size == 0 {
            return Err(anyhow!("model.input_size must be greater than zero"));
        }
        self.model.class_names = self
            .model
            .class_names
            .iter()
            .map(|name| name.trim().to_string())
            .collect();
        if self.model.class_names.iter().any(|name| name.is_empty()) {
            return Err(anyhow!("model.class_names must not contain empty names"));
        }
        if self.model.class_names.is_empty() && !self.model.path.starts_with("stub://") {
            return Err(anyhow!("model.class_names must not be empty"));
        }
        if self.camera.width == 0 || self.camera.height == 0 {
            return Err(anyhow!("camera width and height must be greater than zero"));
        }
        Ok(())
    }
}

fn read_config_file(path: &Path) -> Result<SorterConfigFile> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config file {}: {}", path.display(), e))?;
    let cfg = serde_json::from_str(&raw)
        .map_err(|e| anyhow!("invalid config file {}: {}", path.display(), e))?;
    Ok(cfg)
}

use anyhow::{anyhow, Result};

use crate::detect::backend::DetectorBackend;
use crate::detect::result::{BoundingBox, Detection};
use crate::frame::Frame;

const DEFAULT_STUB_CONFIDENCE: f32 = 0.9;

/// Scripted backend for tests and `stub://` model paths.
///
/// Each call returns the next scripted detection list (cycling), filtered by the
/// requested threshold. The frame content is ignored.
pub struct StubBackend {
    script: Vec<Vec<Detection>>,
    cursor: usize,
    calls: u64,
}

impl StubBackend {
    pub fn new(script: Vec<Vec<Detection>>) -> Self {
        Self {
            script,
            cursor: 0,
            calls: 0,
        }
    }

    /// Backend that never finds anything.
    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    /// Backend that reports one `label` detection on every frame.
    pub fn always(label: &str, confidence: f32) -> Self {
        Self::new(vec![vec![centered(label, confidence)]])
    }

    /// Mixed script used when no labels are given in a `stub://` path.
    pub fn demo() -> Self {
        Self::new(vec![
            vec![centered("plastic", 0.91)],
            vec![
                centered("cardboard", 0.77),
                Detection {
                    label: "paper".to_string(),
                    confidence: 0.55,
                    bbox: BoundingBox {
                        x: 0.05,
                        y: 0.05,
                        w: 0.25,
                        h: 0.2,
                    },
                },
            ],
            Vec::new(),
            vec![centered("Banana Peel", 0.62)],
        ])
    }

    /// Parse a `stub://` model path.
    ///
    /// - `stub://` or `stub://demo`: the demo script
    /// - `stub://none`: never detects
    /// - `stub://plastic,paper:0.6`: cycles one detection per frame through the labels;
    ///   a `none` item scripts an empty frame
    pub fn from_uri(uri: &str) -> Result<Self> {
        let spec = uri
            .strip_prefix("stub://")
            .ok_or_else(|| anyhow!("stub model path must start with stub://"))?
            .trim();
        match spec {
            "" | "demo" => return Ok(Self::demo()),
            "none" => return Ok(Self::empty()),
            _ => {}
        }

        let mut script = Vec::new();
        for item in spec.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            if item == "none" {
                script.push(Vec::new());
                continue;
            }
            let (label, confidence) = match item.rsplit_once(':') {
                Some((label, conf)) => {
                    let conf: f32 = conf
                        .parse()
                        .map_err(|_| anyhow!("invalid stub confidence '{}'", conf))?;
                    if !(0.0..=1.0).contains(&conf) {
                        return Err(anyhow!("stub confidence {} outside [0, 1]", conf));
                    }
                    (label, conf)
                }
                None => (item, DEFAULT_STUB_CONFIDENCE),
            };
            script.push(vec![centered(label, confidence)]);
        }
        Ok(Self::new(script))
    }

    /// Number of `detect` calls served.
    pub fn calls(&self) -> u64 {
        self.calls
    }
}

impl Default for StubBackend {
    fn default() -> Self {
        Self::demo()
    }
}

impl DetectorBackend for StubBackend {
    fn name(&self) -> &'static str {
        "stub"
    }

    fn detect(&mut self, _frame: &Frame, confidence_threshold: f32) -> Result<Vec<Detection>> {
        self.calls += 1;
        if self.script.is_empty() {
            return Ok(Vec::new());
        }
        let step = &self.script[self.cursor % self.script.len()];
        self.cursor = self.cursor.wrapping_add(1);
        Ok(step
            .iter()
            .filter(|d| d.confidence >= confidence_threshold)
            .cloned()
            .collect())
    }
}

fn centered(label: &str, confidence: f32) -> Detection {
    Detection {
        label: label.to_string(),
        confidence,
        bbox: BoundingBox::from_center(0.5, 0.5, 0.4, 0.4),
    }
}

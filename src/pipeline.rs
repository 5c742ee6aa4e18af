//! Single-image processing shared by every input mode.
//!
//! detect → display annotated frame → map first detection → log → verdict.
//!
//! A failed log append is reported through the sink and never hides the
//! classification from the user.

use anyhow::Result;
use serde_json::Value;

use crate::aggregate::Dashboard;
use crate::animation::AnimationSet;
use crate::category::{classify, WasteCategory};
use crate::detect::DetectionAdapter;
use crate::frame::Frame;
use crate::sink::{PresentationSink, Status};
use crate::storage::{NewLogEntry, WasteLogStore};

/// Default upload/snapshot sensitivity.
pub const DEFAULT_IMAGE_CONFIDENCE: f32 = 0.4;

/// Classification of one frame's primary detection.
#[derive(Clone, Debug, PartialEq)]
pub struct Verdict {
    /// Raw detector label.
    pub class_name: String,
    pub category: WasteCategory,
    pub confidence: f32,
    pub animation: Option<Value>,
}

impl Verdict {
    pub fn headline(&self) -> &'static str {
        if self.category.is_biodegradable() {
            "BIODEGRADABLE"
        } else {
            "NON-BIODEGRADABLE"
        }
    }

    /// Short line for the live status display, e.g. `PLASTIC (NON-BIO)`.
    pub fn live_status(&self) -> Status {
        let text = format!(
            "{} ({})",
            self.class_name.to_uppercase(),
            self.category.short_tag()
        );
        if self.category.is_biodegradable() {
            Status::Success(text)
        } else {
            Status::Warning(text)
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum ProcessOutcome {
    Classified {
        verdict: Verdict,
        /// Id of the log row; `None` when logging was skipped or failed.
        log_id: Option<i64>,
    },
    NoDetection,
}

impl ProcessOutcome {
    pub fn verdict(&self) -> Option<&Verdict> {
        match self {
            ProcessOutcome::Classified { verdict, .. } => Some(verdict),
            ProcessOutcome::NoDetection => None,
        }
    }
}

pub struct Pipeline<'a> {
    adapter: &'a mut DetectionAdapter,
    store: &'a mut dyn WasteLogStore,
    sink: &'a mut dyn PresentationSink,
    animations: Option<&'a AnimationSet>,
    log_detections: bool,
}

impl<'a> Pipeline<'a> {
    pub fn new(
        adapter: &'a mut DetectionAdapter,
        store: &'a mut dyn WasteLogStore,
        sink: &'a mut dyn PresentationSink,
    ) -> Self {
        Self {
            adapter,
            store,
            sink,
            animations: None,
            log_detections: true,
        }
    }

    pub fn with_animations(mut self, animations: &'a AnimationSet) -> Self {
        self.animations = Some(animations);
        self
    }

    /// Disable log appends (classification and display still happen).
    pub fn with_logging(mut self, enabled: bool) -> Self {
        self.log_detections = enabled;
        self
    }

    /// Detect, display the annotated frame, classify and log the first detection.
    ///
    /// Does not render a verdict; callers decide how to present the outcome.
    pub fn classify_frame(
        &mut self,
        frame: &Frame,
        confidence_threshold: f32,
        caption: &str,
    ) -> Result<ProcessOutcome> {
        let outcome = self.adapter.run(frame, confidence_threshold)?;
        self.sink.show_frame(&frame.annotated(outcome.all()), caption);

        let Some(primary) = outcome.primary() else {
            return Ok(ProcessOutcome::NoDetection);
        };
        let category = classify(&primary.label);
        let verdict = Verdict {
            class_name: primary.label.clone(),
            category,
            confidence: primary.confidence,
            animation: self
                .animations
                .and_then(|set| set.for_category(category))
                .cloned(),
        };
        let log_id = if self.log_detections {
            self.append_log(&verdict)
        } else {
            None
        };
        Ok(ProcessOutcome::Classified { verdict, log_id })
    }

    /// Upload/snapshot flow: classify and render the full verdict.
    pub fn process_image(
        &mut self,
        frame: &Frame,
        confidence_threshold: f32,
    ) -> Result<ProcessOutcome> {
        let outcome = self.classify_frame(frame, confidence_threshold, "Detected Image")?;
        match &outcome {
            ProcessOutcome::Classified { verdict, log_id } => {
                self.sink.show_verdict(verdict);
                if log_id.is_some() {
                    self.sink
                        .show_status(&Status::Success(format!("Logged: {}", verdict.class_name)));
                }
            }
            ProcessOutcome::NoDetection => {
                self.sink
                    .show_status(&Status::Info("No trash detected in this frame.".to_string()));
            }
        }
        Ok(outcome)
    }

    /// Aggregate the full log and render it.
    pub fn show_dashboard(&mut self) -> Result<Dashboard> {
        let dashboard = Dashboard::load(&*self.store)?;
        self.sink.show_dashboard(&dashboard);
        Ok(dashboard)
    }

    pub fn report(&mut self, status: Status) {
        self.sink.show_status(&status);
    }

    fn append_log(&mut self, verdict: &Verdict) -> Option<i64> {
        let entry = NewLogEntry::new(&verdict.class_name, verdict.category, verdict.confidence);
        match self.store.append(&entry) {
            Ok(id) => {
                log::info!(
                    "logged #{}: {} -> {} (conf={:.2})",
                    id,
                    verdict.class_name,
                    verdict.category,
                    verdict.confidence
                );
                Some(id)
            }
            Err(e) => {
                log::warn!("waste log append failed for {}: {:#}", verdict.class_name, e);
                self.sink.show_status(&Status::Warning(format!(
                    "Could not log {}: {}",
                    verdict.class_name, e
                )));
                None
            }
        }
    }
}

//! Live camera loop.
//!
//! STOPPED → RUNNING on `run`; the stop token is checked at the top of every
//! iteration, so a detection call in flight always completes. The camera is
//! held by a `CaptureGuard` for the whole run and released exactly once.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::capture::{CaptureDevice, CaptureGuard};
use crate::pipeline::{Pipeline, ProcessOutcome};
use crate::sink::Status;

/// Fixed live-mode sensitivity.
pub const LIVE_CONFIDENCE: f32 = 0.5;

const LIVE_CAPTION: &str = "Live";
const SCANNING: &str = "Scanning...";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LiveState {
    Stopped,
    Running,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StopReason {
    StopRequested,
    FrameLimit,
    CaptureFailed(String),
    DetectionFailed(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LiveReport {
    pub frames_processed: u64,
    pub items_classified: u64,
    pub items_logged: u64,
    /// States entered during the run, in order. Empty when the camera never opened.
    pub transitions: Vec<LiveState>,
    pub stop_reason: StopReason,
}

#[derive(Clone, Debug)]
pub struct LiveSettings {
    pub confidence_threshold: f32,
    /// Stop after this many frames; `None` runs until stopped.
    pub max_frames: Option<u64>,
}

impl Default for LiveSettings {
    fn default() -> Self {
        Self {
            confidence_threshold: LIVE_CONFIDENCE,
            max_frames: None,
        }
    }
}

/// Cooperative stop flag shared between the loop and whoever stops it.
#[derive(Clone, Debug, Default)]
pub struct StopToken(Arc<AtomicBool>);

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request_stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stop_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

pub struct LiveLoop<'a> {
    pipeline: Pipeline<'a>,
    settings: LiveSettings,
    state: LiveState,
}

impl<'a> LiveLoop<'a> {
    pub fn new(pipeline: Pipeline<'a>, settings: LiveSettings) -> Self {
        Self {
            pipeline,
            settings,
            state: LiveState::Stopped,
        }
    }

    pub fn state(&self) -> LiveState {
        self.state
    }

    /// Run until stopped, the frame limit is hit, or the camera/detector fails.
    pub fn run<D: CaptureDevice + ?Sized>(
        &mut self,
        device: &mut D,
        stop: &StopToken,
    ) -> LiveReport {
        let mut report = LiveReport {
            frames_processed: 0,
            items_classified: 0,
            items_logged: 0,
            transitions: Vec::new(),
            stop_reason: StopReason::StopRequested,
        };

        let mut guard = match CaptureGuard::acquire(device) {
            Ok(guard) => guard,
            Err(e) => {
                let message = format!("Camera error: {:#}", e);
                self.pipeline.report(Status::Error(message.clone()));
                report.stop_reason = StopReason::CaptureFailed(message);
                return report;
            }
        };

        self.enter(LiveState::Running, &mut report);
        log::info!(
            "live loop running (threshold={:.2}, max_frames={:?})",
            self.settings.confidence_threshold,
            self.settings.max_frames
        );

        report.stop_reason = loop {
            if stop.is_stop_requested() {
                break StopReason::StopRequested;
            }
            if let Some(limit) = self.settings.max_frames {
                if report.frames_processed >= limit {
                    break StopReason::FrameLimit;
                }
            }

            let frame = match guard.read_frame() {
                Ok(frame) => frame,
                Err(e) => {
                    let message = format!("Camera error: {:#}", e);
                    self.pipeline.report(Status::Error(message.clone()));
                    break StopReason::CaptureFailed(message);
                }
            };
            report.frames_processed += 1;

            match self.pipeline.classify_frame(
                &frame,
                self.settings.confidence_threshold,
                LIVE_CAPTION,
            ) {
                Ok(ProcessOutcome::Classified { verdict, log_id }) => {
                    report.items_classified += 1;
                    if log_id.is_some() {
                        report.items_logged += 1;
                    }
                    self.pipeline.report(verdict.live_status());
                }
                Ok(ProcessOutcome::NoDetection) => {
                    self.pipeline.report(Status::Info(SCANNING.to_string()));
                }
                Err(e) => {
                    let message = format!("Detection error: {:#}", e);
                    self.pipeline.report(Status::Error(message.clone()));
                    break StopReason::DetectionFailed(message);
                }
            }
        };

        let captured = guard.stats().frames_captured;
        drop(guard);
        self.enter(LiveState::Stopped, &mut report);
        log::info!(
            "live loop stopped after {} frames, {} captured ({:?})",
            report.frames_processed,
            captured,
            report.stop_reason
        );
        report
    }

    fn enter(&mut self, state: LiveState, report: &mut LiveReport) {
        self.state = state;
        report.transitions.push(state);
    }
}

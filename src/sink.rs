//! Presentation sinks.
//!
//! The pipeline and live loop push frames, verdicts, status lines and
//! dashboards into a `PresentationSink`; nothing is read back.

use std::path::PathBuf;

use crate::aggregate::Dashboard;
use crate::frame::Frame;
use crate::pipeline::Verdict;

const DASHBOARD_BAR_WIDTH: u64 = 40;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Status {
    Info(String),
    Success(String),
    Warning(String),
    Error(String),
}

impl Status {
    pub fn message(&self) -> &str {
        match self {
            Status::Info(m) | Status::Success(m) | Status::Warning(m) | Status::Error(m) => m,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, Status::Error(_))
    }

    fn tag(&self) -> &'static str {
        match self {
            Status::Info(_) => "info",
            Status::Success(_) => "ok",
            Status::Warning(_) => "warn",
            Status::Error(_) => "error",
        }
    }
}

pub trait PresentationSink {
    fn show_frame(&mut self, frame: &Frame, caption: &str);
    fn show_verdict(&mut self, verdict: &Verdict);
    fn show_status(&mut self, status: &Status);
    fn show_dashboard(&mut self, dashboard: &Dashboard);
}

/// Where the console sink puts displayed frames.
#[derive(Clone, Debug, Default)]
pub enum FrameOutput {
    /// Frames are only counted.
    #[default]
    Discard,
    /// `frame_000001.jpg`, `frame_000002.jpg`, ... in a directory.
    Sequence(PathBuf),
    /// One file, overwritten on every frame (live preview).
    Latest(PathBuf),
}

/// Terminal sink: verdicts and dashboards to stdout, status lines through `log`.
#[derive(Default)]
pub struct ConsoleSink {
    frames: FrameOutput,
    frames_shown: u64,
}

impl ConsoleSink {
    pub fn new(frames: FrameOutput) -> Self {
        Self {
            frames,
            frames_shown: 0,
        }
    }

    pub fn frames_shown(&self) -> u64 {
        self.frames_shown
    }
}

impl PresentationSink for ConsoleSink {
    fn show_frame(&mut self, frame: &Frame, caption: &str) {
        self.frames_shown += 1;
        let path = match &self.frames {
            FrameOutput::Discard => return,
            FrameOutput::Sequence(dir) => dir.join(format!("frame_{:06}.jpg", self.frames_shown)),
            FrameOutput::Latest(path) => path.clone(),
        };
        match frame.save(&path) {
            Ok(()) => log::debug!("{}: wrote {}", caption, path.display()),
            Err(e) => log::warn!("{}: could not write frame: {:#}", caption, e),
        }
    }

    fn show_verdict(&mut self, verdict: &Verdict) {
        println!("{}", render_verdict(verdict));
    }

    fn show_status(&mut self, status: &Status) {
        match status {
            Status::Error(m) => log::error!("{}", m),
            Status::Warning(m) => log::warn!("{}", m),
            Status::Info(m) | Status::Success(m) => log::info!("{}", m),
        }
        eprintln!("[{}] {}", status.tag(), status.message());
    }

    fn show_dashboard(&mut self, dashboard: &Dashboard) {
        println!("{}", render_dashboard(dashboard));
    }
}

pub fn render_verdict(verdict: &Verdict) -> String {
    let mut out = String::new();
    out.push_str("Sorting Analysis\n");
    out.push_str(&format!("  {}\n", verdict.headline()));
    out.push_str(&format!(
        "  Item: {} ({:.0}% confidence)\n",
        verdict.class_name.to_uppercase(),
        verdict.confidence * 100.0
    ));
    out.push_str(&format!("  Category: {}\n", verdict.category));
    out.push_str(&format!("  Action: {}", verdict.category.disposal_action()));
    if verdict.animation.is_some() {
        out.push_str("\n  (animation available)");
    }
    out
}

/// Text bar chart of item frequencies.
pub fn render_dashboard(dashboard: &Dashboard) -> String {
    if dashboard.is_empty() {
        return "No data yet. Start detecting!".to_string();
    }
    let max = dashboard.counts.iter().map(|c| c.count).max().unwrap_or(1).max(1);
    let name_width = dashboard
        .counts
        .iter()
        .map(|c| c.class_name.chars().count())
        .max()
        .unwrap_or(0);

    let mut lines = vec![
        format!("Total Items: {}", dashboard.total_items),
        "Detected Items Frequency".to_string(),
    ];
    for count in &dashboard.counts {
        let bar_len = (count.count * DASHBOARD_BAR_WIDTH).div_ceil(max) as usize;
        lines.push(format!(
            "  {:<width$}  {} {}",
            count.class_name,
            "#".repeat(bar_len),
            count.count,
            width = name_width
        ));
    }
    lines.join("\n")
}

/// Everything a sink was asked to show, in order.
#[derive(Clone, Debug, PartialEq)]
pub enum SinkEvent {
    Frame {
        caption: String,
        width: u32,
        height: u32,
    },
    Verdict(Verdict),
    Status(Status),
    Dashboard(Dashboard),
}

/// Sink that records events instead of rendering them.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<SinkEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn statuses(&self) -> Vec<&Status> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SinkEvent::Status(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    pub fn verdicts(&self) -> Vec<&Verdict> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SinkEvent::Verdict(v) => Some(v),
                _ => None,
            })
            .collect()
    }

    pub fn frame_count(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, SinkEvent::Frame { .. }))
            .count()
    }
}

impl PresentationSink for RecordingSink {
    fn show_frame(&mut self, frame: &Frame, caption: &str) {
        self.events.push(SinkEvent::Frame {
            caption: caption.to_string(),
            width: frame.width,
            height: frame.height,
        });
    }

    fn show_verdict(&mut self, verdict: &Verdict) {
        self.events.push(SinkEvent::Verdict(verdict.clone()));
    }

    fn show_status(&mut self, status: &Status) {
        self.events.push(SinkEvent::Status(status.clone()));
    }

    fn show_dashboard(&mut self, dashboard: &Dashboard) {
        self.events.push(SinkEvent::Dashboard(dashboard.clone()));
    }
}

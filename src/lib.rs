//! Waste Sorter
//!
//! Classifies waste items from still images or a live camera feed. A detector
//! backend finds objects in a frame, the first detection's class is mapped to a
//! disposal category, and every classified frame is appended to a local SQLite
//! log that feeds the dashboard counts.
//!
//! # Module Structure
//!
//! - `category`: fixed class-name → disposal-category table
//! - `detect`: detector backends and the first-detection adapter
//! - `frame`: owned RGB frames, decoding and annotation
//! - `capture`: camera devices with scoped acquisition
//! - `storage`: append-only waste log (SQLite, in-memory)
//! - `aggregate`: per-class counts for the dashboard
//! - `pipeline`: single-image processing shared by upload and snapshot modes
//! - `live`: cancellable capture → classify loop
//! - `sink`: presentation sinks
//! - `animation`: optional remote animation payloads

use anyhow::Result;
use rand::RngCore;
use rusqlite::{Connection, OpenFlags};

pub mod aggregate;
pub mod animation;
pub mod capture;
pub mod category;
pub mod config;
pub mod detect;
pub mod error;
pub mod frame;
pub mod live;
pub mod pipeline;
pub mod sink;
pub mod storage;

pub use aggregate::{count_by_class, AggregateCount, Dashboard};
pub use animation::{AnimationSet, AnimationSource, HttpAnimationSource, NoAnimations};
pub use capture::{open_camera, CaptureDevice, CaptureGuard, ImageDirCamera, SyntheticCamera};
#[cfg(feature = "ingest-v4l2")]
pub use capture::V4l2Camera;
pub use category::{classify, normalize_class_name, WasteCategory};
pub use detect::{
    load_backend, BoundingBox, Detection, DetectionAdapter, DetectionOutcome, DetectorBackend,
    StubBackend,
};
pub use error::SorterError;
pub use frame::Frame;
pub use live::{LiveLoop, LiveReport, LiveSettings, LiveState, StopReason, StopToken};
pub use pipeline::{Pipeline, ProcessOutcome, Verdict};
pub use sink::{ConsoleSink, PresentationSink, RecordingSink, SinkEvent, Status};
pub use storage::{
    InMemoryWasteLogStore, NewLogEntry, SqliteWasteLogStore, UnavailableWasteLogStore,
    WasteLogEntry, WasteLogStore,
};

/// Unique shared-cache in-memory SQLite URI, mainly for tests.
pub fn shared_memory_uri() -> String {
    let mut bytes = [0u8; 8];
    rand::thread_rng().fill_bytes(&mut bytes);
    format!(
        "file:waste_sorter_{:x}?mode=memory&cache=shared",
        u64::from_le_bytes(bytes)
    )
}

pub(crate) fn open_db_connection(db_path: &str) -> Result<Connection> {
    if db_path.starts_with("file:") {
        return Ok(Connection::open_with_flags(
            db_path,
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_URI,
        )?);
    }
    Ok(Connection::open(db_path)?)
}

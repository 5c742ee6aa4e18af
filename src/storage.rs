//! Append-only waste log.
//!
//! One row per classified image or frame. The store exposes append and
//! read-all only; there is no update or delete path, and `WasteLogEntry`
//! fields are read-only outside this module.

use anyhow::Result;
use rusqlite::{params, Connection};
use serde::Serialize;

use crate::category::WasteCategory;
use crate::error::SorterError;
use crate::open_db_connection;

pub trait WasteLogStore {
    /// Append one record and return its assigned id.
    fn append(&mut self, entry: &NewLogEntry) -> Result<i64>;

    /// Every record, ordered by id.
    fn read_all(&self) -> Result<Vec<WasteLogEntry>>;
}

/// Values supplied by the caller; id and timestamp are assigned by the store.
#[derive(Clone, Debug, PartialEq)]
pub struct NewLogEntry {
    pub class_name: String,
    pub waste_type: String,
    pub confidence: f64,
}

impl NewLogEntry {
    pub fn new(class_name: impl Into<String>, category: WasteCategory, confidence: f32) -> Self {
        Self {
            class_name: class_name.into(),
            waste_type: category.as_str().to_string(),
            confidence: f64::from(confidence),
        }
    }
}

/// A persisted waste log record. Immutable once written.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct WasteLogEntry {
    id: i64,
    class_name: String,
    waste_type: String,
    confidence: f64,
    timestamp: String,
}

impl WasteLogEntry {
    pub fn id(&self) -> i64 {
        self.id
    }

    /// Raw detector label, as logged.
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    pub fn waste_type(&self) -> &str {
        &self.waste_type
    }

    /// Parsed `waste_type`; `None` for labels written by other tools.
    pub fn category(&self) -> Option<WasteCategory> {
        WasteCategory::from_label(&self.waste_type)
    }

    pub fn confidence(&self) -> f64 {
        self.confidence
    }

    /// `YYYY-MM-DD HH:MM:SS` (UTC), as assigned by SQLite.
    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }
}

pub struct SqliteWasteLogStore {
    conn: Connection,
}

impl SqliteWasteLogStore {
    pub fn open(db_path: &str) -> Result<Self> {
        let conn = open_db_connection(db_path)
            .map_err(|e| SorterError::StorageFailure(format!("open {}: {:#}", db_path, e)))?;
        let mut store = Self { conn };
        store
            .ensure_schema()
            .map_err(|e| SorterError::StorageFailure(format!("schema {}: {:#}", db_path, e)))?;
        Ok(store)
    }

    fn ensure_schema(&mut self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            PRAGMA journal_mode=WAL;

            CREATE TABLE IF NOT EXISTS waste_log (
              id INTEGER PRIMARY KEY AUTOINCREMENT,
              class_name TEXT NOT NULL,
              waste_type TEXT NOT NULL,
              confidence REAL NOT NULL,
              timestamp DATETIME DEFAULT CURRENT_TIMESTAMP
            );
            "#,
        )?;
        Ok(())
    }
}

impl WasteLogStore for SqliteWasteLogStore {
    fn append(&mut self, entry: &NewLogEntry) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO waste_log (class_name, waste_type, confidence) VALUES (?1, ?2, ?3)",
                params![entry.class_name, entry.waste_type, entry.confidence],
            )
            .map_err(|e| SorterError::StorageFailure(format!("append: {}", e)))?;
        Ok(self.conn.last_insert_rowid())
    }

    fn read_all(&self) -> Result<Vec<WasteLogEntry>> {
        let read = || -> rusqlite::Result<Vec<WasteLogEntry>> {
            let mut stmt = self.conn.prepare(
                "SELECT id, class_name, waste_type, confidence, timestamp
                 FROM waste_log ORDER BY id ASC",
            )?;
            let rows = stmt.query_map([], |row| {
                Ok(WasteLogEntry {
                    id: row.get(0)?,
                    class_name: row.get(1)?,
                    waste_type: row.get(2)?,
                    confidence: row.get(3)?,
                    timestamp: row.get::<_, Option<String>>(4)?.unwrap_or_default(),
                })
            })?;
            rows.collect()
        };
        Ok(read().map_err(|e| SorterError::StorageFailure(format!("read: {}", e)))?)
    }
}

/// Volatile store with the same append-only contract.
#[derive(Clone, Debug, Default)]
pub struct InMemoryWasteLogStore {
    entries: Vec<WasteLogEntry>,
}

impl InMemoryWasteLogStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl WasteLogStore for InMemoryWasteLogStore {
    fn append(&mut self, entry: &NewLogEntry) -> Result<i64> {
        let id = self.entries.last().map_or(1, |e| e.id + 1);
        self.entries.push(WasteLogEntry {
            id,
            class_name: entry.class_name.clone(),
            waste_type: entry.waste_type.clone(),
            confidence: entry.confidence,
            timestamp: utc_timestamp_now(),
        });
        Ok(id)
    }

    fn read_all(&self) -> Result<Vec<WasteLogEntry>> {
        Ok(self.entries.clone())
    }
}

/// Stands in for a log that could not be opened. Every call is a
/// `StorageFailure` carrying the open error.
#[derive(Clone, Debug)]
pub struct UnavailableWasteLogStore {
    reason: String,
}

impl UnavailableWasteLogStore {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl WasteLogStore for UnavailableWasteLogStore {
    fn append(&mut self, _entry: &NewLogEntry) -> Result<i64> {
        Err(SorterError::StorageFailure(format!("log unavailable: {}", self.reason)).into())
    }

    fn read_all(&self) -> Result<Vec<WasteLogEntry>> {
        Err(SorterError::StorageFailure(format!("log unavailable: {}", self.reason)).into())
    }
}

/// `YYYY-MM-DD HH:MM:SS` in UTC, matching SQLite's CURRENT_TIMESTAMP.
fn utc_timestamp_now() -> String {
    chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string()
}

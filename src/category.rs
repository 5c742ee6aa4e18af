//! Disposal category lookup.
//!
//! The mapping domain is fixed at build time. Lookups normalize the raw class
//! label (trim + lowercase) and fall back to `WasteCategory::Unknown` for names
//! outside the table; there is no error path.

use serde::{Deserialize, Serialize};
use std::fmt;

const BIODEGRADABLE: &str = "Biodegradable";
const NON_BIODEGRADABLE: &str = "Non-Biodegradable";
const UNKNOWN: &str = "Unknown";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WasteCategory {
    Biodegradable,
    NonBiodegradable,
    Unknown,
}

/// Normalized class name → category.
const CATEGORY_MAPPING: &[(&str, WasteCategory)] = &[
    ("biological", WasteCategory::Biodegradable),
    ("cardboard", WasteCategory::Biodegradable),
    ("paper", WasteCategory::Biodegradable),
    ("battery", WasteCategory::NonBiodegradable),
    ("clothes", WasteCategory::NonBiodegradable),
    ("glass", WasteCategory::NonBiodegradable),
    ("metal", WasteCategory::NonBiodegradable),
    ("plastic", WasteCategory::NonBiodegradable),
    ("shoes", WasteCategory::NonBiodegradable),
    ("trash", WasteCategory::NonBiodegradable),
];

impl WasteCategory {
    /// Label stored in the `waste_type` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            WasteCategory::Biodegradable => BIODEGRADABLE,
            WasteCategory::NonBiodegradable => NON_BIODEGRADABLE,
            WasteCategory::Unknown => UNKNOWN,
        }
    }

    /// Parses a stored `waste_type` label.
    pub fn from_label(label: &str) -> Option<Self> {
        match label {
            BIODEGRADABLE => Some(WasteCategory::Biodegradable),
            NON_BIODEGRADABLE => Some(WasteCategory::NonBiodegradable),
            UNKNOWN => Some(WasteCategory::Unknown),
            _ => None,
        }
    }

    pub fn is_biodegradable(&self) -> bool {
        matches!(self, WasteCategory::Biodegradable)
    }

    /// Bin instruction shown with a verdict. Unknown items go to the recycling bin.
    pub fn disposal_action(&self) -> &'static str {
        if self.is_biodegradable() {
            "GREEN BIN (Compost)"
        } else {
            "YELLOW/RED BIN (Recycle)"
        }
    }

    /// Short tag for the live status line.
    pub fn short_tag(&self) -> &'static str {
        if self.is_biodegradable() {
            "BIO"
        } else {
            "NON-BIO"
        }
    }
}

impl fmt::Display for WasteCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn normalize_class_name(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Maps a raw detector label to its disposal category.
pub fn classify(raw: &str) -> WasteCategory {
    let normalized = normalize_class_name(raw);
    CATEGORY_MAPPING
        .iter()
        .find(|(name, _)| *name == normalized)
        .map(|(_, category)| *category)
        .unwrap_or(WasteCategory::Unknown)
}

/// Class names covered by the mapping table.
pub fn mapped_classes() -> impl Iterator<Item = &'static str> {
    CATEGORY_MAPPING.iter().map(|(name, _)| *name)
}

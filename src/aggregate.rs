//! Dashboard aggregation over the full waste log.
//!
//! Counts are recomputed from every stored record on each call; nothing is
//! cached between renders.

use anyhow::Result;
use serde::Serialize;
use std::collections::HashMap;

use crate::storage::{WasteLogEntry, WasteLogStore};

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AggregateCount {
    pub class_name: String,
    pub count: u64,
}

/// Occurrences per logged class name, most frequent first.
///
/// Ties are ordered by class name so repeated renders are stable.
pub fn count_by_class(entries: &[WasteLogEntry]) -> Vec<AggregateCount> {
    let mut counts: HashMap<&str, u64> = HashMap::new();
    for entry in entries {
        *counts.entry(entry.class_name()).or_default() += 1;
    }
    let mut out: Vec<AggregateCount> = counts
        .into_iter()
        .map(|(class_name, count)| AggregateCount {
            class_name: class_name.to_string(),
            count,
        })
        .collect();
    out.sort_by(|a, b| {
        b.count
            .cmp(&a.count)
            .then_with(|| a.class_name.cmp(&b.class_name))
    });
    out
}

/// What the dashboard shows: total logged items and per-class frequencies.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Dashboard {
    pub total_items: u64,
    pub counts: Vec<AggregateCount>,
}

impl Dashboard {
    /// Read the whole store and aggregate it.
    pub fn load(store: &dyn WasteLogStore) -> Result<Self> {
        Ok(Self::from_entries(&store.read_all()?))
    }

    pub fn from_entries(entries: &[WasteLogEntry]) -> Self {
        Self {
            total_items: entries.len() as u64,
            counts: count_by_class(entries),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.total_items == 0
    }

    pub fn count_for(&self, class_name: &str) -> u64 {
        self.counts
            .iter()
            .find(|c| c.class_name == class_name)
            .map_or(0, |c| c.count)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::{classify, normalize_class_name, WasteCategory};
    use crate::storage::{InMemoryWasteLogStore, NewLogEntry};

    fn store_with(labels: &[&str]) -> InMemoryWasteLogStore {
        let mut store = InMemoryWasteLogStore::new();
        for label in labels {
            store
                .append(&NewLogEntry::new(*label, classify(label), 0.8))
                .expect("append");
        }
        store
    }

    #[test]
    fn three_distinct_items_count_once_each() -> Result<()> {
        let mut store = InMemoryWasteLogStore::new();
        store.append(&NewLogEntry::new(
            "plastic",
            WasteCategory::NonBiodegradable,
            0.91,
        ))?;
        store.append(&NewLogEntry::new(
            normalize_class_name("Banana Peel "),
            WasteCategory::Unknown,
            0.3,
        ))?;
        store.append(&NewLogEntry::new(
            "cardboard",
            WasteCategory::Biodegradable,
            0.77,
        ))?;

        let dashboard = Dashboard::load(&store)?;
        assert_eq!(dashboard.total_items, 3);
        assert_eq!(dashboard.count_for("plastic"), 1);
        assert_eq!(dashboard.count_for("banana peel"), 1);
        assert_eq!(dashboard.count_for("cardboard"), 1);
        assert_eq!(dashboard.counts.len(), 3);
        Ok(())
    }

    #[test]
    fn counts_sort_by_frequency_then_name() -> Result<()> {
        let store = store_with(&["paper", "glass", "paper", "metal", "glass", "paper"]);
        let counts = count_by_class(&store.read_all()?);
        let summary: Vec<(&str, u64)> = counts
            .iter()
            .map(|c| (c.class_name.as_str(), c.count))
            .collect();
        assert_eq!(summary, vec![("paper", 3), ("glass", 2), ("metal", 1)]);
        Ok(())
    }

    #[test]
    fn aggregation_is_idempotent() -> Result<()> {
        let store = store_with(&["trash", "shoes", "trash"]);
        let first = Dashboard::load(&store)?;
        let second = Dashboard::load(&store)?;
        assert_eq!(first, second);
        Ok(())
    }

    #[test]
    fn labels_are_counted_as_logged() -> Result<()> {
        let store = store_with(&["Plastic", "plastic"]);
        let dashboard = Dashboard::load(&store)?;
        assert_eq!(dashboard.count_for("Plastic"), 1);
        assert_eq!(dashboard.count_for("plastic"), 1);
        Ok(())
    }

    #[test]
    fn empty_store_gives_empty_dashboard() -> Result<()> {
        let dashboard = Dashboard::load(&InMemoryWasteLogStore::new())?;
        assert!(dashboard.is_empty());
        assert!(dashboard.counts.is_empty());
        Ok(())
    }
}

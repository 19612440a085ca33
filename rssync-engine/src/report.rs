//! Outcome of a sync run.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// A recoverable remote failure: logged, recorded, and skipped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ItemFailure {
    /// Failure label, e.g. `data source` or `item references`.
    pub kind: &'static str,
    /// Path or name identifying the item.
    pub target: String,
    pub message: String,
}

/// Counts of what a run did, plus every recoverable failure.
#[derive(Debug, Clone, Serialize)]
pub struct SyncReport {
    pub root: String,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub folders_created: usize,
    /// Folders that were already present (convergence no-ops).
    pub folders_existing: usize,
    pub data_sources: usize,
    pub data_sets: usize,
    pub documents: usize,
    pub data_source_links: usize,
    pub item_references: usize,
    pub roles: usize,
    pub failures: Vec<ItemFailure>,
}

impl SyncReport {
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            started_at: Utc::now(),
            finished_at: None,
            folders_created: 0,
            folders_existing: 0,
            data_sources: 0,
            data_sets: 0,
            documents: 0,
            data_source_links: 0,
            item_references: 0,
            roles: 0,
            failures: Vec::new(),
        }
    }

    pub fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// `true` when no recoverable failure was recorded.
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }

    /// Number of successful remote calls.
    pub fn succeeded(&self) -> usize {
        self.folders_created
            + self.data_sources
            + self.data_sets
            + self.documents
            + self.data_source_links
            + self.item_references
            + self.roles
    }

    pub fn duration_ms(&self) -> Option<i64> {
        self.finished_at
            .map(|end| (end - self.started_at).num_milliseconds())
    }
}

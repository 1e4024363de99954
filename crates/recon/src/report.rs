use serde::Serialize;

use crate::classify::ColumnReport;
use crate::model::ContactSet;

// ---------------------------------------------------------------------------
// Per-file
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum FileStatus {
    Loaded {
        rows: usize,
        /// Labels as parsed, before noise filtering.
        labels: Vec<String>,
        dropped_noise: Vec<String>,
        columns: Vec<ColumnReport>,
    },
    Failed {
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileReport {
    pub name: String,
    #[serde(flatten)]
    pub status: FileStatus,
}

impl FileReport {
    pub fn is_loaded(&self) -> bool {
        matches!(self.status, FileStatus::Loaded { .. })
    }
}

// ---------------------------------------------------------------------------
// Summary + Output
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MergeSummary {
    pub files_loaded: usize,
    pub files_failed: usize,
    /// Rows after concatenation, before deduplication.
    pub rows_merged: usize,
    pub duplicates_dropped: usize,
    pub contacts: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct MergeMeta {
    pub engine_version: String,
    pub run_at: String,
}

impl MergeMeta {
    pub fn now() -> Self {
        Self {
            engine_version: env!("CARGO_PKG_VERSION").to_string(),
            run_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MergeResult {
    pub meta: MergeMeta,
    pub summary: MergeSummary,
    pub files: Vec<FileReport>,
    pub contacts: ContactSet,
}

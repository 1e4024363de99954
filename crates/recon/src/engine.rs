//! Run driver: parsed files in, one deduplicated contact set out.
//!
//! Each file is folded into an accumulator independently. A file that failed
//! to parse (or produced a malformed table) is recorded and skipped; it never
//! aborts the run.

use crate::classify::{Classified, Classifier};
use crate::config::MergeConfig;
use crate::dedup::dedup;
use crate::error::{ParseFailure, ReconError};
use crate::merge::merge_tables;
use crate::model::{ContactSet, ParsedSource, SourceFile, SourceTable};
use crate::noise::NoiseFilter;
use crate::normalize::normalize;
use crate::report::{FileReport, FileStatus, MergeMeta, MergeResult, MergeSummary};

#[derive(Debug, Clone)]
pub enum MergeOutcome {
    /// No usable table: nothing to merge, nothing to export.
    AwaitingInput { failures: Vec<ParseFailure> },
    Merged(MergeResult),
}

impl MergeOutcome {
    pub fn failures(&self) -> Vec<ParseFailure> {
        match self {
            Self::AwaitingInput { failures } => failures.clone(),
            Self::Merged(result) => result
                .files
                .iter()
                .filter_map(|f| match &f.status {
                    FileStatus::Failed { message } => Some(ParseFailure::new(&f.name, message)),
                    FileStatus::Loaded { .. } => None,
                })
                .collect(),
        }
    }
}

// ---------------------------------------------------------------------------
// Per-table pipeline
// ---------------------------------------------------------------------------

/// Normalize → filter → classify, for one table.
#[derive(Debug, Clone)]
pub struct Pipeline {
    noise: NoiseFilter,
    classifier: Classifier,
}

/// A table ready to be projected, plus what happened to it on the way.
#[derive(Debug, Clone)]
pub struct PreparedTable {
    pub labels: Vec<String>,
    pub dropped_noise: Vec<String>,
    pub table: SourceTable,
    pub classified: Classified,
}

impl PreparedTable {
    fn report(&self, name: &str) -> FileReport {
        FileReport {
            name: name.to_string(),
            status: FileStatus::Loaded {
                rows: self.table.row_count(),
                labels: self.labels.clone(),
                dropped_noise: self.dropped_noise.clone(),
                columns: self.classified.columns.clone(),
            },
        }
    }
}

impl Pipeline {
    pub fn from_config(config: &MergeConfig) -> Self {
        Self {
            noise: NoiseFilter::from_config(&config.filter),
            classifier: Classifier::from_config(&config.classify),
        }
    }

    pub fn prepare(&self, source: ParsedSource) -> Result<PreparedTable, ReconError> {
        let table = normalize(source)?;
        let labels = table.labels();
        let (table, dropped_noise) = self.noise.apply(table);
        let classified = self.classifier.classify(&table);
        Ok(PreparedTable { labels, dropped_noise, table, classified })
    }
}

// ---------------------------------------------------------------------------
// Fold
// ---------------------------------------------------------------------------

#[derive(Default)]
struct Accumulator {
    tables: Vec<PreparedTable>,
    files: Vec<FileReport>,
    failures: Vec<ParseFailure>,
}

impl Accumulator {
    fn absorb(mut self, pipeline: &Pipeline, file: SourceFile) -> Self {
        let prepared = file
            .parsed
            .and_then(|source| {
                pipeline
                    .prepare(source)
                    .map_err(|e| ParseFailure::new(&file.name, e))
            });

        match prepared {
            Ok(prepared) => {
                log::debug!(
                    "{}: {} row(s), {} of {} column(s) mapped",
                    file.name,
                    prepared.table.row_count(),
                    prepared.classified.classification.mapped_count(),
                    prepared.table.columns().len()
                );
                self.files.push(prepared.report(&file.name));
                self.tables.push(prepared);
            }
            Err(failure) => {
                log::warn!("skipping {}: {}", failure.file, failure.message);
                self.files.push(FileReport {
                    name: file.name,
                    status: FileStatus::Failed { message: failure.message.clone() },
                });
                self.failures.push(failure);
            }
        }
        self
    }
}

/// Merge every file into one contact set.
///
/// Returns `AwaitingInput` when no file produced a usable table.
pub fn run<I>(config: &MergeConfig, files: I) -> MergeOutcome
where
    I: IntoIterator<Item = SourceFile>,
{
    let pipeline = Pipeline::from_config(config);
    let acc = files
        .into_iter()
        .fold(Accumulator::default(), |acc, file| acc.absorb(&pipeline, file));

    if acc.tables.is_empty() {
        log::info!("no usable input ({} file(s) failed)", acc.failures.len());
        return MergeOutcome::AwaitingInput { failures: acc.failures };
    }

    let rows = merge_tables(
        acc.tables
            .iter()
            .map(|t| (&t.table, &t.classified.classification)),
    );
    let rows_merged = rows.len();
    let (kept, duplicates_dropped) = dedup(rows);
    let summary = MergeSummary {
        files_loaded: acc.tables.len(),
        files_failed: acc.failures.len(),
        rows_merged,
        duplicates_dropped,
        contacts: kept.len(),
    };
    log::info!(
        "merged {} file(s): {} row(s), {} duplicate(s) dropped, {} contact(s)",
        summary.files_loaded,
        summary.rows_merged,
        summary.duplicates_dropped,
        summary.contacts
    );

    MergeOutcome::Merged(MergeResult {
        meta: MergeMeta::now(),
        summary,
        files: acc.files,
        contacts: ContactSet::new(kept),
    })
}

/// Classification-only dry run for one file.
pub fn inspect(config: &MergeConfig, file: SourceFile) -> FileReport {
    let pipeline = Pipeline::from_config(config);
    let name = file.name;
    match file.parsed.and_then(|source| {
        pipeline.prepare(source).map_err(|e| ParseFailure::new(&name, e))
    }) {
        Ok(prepared) => prepared.report(&name),
        Err(failure) => FileReport {
            name: name.clone(),
            status: FileStatus::Failed { message: failure.message },
        },
    }
}

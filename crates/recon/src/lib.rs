//! `kesher-recon`: contact schema reconciliation engine.
//!
//! Pure engine crate: receives pre-parsed tables, returns one deduplicated
//! contact set in the canonical five-field schema. No file IO.

pub mod classify;
pub mod config;
pub mod dedup;
pub mod engine;
pub mod error;
pub mod merge;
pub mod model;
pub mod noise;
pub mod normalize;
pub mod report;

pub use config::MergeConfig;
pub use engine::{inspect, run, MergeOutcome};
pub use error::{ParseFailure, ReconError};
pub use model::{
    CanonicalField, CanonicalRow, ColumnClassification, ContactSet, HeaderMode, ParsedSource,
    RawTable, SourceColumn, SourceFile, SourceTable,
};
pub use report::MergeResult;

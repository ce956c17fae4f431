//! From raw source rows to a finalized dataset.
//!
//! - [`normalizer`]: per-source rows into canonical objects
//! - [`merger`]: the run state machine (normalize, cross-match, enrich)
//! - [`enricher`]: derived quantities for every object
//! - [`validator`]: dataset invariants checked before a run is finalized
//! - [`fallback`]: versioned reference values for well-known objects
//! - [`pipeline`]: configured files in, dataset files out

pub mod enricher;
pub mod fallback;
pub mod merger;
pub mod normalizer;
pub mod pipeline;
pub mod validator;

#[cfg(test)]
mod merger_tests;

pub use enricher::ObjectEnricher;
pub use fallback::FallbackTable;
pub use merger::{CatalogMerger, FinalizedDataset, MergeOutcome, MergeSettings, RunReport, RunState, SourceInput};
pub use normalizer::{NormalizedBatch, Normalizer, Rejection};
pub use pipeline::{run_pipeline, AtlasPipeline};
pub use validator::{DatasetValidator, ValidationResult, ValidationStats};

//! Parsers for raw catalog tables.
//!
//! # Parsers
//!
//! - [`sources`]: per-source raw row types and their column tables
//! - [`csv_parser`]: CSV sources through Polars
//! - [`json_parser`]: JSON sources through serde
//! - [`identifiers`]: Gaia source ids, SIMBAD aliases, Messier designations
//!
//! # Example
//!
//! ```no_run
//! use cosmic_atlas::core::domain::SourceCatalog;
//! use cosmic_atlas::parsing::csv_parser::parse_catalog_csv;
//! use std::path::Path;
//!
//! let rows = parse_catalog_csv(Path::new("gaia_host_stars_raw.csv"), SourceCatalog::Gaia)
//!     .expect("Failed to parse Gaia table");
//! ```

pub mod csv_parser;
pub mod identifiers;
pub mod json_parser;
pub mod sources;


pub use identifiers::{parse_source_id, SourceId, MIN_GAIA_SOURCE_ID};
pub use sources::RawSourceRecord;

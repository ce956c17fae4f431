//! Reading source tables and writing finished datasets.
//!
//! [`loaders`] detects the file format and turns a configured path into a
//! merge input, reporting missing or unreadable sources instead of failing.
//! [`writers`] exports a finalized dataset to the viewer document, Parquet,
//! CSV and a Zarr-layout array store, and [`checksum`] fingerprints every
//! written file.
//!
//! # Example
//!
//! ```no_run
//! use cosmic_atlas::core::domain::SourceCatalog;
//! use cosmic_atlas::io::loaders::CatalogLoader;
//! use std::path::Path;
//!
//! let result = CatalogLoader::load_from_file(Path::new("nasa_exoplanets.csv"), SourceCatalog::Exoplanets)
//!     .expect("Failed to load");
//! println!("Loaded {} rows", result.num_rows);
//! ```

pub mod checksum;
pub mod loaders;
pub mod writers;


pub use checksum::{fingerprint_bytes, fingerprint_file};
pub use loaders::{CatalogFormat, CatalogLoadResult, CatalogLoader};
pub use writers::{viewer_document, DatasetWriter, ViewerDocument, ViewerStar};

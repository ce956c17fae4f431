use anyhow::{Context, Result};
use log::{info, warn};
use std::path::Path;

use crate::core::domain::SourceCatalog;
use crate::parsing::sources::RawSourceRecord;
use crate::parsing::{csv_parser, json_parser};
use crate::preprocessing::merger::SourceInput;

/// On-disk format of a catalog file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogFormat {
    Json,
    Csv,
}

/// Result of loading one catalog
#[derive(Debug)]
pub struct CatalogLoadResult {
    pub catalog: SourceCatalog,
    pub records: Vec<RawSourceRecord>,
    pub format: CatalogFormat,
    pub num_rows: usize,
}

impl CatalogLoadResult {
    pub fn new(catalog: SourceCatalog, records: Vec<RawSourceRecord>, format: CatalogFormat) -> Self {
        let num_rows = records.len();
        Self {
            catalog,
            records,
            format,
            num_rows,
        }
    }
}

/// Unified interface for loading catalog tables from JSON or CSV
pub struct CatalogLoader;

impl CatalogLoader {
    /// Format implied by the file extension
    pub fn detect_format(path: &Path) -> Result<CatalogFormat> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .context("File has no extension")?;

        match extension.to_lowercase().as_str() {
            "json" => Ok(CatalogFormat::Json),
            "csv" => Ok(CatalogFormat::Csv),
            _ => anyhow::bail!("Unsupported file format: {}", extension),
        }
    }

    /// Load a catalog from a file (auto-detects JSON or CSV)
    pub fn load_from_file(path: &Path, catalog: SourceCatalog) -> Result<CatalogLoadResult> {
        match Self::detect_format(path)? {
            CatalogFormat::Json => Self::load_from_json(path, catalog),
            CatalogFormat::Csv => Self::load_from_csv(path, catalog),
        }
    }

    /// Load a catalog from a JSON file
    pub fn load_from_json(json_path: &Path, catalog: SourceCatalog) -> Result<CatalogLoadResult> {
        let records = json_parser::parse_catalog_json(json_path, catalog)
            .with_context(|| format!("Failed to parse {} JSON file", catalog))?;

        Ok(CatalogLoadResult::new(catalog, records, CatalogFormat::Json))
    }

    /// Load a catalog from a JSON string
    pub fn load_from_json_str(json_str: &str, catalog: SourceCatalog) -> Result<CatalogLoadResult> {
        let records = json_parser::parse_catalog_json_str(json_str, catalog)
            .with_context(|| format!("Failed to parse {} JSON string", catalog))?;

        Ok(CatalogLoadResult::new(catalog, records, CatalogFormat::Json))
    }

    /// Load a catalog from a CSV file
    pub fn load_from_csv(csv_path: &Path, catalog: SourceCatalog) -> Result<CatalogLoadResult> {
        let records = csv_parser::parse_catalog_csv(csv_path, catalog)
            .with_context(|| format!("Failed to parse {} CSV file", catalog))?;

        Ok(CatalogLoadResult::new(catalog, records, CatalogFormat::Csv))
    }

    /// Load a configured source for a merge run.
    ///
    /// A source that is not configured, missing or unreadable comes back
    /// as unavailable with the reason; it never aborts the run.
    pub fn load_source(catalog: SourceCatalog, path: Option<&Path>) -> SourceInput {
        let Some(path) = path else {
            return SourceInput::unavailable(catalog, "not configured");
        };
        if !path.exists() {
            warn!("{} source not found at {}", catalog, path.display());
            return SourceInput::unavailable(catalog, format!("file not found: {}", path.display()));
        }

        match Self::load_from_file(path, catalog) {
            Ok(result) => {
                info!("Loaded {} {} rows from {}", result.num_rows, catalog, path.display());
                SourceInput::loaded(catalog, result.records)
            }
            Err(e) => {
                warn!("{} source unreadable: {:#}", catalog, e);
                SourceInput::unavailable(catalog, format!("{:#}", e))
            }
        }
    }
}

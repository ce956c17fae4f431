use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::path::Path;

use crate::core::domain::SourceCatalog;
use crate::parsing::sources::{
    ExoplanetRow, GaiaRow, MessierRow, RawSourceRecord, SimbadRow, SolarSystemRow, SourceSchema,
};

/// Object form of a JSON source, `{"rows": [...]}`
#[derive(Debug, Deserialize)]
struct WrappedRows<T> {
    rows: Vec<T>,
}

/// Parse a JSON source file into raw rows of type `T`
pub fn parse_source_json<T: DeserializeOwned>(json_path: &Path) -> Result<Vec<T>> {
    let json_content = std::fs::read_to_string(json_path)
        .with_context(|| format!("Failed to read JSON file: {}", json_path.display()))?;

    parse_source_json_str(&json_content)
}

/// Parse source rows from a JSON string
///
/// Errors name the failing path, e.g. `rows[3].ra: invalid type`.
pub fn parse_source_json_str<T: DeserializeOwned>(json_str: &str) -> Result<Vec<T>> {
    // Syntax first, so malformed files get a preview instead of a path
    let json_value: serde_json::Value = serde_json::from_str(json_str).with_context(|| {
        let preview: String = json_str.chars().take(200).collect();
        format!("Invalid JSON syntax. First 200 chars: {}", preview)
    })?;

    if !json_value.is_array() && json_value.get("rows").is_none() {
        anyhow::bail!(
            "JSON source must be an array of rows or an object with a 'rows' key. Found keys: {:?}",
            json_value.as_object().map(|o| o.keys().collect::<Vec<_>>())
        );
    }

    let rows = match json_value {
        serde_json::Value::Array(_) => {
            serde_path_to_error::deserialize::<_, Vec<T>>(json_value)
                .map_err(|e| anyhow::anyhow!("Invalid row at {}: {}", e.path(), e.inner()))?
        }
        _ => {
            let wrapped: WrappedRows<T> = serde_path_to_error::deserialize(json_value)
                .map_err(|e| anyhow::anyhow!("Invalid row at {}: {}", e.path(), e.inner()))?;
            wrapped.rows
        }
    };

    Ok(rows)
}

/// Parse a JSON file of the given catalog into tagged raw records
pub fn parse_catalog_json(json_path: &Path, catalog: SourceCatalog) -> Result<Vec<RawSourceRecord>> {
    let json_content = std::fs::read_to_string(json_path)
        .with_context(|| format!("Failed to read JSON file: {}", json_path.display()))?;

    parse_catalog_json_str(&json_content, catalog)
}

/// Parse a JSON string of the given catalog into tagged raw records
pub fn parse_catalog_json_str(json_str: &str, catalog: SourceCatalog) -> Result<Vec<RawSourceRecord>> {
    fn records<S: SourceSchema + DeserializeOwned>(json_str: &str) -> Result<Vec<RawSourceRecord>> {
        Ok(parse_source_json_str::<S>(json_str)?
            .into_iter()
            .map(S::into_record)
            .collect())
    }

    match catalog {
        SourceCatalog::Exoplanets => records::<ExoplanetRow>(json_str),
        SourceCatalog::Gaia => records::<GaiaRow>(json_str),
        SourceCatalog::Simbad => records::<SimbadRow>(json_str),
        SourceCatalog::Messier => records::<MessierRow>(json_str),
        SourceCatalog::SolarSystem => records::<SolarSystemRow>(json_str),
        SourceCatalog::Fallback => {
            anyhow::bail!("The fallback table has its own loader, see preprocessing::fallback")
        }
    }
}

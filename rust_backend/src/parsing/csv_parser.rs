use anyhow::{Context, Result};
use polars::prelude::*;
use std::collections::HashMap;
use std::path::Path;

use crate::core::domain::SourceCatalog;
use crate::parsing::sources::{
    ColumnLookup, ExoplanetRow, GaiaRow, MessierRow, RawSourceRecord, SimbadRow, SolarSystemRow,
    SourceSchema,
};

/// Parse a CSV file into a Polars DataFrame with the schema's columns typed
///
/// Float columns are cast to Float64 and text columns to String; columns the
/// file does not have are simply absent from the result.
pub fn parse_source_csv_dataframe<S: SourceSchema>(csv_path: &Path) -> Result<DataFrame> {
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .try_into_reader_with_file_path(Some(csv_path.into()))?
        .finish()
        .context("Failed to parse CSV into DataFrame")?;

    cast_to_schema::<S>(df)
}

/// Cast the columns named by `S` to their expected types
pub fn cast_to_schema<S: SourceSchema>(df: DataFrame) -> Result<DataFrame> {
    let column_names: Vec<String> = df
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();

    let mut lazy_df = df.lazy();

    // Ids are read as integers by inference but must stay text to keep every digit
    for col_name in S::TEXT_COLUMNS {
        if column_names.iter().any(|c| c == col_name) {
            lazy_df = lazy_df.with_column(col(*col_name).cast(DataType::String));
        }
    }

    // Numeric columns that may be inferred as i64 or as strings when empty
    for col_name in S::FLOAT_COLUMNS {
        if column_names.iter().any(|c| c == col_name) {
            lazy_df = lazy_df.with_column(col(*col_name).cast(DataType::Float64));
        }
    }

    let df = lazy_df
        .collect()
        .context("Failed to cast columns to expected types")?;

    Ok(df)
}

/// Typed, read-only view over the columns a schema cares about.
struct SchemaColumns {
    floats: HashMap<&'static str, Float64Chunked>,
    texts: HashMap<&'static str, StringChunked>,
}

impl SchemaColumns {
    fn new<S: SourceSchema>(df: &DataFrame) -> Self {
        let floats = S::FLOAT_COLUMNS
            .iter()
            .filter_map(|name| {
                df.column(name)
                    .ok()
                    .and_then(|c| c.f64().ok())
                    .map(|ca| (*name, ca.clone()))
            })
            .collect();
        let texts = S::TEXT_COLUMNS
            .iter()
            .filter_map(|name| {
                df.column(name)
                    .ok()
                    .and_then(|c| c.str().ok())
                    .map(|ca| (*name, ca.clone()))
            })
            .collect();
        Self { floats, texts }
    }
}

struct RowView<'a> {
    columns: &'a SchemaColumns,
    row: usize,
}

impl ColumnLookup for RowView<'_> {
    fn float(&self, column: &str) -> Option<f64> {
        self.columns.floats.get(column).and_then(|ca| ca.get(self.row))
    }

    fn text(&self, column: &str) -> Option<String> {
        self.columns
            .texts
            .get(column)
            .and_then(|ca| ca.get(self.row))
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }
}

/// Convert a typed DataFrame into raw rows of schema `S`
pub fn dataframe_to_rows<S: SourceSchema>(df: &DataFrame) -> Vec<S> {
    let columns = SchemaColumns::new::<S>(df);
    (0..df.height())
        .map(|row| {
            S::from_columns(&RowView {
                columns: &columns,
                row,
            })
        })
        .collect()
}

/// Parse a CSV file into raw rows of schema `S`
pub fn parse_source_csv<S: SourceSchema>(csv_path: &Path) -> Result<Vec<S>> {
    let df = parse_source_csv_dataframe::<S>(csv_path)?;
    Ok(dataframe_to_rows::<S>(&df))
}

/// Parse a CSV file of the given catalog into tagged raw records
pub fn parse_catalog_csv(csv_path: &Path, catalog: SourceCatalog) -> Result<Vec<RawSourceRecord>> {
    fn records<S: SourceSchema>(path: &Path) -> Result<Vec<RawSourceRecord>> {
        Ok(parse_source_csv::<S>(path)?
            .into_iter()
            .map(S::into_record)
            .collect())
    }

    match catalog {
        SourceCatalog::Exoplanets => records::<ExoplanetRow>(csv_path),
        SourceCatalog::Gaia => records::<GaiaRow>(csv_path),
        SourceCatalog::Simbad => records::<SimbadRow>(csv_path),
        SourceCatalog::Messier => records::<MessierRow>(csv_path),
        SourceCatalog::SolarSystem => records::<SolarSystemRow>(csv_path),
        SourceCatalog::Fallback => anyhow::bail!("The fallback table is not read from CSV"),
    }
}

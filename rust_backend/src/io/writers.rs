//! Export of a finalized dataset.
//!
//! Every format is an independent view of the same objects. Unknown values
//! are written as the format's null (JSON `null`, Arrow/CSV null) or, in the
//! array store, as NaN next to an explicit mask array. They are never 0.

use anyhow::{Context, Result};
use log::info;
use ndarray::{Array1, Array2};
use polars::prelude::*;
use serde::Serialize;
use serde_json::json;
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use crate::algorithms::derived::{display_color, display_size};
use crate::config::{ExplorableSettings, OutputFormat, OutputSettings, PipelineConfig};
use crate::core::domain::{
    CanonicalObject, Habitability, Measurement, ObjectKind, PhysicalProperties, PlanetClass,
    StellarClass,
};
use crate::io::checksum::fingerprint_file;
use crate::preprocessing::merger::{FinalizedDataset, RunReport};
use crate::transformations::explorable::{extract_explorable, ExplorablePlanet};

pub const VIEWER_FILE: &str = "stars.json";
pub const PARQUET_FILE: &str = "catalog.parquet";
pub const CSV_FILE: &str = "catalog.csv";
pub const ARRAY_STORE_DIR: &str = "arrays";
pub const EXPLORABLE_FILE: &str = "explorable_exoplanets.parquet";
pub const REPORT_FILE: &str = "run_report.json";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewerPosition {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ViewerColor {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

/// One entry of the viewer document. Unknown numbers are `null`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewerStar {
    pub position: ViewerPosition,
    pub color: ViewerColor,
    pub size: f32,
    pub magnitude: Option<f64>,
    pub display_name: String,
    pub star_type: String,
    pub distance_ly: Option<f64>,
    pub temperature: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewerMetadata {
    pub total_stars: usize,
    pub exported: usize,
    pub skipped_unknown_position: usize,
    /// 0 means unlimited
    pub max_stars: usize,
    pub position_units: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ViewerDocument {
    pub stars: Vec<ViewerStar>,
    pub metadata: ViewerMetadata,
}

/// Builds the viewer document from the stars of a dataset.
///
/// Stars without a Cartesian position are skipped and counted. The rest
/// are ordered brightest first (unknown magnitude last, then `object_id`)
/// and cut to `max_stars` unless it is 0.
pub fn viewer_document(objects: &[CanonicalObject], max_stars: usize) -> ViewerDocument {
    let stars: Vec<&CanonicalObject> = objects.iter().filter(|o| o.kind == ObjectKind::Star).collect();
    let mut placed: Vec<&CanonicalObject> = stars.iter().copied().filter(|o| o.cartesian().is_some()).collect();
    let skipped = stars.len() - placed.len();

    placed.sort_by(|a, b| {
        let by_magnitude = match (a.physical.apparent_magnitude.value(), b.physical.apparent_magnitude.value()) {
            (Some(ma), Some(mb)) => ma.total_cmp(&mb),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        };
        by_magnitude.then_with(|| a.object_id.cmp(&b.object_id))
    });
    if max_stars > 0 {
        placed.truncate(max_stars);
    }

    let entries: Vec<ViewerStar> = placed
        .iter()
        .filter_map(|star| {
            let c = star.cartesian()?;
            let [r, g, b] = display_color(star.derived.stellar_class);
            Some(ViewerStar {
                position: ViewerPosition { x: c.x, y: c.y, z: c.z },
                color: ViewerColor { r, g, b },
                size: display_size(star.physical.apparent_magnitude),
                magnitude: star.physical.apparent_magnitude.value(),
                display_name: star.display_name().to_string(),
                star_type: star.derived.stellar_class.star_type(),
                distance_ly: star.distance_ly().value(),
                temperature: star.physical.temperature_k.value(),
            })
        })
        .collect();

    ViewerDocument {
        metadata: ViewerMetadata {
            total_stars: stars.len(),
            exported: entries.len(),
            skipped_unknown_position: skipped,
            max_stars,
            position_units: "light_years",
        },
        stars: entries,
    }
}

fn label<T: PartialEq + Copy>(value: T, unknown: T, as_str: fn(&T) -> &'static str) -> Option<String> {
    (value != unknown).then(|| as_str(&value).to_string())
}

fn measurements(objects: &[CanonicalObject], get: impl Fn(&CanonicalObject) -> Measurement) -> Vec<Option<f64>> {
    objects.iter().map(|o| get(o).value()).collect()
}

/// One row per object with every canonical field as a column.
pub fn catalog_dataframe(objects: &[CanonicalObject]) -> PolarsResult<DataFrame> {
    let mut columns = vec![
        Column::new("object_id".into(), objects.iter().map(|o| o.object_id.clone()).collect::<Vec<_>>()),
        Column::new("kind".into(), objects.iter().map(|o| o.kind.as_str()).collect::<Vec<_>>()),
        Column::new("source".into(), objects.iter().map(|o| o.source.as_str()).collect::<Vec<_>>()),
        Column::new("name".into(), objects.iter().map(|o| o.name.clone()).collect::<Vec<_>>()),
        Column::new("host_id".into(), objects.iter().map(|o| o.host_id.clone()).collect::<Vec<_>>()),
        Column::new("ra_deg".into(), objects.iter().map(|o| o.sky_position().ra().value()).collect::<Vec<_>>()),
        Column::new("dec_deg".into(), objects.iter().map(|o| o.sky_position().dec().value()).collect::<Vec<_>>()),
        Column::new("distance_ly".into(), measurements(objects, |o| o.distance_ly())),
        Column::new("distance_known".into(), objects.iter().map(|o| o.distance_ly().is_known()).collect::<Vec<_>>()),
        Column::new("x_ly".into(), objects.iter().map(|o| o.cartesian().map(|c| c.x)).collect::<Vec<_>>()),
        Column::new("y_ly".into(), objects.iter().map(|o| o.cartesian().map(|c| c.y)).collect::<Vec<_>>()),
        Column::new("z_ly".into(), objects.iter().map(|o| o.cartesian().map(|c| c.z)).collect::<Vec<_>>()),
    ];

    for (i, name) in PhysicalProperties::FIELD_NAMES.iter().enumerate() {
        let values: Vec<Option<f64>> = objects.iter().map(|o| o.physical.values()[i].value()).collect();
        columns.push(Column::new((*name).into(), values));
    }

    columns.extend([
        Column::new(
            "stellar_class".into(),
            objects
                .iter()
                .map(|o| label(o.derived.stellar_class, StellarClass::Unknown, StellarClass::as_str))
                .collect::<Vec<_>>(),
        ),
        Column::new("equilibrium_temp_k".into(), measurements(objects, |o| o.derived.equilibrium_temp_k)),
        Column::new("esi".into(), measurements(objects, |o| o.derived.esi)),
        Column::new(
            "planet_class".into(),
            objects
                .iter()
                .map(|o| label(o.derived.planet_class, PlanetClass::Unknown, PlanetClass::as_str))
                .collect::<Vec<_>>(),
        ),
        Column::new(
            "habitability".into(),
            objects
                .iter()
                .map(|o| label(o.derived.habitability, Habitability::Unknown, Habitability::as_str))
                .collect::<Vec<_>>(),
        ),
        Column::new("surface_gravity_m_s2".into(), measurements(objects, |o| o.derived.surface_gravity_m_s2)),
        Column::new("escape_velocity_km_s".into(), measurements(objects, |o| o.derived.escape_velocity_km_s)),
        Column::new(
            "quality_flags".into(),
            objects
                .iter()
                .map(|o| o.quality_flags.iter().map(|f| f.as_str()).collect::<Vec<_>>().join(";"))
                .collect::<Vec<_>>(),
        ),
        Column::new(
            "cross_refs".into(),
            objects
                .iter()
                .map(|o| {
                    o.cross_refs
                        .iter()
                        .map(|(catalog, id)| format!("{}={}", catalog, id))
                        .collect::<Vec<_>>()
                        .join(";")
                })
                .collect::<Vec<_>>(),
        ),
    ]);

    DataFrame::new(columns)
}

/// Catalog columns for the ranked planets plus their scores.
pub fn explorable_dataframe(planets: &[ExplorablePlanet<'_>]) -> PolarsResult<DataFrame> {
    let objects: Vec<CanonicalObject> = planets.iter().map(|p| p.object.clone()).collect();
    let mut df = catalog_dataframe(&objects)?;
    df.with_column(Column::new(
        "known_fields".into(),
        planets.iter().map(|p| p.known_fields as u32).collect::<Vec<_>>(),
    ))?;
    df.with_column(Column::new(
        "playability".into(),
        planets.iter().map(|p| p.playability).collect::<Vec<_>>(),
    ))?;
    Ok(df)
}

/// Writes a finalized dataset in the configured formats.
///
/// # Examples
///
/// ```no_run
/// use cosmic_atlas::config::PipelineConfig;
/// use cosmic_atlas::io::writers::DatasetWriter;
/// # use cosmic_atlas::preprocessing::merger::FinalizedDataset;
///
/// # fn example(dataset: &FinalizedDataset) -> anyhow::Result<()> {
/// let writer = DatasetWriter::from_config(&PipelineConfig::default());
/// let fingerprints = writer.write_all(dataset)?;
/// for (file, sha) in &fingerprints {
///     println!("{} {}", sha, file);
/// }
/// # Ok(())
/// # }
/// ```
pub struct DatasetWriter {
    output: OutputSettings,
    explorable: ExplorableSettings,
}

impl DatasetWriter {
    pub fn new(output: OutputSettings, explorable: ExplorableSettings) -> Self {
        Self { output, explorable }
    }

    pub fn from_config(config: &PipelineConfig) -> Self {
        Self::new(config.output.clone(), config.explorable.clone())
    }

    pub fn output_dir(&self) -> &Path {
        &self.output.directory
    }

    fn ensure_dir(dir: &Path) -> Result<()> {
        fs::create_dir_all(dir).with_context(|| format!("Failed to create output directory {}", dir.display()))
    }

    /// Writes every configured format and returns the SHA-256 of each
    /// file, keyed by its path relative to the output directory.
    pub fn write_all(&self, dataset: &FinalizedDataset) -> Result<BTreeMap<String, String>> {
        let dir = self.output_dir();
        Self::ensure_dir(dir)?;
        let objects = dataset.objects();

        let mut written = Vec::new();
        for format in [
            OutputFormat::ViewerJson,
            OutputFormat::Parquet,
            OutputFormat::Csv,
            OutputFormat::ArrayStore,
            OutputFormat::Explorable,
        ] {
            if !self.output.wants(format) {
                continue;
            }
            let files = match format {
                OutputFormat::ViewerJson => vec![self.write_viewer_json(objects)?],
                OutputFormat::Parquet => vec![self.write_parquet(objects)?],
                OutputFormat::Csv => vec![self.write_csv(objects)?],
                OutputFormat::ArrayStore => self.write_array_store(objects)?,
                OutputFormat::Explorable => vec![self.write_explorable(objects)?],
            };
            written.extend(files);
        }

        let mut fingerprints = BTreeMap::new();
        for path in written {
            let key = path
                .strip_prefix(dir)
                .unwrap_or(&path)
                .to_string_lossy()
                .replace('\\', "/");
            fingerprints.insert(key, fingerprint_file(&path)?);
        }
        info!("Wrote {} files to {}", fingerprints.len(), dir.display());
        Ok(fingerprints)
    }

    pub fn write_viewer_json(&self, objects: &[CanonicalObject]) -> Result<PathBuf> {
        let path = self.output_dir().join(VIEWER_FILE);
        let document = viewer_document(objects, self.output.viewer_max_stars);
        let content = serde_json::to_string_pretty(&document).context("Failed to serialize viewer document")?;
        fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        info!(
            "Viewer document: {} stars ({} without position skipped)",
            document.metadata.exported, document.metadata.skipped_unknown_position
        );
        Ok(path)
    }

    pub fn write_parquet(&self, objects: &[CanonicalObject]) -> Result<PathBuf> {
        let path = self.output_dir().join(PARQUET_FILE);
        let mut df = catalog_dataframe(objects).context("Failed to build catalog DataFrame")?;
        write_parquet_file(&path, &mut df)?;
        Ok(path)
    }

    pub fn write_csv(&self, objects: &[CanonicalObject]) -> Result<PathBuf> {
        let path = self.output_dir().join(CSV_FILE);
        let mut df = catalog_dataframe(objects).context("Failed to build catalog DataFrame")?;
        let mut file = File::create(&path).with_context(|| format!("Failed to create {}", path.display()))?;
        CsvWriter::new(&mut file)
            .include_header(true)
            .finish(&mut df)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    pub fn write_explorable(&self, objects: &[CanonicalObject]) -> Result<PathBuf> {
        let path = self.output_dir().join(EXPLORABLE_FILE);
        let planets = extract_explorable(objects, self.explorable.min_fields, self.explorable.max_planets);
        let mut df = explorable_dataframe(&planets).context("Failed to build explorable DataFrame")?;
        write_parquet_file(&path, &mut df)?;
        info!("Explorable planets: {}", planets.len());
        Ok(path)
    }

    /// Zarr v2 group with one uncompressed chunk per array.
    pub fn write_array_store(&self, objects: &[CanonicalObject]) -> Result<Vec<PathBuf>> {
        let root = self.output_dir().join(ARRAY_STORE_DIR);
        Self::ensure_dir(&root)?;
        let n = objects.len();

        let mut positions = Array2::<f64>::from_elem((n, 3), f64::NAN);
        let mut position_known = Array1::<u8>::zeros(n);
        let mut sky = Array2::<f64>::zeros((n, 2));
        let mut distance = Array1::<f64>::from_elem(n, f64::NAN);
        let mut distance_known = Array1::<u8>::zeros(n);

        for (i, object) in objects.iter().enumerate() {
            if let Some(c) = object.cartesian() {
                positions.row_mut(i).assign(&Array1::from(c.as_array().to_vec()));
                position_known[i] = 1;
            }
            let s = object.sky_position();
            sky[[i, 0]] = s.ra().value();
            sky[[i, 1]] = s.dec().value();
            if let Some(d) = object.distance_ly().value() {
                distance[i] = d;
                distance_known[i] = 1;
            }
        }

        let mut files = Vec::new();
        let group = root.join(".zgroup");
        write_json(&group, &json!({ "zarr_format": 2 }))?;
        files.push(group);

        let attrs = root.join(".zattrs");
        let ids: Vec<&str> = objects.iter().map(|o| o.object_id.as_str()).collect();
        write_json(
            &attrs,
            &json!({
                "object_ids": ids,
                "units": { "positions": "light_years", "sky": "degrees", "distance_ly": "light_years" },
            }),
        )?;
        files.push(attrs);

        files.extend(write_zarr_array(&root, "positions", &[n, 3], ZarrDtype::F64, f64_bytes(positions.iter()))?);
        files.extend(write_zarr_array(&root, "position_known", &[n], ZarrDtype::U8, position_known.to_vec())?);
        files.extend(write_zarr_array(&root, "sky", &[n, 2], ZarrDtype::F64, f64_bytes(sky.iter()))?);
        files.extend(write_zarr_array(&root, "distance_ly", &[n], ZarrDtype::F64, f64_bytes(distance.iter()))?);
        files.extend(write_zarr_array(&root, "distance_known", &[n], ZarrDtype::U8, distance_known.to_vec())?);
        Ok(files)
    }

    /// Writes `run_report.json`.
    pub fn write_report(&self, report: &RunReport) -> Result<PathBuf> {
        let dir = self.output_dir();
        Self::ensure_dir(dir)?;
        let path = dir.join(REPORT_FILE);
        let content = serde_json::to_string_pretty(report).context("Failed to serialize run report")?;
        fs::write(&path, content).with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }
}

fn write_parquet_file(path: &Path, df: &mut DataFrame) -> Result<()> {
    let file = File::create(path).with_context(|| format!("Failed to create {}", path.display()))?;
    ParquetWriter::new(file)
        .finish(df)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

fn write_json(path: &Path, value: &serde_json::Value) -> Result<()> {
    let content = serde_json::to_string_pretty(value)?;
    fs::write(path, content).with_context(|| format!("Failed to write {}", path.display()))
}

/// Element types used in the array store.
#[derive(Debug, Clone, Copy)]
enum ZarrDtype {
    F64,
    U8,
}

impl ZarrDtype {
    fn code(self) -> &'static str {
        match self {
            ZarrDtype::F64 => "<f8",
            ZarrDtype::U8 => "|u1",
        }
    }

    fn fill_value(self) -> serde_json::Value {
        match self {
            ZarrDtype::F64 => json!("NaN"),
            ZarrDtype::U8 => json!(0),
        }
    }
}

fn f64_bytes<'a>(values: impl Iterator<Item = &'a f64>) -> Vec<u8> {
    values.flat_map(|v| v.to_le_bytes()).collect()
}

fn write_zarr_array(root: &Path, name: &str, shape: &[usize], dtype: ZarrDtype, data: Vec<u8>) -> Result<Vec<PathBuf>> {
    let dir = root.join(name);
    fs::create_dir_all(&dir).with_context(|| format!("Failed to create {}", dir.display()))?;

    // A chunk spans the whole array; zero-length axes still need a chunk size of 1
    let chunks: Vec<usize> = shape.iter().map(|&d| d.max(1)).collect();
    let meta = dir.join(".zarray");
    write_json(
        &meta,
        &json!({
            "zarr_format": 2,
            "shape": shape,
            "chunks": chunks,
            "dtype": dtype.code(),
            "compressor": null,
            "fill_value": dtype.fill_value(),
            "order": "C",
            "filters": null,
        }),
    )?;

    let mut files = vec![meta];
    if shape.iter().all(|&d| d > 0) {
        let key = vec!["0"; shape.len()].join(".");
        let chunk = dir.join(key);
        fs::write(&chunk, data).with_context(|| format!("Failed to write {}", chunk.display()))?;
        files.push(chunk);
    }
    Ok(files)
}

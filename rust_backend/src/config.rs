//! Pipeline configuration file support.
//!
//! Settings are read from a TOML file. Every section has defaults, so an
//! empty file (or no file at all) yields a working configuration that
//! matches the catalogs' published conventions.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::error::{PipelineError, PipelineResult};
use crate::parsing::identifiers::MIN_GAIA_SOURCE_ID;

/// Pipeline configuration from file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub sources: SourceSettings,
    #[serde(default)]
    pub matching: MatchingSettings,
    #[serde(default)]
    pub derived: DerivedSettings,
    #[serde(default)]
    pub fallback: FallbackSettings,
    #[serde(default)]
    pub output: OutputSettings,
    #[serde(default)]
    pub explorable: ExplorableSettings,
    #[serde(default)]
    pub run: RunSettings,
}

/// Input table locations. An absent path means the source is unavailable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceSettings {
    #[serde(default)]
    pub exoplanets: Option<PathBuf>,
    #[serde(default)]
    pub gaia: Option<PathBuf>,
    #[serde(default)]
    pub simbad: Option<PathBuf>,
    #[serde(default)]
    pub messier: Option<PathBuf>,
    #[serde(default)]
    pub solar_system: Option<PathBuf>,
}

/// Cross-match tolerances and quality gates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchingSettings {
    #[serde(default = "default_gaia_tolerance")]
    pub gaia_tolerance_arcsec: f64,
    #[serde(default = "default_simbad_tolerance")]
    pub simbad_tolerance_arcsec: f64,
    /// Gaia RUWE must be strictly below this value.
    #[serde(default = "default_ruwe_threshold")]
    pub ruwe_threshold: f64,
    #[serde(default = "default_min_gaia_source_id")]
    pub min_gaia_source_id: u64,
    #[serde(default = "default_low_confidence_fraction")]
    pub low_confidence_fraction: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedSettings {
    /// Bond albedo used for equilibrium temperatures.
    #[serde(default = "default_albedo")]
    pub albedo: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FallbackSettings {
    /// JSON table replacing the built-in one.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

/// Export format selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputFormat {
    ViewerJson,
    Parquet,
    Csv,
    ArrayStore,
    Explorable,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(default = "default_output_directory")]
    pub directory: PathBuf,
    #[serde(default = "default_formats")]
    pub formats: Vec<OutputFormat>,
    /// Brightest stars kept in the viewer document; 0 keeps all.
    #[serde(default = "default_viewer_max_stars")]
    pub viewer_max_stars: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExplorableSettings {
    /// Known physical fields a planet needs to be listed.
    #[serde(default = "default_min_fields")]
    pub min_fields: usize,
    #[serde(default = "default_max_planets")]
    pub max_planets: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunSettings {
    /// A source rejecting a larger share of its rows fails the run.
    #[serde(default = "default_max_rejected_fraction")]
    pub max_rejected_fraction: f64,
}

fn default_gaia_tolerance() -> f64 {
    1.0
}

fn default_simbad_tolerance() -> f64 {
    5.0
}

fn default_ruwe_threshold() -> f64 {
    1.4
}

fn default_min_gaia_source_id() -> u64 {
    MIN_GAIA_SOURCE_ID
}

fn default_low_confidence_fraction() -> f64 {
    0.5
}

fn default_albedo() -> f64 {
    0.3
}

fn default_output_directory() -> PathBuf {
    PathBuf::from("data/processed")
}

fn default_formats() -> Vec<OutputFormat> {
    vec![
        OutputFormat::ViewerJson,
        OutputFormat::Parquet,
        OutputFormat::Csv,
        OutputFormat::ArrayStore,
        OutputFormat::Explorable,
    ]
}

fn default_viewer_max_stars() -> usize {
    500
}

fn default_min_fields() -> usize {
    5
}

fn default_max_planets() -> usize {
    200
}

fn default_max_rejected_fraction() -> f64 {
    1.0
}

impl Default for MatchingSettings {
    fn default() -> Self {
        Self {
            gaia_tolerance_arcsec: default_gaia_tolerance(),
            simbad_tolerance_arcsec: default_simbad_tolerance(),
            ruwe_threshold: default_ruwe_threshold(),
            min_gaia_source_id: default_min_gaia_source_id(),
            low_confidence_fraction: default_low_confidence_fraction(),
        }
    }
}

impl Default for DerivedSettings {
    fn default() -> Self {
        Self {
            albedo: default_albedo(),
        }
    }
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            directory: default_output_directory(),
            formats: default_formats(),
            viewer_max_stars: default_viewer_max_stars(),
        }
    }
}

impl Default for ExplorableSettings {
    fn default() -> Self {
        Self {
            min_fields: default_min_fields(),
            max_planets: default_max_planets(),
        }
    }
}

impl Default for RunSettings {
    fn default() -> Self {
        Self {
            max_rejected_fraction: default_max_rejected_fraction(),
        }
    }
}

impl OutputSettings {
    pub fn wants(&self, format: OutputFormat) -> bool {
        self.formats.contains(&format)
    }
}

impl PipelineConfig {
    /// Load pipeline configuration from a TOML file.
    ///
    /// Relative source, fallback and output paths are resolved against
    /// the directory containing the file.
    ///
    /// # Returns
    /// * `Ok(PipelineConfig)` if the file was read, parsed and validated
    /// * `Err(PipelineError::Configuration)` otherwise
    pub fn from_file<P: AsRef<Path>>(path: P) -> PipelineResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            PipelineError::Configuration(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;

        let mut config = Self::from_toml_str(&content)?;
        if let Some(base) = path.parent() {
            config.resolve_relative_to(base);
        }
        Ok(config)
    }

    /// Parse and validate configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> PipelineResult<Self> {
        let config: PipelineConfig = toml::from_str(content).map_err(|e| {
            PipelineError::Configuration(format!("Failed to parse config file: {}", e))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load pipeline configuration from the default location.
    ///
    /// Searches for `cosmic_atlas.toml` in:
    /// 1. Current directory
    /// 2. `rust_backend/` directory
    /// 3. Parent directory
    pub fn from_default_location() -> PipelineResult<Self> {
        let search_paths = [
            PathBuf::from("cosmic_atlas.toml"),
            PathBuf::from("rust_backend/cosmic_atlas.toml"),
            PathBuf::from("../cosmic_atlas.toml"),
        ];

        for path in search_paths {
            if path.exists() {
                return Self::from_file(&path);
            }
        }

        Err(PipelineError::Configuration(
            "No cosmic_atlas.toml found in standard locations".to_string(),
        ))
    }

    /// Check value ranges.
    pub fn validate(&self) -> PipelineResult<()> {
        let positive = |value: f64, name: &str| {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(PipelineError::Configuration(format!(
                    "'{}' must be a positive number, got {}",
                    name, value
                )))
            }
        };

        positive(self.matching.gaia_tolerance_arcsec, "matching.gaia_tolerance_arcsec")?;
        positive(self.matching.simbad_tolerance_arcsec, "matching.simbad_tolerance_arcsec")?;
        positive(self.matching.ruwe_threshold, "matching.ruwe_threshold")?;

        if !(0.0..=1.0).contains(&self.matching.low_confidence_fraction) {
            return Err(PipelineError::Configuration(format!(
                "'matching.low_confidence_fraction' must be in [0, 1], got {}",
                self.matching.low_confidence_fraction
            )));
        }
        if !(0.0..1.0).contains(&self.derived.albedo) {
            return Err(PipelineError::Configuration(format!(
                "'derived.albedo' must be in [0, 1), got {}",
                self.derived.albedo
            )));
        }
        if !(0.0..=1.0).contains(&self.run.max_rejected_fraction) {
            return Err(PipelineError::Configuration(format!(
                "'run.max_rejected_fraction' must be in [0, 1], got {}",
                self.run.max_rejected_fraction
            )));
        }
        Ok(())
    }

    fn resolve_relative_to(&mut self, base: &Path) {
        let resolve = |p: &mut PathBuf| {
            if p.is_relative() {
                *p = base.join(&*p);
            }
        };

        let sources = &mut self.sources;
        for path in [
            &mut sources.exoplanets,
            &mut sources.gaia,
            &mut sources.simbad,
            &mut sources.messier,
            &mut sources.solar_system,
            &mut self.fallback.path,
        ]
        .into_iter()
        .flatten()
        {
            resolve(path);
        }
        resolve(&mut self.output.directory);
    }
}

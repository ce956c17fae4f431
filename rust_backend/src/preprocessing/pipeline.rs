use anyhow::{Context, Result};
use log::{error, info};
use std::path::Path;

use crate::config::PipelineConfig;
use crate::core::domain::SourceCatalog;
use crate::io::loaders::CatalogLoader;
use crate::io::writers::DatasetWriter;
use crate::preprocessing::fallback::FallbackTable;
use crate::preprocessing::merger::{CatalogMerger, MergeOutcome, MergeSettings, RunReport, SourceInput};

/// File-level entry point: configured sources in, dataset files out
pub struct AtlasPipeline {
    config: PipelineConfig,
}

impl AtlasPipeline {
    /// Create a new pipeline with default configuration
    pub fn new() -> Self {
        Self {
            config: PipelineConfig::default(),
        }
    }

    /// Create a pipeline with custom configuration
    pub fn with_config(config: PipelineConfig) -> Self {
        Self { config }
    }

    /// Create a pipeline from a TOML configuration file
    pub fn from_config_file(path: &Path) -> Result<Self> {
        let config = PipelineConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
        Ok(Self::with_config(config))
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Configured fallback table, or the embedded one
    pub fn load_fallback(&self) -> Result<FallbackTable> {
        match &self.config.fallback.path {
            Some(path) => FallbackTable::from_file(path),
            None => Ok(FallbackTable::builtin().clone()),
        }
    }

    /// Load every configured source; absent ones come back unavailable
    pub fn load_sources(&self) -> Vec<SourceInput> {
        let sources = &self.config.sources;
        [
            (SourceCatalog::Exoplanets, &sources.exoplanets),
            (SourceCatalog::Gaia, &sources.gaia),
            (SourceCatalog::Simbad, &sources.simbad),
            (SourceCatalog::Messier, &sources.messier),
            (SourceCatalog::SolarSystem, &sources.solar_system),
        ]
        .into_iter()
        .map(|(catalog, path)| CatalogLoader::load_source(catalog, path.as_deref()))
        .collect()
    }

    /// Merge already loaded sources
    pub fn merge(&self, inputs: Vec<SourceInput>, fallback: &FallbackTable) -> MergeOutcome {
        CatalogMerger::new(MergeSettings::from_config(&self.config), fallback).run(inputs)
    }

    /// Run the whole pipeline.
    ///
    /// A finalized run writes every configured format. The run report is
    /// written in every case and returned; a failed run is reported through
    /// `report.state`, not as an `Err`. Errors are reserved for invalid
    /// configuration and for output that could not be written.
    pub fn run(&self) -> Result<RunReport> {
        self.config.validate().context("Invalid pipeline configuration")?;
        let fallback = self.load_fallback().context("Failed to load fallback table")?;
        let writer = DatasetWriter::from_config(&self.config);

        let inputs = self.load_sources();
        let report = match self.merge(inputs, &fallback) {
            MergeOutcome::Finalized(dataset) => {
                let mut report = dataset.report().clone();
                report.fingerprints = writer.write_all(&dataset)?;
                report
            }
            MergeOutcome::Failed(failed) => {
                error!(
                    "Run failed with {} partial objects; no dataset written",
                    failed.partial.len()
                );
                failed.report
            }
        };

        let path = writer.write_report(&report)?;
        info!("Run report written to {}", path.display());
        Ok(report)
    }
}

impl Default for AtlasPipeline {
    fn default() -> Self {
        Self::new()
    }
}

/// Convenience function: run with the given config file, or the default location
pub fn run_pipeline(config_path: Option<&Path>) -> Result<RunReport> {
    let pipeline = match config_path {
        Some(path) => AtlasPipeline::from_config_file(path)?,
        None => AtlasPipeline::with_config(PipelineConfig::from_default_location()?),
    };
    pipeline.run()
}

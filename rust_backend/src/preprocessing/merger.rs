//! Multi-source merge: normalization, cross-matching and enrichment.
//!
//! [`CatalogMerger`] walks one run through
//! `Idle → Normalizing → Matching → Enriching → Finalized`. A stage that
//! cannot recover moves the run to `Failed`, keeping the objects from the
//! last completed stage and the error list in the [`RunReport`].

use chrono::{DateTime, Utc};
use log::{error, info, warn};
use qtty::{Degrees, LightYear, Parsecs};
use rayon::prelude::*;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::algorithms::coordinates::angular_separation;
use crate::algorithms::matching::{
    CandidateMatch, CatalogEntry, CatalogIndex, MatchCriteria, SpatialMatcher,
};
use crate::config::PipelineConfig;
use crate::core::domain::{
    CanonicalObject, Measurement, ObjectKind, QualityFlag, SkyPosition, SourceCatalog,
};
use crate::core::error::{PipelineError, PipelineResult};
use crate::parsing::identifiers::parse_source_id;
use crate::parsing::sources::RawSourceRecord;
use crate::preprocessing::enricher::ObjectEnricher;
use crate::preprocessing::fallback::{FallbackHost, FallbackTable};
use crate::preprocessing::normalizer::{NormalizedBatch, Normalizer, Rejection};
use crate::preprocessing::validator::{DatasetValidator, ValidationResult};

/// Stage of a merge run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunState {
    Idle,
    Normalizing,
    Matching,
    Enriching,
    Finalized,
    Failed,
}

impl RunState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunState::Idle => "idle",
            RunState::Normalizing => "normalizing",
            RunState::Matching => "matching",
            RunState::Enriching => "enriching",
            RunState::Finalized => "finalized",
            RunState::Failed => "failed",
        }
    }

    /// The only state this one may advance to, apart from `Failed`.
    pub fn next(&self) -> Option<RunState> {
        match self {
            RunState::Idle => Some(RunState::Normalizing),
            RunState::Normalizing => Some(RunState::Matching),
            RunState::Matching => Some(RunState::Enriching),
            RunState::Enriching => Some(RunState::Finalized),
            RunState::Finalized | RunState::Failed => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, RunState::Finalized | RunState::Failed)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One source handed to the merger.
#[derive(Debug, Clone)]
pub struct SourceInput {
    pub catalog: SourceCatalog,
    pub status: SourceStatus,
}

#[derive(Debug, Clone)]
pub enum SourceStatus {
    Loaded(Vec<RawSourceRecord>),
    /// The source could not be consulted; the reason is reported.
    Unavailable(String),
}

impl SourceInput {
    pub fn loaded(catalog: SourceCatalog, records: Vec<RawSourceRecord>) -> Self {
        Self {
            catalog,
            status: SourceStatus::Loaded(records),
        }
    }

    pub fn unavailable(catalog: SourceCatalog, reason: impl Into<String>) -> Self {
        Self {
            catalog,
            status: SourceStatus::Unavailable(reason.into()),
        }
    }
}

/// Accepted/rejected/flagged counts for one stage.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StageCounts {
    pub accepted: usize,
    pub rejected: usize,
    pub flagged: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageError {
    pub stage: RunState,
    pub message: String,
}

/// What happened to one input source.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceSummary {
    pub catalog: SourceCatalog,
    pub available: bool,
    pub rows: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub note: Option<String>,
}

/// Per-run account of what was accepted, rejected and flagged.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub state: RunState,
    pub created_at: DateTime<Utc>,
    pub fallback_version: String,
    pub sources: Vec<SourceSummary>,
    pub stages: BTreeMap<RunState, StageCounts>,
    /// Cross-references added per catalog.
    pub cross_matches: BTreeMap<String, usize>,
    pub rejections: Vec<Rejection>,
    pub stage_errors: Vec<StageError>,
    pub validation: Option<ValidationResult>,
    /// SHA-256 of every written artifact, keyed by file name.
    pub fingerprints: BTreeMap<String, String>,
}

impl RunReport {
    fn new(fallback_version: &str) -> Self {
        Self {
            state: RunState::Idle,
            created_at: Utc::now(),
            fallback_version: fallback_version.to_string(),
            sources: Vec::new(),
            stages: BTreeMap::new(),
            cross_matches: BTreeMap::new(),
            rejections: Vec::new(),
            stage_errors: Vec::new(),
            validation: None,
            fingerprints: BTreeMap::new(),
        }
    }

    pub fn stage(&self, stage: RunState) -> StageCounts {
        self.stages.get(&stage).copied().unwrap_or_default()
    }
}

/// Tunables for one merge run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MergeSettings {
    pub gaia: MatchCriteria,
    pub simbad: MatchCriteria,
    pub min_gaia_source_id: u64,
    pub albedo: f64,
    pub max_rejected_fraction: f64,
}

impl Default for MergeSettings {
    fn default() -> Self {
        Self::from_config(&PipelineConfig::default())
    }
}

impl MergeSettings {
    pub fn from_config(config: &PipelineConfig) -> Self {
        let m = &config.matching;
        let mut gaia = MatchCriteria::new(m.gaia_tolerance_arcsec, Some(m.ruwe_threshold));
        gaia.low_confidence_fraction = m.low_confidence_fraction;
        let mut simbad = MatchCriteria::new(m.simbad_tolerance_arcsec, None);
        simbad.low_confidence_fraction = m.low_confidence_fraction;
        Self {
            gaia,
            simbad,
            min_gaia_source_id: m.min_gaia_source_id,
            albedo: config.derived.albedo,
            max_rejected_fraction: config.run.max_rejected_fraction,
        }
    }
}

/// Immutable result of a successful run.
#[derive(Debug, Clone)]
pub struct FinalizedDataset {
    objects: Vec<CanonicalObject>,
    report: RunReport,
}

impl FinalizedDataset {
    /// Objects sorted by `object_id`.
    pub fn objects(&self) -> &[CanonicalObject] {
        &self.objects
    }

    pub fn report(&self) -> &RunReport {
        &self.report
    }

    pub fn get(&self, object_id: &str) -> Option<&CanonicalObject> {
        self.objects
            .binary_search_by(|o| o.object_id.as_str().cmp(object_id))
            .ok()
            .map(|i| &self.objects[i])
    }
}

/// A run that stopped early.
#[derive(Debug, Clone)]
pub struct FailedRun {
    /// Objects as of the last completed stage.
    pub partial: Vec<CanonicalObject>,
    pub report: RunReport,
}

#[derive(Debug, Clone)]
pub enum MergeOutcome {
    Finalized(FinalizedDataset),
    Failed(FailedRun),
}

impl MergeOutcome {
    pub fn report(&self) -> &RunReport {
        match self {
            MergeOutcome::Finalized(dataset) => dataset.report(),
            MergeOutcome::Failed(failed) => &failed.report,
        }
    }

    pub fn is_finalized(&self) -> bool {
        matches!(self, MergeOutcome::Finalized(_))
    }
}

/// Candidate catalogs kept aside during normalization.
#[derive(Debug, Default)]
struct Candidates {
    gaia: Option<NormalizedBatch>,
    simbad: Option<NormalizedBatch>,
}

/// Orchestrates one merge run.
///
/// # Examples
///
/// ```no_run
/// use cosmic_atlas::preprocessing::fallback::FallbackTable;
/// use cosmic_atlas::preprocessing::merger::{CatalogMerger, MergeSettings, SourceInput};
/// use cosmic_atlas::core::domain::SourceCatalog;
///
/// let merger = CatalogMerger::new(MergeSettings::default(), FallbackTable::builtin());
/// let outcome = merger.run(vec![
///     SourceInput::unavailable(SourceCatalog::Gaia, "archive timeout"),
/// ]);
/// println!("{}", outcome.report().state);
/// ```
pub struct CatalogMerger<'a> {
    settings: MergeSettings,
    fallback: &'a FallbackTable,
    state: RunState,
    objects: Vec<CanonicalObject>,
    claimed_ids: BTreeMap<String, u64>,
    candidates: Candidates,
    report: RunReport,
}

impl<'a> CatalogMerger<'a> {
    pub fn new(settings: MergeSettings, fallback: &'a FallbackTable) -> Self {
        Self {
            settings,
            fallback,
            state: RunState::Idle,
            objects: Vec::new(),
            claimed_ids: BTreeMap::new(),
            candidates: Candidates::default(),
            report: RunReport::new(&fallback.version),
        }
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    pub fn objects(&self) -> &[CanonicalObject] {
        &self.objects
    }

    pub fn report(&self) -> &RunReport {
        &self.report
    }

    /// Runs every stage and returns the terminal outcome.
    pub fn run(mut self, inputs: Vec<SourceInput>) -> MergeOutcome {
        if let Err(e) = self.run_stages(inputs) {
            error!("Merge run failed: {}", e);
        }
        self.finish()
    }

    fn run_stages(&mut self, inputs: Vec<SourceInput>) -> PipelineResult<()> {
        self.normalize(inputs)?;
        self.match_catalogs()?;
        self.enrich()
    }

    /// Consumes the merger. `Finalized` only after a completed Enriching stage.
    pub fn finish(mut self) -> MergeOutcome {
        if self.state == RunState::Enriching {
            self.state = RunState::Finalized;
            self.report.state = RunState::Finalized;
            info!("Run finalized with {} objects", self.objects.len());
            MergeOutcome::Finalized(FinalizedDataset {
                objects: self.objects,
                report: self.report,
            })
        } else {
            if self.state != RunState::Failed {
                let reason = format!("run stopped in state {}", self.state);
                self.record_failure(self.state, reason);
            }
            MergeOutcome::Failed(FailedRun {
                partial: self.objects,
                report: self.report,
            })
        }
    }

    fn enter(&mut self, next: RunState) -> PipelineResult<()> {
        if self.state.next() != Some(next) {
            return Err(PipelineError::StageFailure {
                stage: next.to_string(),
                reason: format!("cannot enter {} from {}", next, self.state),
            });
        }
        info!("Entering stage {}", next);
        self.state = next;
        self.report.state = next;
        Ok(())
    }

    fn record_failure(&mut self, stage: RunState, reason: String) -> PipelineError {
        error!("Stage {} failed: {}", stage, reason);
        self.report.stage_errors.push(StageError {
            stage,
            message: reason.clone(),
        });
        self.state = RunState::Failed;
        self.report.state = RunState::Failed;
        PipelineError::StageFailure {
            stage: stage.to_string(),
            reason,
        }
    }

    fn flagged(objects: &[CanonicalObject]) -> usize {
        objects.iter().filter(|o| !o.quality_flags.is_empty()).count()
    }

    /// Normalizing: every source through the [`Normalizer`].
    ///
    /// Unavailable sources are reported, not fatal. The stage fails when
    /// no object survives or a source rejects more than the configured
    /// share of its rows.
    pub fn normalize(&mut self, mut inputs: Vec<SourceInput>) -> PipelineResult<()> {
        self.enter(RunState::Normalizing)?;
        inputs.sort_by_key(|input| input.catalog);

        let normalizer =
            Normalizer::new(self.fallback).with_min_gaia_source_id(self.settings.min_gaia_source_id);
        let mut failures = Vec::new();
        let mut counts = StageCounts::default();

        for input in inputs {
            let catalog = input.catalog;
            let records = match input.status {
                SourceStatus::Loaded(records) => records,
                SourceStatus::Unavailable(reason) => {
                    warn!("Source {} unavailable: {}", catalog, reason);
                    self.report.sources.push(SourceSummary {
                        catalog,
                        available: false,
                        rows: 0,
                        accepted: 0,
                        rejected: 0,
                        note: Some(reason),
                    });
                    continue;
                }
            };

            let batch = normalizer.normalize_batch(&records);
            info!(
                "Normalized {}: {} objects from {} rows, {} rejected",
                catalog,
                batch.objects.len(),
                batch.input_rows,
                batch.rejections.len()
            );
            if batch.rejected_fraction() > self.settings.max_rejected_fraction {
                failures.push(format!(
                    "{} rejected {} of {} rows",
                    catalog,
                    batch.rejections.len(),
                    batch.input_rows
                ));
            }

            counts.accepted += batch.objects.len();
            counts.rejected += batch.rejections.len();
            counts.flagged += Self::flagged(&batch.objects);
            self.report.sources.push(SourceSummary {
                catalog,
                available: true,
                rows: batch.input_rows,
                accepted: batch.objects.len(),
                rejected: batch.rejections.len(),
                note: None,
            });
            self.report.rejections.extend(batch.rejections.iter().cloned());

            match catalog {
                SourceCatalog::Gaia => self.candidates.gaia = Some(batch),
                SourceCatalog::Simbad => self.candidates.simbad = Some(batch),
                _ => {
                    self.claimed_ids.extend(batch.claimed_ids);
                    self.objects.extend(batch.objects);
                }
            }
        }

        self.objects.sort_by(|a, b| a.object_id.cmp(&b.object_id));
        self.report.stages.insert(RunState::Normalizing, counts);

        let gaia_objects = self.candidates.gaia.as_ref().map_or(0, |b| b.objects.len());
        if self.objects.is_empty() && gaia_objects == 0 {
            failures.push("no usable input records".to_string());
        }
        if !failures.is_empty() {
            return Err(self.record_failure(RunState::Normalizing, failures.join("; ")));
        }
        Ok(())
    }

    /// Matching: Gaia (or the fallback table) for host stars, then SIMBAD
    /// names for every star.
    pub fn match_catalogs(&mut self) -> PipelineResult<()> {
        self.enter(RunState::Matching)?;

        match self.candidates.gaia.take().filter(|b| !b.objects.is_empty()) {
            Some(gaia) => self.match_gaia(gaia),
            None => self.apply_fallback_hosts(),
        }
        self.propagate_hosts_to_planets();
        self.objects.sort_by(|a, b| a.object_id.cmp(&b.object_id));

        if let Some(simbad) = self.candidates.simbad.take() {
            self.match_simbad(simbad);
        }

        let flagged = self
            .objects
            .iter()
            .filter(|o| {
                [
                    QualityFlag::LowConfidenceMatch,
                    QualityFlag::FallbackUsed,
                    QualityFlag::GaiaUnavailable,
                    QualityFlag::PoorAstrometry,
                ]
                .iter()
                .any(|f| o.has_flag(*f))
            })
            .count();
        self.report.stages.insert(
            RunState::Matching,
            StageCounts {
                accepted: self.objects.len(),
                rejected: 0,
                flagged,
            },
        );
        info!(
            "Matching complete: {} objects, cross-matches {:?}",
            self.objects.len(),
            self.report.cross_matches
        );
        Ok(())
    }

    fn anchor_indices(&self) -> Vec<usize> {
        self.objects
            .iter()
            .enumerate()
            .filter(|(_, o)| o.kind == ObjectKind::Star && o.source == SourceCatalog::Exoplanets)
            .map(|(i, _)| i)
            .collect()
    }

    fn match_gaia(&mut self, gaia: NormalizedBatch) {
        let entries: Vec<CatalogEntry> = gaia
            .objects
            .iter()
            .map(|o| CatalogEntry {
                native_id: o.object_id.trim_start_matches("gaia:").to_string(),
                numeric_id: gaia.claimed_ids.get(&o.object_id).copied(),
                sky: o.sky_position(),
                magnitude: o.physical.apparent_magnitude,
                quality: o.physical.astrometric_quality,
            })
            .collect();
        let index = CatalogIndex::build("gaia", entries, Some(self.settings.min_gaia_source_id));
        let criteria = self.settings.gaia;
        let usable = index.entries().iter().filter(|e| criteria.passes_quality(e)).count();
        let anchors = self.anchor_indices();

        let matches: Vec<(usize, CandidateMatch)> = if usable == 0 {
            warn!(
                "Gaia: none of {} rows has a plausible id and acceptable astrometry",
                gaia.objects.len()
            );
            self.apply_fallback_hosts();
            Vec::new()
        } else {
            let matcher = SpatialMatcher::new(&index, criteria);
            let min_id = self.settings.min_gaia_source_id;
            let objects = &self.objects;
            let claimed = &self.claimed_ids;
            anchors
                .par_iter()
                .filter_map(|&i| {
                    let anchor = &objects[i];
                    let claimed_id = claimed.get(&anchor.object_id).copied();
                    matcher
                        .match_anchor(&anchor.sky_position(), claimed_id, min_id)
                        .map(|m| (i, m))
                })
                .collect()
        };

        let mut absorbed = vec![false; gaia.objects.len()];
        // Gaia row position -> first anchor that took it
        let mut assigned: HashMap<usize, usize> = HashMap::new();
        for (i, m) in &matches {
            let Some(position) = index.catalog_position(m.index) else {
                continue;
            };
            absorbed[position] = true;
            apply_gaia_match(&mut self.objects[*i], &gaia.objects[position], m);
            match assigned.get(&position) {
                Some(&first) => {
                    warn!(
                        "{}: Gaia {} already assigned to {}",
                        self.objects[*i].object_id, m.native_id, self.objects[first].object_id
                    );
                    self.objects[*i].flag(QualityFlag::LowConfidenceMatch);
                }
                None => {
                    assigned.insert(position, *i);
                }
            }
        }
        *self.report.cross_matches.entry("gaia".to_string()).or_insert(0) += matches.len();

        let ruwe_threshold = self.settings.gaia.quality_threshold;
        for (mut star, taken) in gaia.objects.into_iter().zip(absorbed) {
            if taken {
                continue;
            }
            let passes = match ruwe_threshold {
                Some(t) => star.physical.astrometric_quality.value().is_some_and(|q| q < t),
                None => true,
            };
            if !passes {
                star.flag(QualityFlag::PoorAstrometry);
            }
            if let Some(id) = gaia.claimed_ids.get(&star.object_id) {
                self.claimed_ids.insert(star.object_id.clone(), *id);
            }
            self.objects.push(star);
        }
        info!(
            "Gaia: {} of {} hosts matched ({} entries indexed, {} implausible ids excluded)",
            matches.len(),
            anchors.len(),
            index.len(),
            index.excluded_degenerate()
        );
    }

    fn apply_fallback_hosts(&mut self) {
        let tolerance = self.settings.gaia.tolerance;
        let min_id = self.settings.min_gaia_source_id;
        let mut used = 0;

        for i in self.anchor_indices() {
            let anchor = &mut self.objects[i];
            match self.fallback.host(&anchor.name) {
                Some(entry) => {
                    warn!("Gaia unavailable, using fallback values for {}", anchor.name);
                    apply_fallback_host(anchor, entry, tolerance.value(), min_id);
                    used += 1;
                }
                None => anchor.flag(QualityFlag::GaiaUnavailable),
            }
        }
        info!("Gaia unavailable: {} hosts taken from the fallback table", used);
    }

    /// Copies host distance and temperature onto planets that lack them.
    fn propagate_hosts_to_planets(&mut self) {
        let hosts: HashMap<String, (Measurement, Measurement)> = self
            .objects
            .iter()
            .filter(|o| o.kind == ObjectKind::Star)
            .map(|o| (o.object_id.clone(), (o.distance_ly(), o.physical.temperature_k)))
            .collect();

        for planet in self.objects.iter_mut().filter(|o| o.kind == ObjectKind::Exoplanet) {
            let Some(&(distance, temperature)) = planet.host_id.as_ref().and_then(|h| hosts.get(h)) else {
                continue;
            };
            if distance.is_known() && distance != planet.distance_ly() {
                if let Err(e) = planet.relocate(planet.sky_position(), distance) {
                    warn!("{}: keeping catalog distance: {}", planet.object_id, e);
                }
            }
            planet.physical.host_temperature_k = planet.physical.host_temperature_k.or(temperature);
            if planet.physical.host_temperature_k.is_known() {
                planet.quality_flags.remove(&QualityFlag::MissingTemperature);
            }
        }
    }

    fn match_simbad(&mut self, simbad: NormalizedBatch) {
        let entries: Vec<CatalogEntry> = simbad
            .objects
            .iter()
            .map(|o| CatalogEntry {
                native_id: o.cross_refs.get("simbad").cloned().unwrap_or_else(|| o.object_id.clone()),
                numeric_id: simbad.claimed_ids.get(&o.object_id).copied(),
                sky: o.sky_position(),
                magnitude: Measurement::Unknown,
                quality: Measurement::Unknown,
            })
            .collect();
        let index = CatalogIndex::build("simbad", entries, None);
        let matcher = SpatialMatcher::new(&index, self.settings.simbad);
        let min_id = self.settings.min_gaia_source_id;

        let objects = &self.objects;
        let claimed = &self.claimed_ids;
        let matches: Vec<(usize, CandidateMatch)> = (0..objects.len())
            .into_par_iter()
            .filter(|&i| objects[i].kind == ObjectKind::Star)
            .filter_map(|i| {
                let star = &objects[i];
                let gaia_id = star
                    .cross_refs
                    .get("gaia")
                    .and_then(|id| parse_source_id(Some(id.as_str()), min_id).valid())
                    .or_else(|| claimed.get(&star.object_id).copied());
                matcher
                    .match_anchor(&star.sky_position(), gaia_id, min_id)
                    .map(|m| (i, m))
            })
            .collect();

        for (i, m) in &matches {
            let Some(position) = index.catalog_position(m.index) else {
                continue;
            };
            let candidate = &simbad.objects[position];
            let star = &mut self.objects[*i];
            star.cross_refs.insert("simbad".to_string(), m.native_id.clone());
            if star.source == SourceCatalog::Gaia && !candidate.name.is_empty() {
                star.name = candidate.name.clone();
            }
            if m.low_confidence {
                star.flag(QualityFlag::LowConfidenceMatch);
            }
        }
        *self.report.cross_matches.entry("simbad".to_string()).or_insert(0) += matches.len();
    }

    /// Enriching: derived quantities for every object, then validation.
    pub fn enrich(&mut self) -> PipelineResult<()> {
        self.enter(RunState::Enriching)?;

        let snapshot = self.objects.clone();
        ObjectEnricher::with_albedo(self.settings.albedo).enrich_objects(&mut self.objects);
        self.objects.sort_by(|a, b| a.object_id.cmp(&b.object_id));

        let validation = DatasetValidator::validate_objects(&self.objects);
        for warning in &validation.warnings {
            warn!("{}", warning);
        }
        let is_valid = validation.is_valid;
        let errors = validation.errors.clone();
        self.report.validation = Some(validation);
        self.report.stages.insert(
            RunState::Enriching,
            StageCounts {
                accepted: self.objects.len(),
                rejected: 0,
                flagged: Self::flagged(&self.objects),
            },
        );

        if !is_valid {
            self.objects = snapshot;
            let shown: Vec<String> = errors.iter().take(5).cloned().collect();
            return Err(self.record_failure(
                RunState::Enriching,
                format!("{} invariant violations: {}", errors.len(), shown.join("; ")),
            ));
        }
        Ok(())
    }
}

fn apply_gaia_match(anchor: &mut CanonicalObject, gaia: &CanonicalObject, m: &CandidateMatch) {
    anchor.cross_refs.insert("gaia".to_string(), m.native_id.clone());
    if m.low_confidence {
        anchor.flag(QualityFlag::LowConfidenceMatch);
    }

    let g = &gaia.physical;
    let p = &mut anchor.physical;
    p.temperature_k = p.temperature_k.or(g.temperature_k);
    p.apparent_magnitude = p.apparent_magnitude.or(g.apparent_magnitude);
    p.velocity_km_s = p.velocity_km_s.or(g.velocity_km_s);
    p.astrometric_quality = g.astrometric_quality;
    if anchor.physical.temperature_k.is_known() {
        anchor.quality_flags.remove(&QualityFlag::MissingTemperature);
    }

    if gaia.distance_ly().is_known() {
        if let Err(e) = anchor.relocate(anchor.sky_position(), gaia.distance_ly()) {
            warn!("{}: Gaia distance rejected: {}", anchor.object_id, e);
        }
    }
}

fn apply_fallback_host(anchor: &mut CanonicalObject, entry: &FallbackHost, tolerance_arcsec: f64, min_id: u64) {
    anchor.flag(QualityFlag::FallbackUsed);

    let p = &mut anchor.physical;
    p.temperature_k = p.temperature_k.or(entry.teff_k.into());
    p.apparent_magnitude = p.apparent_magnitude.or(entry.g_mag.into());
    if anchor.physical.temperature_k.is_known() {
        anchor.quality_flags.remove(&QualityFlag::MissingTemperature);
    }

    if entry.parallax_mas > 0.0 {
        let distance = Parsecs::new(1000.0 / entry.parallax_mas).to::<LightYear>().value();
        if let Err(e) = anchor.relocate(anchor.sky_position(), Measurement::known(distance)) {
            warn!("{}: fallback distance rejected: {}", anchor.object_id, e);
        }
    }

    // The fallback id is only trusted where the fallback position agrees
    let Some(id) = entry.gaia_id.filter(|id| *id >= min_id) else {
        return;
    };
    let Ok(position) = SkyPosition::new(Degrees::new(entry.ra), Degrees::new(entry.dec)) else {
        return;
    };
    if angular_separation(&anchor.sky_position(), &position).value() <= tolerance_arcsec {
        anchor.cross_refs.insert("gaia".to_string(), id.to_string());
    }
}

//! Positional cross-matching of anchor objects against a candidate catalog.
//!
//! A [`CatalogIndex`] is built once per catalog snapshot and is read-only
//! afterwards, so one index can be shared by reference across all matching
//! workers. [`SpatialMatcher`] runs the cone query, the quality gate and
//! the brightness tie-break for a single anchor.

use log::debug;
use qtty::Arcseconds;
use std::cmp::Ordering;
use std::collections::HashMap;

use crate::algorithms::coordinates::{angular_separation, chord_length, unit_vector};
use crate::algorithms::kdtree::KdTree;
use crate::core::domain::{Measurement, SkyPosition};

/// One row of a candidate catalog, reduced to what matching needs.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogEntry {
    /// Identifier as written in the source catalog.
    pub native_id: String,
    /// Numeric identifier, for catalogs with an integer id space.
    pub numeric_id: Option<u64>,
    pub sky: SkyPosition,
    pub magnitude: Measurement,
    /// Astrometric fit quality (lower is better), e.g. RUWE.
    pub quality: Measurement,
}

/// Spatially indexed, immutable candidate catalog.
#[derive(Debug)]
pub struct CatalogIndex {
    catalog: String,
    entries: Vec<CatalogEntry>,
    /// Position in the original input, used for deterministic tie-breaks.
    catalog_order: Vec<usize>,
    tree: Option<KdTree>,
    by_id: HashMap<u64, usize>,
    excluded_degenerate: usize,
}

impl CatalogIndex {
    /// Builds the index.
    ///
    /// With `min_plausible_id` set, entries whose numeric id is missing or
    /// below it are left out entirely: they can never be matched, by
    /// position or by id.
    pub fn build(catalog: impl Into<String>, entries: Vec<CatalogEntry>, min_plausible_id: Option<u64>) -> Self {
        let catalog = catalog.into();
        let mut kept = Vec::with_capacity(entries.len());
        let mut catalog_order = Vec::with_capacity(entries.len());
        let mut excluded_degenerate = 0;

        for (position, entry) in entries.into_iter().enumerate() {
            if let Some(min_id) = min_plausible_id {
                if !entry.numeric_id.is_some_and(|id| id >= min_id) {
                    debug!(
                        "{}: excluding entry '{}' with implausible identifier",
                        catalog, entry.native_id
                    );
                    excluded_degenerate += 1;
                    continue;
                }
            }
            kept.push(entry);
            catalog_order.push(position);
        }

        let points: Vec<[f64; 3]> = kept.iter().map(|e| unit_vector(&e.sky)).collect();
        let tree = KdTree::build(&points);

        let mut by_id = HashMap::new();
        for (idx, entry) in kept.iter().enumerate() {
            if let Some(id) = entry.numeric_id {
                // first occurrence wins so duplicates resolve in catalog order
                by_id.entry(id).or_insert(idx);
            }
        }

        Self {
            catalog,
            entries: kept,
            catalog_order,
            tree,
            by_id,
            excluded_degenerate,
        }
    }

    pub fn catalog(&self) -> &str {
        &self.catalog
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of input rows dropped for implausible identifiers.
    pub fn excluded_degenerate(&self) -> usize {
        self.excluded_degenerate
    }

    pub fn get(&self, index: usize) -> Option<&CatalogEntry> {
        self.entries.get(index)
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    /// Original input position of an indexed entry.
    pub fn catalog_position(&self, index: usize) -> Option<usize> {
        self.catalog_order.get(index).copied()
    }

    pub fn lookup_id(&self, id: u64) -> Option<usize> {
        self.by_id.get(&id).copied()
    }

    /// Entries within `radius` of `center`, closest first.
    pub fn cone_search(&self, center: &SkyPosition, radius: Arcseconds) -> Vec<(usize, Arcseconds)> {
        let Some(tree) = &self.tree else {
            return Vec::new();
        };
        // Slight padding on the chord so boundary points are not lost to rounding;
        // the exact angular test below decides membership.
        let chord = chord_length(radius) * (1.0 + 1e-9) + 1e-15;
        tree.radius_search(unit_vector(center), chord)
            .into_iter()
            .map(|(idx, _)| (idx, angular_separation(center, &self.entries[idx].sky)))
            .filter(|(_, sep)| sep.value() <= radius.value())
            .collect()
    }
}

/// How a match was established.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMethod {
    /// The anchor carried a plausible catalog id that was confirmed by position.
    Identifier,
    /// Brightest quality-passing candidate inside the cone.
    Position,
}

/// Outcome of a successful match.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateMatch {
    /// Index into the [`CatalogIndex`].
    pub index: usize,
    pub native_id: String,
    pub separation: Arcseconds,
    pub method: MatchMethod,
    /// Candidates that passed both the distance and quality filters.
    pub qualifying: usize,
    /// Set when the choice was ambiguous or the separation was large.
    pub low_confidence: bool,
}

/// Matching parameters for one candidate catalog.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchCriteria {
    pub tolerance: Arcseconds,
    /// Candidates need a known quality strictly below this value. `None`
    /// disables the gate for catalogs without a quality metric.
    pub quality_threshold: Option<f64>,
    /// Separations above this fraction of the tolerance are low confidence.
    pub low_confidence_fraction: f64,
}

impl MatchCriteria {
    pub fn new(tolerance_arcsec: f64, quality_threshold: Option<f64>) -> Self {
        Self {
            tolerance: Arcseconds::new(tolerance_arcsec),
            quality_threshold,
            low_confidence_fraction: 0.5,
        }
    }

    /// True when the entry's fit quality clears the gate (always, without one).
    pub fn passes_quality(&self, entry: &CatalogEntry) -> bool {
        match self.quality_threshold {
            None => true,
            Some(threshold) => entry.quality.value().is_some_and(|q| q < threshold),
        }
    }
}

/// Matches anchors against one [`CatalogIndex`].
///
/// # Examples
///
/// ```
/// use cosmic_atlas::algorithms::matching::{CatalogEntry, CatalogIndex, MatchCriteria, SpatialMatcher};
/// use cosmic_atlas::core::domain::{Measurement, SkyPosition};
/// use qtty::Degrees;
///
/// let sky = SkyPosition::new(Degrees::new(10.0), Degrees::new(-5.0)).unwrap();
/// let index = CatalogIndex::build(
///     "gaia",
///     vec![CatalogEntry {
///         native_id: "4000000000000".into(),
///         numeric_id: Some(4_000_000_000_000),
///         sky,
///         magnitude: Measurement::Known(12.0),
///         quality: Measurement::Known(1.0),
///     }],
///     Some(1_000_000_000),
/// );
/// let matcher = SpatialMatcher::new(&index, MatchCriteria::new(1.0, Some(1.4)));
/// assert!(matcher.match_position(&sky).is_some());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SpatialMatcher<'a> {
    index: &'a CatalogIndex,
    criteria: MatchCriteria,
}

impl<'a> SpatialMatcher<'a> {
    pub fn new(index: &'a CatalogIndex, criteria: MatchCriteria) -> Self {
        Self { index, criteria }
    }

    pub fn criteria(&self) -> &MatchCriteria {
        &self.criteria
    }

    /// Best candidate for an anchor position, or `None`.
    ///
    /// Among candidates inside the tolerance cone that pass the quality
    /// gate, the brightest wins. Candidates with a known magnitude beat
    /// those without; remaining ties go to the earliest catalog row.
    /// `None` is a normal outcome, not a failure.
    pub fn match_position(&self, anchor: &SkyPosition) -> Option<CandidateMatch> {
        let qualifying: Vec<(usize, Arcseconds)> = self
            .index
            .cone_search(anchor, self.criteria.tolerance)
            .into_iter()
            .filter(|(idx, _)| self.criteria.passes_quality(&self.index.entries[*idx]))
            .collect();

        let (best, separation) = qualifying
            .iter()
            .copied()
            .min_by(|a, b| self.brightness_order(a.0, b.0))?;

        let entry = &self.index.entries[best];
        let low_confidence = qualifying.len() > 1 || self.is_wide(separation);
        debug!(
            "{}: matched '{}' at {:.3}\" ({} qualifying)",
            self.index.catalog,
            entry.native_id,
            separation.value(),
            qualifying.len()
        );

        Some(CandidateMatch {
            index: best,
            native_id: entry.native_id.clone(),
            separation,
            method: MatchMethod::Position,
            qualifying: qualifying.len(),
            low_confidence,
        })
    }

    /// Like [`Self::match_position`], but first tries the anchor's own
    /// catalog id.
    ///
    /// The id is only used when it is at least `min_plausible_id`, belongs
    /// to an indexed entry that passes the quality gate, and that entry
    /// lies inside the tolerance cone. Otherwise matching falls back to
    /// position alone.
    pub fn match_anchor(
        &self,
        anchor: &SkyPosition,
        claimed_id: Option<u64>,
        min_plausible_id: u64,
    ) -> Option<CandidateMatch> {
        if let Some(id) = claimed_id.filter(|id| *id >= min_plausible_id) {
            if let Some(idx) = self.index.lookup_id(id) {
                let entry = &self.index.entries[idx];
                let separation = angular_separation(anchor, &entry.sky);
                if self.criteria.passes_quality(entry)
                    && separation.value() <= self.criteria.tolerance.value()
                {
                    return Some(CandidateMatch {
                        index: idx,
                        native_id: entry.native_id.clone(),
                        separation,
                        method: MatchMethod::Identifier,
                        qualifying: 1,
                        low_confidence: self.is_wide(separation),
                    });
                }
                debug!(
                    "{}: id {} failed position or quality confirmation",
                    self.index.catalog, id
                );
            }
        }
        self.match_position(anchor)
    }

    fn is_wide(&self, separation: Arcseconds) -> bool {
        separation.value() > self.criteria.tolerance.value() * self.criteria.low_confidence_fraction
    }

    fn brightness_order(&self, a: usize, b: usize) -> Ordering {
        let ea = &self.index.entries[a];
        let eb = &self.index.entries[b];
        let by_magnitude = match (ea.magnitude.value(), eb.magnitude.value()) {
            (Some(ma), Some(mb)) => ma.total_cmp(&mb),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => Ordering::Equal,
        };
        by_magnitude.then_with(|| self.index.catalog_order[a].cmp(&self.index.catalog_order[b]))
    }
}

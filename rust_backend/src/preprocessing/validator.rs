//! Dataset validation with detailed error and warning reporting.
//!
//! This module checks a merged set of canonical objects for the invariants
//! every export relies on: unique ids, Cartesian positions consistent with
//! sky position and distance, derived values inside their ranges, and no
//! zero standing in for an unknown value.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::algorithms::coordinates::to_cartesian;
use crate::core::domain::{CanonicalObject, ObjectKind};
use qtty::LightYears;

/// Relative tolerance when re-deriving Cartesian positions.
const CARTESIAN_TOLERANCE: f64 = 1e-9;

/// Validation result with categorized issues and statistics.
///
/// Errors make `is_valid` false and stop a run; warnings are reported
/// but do not fail validation.
///
/// # Examples
///
/// ```
/// use cosmic_atlas::preprocessing::validator::ValidationResult;
///
/// let mut result = ValidationResult::new();
/// assert!(result.is_valid);
///
/// result.add_error("Duplicate object_id 'star:Sun'".to_string());
/// assert!(!result.is_valid);
/// assert_eq!(result.errors.len(), 1);
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ValidationResult {
    pub is_valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub stats: ValidationStats,
}

/// Summary statistics computed during validation.
///
/// # Fields
///
/// * `total_objects` - Number of objects validated
/// * `stars`, `exoplanets`, `deep_sky_objects`, `solar_system_bodies` - Counts per kind
/// * `unknown_distance` - Objects without a known distance
/// * `duplicate_ids` - Repeated object ids
/// * `inconsistent_positions` - Cartesian positions that disagree with sky position and distance
/// * `out_of_range_values` - Derived or measured values outside their domain
/// * `zero_sentinels` - Known zeros that most likely mean "unknown"
/// * `orphan_planets` - Exoplanets whose host is not in the dataset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationStats {
    pub total_objects: usize,
    pub stars: usize,
    pub exoplanets: usize,
    pub deep_sky_objects: usize,
    pub solar_system_bodies: usize,
    pub unknown_distance: usize,
    pub duplicate_ids: usize,
    pub inconsistent_positions: usize,
    pub out_of_range_values: usize,
    pub zero_sentinels: usize,
    pub orphan_planets: usize,
}

impl ValidationResult {
    /// Creates a valid result with no errors or warnings.
    pub fn new() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
            warnings: Vec::new(),
            stats: ValidationStats::default(),
        }
    }

    /// Adds a critical error and marks the result as invalid.
    pub fn add_error(&mut self, error: String) {
        self.is_valid = false;
        self.errors.push(error);
    }

    /// Adds a non-critical warning without invalidating the result.
    pub fn add_warning(&mut self, warning: String) {
        self.warnings.push(warning);
    }
}

/// Validator for merged canonical datasets.
///
/// # Examples
///
/// ```no_run
/// use cosmic_atlas::preprocessing::validator::DatasetValidator;
/// use cosmic_atlas::core::domain::CanonicalObject;
///
/// # fn example(objects: &[CanonicalObject]) {
/// let result = DatasetValidator::validate_objects(objects);
/// if !result.is_valid {
///     eprintln!("Validation failed: {:?}", result.errors);
/// }
/// println!("Validated {} objects", result.stats.total_objects);
/// # }
/// ```
pub struct DatasetValidator;

impl DatasetValidator {
    /// Validates a set of canonical objects.
    ///
    /// Performs:
    /// - Duplicate id detection
    /// - Cartesian consistency checks (present exactly when distance is known,
    ///   and equal to the projection of sky position and distance)
    /// - Range checks on distance, ESI and equilibrium temperature
    /// - Zero-sentinel audit on distance and velocity
    /// - Host reference checks for exoplanets
    pub fn validate_objects(objects: &[CanonicalObject]) -> ValidationResult {
        let mut result = ValidationResult::new();
        result.stats.total_objects = objects.len();

        result.stats.duplicate_ids = Self::check_duplicates(objects, &mut result);

        let ids: HashSet<&str> = objects.iter().map(|o| o.object_id.as_str()).collect();
        for object in objects {
            Self::validate_object(object, &ids, &mut result);
        }

        result
    }

    fn check_duplicates(objects: &[CanonicalObject], result: &mut ValidationResult) -> usize {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for object in objects {
            *counts.entry(object.object_id.as_str()).or_insert(0) += 1;
        }

        let mut duplicates: Vec<(&str, usize)> = counts.into_iter().filter(|(_, n)| *n > 1).collect();
        duplicates.sort_unstable();
        for (id, count) in &duplicates {
            result.add_error(format!("Duplicate object_id '{}' ({} occurrences)", id, count));
        }
        duplicates.len()
    }

    fn validate_object(object: &CanonicalObject, ids: &HashSet<&str>, result: &mut ValidationResult) {
        let id = &object.object_id;

        match object.kind {
            ObjectKind::Star => result.stats.stars += 1,
            ObjectKind::Exoplanet => result.stats.exoplanets += 1,
            ObjectKind::DeepSkyObject => result.stats.deep_sky_objects += 1,
            ObjectKind::SolarSystemBody => result.stats.solar_system_bodies += 1,
        }

        match (object.distance_ly().value(), object.cartesian()) {
            (None, None) => result.stats.unknown_distance += 1,
            (None, Some(_)) => {
                result.stats.inconsistent_positions += 1;
                result.add_error(format!("{}: Cartesian position without a known distance", id));
            }
            (Some(_), None) => {
                result.stats.inconsistent_positions += 1;
                result.add_error(format!("{}: known distance but no Cartesian position", id));
            }
            (Some(distance), Some(stored)) => {
                if distance < 0.0 {
                    result.stats.out_of_range_values += 1;
                    result.add_error(format!("{}: negative distance {}", id, distance));
                } else {
                    let sky = object.sky_position();
                    match to_cartesian(sky.ra(), sky.dec(), LightYears::new(distance)) {
                        Ok(expected) => {
                            let diff = [
                                expected.x - stored.x,
                                expected.y - stored.y,
                                expected.z - stored.z,
                            ];
                            let err = (diff[0] * diff[0] + diff[1] * diff[1] + diff[2] * diff[2]).sqrt();
                            if err > CARTESIAN_TOLERANCE * distance.max(1.0) {
                                result.stats.inconsistent_positions += 1;
                                result.add_error(format!(
                                    "{}: Cartesian position off by {:.3e} ly",
                                    id, err
                                ));
                            }
                        }
                        Err(e) => {
                            result.stats.inconsistent_positions += 1;
                            result.add_error(format!("{}: {}", id, e));
                        }
                    }
                }

                if distance == 0.0 && object.kind != ObjectKind::SolarSystemBody {
                    result.stats.zero_sentinels += 1;
                    result.add_warning(format!("{}: distance is exactly 0", id));
                }
            }
        }

        if let Some(esi) = object.derived.esi.value() {
            if !(0.0..=1.0).contains(&esi) {
                result.stats.out_of_range_values += 1;
                result.add_error(format!("{}: ESI {} outside [0, 1]", id, esi));
            }
        }
        if let Some(t) = object.derived.equilibrium_temp_k.value() {
            if t <= 0.0 {
                result.stats.out_of_range_values += 1;
                result.add_error(format!("{}: non-positive equilibrium temperature {}", id, t));
            }
        }
        if object.physical.velocity_km_s.value() == Some(0.0) {
            result.stats.zero_sentinels += 1;
            result.add_warning(format!("{}: velocity is exactly 0", id));
        }

        if object.kind == ObjectKind::Exoplanet {
            if let Some(host) = &object.host_id {
                if !ids.contains(host.as_str()) {
                    result.stats.orphan_planets += 1;
                    result.add_warning(format!("{}: host '{}' not in dataset", id, host));
                }
            }
        }
    }
}

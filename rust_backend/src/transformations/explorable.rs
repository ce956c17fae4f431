//! Selection of well-characterized exoplanets for close-up exploration.
//!
//! A planet qualifies when enough of its physical fields are known. The
//! survivors are ranked by a playability score built from surface gravity,
//! escape velocity and data richness.

use std::cmp::Ordering;

use crate::core::domain::{CanonicalObject, Measurement, ObjectKind};

/// Physical fields counted towards data richness.
pub const EXPLORABLE_FIELDS: [&str; 8] = [
    "temperature_k",
    "radius_earth",
    "mass_earth",
    "density_g_cm3",
    "orbital_period_days",
    "semi_major_axis_au",
    "eccentricity",
    "insolation_earth_flux",
];

/// One ranked planet.
#[derive(Debug, Clone, PartialEq)]
pub struct ExplorablePlanet<'a> {
    pub object: &'a CanonicalObject,
    pub known_fields: usize,
    pub playability: f64,
}

fn field_values(object: &CanonicalObject) -> [Measurement; 8] {
    let p = &object.physical;
    [
        p.temperature_k,
        p.radius_earth,
        p.mass_earth,
        p.density_g_cm3,
        p.orbital_period_days,
        p.semi_major_axis_au,
        p.eccentricity,
        p.insolation_earth_flux,
    ]
}

/// Number of [`EXPLORABLE_FIELDS`] with a known value.
pub fn known_fields(object: &CanonicalObject) -> usize {
    field_values(object).iter().filter(|m| m.is_known()).count()
}

/// Full marks for 2–20 m/s², half for 0.5–2 or 20–50, else 0.1. Unknown scores 0.5.
pub fn gravity_score(gravity_m_s2: Measurement) -> f64 {
    match gravity_m_s2.value() {
        None => 0.5,
        Some(g) if (2.0..=20.0).contains(&g) => 1.0,
        Some(g) if (0.5..2.0).contains(&g) || (g > 20.0 && g <= 50.0) => 0.5,
        Some(_) => 0.1,
    }
}

/// Full marks for 5–30 km/s, half for 2–5 or 30–60, else 0.1. Unknown scores 0.5.
pub fn escape_score(escape_km_s: Measurement) -> f64 {
    match escape_km_s.value() {
        None => 0.5,
        Some(v) if (5.0..=30.0).contains(&v) => 1.0,
        Some(v) if (2.0..5.0).contains(&v) || (v > 30.0 && v <= 60.0) => 0.5,
        Some(_) => 0.1,
    }
}

pub fn playability(object: &CanonicalObject) -> f64 {
    let richness = known_fields(object) as f64 / EXPLORABLE_FIELDS.len() as f64;
    gravity_score(object.derived.surface_gravity_m_s2)
        * escape_score(object.derived.escape_velocity_km_s)
        * richness
}

fn surface_temperature(object: &CanonicalObject) -> Option<f64> {
    object
        .physical
        .temperature_k
        .or(object.derived.equilibrium_temp_k)
        .value()
}

/// Ranks explorable exoplanets.
///
/// Order: playability descending, known fields descending, temperature
/// ascending (unknown last), then `object_id`. At most `max_planets`
/// entries are returned.
pub fn extract_explorable(
    objects: &[CanonicalObject],
    min_fields: usize,
    max_planets: usize,
) -> Vec<ExplorablePlanet<'_>> {
    let mut planets: Vec<ExplorablePlanet<'_>> = objects
        .iter()
        .filter(|o| o.kind == ObjectKind::Exoplanet)
        .map(|object| ExplorablePlanet {
            object,
            known_fields: known_fields(object),
            playability: playability(object),
        })
        .filter(|p| p.known_fields >= min_fields)
        .collect();

    planets.sort_by(|a, b| {
        b.playability
            .total_cmp(&a.playability)
            .then_with(|| b.known_fields.cmp(&a.known_fields))
            .then_with(|| {
                match (surface_temperature(a.object), surface_temperature(b.object)) {
                    (Some(ta), Some(tb)) => ta.total_cmp(&tb),
                    (Some(_), None) => Ordering::Less,
                    (None, Some(_)) => Ordering::Greater,
                    (None, None) => Ordering::Equal,
                }
            })
            .then_with(|| a.object.object_id.cmp(&b.object.object_id))
    });
    planets.truncate(max_planets);
    planets
}

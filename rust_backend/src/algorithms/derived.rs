//! Astrophysical quantities derived from catalog measurements.
//!
//! Every function takes [`Measurement`]s (or anything convertible into one)
//! and answers `Unknown` instead of a number when an input is missing or
//! outside its physical domain.

use qtty::length::nominal::{EarthRadii, SolarRadiuses};
use qtty::{AstronomicalUnit, Meter};

use crate::core::domain::{Habitability, Measurement, PlanetClass, StellarClass};

/// Newtonian constant of gravitation, m³ kg⁻¹ s⁻².
const GRAVITATIONAL_CONSTANT: f64 = 6.674_30e-11;
/// Nominal Earth mass, kg.
pub const EARTH_MASS_KG: f64 = 5.972_2e24;
/// Earth masses per Jupiter mass.
pub const EARTH_MASSES_PER_JUPITER_MASS: f64 = 317.828;
/// Nominal solar effective temperature, K.
const SOLAR_TEFF_K: f64 = 5772.0;

/// Default Bond albedo for equilibrium temperatures.
pub const DEFAULT_ALBEDO: f64 = 0.3;

/// Lower temperature bound (inclusive) of each spectral band, hottest first.
const SPECTRAL_BANDS: [(f64, StellarClass); 6] = [
    (30_000.0, StellarClass::O),
    (10_000.0, StellarClass::B),
    (7_500.0, StellarClass::A),
    (6_000.0, StellarClass::F),
    (5_200.0, StellarClass::G),
    (3_700.0, StellarClass::K),
];

/// Earth reference values and weight exponents for the similarity index.
///
/// These weights come from the published ESI definition and are carried
/// as-is; they are not re-derived here.
pub mod esi_reference {
    pub const RADIUS_EARTH: f64 = 1.0;
    pub const DENSITY_G_CM3: f64 = 5.51;
    pub const TEMPERATURE_K: f64 = 288.0;
    pub const INSOLATION: f64 = 1.0;

    pub const RADIUS_WEIGHT: f64 = 0.57;
    pub const DENSITY_WEIGHT: f64 = 1.07;
    pub const TEMPERATURE_WEIGHT: f64 = 5.58;
    pub const INSOLATION_WEIGHT: f64 = 0.70;
}

/// Classifies a star by effective temperature.
///
/// Each band includes its lower bound: exactly 7500 K is `A`, 7499.999 K
/// is `F`. Anything below 3700 K is `M`. Missing, non-positive or
/// non-finite temperatures are `Unknown`.
///
/// # Examples
///
/// ```
/// use cosmic_atlas::algorithms::derived::stellar_class;
/// use cosmic_atlas::core::domain::StellarClass;
///
/// assert_eq!(stellar_class(5778.0), StellarClass::G);
/// assert_eq!(stellar_class(7500.0), StellarClass::A);
/// ```
pub fn stellar_class(temperature_k: impl Into<Measurement>) -> StellarClass {
    let Some(t) = temperature_k.into().filter(|t| t > 0.0).value() else {
        return StellarClass::Unknown;
    };
    SPECTRAL_BANDS
        .iter()
        .find(|(lower, _)| t >= *lower)
        .map_or(StellarClass::M, |(_, class)| *class)
}

/// Planetary equilibrium temperature in kelvin.
///
/// `T_eq = T_star · sqrt(R_star / (2a)) · (1 - A)^¼`, with the stellar
/// radius converted from solar radii to AU so the ratio is dimensionless.
/// Unknown when any input is missing, when `a ≤ 0`, when the star's
/// temperature or radius is not positive, or when the albedo is outside
/// `[0, 1)`.
pub fn equilibrium_temp(
    star_temp_k: impl Into<Measurement>,
    star_radius_solar: impl Into<Measurement>,
    semi_major_axis_au: impl Into<Measurement>,
    albedo: f64,
) -> Measurement {
    let (Some(t), Some(r), Some(a)) = (
        star_temp_k.into().value(),
        star_radius_solar.into().value(),
        semi_major_axis_au.into().value(),
    ) else {
        return Measurement::Unknown;
    };
    if a <= 0.0 || t <= 0.0 || r <= 0.0 || !(0.0..1.0).contains(&albedo) {
        return Measurement::Unknown;
    }

    let radius_au = SolarRadiuses::new(r).to::<AstronomicalUnit>().value();
    Measurement::known(t * (radius_au / (2.0 * a)).sqrt() * (1.0 - albedo).powf(0.25))
}

/// One similarity term: `(1 - |(x - x0)/(x + x0)|)^w`.
///
/// A base that would be negative (deviation beyond 1, only reachable with
/// negative inputs) or non-finite is clamped to 0 before the power, so the
/// term always lies in `[0, 1]`.
fn similarity_term(value: f64, reference: f64, weight: f64) -> f64 {
    let deviation = (value - reference) / (value + reference);
    let base = 1.0 - deviation.abs();
    if !base.is_finite() || base <= 0.0 {
        return 0.0;
    }
    base.min(1.0).powf(weight)
}

/// Earth Similarity Index in `[0, 1]`.
///
/// Geometric mean of the radius, density, temperature and insolation
/// similarity terms. A single term clamped to zero makes the whole index
/// zero, which reads as "not Earth-like". Any missing input gives
/// `Unknown`, never 0.
///
/// # Examples
///
/// ```
/// use cosmic_atlas::algorithms::derived::earth_similarity_index;
///
/// let esi = earth_similarity_index(1.0, 5.51, 288.0, 1.0).value().unwrap();
/// assert!((esi - 1.0).abs() < 1e-12);
/// ```
pub fn earth_similarity_index(
    radius_earth: impl Into<Measurement>,
    density_g_cm3: impl Into<Measurement>,
    temperature_k: impl Into<Measurement>,
    insolation_earth_flux: impl Into<Measurement>,
) -> Measurement {
    use esi_reference::*;

    let (Some(r), Some(rho), Some(t), Some(s)) = (
        radius_earth.into().value(),
        density_g_cm3.into().value(),
        temperature_k.into().value(),
        insolation_earth_flux.into().value(),
    ) else {
        return Measurement::Unknown;
    };

    let product = similarity_term(r, RADIUS_EARTH, RADIUS_WEIGHT)
        * similarity_term(rho, DENSITY_G_CM3, DENSITY_WEIGHT)
        * similarity_term(t, TEMPERATURE_K, TEMPERATURE_WEIGHT)
        * similarity_term(s, INSOLATION, INSOLATION_WEIGHT);

    Measurement::Known(product.powf(0.25).clamp(0.0, 1.0))
}

/// Size class from radius in Earth radii.
pub fn planet_class(radius_earth: impl Into<Measurement>) -> PlanetClass {
    match radius_earth.into().filter(|r| r > 0.0).value() {
        None => PlanetClass::Unknown,
        Some(r) if r < 1.25 => PlanetClass::Terrestrial,
        Some(r) if r < 2.0 => PlanetClass::SuperEarth,
        Some(r) if r < 6.0 => PlanetClass::NeptuneLike,
        Some(_) => PlanetClass::GasGiant,
    }
}

/// Habitability bucket from equilibrium temperature (200–400 K inclusive).
pub fn habitability(equilibrium_temp_k: impl Into<Measurement>) -> Habitability {
    match equilibrium_temp_k.into().value() {
        None => Habitability::Unknown,
        Some(t) if t < 200.0 => Habitability::TooCold,
        Some(t) if t > 400.0 => Habitability::TooHot,
        Some(_) => Habitability::PotentiallyHabitable,
    }
}

fn mass_and_radius_si(mass_earth: Measurement, radius_earth: Measurement) -> Option<(f64, f64)> {
    let m = mass_earth.filter(|m| m > 0.0).value()? * EARTH_MASS_KG;
    let r = EarthRadii::new(radius_earth.filter(|r| r > 0.0).value()?)
        .to::<Meter>()
        .value();
    Some((m, r))
}

/// Surface gravity `G·M/R²` in m/s².
pub fn surface_gravity(mass_earth: impl Into<Measurement>, radius_earth: impl Into<Measurement>) -> Measurement {
    mass_and_radius_si(mass_earth.into(), radius_earth.into())
        .map_or(Measurement::Unknown, |(m, r)| {
            Measurement::known(GRAVITATIONAL_CONSTANT * m / (r * r))
        })
}

/// Escape velocity `sqrt(2GM/R)` in km/s.
pub fn escape_velocity(mass_earth: impl Into<Measurement>, radius_earth: impl Into<Measurement>) -> Measurement {
    mass_and_radius_si(mass_earth.into(), radius_earth.into())
        .map_or(Measurement::Unknown, |(m, r)| {
            Measurement::known((2.0 * GRAVITATIONAL_CONSTANT * m / r).sqrt() / 1000.0)
        })
}

/// Bulk density in g/cm³ scaled from Earth's.
pub fn bulk_density(mass_earth: impl Into<Measurement>, radius_earth: impl Into<Measurement>) -> Measurement {
    let (Some(m), Some(r)) = (
        mass_earth.into().filter(|m| m > 0.0).value(),
        radius_earth.into().filter(|r| r > 0.0).value(),
    ) else {
        return Measurement::Unknown;
    };
    Measurement::known(esi_reference::DENSITY_G_CM3 * m / r.powi(3))
}

/// Stellar flux received at `a` AU, relative to Earth's.
///
/// Luminosity is estimated as `R² (T / 5772)⁴` in solar units.
pub fn insolation(
    star_temp_k: impl Into<Measurement>,
    star_radius_solar: impl Into<Measurement>,
    semi_major_axis_au: impl Into<Measurement>,
) -> Measurement {
    let (Some(t), Some(r), Some(a)) = (
        star_temp_k.into().filter(|t| t > 0.0).value(),
        star_radius_solar.into().filter(|r| r > 0.0).value(),
        semi_major_axis_au.into().filter(|a| a > 0.0).value(),
    ) else {
        return Measurement::Unknown;
    };
    Measurement::known(r * r * (t / SOLAR_TEFF_K).powi(4) / (a * a))
}

/// Viewer color for a spectral class, RGB in `[0, 1]`.
pub fn display_color(class: StellarClass) -> [f32; 3] {
    match class {
        StellarClass::O => [0.6, 0.7, 1.0],
        StellarClass::B => [0.8, 0.9, 1.0],
        StellarClass::A => [1.0, 1.0, 1.0],
        StellarClass::F => [1.0, 1.0, 0.9],
        StellarClass::G => [1.0, 1.0, 0.7],
        StellarClass::K => [1.0, 0.8, 0.6],
        StellarClass::M => [1.0, 0.6, 0.4],
        StellarClass::Unknown => [1.0, 1.0, 0.8],
    }
}

/// Marker size for the viewers: `clamp((15 - mag) · 0.1, 0.1, 2.0)`.
///
/// Unknown magnitudes are drawn as a magnitude-10 star.
pub fn display_size(apparent_magnitude: impl Into<Measurement>) -> f32 {
    let mag = apparent_magnitude.into().value().unwrap_or(10.0);
    ((15.0 - mag) * 0.1).clamp(0.1, 2.0) as f32
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    #[test]
    fn test_stellar_class_boundaries() {
        assert_eq!(stellar_class(7500.0), StellarClass::A);
        assert_eq!(stellar_class(7499.999), StellarClass::F);
        assert_eq!(stellar_class(30_000.0), StellarClass::O);
        assert_eq!(stellar_class(10_000.0), StellarClass::B);
        assert_eq!(stellar_class(6_000.0), StellarClass::F);
        assert_eq!(stellar_class(5_200.0), StellarClass::G);
        assert_eq!(stellar_class(3_700.0), StellarClass::K);
        assert_eq!(stellar_class(3_699.9), StellarClass::M);
        assert_eq!(stellar_class(2_559.0), StellarClass::M);
    }

    #[test]
    fn test_stellar_class_unknown_inputs() {
        assert_eq!(stellar_class(Measurement::Unknown), StellarClass::Unknown);
        assert_eq!(stellar_class(0.0), StellarClass::Unknown);
        assert_eq!(stellar_class(-10.0), StellarClass::Unknown);
        assert_eq!(stellar_class(f64::NAN), StellarClass::Unknown);
        // label handed to the Python bindings
        assert_eq!(stellar_class(None::<f64>).as_str(), "unknown");
        assert_eq!(stellar_class(Some(2_559.0)).as_str(), "M");
    }

    #[test]
    fn test_equilibrium_temp_earth() {
        let t = equilibrium_temp(5772.0, 1.0, 1.0, DEFAULT_ALBEDO).value().unwrap();
        // Textbook value for Earth with A = 0.3 is about 255 K
        assert!((250.0..260.0).contains(&t), "got {}", t);
    }

    #[test]
    fn test_equilibrium_temp_undefined_cases() {
        assert_eq!(equilibrium_temp(5772.0, 1.0, 0.0, 0.3), Measurement::Unknown);
        assert_eq!(equilibrium_temp(5772.0, 1.0, -1.0, 0.3), Measurement::Unknown);
        assert_eq!(equilibrium_temp(Measurement::Unknown, 1.0, 1.0, 0.3), Measurement::Unknown);
        assert_eq!(equilibrium_temp(5772.0, 1.0, 1.0, 1.0), Measurement::Unknown);
    }

    #[test]
    fn test_esi_earth_is_one() {
        let esi = earth_similarity_index(1.0, 5.51, 288.0, 1.0).value().unwrap();
        assert_relative_eq!(esi, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_esi_pathological_inputs_are_zero_not_nan() {
        assert_eq!(earth_similarity_index(0.0, 5.51, 288.0, 1.0), Measurement::Known(0.0));
        assert_eq!(earth_similarity_index(1.0, 5.51, 0.0, 1.0), Measurement::Known(0.0));
        assert_eq!(earth_similarity_index(-3.0, 5.51, 288.0, 1.0), Measurement::Known(0.0));
    }

    #[test]
    fn test_esi_missing_input_is_unknown() {
        assert_eq!(
            earth_similarity_index(1.0, Measurement::Unknown, 288.0, 1.0),
            Measurement::Unknown
        );
    }

    #[test]
    fn test_planet_class_and_habitability() {
        assert_eq!(planet_class(1.0), PlanetClass::Terrestrial);
        assert_eq!(planet_class(1.25), PlanetClass::SuperEarth);
        assert_eq!(planet_class(3.0), PlanetClass::NeptuneLike);
        assert_eq!(planet_class(11.2), PlanetClass::GasGiant);
        assert_eq!(planet_class(Measurement::Unknown), PlanetClass::Unknown);

        assert_eq!(habitability(255.0), Habitability::PotentiallyHabitable);
        assert_eq!(habitability(400.0), Habitability::PotentiallyHabitable);
        assert_eq!(habitability(150.0), Habitability::TooCold);
        assert_eq!(habitability(1400.0), Habitability::TooHot);
    }

    #[test]
    fn test_earth_gravity_and_escape_velocity() {
        let g = surface_gravity(1.0, 1.0).value().unwrap();
        assert_relative_eq!(g, 9.82, epsilon = 0.05);
        let v = escape_velocity(1.0, 1.0).value().unwrap();
        assert_relative_eq!(v, 11.19, epsilon = 0.05);
        assert_eq!(surface_gravity(Measurement::Unknown, 1.0), Measurement::Unknown);
    }

    #[test]
    fn test_insolation_and_density() {
        assert_relative_eq!(insolation(5772.0, 1.0, 1.0).value().unwrap(), 1.0, epsilon = 1e-12);
        assert_relative_eq!(bulk_density(1.0, 1.0).value().unwrap(), 5.51, epsilon = 1e-12);
    }

    #[test]
    fn test_display_size_clamps() {
        assert_relative_eq!(display_size(-30.0), 2.0);
        assert_relative_eq!(display_size(20.0), 0.1);
        assert_relative_eq!(display_size(Measurement::Unknown), 0.5);
    }

    proptest! {
        #[test]
        fn prop_esi_always_in_unit_interval(
            r in 0.0f64..1.0e3,
            rho in 0.0f64..1.0e2,
            t in 0.0f64..1.0e4,
            s in 0.0f64..1.0e5,
        ) {
            let esi = earth_similarity_index(r, rho, t, s).value().unwrap();
            prop_assert!((0.0..=1.0).contains(&esi));
        }
    }
}

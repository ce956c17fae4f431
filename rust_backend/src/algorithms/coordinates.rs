//! Spherical/Cartesian conversions for equatorial coordinates.
//!
//! All functions are pure and safe to call from parallel workers.

use qtty::{Arcseconds, Degree, Degrees, LightYears, Radian};

use crate::core::domain::{Cartesian, SkyPosition};
use crate::core::error::{PipelineError, PipelineResult};

/// Checks a raw (RA, Dec) pair and returns it normalized.
///
/// RA must be finite and is wrapped into `[0, 360)`. Dec must lie in
/// `[-90, 90]`; out-of-range values are rejected, never clamped.
pub fn validate_sky_position(ra: Degrees, dec: Degrees) -> PipelineResult<SkyPosition> {
    if !ra.value().is_finite() {
        return Err(PipelineError::InvalidCoordinate(format!(
            "right ascension must be finite, got {}",
            ra.value()
        )));
    }
    let dec_deg = dec.value();
    if !dec_deg.is_finite() || !(-90.0..=90.0).contains(&dec_deg) {
        return Err(PipelineError::InvalidCoordinate(format!(
            "declination {} outside [-90, 90]",
            dec_deg
        )));
    }

    let mut ra = ra.wrap_pos();
    // rem_euclid can round a tiny negative input up to exactly 360
    if ra.value() >= 360.0 {
        ra = Degrees::new(0.0);
    }
    Ok(SkyPosition::from_validated(ra, dec))
}

/// Projects (RA, Dec, distance) onto equatorial Cartesian axes.
///
/// `x = d·cos(dec)·cos(ra)`, `y = d·cos(dec)·sin(ra)`, `z = d·sin(dec)`.
///
/// # Errors
///
/// * `InvalidCoordinate` - non-finite RA or Dec outside `[-90, 90]`
/// * `InvalidDistance` - negative or non-finite distance
///
/// # Examples
///
/// ```
/// use cosmic_atlas::algorithms::coordinates::to_cartesian;
/// use qtty::{Degrees, LightYears};
///
/// let p = to_cartesian(Degrees::new(90.0), Degrees::new(0.0), LightYears::new(2.0)).unwrap();
/// assert!(p.x.abs() < 1e-12);
/// assert!((p.y - 2.0).abs() < 1e-12);
/// ```
pub fn to_cartesian(ra: Degrees, dec: Degrees, distance: LightYears) -> PipelineResult<Cartesian> {
    let sky = validate_sky_position(ra, dec)?;
    let d = distance.value();
    if !d.is_finite() || d < 0.0 {
        return Err(PipelineError::InvalidDistance(format!(
            "distance must be a non-negative number of light-years, got {}",
            d
        )));
    }

    let [ux, uy, uz] = unit_vector(&sky);
    Ok(Cartesian::new(d * ux, d * uy, d * uz))
}

/// Recovers (RA, Dec, distance) from a Cartesian position.
///
/// The origin maps to RA 0, Dec 0 at distance 0.
pub fn to_spherical(point: &Cartesian) -> (SkyPosition, LightYears) {
    let distance = point.norm();
    if distance == 0.0 || !distance.is_finite() {
        return (
            SkyPosition::from_validated(Degrees::new(0.0), Degrees::new(0.0)),
            LightYears::new(if distance.is_finite() { 0.0 } else { distance }),
        );
    }

    let dec = qtty::Radians::new((point.z / distance).clamp(-1.0, 1.0).asin()).to::<Degree>();
    let mut ra = qtty::Radians::new(point.y.atan2(point.x))
        .to::<Degree>()
        .wrap_pos();
    if ra.value() >= 360.0 {
        ra = Degrees::new(0.0);
    }
    (SkyPosition::from_validated(ra, dec), LightYears::new(distance))
}

/// Unit vector pointing at a sky position.
pub fn unit_vector(sky: &SkyPosition) -> [f64; 3] {
    let (sin_ra, cos_ra) = sky.ra().to::<Radian>().sin_cos();
    let (sin_dec, cos_dec) = sky.dec().to::<Radian>().sin_cos();
    [cos_dec * cos_ra, cos_dec * sin_ra, sin_dec]
}

/// Great-circle separation between two positions.
///
/// Uses `atan2(|a×b|, a·b)`, which stays accurate at sub-arcsecond scales
/// where the plain `acos` form loses precision.
pub fn angular_separation(a: &SkyPosition, b: &SkyPosition) -> Arcseconds {
    let u = unit_vector(a);
    let v = unit_vector(b);
    let cross = [
        u[1] * v[2] - u[2] * v[1],
        u[2] * v[0] - u[0] * v[2],
        u[0] * v[1] - u[1] * v[0],
    ];
    let cross_norm = (cross[0] * cross[0] + cross[1] * cross[1] + cross[2] * cross[2]).sqrt();
    let dot = u[0] * v[0] + u[1] * v[1] + u[2] * v[2];
    qtty::Radians::new(cross_norm.atan2(dot)).to::<qtty::Arcsecond>()
}

/// Straight-line distance between two unit vectors separated by `angle`.
pub fn chord_length(angle: Arcseconds) -> f64 {
    let half = angle.to::<Radian>().value() / 2.0;
    2.0 * half.sin()
}

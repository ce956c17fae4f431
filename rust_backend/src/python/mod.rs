//! Python bindings for the viewer front-ends.
//!
//! Compiled only with the `python` feature. Unknown values cross the
//! boundary as `None`.

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use qtty::{Degrees, LightYears};
use std::path::Path;

use crate::algorithms::{coordinates, derived};
use crate::algorithms::derived::DEFAULT_ALBEDO;

/// Heliocentric (x, y, z) in light-years for an equatorial position
#[pyfunction]
pub fn to_cartesian(ra_deg: f64, dec_deg: f64, distance_ly: f64) -> PyResult<(f64, f64, f64)> {
    let xyz = coordinates::to_cartesian(
        Degrees::new(ra_deg),
        Degrees::new(dec_deg),
        LightYears::new(distance_ly),
    )
    .map_err(|e| PyValueError::new_err(e.to_string()))?;
    Ok((xyz.x, xyz.y, xyz.z))
}

/// Spectral class letter for an effective temperature, "unknown" if missing
#[pyfunction]
#[pyo3(signature = (temperature_k=None))]
pub fn stellar_class(temperature_k: Option<f64>) -> String {
    derived::stellar_class(temperature_k).as_str().to_string()
}

#[pyfunction]
#[pyo3(signature = (star_temp_k, star_radius_solar, semi_major_axis_au, albedo=DEFAULT_ALBEDO))]
pub fn equilibrium_temp(
    star_temp_k: Option<f64>,
    star_radius_solar: Option<f64>,
    semi_major_axis_au: Option<f64>,
    albedo: f64,
) -> Option<f64> {
    derived::equilibrium_temp(star_temp_k, star_radius_solar, semi_major_axis_au, albedo).value()
}

#[pyfunction]
#[pyo3(signature = (radius_earth=None, density_g_cm3=None, temperature_k=None, insolation_earth_flux=None))]
pub fn earth_similarity_index(
    radius_earth: Option<f64>,
    density_g_cm3: Option<f64>,
    temperature_k: Option<f64>,
    insolation_earth_flux: Option<f64>,
) -> Option<f64> {
    derived::earth_similarity_index(radius_earth, density_g_cm3, temperature_k, insolation_earth_flux)
        .value()
}

/// Run the pipeline and return the run report as a JSON string.
///
/// A failed run still returns its report; only configuration and
/// output errors raise.
#[pyfunction]
#[pyo3(signature = (config_path=None))]
pub fn run_pipeline(py: Python<'_>, config_path: Option<String>) -> PyResult<String> {
    let report = py
        .detach(|| crate::preprocessing::run_pipeline(config_path.as_deref().map(Path::new)))
        .map_err(|e| PyRuntimeError::new_err(format!("Pipeline run failed: {:#}", e)))?;
    serde_json::to_string_pretty(&report)
        .map_err(|e| PyRuntimeError::new_err(format!("Failed to serialize run report: {}", e)))
}

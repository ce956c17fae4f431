//! Cosmic Atlas: merges astronomical catalogs into one explorable dataset.
//!
//! Sources are normalized into canonical objects, cross-matched against
//! Gaia and SIMBAD, enriched with derived quantities and exported for the
//! viewers. See [`preprocessing::AtlasPipeline`] for the file-level entry
//! point.

pub mod algorithms;
pub mod config;
pub mod core;
pub mod io;
pub mod parsing;
pub mod preprocessing;
pub mod transformations;

#[cfg(feature = "python")]
pub mod python;

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// Cosmic Atlas Python module
#[cfg(feature = "python")]
#[pymodule]
fn cosmic_atlas(m: &Bound<'_, PyModule>) -> PyResult<()> {
    // Derived quantities
    m.add_function(wrap_pyfunction!(python::to_cartesian, m)?)?;
    m.add_function(wrap_pyfunction!(python::stellar_class, m)?)?;
    m.add_function(wrap_pyfunction!(python::equilibrium_temp, m)?)?;
    m.add_function(wrap_pyfunction!(python::earth_similarity_index, m)?)?;

    // Pipeline
    m.add_function(wrap_pyfunction!(python::run_pipeline, m)?)?;

    Ok(())
}

//! Core domain model for the catalog pipeline.
//!
//! - [`domain`]: canonical objects, measurements and classification enums
//! - [`error`]: the pipeline error taxonomy

pub mod domain;
pub mod error;

pub use domain::{
    CanonicalObject, Cartesian, DerivedQuantities, Habitability, Measurement, ObjectKind,
    PhysicalProperties, PlanetClass, QualityFlag, SkyPosition, SourceCatalog, StellarClass,
};
pub use error::{PipelineError, PipelineResult};

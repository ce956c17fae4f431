//! Dataset transformations applied after a run is finalized.
//!
//! # Modules
//!
//! - [`explorable`]: rank well-characterized exoplanets for close-up exploration
//!
//! # Example
//!
//! ```no_run
//! use cosmic_atlas::transformations::extract_explorable;
//! use cosmic_atlas::core::domain::CanonicalObject;
//!
//! # fn example(objects: &[CanonicalObject]) {
//! for planet in extract_explorable(objects, 5, 20) {
//!     println!("{} {:.2}", planet.object.object_id, planet.playability);
//! }
//! # }
//! ```

pub mod explorable;

pub use explorable::{extract_explorable, playability, ExplorablePlanet};

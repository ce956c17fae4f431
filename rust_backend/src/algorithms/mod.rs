//! Numeric core of the pipeline.
//!
//! - [`coordinates`]: RA/Dec/distance to Cartesian and back
//! - [`derived`]: stellar class, equilibrium temperature, Earth Similarity Index
//! - [`kdtree`]: 3-D k-d tree used for cone searches
//! - [`matching`]: catalog index and spatial cross-matcher

pub mod coordinates;
pub mod derived;
pub mod kdtree;
pub mod matching;

#[cfg(test)]
mod matching_tests;

pub use coordinates::{to_cartesian, to_spherical};
pub use derived::{earth_similarity_index, equilibrium_temp, stellar_class};
pub use matching::{CandidateMatch, CatalogEntry, CatalogIndex, MatchCriteria, SpatialMatcher};

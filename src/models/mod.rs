//! Core data models for region matching.

pub mod matching;
pub mod place;
pub mod region;

pub use matching::{ExpansionResult, MatchResult};
pub use place::{parse_location, Coordinates, Place};
pub use region::{BoundaryCollection, Crs, Region};

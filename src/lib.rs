//! Geobound - assigns places to named region boundaries
//!
//! This library matches points to enclosing regions (with a nearest-region
//! fallback) and expands a city filter to every place in the same region.

pub mod catalog;
pub mod config;
pub mod error;
pub mod expand;
pub mod models;
pub mod pip;
pub mod service;

pub use error::{GeoError, Result};
pub use expand::{BoundaryExpander, RegionIndex};
pub use models::{BoundaryCollection, Crs, ExpansionResult, MatchResult, Place, Region};
pub use pip::{BoundaryBuilder, RegionMatcher};
pub use service::GeoService;

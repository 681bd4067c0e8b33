//! Point-in-polygon region lookup.
//!
//! Builds region boundaries from flattened CSV rows and matches points to
//! the region containing them, or to the nearest one.

mod boundary;
mod matcher;
pub mod projection;

pub use boundary::{load_boundaries, BoundaryBuilder, DEFAULT_NAME_COLUMN};
pub use matcher::RegionMatcher;
pub use projection::{planar_projection, reproject, Projection, WebMercator};

//! Coordinate reference system transforms.
//!
//! The matcher only sees the [`Projection`] trait, so the projection math can
//! be replaced without touching containment or distance code.

use std::f64::consts::{FRAC_PI_2, FRAC_PI_4};

use geo::{Coord, MapCoords};

use crate::error::{GeoError, Result};
use crate::models::Crs;

/// A bidirectional transform between a geographic and a planar system
pub trait Projection: Send + Sync {
    fn source(&self) -> Crs;

    fn target(&self) -> Crs;

    /// Source to target
    fn forward(&self, coord: Coord<f64>) -> Coord<f64>;

    /// Target to source
    fn inverse(&self, coord: Coord<f64>) -> Coord<f64>;
}

/// Spherical Web Mercator (EPSG:4326 <-> EPSG:3857)
#[derive(Debug, Clone, Copy, Default)]
pub struct WebMercator;

impl WebMercator {
    /// WGS84 semi-major axis in meters
    pub const EARTH_RADIUS: f64 = 6_378_137.0;

    /// Latitude at which the projection becomes square
    pub const MAX_LATITUDE: f64 = 85.051_128_779_806_59;
}

impl Projection for WebMercator {
    fn source(&self) -> Crs {
        Crs::Wgs84
    }

    fn target(&self) -> Crs {
        Crs::WebMercator
    }

    fn forward(&self, coord: Coord<f64>) -> Coord<f64> {
        let lat = coord
            .y
            .clamp(-Self::MAX_LATITUDE, Self::MAX_LATITUDE)
            .to_radians();
        Coord {
            x: Self::EARTH_RADIUS * coord.x.to_radians(),
            y: Self::EARTH_RADIUS * (FRAC_PI_4 + lat / 2.0).tan().ln(),
        }
    }

    fn inverse(&self, coord: Coord<f64>) -> Coord<f64> {
        Coord {
            x: (coord.x / Self::EARTH_RADIUS).to_degrees(),
            y: (2.0 * (coord.y / Self::EARTH_RADIUS).exp().atan() - FRAC_PI_2).to_degrees(),
        }
    }
}

/// Resolve the transform from geographic coordinates into `planar`.
///
/// Fails when `planar` is not a metric system, since distances there would
/// be meaningless.
pub fn planar_projection(planar: Crs) -> Result<Box<dyn Projection>> {
    match planar {
        Crs::WebMercator => Ok(Box::new(WebMercator)),
        other => Err(GeoError::UnsupportedProjection {
            from: Crs::Wgs84,
            to: other,
        }),
    }
}

/// Reproject any geometry between the two systems `projection` links.
pub fn reproject<G>(geometry: &G, from: Crs, to: Crs, projection: &dyn Projection) -> Result<G>
where
    G: MapCoords<f64, f64, Output = G> + Clone,
{
    if from == to {
        return Ok(geometry.clone());
    }

    if from == projection.source() && to == projection.target() {
        Ok(geometry.map_coords(|c| projection.forward(c)))
    } else if from == projection.target() && to == projection.source() {
        Ok(geometry.map_coords(|c| projection.inverse(c)))
    } else {
        Err(GeoError::UnsupportedProjection { from, to })
    }
}

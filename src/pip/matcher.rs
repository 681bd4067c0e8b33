//! Containment-first region matching with a planar nearest-region fallback.

use std::sync::OnceLock;

use geo::{Distance, Euclidean, Intersects, Point, Polygon};
use tracing::debug;

use super::projection::{planar_projection, reproject, Projection, WebMercator};
use crate::error::{GeoError, Result};
use crate::models::{BoundaryCollection, Crs, MatchResult};

/// A region boundary as seen by the distance fallback
#[derive(Debug, Clone)]
enum PlanarShape {
    /// No vertices; distance is undefined
    Empty,
    /// All vertices coincide
    Point(Point<f64>),
    Polygon(Polygon<f64>),
}

impl PlanarShape {
    fn distance_to(&self, point: &Point<f64>) -> Option<f64> {
        let d = match self {
            PlanarShape::Empty => return None,
            PlanarShape::Point(p) => Euclidean.distance(*point, *p),
            PlanarShape::Polygon(poly) => Euclidean.distance(point, poly),
        };
        d.is_finite().then_some(d)
    }
}

/// Point-to-region matcher over one boundary collection.
///
/// Containment is tested in the collection's geographic frame. Only when no
/// region contains the point are the regions reprojected into the planar
/// system, once, and reused for every later fallback.
pub struct RegionMatcher {
    collection: BoundaryCollection,
    projection: Box<dyn Projection>,
    /// Regions that can contain a point (3+ distinct vertices)
    containable: Vec<bool>,
    planar: OnceLock<Vec<PlanarShape>>,
}

impl RegionMatcher {
    /// Matcher using Web Mercator for the distance fallback
    pub fn new(collection: BoundaryCollection) -> Self {
        Self::build(collection, Box::new(WebMercator))
    }

    pub fn with_planar_crs(collection: BoundaryCollection, planar: Crs) -> Result<Self> {
        Self::with_projection(collection, planar_projection(planar)?)
    }

    /// Matcher using a caller-supplied projection.
    ///
    /// The projection must start from the collection's system and end in a
    /// planar one.
    pub fn with_projection(
        collection: BoundaryCollection,
        projection: Box<dyn Projection>,
    ) -> Result<Self> {
        if projection.source() != collection.crs() || !projection.target().is_planar() {
            return Err(GeoError::UnsupportedProjection {
                from: collection.crs(),
                to: projection.target(),
            });
        }
        Ok(Self::build(collection, projection))
    }

    fn build(collection: BoundaryCollection, projection: Box<dyn Projection>) -> Self {
        let containable = collection.iter().map(|r| !r.is_degenerate()).collect();
        Self {
            collection,
            projection,
            containable,
            planar: OnceLock::new(),
        }
    }

    pub fn collection(&self) -> &BoundaryCollection {
        &self.collection
    }

    pub fn planar_crs(&self) -> Crs {
        self.projection.target()
    }

    /// Match a longitude/latitude pair
    pub fn locate(&self, lon: f64, lat: f64) -> MatchResult {
        self.locate_point(Point::new(lon, lat))
    }

    /// Match a point given in the collection's reference system
    pub fn locate_point(&self, point: Point<f64>) -> MatchResult {
        let regions = self.containing(&point);
        if !regions.is_empty() {
            return MatchResult::ContainedBy { regions };
        }

        match self.nearest(&point) {
            Some((idx, distance)) => {
                let region = &self.collection.regions()[idx];
                debug!(
                    "No region contains ({}, {}); nearest is '{}' at {:.1}",
                    point.x(),
                    point.y(),
                    region.name,
                    distance
                );
                MatchResult::NearestTo {
                    region: region.name.clone(),
                    distance,
                }
            }
            // Every ring is empty: first region, unmeasurable distance
            None => match self.collection.regions().first() {
                Some(region) => MatchResult::NearestTo {
                    region: region.name.clone(),
                    distance: f64::INFINITY,
                },
                None => MatchResult::ContainedBy { regions: vec![] },
            },
        }
    }

    /// Names of every region containing the point, boundary inclusive
    fn containing(&self, point: &Point<f64>) -> Vec<String> {
        self.collection
            .iter()
            .zip(&self.containable)
            .filter(|(region, ok)| **ok && region.polygon.intersects(point))
            .map(|(region, _)| region.name.clone())
            .collect()
    }

    /// Index and planar distance of the closest region; first wins on ties
    fn nearest(&self, point: &Point<f64>) -> Option<(usize, f64)> {
        if self.collection.is_empty() {
            return None;
        }

        let planar_point = reproject(
            point,
            self.collection.crs(),
            self.projection.target(),
            self.projection.as_ref(),
        )
        .ok()?;

        let mut best: Option<(usize, f64)> = None;
        for (idx, shape) in self.planar_shapes().iter().enumerate() {
            let Some(distance) = shape.distance_to(&planar_point) else {
                continue;
            };
            if best.map_or(true, |(_, d)| distance < d) {
                best = Some((idx, distance));
            }
        }
        best
    }

    fn planar_shapes(&self) -> &[PlanarShape] {
        self.planar.get_or_init(|| {
            debug!(
                "Projecting {} regions into {}",
                self.collection.len(),
                self.projection.target()
            );
            self.collection
                .iter()
                .map(|region| {
                    let projected = reproject(
                        &region.polygon,
                        self.collection.crs(),
                        self.projection.target(),
                        self.projection.as_ref(),
                    );
                    match (projected, region.distinct_vertex_count()) {
                        (Err(_), _) | (_, 0) => PlanarShape::Empty,
                        (Ok(poly), 1) => PlanarShape::Point(Point::from(poly.exterior().0[0])),
                        (Ok(poly), _) => PlanarShape::Polygon(poly),
                    }
                })
                .collect()
        })
    }
}

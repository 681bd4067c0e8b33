//! Named region boundaries and the collection they are loaded into.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use geo::{Area, Coord, LineString, Polygon};
use hashbrown::HashSet;
use serde::{Deserialize, Serialize};

use crate::error::GeoError;

/// Coordinate reference systems understood by the matcher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Crs {
    /// Geographic longitude/latitude in degrees (EPSG:4326)
    Wgs84,
    /// Spherical Web Mercator in meters (EPSG:3857)
    WebMercator,
}

impl Crs {
    pub fn epsg_code(&self) -> u32 {
        match self {
            Crs::Wgs84 => 4326,
            Crs::WebMercator => 3857,
        }
    }

    /// Whether distances in this system are metric
    pub fn is_planar(&self) -> bool {
        matches!(self, Crs::WebMercator)
    }
}

impl fmt::Display for Crs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EPSG:{}", self.epsg_code())
    }
}

impl FromStr for Crs {
    type Err = GeoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s
            .trim()
            .strip_prefix("EPSG:")
            .or_else(|| s.trim().strip_prefix("epsg:"))
            .unwrap_or(s.trim());

        match code {
            "4326" => Ok(Crs::Wgs84),
            "3857" | "900913" => Ok(Crs::WebMercator),
            other => Err(GeoError::Schema(format!(
                "unknown coordinate reference system '{}'",
                other
            ))),
        }
    }
}

impl TryFrom<String> for Crs {
    type Error = GeoError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Crs> for String {
    fn from(crs: Crs) -> Self {
        crs.to_string()
    }
}

/// A named region and its boundary ring
#[derive(Debug, Clone)]
pub struct Region {
    pub name: String,
    pub polygon: Polygon<f64>,
    /// Non-geometry columns from the boundary source, keyed by column name
    pub properties: BTreeMap<String, String>,
}

impl Region {
    /// Build a region from ring vertices in source order.
    ///
    /// The ring is closed automatically. Fewer than three vertices produce a
    /// degenerate polygon rather than an error.
    pub fn new(name: impl Into<String>, vertices: Vec<Coord<f64>>) -> Self {
        Self {
            name: name.into(),
            polygon: Polygon::new(LineString::new(vertices), vec![]),
            properties: BTreeMap::new(),
        }
    }

    pub fn with_properties(mut self, properties: BTreeMap<String, String>) -> Self {
        self.properties = properties;
        self
    }

    /// Ring vertices, without the closing vertex
    pub fn vertices(&self) -> &[Coord<f64>] {
        let coords = &self.polygon.exterior().0;
        match coords.len() {
            0 | 1 => coords,
            n if coords[0] == coords[n - 1] => &coords[..n - 1],
            _ => coords,
        }
    }

    pub fn distinct_vertex_count(&self) -> usize {
        self.vertices()
            .iter()
            .map(|c| (c.x.to_bits(), c.y.to_bits()))
            .collect::<HashSet<_>>()
            .len()
    }

    /// A ring with fewer than three distinct vertices, or zero area, encloses nothing
    pub fn is_degenerate(&self) -> bool {
        self.distinct_vertex_count() < 3 || self.polygon.unsigned_area() == 0.0
    }

    pub fn is_empty(&self) -> bool {
        self.polygon.exterior().0.is_empty()
    }

    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }
}

/// Ordered, immutable set of regions sharing one reference system.
///
/// Construction order is significant: it breaks distance ties in the
/// nearest-region fallback.
#[derive(Debug, Clone)]
pub struct BoundaryCollection {
    crs: Crs,
    regions: Vec<Region>,
}

impl BoundaryCollection {
    pub fn new(crs: Crs, regions: Vec<Region>) -> Self {
        Self { crs, regions }
    }

    pub fn crs(&self) -> Crs {
        self.crs
    }

    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn iter(&self) -> impl Iterator<Item = &Region> {
        self.regions.iter()
    }

    /// First region carrying the given name
    pub fn get(&self, name: &str) -> Option<&Region> {
        self.regions.iter().find(|r| r.name == name)
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crs_parse_and_display() {
        assert_eq!("EPSG:4326".parse::<Crs>().unwrap(), Crs::Wgs84);
        assert_eq!("3857".parse::<Crs>().unwrap(), Crs::WebMercator);
        assert_eq!(Crs::WebMercator.to_string(), "EPSG:3857");
        assert!("EPSG:32633".parse::<Crs>().is_err());
    }

    #[test]
    fn test_region_closes_ring() {
        let region = Region::new(
            "square",
            vec![
                Coord { x: 0.0, y: 0.0 },
                Coord { x: 1.0, y: 0.0 },
                Coord { x: 1.0, y: 1.0 },
                Coord { x: 0.0, y: 1.0 },
            ],
        );
        assert_eq!(region.polygon.exterior().0.len(), 5);
        assert_eq!(region.vertices().len(), 4);
        assert!(!region.is_degenerate());
    }

    #[test]
    fn test_degenerate_regions() {
        assert!(Region::new("empty", vec![]).is_degenerate());
        assert!(Region::new("empty", vec![]).is_empty());

        let line = Region::new(
            "line",
            vec![Coord { x: 0.0, y: 0.0 }, Coord { x: 1.0, y: 1.0 }],
        );
        assert!(line.is_degenerate());
        assert!(!line.is_empty());

        let repeated = Region::new(
            "repeated",
            vec![
                Coord { x: 0.0, y: 0.0 },
                Coord { x: 1.0, y: 1.0 },
                Coord { x: 0.0, y: 0.0 },
                Coord { x: 1.0, y: 1.0 },
            ],
        );
        assert!(repeated.is_degenerate());

        let collinear = Region::new(
            "collinear",
            vec![
                Coord { x: 0.0, y: 0.0 },
                Coord { x: 1.0, y: 0.0 },
                Coord { x: 2.0, y: 0.0 },
            ],
        );
        assert_eq!(collinear.distinct_vertex_count(), 3);
        assert!(collinear.is_degenerate());
    }

    #[test]
    fn test_collection_lookup_by_name() {
        let collection = BoundaryCollection::new(
            Crs::Wgs84,
            vec![Region::new("a", vec![]), Region::new("b", vec![])],
        );
        assert_eq!(collection.len(), 2);
        assert!(collection.get("b").is_some());
        assert!(collection.get("c").is_none());
    }
}

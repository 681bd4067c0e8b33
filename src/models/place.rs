//! Place records consumed by the matcher and expander.

use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use geo::Point;
use serde::{Deserialize, Serialize};

use crate::error::{GeoError, Result};

/// Longitude/latitude pair in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lon: f64,
    pub lat: f64,
}

impl Coordinates {
    pub fn new(lon: f64, lat: f64) -> Result<Self> {
        if !lon.is_finite() || !lat.is_finite() {
            return Err(GeoError::CoordinateExtraction(format!(
                "non-finite coordinate ({}, {})",
                lon, lat
            )));
        }
        Ok(Self { lon, lat })
    }
}

impl From<Coordinates> for Point<f64> {
    fn from(c: Coordinates) -> Self {
        Point::new(c.lon, c.lat)
    }
}

/// GeoJSON-like point object stored in the `location` field
#[derive(Debug, Deserialize)]
struct LocationValue {
    #[serde(rename = "type")]
    geo_type: Option<String>,
    coordinates: Option<Vec<f64>>,
}

/// Parse a combined location field such as
/// `{'type': 'Point', 'coordinates': [-73.98, 40.75]}`.
///
/// Single quotes are accepted in place of double quotes.
pub fn parse_location(raw: &str) -> Result<Coordinates> {
    let normalized = raw.replace('\'', "\"");
    let value: LocationValue = serde_json::from_str(&normalized)
        .map_err(|e| GeoError::CoordinateExtraction(format!("invalid location '{}': {}", raw, e)))?;

    if value.geo_type.as_deref() != Some("Point") {
        return Err(GeoError::CoordinateExtraction(format!(
            "location is not a Point: '{}'",
            raw
        )));
    }

    match value.coordinates.as_deref() {
        Some([lon, lat, ..]) => Coordinates::new(*lon, *lat),
        _ => Err(GeoError::CoordinateExtraction(format!(
            "location has fewer than two coordinates: '{}'",
            raw
        ))),
    }
}

/// A place from the external catalog.
///
/// Read-only to the core: matching and expansion only filter and group places.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Place {
    pub city: String,

    /// Combined GeoJSON-like point field
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,

    /// Remaining source columns (name, category, ...)
    #[serde(flatten)]
    pub attributes: BTreeMap<String, String>,
}

impl Place {
    pub fn new(city: impl Into<String>) -> Self {
        Self {
            city: city.into(),
            ..Default::default()
        }
    }

    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = Some(location.into());
        self
    }

    pub fn with_lon_lat(mut self, lon: f64, lat: f64) -> Self {
        self.longitude = Some(lon);
        self.latitude = Some(lat);
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Extract the place's coordinates.
    ///
    /// A non-empty `location` field takes precedence over the separate
    /// numeric fields.
    pub fn coordinates(&self) -> Result<Coordinates> {
        if let Some(location) = self.location.as_deref().filter(|l| !l.trim().is_empty()) {
            return parse_location(location);
        }

        match (self.longitude, self.latitude) {
            (Some(lon), Some(lat)) => Coordinates::new(lon, lat),
            _ => Err(GeoError::CoordinateExtraction(format!(
                "place in '{}' has no location",
                self.city
            ))),
        }
    }
}

// Value equality; floats compare by bit pattern so Place can live in hash sets.
impl PartialEq for Place {
    fn eq(&self, other: &Self) -> bool {
        self.city == other.city
            && self.location == other.location
            && self.longitude.map(f64::to_bits) == other.longitude.map(f64::to_bits)
            && self.latitude.map(f64::to_bits) == other.latitude.map(f64::to_bits)
            && self.attributes == other.attributes
    }
}

impl Eq for Place {}

impl Hash for Place {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.city.hash(state);
        self.location.hash(state);
        self.longitude.map(f64::to_bits).hash(state);
        self.latitude.map(f64::to_bits).hash(state);
        self.attributes.hash(state);
    }
}

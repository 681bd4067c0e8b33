//! Session-level region lookup service.
//!
//! Owns the boundary collection for the lifetime of the session. A failed
//! load is logged and leaves the service in city-name-only mode; it never
//! aborts the session.

use std::collections::BTreeSet;
use std::path::Path;

use tracing::{error, info, warn};

use crate::catalog::places_in_city;
use crate::config::Config;
use crate::expand::{region_tags, BoundaryExpander, RegionIndex};
use crate::models::{BoundaryCollection, Crs, MatchResult, Place};
use crate::pip::{BoundaryBuilder, RegionMatcher};

pub struct GeoService {
    matcher: Option<RegionMatcher>,
    parallel: bool,
}

impl GeoService {
    pub fn new(matcher: Option<RegionMatcher>) -> Self {
        Self {
            matcher,
            parallel: true,
        }
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Load boundaries, falling back to city-name matching on any failure
    pub fn load(path: &Path, name_column: &str, planar_crs: Crs) -> Self {
        let loaded = BoundaryBuilder::new()
            .with_name_column(name_column)
            .load_file(path)
            .and_then(|collection| RegionMatcher::with_planar_crs(collection, planar_crs));

        match loaded {
            Ok(matcher) => {
                info!(
                    "Region boundaries loaded: {} regions",
                    matcher.collection().len()
                );
                Self::new(Some(matcher))
            }
            Err(e) => {
                error!("Error loading region boundaries: {}", e);
                Self::new(None)
            }
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let service = match &config.boundaries.path {
            Some(path) => Self::load(
                path,
                &config.boundaries.name_column,
                config.matching.planar_crs,
            ),
            None => {
                warn!("No boundary file configured, using city name matching only");
                Self::new(None)
            }
        };
        service.with_parallel(config.matching.parallel)
    }

    /// Whether region boundaries are loaded
    pub fn is_available(&self) -> bool {
        self.matcher.is_some()
    }

    pub fn matcher(&self) -> Option<&RegionMatcher> {
        self.matcher.as_ref()
    }

    pub fn boundaries(&self) -> Option<&BoundaryCollection> {
        self.matcher.as_ref().map(RegionMatcher::collection)
    }

    /// Match a point; `None` when boundaries are unavailable
    pub fn locate(&self, lon: f64, lat: f64) -> Option<MatchResult> {
        self.matcher.as_ref().map(|m| m.locate(lon, lat))
    }

    /// First region a place resolves to
    pub fn region_of(&self, place: &Place) -> Option<String> {
        let matcher = self.matcher.as_ref()?;
        region_tags(matcher, place)?.into_iter().next()
    }

    pub fn expander(&self) -> BoundaryExpander<'_> {
        BoundaryExpander::new(self.matcher.as_ref()).parallel(self.parallel)
    }

    /// Every catalog place co-located with `target_city`.
    ///
    /// Falls back to exact city-name matching when boundaries are
    /// unavailable or nothing matches.
    pub fn places_in_city_boundaries(&self, target_city: &str, catalog: &[Place]) -> Vec<Place> {
        let city_places: Vec<Place> = places_in_city(catalog, target_city)
            .into_iter()
            .cloned()
            .collect();

        if city_places.is_empty() {
            info!("No places named '{}' in catalog", target_city);
            return city_places;
        }

        if !self.is_available() {
            warn!("Region boundaries not loaded, falling back to city name matching");
            return city_places;
        }

        self.expander().expand(&city_places, catalog).places
    }

    /// Distinct city names among the places co-located with `target_city`
    pub fn cities_in_city_boundaries(&self, target_city: &str, catalog: &[Place]) -> Vec<String> {
        self.places_in_city_boundaries(target_city, catalog)
            .into_iter()
            .map(|p| p.city)
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    /// Precompute region tags for a catalog; `None` when boundaries are unavailable
    pub fn index_catalog(&self, catalog: Vec<Place>) -> Option<RegionIndex> {
        let matcher = self.matcher.as_ref()?;
        Some(RegionIndex::build(matcher, catalog, self.parallel))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::expand::tests::{catalog, place, two_region_matcher};
    use std::io::Write;

    #[test]
    fn test_city_boundaries_expand() {
        let service = GeoService::new(Some(two_region_matcher()));
        let places = service.places_in_city_boundaries("Brooklyn", &catalog());

        assert_eq!(places.len(), 3);
        assert!(places.iter().all(|p| p.city != "Los Angeles"));
    }

    #[test]
    fn test_cities_in_city_boundaries() {
        let service = GeoService::new(Some(two_region_matcher()));
        assert_eq!(
            service.cities_in_city_boundaries("Brooklyn", &catalog()),
            vec!["Brooklyn".to_string(), "New York".to_string()]
        );

        let offline = GeoService::new(None);
        assert_eq!(
            offline.cities_in_city_boundaries("Los Angeles", &catalog()),
            vec!["Los Angeles".to_string()]
        );
    }

    #[test]
    fn test_unknown_city_is_empty() {
        let service = GeoService::new(Some(two_region_matcher()));
        assert!(service.places_in_city_boundaries("Chicago", &catalog()).is_empty());
    }

    #[test]
    fn test_unavailable_boundaries_use_city_name() {
        let service = GeoService::new(None);
        let places = service.places_in_city_boundaries("New York", &catalog());

        assert_eq!(places.len(), 2);
        assert!(places.iter().all(|p| p.city == "New York"));
        assert!(service.locate(-73.9, 40.7).is_none());
        assert!(service.index_catalog(catalog()).is_none());
    }

    #[test]
    fn test_failed_load_disables_boundaries() {
        let service = GeoService::load(
            Path::new("/missing/boundaries.csv"),
            "properties.name",
            Crs::WebMercator,
        );
        assert!(!service.is_available());

        let service = GeoService::from_config(&Config::default());
        assert!(!service.is_available());
    }

    #[test]
    fn test_load_and_locate() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "properties.name,geometry.coordinates[0][0][0],geometry.coordinates[0][0][1],\
             geometry.coordinates[0][1][0],geometry.coordinates[0][1][1],\
             geometry.coordinates[0][2][0],geometry.coordinates[0][2][1]"
        )
        .unwrap();
        writeln!(file, "Triangle,0,0,10,0,0,10").unwrap();

        let service = GeoService::load(file.path(), "properties.name", Crs::WebMercator);
        assert!(service.is_available());
        assert_eq!(
            service.locate(1.0, 1.0).and_then(|m| m.primary().map(String::from)),
            Some("Triangle".to_string())
        );
        assert_eq!(
            service.region_of(&place("X", "Y", 20.0, 20.0)),
            Some("Triangle".to_string())
        );
        assert_eq!(service.region_of(&Place::new("Nowhere")), None);
    }
}

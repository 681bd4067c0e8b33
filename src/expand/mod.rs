//! Boundary expansion: from "places named city X" to "places in X's region".
//!
//! The seed places are matched to their regions, then the whole catalog is
//! scanned and every place sharing one of those regions is kept. Places with
//! missing or malformed coordinates are skipped, never reported.

mod index;

use std::collections::BTreeSet;

use hashbrown::HashSet;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::models::{ExpansionResult, Place};
use crate::pip::RegionMatcher;

pub use index::RegionIndex;

/// Region names a place resolves to, or `None` when it has no usable
/// coordinates or the matcher found nothing.
pub fn region_tags(matcher: &RegionMatcher, place: &Place) -> Option<Vec<String>> {
    let coords = match place.coordinates() {
        Ok(c) => c,
        Err(e) => {
            debug!("Skipping place in '{}': {}", place.city, e);
            return None;
        }
    };

    let result = matcher.locate(coords.lon, coords.lat);
    if result.is_empty() {
        None
    } else {
        Some(result.into_regions())
    }
}

/// Tag every place, in catalog order
pub(crate) fn tag_catalog(
    matcher: &RegionMatcher,
    catalog: &[Place],
    parallel: bool,
) -> Vec<Option<Vec<String>>> {
    if parallel {
        catalog
            .par_iter()
            .map(|place| region_tags(matcher, place))
            .collect()
    } else {
        catalog
            .iter()
            .map(|place| region_tags(matcher, place))
            .collect()
    }
}

/// Union of the regions every seed place resolves to
pub fn seed_regions(matcher: &RegionMatcher, seeds: &[Place]) -> BTreeSet<String> {
    seeds
        .iter()
        .filter_map(|place| region_tags(matcher, place))
        .flatten()
        .collect()
}

/// Matched places followed by seeds not already present, deduplicated by value
pub(crate) fn merge_with_seeds<'a>(
    matched: impl IntoIterator<Item = &'a Place>,
    seeds: &'a [Place],
) -> Vec<Place> {
    let mut seen: HashSet<&Place> = HashSet::new();
    matched
        .into_iter()
        .chain(seeds)
        .filter(|place| seen.insert(*place))
        .cloned()
        .collect()
}

/// Expands a city's places to every catalog place in the same region(s)
pub struct BoundaryExpander<'a> {
    matcher: Option<&'a RegionMatcher>,
    parallel: bool,
}

impl<'a> BoundaryExpander<'a> {
    /// `None` means boundaries failed to load; every expansion falls back
    pub fn new(matcher: Option<&'a RegionMatcher>) -> Self {
        Self {
            matcher,
            parallel: true,
        }
    }

    /// Scan the catalog on the rayon pool (default) or sequentially
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    pub fn expand(&self, target_places: &[Place], full_catalog: &[Place]) -> ExpansionResult {
        let Some(matcher) = self.matcher.filter(|m| !m.collection().is_empty()) else {
            warn!("Region boundaries unavailable, falling back to city name matching");
            return ExpansionResult::fallback(target_places.to_vec());
        };

        let seeds = seed_regions(matcher, target_places);
        if seeds.is_empty() {
            warn!("No seed place resolved to a region, falling back to city name matching");
            return ExpansionResult::fallback(target_places.to_vec());
        }
        debug!("Seed regions: {:?}", seeds);

        let tags = tag_catalog(matcher, full_catalog, self.parallel);
        let matched: Vec<&Place> = full_catalog
            .iter()
            .zip(&tags)
            .filter(|(_, tags)| match tags {
                Some(t) => t.iter().any(|region| seeds.contains(region)),
                None => false,
            })
            .map(|(place, _)| place)
            .collect();

        if matched.is_empty() {
            warn!("No places found within boundaries, falling back to city name matching");
            return ExpansionResult::fallback(target_places.to_vec());
        }

        let places = merge_with_seeds(matched, target_places);
        info!(
            "Expanded {} seed places to {} places across {} region(s)",
            target_places.len(),
            places.len(),
            seeds.len()
        );

        ExpansionResult {
            success: true,
            seed_regions: seeds.into_iter().collect(),
            places,
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::{BoundaryCollection, Crs, Region};
    use geo::Coord;

    pub(crate) fn square(name: &str, min_x: f64, min_y: f64, size: f64) -> Region {
        Region::new(
            name,
            vec![
                Coord { x: min_x, y: min_y },
                Coord { x: min_x + size, y: min_y },
                Coord { x: min_x + size, y: min_y + size },
                Coord { x: min_x, y: min_y + size },
            ],
        )
    }

    pub(crate) fn two_region_matcher() -> RegionMatcher {
        RegionMatcher::new(BoundaryCollection::new(
            Crs::Wgs84,
            vec![
                square("Region A", -74.0, 40.0, 1.0),
                square("Region B", -119.0, 33.0, 1.0),
            ],
        ))
    }

    pub(crate) fn place(city: &str, name: &str, lon: f64, lat: f64) -> Place {
        Place::new(city)
            .with_location(format!("{{'type': 'Point', 'coordinates': [{}, {}]}}", lon, lat))
            .with_attribute("name", name)
    }

    /// 3 places in Region A across two city names, 2 in Region B
    pub(crate) fn catalog() -> Vec<Place> {
        vec![
            place("New York", "Deli", -73.9, 40.7),
            place("Los Angeles", "Taco Stand", -118.3, 33.9),
            place("Brooklyn", "Pizza", -73.95, 40.65),
            place("New York", "Bagels", -73.98, 40.75),
            place("Los Angeles", "Juice Bar", -118.4, 33.95),
        ]
    }

    fn names(places: &[Place]) -> BTreeSet<String> {
        places
            .iter()
            .filter_map(|p| p.attribute("name").map(String::from))
            .collect()
    }

    #[test]
    fn test_expand_to_region() {
        let matcher = two_region_matcher();
        let catalog = catalog();
        let targets: Vec<Place> = catalog
            .iter()
            .filter(|p| p.city == "New York")
            .cloned()
            .collect();

        let result = BoundaryExpander::new(Some(&matcher)).expand(&targets, &catalog);

        assert!(result.success);
        assert_eq!(result.seed_regions, vec!["Region A".to_string()]);
        assert_eq!(
            names(&result.places),
            ["Deli", "Pizza", "Bagels"].iter().map(|s| s.to_string()).collect()
        );
        assert_eq!(result.len(), 3);
    }

    #[test]
    fn test_expand_is_order_independent() {
        let matcher = two_region_matcher();
        let catalog = catalog();
        let targets = vec![catalog[0].clone()];

        let forward = BoundaryExpander::new(Some(&matcher)).expand(&targets, &catalog);

        let mut reversed = catalog.clone();
        reversed.reverse();
        let backward = BoundaryExpander::new(Some(&matcher))
            .parallel(false)
            .expand(&targets, &reversed);

        let a: HashSet<&Place> = forward.places.iter().collect();
        let b: HashSet<&Place> = backward.places.iter().collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_expand_without_boundaries_falls_back() {
        let catalog = catalog();
        let targets = vec![catalog[0].clone(), catalog[3].clone()];

        let result = BoundaryExpander::new(None).expand(&targets, &catalog);
        assert!(!result.success);
        assert_eq!(result.places, targets);

        let empty = RegionMatcher::new(BoundaryCollection::new(Crs::Wgs84, vec![]));
        let result = BoundaryExpander::new(Some(&empty)).expand(&targets, &catalog);
        assert!(!result.success);
        assert_eq!(result.places, targets);
    }

    #[test]
    fn test_seeds_without_coordinates_fall_back() {
        let matcher = two_region_matcher();
        let catalog = catalog();
        let targets = vec![Place::new("New York").with_location("garbage")];

        let result = BoundaryExpander::new(Some(&matcher)).expand(&targets, &catalog);
        assert!(!result.success);
        assert_eq!(result.places, targets);
    }

    #[test]
    fn test_malformed_catalog_rows_are_skipped() {
        let matcher = two_region_matcher();
        let mut catalog = catalog();
        catalog.push(Place::new("New York").with_attribute("name", "No Location"));
        catalog.push(
            Place::new("New York")
                .with_location("{'type': 'Point'}")
                .with_attribute("name", "Broken"),
        );
        let targets = vec![catalog[0].clone()];

        let result = BoundaryExpander::new(Some(&matcher)).expand(&targets, &catalog);
        assert!(result.success);
        assert_eq!(result.len(), 3);
        assert!(!names(&result.places).contains("Broken"));
    }

    #[test]
    fn test_duplicates_removed_and_seeds_kept() {
        let matcher = two_region_matcher();
        let mut catalog = catalog();
        catalog.push(catalog[0].clone());

        // A seed not present in the catalog still ends up in the result
        let outside = place("New York", "Food Truck", -73.7, 40.9);
        let targets = vec![catalog[0].clone(), outside.clone()];

        let result = BoundaryExpander::new(Some(&matcher)).expand(&targets, &catalog);
        assert!(result.success);
        assert_eq!(result.len(), 4);
        assert_eq!(result.places.last(), Some(&outside));
    }

    #[test]
    fn test_nearest_region_counts_as_match() {
        let matcher = two_region_matcher();
        // Just outside Region A; nearest fallback puts it there
        let nearby = place("Hoboken", "Diner", -74.2, 40.5);
        let catalog = vec![catalog()[0].clone(), nearby.clone()];
        let targets = vec![catalog[0].clone()];

        let result = BoundaryExpander::new(Some(&matcher)).expand(&targets, &catalog);
        assert!(result.places.contains(&nearby));
    }
}

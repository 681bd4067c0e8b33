//! Precomputed place -> region tags for repeated expansion queries.

use std::collections::{BTreeMap, BTreeSet};

use tracing::{info, warn};

use super::{merge_with_seeds, seed_regions, tag_catalog};
use crate::models::{ExpansionResult, Place};
use crate::pip::RegionMatcher;

/// Catalog places grouped by the region(s) they resolve to.
///
/// Built once per catalog and boundary collection; both are immutable, so a
/// changed catalog or collection means building a new index.
pub struct RegionIndex {
    catalog: Vec<Place>,
    tags: Vec<Option<Vec<String>>>,
    by_region: BTreeMap<String, Vec<usize>>,
}

impl RegionIndex {
    pub fn build(matcher: &RegionMatcher, catalog: Vec<Place>, parallel: bool) -> Self {
        info!("Indexing {} places by region...", catalog.len());

        let tags = tag_catalog(matcher, &catalog, parallel);

        let mut by_region: BTreeMap<String, Vec<usize>> = BTreeMap::new();
        for (idx, regions) in tags.iter().enumerate() {
            for region in regions.iter().flatten() {
                by_region.entry(region.clone()).or_default().push(idx);
            }
        }

        let untagged = tags.iter().filter(|t| t.is_none()).count();
        if untagged > 0 {
            warn!("{} places did not resolve to a region", untagged);
        }
        info!("Region index built: {} regions", by_region.len());

        Self {
            catalog,
            tags,
            by_region,
        }
    }

    pub fn catalog(&self) -> &[Place] {
        &self.catalog
    }

    pub fn len(&self) -> usize {
        self.catalog.len()
    }

    pub fn is_empty(&self) -> bool {
        self.catalog.is_empty()
    }

    /// Places that did not resolve to any region
    pub fn untagged(&self) -> usize {
        self.tags.iter().filter(|t| t.is_none()).count()
    }

    /// Regions with at least one place
    pub fn regions(&self) -> impl Iterator<Item = &str> {
        self.by_region.keys().map(String::as_str)
    }

    pub fn places_in<'a>(&'a self, region: &str) -> impl Iterator<Item = &'a Place> + 'a {
        self.by_region
            .get(region)
            .into_iter()
            .flatten()
            .map(move |&idx| &self.catalog[idx])
    }

    /// Region tags of the place at catalog position `idx`
    pub fn regions_of(&self, idx: usize) -> &[String] {
        self.tags
            .get(idx)
            .and_then(|t| t.as_deref())
            .unwrap_or_default()
    }

    /// Same result as [`super::BoundaryExpander::expand`] over the indexed
    /// catalog, without re-matching catalog places.
    pub fn expand(&self, matcher: &RegionMatcher, target_places: &[Place]) -> ExpansionResult {
        if matcher.collection().is_empty() {
            return ExpansionResult::fallback(target_places.to_vec());
        }

        let seeds = seed_regions(matcher, target_places);
        let matched: BTreeSet<usize> = seeds
            .iter()
            .filter_map(|region| self.by_region.get(region))
            .flatten()
            .copied()
            .collect();

        if matched.is_empty() {
            warn!("No places found within boundaries, falling back to city name matching");
            return ExpansionResult::fallback(target_places.to_vec());
        }

        let places = merge_with_seeds(matched.iter().map(|&idx| &self.catalog[idx]), target_places);
        ExpansionResult {
            success: true,
            seed_regions: seeds.into_iter().collect(),
            places,
        }
    }
}

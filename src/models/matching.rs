//! Per-call results of region matching and boundary expansion.

use serde::Serialize;

use super::Place;

/// Outcome of matching one point against a boundary collection
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MatchResult {
    /// Regions whose polygon contains the point, in collection order.
    /// Several when polygons overlap; empty only for an empty collection.
    ContainedBy { regions: Vec<String> },

    /// No polygon contains the point; the closest region under the planar metric
    NearestTo { region: String, distance: f64 },
}

impl MatchResult {
    pub fn regions(&self) -> Vec<&str> {
        match self {
            MatchResult::ContainedBy { regions } => regions.iter().map(String::as_str).collect(),
            MatchResult::NearestTo { region, .. } => vec![region.as_str()],
        }
    }

    pub fn into_regions(self) -> Vec<String> {
        match self {
            MatchResult::ContainedBy { regions } => regions,
            MatchResult::NearestTo { region, .. } => vec![region],
        }
    }

    /// First matched region, if any
    pub fn primary(&self) -> Option<&str> {
        match self {
            MatchResult::ContainedBy { regions } => regions.first().map(String::as_str),
            MatchResult::NearestTo { region, .. } => Some(region),
        }
    }

    pub fn is_contained(&self) -> bool {
        matches!(self, MatchResult::ContainedBy { regions } if !regions.is_empty())
    }

    /// True when the result must be treated as "no match"
    pub fn is_empty(&self) -> bool {
        matches!(self, MatchResult::ContainedBy { regions } if regions.is_empty())
    }
}

/// Places co-located with a target city.
///
/// `success == false` means boundary matching produced nothing usable and
/// `places` holds the unmodified seed places for city-name filtering.
#[derive(Debug, Clone, Serialize)]
pub struct ExpansionResult {
    pub success: bool,
    /// Regions the seed places resolved to, sorted
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub seed_regions: Vec<String>,
    pub places: Vec<Place>,
}

impl ExpansionResult {
    pub fn fallback(places: Vec<Place>) -> Self {
        Self {
            success: false,
            seed_regions: Vec::new(),
            places,
        }
    }

    pub fn len(&self) -> usize {
        self.places.len()
    }

    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_match_result_accessors() {
        let contained = MatchResult::ContainedBy {
            regions: vec!["A".to_string(), "B".to_string()],
        };
        assert_eq!(contained.regions(), vec!["A", "B"]);
        assert_eq!(contained.primary(), Some("A"));
        assert!(contained.is_contained());

        let nearest = MatchResult::NearestTo {
            region: "C".to_string(),
            distance: 12.5,
        };
        assert_eq!(nearest.primary(), Some("C"));
        assert!(!nearest.is_contained());
        assert!(!nearest.is_empty());

        let empty = MatchResult::ContainedBy { regions: vec![] };
        assert!(empty.is_empty());
        assert_eq!(empty.primary(), None);
    }

    #[test]
    fn test_match_result_json_shape() {
        let nearest = MatchResult::NearestTo {
            region: "C".to_string(),
            distance: 1.0,
        };
        let json = serde_json::to_value(&nearest).unwrap();
        assert_eq!(json["kind"], "nearest_to");
        assert_eq!(json["region"], "C");
    }
}

// Core data model for the location-resolution pipeline
// LocationRequest and ResolvedLocation are ephemeral (one run);
// MapArtifact persists on disk until removed or overwritten.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// A geographic coordinate (WGS84 decimal degrees)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

/// One entity whose free-text location still needs resolving
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationRequest {
    /// Entity name, unique within a single run
    pub entity_name: String,

    /// Free-text location as entered by the entity ("Paris", "somewhere
    /// in the Alps", ...)
    pub raw_location: String,
}

impl LocationRequest {
    pub fn new(entity_name: impl Into<String>, raw_location: impl Into<String>) -> Self {
        LocationRequest {
            entity_name: entity_name.into(),
            raw_location: raw_location.into(),
        }
    }

    /// Build requests from a raw name → location mapping, skipping
    /// entries whose location text is empty or whitespace-only.
    /// Duplicate names have already collapsed in the input map.
    pub fn from_mapping(mapping: HashMap<String, String>) -> Vec<LocationRequest> {
        let mut requests: Vec<LocationRequest> = mapping
            .into_iter()
            .filter(|(_, location)| !location.trim().is_empty())
            .map(|(name, location)| LocationRequest::new(name, location))
            .collect();

        // HashMap iteration order is arbitrary; keep runs reproducible
        requests.sort_by(|a, b| a.entity_name.cmp(&b.entity_name));
        requests
    }
}

/// A successfully resolved entity. Entities that failed resolution are
/// dropped by the resolver and never reach this type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedLocation {
    pub entity_name: String,
    pub raw_location: String,
    pub coordinate: Coordinate,
}

/// Handle to a persisted map artifact
#[derive(Debug, Clone, PartialEq)]
pub struct ArtifactHandle {
    /// Caller-supplied key the artifact path was derived from
    pub key: String,

    /// Full path of the written `{key}_map.html` file
    pub path: PathBuf,
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_mapping_skips_empty_locations() {
        let mut mapping = HashMap::new();
        mapping.insert("alice".to_string(), "Paris".to_string());
        mapping.insert("bob".to_string(), "".to_string());
        mapping.insert("carol".to_string(), "   ".to_string());

        let requests = LocationRequest::from_mapping(mapping);

        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].entity_name, "alice");
        assert_eq!(requests[0].raw_location, "Paris");
    }

    #[test]
    fn test_from_mapping_is_sorted_by_name() {
        let mut mapping = HashMap::new();
        mapping.insert("zoe".to_string(), "Kyiv".to_string());
        mapping.insert("adam".to_string(), "Lviv".to_string());

        let requests = LocationRequest::from_mapping(mapping);

        let names: Vec<&str> = requests.iter().map(|r| r.entity_name.as_str()).collect();
        assert_eq!(names, vec!["adam", "zoe"]);
    }

    #[test]
    fn test_from_mapping_empty() {
        let requests = LocationRequest::from_mapping(HashMap::new());
        assert!(requests.is_empty());
    }
}

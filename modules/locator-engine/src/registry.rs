use std::collections::HashMap;

use locator_common::{push_unique, AmenityId, Location, LocationId, LocationRecord};
use serde::Deserialize;
use tracing::warn;

/// Autocomplete stays quiet below this many characters.
pub const SUGGEST_MIN_CHARS: usize = 3;

/// Server-supplied page data: location records plus the amenity list
/// attached to each listed location, keyed by location id.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageData {
    pub locations: Vec<LocationRecord>,
    #[serde(default)]
    pub amenities: HashMap<LocationId, Vec<AmenityId>>,
}

/// The fixed set of locations for one session. Read-only after load.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    locations: Vec<Location>,
    index: HashMap<LocationId, usize>,
}

impl Registry {
    /// Build from page data, keeping record order. Records whose
    /// coordinates cannot be parsed are skipped.
    pub fn load(data: PageData) -> Self {
        let PageData {
            locations: records,
            amenities,
        } = data;

        let mut locations = Vec::with_capacity(records.len());
        for record in records {
            let id = record.location_id;
            match Location::from_record(record, amenities.get(&id).map(Vec::as_slice)) {
                Some(location) => locations.push(location),
                None => warn!(location_id = %id, "Skipping location with unparseable coordinates"),
            }
        }
        Self::from_locations(locations)
    }

    /// Build from already parsed locations. A repeated id resolves to its
    /// first occurrence.
    pub fn from_locations(locations: Vec<Location>) -> Self {
        let mut index = HashMap::with_capacity(locations.len());
        for (i, location) in locations.iter().enumerate() {
            index.entry(location.id).or_insert(i);
        }
        Self { locations, index }
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn get(&self, id: LocationId) -> Option<&Location> {
        self.index.get(&id).map(|&i| &self.locations[i])
    }

    pub fn len(&self) -> usize {
        self.locations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Locations whose name is exactly `name`.
    pub fn by_name(&self, name: &str) -> Vec<&Location> {
        self.locations.iter().filter(|l| l.name == name).collect()
    }

    /// Location names containing `term`, ignoring case.
    pub fn suggest(&self, term: &str) -> Vec<&str> {
        let term = term.trim();
        if term.chars().count() < SUGGEST_MIN_CHARS {
            return Vec::new();
        }
        let needle = term.to_lowercase();
        let mut names: Vec<&str> = Vec::new();
        for location in &self.locations {
            let name = location.name.as_str();
            if name.to_lowercase().contains(&needle) && !names.contains(&name) {
                names.push(name);
            }
        }
        names
    }

    /// Every amenity id carried by any location, first-seen order.
    pub fn amenity_ids(&self) -> Vec<AmenityId> {
        let mut ids = Vec::new();
        for location in &self.locations {
            for id in &location.amenities {
                push_unique(&mut ids, *id);
            }
        }
        ids
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn page() -> PageData {
        serde_json::from_value(json!({
            "locations": [
                { "location_id": 1, "lat": 43.1566, "lng": -77.6088, "tags": ["Branches"],
                  "name": "Downtown YMCA", "markup": "<p>Downtown</p>" },
                { "location_id": 2, "lat": "43.10", "lng": "-77.50", "tags": ["Camps"],
                  "name": "Camp Arrowhead", "markup": "" },
                { "location_id": 3, "lat": "north", "lng": "-77.50", "tags": ["Camps"],
                  "name": "Broken", "markup": "" },
                { "location_id": 4, "lat": 43.2, "lng": -77.7, "tags": [],
                  "name": "Northside YMCA", "markup": "" }
            ],
            "amenities": { "1": [3, "7"], "2": [7, 9] }
        }))
        .unwrap()
    }

    #[test]
    fn load_skips_bad_coordinates_and_keeps_order() {
        let registry = Registry::load(page());
        let ids: Vec<u64> = registry.locations().iter().map(|l| l.id.0).collect();
        assert_eq!(ids, vec![1, 2, 4]);
    }

    #[test]
    fn amenities_attach_by_id() {
        let registry = Registry::load(page());
        let downtown = registry.get(LocationId(1)).unwrap();
        assert_eq!(downtown.amenities, vec![AmenityId::new(3), AmenityId::new(7)]);
        assert!(downtown.listed);
        let northside = registry.get(LocationId(4)).unwrap();
        assert!(northside.amenities.is_empty());
        assert!(!northside.listed);
        assert_eq!(
            registry.amenity_ids(),
            vec![AmenityId::new(3), AmenityId::new(7), AmenityId::new(9)]
        );
    }

    #[test]
    fn suggest_needs_three_characters() {
        let registry = Registry::load(page());
        assert!(registry.suggest("ym").is_empty());
        assert_eq!(registry.suggest("ymca"), vec!["Downtown YMCA", "Northside YMCA"]);
        assert_eq!(registry.suggest("ARROW"), vec!["Camp Arrowhead"]);
    }

    #[test]
    fn by_name_is_exact() {
        let registry = Registry::load(page());
        assert_eq!(registry.by_name("Downtown YMCA").len(), 1);
        assert!(registry.by_name("downtown ymca").is_empty());
    }
}

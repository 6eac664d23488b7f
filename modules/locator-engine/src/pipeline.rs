//! Geospatial filter pipeline.
//!
//! A pure reduction over the whole registry, run in a fixed order:
//! tag, then distance, then amenity. Each stage passes everything through
//! when its filter is empty or unset.

use locator_common::{haversine_miles, AmenityId, GeoPoint, Location, LocationId};
use serde::Serialize;

use crate::state::Filters;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VisibleLocation {
    pub id: LocationId,
    /// Miles from the search center, when the distance stage ran.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterResult {
    pub visible: Vec<VisibleLocation>,
}

impl FilterResult {
    pub fn from_ids(ids: impl IntoIterator<Item = LocationId>) -> Self {
        Self {
            visible: ids
                .into_iter()
                .map(|id| VisibleLocation { id, distance: None })
                .collect(),
        }
    }

    pub fn ids(&self) -> Vec<LocationId> {
        self.visible.iter().map(|v| v.id).collect()
    }

    pub fn contains(&self, id: LocationId) -> bool {
        self.visible.iter().any(|v| v.id == id)
    }

    pub fn len(&self) -> usize {
        self.visible.len()
    }

    pub fn is_empty(&self) -> bool {
        self.visible.is_empty()
    }
}

pub fn apply_filters(
    locations: &[Location],
    filters: &Filters,
    search_center: Option<GeoPoint>,
) -> FilterResult {
    let tagged = tag_stage(locations, &filters.tags);
    let within = distance_stage(tagged, filters.distance, search_center);
    let visible = amenity_stage(within, &filters.amenities)
        .into_iter()
        .map(|(loc, distance)| VisibleLocation {
            id: loc.id,
            distance,
        })
        .collect();

    FilterResult { visible }
}

fn tag_stage<'a>(locations: &'a [Location], tags: &[String]) -> Vec<&'a Location> {
    if tags.is_empty() {
        return locations.iter().collect();
    }
    locations.iter().filter(|loc| loc.has_any_tag(tags)).collect()
}

fn distance_stage(
    locations: Vec<&Location>,
    limit: Option<f64>,
    center: Option<GeoPoint>,
) -> Vec<(&Location, Option<f64>)> {
    let (Some(center), Some(limit)) = (center, limit) else {
        return locations.into_iter().map(|loc| (loc, None)).collect();
    };
    locations
        .into_iter()
        .filter_map(|loc| {
            let d = haversine_miles(center, loc.point);
            (d <= limit).then_some((loc, Some(d)))
        })
        .collect()
}

fn amenity_stage<'a>(
    candidates: Vec<(&'a Location, Option<f64>)>,
    amenities: &[AmenityId],
) -> Vec<(&'a Location, Option<f64>)> {
    if amenities.is_empty() {
        return candidates;
    }
    candidates
        .into_iter()
        .filter(|(loc, _)| loc.has_any_amenity(amenities))
        .collect()
}

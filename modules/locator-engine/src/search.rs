use geocoding_client::GeocodeHit;
use locator_common::GeoPoint;
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchPhase {
    #[default]
    Idle,
    Searching,
    Centered,
}

/// Search workflow state.
///
/// `point` is where the last successful geocode landed and where the search
/// marker sits. `center` is what distance filtering measures from; it can
/// also come from the map view when a distance is picked before any search.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SearchState {
    pub phase: SearchPhase,
    pub query: Option<String>,
    pub point: Option<GeoPoint>,
    pub center: Option<GeoPoint>,
    /// Geocode requests started so far.
    pub requests: u64,
    /// Phase to return to when a request fails.
    #[serde(skip)]
    settled: SearchPhase,
}

impl SearchState {
    pub fn begin(&mut self, query: &str) {
        if self.phase != SearchPhase::Searching {
            self.settled = self.phase;
        }
        self.phase = SearchPhase::Searching;
        self.query = Some(query.to_string());
        self.requests += 1;
    }

    /// Apply a successful geocode. The resolved point becomes both the marker
    /// position and the distance center.
    pub fn resolve(&mut self, hit: &GeocodeHit) {
        self.phase = SearchPhase::Centered;
        self.settled = SearchPhase::Centered;
        self.point = Some(hit.center);
        self.center = Some(hit.center);
    }

    /// Leave `Searching` for the last settled phase. Centers are untouched.
    pub fn fail(&mut self) {
        self.phase = self.settled;
    }

    /// The distance center, seeding it from `fallback` if none is set yet.
    pub fn center_or(&mut self, fallback: GeoPoint) -> GeoPoint {
        *self.center.get_or_insert(fallback)
    }

    pub fn reset(&mut self) {
        self.phase = SearchPhase::Idle;
        self.settled = SearchPhase::Idle;
        self.query = None;
    }
}

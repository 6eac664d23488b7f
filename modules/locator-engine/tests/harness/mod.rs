//! Test doubles: a map provider that records every call and a geocoder
//! that answers from a script.

#![allow(dead_code)]

use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use geocoding_client::{GeocodeError, GeocodeHit, Geocoder};
use locator_common::config::ContainerSize;
use locator_common::{Bounds, GeoPoint, Location, LocationId, MapSettings};
use locator_engine::{MemoryView, PageData, Registry, RenderCoordinator, UrlState};
use locator_map::scene::MarkerIcon;
use locator_map::{
    FitPadding, GeocodeFuture, MapError, MapProvider, MapScene, MarkerState, ProviderKind,
    SearchMarkerState, Viewport, ZoomRange,
};
use serde_json::json;

pub const ROCHESTER: GeoPoint = GeoPoint {
    lat: 43.1566,
    lng: -77.6088,
};

// ---------------------------------------------------------------------------
// Scripted geocoder
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum Script {
    Hit(GeocodeHit),
    Empty,
    Fail(String),
}

#[derive(Default)]
pub struct ScriptedGeocoder {
    answers: HashMap<String, Script>,
}

impl ScriptedGeocoder {
    pub fn answer(mut self, query: &str, script: Script) -> Self {
        self.answers.insert(query.to_string(), script);
        self
    }
}

#[async_trait]
impl Geocoder for ScriptedGeocoder {
    fn name(&self) -> &'static str {
        "scripted"
    }

    async fn geocode(&self, query: &str) -> geocoding_client::Result<Option<GeocodeHit>> {
        match self.answers.get(query) {
            Some(Script::Hit(hit)) => Ok(Some(hit.clone())),
            Some(Script::Fail(message)) => Err(GeocodeError::Network(message.clone())),
            Some(Script::Empty) | None => Ok(None),
        }
    }
}

pub fn hit_at(lat: f64, lng: f64) -> Script {
    Script::Hit(GeocodeHit {
        center: GeoPoint::new(lat, lng),
        bounds: Some(Bounds::from_corners(
            GeoPoint::new(lat - 0.1, lng - 0.1),
            GeoPoint::new(lat + 0.1, lng + 0.1),
        )),
        label: None,
    })
}

// ---------------------------------------------------------------------------
// Recording map provider
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    Initialize { container: String, center: GeoPoint },
    PlaceMarker(LocationId),
    SetMarkerVisible(LocationId, bool),
    RemoveAllMarkers,
    FitTo(Bounds),
    SetCenter(GeoPoint),
    SearchMarker(GeoPoint, bool),
    Geocode(String),
}

pub type CallLog = Arc<Mutex<Vec<Call>>>;

pub struct RecordingMap {
    log: CallLog,
    loaded: bool,
    geocoder: Arc<dyn Geocoder>,
    viewport: Viewport,
    markers: BTreeMap<LocationId, GeoPoint>,
    shown: BTreeSet<LocationId>,
    search_marker: SearchMarkerState,
}

impl RecordingMap {
    pub fn new(geocoder: ScriptedGeocoder) -> (Self, CallLog) {
        let log = CallLog::default();
        let map = Self {
            log: log.clone(),
            loaded: true,
            geocoder: Arc::new(geocoder),
            viewport: Viewport::new(GeoPoint::new(0.0, 0.0), 3, ContainerSize::default()),
            markers: BTreeMap::new(),
            shown: BTreeSet::new(),
            search_marker: SearchMarkerState {
                position: GeoPoint::new(0.0, 0.0),
                visible: false,
                icon: MarkerIcon::default(),
            },
        };
        (map, log)
    }

    pub fn never_loads(mut self) -> Self {
        self.loaded = false;
        self
    }

    fn record(&self, call: Call) {
        self.log.lock().unwrap().push(call);
    }
}

impl MapProvider for RecordingMap {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Sdk
    }

    fn library_loaded(&self) -> bool {
        self.loaded
    }

    fn default_center(&self) -> GeoPoint {
        GeoPoint::new(0.0, 0.0)
    }

    fn initialize(&mut self, container: &str, center: GeoPoint) {
        self.viewport.recenter(center);
        self.record(Call::Initialize {
            container: container.to_string(),
            center,
        });
    }

    fn is_initialized(&self) -> bool {
        true
    }

    fn place_marker(&mut self, location: &Location) -> Result<(), MapError> {
        self.markers.insert(location.id, location.point);
        self.record(Call::PlaceMarker(location.id));
        Ok(())
    }

    fn set_marker_visible(&mut self, id: LocationId, visible: bool) -> Result<(), MapError> {
        if !self.markers.contains_key(&id) {
            return Err(MapError::UnknownMarker(id));
        }
        if visible {
            self.shown.insert(id);
        } else {
            self.shown.remove(&id);
        }
        self.record(Call::SetMarkerVisible(id, visible));
        Ok(())
    }

    fn remove_all_markers(&mut self) {
        self.shown.clear();
        self.record(Call::RemoveAllMarkers);
    }

    fn fit_to(&mut self, bounds: Bounds) {
        self.viewport
            .fit(bounds, FitPadding::default(), ZoomRange { min: 0, max: 18 });
        self.record(Call::FitTo(bounds));
    }

    fn set_center(&mut self, point: GeoPoint) {
        self.viewport.recenter(point);
        self.record(Call::SetCenter(point));
    }

    fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    fn set_search_center_marker(&mut self, point: GeoPoint, visible: bool) {
        self.search_marker.position = point;
        self.search_marker.visible = visible;
        self.record(Call::SearchMarker(point, visible));
    }

    fn geocode(&self, query: &str) -> GeocodeFuture {
        self.record(Call::Geocode(query.to_string()));
        let geocoder = self.geocoder.clone();
        let query = query.to_string();
        Box::pin(async move { geocoder.geocode(&query).await })
    }

    fn scene(&self) -> MapScene {
        MapScene::Sdk {
            container: None,
            viewport: self.viewport.clone(),
            markers: self
                .markers
                .iter()
                .map(|(id, position)| MarkerState {
                    id: *id,
                    position: *position,
                    visible: self.shown.contains(id),
                    icon: MarkerIcon::default(),
                    popup: String::new(),
                })
                .collect(),
            search_marker: self.search_marker.clone(),
            open_info_window: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Five locations around Rochester, NY. Location 5 has no tags and no list
/// entry.
pub fn page_data() -> PageData {
    serde_json::from_value(json!({
        "locations": [
            { "location_id": 1, "lat": 43.1566, "lng": -77.6088, "tags": ["Gym"],
              "name": "Downtown YMCA", "markup": "<h3>Downtown</h3>", "icon": "icons/gym.png" },
            { "location_id": 2, "lat": "43.13", "lng": "-77.5", "tags": ["Pool"],
              "name": "Eastside Pool", "markup": "<h3>Eastside</h3>", "icon": "icons/pool.png" },
            { "location_id": 3, "lat": 43.9, "lng": -77.0, "tags": ["Camp"],
              "name": "Camp Arrowhead", "markup": "<h3>Camp</h3>" },
            { "location_id": 4, "lat": 42.8864, "lng": -78.8784, "tags": ["Gym"],
              "name": "Buffalo YMCA", "markup": "<h3>Buffalo</h3>" },
            { "location_id": 5, "lat": 43.0, "lng": -77.5, "tags": [],
              "name": "Admin Office", "markup": "" }
        ],
        "amenities": {
            "1": [3, 7],
            "2": [7, 9],
            "3": [],
            "4": [3]
        }
    }))
    .unwrap()
}

pub fn settings() -> MapSettings {
    MapSettings {
        center: Some(ROCHESTER),
        ..Default::default()
    }
}

pub struct Finder {
    pub finder: RenderCoordinator<MemoryView>,
    pub log: CallLog,
}

impl Finder {
    pub fn calls(&self) -> Vec<Call> {
        self.log.lock().unwrap().clone()
    }

    pub fn clear_calls(&self) {
        self.log.lock().unwrap().clear();
    }

    pub fn visible(&self) -> Vec<u64> {
        self.finder.last_result().ids().iter().map(|id| id.0).collect()
    }
}

pub fn finder_with(settings: MapSettings, url: &str, geocoder: ScriptedGeocoder) -> Finder {
    let (map, log) = RecordingMap::new(geocoder);
    let finder = RenderCoordinator::new(
        settings,
        Registry::load(page_data()),
        Box::new(map),
        MemoryView::default(),
        UrlState::parse(url),
    )
    .unwrap();
    Finder { finder, log }
}

pub fn finder(url: &str) -> Finder {
    finder_with(settings(), url, ScriptedGeocoder::default())
}

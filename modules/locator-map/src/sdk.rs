use std::collections::BTreeMap;
use std::sync::Arc;

use geocoding_client::Geocoder;
use locator_common::{Bounds, GeoPoint, Location, LocationId, MapSettings};

use crate::error::MapError;
use crate::provider::{GeocodeFuture, LibraryHandle, MapProvider, ProviderKind};
use crate::scene::{popup_html, MapScene, MarkerIcon, MarkerState, SearchMarkerState};
use crate::viewport::{FitPadding, Viewport, ZoomRange};

/// Geographic center of the contiguous United States.
const DEFAULT_CENTER: GeoPoint = GeoPoint {
    lat: 39.8283,
    lng: -98.5795,
};

const INITIAL_ZOOM: u8 = 9;

const ZOOM: ZoomRange = ZoomRange { min: 0, max: 21 };

struct SdkMarker {
    position: GeoPoint,
    icon: Option<String>,
    popup: String,
    visible: bool,
}

/// Commercial SDK backend. Every marker is attached straight to the map and
/// toggled with a visibility flag. No clustering.
///
/// The SDK script loads asynchronously; the map reports ready once its
/// [`LibraryHandle`] is marked.
pub struct SdkMap {
    library: LibraryHandle,
    geocoder: Arc<dyn Geocoder>,
    marker_image_url: Option<String>,
    container: Option<String>,
    viewport: Viewport,
    markers: BTreeMap<LocationId, SdkMarker>,
    search_marker: SearchMarkerState,
    open_info_window: Option<LocationId>,
}

impl SdkMap {
    pub fn new(settings: &MapSettings, geocoder: Arc<dyn Geocoder>, library: LibraryHandle) -> Self {
        let center = settings.center.unwrap_or(DEFAULT_CENTER);
        Self {
            library,
            geocoder,
            marker_image_url: settings.marker_image_url.clone(),
            container: None,
            viewport: Viewport::new(center, INITIAL_ZOOM, settings.container_size),
            markers: BTreeMap::new(),
            search_marker: SearchMarkerState {
                position: center,
                visible: false,
                icon: MarkerIcon::default(),
            },
            open_info_window: None,
        }
    }

    /// Open the clicked marker's info window, closing any other.
    pub fn click_marker(&mut self, id: LocationId) -> Result<(), MapError> {
        let marker = self.markers.get(&id).ok_or(MapError::UnknownMarker(id))?;
        if marker.visible {
            self.open_info_window = Some(id);
        }
        Ok(())
    }

    fn require_init(&self) -> Result<(), MapError> {
        match self.container {
            Some(_) => Ok(()),
            None => Err(MapError::NotInitialized),
        }
    }
}

impl MapProvider for SdkMap {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Sdk
    }

    fn library_loaded(&self) -> bool {
        self.library.is_loaded()
    }

    fn default_center(&self) -> GeoPoint {
        DEFAULT_CENTER
    }

    fn initialize(&mut self, container: &str, center: GeoPoint) {
        self.container = Some(container.to_string());
        self.viewport.recenter(center);
        self.viewport.zoom = INITIAL_ZOOM;
        self.search_marker.position = center;
        self.search_marker.visible = false;
        tracing::info!(container, %center, "SDK map initialized");
    }

    fn is_initialized(&self) -> bool {
        self.container.is_some()
    }

    fn place_marker(&mut self, location: &Location) -> Result<(), MapError> {
        self.require_init()?;
        let icon = location.icon.clone().or_else(|| self.marker_image_url.clone());
        self.markers.insert(
            location.id,
            SdkMarker {
                position: location.point,
                icon,
                popup: popup_html(&location.markup),
                visible: false,
            },
        );
        Ok(())
    }

    fn set_marker_visible(&mut self, id: LocationId, visible: bool) -> Result<(), MapError> {
        let marker = self.markers.get_mut(&id).ok_or(MapError::UnknownMarker(id))?;
        marker.visible = visible;
        if !visible && self.open_info_window == Some(id) {
            self.open_info_window = None;
        }
        Ok(())
    }

    fn remove_all_markers(&mut self) {
        for marker in self.markers.values_mut() {
            marker.visible = false;
        }
        self.open_info_window = None;
    }

    fn fit_to(&mut self, bounds: Bounds) {
        self.viewport.fit(bounds, FitPadding::default(), ZOOM);
    }

    fn set_center(&mut self, point: GeoPoint) {
        self.viewport.recenter(point);
    }

    fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    fn set_search_center_marker(&mut self, point: GeoPoint, visible: bool) {
        self.search_marker.position = point;
        self.search_marker.visible = visible;
    }

    fn geocode(&self, query: &str) -> GeocodeFuture {
        let geocoder = Arc::clone(&self.geocoder);
        let query = query.to_string();
        Box::pin(async move { geocoder.geocode(&query).await })
    }

    fn scene(&self) -> MapScene {
        MapScene::Sdk {
            container: self.container.clone(),
            viewport: self.viewport.clone(),
            markers: self
                .markers
                .iter()
                .map(|(id, m)| MarkerState {
                    id: *id,
                    position: m.position,
                    visible: m.visible,
                    icon: MarkerIcon {
                        url: m.icon.clone(),
                        ..Default::default()
                    },
                    popup: m.popup.clone(),
                })
                .collect(),
            search_marker: self.search_marker.clone(),
            open_info_window: self.open_info_window,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{location, NoGeocoder};

    fn map() -> SdkMap {
        let settings = MapSettings {
            marker_image_url: Some("/img/pin.png".to_string()),
            ..Default::default()
        };
        let mut map = SdkMap::new(&settings, Arc::new(NoGeocoder), LibraryHandle::loaded());
        map.initialize("map", GeoPoint::new(43.0, -77.0));
        map
    }

    #[test]
    fn markers_before_initialize_fail() {
        let mut map = SdkMap::new(&MapSettings::default(), Arc::new(NoGeocoder), LibraryHandle::loaded());
        assert_eq!(
            map.place_marker(&location(1, 43.0, -77.0, &["Gym"])),
            Err(MapError::NotInitialized)
        );
    }

    #[test]
    fn placed_markers_start_hidden_and_fall_back_to_default_icon() {
        let mut map = map();
        map.place_marker(&location(1, 43.0, -77.0, &["Gym"])).unwrap();
        let scene = map.scene();
        let marker = &scene.markers()[0];
        assert!(!marker.visible);
        assert_eq!(marker.icon.url.as_deref(), Some("/img/pin.png"));
        assert!(marker.popup.starts_with(r#"<div class="marker_tooltip">"#));
    }

    #[test]
    fn hidden_markers_are_kept() {
        let mut map = map();
        map.place_marker(&location(1, 43.0, -77.0, &["Gym"])).unwrap();
        map.set_marker_visible(LocationId(1), true).unwrap();
        map.remove_all_markers();
        assert_eq!(map.scene().markers().len(), 1);
        assert!(map.scene().visible_markers().is_empty());
        map.set_marker_visible(LocationId(1), true).unwrap();
        assert_eq!(map.scene().visible_markers(), vec![LocationId(1)]);
    }

    #[test]
    fn ready_once_library_is_marked() {
        let library = LibraryHandle::default();
        let map = SdkMap::new(&MapSettings::default(), Arc::new(NoGeocoder), library.clone());
        assert!(!map.library_loaded());
        library.mark_loaded();
        assert!(map.library_loaded());
    }

    #[test]
    fn unknown_marker_is_reported() {
        let mut map = map();
        assert_eq!(
            map.set_marker_visible(LocationId(9), true),
            Err(MapError::UnknownMarker(LocationId(9)))
        );
    }

    #[test]
    fn single_location_fit_is_padded() {
        let mut map = map();
        let loc = location(1, 43.0, -77.0, &["Gym"]);
        assert!(map.fit_bounds(&[&loc]));
        let framed = map.viewport().framed.unwrap();
        assert!(!framed.is_degenerate());
        assert!((framed.north_east.lat - 43.001).abs() < 1e-9);
        assert!((framed.south_west.lng - -77.001).abs() < 1e-9);
    }

    #[test]
    fn empty_fit_leaves_view_alone() {
        let mut map = map();
        let before = map.viewport().clone();
        assert!(!map.fit_bounds(&[]));
        assert_eq!(map.viewport(), &before);
    }

    #[test]
    fn clustering_is_unsupported() {
        let mut map = map();
        assert!(matches!(
            map.enable_clustering(Default::default()),
            Err(MapError::Unsupported(_))
        ));
    }

    #[test]
    fn one_info_window_at_a_time() {
        let mut map = map();
        for id in 1..=2 {
            map.place_marker(&location(id, 43.0, -77.0, &["Gym"])).unwrap();
            map.set_marker_visible(LocationId(id), true).unwrap();
        }
        map.click_marker(LocationId(1)).unwrap();
        map.click_marker(LocationId(2)).unwrap();
        assert!(matches!(map.scene(), MapScene::Sdk { open_info_window: Some(LocationId(2)), .. }));

        map.set_marker_visible(LocationId(2), false).unwrap();
        assert!(matches!(map.scene(), MapScene::Sdk { open_info_window: None, .. }));
    }
}

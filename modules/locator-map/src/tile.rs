use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;

use geocoding_client::Geocoder;
use locator_common::{Bounds, GeoPoint, Location, LocationId, LocatorError, MapSettings};

use crate::basemap::BaseLayer;
use crate::cluster::{ClusterGroup, ClusterOptions};
use crate::error::MapError;
use crate::provider::{GeocodeFuture, MapProvider, ProviderKind};
use crate::scene::{popup_html, ClusterScene, MapScene, MarkerIcon, MarkerState, SearchMarkerState};
use crate::viewport::{FitPadding, Viewport};

const DEFAULT_CENTER: GeoPoint = GeoPoint {
    lat: 51.505,
    lng: -0.09,
};

const INITIAL_ZOOM: u8 = 13;

const MARKER_SIZE: [u32; 2] = [32, 42];
const MARKER_ANCHOR: [i32; 2] = [16, 38];
const MARKER_POPUP_ANCHOR: [i32; 2] = [0, -36];

const SEARCH_MARKER_SIZE: [u32; 2] = [25, 41];
const SEARCH_MARKER_ANCHOR: [i32; 2] = [12, 41];
const SEARCH_MARKER_POPUP_ANCHOR: [i32; 2] = [1, -34];

/// Room for the marker image above a fitted point and its tip below.
const FIT_PADDING: FitPadding = FitPadding {
    top_left: [0, 40],
    bottom_right: [0, 10],
};

struct TileMarker {
    position: GeoPoint,
    icon: MarkerIcon,
    popup: String,
}

/// Open tile backend. Markers are added to and removed from the map, or
/// from a cluster group once clustering is enabled. The tile library is
/// bundled with the page, so the map is always ready.
pub struct TileMap {
    geocoder: Arc<dyn Geocoder>,
    marker_image_url: Option<String>,
    base_layer: BaseLayer,
    container: Option<String>,
    viewport: Viewport,
    markers: BTreeMap<LocationId, TileMarker>,
    on_map: BTreeSet<LocationId>,
    cluster: Option<ClusterGroup>,
    search_marker: SearchMarkerState,
}

impl TileMap {
    pub fn new(settings: &MapSettings, geocoder: Arc<dyn Geocoder>) -> Result<Self, LocatorError> {
        let base_layer = BaseLayer::from_settings(&settings.base_layer)?;
        let center = settings.center.unwrap_or(DEFAULT_CENTER);
        let zoom = base_layer.zoom.clamp(INITIAL_ZOOM);

        Ok(Self {
            geocoder,
            marker_image_url: settings.marker_image_url.clone(),
            base_layer,
            container: None,
            viewport: Viewport::new(center, zoom, settings.container_size),
            markers: BTreeMap::new(),
            on_map: BTreeSet::new(),
            cluster: None,
            search_marker: SearchMarkerState {
                position: center,
                visible: false,
                icon: MarkerIcon {
                    url: settings.search_icon.clone(),
                    retina_url: settings.search_icon_retina.clone(),
                    size: Some(SEARCH_MARKER_SIZE),
                    anchor: Some(SEARCH_MARKER_ANCHOR),
                    popup_anchor: Some(SEARCH_MARKER_POPUP_ANCHOR),
                },
            },
        })
    }

    pub fn base_layer(&self) -> &BaseLayer {
        &self.base_layer
    }

    fn marker_icon(&self, location: &Location) -> MarkerIcon {
        let Some(url) = location.icon.clone().or_else(|| self.marker_image_url.clone()) else {
            return MarkerIcon::default();
        };
        let geometry = location.icon_geometry;
        MarkerIcon {
            url: Some(url),
            retina_url: None,
            size: Some(geometry.size.unwrap_or(MARKER_SIZE)),
            anchor: Some(geometry.anchor.unwrap_or(MARKER_ANCHOR)),
            popup_anchor: Some(geometry.popup_anchor.unwrap_or(MARKER_POPUP_ANCHOR)),
        }
    }

    fn is_shown(&self, id: LocationId) -> bool {
        match &self.cluster {
            Some(group) => group.has_layer(id),
            None => self.on_map.contains(&id),
        }
    }
}

impl MapProvider for TileMap {
    fn kind(&self) -> ProviderKind {
        ProviderKind::Tile
    }

    fn default_center(&self) -> GeoPoint {
        DEFAULT_CENTER
    }

    fn initialize(&mut self, container: &str, center: GeoPoint) {
        self.container = Some(container.to_string());
        self.viewport.recenter(center);
        self.viewport.zoom = self.base_layer.zoom.clamp(INITIAL_ZOOM);
        self.search_marker.position = center;
        self.search_marker.visible = false;
        tracing::info!(container, %center, base_layer = %self.base_layer.name, "Tile map initialized");
    }

    fn is_initialized(&self) -> bool {
        self.container.is_some()
    }

    fn place_marker(&mut self, location: &Location) -> Result<(), MapError> {
        if self.container.is_none() {
            return Err(MapError::NotInitialized);
        }
        let marker = TileMarker {
            position: location.point,
            icon: self.marker_icon(location),
            popup: popup_html(&location.markup),
        };
        self.markers.insert(location.id, marker);
        Ok(())
    }

    fn set_marker_visible(&mut self, id: LocationId, visible: bool) -> Result<(), MapError> {
        if !self.markers.contains_key(&id) {
            return Err(MapError::UnknownMarker(id));
        }
        match (&mut self.cluster, visible) {
            (Some(group), true) => group.add_layer(id),
            (Some(group), false) => group.remove_layer(id),
            (None, true) => {
                self.on_map.insert(id);
            }
            (None, false) => {
                self.on_map.remove(&id);
            }
        }
        Ok(())
    }

    fn remove_all_markers(&mut self) {
        self.on_map.clear();
        if let Some(group) = &mut self.cluster {
            group.clear_layers();
        }
    }

    fn fit_to(&mut self, bounds: Bounds) {
        self.viewport.fit(bounds, FIT_PADDING, self.base_layer.zoom);
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

    /// Markers already on the map move into the new group.
    fn enable_clustering(&mut self, options: ClusterOptions) -> Result<(), MapError> {
        let mut group = ClusterGroup::new(options);
        for id in std::mem::take(&mut self.on_map) {
            group.add_layer(id);
        }
        self.cluster = Some(group);
        tracing::info!(?options, "Marker clustering enabled");
        Ok(())
    }

    fn geocode(&self, query: &str) -> GeocodeFuture {
        let geocoder = Arc::clone(&self.geocoder);
        let query = query.to_string();
        Box::pin(async move { geocoder.geocode(&query).await })
    }

    fn scene(&self) -> MapScene {
        let clustering = self.cluster.as_ref().map(|group| {
            let positions: HashMap<LocationId, GeoPoint> = self
                .markers
                .iter()
                .map(|(id, m)| (*id, m.position))
                .collect();
            ClusterScene {
                options: group.options(),
                clusters: group.clusters(&positions, self.viewport.zoom),
            }
        });

        MapScene::Tile {
            container: self.container.clone(),
            viewport: self.viewport.clone(),
            tile_layer: self.base_layer.clone(),
            markers: self
                .markers
                .iter()
                .map(|(id, m)| MarkerState {
                    id: *id,
                    position: m.position,
                    visible: self.is_shown(*id),
                    icon: m.icon.clone(),
                    popup: m.popup.clone(),
                })
                .collect(),
            clustering,
            search_marker: self.search_marker.clone(),
        }
    }
}

use locator_common::{GeoPoint, LocationId};
use serde::Serialize;

use crate::basemap::BaseLayer;
use crate::cluster::{Cluster, ClusterOptions};
use crate::viewport::Viewport;

/// Popup content shown when a marker is clicked.
pub(crate) fn popup_html(markup: &str) -> String {
    format!(r#"<div class="marker_tooltip">{markup}</div>"#)
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MarkerIcon {
    /// `None` selects the library's default marker image.
    pub url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retina_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<[u32; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anchor: Option<[i32; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub popup_anchor: Option<[i32; 2]>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MarkerState {
    pub id: LocationId,
    pub position: GeoPoint,
    pub visible: bool,
    pub icon: MarkerIcon,
    pub popup: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchMarkerState {
    pub position: GeoPoint,
    pub visible: bool,
    pub icon: MarkerIcon,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClusterScene {
    pub options: ClusterOptions,
    pub clusters: Vec<Cluster>,
}

/// Serializable snapshot of a provider's map, for front-ends to render.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "provider", rename_all = "snake_case")]
pub enum MapScene {
    Sdk {
        container: Option<String>,
        viewport: Viewport,
        markers: Vec<MarkerState>,
        search_marker: SearchMarkerState,
        open_info_window: Option<LocationId>,
    },
    Tile {
        container: Option<String>,
        viewport: Viewport,
        tile_layer: BaseLayer,
        markers: Vec<MarkerState>,
        clustering: Option<ClusterScene>,
        search_marker: SearchMarkerState,
    },
}

impl MapScene {
    pub fn viewport(&self) -> &Viewport {
        match self {
            Self::Sdk { viewport, .. } | Self::Tile { viewport, .. } => viewport,
        }
    }

    pub fn markers(&self) -> &[MarkerState] {
        match self {
            Self::Sdk { markers, .. } | Self::Tile { markers, .. } => markers,
        }
    }

    pub fn visible_markers(&self) -> Vec<LocationId> {
        self.markers()
            .iter()
            .filter(|m| m.visible)
            .map(|m| m.id)
            .collect()
    }

    pub fn search_marker(&self) -> &SearchMarkerState {
        match self {
            Self::Sdk { search_marker, .. } | Self::Tile { search_marker, .. } => search_marker,
        }
    }
}

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures::future::BoxFuture;
use geocoding_client::GeocodeHit;
use locator_common::{Bounds, GeoPoint, Location, LocationId, DEGENERATE_BOUNDS_MARGIN};
use serde::Serialize;

use crate::cluster::ClusterOptions;
use crate::error::MapError;
use crate::scene::MapScene;
use crate::viewport::Viewport;

/// Pending geocode request. Owns everything it needs, so several can be in
/// flight at once and resolve in any order.
pub type GeocodeFuture = BoxFuture<'static, geocoding_client::Result<Option<GeocodeHit>>>;

/// Loaded flag of an externally loaded mapping library. Clones share the
/// flag: the host keeps one and marks it once the library script has run.
#[derive(Debug, Clone, Default)]
pub struct LibraryHandle(Arc<AtomicBool>);

impl LibraryHandle {
    /// A handle for a library that is already available.
    pub fn loaded() -> Self {
        let handle = Self::default();
        handle.mark_loaded();
        handle
    }

    pub fn mark_loaded(&self) {
        self.0.store(true, Ordering::Release);
    }

    pub fn is_loaded(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderKind {
    Sdk,
    Tile,
}

/// Abstract map operations driven by the render coordinator.
///
/// Markers are placed once per location and afterwards only shown or hidden.
pub trait MapProvider: Send + Sync {
    fn kind(&self) -> ProviderKind;

    /// Whether the underlying mapping library finished loading. Backends
    /// whose library ships with the page are always ready.
    fn library_loaded(&self) -> bool {
        true
    }

    /// Fallback center when the settings carry none.
    fn default_center(&self) -> GeoPoint;

    fn initialize(&mut self, container: &str, center: GeoPoint);

    fn is_initialized(&self) -> bool;

    /// Create the marker for `location`. Placing the same id twice replaces
    /// the first marker. New markers start hidden.
    fn place_marker(&mut self, location: &Location) -> Result<(), MapError>;

    fn set_marker_visible(&mut self, id: LocationId, visible: bool) -> Result<(), MapError>;

    /// Hide every marker. Handles stay registered.
    fn remove_all_markers(&mut self);

    /// Frame exactly `bounds`.
    fn fit_to(&mut self, bounds: Bounds);

    /// Frame the given locations. A single point is padded so the map does
    /// not zoom all the way in. Returns `false`, leaving the view alone, when
    /// `locations` is empty.
    fn fit_bounds(&mut self, locations: &[&Location]) -> bool {
        match Bounds::from_points(locations.iter().map(|l| l.point)) {
            Some(bounds) => {
                self.fit_to(bounds.padded_if_degenerate(DEGENERATE_BOUNDS_MARGIN));
                true
            }
            None => false,
        }
    }

    fn set_center(&mut self, point: GeoPoint);

    fn viewport(&self) -> &Viewport;

    fn center(&self) -> GeoPoint {
        self.viewport().center
    }

    fn set_search_center_marker(&mut self, point: GeoPoint, visible: bool);

    /// Group markers into clusters. Not every backend can.
    fn enable_clustering(&mut self, options: ClusterOptions) -> Result<(), MapError> {
        let _ = options;
        Err(MapError::Unsupported("marker clustering"))
    }

    /// Resolve free text with this backend's geocoder.
    fn geocode(&self, query: &str) -> GeocodeFuture;

    fn scene(&self) -> MapScene;
}

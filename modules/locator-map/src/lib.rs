//! Map provider adapters.
//!
//! One trait, [`MapProvider`], with two independent backends: [`SdkMap`]
//! (commercial SDK semantics, markers attached straight to the map) and
//! [`TileMap`] (open tile layer, optional marker clustering). Both keep a
//! headless model of the map that front-ends render from [`MapScene`].

pub mod basemap;
pub mod cluster;
pub mod error;
pub mod factory;
pub mod provider;
pub mod scene;
pub mod sdk;
pub mod tile;
pub mod viewport;

#[cfg(test)]
mod testing;

pub use basemap::BaseLayer;
pub use cluster::{Cluster, ClusterGroup, ClusterOptions};
pub use error::MapError;
pub use factory::{build_geocoder, build_provider};
pub use provider::{GeocodeFuture, LibraryHandle, MapProvider, ProviderKind};
pub use scene::{MapScene, MarkerState, SearchMarkerState};
pub use sdk::SdkMap;
pub use tile::TileMap;
pub use viewport::{FitPadding, Viewport, ZoomRange};

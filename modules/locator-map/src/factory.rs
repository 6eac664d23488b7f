use std::sync::Arc;

use geocoding_client::{Geocoder, GoogleGeocoder, NominatimGeocoder};
use locator_common::config::MapEngine;
use locator_common::{GeocodingEnv, LocatorError, MapSettings};

use crate::cluster::ClusterOptions;
use crate::provider::{LibraryHandle, MapProvider};
use crate::sdk::SdkMap;
use crate::tile::TileMap;

/// Geocoder matching the configured engine.
pub fn build_geocoder(
    settings: &MapSettings,
    env: &GeocodingEnv,
) -> Result<Arc<dyn Geocoder>, LocatorError> {
    let geocoder: Arc<dyn Geocoder> = match settings.engine {
        MapEngine::Gmaps => {
            let key = env.google_api_key.clone().ok_or_else(|| {
                LocatorError::Config("GOOGLE_MAPS_API_KEY is required for the gmaps engine".into())
            })?;
            Arc::new(GoogleGeocoder::new(key).map_err(|e| LocatorError::Config(e.to_string()))?)
        }
        MapEngine::Leaflet => Arc::new(
            NominatimGeocoder::new(env.nominatim_url.as_deref(), &env.user_agent)
                .map_err(|e| LocatorError::Config(e.to_string()))?
                .with_query_suffix(settings.default_location.as_deref()),
        ),
    };
    Ok(geocoder)
}

/// Build the map provider selected by `settings.engine`, with clustering
/// switched on when configured and supported. `library` reports when the
/// SDK script has loaded; the tile backend does not wait on it.
pub fn build_provider(
    settings: &MapSettings,
    geocoder: Arc<dyn Geocoder>,
    library: LibraryHandle,
) -> Result<Box<dyn MapProvider>, LocatorError> {
    match settings.engine {
        MapEngine::Gmaps => {
            if settings.clustering.enable {
                tracing::warn!("Clustering is not available for the gmaps engine, ignoring");
            }
            Ok(Box::new(SdkMap::new(settings, geocoder, library)))
        }
        MapEngine::Leaflet => {
            let mut map = TileMap::new(settings, geocoder)?;
            if settings.clustering.enable {
                map.enable_clustering(ClusterOptions::from(&settings.clustering))
                    .map_err(|e| LocatorError::Config(e.to_string()))?;
            }
            Ok(Box::new(map))
        }
    }
}

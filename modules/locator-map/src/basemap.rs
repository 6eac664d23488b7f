use locator_common::config::BaseLayerSettings;
use locator_common::LocatorError;
use serde::Serialize;

use crate::viewport::ZoomRange;

/// Zoom range of a tile source that declares none.
const DEFAULT_ZOOM: ZoomRange = ZoomRange { min: 0, max: 18 };

/// A tile source: URL pattern, attribution and zoom bounds.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BaseLayer {
    pub name: String,
    pub url_pattern: String,
    pub attribution: String,
    pub zoom: ZoomRange,
}

pub const PRESET_NAMES: [&str; 4] = [
    "Wikimedia",
    "Esri.WorldStreetMap",
    "Esri.NatGeoWorldMap",
    "OpenStreetMap.Mapnik",
];

impl BaseLayer {
    pub fn preset(name: &str) -> Result<Self, LocatorError> {
        let (url_pattern, attribution, zoom) = match name {
            "Wikimedia" => (
                "https://maps.wikimedia.org/osm-intl/{z}/{x}/{y}{r}.png",
                r#"<a href="https://wikimediafoundation.org/wiki/Maps_Terms_of_Use">Wikimedia</a>"#,
                ZoomRange { min: 1, max: 19 },
            ),
            "Esri.WorldStreetMap" => (
                "https://server.arcgisonline.com/ArcGIS/rest/services/World_Street_Map/MapServer/tile/{z}/{y}/{x}",
                "Tiles &copy; Esri &mdash; Source: Esri, DeLorme, NAVTEQ, USGS, Intermap, iPC, NRCAN, Esri Japan, METI, Esri China (Hong Kong), Esri (Thailand), TomTom, 2012",
                DEFAULT_ZOOM,
            ),
            "Esri.NatGeoWorldMap" => (
                "https://server.arcgisonline.com/ArcGIS/rest/services/NatGeo_World_Map/MapServer/tile/{z}/{y}/{x}",
                "Tiles &copy; Esri &mdash; National Geographic, Esri, DeLorme, NAVTEQ, UNEP-WCMC, USGS, NASA, ESA, METI, NRCAN, GEBCO, NOAA, iPC",
                ZoomRange { min: 0, max: 16 },
            ),
            "OpenStreetMap.Mapnik" => (
                "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png",
                r#"&copy; <a href="http://www.openstreetmap.org/copyright">OpenStreetMap</a>"#,
                ZoomRange { min: 0, max: 19 },
            ),
            other => return Err(LocatorError::UnknownBaseLayer(other.to_string())),
        };

        Ok(Self {
            name: name.to_string(),
            url_pattern: url_pattern.to_string(),
            attribution: attribution.to_string(),
            zoom,
        })
    }

    /// The configured preset, with its URL pattern replaced by the override
    /// when one is active. Attribution and zoom bounds stay the preset's.
    pub fn from_settings(settings: &BaseLayerSettings) -> Result<Self, LocatorError> {
        let mut layer = Self::preset(&settings.preset)?;
        if let Some(pattern) = settings.active_override() {
            tracing::info!(preset = %layer.name, pattern, "Base layer URL overridden");
            layer.url_pattern = pattern.to_string();
        }
        Ok(layer)
    }
}

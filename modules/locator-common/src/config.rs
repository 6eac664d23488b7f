use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::error::LocatorError;
use crate::geo::MILES_PER_KILOMETER;
use crate::types::GeoPoint;

/// Which map backend renders the widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MapEngine {
    /// Commercial SDK backend.
    Gmaps,
    /// Open tile backend.
    #[default]
    Leaflet,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DistanceUnits {
    #[default]
    #[serde(rename = "ml")]
    Miles,
    #[serde(rename = "km")]
    Kilometers,
}

impl DistanceUnits {
    pub fn label(self) -> &'static str {
        match self {
            Self::Miles => "miles",
            Self::Kilometers => "kilometers",
        }
    }

    /// Convert a count in these units to miles.
    pub fn to_miles(self, count: f64) -> f64 {
        match self {
            Self::Miles => count,
            Self::Kilometers => count * MILES_PER_KILOMETER,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BaseLayerSettings {
    pub preset: String,
    pub override_enable: bool,
    pub override_pattern: Option<String>,
}

impl Default for BaseLayerSettings {
    fn default() -> Self {
        Self {
            preset: "Wikimedia".to_string(),
            override_enable: false,
            override_pattern: None,
        }
    }
}

impl BaseLayerSettings {
    /// The override pattern, when enabled and non-empty.
    pub fn active_override(&self) -> Option<&str> {
        if !self.override_enable {
            return None;
        }
        self.override_pattern.as_deref().filter(|p| !p.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClusteringSettings {
    pub enable: bool,
    pub zoom_to_bounds_on_click: bool,
    pub show_coverage_on_hover: bool,
    /// Zoom level at and above which markers are never clustered. 0 disables.
    pub disable_clustering_at_zoom: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ContainerSize {
    pub width: u32,
    pub height: u32,
}

impl Default for ContainerSize {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
        }
    }
}

/// Location-finder widget settings, loaded from TOML.
/// Secrets (geocoding API keys) stay as env vars, see [`GeocodingEnv`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MapSettings {
    pub engine: MapEngine,
    /// Tags active when the URL carries no `type` parameter.
    pub default_tags: Vec<String>,
    /// Appended to every open-geocoder query, e.g. a city or region name.
    pub default_location: Option<String>,
    pub distance_units: DistanceUnits,
    pub search_icon: Option<String>,
    pub search_icon_retina: Option<String>,
    pub marker_image_url: Option<String>,
    /// Initial map center; each backend has its own fallback.
    pub center: Option<GeoPoint>,
    /// DOM id of the map container.
    pub container: Option<String>,
    pub container_size: ContainerSize,
    pub base_layer: BaseLayerSettings,
    pub clustering: ClusteringSettings,
}

/// Selectable distance limits, in display units.
pub const DISTANCE_STEPS: [u32; 5] = [5, 10, 30, 50, 100];

/// Option index preselected when a search arrives through the URL.
pub const URL_SEARCH_DISTANCE_INDEX: usize = 2;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DistanceOption {
    /// Threshold in miles.
    pub value: f64,
    pub label: String,
}

impl MapSettings {
    pub fn distance_options(&self) -> Vec<DistanceOption> {
        DISTANCE_STEPS
            .iter()
            .map(|&step| DistanceOption {
                value: self.distance_units.to_miles(f64::from(step)),
                label: format!("{step} {}", self.distance_units.label()),
            })
            .collect()
    }

    pub fn validate(&self) -> Result<(), LocatorError> {
        if self.container_size.width == 0 || self.container_size.height == 0 {
            return Err(LocatorError::Config(
                "container_size must be non-zero in both dimensions".to_string(),
            ));
        }
        if let Some(center) = self.center {
            if !(-90.0..=90.0).contains(&center.lat) || !(-180.0..=180.0).contains(&center.lng) {
                return Err(LocatorError::Config(format!("center {center} is out of range")));
            }
        }
        Ok(())
    }
}

/// Load and parse a settings TOML file.
pub fn load_settings(path: &Path) -> Result<MapSettings> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read settings file: {}", path.display()))?;
    let settings: MapSettings = toml::from_str(&content)
        .with_context(|| format!("Failed to parse settings file: {}", path.display()))?;
    settings.validate()?;
    Ok(settings)
}

/// First few characters of a secret, for logs.
fn preview_opt(val: &Option<String>) -> String {
    match val {
        Some(v) if !v.is_empty() => {
            let head: String = v.chars().take(5).collect();
            format!("{head}...({} chars)", v.chars().count())
        }
        _ => "<not set>".to_string(),
    }
}

/// Geocoding secrets and endpoints loaded from environment variables.
#[derive(Debug, Clone)]
pub struct GeocodingEnv {
    pub google_api_key: Option<String>,
    pub nominatim_url: Option<String>,
    pub user_agent: String,
}

impl GeocodingEnv {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let env = Self {
            google_api_key: std::env::var("GOOGLE_MAPS_API_KEY").ok(),
            nominatim_url: std::env::var("NOMINATIM_URL").ok(),
            user_agent: std::env::var("GEOCODER_USER_AGENT")
                .unwrap_or_else(|_| "locator/1.0".to_string()),
        };
        env.log_keys();
        env
    }

    fn log_keys(&self) {
        tracing::info!("Geocoding env loaded:");
        tracing::info!("  GOOGLE_MAPS_API_KEY: {}", preview_opt(&self.google_api_key));
        tracing::info!("  NOMINATIM_URL: {}", self.nominatim_url.as_deref().unwrap_or("<default>"));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let settings: MapSettings = toml::from_str("").unwrap();
        assert_eq!(settings.engine, MapEngine::Leaflet);
        assert_eq!(settings.base_layer.preset, "Wikimedia");
        assert!(!settings.clustering.enable);
        assert_eq!(settings.container_size, ContainerSize::default());
    }

    #[test]
    fn full_toml_parses() {
        let settings: MapSettings = toml::from_str(
            r#"
            engine = "gmaps"
            default_tags = ["Branches", "Camps"]
            default_location = "Rochester, NY"
            distance_units = "km"
            center = { lat = 43.15, lng = -77.61 }

            [base_layer]
            preset = "Esri.NatGeoWorldMap"
            override_enable = true
            override_pattern = "https://tiles.example.org/{z}/{x}/{y}.png"

            [clustering]
            enable = true
            disable_clustering_at_zoom = 14
            "#,
        )
        .unwrap();
        assert_eq!(settings.engine, MapEngine::Gmaps);
        assert_eq!(settings.default_tags, vec!["Branches", "Camps"]);
        assert_eq!(settings.distance_units, DistanceUnits::Kilometers);
        assert_eq!(
            settings.base_layer.active_override(),
            Some("https://tiles.example.org/{z}/{x}/{y}.png")
        );
        assert_eq!(settings.clustering.disable_clustering_at_zoom, 14);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        assert!(toml::from_str::<MapSettings>("zoom = 4").is_err());
    }

    #[test]
    fn override_requires_enable_flag_and_pattern() {
        let mut base = BaseLayerSettings {
            override_pattern: Some("https://x/{z}/{x}/{y}.png".to_string()),
            ..Default::default()
        };
        assert_eq!(base.active_override(), None);
        base.override_enable = true;
        assert!(base.active_override().is_some());
        base.override_pattern = Some("  ".to_string());
        assert_eq!(base.active_override(), None);
    }

    #[test]
    fn kilometer_options_carry_mile_values() {
        let settings = MapSettings {
            distance_units: DistanceUnits::Kilometers,
            ..Default::default()
        };
        let options = settings.distance_options();
        assert_eq!(options.len(), 5);
        assert_eq!(options[0].label, "5 kilometers");
        assert!((options[0].value - 3.105).abs() < 1e-9);
        assert_eq!(MapSettings::default().distance_options()[2].value, 30.0);
    }

    #[test]
    fn secret_preview_counts_characters() {
        assert_eq!(preview_opt(&None), "<not set>");
        assert_eq!(preview_opt(&Some(String::new())), "<not set>");
        assert_eq!(preview_opt(&Some("AIzaSyExample".to_string())), "AIzaS...(13 chars)");
        assert_eq!(preview_opt(&Some("ключ-🔑-секрет".to_string())), "ключ-...(13 chars)");
    }

    #[test]
    fn zero_container_is_invalid() {
        let settings = MapSettings {
            container_size: ContainerSize { width: 0, height: 10 },
            ..Default::default()
        };
        assert!(settings.validate().is_err());
    }
}

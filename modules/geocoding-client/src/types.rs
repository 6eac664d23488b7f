use locator_common::{Bounds, GeoPoint};
use serde::{Deserialize, Serialize};

use crate::error::{GeocodeError, Result};

/// A resolved search: the point to center on and, when the backend knows
/// it, the extent of the matched place.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeocodeHit {
    pub center: GeoPoint,
    pub bounds: Option<Bounds>,
    pub label: Option<String>,
}

// --- Commercial address API ---

#[derive(Debug, Deserialize)]
pub struct GoogleResponse {
    pub status: String,
    #[serde(default)]
    pub results: Vec<GoogleResult>,
    #[serde(default)]
    pub error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GoogleResult {
    #[serde(default)]
    pub formatted_address: Option<String>,
    pub geometry: GoogleGeometry,
}

#[derive(Debug, Deserialize)]
pub struct GoogleGeometry {
    pub location: GoogleLatLng,
    #[serde(default)]
    pub bounds: Option<GoogleBounds>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct GoogleLatLng {
    pub lat: f64,
    pub lng: f64,
}

impl From<GoogleLatLng> for GeoPoint {
    fn from(p: GoogleLatLng) -> Self {
        GeoPoint::new(p.lat, p.lng)
    }
}

#[derive(Debug, Deserialize)]
pub struct GoogleBounds {
    pub northeast: GoogleLatLng,
    pub southwest: GoogleLatLng,
}

impl GoogleResponse {
    /// First result as a hit. `ZERO_RESULTS` is an empty answer, not an error.
    pub fn into_hit(self) -> Result<Option<GeocodeHit>> {
        match self.status.as_str() {
            "OK" => Ok(self.results.into_iter().next().map(|first| GeocodeHit {
                center: first.geometry.location.into(),
                bounds: first
                    .geometry
                    .bounds
                    .map(|b| Bounds::from_corners(b.southwest.into(), b.northeast.into())),
                label: first.formatted_address,
            })),
            "ZERO_RESULTS" => Ok(None),
            _ => Err(GeocodeError::Api {
                status: self.status,
                message: self.error_message.unwrap_or_default(),
            }),
        }
    }
}

// --- Open search endpoint ---

#[derive(Debug, Clone, Deserialize)]
pub struct NominatimPlace {
    pub lat: String,
    pub lon: String,
    /// `[south, north, west, east]`
    #[serde(default)]
    pub boundingbox: Option<Vec<String>>,
    #[serde(default)]
    pub display_name: Option<String>,
}

fn parse_coord(raw: &str, field: &str) -> Result<f64> {
    raw.trim()
        .parse()
        .map_err(|_| GeocodeError::Parse(format!("invalid {field}: {raw:?}")))
}

impl NominatimPlace {
    pub fn to_hit(&self) -> Result<GeocodeHit> {
        let center = GeoPoint::new(parse_coord(&self.lat, "lat")?, parse_coord(&self.lon, "lon")?);

        let bounds = match self.boundingbox.as_deref() {
            Some([south, north, west, east]) => Some(Bounds::from_corners(
                GeoPoint::new(parse_coord(south, "south")?, parse_coord(west, "west")?),
                GeoPoint::new(parse_coord(north, "north")?, parse_coord(east, "east")?),
            )),
            _ => None,
        };

        Ok(GeocodeHit {
            center,
            bounds,
            label: self.display_name.clone(),
        })
    }
}

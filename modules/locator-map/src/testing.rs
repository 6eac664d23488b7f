use async_trait::async_trait;
use geocoding_client::{GeocodeHit, Geocoder};
use locator_common::{GeoPoint, IconGeometry, Location, LocationId};

/// Geocoder that never finds anything.
pub struct NoGeocoder;

#[async_trait]
impl Geocoder for NoGeocoder {
    fn name(&self) -> &'static str {
        "none"
    }

    async fn geocode(&self, _query: &str) -> geocoding_client::Result<Option<GeocodeHit>> {
        Ok(None)
    }
}

pub fn location(id: u64, lat: f64, lng: f64, tags: &[&str]) -> Location {
    Location {
        id: LocationId(id),
        point: GeoPoint::new(lat, lng),
        tags: tags.iter().map(|t| t.to_string()).collect(),
        amenities: Vec::new(),
        name: format!("Location {id}"),
        markup: format!("<h3>Location {id}</h3>"),
        icon: None,
        icon_geometry: IconGeometry::default(),
        listed: true,
    }
}

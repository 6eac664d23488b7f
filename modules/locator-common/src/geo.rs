use crate::types::GeoPoint;

/// Earth radius used for radial distance filtering, in miles.
pub const EARTH_RADIUS_MILES: f64 = 3963.0;

/// Miles in one kilometer, as used by the distance-limit options.
pub const MILES_PER_KILOMETER: f64 = 0.621;

/// Haversine great-circle distance between two points on a sphere of `radius`.
/// The result is in the unit of `radius`.
pub fn haversine_distance(from: GeoPoint, to: GeoPoint, radius: f64) -> f64 {
    let d_lat = (to.lat - from.lat).to_radians();
    let d_lng = (to.lng - from.lng).to_radians();
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();

    let a = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    radius * c
}

/// Haversine distance in miles.
pub fn haversine_miles(from: GeoPoint, to: GeoPoint) -> f64 {
    haversine_distance(from, to, EARTH_RADIUS_MILES)
}

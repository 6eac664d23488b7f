pub mod types;
pub mod geo;
pub mod slug;
pub mod config;
pub mod error;

pub use types::*;
pub use geo::{haversine_distance, haversine_miles, EARTH_RADIUS_MILES};
pub use slug::url_slug;
pub use config::{load_settings, GeocodingEnv, MapSettings};
pub use error::LocatorError;

pub mod error;
pub mod types;

pub use error::{GeocodeError, Result};
pub use types::{GeocodeHit, GoogleResponse, NominatimPlace};

use std::time::Duration;

use async_trait::async_trait;

const GOOGLE_GEOCODE_URL: &str = "https://maps.googleapis.com/maps/api/geocode/json";
const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org";

/// Longest query forwarded to a geocoding backend.
pub const MAX_QUERY_LEN: usize = 200;

/// Number of ranked candidates requested from the open endpoint. Only the
/// first one is used.
const NOMINATIM_LIMIT: &str = "5";

/// Resolves free text to a point.
#[async_trait]
pub trait Geocoder: Send + Sync {
    /// Backend name, for logs.
    fn name(&self) -> &'static str;

    /// Resolve `query`. `Ok(None)` means the backend answered with no match.
    async fn geocode(&self, query: &str) -> Result<Option<GeocodeHit>>;
}

fn check_query(query: &str) -> Result<()> {
    let len = query.chars().count();
    if len > MAX_QUERY_LEN {
        return Err(GeocodeError::QueryTooLong {
            len,
            max: MAX_QUERY_LEN,
        });
    }
    Ok(())
}

fn http_client(user_agent: &str) -> Result<reqwest::Client> {
    Ok(reqwest::Client::builder()
        .timeout(Duration::from_secs(10))
        .user_agent(user_agent)
        .build()?)
}

/// Commercial address-geocoding API client.
pub struct GoogleGeocoder {
    client: reqwest::Client,
    api_key: String,
    endpoint: String,
}

impl GoogleGeocoder {
    pub fn new(api_key: String) -> Result<Self> {
        Ok(Self {
            client: http_client("locator/1.0")?,
            api_key,
            endpoint: GOOGLE_GEOCODE_URL.to_string(),
        })
    }

    /// Point the client at a different endpoint (proxies, test servers).
    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }
}

#[async_trait]
impl Geocoder for GoogleGeocoder {
    fn name(&self) -> &'static str {
        "google"
    }

    async fn geocode(&self, query: &str) -> Result<Option<GeocodeHit>> {
        check_query(query)?;

        let resp = self
            .client
            .get(&self.endpoint)
            .query(&[("address", query), ("key", self.api_key.as_str())])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GeocodeError::Api {
                status: status.as_u16().to_string(),
                message: body,
            });
        }

        let body: GoogleResponse = resp.json().await?;
        tracing::debug!(query, status = %body.status, results = body.results.len(), "Geocode response");
        body.into_hit()
    }
}

/// Open geocoding search endpoint client.
pub struct NominatimGeocoder {
    client: reqwest::Client,
    base_url: String,
    query_suffix: Option<String>,
}

impl NominatimGeocoder {
    pub fn new(base_url: Option<&str>, user_agent: &str) -> Result<Self> {
        Ok(Self {
            client: http_client(user_agent)?,
            base_url: base_url
                .unwrap_or(NOMINATIM_URL)
                .trim_end_matches('/')
                .to_string(),
            query_suffix: None,
        })
    }

    /// Append `suffix` (a city or region) to every query sent. Blank
    /// suffixes are ignored.
    pub fn with_query_suffix(mut self, suffix: Option<&str>) -> Self {
        self.query_suffix = suffix
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);
        self
    }

    fn search_text(&self, query: &str) -> String {
        match &self.query_suffix {
            Some(suffix) => format!("{query} {suffix}"),
            None => query.to_string(),
        }
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    fn name(&self) -> &'static str {
        "nominatim"
    }

    async fn geocode(&self, query: &str) -> Result<Option<GeocodeHit>> {
        check_query(query)?;

        let url = format!("{}/search", self.base_url);
        let text = self.search_text(query);
        let resp = self
            .client
            .get(&url)
            .query(&[("format", "json"), ("limit", NOMINATIM_LIMIT), ("q", text.as_str())])
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GeocodeError::Api {
                status: status.as_u16().to_string(),
                message: body,
            });
        }

        let places: Vec<NominatimPlace> = resp.json().await?;
        tracing::debug!(query, results = places.len(), "Geocode response");
        places.first().map(NominatimPlace::to_hit).transpose()
    }
}

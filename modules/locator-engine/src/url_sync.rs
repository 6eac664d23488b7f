//! Filter state <-> query string.
//!
//! Decoding runs once at startup. Encoding runs after every filter cycle and
//! produces the replacement address (path plus query).

use locator_common::{url_slug, AmenityId};
use tracing::debug;
use url::form_urlencoded;

use crate::state::Filters;

pub const PARAM_TYPE: &str = "type";
pub const PARAM_AMENITIES: &str = "amenities";
pub const PARAM_MAP_LOCATION: &str = "map_location";
const UTM_PREFIX: &str = "utm_";

/// Query parameters read from the page address at load time.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UrlState {
    pub path: String,
    /// Tag slugs from `type`. `None` when the parameter is absent.
    pub types: Option<Vec<String>>,
    pub amenities: Vec<AmenityId>,
    /// Raw `map_location` token.
    pub map_location: Option<String>,
    /// `utm_*` pairs in their original order.
    pub utm: Vec<(String, String)>,
}

fn split_list(value: &str) -> Vec<String> {
    value.split(',').map(str::to_string).collect()
}

impl UrlState {
    /// Parse a full URL, a `path?query` pair or a bare `?query`.
    pub fn parse(address: &str) -> Self {
        let without_fragment = address.split('#').next().unwrap_or_default();
        let (path, query) = match without_fragment.split_once('?') {
            Some((path, query)) => (path, query),
            None => (without_fragment, ""),
        };
        let path = match url::Url::parse(path) {
            Ok(parsed) => parsed.path().to_string(),
            Err(_) => path.to_string(),
        };

        let mut state = Self {
            path,
            ..Default::default()
        };
        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            match key.as_ref() {
                PARAM_TYPE => state.types = Some(split_list(&value)),
                PARAM_AMENITIES => {
                    state.amenities = value.split(',').map(AmenityId::coerce).collect();
                }
                PARAM_MAP_LOCATION => state.map_location = Some(value.into_owned()),
                k if k.starts_with(UTM_PREFIX) => {
                    state.utm.push((k.to_string(), value.into_owned()));
                }
                _ => {}
            }
        }
        debug!(?state, "Decoded URL parameters");
        state
    }

    /// Tags to activate at startup: registered tags whose slug appears in
    /// `type`, or `default_tags` when the parameter is absent.
    pub fn initial_tags<'a>(
        &self,
        registered: impl IntoIterator<Item = &'a str>,
        default_tags: &[String],
    ) -> Vec<String> {
        match &self.types {
            None => default_tags.to_vec(),
            Some(slugs) => registered
                .into_iter()
                .filter(|tag| slugs.contains(&url_slug(tag)))
                .map(str::to_string)
                .collect(),
        }
    }

    /// The `map_location` token as free text for the search box.
    pub fn search_text(&self) -> Option<String> {
        let text = self.map_location.as_deref()?.replace(&['+', '-'][..], " ");
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }
}

/// Build the address reflecting `filters`. The live search term wins over
/// the `map_location` the page was loaded with.
pub fn encode(initial: &UrlState, filters: &Filters) -> String {
    let mut params: Vec<String> = Vec::new();

    let map_location = if filters.search.trim().is_empty() {
        initial.map_location.as_deref().unwrap_or_default()
    } else {
        filters.search.as_str()
    };
    let map_location = url_slug(map_location);
    if !map_location.is_empty() {
        params.push(format!("{PARAM_MAP_LOCATION}={map_location}"));
    }

    if !filters.tags.is_empty() {
        let slugs: Vec<String> = filters.tags.iter().map(|t| url_slug(t)).collect();
        params.push(format!("{PARAM_TYPE}={}", slugs.join(",")));
    }

    if !filters.amenities.is_empty() {
        let ids: Vec<String> = filters
            .amenities
            .iter()
            .map(|id| url_slug(&id.to_string()))
            .collect();
        params.push(format!("{PARAM_AMENITIES}={}", ids.join(",")));
    }

    if !initial.utm.is_empty() {
        let mut utm = form_urlencoded::Serializer::new(String::new());
        for (key, value) in &initial.utm {
            utm.append_pair(key, value);
        }
        params.push(utm.finish());
    }

    if params.is_empty() {
        initial.path.clone()
    } else {
        format!("{}?{}", initial.path, params.join("&"))
    }
}

//! Render coordinator.
//!
//! Owns the filter store and reacts to its change notifications: tag changes
//! refresh the amenity controls, amenity changes refresh the chips, and any
//! tag, amenity or distance change re-runs the pipeline. The resulting
//! "filters applied" event updates the address, the map and the list.

use std::collections::{BTreeMap, HashSet, VecDeque};

use geocoding_client::GeocodeHit;
use locator_common::config::URL_SEARCH_DISTANCE_INDEX;
use locator_common::{AmenityId, Bounds, GeoPoint, Location, LocationId, MapSettings, DEGENERATE_BOUNDS_MARGIN};
use locator_map::{GeocodeFuture, MapProvider};
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::pipeline::{self, FilterResult};
use crate::readiness::{wait_for_library, ReadyPolicy};
use crate::registry::Registry;
use crate::search::SearchState;
use crate::state::{Dimension, FilterChange, FilterStore, TagMeta};
use crate::url_sync::{self, UrlState};
use crate::view::{AmenityControl, FinderView, NO_RESULTS_MESSAGE};

const DEFAULT_CONTAINER: &str = "locator-map";

#[derive(Debug, Clone, PartialEq)]
pub enum FinderEvent {
    FilterChanged(FilterChange),
    FiltersApplied(FilterResult),
}

/// A geocode request in flight. Requests are not cancelled; whichever
/// completes last decides the final search center.
pub struct PendingSearch {
    query: String,
    request: GeocodeFuture,
}

impl PendingSearch {
    pub fn query(&self) -> &str {
        &self.query
    }

    pub async fn resolve(self) -> SearchOutcome {
        SearchOutcome {
            result: self.request.await,
            query: self.query,
        }
    }
}

#[derive(Debug)]
pub struct SearchOutcome {
    pub query: String,
    pub result: geocoding_client::Result<Option<GeocodeHit>>,
}

pub struct RenderCoordinator<V: FinderView> {
    settings: MapSettings,
    registry: Registry,
    store: FilterStore,
    map: Box<dyn MapProvider>,
    view: V,
    url: UrlState,
    current_url: String,
    search: SearchState,
    /// Value of the distance control, in miles. `None` is the blank option.
    distance_control: Option<f64>,
    last_result: FilterResult,
}

impl<V: FinderView> RenderCoordinator<V> {
    /// Wait for the map library, then initialize.
    pub async fn start(
        settings: MapSettings,
        registry: Registry,
        map: Box<dyn MapProvider>,
        view: V,
        url: UrlState,
        policy: ReadyPolicy,
    ) -> Result<Self> {
        wait_for_library(|| map.library_loaded(), policy).await?;
        Self::new(settings, registry, map, view, url)
    }

    /// Build the store from the registry, decode the load URL, place every
    /// marker and run the first filter cycle.
    pub fn new(
        settings: MapSettings,
        registry: Registry,
        mut map: Box<dyn MapProvider>,
        view: V,
        url: UrlState,
    ) -> Result<Self> {
        let mut store = FilterStore::new();
        for location in registry.locations() {
            if let Some(tag) = location.primary_tag() {
                store.add_tag(
                    tag,
                    TagMeta {
                        marker_icon: location.icon.clone(),
                    },
                );
            }
        }
        for location in registry.locations().iter().filter(|l| l.listed) {
            if let Some(tag) = location.primary_tag() {
                store.add_amenities(tag, &location.amenities);
            }
        }

        let tags = url.initial_tags(store.tag_labels(), &settings.default_tags);
        store.set_tags_filter(tags);
        store.set_amenities_filter(url.amenities.clone());

        let container = settings
            .container
            .clone()
            .unwrap_or_else(|| DEFAULT_CONTAINER.to_string());
        let center = settings.center.unwrap_or_else(|| map.default_center());
        map.initialize(&container, center);
        for location in registry.locations() {
            map.place_marker(location)?;
        }

        let current_url = url_sync::encode(&url, store.filters());
        let mut coordinator = Self {
            settings,
            registry,
            store,
            map,
            view,
            url,
            current_url,
            search: SearchState::default(),
            distance_control: None,
            last_result: FilterResult::default(),
        };

        let active = coordinator.store.tags_filter().to_vec();
        coordinator.set_tags_filter(active);

        info!(
            locations = coordinator.registry.len(),
            tags = coordinator.store.tags().len(),
            provider = ?coordinator.map.kind(),
            "Location finder initialized"
        );
        Ok(coordinator)
    }

    // --- Accessors ---

    pub fn settings(&self) -> &MapSettings {
        &self.settings
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn store(&self) -> &FilterStore {
        &self.store
    }

    pub fn map(&self) -> &dyn MapProvider {
        self.map.as_ref()
    }

    pub fn view(&self) -> &V {
        &self.view
    }

    pub fn search_state(&self) -> &SearchState {
        &self.search
    }

    /// Address reflecting the filters after the last cycle.
    pub fn current_url(&self) -> &str {
        &self.current_url
    }

    pub fn last_result(&self) -> &FilterResult {
        &self.last_result
    }

    pub fn distance_control(&self) -> Option<f64> {
        self.distance_control
    }

    pub fn subscribe(&mut self, subscriber: impl FnMut(&FilterChange) + Send + 'static) {
        self.store.subscribe(subscriber);
    }

    /// Autocomplete suggestions for the search input.
    pub fn suggestions(&self, term: &str) -> Vec<&str> {
        self.registry.suggest(term)
    }

    // --- User actions ---

    pub fn set_tags_filter(&mut self, tags: Vec<String>) {
        let change = self.store.set_tags_filter(tags);
        self.dispatch(FinderEvent::FilterChanged(change));
    }

    pub fn set_amenities_filter(&mut self, amenities: Vec<AmenityId>) {
        let change = self.store.set_amenities_filter(amenities);
        self.dispatch(FinderEvent::FilterChanged(change));
    }

    /// Drop one amenity from the filter, as when its chip is dismissed.
    pub fn remove_selected_amenity(&mut self, id: AmenityId) {
        let remaining = self
            .store
            .amenities_filter()
            .iter()
            .copied()
            .filter(|a| *a != id)
            .collect();
        self.set_amenities_filter(remaining);
    }

    /// The distance control changed. Without a prior search the current map
    /// center becomes the distance center.
    pub fn set_distance_limit(&mut self, miles: Option<f64>) {
        self.distance_control = miles;
        self.apply_distance_limit(miles);
    }

    /// Geocode `query` and center on the result. An empty query resets the
    /// search instead. Returns whether the map was recentered.
    pub async fn submit_search(&mut self, query: &str) -> bool {
        match self.begin_search(query) {
            Some(pending) => {
                let outcome = pending.resolve().await;
                self.complete_search(outcome)
            }
            None => false,
        }
    }

    /// First half of [`submit_search`](Self::submit_search): record the
    /// query and start the geocode request.
    pub fn begin_search(&mut self, query: &str) -> Option<PendingSearch> {
        let query = query.trim();
        let change = self.store.set_search(query);
        self.dispatch(FinderEvent::FilterChanged(change));

        if query.is_empty() {
            self.reset_search();
            return None;
        }

        self.search.begin(query);
        info!(query, provider = ?self.map.kind(), "Searching");
        Some(PendingSearch {
            query: query.to_string(),
            request: self.map.geocode(query),
        })
    }

    /// Second half of [`submit_search`](Self::submit_search). A failed or
    /// empty geocode leaves every filter and center as it was.
    pub fn complete_search(&mut self, outcome: SearchOutcome) -> bool {
        let SearchOutcome { query, result } = outcome;
        match result {
            Ok(Some(hit)) => {
                info!(%query, center = %hit.center, "Search centered");
                let bounds = hit.bounds.unwrap_or_else(|| Bounds::from_point(hit.center));
                self.map
                    .fit_to(bounds.padded_if_degenerate(DEGENERATE_BOUNDS_MARGIN));
                self.search.resolve(&hit);
                self.draw_search_center();
                self.apply_distance_limit(self.distance_control);
                true
            }
            Ok(None) => {
                warn!(%query, "No geocoding results");
                self.search.fail();
                false
            }
            Err(e) => {
                warn!(%query, error = %e, "Geocoding failed");
                self.search.fail();
                false
            }
        }
    }

    /// Empty search submitted: hide the search marker and drop the distance
    /// filter.
    pub fn reset_search(&mut self) {
        let fallback = self.map.center();
        self.search.center_or(fallback);
        self.search.reset();
        self.map
            .set_search_center_marker(self.search.point.unwrap_or(fallback), false);
        let change = self.store.set_distance(None);
        self.dispatch(FinderEvent::FilterChanged(change));
    }

    /// An autocomplete suggestion was picked. Shows the locations with that
    /// exact name without geocoding or touching the address. Returns the
    /// number of matches.
    pub fn select_suggestion(&mut self, name: &str) -> usize {
        let ids: Vec<LocationId> = self.registry.by_name(name).iter().map(|l| l.id).collect();
        if ids.is_empty() {
            warn!(name, "No location matches the selected suggestion");
            return 0;
        }

        let fallback = self.map.center();
        self.search.center_or(fallback);
        self.map
            .set_search_center_marker(self.search.point.unwrap_or(fallback), false);
        self.store.clear_distance_quietly();

        let result = FilterResult::from_ids(ids);
        self.draw_map(&result);
        self.draw_list(&result);
        let matches = result.len();
        self.last_result = result;
        matches
    }

    /// Submit the `map_location` search carried by the load URL, with the
    /// distance control preset. `None` when the URL carries none.
    pub async fn run_initial_search(&mut self) -> Option<bool> {
        let text = self.url.search_text()?;
        self.view.set_search_input(&text);
        self.distance_control = self
            .settings
            .distance_options()
            .get(URL_SEARCH_DISTANCE_INDEX)
            .map(|option| option.value);
        Some(self.submit_search(&text).await)
    }

    // --- Event handling ---

    fn dispatch(&mut self, event: FinderEvent) {
        let mut queue = VecDeque::from([event]);

        while let Some(event) = queue.pop_front() {
            match event {
                FinderEvent::FilterChanged(change) => {
                    debug!(dimension = %change.dimension(), "Filter changed");
                    match change.dimension() {
                        Dimension::Tags | Dimension::Amenities => {
                            self.update_amenity_controls();
                            self.draw_selected_amenities();
                        }
                        Dimension::Distance | Dimension::Search => {}
                    }
                    if change.affects_results() {
                        queue.push_back(FinderEvent::FiltersApplied(self.run_pipeline()));
                    }
                }
                FinderEvent::FiltersApplied(result) => {
                    self.sync_url();
                    self.draw_map(&result);
                    self.draw_list(&result);
                    self.last_result = result;
                }
            }
        }
    }

    fn run_pipeline(&self) -> FilterResult {
        let result = pipeline::apply_filters(
            self.registry.locations(),
            self.store.filters(),
            self.search.center,
        );
        debug!(
            visible = result.len(),
            total = self.registry.len(),
            distance = ?self.store.distance(),
            "Filters applied"
        );
        result
    }

    fn apply_distance_limit(&mut self, miles: Option<f64>) {
        let fallback = self.map.center();
        self.search.center_or(fallback);
        self.draw_search_center();
        let change = self.store.set_distance(miles);
        self.dispatch(FinderEvent::FilterChanged(change));
    }

    fn draw_search_center(&mut self) {
        if let Some(point) = self.search.point {
            self.map.set_search_center_marker(point, true);
        }
    }

    fn sync_url(&mut self) {
        self.current_url = url_sync::encode(&self.url, self.store.filters());
        debug!(url = %self.current_url, "Address replaced");
    }

    /// Show exactly the visible markers and frame them. An empty set leaves
    /// the bounds alone and recenters on the last search point.
    fn draw_map(&mut self, result: &FilterResult) {
        self.map.remove_all_markers();

        if result.is_empty() {
            if let Some(point) = self.last_search_point() {
                self.map.set_center(point);
            }
            return;
        }

        for id in result.ids() {
            if let Err(e) = self.map.set_marker_visible(id, true) {
                warn!(location_id = %id, error = %e, "Could not show marker");
            }
        }
        let visible: Vec<&Location> = result
            .visible
            .iter()
            .filter_map(|v| self.registry.get(v.id))
            .collect();
        self.map.fit_bounds(&visible);
    }

    fn last_search_point(&self) -> Option<GeoPoint> {
        self.search.point.or(self.search.center)
    }

    fn draw_list(&mut self, result: &FilterResult) {
        let shown: HashSet<LocationId> = result.ids().into_iter().collect();
        let mut headings: BTreeMap<&str, bool> = BTreeMap::new();

        for location in self.registry.locations().iter().filter(|l| l.listed) {
            let visible = shown.contains(&location.id);
            self.view.set_entry_visible(location.id, visible);
            if let Some(group) = location.primary_tag() {
                *headings.entry(group).or_default() |= visible;
            }
        }
        for (group, visible) in headings {
            self.view.set_heading_visible(group, visible);
        }

        if result.is_empty() {
            self.view.show_no_results(NO_RESULTS_MESSAGE);
        } else {
            self.view.hide_no_results();
        }
    }

    fn update_amenity_controls(&mut self) {
        let available = self.store.available_amenities();
        let selected = self.store.amenities_filter();
        let controls: Vec<AmenityControl> = self
            .registry
            .amenity_ids()
            .into_iter()
            .map(|id| AmenityControl {
                id,
                visible: available.contains(&id),
                checked: selected.contains(&id),
            })
            .collect();
        self.view.render_amenity_controls(&controls);
    }

    fn draw_selected_amenities(&mut self) {
        self.view
            .render_selected_amenities(self.store.amenities_filter());
    }
}

//! Filter state store.
//!
//! Single source of truth for the active filters. Every setter replaces its
//! field and synchronously notifies subscribers before returning, even when
//! the new value equals the old one.

use std::fmt;

use locator_common::{push_unique, AmenityId};
use serde::Serialize;

/// Which filter dimension a change touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    Tags,
    Amenities,
    Distance,
    Search,
}

impl Dimension {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Tags => "tags",
            Self::Amenities => "amenities",
            Self::Distance => "distance",
            Self::Search => "search",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A change notification carrying the new value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "dimension", content = "value", rename_all = "lowercase")]
pub enum FilterChange {
    Tags(Vec<String>),
    Amenities(Vec<AmenityId>),
    /// `None` is the unset sentinel: no distance filtering.
    Distance(Option<f64>),
    Search(String),
}

impl FilterChange {
    pub fn dimension(&self) -> Dimension {
        match self {
            Self::Tags(_) => Dimension::Tags,
            Self::Amenities(_) => Dimension::Amenities,
            Self::Distance(_) => Dimension::Distance,
            Self::Search(_) => Dimension::Search,
        }
    }

    /// Whether this change requires re-running the filter pipeline.
    pub fn affects_results(&self) -> bool {
        !matches!(self, Self::Search(_))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TagMeta {
    pub marker_icon: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TagEntry {
    pub label: String,
    pub meta: TagMeta,
    pub amenities: Vec<AmenityId>,
}

/// Current filter selections. Empty tag and amenity filters and an unset
/// distance all mean "let everything through".
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Filters {
    pub tags: Vec<String>,
    pub amenities: Vec<AmenityId>,
    pub distance: Option<f64>,
    pub search: String,
}

pub type Subscriber = Box<dyn FnMut(&FilterChange) + Send>;

#[derive(Default)]
pub struct FilterStore {
    tags: Vec<TagEntry>,
    filters: Filters,
    subscribers: Vec<Subscriber>,
}

impl fmt::Debug for FilterStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FilterStore")
            .field("tags", &self.tags)
            .field("filters", &self.filters)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl FilterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self, subscriber: impl FnMut(&FilterChange) + Send + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    fn emit(&mut self, change: FilterChange) -> FilterChange {
        for subscriber in &mut self.subscribers {
            subscriber(&change);
        }
        change
    }

    // --- Tag registry ---

    /// Register `tag` once. Returns `false` if it was already known, in which
    /// case `meta` is ignored.
    pub fn add_tag(&mut self, tag: &str, meta: TagMeta) -> bool {
        if self.tag(tag).is_some() {
            return false;
        }
        self.tags.push(TagEntry {
            label: tag.to_string(),
            meta,
            amenities: Vec::new(),
        });
        true
    }

    /// Union `ids` into the amenity set of a registered tag. Unknown tags are
    /// ignored.
    pub fn add_amenities(&mut self, tag: &str, ids: &[AmenityId]) {
        if let Some(entry) = self.tags.iter_mut().find(|t| t.label == tag) {
            for id in ids {
                push_unique(&mut entry.amenities, *id);
            }
        }
    }

    pub fn tags(&self) -> &[TagEntry] {
        &self.tags
    }

    pub fn tag(&self, label: &str) -> Option<&TagEntry> {
        self.tags.iter().find(|t| t.label == label)
    }

    pub fn tag_labels(&self) -> impl Iterator<Item = &str> {
        self.tags.iter().map(|t| t.label.as_str())
    }

    // --- Setters ---

    pub fn set_tags_filter(&mut self, tags: Vec<String>) -> FilterChange {
        let mut unique: Vec<String> = Vec::with_capacity(tags.len());
        for tag in tags {
            if !unique.contains(&tag) {
                unique.push(tag);
            }
        }
        self.filters.tags = unique.clone();
        self.emit(FilterChange::Tags(unique))
    }

    pub fn set_amenities_filter(&mut self, amenities: Vec<AmenityId>) -> FilterChange {
        let mut unique = Vec::with_capacity(amenities.len());
        for id in amenities {
            push_unique(&mut unique, id);
        }
        self.filters.amenities = unique.clone();
        self.emit(FilterChange::Amenities(unique))
    }

    pub fn set_distance(&mut self, distance: Option<f64>) -> FilterChange {
        self.filters.distance = distance;
        self.emit(FilterChange::Distance(distance))
    }

    pub fn set_search(&mut self, search: &str) -> FilterChange {
        self.filters.search = search.to_string();
        self.emit(FilterChange::Search(self.filters.search.clone()))
    }

    /// Unset the distance without notifying anyone. Used when a suggestion
    /// is picked and the map is redrawn directly.
    pub(crate) fn clear_distance_quietly(&mut self) {
        self.filters.distance = None;
    }

    // --- Getters ---

    pub fn filters(&self) -> &Filters {
        &self.filters
    }

    pub fn tags_filter(&self) -> &[String] {
        &self.filters.tags
    }

    pub fn amenities_filter(&self) -> &[AmenityId] {
        &self.filters.amenities
    }

    pub fn distance(&self) -> Option<f64> {
        self.filters.distance
    }

    pub fn search(&self) -> &str {
        &self.filters.search
    }

    /// Amenities offered under the active tag filter. When that union is
    /// empty (no tag filter, or only tags without amenities) every known
    /// amenity is available.
    pub fn available_amenities(&self) -> Vec<AmenityId> {
        let mut ids = Vec::new();
        for tag in &self.filters.tags {
            if let Some(entry) = self.tag(tag) {
                for id in &entry.amenities {
                    push_unique(&mut ids, *id);
                }
            }
        }
        if ids.is_empty() {
            return self.all_amenities();
        }
        ids
    }

    /// Union of the amenities of every registered tag.
    pub fn all_amenities(&self) -> Vec<AmenityId> {
        let mut ids = Vec::new();
        for entry in &self.tags {
            for id in &entry.amenities {
                push_unique(&mut ids, *id);
            }
        }
        ids
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use super::*;

    fn ids(raw: &[u32]) -> Vec<AmenityId> {
        raw.iter().copied().map(AmenityId::from).collect()
    }

    fn store() -> FilterStore {
        let mut store = FilterStore::new();
        store.add_tag("Gym", TagMeta::default());
        store.add_tag("Pool", TagMeta::default());
        store.add_tag("Camp", TagMeta::default());
        store.add_amenities("Gym", &ids(&[1, 2]));
        store.add_amenities("Pool", &ids(&[2, 3]));
        store
    }

    #[test]
    fn add_tag_registers_once() {
        let mut store = FilterStore::new();
        assert!(store.add_tag(
            "Gym",
            TagMeta {
                marker_icon: Some("gym.png".into())
            }
        ));
        store.add_amenities("Gym", &ids(&[4]));
        assert!(!store.add_tag(
            "Gym",
            TagMeta {
                marker_icon: Some("other.png".into())
            }
        ));
        let entry = store.tag("Gym").unwrap();
        assert_eq!(entry.meta.marker_icon.as_deref(), Some("gym.png"));
        assert_eq!(entry.amenities, ids(&[4]));
        assert_eq!(store.tags().len(), 1);
    }

    #[test]
    fn add_amenities_deduplicates() {
        let mut store = store();
        store.add_amenities("Gym", &ids(&[2, 5, 5, 1]));
        assert_eq!(store.tag("Gym").unwrap().amenities, ids(&[1, 2, 5]));
    }

    #[test]
    fn every_setter_emits_even_without_change() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let mut store = store();
        let sink = seen.clone();
        store.subscribe(move |change| sink.lock().unwrap().push(change.clone()));

        store.set_distance(Some(10.0));
        store.set_distance(Some(10.0));
        store.set_tags_filter(vec!["Gym".into()]);
        store.set_amenities_filter(ids(&[3]));
        store.set_search("rochester");

        let seen = seen.lock().unwrap();
        let dims: Vec<Dimension> = seen.iter().map(FilterChange::dimension).collect();
        assert_eq!(
            dims,
            vec![
                Dimension::Distance,
                Dimension::Distance,
                Dimension::Tags,
                Dimension::Amenities,
                Dimension::Search
            ]
        );
        assert_eq!(seen[0], FilterChange::Distance(Some(10.0)));
    }

    #[test]
    fn setter_returns_the_emitted_change() {
        let mut store = store();
        let change = store.set_tags_filter(vec!["Pool".into(), "Pool".into(), "Gym".into()]);
        assert_eq!(change, FilterChange::Tags(vec!["Pool".into(), "Gym".into()]));
        assert_eq!(store.tags_filter(), ["Pool", "Gym"]);
    }

    #[test]
    fn available_amenities_without_tag_filter_is_everything() {
        let store = store();
        assert_eq!(store.available_amenities(), ids(&[1, 2, 3]));
        assert_eq!(store.available_amenities(), store.all_amenities());
    }

    #[test]
    fn available_amenities_for_one_tag() {
        let mut store = store();
        store.set_tags_filter(vec!["Gym".into()]);
        assert_eq!(store.available_amenities(), ids(&[1, 2]));
        store.set_tags_filter(vec!["Gym".into(), "Pool".into()]);
        assert_eq!(store.available_amenities(), ids(&[1, 2, 3]));
    }

    #[test]
    fn tag_without_amenities_falls_back_to_everything() {
        let mut store = store();
        store.set_tags_filter(vec!["Camp".into(), "Unknown".into()]);
        assert_eq!(store.available_amenities(), ids(&[1, 2, 3]));
    }

    #[test]
    fn nan_amenities_are_kept() {
        let mut store = store();
        store.set_amenities_filter(vec![AmenityId::coerce("pool"), AmenityId::coerce("pool")]);
        // NaN never equals itself, so both survive de-duplication.
        assert_eq!(store.amenities_filter().len(), 2);
        assert!(!store.amenities_filter()[0].is_valid());
    }

    #[test]
    fn quiet_distance_clear_does_not_emit() {
        let count = Arc::new(Mutex::new(0));
        let mut store = store();
        store.set_distance(Some(5.0));
        let sink = count.clone();
        store.subscribe(move |_| *sink.lock().unwrap() += 1);
        store.clear_distance_quietly();
        assert_eq!(store.distance(), None);
        assert_eq!(*count.lock().unwrap(), 0);
    }
}

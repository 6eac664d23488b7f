//! Companion list contract.
//!
//! The list markup lives outside this crate. The coordinator only toggles
//! what is shown through [`FinderView`].

use std::collections::BTreeMap;

use locator_common::{AmenityId, LocationId};
use serde::Serialize;

pub const NO_RESULTS_MESSAGE: &str = "No locations were found in this area. Please try a different area or increase your search distance.";

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AmenityControl {
    pub id: AmenityId,
    pub visible: bool,
    pub checked: bool,
}

pub trait FinderView: Send {
    /// Show or hide the list entry of a listed location.
    fn set_entry_visible(&mut self, id: LocationId, visible: bool);

    /// Show or hide the heading of a primary-tag group.
    fn set_heading_visible(&mut self, group: &str, visible: bool);

    fn show_no_results(&mut self, message: &str);

    fn hide_no_results(&mut self);

    fn render_amenity_controls(&mut self, controls: &[AmenityControl]);

    /// Chips for the selected amenities.
    fn render_selected_amenities(&mut self, selected: &[AmenityId]);

    /// Prefill the search input.
    fn set_search_input(&mut self, _text: &str) {}
}

/// In-memory view, for headless use and tests.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MemoryView {
    pub entries: BTreeMap<LocationId, bool>,
    pub headings: BTreeMap<String, bool>,
    pub message: Option<String>,
    pub amenity_controls: Vec<AmenityControl>,
    pub selected_amenities: Vec<AmenityId>,
    pub search_input: String,
}

impl MemoryView {
    pub fn visible_entries(&self) -> Vec<LocationId> {
        self.entries
            .iter()
            .filter(|(_, shown)| **shown)
            .map(|(id, _)| *id)
            .collect()
    }
}

impl FinderView for MemoryView {
    fn set_entry_visible(&mut self, id: LocationId, visible: bool) {
        self.entries.insert(id, visible);
    }

    fn set_heading_visible(&mut self, group: &str, visible: bool) {
        self.headings.insert(group.to_string(), visible);
    }

    fn show_no_results(&mut self, message: &str) {
        self.message = Some(message.to_string());
    }

    fn hide_no_results(&mut self) {
        self.message = None;
    }

    fn render_amenity_controls(&mut self, controls: &[AmenityControl]) {
        self.amenity_controls = controls.to_vec();
    }

    fn render_selected_amenities(&mut self, selected: &[AmenityId]) {
        self.selected_amenities = selected.to_vec();
    }

    fn set_search_input(&mut self, text: &str) {
        self.search_input = text.to_string();
    }
}

use std::collections::{BTreeMap, BTreeSet, HashMap};

use locator_common::config::ClusteringSettings;
use locator_common::{Bounds, GeoPoint, LocationId};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ClusterOptions {
    pub zoom_to_bounds_on_click: bool,
    pub show_coverage_on_hover: bool,
    /// Zoom at and above which every marker stands alone.
    pub disable_clustering_at_zoom: Option<u8>,
}

impl From<&ClusteringSettings> for ClusterOptions {
    fn from(s: &ClusteringSettings) -> Self {
        Self {
            zoom_to_bounds_on_click: s.zoom_to_bounds_on_click,
            show_coverage_on_hover: s.show_coverage_on_hover,
            disable_clustering_at_zoom: (s.disable_clustering_at_zoom > 0)
                .then_some(s.disable_clustering_at_zoom),
        }
    }
}

/// Markers grouped at one zoom level.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cluster {
    /// Geohash cell the members fall into; empty for unclustered markers.
    pub cell: String,
    pub center: GeoPoint,
    pub bounds: Bounds,
    pub members: Vec<LocationId>,
}

impl Cluster {
    fn single(id: LocationId, point: GeoPoint) -> Self {
        Self {
            cell: String::new(),
            center: point,
            bounds: Bounds::from_point(point),
            members: vec![id],
        }
    }
}

/// Geohash precision used to bucket markers at `zoom`. Coarser cells at
/// low zoom merge more markers.
pub fn geohash_precision(zoom: u8) -> usize {
    match zoom {
        0..=2 => 1,
        3..=4 => 2,
        5..=7 => 3,
        8..=9 => 4,
        10..=12 => 5,
        13..=14 => 6,
        15..=17 => 7,
        _ => 8,
    }
}

/// The set of markers currently held by the cluster layer.
#[derive(Debug, Clone, Default)]
pub struct ClusterGroup {
    options: ClusterOptions,
    members: BTreeSet<LocationId>,
}

impl ClusterGroup {
    pub fn new(options: ClusterOptions) -> Self {
        Self {
            options,
            members: BTreeSet::new(),
        }
    }

    pub fn options(&self) -> ClusterOptions {
        self.options
    }

    pub fn add_layer(&mut self, id: LocationId) {
        self.members.insert(id);
    }

    pub fn remove_layer(&mut self, id: LocationId) {
        self.members.remove(&id);
    }

    pub fn clear_layers(&mut self) {
        self.members.clear();
    }

    pub fn has_layer(&self, id: LocationId) -> bool {
        self.members.contains(&id)
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Group members by geohash cell at `zoom`. `positions` maps marker ids
    /// to their coordinates; members without a position are skipped.
    pub fn clusters(&self, positions: &HashMap<LocationId, GeoPoint>, zoom: u8) -> Vec<Cluster> {
        let members = self
            .members
            .iter()
            .filter_map(|id| positions.get(id).map(|p| (*id, *p)));

        if self
            .options
            .disable_clustering_at_zoom
            .is_some_and(|limit| zoom >= limit)
        {
            return members.map(|(id, p)| Cluster::single(id, p)).collect();
        }

        let precision = geohash_precision(zoom);
        let mut cells: BTreeMap<String, Vec<(LocationId, GeoPoint)>> = BTreeMap::new();
        let mut loose = Vec::new();
        for (id, point) in members {
            match geohash::encode(geohash::Coord { x: point.lng, y: point.lat }, precision) {
                Ok(cell) => cells.entry(cell).or_default().push((id, point)),
                Err(_) => loose.push(Cluster::single(id, point)),
            }
        }

        let mut clusters: Vec<Cluster> = cells
            .into_iter()
            .filter_map(|(cell, entries)| {
                let bounds = Bounds::from_points(entries.iter().map(|(_, p)| *p))?;
                let n = entries.len() as f64;
                let center = GeoPoint::new(
                    entries.iter().map(|(_, p)| p.lat).sum::<f64>() / n,
                    entries.iter().map(|(_, p)| p.lng).sum::<f64>() / n,
                );
                Some(Cluster {
                    cell,
                    center,
                    bounds,
                    members: entries.into_iter().map(|(id, _)| id).collect(),
                })
            })
            .collect();
        clusters.extend(loose);
        clusters
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn positions() -> HashMap<LocationId, GeoPoint> {
        HashMap::from([
            // Two branches a few hundred meters apart in Rochester
            (LocationId(1), GeoPoint::new(43.1566, -77.6088)),
            (LocationId(2), GeoPoint::new(43.1580, -77.6100)),
            // Buffalo
            (LocationId(3), GeoPoint::new(42.8864, -78.8784)),
        ])
    }

    fn group(options: ClusterOptions) -> ClusterGroup {
        let mut group = ClusterGroup::new(options);
        for id in 1..=3 {
            group.add_layer(LocationId(id));
        }
        group
    }

    #[test]
    fn zero_threshold_means_always_cluster() {
        let settings = ClusteringSettings {
            enable: true,
            disable_clustering_at_zoom: 0,
            ..Default::default()
        };
        assert_eq!(ClusterOptions::from(&settings).disable_clustering_at_zoom, None);
    }

    #[test]
    fn low_zoom_merges_nearby_markers() {
        let clusters = group(ClusterOptions::default()).clusters(&positions(), 2);
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].members.len(), 3);
        assert_eq!(clusters[0].cell, "d");
    }

    #[test]
    fn city_zoom_separates_cities() {
        let clusters = group(ClusterOptions::default()).clusters(&positions(), 10);
        assert_eq!(clusters.len(), 2);
        let sizes: Vec<usize> = clusters.iter().map(|c| c.members.len()).collect();
        assert!(sizes.contains(&2) && sizes.contains(&1), "{sizes:?}");
    }

    #[test]
    fn threshold_disables_clustering() {
        let options = ClusterOptions {
            disable_clustering_at_zoom: Some(9),
            ..Default::default()
        };
        let g = group(options);
        assert_eq!(g.clusters(&positions(), 9).len(), 3);
        assert_eq!(g.clusters(&positions(), 2).len(), 1);
    }

    #[test]
    fn removed_layers_are_not_clustered() {
        let mut g = group(ClusterOptions::default());
        g.remove_layer(LocationId(3));
        assert!(!g.has_layer(LocationId(3)));
        let total: usize = g.clusters(&positions(), 2).iter().map(|c| c.members.len()).sum();
        assert_eq!(total, 2);

        g.clear_layers();
        assert!(g.is_empty());
        assert!(g.clusters(&positions(), 2).is_empty());
    }
}

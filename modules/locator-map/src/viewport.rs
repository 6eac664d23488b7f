use locator_common::config::ContainerSize;
use locator_common::{Bounds, GeoPoint};
use serde::Serialize;

const TILE_SIZE: f64 = 256.0;

/// Sine of the latitude where Web Mercator is cut off (about ±85.05°).
const MAX_SIN_LAT: f64 = 0.9999;

/// Inclusive zoom range allowed by a basemap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ZoomRange {
    pub min: u8,
    pub max: u8,
}

impl ZoomRange {
    pub fn clamp(self, zoom: u8) -> u8 {
        zoom.clamp(self.min, self.max)
    }
}

/// Pixels kept free around fitted bounds, as `[x, y]` pairs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FitPadding {
    pub top_left: [u32; 2],
    pub bottom_right: [u32; 2],
}

/// Headless camera state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Viewport {
    pub center: GeoPoint,
    pub zoom: u8,
    /// Bounds passed to the last fit, if the view came from one.
    pub framed: Option<Bounds>,
    pub size: ContainerSize,
}

impl Viewport {
    pub fn new(center: GeoPoint, zoom: u8, size: ContainerSize) -> Self {
        Self {
            center,
            zoom,
            framed: None,
            size,
        }
    }

    pub fn fit(&mut self, bounds: Bounds, padding: FitPadding, range: ZoomRange) {
        self.center = bounds.center();
        self.zoom = fit_zoom(&bounds, self.size, padding, range);
        self.framed = Some(bounds);
    }

    pub fn recenter(&mut self, center: GeoPoint) {
        self.center = center;
        self.framed = None;
    }
}

fn mercator_y(lat: f64) -> f64 {
    let sin = lat.to_radians().sin().clamp(-MAX_SIN_LAT, MAX_SIN_LAT);
    ((1.0 + sin) / (1.0 - sin)).ln() / 2.0
}

/// Largest zoom at which `bounds` fits inside the padded container.
pub fn fit_zoom(bounds: &Bounds, size: ContainerSize, padding: FitPadding, range: ZoomRange) -> u8 {
    let width = f64::from(
        size.width
            .saturating_sub(padding.top_left[0] + padding.bottom_right[0])
            .max(1),
    );
    let height = f64::from(
        size.height
            .saturating_sub(padding.top_left[1] + padding.bottom_right[1])
            .max(1),
    );

    let mut lng_fraction = (bounds.north_east.lng - bounds.south_west.lng) / 360.0;
    if lng_fraction < 0.0 {
        lng_fraction += 1.0;
    }
    let lat_fraction = (mercator_y(bounds.north_east.lat) - mercator_y(bounds.south_west.lat))
        / (2.0 * std::f64::consts::PI);

    let axis_zoom = |pixels: f64, fraction: f64| {
        if fraction > 0.0 {
            (pixels / TILE_SIZE / fraction).log2()
        } else {
            f64::INFINITY
        }
    };

    let zoom = axis_zoom(width, lng_fraction).min(axis_zoom(height, lat_fraction));
    if !zoom.is_finite() {
        return range.max;
    }
    let zoom = zoom.floor().clamp(f64::from(range.min), f64::from(range.max));
    range.clamp(zoom as u8)
}

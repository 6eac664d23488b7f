use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Half-width, in degrees, used to widen a bounding box that collapsed to a
/// single point.
pub const DEGENERATE_BOUNDS_MARGIN: f64 = 0.001;

// --- Geometry ---

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.5}, {:.5})", self.lat, self.lng)
    }
}

/// Minimal lat/lng rectangle enclosing a set of points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub south_west: GeoPoint,
    pub north_east: GeoPoint,
}

impl Bounds {
    pub fn from_point(point: GeoPoint) -> Self {
        Self {
            south_west: point,
            north_east: point,
        }
    }

    pub fn from_corners(a: GeoPoint, b: GeoPoint) -> Self {
        let mut bounds = Self::from_point(a);
        bounds.extend(b);
        bounds
    }

    /// Bounds over every point, or `None` for an empty iterator.
    pub fn from_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = GeoPoint>,
    {
        let mut iter = points.into_iter();
        let mut bounds = Self::from_point(iter.next()?);
        for point in iter {
            bounds.extend(point);
        }
        Some(bounds)
    }

    pub fn extend(&mut self, point: GeoPoint) {
        self.south_west.lat = self.south_west.lat.min(point.lat);
        self.south_west.lng = self.south_west.lng.min(point.lng);
        self.north_east.lat = self.north_east.lat.max(point.lat);
        self.north_east.lng = self.north_east.lng.max(point.lng);
    }

    /// True when both corners coincide.
    pub fn is_degenerate(&self) -> bool {
        self.south_west == self.north_east
    }

    /// Widen a single-point box by `margin` degrees on both axes so fitting it
    /// does not zoom all the way in. Non-degenerate boxes are returned as is.
    pub fn padded_if_degenerate(self, margin: f64) -> Self {
        if !self.is_degenerate() {
            return self;
        }
        let ne = self.north_east;
        let mut padded = self;
        padded.extend(GeoPoint::new(ne.lat + margin, ne.lng + margin));
        padded.extend(GeoPoint::new(ne.lat - margin, ne.lng - margin));
        padded
    }

    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            (self.south_west.lat + self.north_east.lat) / 2.0,
            (self.south_west.lng + self.north_east.lng) / 2.0,
        )
    }

    pub fn contains(&self, point: GeoPoint) -> bool {
        point.lat >= self.south_west.lat
            && point.lat <= self.north_east.lat
            && point.lng >= self.south_west.lng
            && point.lng <= self.north_east.lng
    }
}

// --- Identifiers ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LocationId(pub u64);

impl fmt::Display for LocationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Numeric amenity id.
///
/// Values coming from markup attributes and URL parameters are coerced the
/// way a browser coerces a string to a number: surrounding whitespace is
/// ignored, an empty string is `0`, `0x`/`0o`/`0b` prefixes select a radix,
/// `Infinity` is spelled exactly, anything else unparseable becomes `NaN`.
/// A `NaN` id compares unequal to everything, including itself, so it never
/// matches a location.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(transparent)]
pub struct AmenityId(f64);

impl AmenityId {
    pub fn new(id: u32) -> Self {
        Self(f64::from(id))
    }

    pub fn coerce(raw: &str) -> Self {
        Self(coerce_number(raw))
    }

    pub fn value(self) -> f64 {
        self.0
    }

    pub fn is_valid(self) -> bool {
        self.0.is_finite()
    }
}

impl PartialEq for AmenityId {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}

fn coerce_number(raw: &str) -> f64 {
    let s = raw.trim();
    if s.is_empty() {
        return 0.0;
    }

    let radix = match s.get(..2) {
        Some("0x" | "0X") => Some(16),
        Some("0o" | "0O") => Some(8),
        Some("0b" | "0B") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        let digits = &s[2..];
        if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
            return f64::NAN;
        }
        return digits
            .chars()
            .filter_map(|c| c.to_digit(radix))
            .fold(0.0, |acc, d| acc * f64::from(radix) + f64::from(d));
    }

    let unsigned = s.strip_prefix(&['+', '-'][..]).unwrap_or(s);
    if unsigned == "Infinity" {
        return if s.starts_with('-') {
            f64::NEG_INFINITY
        } else {
            f64::INFINITY
        };
    }
    // Rules out the `inf`/`nan` spellings the float parser accepts.
    if !unsigned
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'))
    {
        return f64::NAN;
    }
    s.parse().unwrap_or(f64::NAN)
}

impl From<u32> for AmenityId {
    fn from(id: u32) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for AmenityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_nan() {
            f.write_str("NaN")
        } else if self.0.is_infinite() {
            f.write_str(if self.0 > 0.0 { "Infinity" } else { "-Infinity" })
        } else if self.0.fract() == 0.0 && self.0.abs() < 1e15 {
            write!(f, "{}", self.0 as i64)
        } else {
            write!(f, "{}", self.0)
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

impl<'de> Deserialize<'de> for AmenityId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match NumberOrText::deserialize(deserializer)? {
            NumberOrText::Number(n) => Self(n),
            NumberOrText::Text(s) => Self::coerce(&s),
        })
    }
}

/// Push `id` unless an equal id is already present. Keeps first-seen order.
pub fn push_unique(ids: &mut Vec<AmenityId>, id: AmenityId) {
    if !ids.contains(&id) {
        ids.push(id);
    }
}

// --- Inbound records ---

/// A coordinate as delivered by the server: a JSON number or a numeric string.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Coordinate {
    Number(f64),
    Text(String),
}

impl Coordinate {
    pub fn value(&self) -> Option<f64> {
        let v = match self {
            Self::Number(n) => *n,
            Self::Text(s) => s.trim().parse().ok()?,
        };
        v.is_finite().then_some(v)
    }
}

/// One location as serialized by the server-side page layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocationRecord {
    pub location_id: LocationId,
    pub lat: Coordinate,
    pub lng: Coordinate,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub markup: String,
    #[serde(default)]
    pub icon: Option<String>,
    #[serde(default)]
    pub icon_size: Option<[u32; 2]>,
    #[serde(default)]
    pub icon_anchor: Option<[i32; 2]>,
    #[serde(default)]
    pub popup_anchor: Option<[i32; 2]>,
}

/// Marker icon geometry overrides carried by a record.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct IconGeometry {
    pub size: Option<[u32; 2]>,
    pub anchor: Option<[i32; 2]>,
    pub popup_anchor: Option<[i32; 2]>,
}

/// A geo-tagged location, fixed for the lifetime of a page session.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Location {
    pub id: LocationId,
    pub point: GeoPoint,
    pub tags: Vec<String>,
    pub amenities: Vec<AmenityId>,
    pub name: String,
    pub markup: String,
    pub icon: Option<String>,
    pub icon_geometry: IconGeometry,
    /// Whether the companion list renders an element for this location.
    pub listed: bool,
}

impl Location {
    /// Build a location from its server record. `amenities` is the list
    /// attached to the location's list element, if it has one.
    ///
    /// Returns `None` when the coordinates cannot be parsed.
    pub fn from_record(record: LocationRecord, amenities: Option<&[AmenityId]>) -> Option<Self> {
        let lat = record.lat.value()?;
        let lng = record.lng.value()?;

        let mut ids = Vec::new();
        for id in amenities.unwrap_or_default() {
            push_unique(&mut ids, *id);
        }

        Some(Self {
            id: record.location_id,
            point: GeoPoint::new(lat, lng),
            tags: record.tags,
            amenities: ids,
            name: record.name,
            markup: record.markup,
            icon: record.icon,
            icon_geometry: IconGeometry {
                size: record.icon_size,
                anchor: record.icon_anchor,
                popup_anchor: record.popup_anchor,
            },
            listed: amenities.is_some(),
        })
    }

    /// First tag; used to group the location in the companion list.
    pub fn primary_tag(&self) -> Option<&str> {
        self.tags.first().map(String::as_str)
    }

    pub fn has_any_tag(&self, tags: &[String]) -> bool {
        self.tags.iter().any(|t| tags.contains(t))
    }

    pub fn has_any_amenity(&self, amenities: &[AmenityId]) -> bool {
        self.amenities.iter().any(|a| amenities.contains(a))
    }
}

//! Geographic point, path, and bounding-box types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Minimum valid latitude in degrees.
pub const MIN_LAT: f64 = -90.0;
/// Maximum valid latitude in degrees.
pub const MAX_LAT: f64 = 90.0;
/// Minimum valid longitude in degrees.
pub const MIN_LON: f64 = -180.0;
/// Maximum valid longitude in degrees.
pub const MAX_LON: f64 = 180.0;

/// A latitude/longitude pair in decimal degrees.
///
/// Serialized as a two-element `[lat, lon]` array, which is how paths are
/// stored alongside routes and overlays.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "[f64; 2]", into = "[f64; 2]")]
pub struct Point {
    /// Latitude in degrees, within [-90, 90]
    pub lat: f64,
    /// Longitude in degrees, within [-180, 180]
    pub lon: f64,
}

impl Point {
    /// Creates a point, returning `None` when either coordinate is out of range
    /// or not finite.
    ///
    /// # Examples
    ///
    /// ```
    /// use trailwatch::models::Point;
    ///
    /// assert!(Point::new(43.285, 42.518).is_some());
    /// assert!(Point::new(91.0, 0.0).is_none());
    /// ```
    #[must_use]
    pub fn new(lat: f64, lon: f64) -> Option<Self> {
        if Self::is_valid(lat, lon) {
            Some(Self { lat, lon })
        } else {
            None
        }
    }

    /// Creates a point without range checks.
    ///
    /// Used for values that are already known to be in range, such as points
    /// coming back from the map surface.
    #[must_use]
    pub const fn new_unchecked(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// Returns true if the pair is a finite, in-range coordinate.
    #[must_use]
    pub fn is_valid(lat: f64, lon: f64) -> bool {
        lat.is_finite()
            && lon.is_finite()
            && (MIN_LAT..=MAX_LAT).contains(&lat)
            && (MIN_LON..=MAX_LON).contains(&lon)
    }
}

impl TryFrom<[f64; 2]> for Point {
    type Error = OutOfRange;

    fn try_from([lat, lon]: [f64; 2]) -> Result<Self, Self::Error> {
        Self::new(lat, lon).ok_or(OutOfRange { lat, lon })
    }
}

/// A latitude/longitude pair outside the valid range.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct OutOfRange {
    /// Rejected latitude
    pub lat: f64,
    /// Rejected longitude
    pub lon: f64,
}

impl fmt::Display for OutOfRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "coordinate out of range: [{}, {}]", self.lat, self.lon)
    }
}

impl std::error::Error for OutOfRange {}

impl From<Point> for [f64; 2] {
    fn from(point: Point) -> Self {
        [point.lat, point.lon]
    }
}

/// Ordered sequence of points. Order is the direction of travel.
pub type Path = Vec<Point>;

/// Axis-aligned latitude/longitude bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// South-west corner
    pub south_west: Point,
    /// North-east corner
    pub north_east: Point,
}

impl Bounds {
    /// Computes the bounds of a set of points. Returns `None` for an empty set.
    #[must_use]
    pub fn from_points(points: &[Point]) -> Option<Self> {
        let first = points.first()?;
        let mut bounds = Self {
            south_west: *first,
            north_east: *first,
        };
        for p in &points[1..] {
            bounds.south_west.lat = bounds.south_west.lat.min(p.lat);
            bounds.south_west.lon = bounds.south_west.lon.min(p.lon);
            bounds.north_east.lat = bounds.north_east.lat.max(p.lat);
            bounds.north_east.lon = bounds.north_east.lon.max(p.lon);
        }
        Some(bounds)
    }

    /// Returns true if the box spans a non-zero extent on both axes.
    #[must_use]
    pub fn has_area(&self) -> bool {
        self.north_east.lat > self.south_west.lat && self.north_east.lon > self.south_west.lon
    }

    /// Geometric center of the box.
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new_unchecked(
            (self.south_west.lat + self.north_east.lat) / 2.0,
            (self.south_west.lon + self.north_east.lon) / 2.0,
        )
    }
}

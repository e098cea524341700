//! Route distance, time and altitude estimates.
//!
//! Distance is the sum of great-circle (haversine) legs. Altitude gain is a
//! placeholder model until an elevation source exists: it grows with distance
//! and point count plus a random term drawn from an injected [`AltitudeModel`].
//! Walking time follows a Naismith's-rule variant: flat pace plus one hour per
//! fixed amount of ascent.

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::config::StatsConfig;
use crate::constants::EARTH_RADIUS_KM;
use crate::models::Point;

/// Source of the random term in the altitude estimate.
pub trait AltitudeModel {
    /// Returns a value in `[0, 1)`.
    fn random_unit(&mut self) -> f64;
}

/// Random altitude term backed by a seedable RNG.
#[derive(Debug, Clone)]
pub struct SeededAltitude {
    rng: SmallRng,
}

impl SeededAltitude {
    /// Creates a model.
    ///
    /// If seed is 0, uses random entropy for non-deterministic behavior.
    /// Otherwise, uses the provided seed for reproducible results.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        let rng = if seed == 0 {
            SmallRng::from_entropy()
        } else {
            SmallRng::seed_from_u64(seed)
        };
        Self { rng }
    }
}

impl AltitudeModel for SeededAltitude {
    fn random_unit(&mut self) -> f64 {
        self.rng.gen::<f64>()
    }
}

/// Deterministic altitude term, always the same value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedAltitude {
    value: f64,
}

impl FixedAltitude {
    /// Creates a model returning `value`, clamped into `[0, 1)`.
    #[must_use]
    pub fn new(value: f64) -> Self {
        Self {
            value: value.clamp(0.0, 1.0 - f64::EPSILON),
        }
    }
}

impl AltitudeModel for FixedAltitude {
    fn random_unit(&mut self) -> f64 {
        self.value
    }
}

/// Computed statistics for a path.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteStats {
    /// Total great-circle distance in kilometres
    pub distance_km: f64,
    /// Estimated altitude gain in metres
    pub altitude_m: u64,
    /// Estimated walking time in hours
    pub total_hours: f64,
    /// Bucketed time label (e.g., "~45 min", "2-3 h", "3-4 d")
    pub time_label: String,
}

impl RouteStats {
    /// Distance label with one decimal, e.g. `"12.4 km"`.
    #[must_use]
    pub fn distance_label(&self) -> String {
        format!("{:.1} km", self.distance_km)
    }

    /// Altitude label, e.g. `"840 m"`.
    #[must_use]
    pub fn altitude_label(&self) -> String {
        format!("{} m", self.altitude_m)
    }
}

/// Great-circle distance between two points in kilometres.
///
/// # Examples
///
/// ```
/// use trailwatch::models::Point;
/// use trailwatch::services::route_stats::haversine_km;
///
/// let a = Point::new(0.0, 0.0).unwrap();
/// let b = Point::new(0.0, 1.0).unwrap();
/// assert!((haversine_km(a, b) - 111.19).abs() < 0.5);
/// ```
#[must_use]
pub fn haversine_km(a: Point, b: Point) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let sin_dlat = (dlat / 2.0).sin();
    let sin_dlon = (dlon / 2.0).sin();

    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlon * sin_dlon;
    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Sum of consecutive leg distances. Zero for fewer than two points.
#[must_use]
pub fn path_distance_km(path: &[Point]) -> f64 {
    path.windows(2).map(|leg| haversine_km(leg[0], leg[1])).sum()
}

/// Mock altitude gain: `floor(distance*50 + points*10 + random*span)`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
pub fn estimate_altitude_m(
    distance_km: f64,
    point_count: usize,
    config: &StatsConfig,
    model: &mut dyn AltitudeModel,
) -> u64 {
    let raw = distance_km * 50.0
        + point_count as f64 * 10.0
        + model.random_unit() * config.altitude_random_span_m;
    raw.floor().max(0.0) as u64
}

/// Walking time in hours: flat pace plus ascent penalty.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn estimate_hours(distance_km: f64, altitude_m: u64, config: &StatsConfig) -> f64 {
    let base_hours = distance_km / config.flat_pace_kmh;
    let ascent_hours = altitude_m as f64 / config.ascent_m_per_hour;
    base_hours + ascent_hours
}

/// Buckets a duration into a display label.
///
/// Rules, in order:
/// - over 24 hours: day range using `walking_hours_per_day`, `"{d}-{d+1} d"`
/// - at least an hour and more than 15 extra minutes: `"{h}-{h+1} h"`
/// - at least an hour: `"~{h} h"`
/// - otherwise: `"~{m} min"`
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn format_time_label(total_hours: f64, walking_hours_per_day: f64) -> String {
    let total_hours = total_hours.max(0.0);

    if total_hours > 24.0 {
        let days = (total_hours / walking_hours_per_day).floor() as u64;
        return format!("{}-{} d", days, days + 1);
    }

    let hours = total_hours.floor();
    let minutes = ((total_hours - hours) * 60.0).floor() as u64;
    let hours = hours as u64;

    if hours > 0 && minutes > 15 {
        format!("{}-{} h", hours, hours + 1)
    } else if hours > 0 {
        format!("~{} h", hours)
    } else {
        format!("~{} min", minutes)
    }
}

/// Computes stats with the default model parameters.
pub fn compute_stats(path: &[Point], altitude: &mut dyn AltitudeModel) -> RouteStats {
    compute_stats_with(path, &StatsConfig::default(), altitude)
}

/// Computes distance, altitude gain and walking time for a path.
pub fn compute_stats_with(
    path: &[Point],
    config: &StatsConfig,
    altitude: &mut dyn AltitudeModel,
) -> RouteStats {
    let distance_km = path_distance_km(path);
    let altitude_m = estimate_altitude_m(distance_km, path.len(), config, altitude);
    let total_hours = estimate_hours(distance_km, altitude_m, config);

    RouteStats {
        distance_km,
        altitude_m,
        total_hours,
        time_label: format_time_label(total_hours, config.walking_hours_per_day),
    }
}

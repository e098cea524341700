//! Simulated hiker telemetry.
//!
//! Stands in for real tracker devices: on every tick each hiker drifts a
//! little, their battery drains, and the "last update" label is refreshed.

use chrono::{DateTime, Duration, Utc};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use tracing::trace;

use crate::config::TelemetryConfig;
use crate::models::{Hiker, Point};
use crate::parser::coordinates::{format_coords_label, CoordinateParser};

/// Decimal places kept when re-encoding simulated coordinates.
const COORD_PRECISION: usize = 6;

/// Produces simulated position and battery updates.
#[derive(Debug, Clone)]
pub struct TelemetrySimulator {
    rng: SmallRng,
    config: TelemetryConfig,
    parser: CoordinateParser,
}

impl TelemetrySimulator {
    /// Creates a simulator.
    ///
    /// If `config.seed` is 0, uses random entropy for non-deterministic behavior.
    /// Otherwise, uses the provided seed for reproducible results.
    #[must_use]
    pub fn new(config: TelemetryConfig, parser: CoordinateParser) -> Self {
        let rng = if config.seed == 0 {
            SmallRng::from_entropy()
        } else {
            SmallRng::seed_from_u64(config.seed)
        };
        Self {
            rng,
            config,
            parser,
        }
    }

    /// Settings in use.
    #[must_use]
    pub const fn config(&self) -> &TelemetryConfig {
        &self.config
    }

    /// Advances every hiker by one simulated update at time `now`.
    ///
    /// Hikers whose coordinates do not parse keep their coordinate text; only
    /// their battery and timestamp change.
    pub fn tick(&mut self, hikers: &mut [Hiker], now: DateTime<Utc>) {
        for hiker in hikers.iter_mut() {
            if let Some(position) = self.parser.parse_pair(&hiker.coords) {
                let moved = self.jitter(position);
                hiker.coords = format_coords_label(moved, COORD_PRECISION);
            } else {
                trace!(hiker = %hiker.id, coords = %hiker.coords, "Coordinates unreadable, position not simulated");
            }

            hiker.battery = drain(hiker.battery, self.config.battery_drain_per_tick);
            hiker.last_update_at = Some(now);
            hiker.last_update = format_time_ago(Duration::zero());
        }
    }

    fn jitter(&mut self, point: Point) -> Point {
        let amount = self.config.coord_jitter_deg;
        let dlat = (self.rng.gen::<f64>() - 0.5) * amount;
        let dlon = (self.rng.gen::<f64>() - 0.5) * amount;
        // Stay on the globe near the poles and the antimeridian
        Point::new(point.lat + dlat, point.lon + dlon).unwrap_or(point)
    }
}

/// Drains a battery level, clamped at zero and rounded to two decimals.
fn drain(battery: f64, amount: f64) -> f64 {
    let level = (battery - amount).max(0.0);
    (level * 100.0).round() / 100.0
}

/// Human-readable age of an update.
///
/// # Examples
///
/// ```
/// use chrono::Duration;
/// use trailwatch::services::telemetry::format_time_ago;
///
/// assert_eq!(format_time_ago(Duration::seconds(2)), "just now");
/// assert_eq!(format_time_ago(Duration::seconds(42)), "42 seconds ago");
/// assert_eq!(format_time_ago(Duration::minutes(3)), "3 minutes ago");
/// ```
#[must_use]
pub fn format_time_ago(elapsed: Duration) -> String {
    let seconds = elapsed.num_seconds().max(0);
    if seconds < 5 {
        return "just now".to_string();
    }
    if seconds < 60 {
        return format!("{seconds} seconds ago");
    }
    let minutes = seconds / 60;
    if minutes < 60 {
        return format!("{minutes} minutes ago");
    }
    format!("{} hours ago", minutes / 60)
}

/// Recomputes "last update" labels relative to `now`.
pub fn refresh_labels(hikers: &mut [Hiker], now: DateTime<Utc>) {
    for hiker in hikers {
        if let Some(at) = hiker.last_update_at {
            hiker.last_update = format_time_ago(now - at);
        }
    }
}

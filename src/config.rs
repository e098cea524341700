//! User configuration, stored as `config.toml`.
//!
//! Every section has defaults, so a missing file or a partial file is fine.
//! Values are range-checked on load and before saving.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{APP_DIR_NAME, CONFIG_DIR_ENV, CONFIG_FILE_NAME};
use crate::models::Point;

/// A unit or hemisphere marker that may trail a coordinate value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnitSuffix {
    /// Literal text to strip (e.g., "°", "° с.ш.", "N")
    pub token: String,
    /// Whether the marker denotes the southern or western hemisphere
    #[serde(default)]
    pub negate: bool,
}

impl UnitSuffix {
    fn positive(token: &str) -> Self {
        Self {
            token: token.to_string(),
            negate: false,
        }
    }

    fn negative(token: &str) -> Self {
        Self {
            token: token.to_string(),
            negate: true,
        }
    }
}

/// Coordinate parser settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParserConfig {
    /// Suffix tokens stripped from coordinate text before parsing
    pub unit_suffixes: Vec<UnitSuffix>,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            unit_suffixes: vec![
                // Russian hemisphere markers, as used in stored hiker positions
                UnitSuffix::positive("° с.ш."),
                UnitSuffix::positive("° в.д."),
                UnitSuffix::negative("° ю.ш."),
                UnitSuffix::negative("° з.д."),
                UnitSuffix::positive("с.ш."),
                UnitSuffix::positive("в.д."),
                UnitSuffix::negative("ю.ш."),
                UnitSuffix::negative("з.д."),
                // English hemisphere markers
                UnitSuffix::positive("°N"),
                UnitSuffix::positive("°E"),
                UnitSuffix::negative("°S"),
                UnitSuffix::negative("°W"),
                UnitSuffix::positive("N"),
                UnitSuffix::positive("E"),
                UnitSuffix::negative("S"),
                UnitSuffix::negative("W"),
                UnitSuffix::positive("°"),
            ],
        }
    }
}

/// Route statistics model parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsConfig {
    /// Flat walking pace in km/h
    pub flat_pace_kmh: f64,
    /// Metres of ascent that add one hour of walking
    pub ascent_m_per_hour: f64,
    /// Walking hours per day for multi-day estimates
    pub walking_hours_per_day: f64,
    /// Upper bound of the random term in the altitude estimate, in metres
    pub altitude_random_span_m: f64,
    /// Seed for the altitude estimate (0 = seed from entropy)
    #[serde(default)]
    pub altitude_seed: u64,
}

impl Default for StatsConfig {
    fn default() -> Self {
        Self {
            flat_pace_kmh: 4.0,
            ascent_m_per_hour: 400.0,
            walking_hours_per_day: 8.0,
            altitude_random_span_m: 200.0,
            altitude_seed: 0,
        }
    }
}

/// Map view defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapConfig {
    /// Initial view center as `[lat, lon]`
    pub default_center: Point,
    /// Initial zoom level
    pub default_zoom: u8,
    /// Zoom used when focusing a single point
    pub focus_zoom: u8,
    /// Padding in pixels when fitting the viewport to an overlay
    pub fit_padding_px: u32,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            // Centered on the Caucasus
            default_center: Point::new_unchecked(43.5, 42.0),
            default_zoom: 8,
            focus_zoom: 13,
            fit_padding_px: 50,
        }
    }
}

/// Telemetry simulation settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetryConfig {
    /// Seconds between simulated updates
    pub interval_secs: u64,
    /// Maximum coordinate change per tick, in degrees (applied as ±half)
    pub coord_jitter_deg: f64,
    /// Battery percentage points drained per tick
    pub battery_drain_per_tick: f64,
    /// Seed for the simulation (0 = seed from entropy)
    #[serde(default)]
    pub seed: u64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            interval_secs: 5,
            coord_jitter_deg: 0.0001,
            battery_drain_per_tick: 0.05,
            seed: 0,
        }
    }
}

/// Local storage settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StorageConfig {
    /// Directory for stored routes and groups (default: `<config dir>/data`)
    pub data_dir: Option<PathBuf>,
}

impl StorageConfig {
    /// Resolves the data directory, falling back to the config directory.
    pub fn resolve_data_dir(&self) -> Result<PathBuf> {
        match &self.data_dir {
            Some(dir) => Ok(dir.clone()),
            None => Ok(Config::config_dir()?.join("data")),
        }
    }
}

/// Application configuration.
///
/// # File Location
///
/// - Linux: `~/.config/Trailwatch/config.toml`
/// - macOS: `~/Library/Application Support/Trailwatch/config.toml`
/// - Windows: `%APPDATA%\Trailwatch\config.toml`
///
/// The directory can be overridden with the `TRAILWATCH_CONFIG_DIR`
/// environment variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Config {
    /// Coordinate parser settings
    #[serde(default)]
    pub parser: ParserConfig,
    /// Route statistics model
    #[serde(default)]
    pub stats: StatsConfig,
    /// Map view defaults
    #[serde(default)]
    pub map: MapConfig,
    /// Telemetry simulation
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    /// Local storage
    #[serde(default)]
    pub storage: StorageConfig,
}

impl Config {
    /// Default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if a config file is present.
    #[must_use]
    pub fn exists() -> bool {
        Self::config_file_path().is_ok_and(|path| path.exists())
    }

    /// Directory holding `config.toml` (and, by default, the data directory).
    ///
    /// `TRAILWATCH_CONFIG_DIR` takes precedence over the platform location.
    pub fn config_dir() -> Result<PathBuf> {
        match std::env::var_os(CONFIG_DIR_ENV) {
            Some(dir) => Ok(PathBuf::from(dir)),
            None => Ok(dirs::config_dir()
                .context("Failed to determine config directory")?
                .join(APP_DIR_NAME)),
        }
    }

    /// Path of `config.toml`.
    pub fn config_file_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join(CONFIG_FILE_NAME))
    }

    /// Loads the user's configuration, or defaults when no file exists.
    pub fn load() -> Result<Self> {
        let path = Self::config_file_path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            Ok(Self::new())
        }
    }

    /// Loads and validates configuration from an explicit path.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates and writes the configuration to `config.toml`.
    pub fn save(&self) -> Result<()> {
        self.validate()?;
        let content = toml::to_string_pretty(self).context("Failed to serialize configuration")?;
        write_atomic(&Self::config_file_path()?, &content)
    }

    /// Validates configuration values.
    ///
    /// Checks:
    /// - suffix tokens are non-empty
    /// - pace, ascent rate and hours per day are positive
    /// - map center is a valid coordinate and zoom levels are within 0-22
    /// - telemetry interval is non-zero and drain is non-negative
    pub fn validate(&self) -> Result<()> {
        if let Some(empty) = self
            .parser
            .unit_suffixes
            .iter()
            .position(|s| s.token.trim().is_empty())
        {
            anyhow::bail!("Unit suffix #{} has an empty token", empty + 1);
        }

        let stats = &self.stats;
        for (name, value) in [
            ("flat_pace_kmh", stats.flat_pace_kmh),
            ("ascent_m_per_hour", stats.ascent_m_per_hour),
            ("walking_hours_per_day", stats.walking_hours_per_day),
        ] {
            if !(value.is_finite() && value > 0.0) {
                anyhow::bail!("stats.{} must be a positive number (got {})", name, value);
            }
        }
        if !(stats.altitude_random_span_m.is_finite() && stats.altitude_random_span_m >= 0.0) {
            anyhow::bail!(
                "stats.altitude_random_span_m must not be negative (got {})",
                stats.altitude_random_span_m
            );
        }

        let center = self.map.default_center;
        if !Point::is_valid(center.lat, center.lon) {
            anyhow::bail!(
                "map.default_center is out of range: [{}, {}]",
                center.lat,
                center.lon
            );
        }
        if self.map.default_zoom > 22 || self.map.focus_zoom > 22 {
            anyhow::bail!("Zoom levels must be between 0 and 22");
        }

        if self.telemetry.interval_secs == 0 {
            anyhow::bail!("telemetry.interval_secs must be at least 1");
        }
        if !(self.telemetry.battery_drain_per_tick.is_finite()
            && self.telemetry.battery_drain_per_tick >= 0.0)
        {
            anyhow::bail!("telemetry.battery_drain_per_tick must not be negative");
        }

        Ok(())
    }
}

/// Writes `content` to `path` through a sibling temp file and a rename, so
/// readers never see a half-written file. Creates the parent directory.
pub(crate) fn write_atomic(path: &Path, content: &str) -> Result<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
    }

    let mut temp_name = path.as_os_str().to_owned();
    temp_name.push(".tmp");
    let temp_path = PathBuf::from(temp_name);

    fs::write(&temp_path, content)
        .with_context(|| format!("Failed to write {}", temp_path.display()))?;
    fs::rename(&temp_path, path)
        .with_context(|| format!("Failed to rename temp file to: {}", path.display()))
}

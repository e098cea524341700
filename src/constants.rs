//! Application-wide constants.
//!
//! This module defines constants used throughout the application,
//! including the application name and storage keys.

/// The display name of the application (human-readable, with proper capitalization).
pub const APP_NAME: &str = "Trailwatch";

/// The binary name of the application (used in command examples).
pub const APP_BINARY_NAME: &str = "trailwatch";

/// Directory name under the platform config directory.
pub const APP_DIR_NAME: &str = "Trailwatch";

/// Environment variable overriding the config directory.
pub const CONFIG_DIR_ENV: &str = "TRAILWATCH_CONFIG_DIR";

/// Config file name inside the config directory.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Store key for the saved route list.
pub const ROUTES_STORAGE_KEY: &str = "tracker-routes";

/// Store key for the saved group list.
pub const GROUPS_STORAGE_KEY: &str = "tracker-groups";

/// Mean Earth radius in kilometres, used for great-circle distances.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

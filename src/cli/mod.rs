//! CLI command handlers for Trailwatch.
//!
//! This module provides headless, scriptable access to the coordinate parser,
//! route statistics, the route store and the telemetry simulation.

pub mod common;
pub mod config;
pub mod parse;
pub mod routes;
#[cfg(feature = "simulate")]
pub mod simulate;
pub mod stats;

// Re-export types used by main.rs and tests
pub use common::{CliError, CliResult, ExitCode};
pub use config::ConfigArgs;
pub use parse::ParseArgs;
pub use routes::RoutesArgs;
#[cfg(feature = "simulate")]
pub use simulate::SimulateArgs;
pub use stats::StatsArgs;

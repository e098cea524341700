//! Service layer for business logic.
//!
//! Route statistics, the drawing interaction, telemetry simulation,
//! persistence and the search-assist flow.

pub mod drawing;
pub mod route_stats;
pub mod search_assist;
pub mod seed;
pub mod storage;
pub mod telemetry;

// Re-export commonly used types and functions
pub use drawing::{DrawingError, DrawingSession, DrawingState};
pub use route_stats::{compute_stats, compute_stats_with, AltitudeModel, FixedAltitude, RouteStats, SeededAltitude};
pub use storage::{GroupRepository, JsonFileStore, MemoryStore, RouteRepository, Store};
pub use telemetry::TelemetrySimulator;

//! Trailwatch Library
//!
//! Core of a hiking-group safety tracker: coordinate parsing, route
//! statistics, the route-drawing interaction, and incremental reconciliation
//! of map layers (routes, hiker markers, search areas, drawn points) against
//! a changing data model.

// Module declarations
pub mod cli;
pub mod config;
pub mod constants;
pub mod map;
pub mod models;
pub mod parser;
pub mod services;

// Re-export commonly used types
pub use config::Config;
pub use map::{LayerReconciler, MapView, RenderSurface};
pub use models::{Group, Hiker, MapOverlay, Path, Point, Route};
pub use parser::{parse_pair, parse_path, CoordinateParser};
pub use services::{compute_stats, DrawingSession};

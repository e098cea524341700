//! Data models for routes, hikers, groups, and map overlays.
//!
//! This module contains the core data structures shared by the parser, the
//! route services, and the map engine. Models are independent of any
//! rendering surface.

pub mod hiker;
pub mod overlay;
pub mod point;
pub mod route;

// Re-export all model types
pub use hiker::{Group, Hiker, HikerStatus};
pub use overlay::{MapOverlay, OverlayKind};
pub use point::{Bounds, Path, Point};
pub use route::{Difficulty, NewRoute, Route, MIN_ROUTE_POINTS};

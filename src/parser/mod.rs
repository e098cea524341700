//! Parsing and formatting of coordinate text.
//!
//! This module turns free-text coordinates (route form input, stored hiker
//! positions) into validated points, and formats points back into the text
//! encodings the rest of the application stores.

pub mod coordinates;

// Re-export commonly used functions
pub use coordinates::{format_coords_label, format_path, parse_pair, parse_path, CoordinateParser};

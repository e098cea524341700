//! Draw-a-route-by-clicking session.
//!
//! A session accumulates the points a user places on the map. It is either
//! `Empty` or `Drawing`; committing hands the path over for route creation
//! and empties the session.

use std::fmt;

use crate::models::{Path, Point, MIN_ROUTE_POINTS};
use crate::parser::coordinates::format_path;

/// Session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawingState {
    /// No points placed
    Empty,
    /// At least one point placed
    Drawing,
}

/// Recoverable drawing errors surfaced to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DrawingError {
    /// Tried to commit before enough points were placed
    InsufficientPoints {
        /// Points needed for a route
        required: usize,
        /// Points currently placed
        actual: usize,
    },
}

impl fmt::Display for DrawingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InsufficientPoints { required, actual } => write!(
                f,
                "Not enough points: draw a route with at least {required} points (have {actual})"
            ),
        }
    }
}

impl std::error::Error for DrawingError {}

/// Accumulates user-placed points for a new route.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DrawingSession {
    points: Path,
}

impl DrawingSession {
    /// Creates an empty session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    #[must_use]
    pub fn state(&self) -> DrawingState {
        if self.points.is_empty() {
            DrawingState::Empty
        } else {
            DrawingState::Drawing
        }
    }

    /// Points placed so far, in order.
    #[must_use]
    pub fn points(&self) -> &[Point] {
        &self.points
    }

    /// Number of points placed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Returns true if no points are placed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Returns true if [`commit`](Self::commit) would succeed.
    #[must_use]
    pub fn can_commit(&self) -> bool {
        self.points.len() >= MIN_ROUTE_POINTS
    }

    /// Appends a point.
    pub fn add_point(&mut self, point: Point) {
        self.points.push(point);
    }

    /// Removes the last point. No-op when empty.
    pub fn undo(&mut self) -> Option<Point> {
        self.points.pop()
    }

    /// Discards all points.
    pub fn reset(&mut self) {
        self.points.clear();
    }

    /// Hands over the drawn path and empties the session.
    ///
    /// # Errors
    ///
    /// Returns [`DrawingError::InsufficientPoints`] with fewer than two points;
    /// the session is left untouched.
    pub fn commit(&mut self) -> Result<Path, DrawingError> {
        if !self.can_commit() {
            return Err(DrawingError::InsufficientPoints {
                required: MIN_ROUTE_POINTS,
                actual: self.points.len(),
            });
        }
        Ok(std::mem::take(&mut self.points))
    }

    /// Points encoded one pair per line, for prefilling the route form.
    #[must_use]
    pub fn handoff_text(&self) -> String {
        format_path(&self.points)
    }
}

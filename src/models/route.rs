//! Hiking route data structures.

use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::config::StatsConfig;
use crate::models::{Path, Point};
use crate::parser::coordinates::{format_coords_label, CoordinateParser};
use crate::services::route_stats::{compute_stats_with, AltitudeModel};

/// Minimum number of points a route path needs before it can be saved.
pub const MIN_ROUTE_POINTS: usize = 2;

/// Route difficulty grade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Difficulty {
    /// Suitable for beginners
    #[default]
    Easy,
    /// Some experience needed
    Medium,
    /// Demanding terrain or length
    Hard,
    /// Expert routes
    VeryHard,
}

impl Difficulty {
    /// All grades, easiest first.
    pub const ALL: [Self; 4] = [Self::Easy, Self::Medium, Self::Hard, Self::VeryHard];

    /// Human-readable grade name.
    #[must_use]
    pub const fn display_name(self) -> &'static str {
        match self {
            Self::Easy => "Easy",
            Self::Medium => "Medium",
            Self::Hard => "Hard",
            Self::VeryHard => "Very hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

impl FromStr for Difficulty {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let normalized: String = s
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .collect::<String>()
            .to_ascii_lowercase();
        match normalized.as_str() {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            "veryhard" => Ok(Self::VeryHard),
            _ => anyhow::bail!(
                "Unknown difficulty '{}'. Expected one of: easy, medium, hard, very-hard",
                s
            ),
        }
    }
}

/// User-editable route fields, before an id and stats are assigned.
///
/// This is what the route form (or a committed drawing session) produces.
#[derive(Debug, Clone, PartialEq)]
pub struct NewRoute {
    /// Route name
    pub name: String,
    /// Location label (e.g., "Elbrus region")
    pub location: String,
    /// Difficulty grade
    pub difficulty: Difficulty,
    /// Free-form route type (e.g., "Trekking", "Ascent")
    pub route_type: String,
    /// Ordered route path, at least two points
    pub path: Path,
}

impl NewRoute {
    /// Builds route fields from form input, parsing one coordinate pair per line.
    ///
    /// Lines that do not parse are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is empty or fewer than two valid points remain.
    pub fn from_form(
        name: impl Into<String>,
        location: impl Into<String>,
        difficulty: Difficulty,
        route_type: impl Into<String>,
        coords_text: &str,
        parser: &CoordinateParser,
    ) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            anyhow::bail!("Route name cannot be empty");
        }

        let path = parser.parse_path(coords_text);
        if path.len() < MIN_ROUTE_POINTS {
            anyhow::bail!(
                "Route needs at least {} valid points, found {}",
                MIN_ROUTE_POINTS,
                path.len()
            );
        }

        Ok(Self {
            name,
            location: location.into(),
            difficulty,
            route_type: route_type.into(),
            path,
        })
    }
}

/// A saved hiking route with derived statistics.
///
/// # Invariants
///
/// The derived fields (`distance`, `time`, `altitude`, `start_coordinates`) are
/// always computed together from `path`. The path is only reachable for writing
/// through [`Route::apply`], which recomputes all of them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    /// Unique, stable identifier
    pub id: String,
    /// Route name
    pub name: String,
    /// Location label
    pub location: String,
    /// Difficulty grade
    pub difficulty: Difficulty,
    /// Free-form route type
    #[serde(rename = "type", default)]
    pub route_type: String,
    path: Path,
    distance: String,
    time: String,
    altitude: String,
    #[serde(rename = "coordinates")]
    start_coordinates: String,
}

impl Route {
    /// Materializes a route from user fields, computing all derived stats.
    pub fn new(
        id: impl Into<String>,
        fields: NewRoute,
        stats_config: &StatsConfig,
        altitude: &mut dyn AltitudeModel,
    ) -> Self {
        let mut route = Self {
            id: id.into(),
            name: String::new(),
            location: String::new(),
            difficulty: Difficulty::default(),
            route_type: String::new(),
            path: Vec::new(),
            distance: String::new(),
            time: String::new(),
            altitude: String::new(),
            start_coordinates: String::new(),
        };
        route.apply(fields, stats_config, altitude);
        route
    }

    /// Replaces all user fields and recomputes every derived stat.
    pub fn apply(
        &mut self,
        fields: NewRoute,
        stats_config: &StatsConfig,
        altitude: &mut dyn AltitudeModel,
    ) {
        let stats = compute_stats_with(&fields.path, stats_config, altitude);

        self.name = fields.name;
        self.location = fields.location;
        self.difficulty = fields.difficulty;
        self.route_type = fields.route_type;
        self.distance = stats.distance_label();
        self.altitude = stats.altitude_label();
        self.time = stats.time_label;
        self.start_coordinates = fields
            .path
            .first()
            .map(|p| format_coords_label(*p, 4))
            .unwrap_or_default();
        self.path = fields.path;
    }

    /// Ordered route path.
    #[must_use]
    pub fn path(&self) -> &[Point] {
        &self.path
    }

    /// Distance label (e.g., "12.4 km").
    #[must_use]
    pub fn distance(&self) -> &str {
        &self.distance
    }

    /// Estimated time label (e.g., "4-5 h").
    #[must_use]
    pub fn time(&self) -> &str {
        &self.time
    }

    /// Altitude gain label (e.g., "840 m").
    #[must_use]
    pub fn altitude(&self) -> &str {
        &self.altitude
    }

    /// Label of the first path point (e.g., "43.2850° N, 42.5180° E").
    #[must_use]
    pub fn start_coordinates(&self) -> &str {
        &self.start_coordinates
    }

    /// First path point, if any.
    #[must_use]
    pub fn start(&self) -> Option<Point> {
        self.path.first().copied()
    }

    /// Last path point, if the path has at least two points.
    #[must_use]
    pub fn end(&self) -> Option<Point> {
        if self.path.len() >= MIN_ROUTE_POINTS {
            self.path.last().copied()
        } else {
            None
        }
    }

    /// Copies the user fields back out, e.g. to prefill an edit form.
    #[must_use]
    pub fn to_fields(&self) -> NewRoute {
        NewRoute {
            name: self.name.clone(),
            location: self.location.clone(),
            difficulty: self.difficulty,
            route_type: self.route_type.clone(),
            path: self.path.clone(),
        }
    }
}

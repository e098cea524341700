//! Hikers and the groups they belong to.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Point;
use crate::parser::coordinates::CoordinateParser;

/// Where a hiker currently is, as reported by their device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum HikerStatus {
    /// Walking on a trail
    #[default]
    OnTrail,
    /// On a river or lake crossing
    OnWater,
    /// Resting in camp
    InCamp,
}

impl fmt::Display for HikerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OnTrail => write!(f, "On trail"),
            Self::OnWater => write!(f, "On water"),
            Self::InCamp => write!(f, "In camp"),
        }
    }
}

/// A tracked group member.
///
/// `battery` and `coords` are written only by the telemetry simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hiker {
    /// Unique identifier within the group
    pub id: String,
    /// Display name
    pub name: String,
    /// Current activity
    pub status: HikerStatus,
    /// Battery level in percent, within [0, 100]
    pub battery: f64,
    /// Encoded position text (e.g., "43.285000° N, 42.518000° E")
    pub coords: String,
    /// Human-readable time since the last update
    #[serde(rename = "lastUpdate")]
    pub last_update: String,
    /// Timestamp of the last update
    #[serde(
        rename = "lastUpdateTimestamp",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub last_update_at: Option<DateTime<Utc>>,
}

impl Hiker {
    /// Decodes the hiker's position, if the coordinate text is well-formed.
    #[must_use]
    pub fn position(&self, parser: &CoordinateParser) -> Option<Point> {
        parser.parse_pair(&self.coords)
    }
}

/// A hiking group following one planned route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    /// Unique identifier
    pub id: String,
    /// Group name
    pub name: String,
    /// Selected route, if any
    #[serde(rename = "routeId", default, skip_serializing_if = "Option::is_none")]
    pub route_id: Option<String>,
    /// Members; ids are unique within the group
    #[serde(default)]
    pub hikers: Vec<Hiker>,
}

impl Group {
    /// Adds a member. Returns false (and leaves the group unchanged) if a hiker
    /// with the same id is already present.
    pub fn add_hiker(&mut self, hiker: Hiker) -> bool {
        if self.hikers.iter().any(|h| h.id == hiker.id) {
            return false;
        }
        self.hikers.push(hiker);
        true
    }

    /// Looks up a member by id.
    #[must_use]
    pub fn hiker(&self, id: &str) -> Option<&Hiker> {
        self.hikers.iter().find(|h| h.id == id)
    }

    /// Replaces members with their simulated counterparts, matched by id.
    ///
    /// Members without a simulated counterpart are left as they are.
    pub fn apply_telemetry(&mut self, simulated: &[Hiker]) {
        for hiker in &mut self.hikers {
            if let Some(update) = simulated.iter().find(|s| s.id == hiker.id) {
                hiker.clone_from(update);
            }
        }
    }
}

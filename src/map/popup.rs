//! Declarative popup content for map layers.
//!
//! Popups are plain data: a title, labelled fields and action buttons. The
//! surface adapter decides how to draw them.

use crate::map::surface::MapAction;
use crate::models::{Group, Hiker, Route};

/// One labelled line in a popup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PopupField {
    /// Field label (e.g., "Battery")
    pub label: String,
    /// Field value (e.g., "87%")
    pub value: String,
}

/// A button in a popup.
#[derive(Debug, Clone, PartialEq)]
pub struct PopupAction {
    /// Button text
    pub label: String,
    /// Action fired when pressed
    pub action: MapAction,
}

/// Content of a layer popup.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PopupContent {
    /// Bold heading
    pub title: String,
    /// Labelled lines under the title
    pub fields: Vec<PopupField>,
    /// Buttons at the bottom
    pub actions: Vec<PopupAction>,
}

impl PopupContent {
    /// Creates a popup with only a title.
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }

    /// Appends a labelled field.
    #[must_use]
    pub fn with_field(mut self, label: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push(PopupField {
            label: label.into(),
            value: value.into(),
        });
        self
    }

    /// Appends an action button.
    #[must_use]
    pub fn with_action(mut self, label: impl Into<String>, action: MapAction) -> Self {
        self.actions.push(PopupAction {
            label: label.into(),
            action,
        });
        self
    }

    /// Looks up a field value by label.
    #[must_use]
    pub fn field(&self, label: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|f| f.label == label)
            .map(|f| f.value.as_str())
    }
}

/// Popup for a route's starting point.
#[must_use]
pub fn route_start_popup(route: &Route) -> PopupContent {
    PopupContent::titled(format!("{} (start)", route.name))
        .with_field("Difficulty", route.difficulty.to_string())
        .with_field("Distance", route.distance())
        .with_field("Time", route.time())
        .with_field("Altitude", route.altitude())
}

/// Popup for a route's finishing point, with a jump back to the start.
#[must_use]
pub fn route_end_popup(route: &Route, focus_zoom: u8) -> PopupContent {
    let popup = PopupContent::titled(format!("{} (finish)", route.name));
    match route.start() {
        Some(start) => popup.with_action(
            "Go to route start",
            MapAction::CenterOn {
                point: start,
                zoom: focus_zoom,
            },
        ),
        None => popup,
    }
}

/// Popup for a hiker marker.
#[must_use]
pub fn hiker_popup(hiker: &Hiker, group: &Group) -> PopupContent {
    PopupContent::titled(hiker.name.clone())
        .with_field("Status", hiker.status.to_string())
        .with_field("Battery", format!("{}%", hiker.battery))
        .with_field("Updated", hiker.last_update.clone())
        .with_action(
            "Open group chat",
            MapAction::OpenGroupChat {
                group_id: group.id.clone(),
            },
        )
}

/// Popup for a point placed while drawing (1-based).
#[must_use]
pub fn drawing_point_popup(number: usize) -> PopupContent {
    PopupContent::titled(format!("Point {number}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StatsConfig;
    use crate::models::{Difficulty, HikerStatus, NewRoute, Point};
    use crate::services::route_stats::FixedAltitude;

    fn route() -> Route {
        Route::new(
            "route-1",
            NewRoute {
                name: "Elbrus".to_string(),
                location: "Kabardino-Balkaria".to_string(),
                difficulty: Difficulty::Hard,
                route_type: "Ascent".to_string(),
                path: vec![
                    Point::new(43.25, 42.5).unwrap(),
                    Point::new(43.35, 42.44).unwrap(),
                ],
            },
            &StatsConfig::default(),
            &mut FixedAltitude::new(0.0),
        )
    }

    #[test]
    fn test_route_start_popup_fields() {
        let route = route();
        let popup = route_start_popup(&route);
        assert_eq!(popup.title, "Elbrus (start)");
        assert_eq!(popup.field("Difficulty"), Some("Hard"));
        assert_eq!(popup.field("Distance"), Some(route.distance()));
        assert_eq!(popup.field("Time"), Some(route.time()));
        assert_eq!(popup.field("Altitude"), Some(route.altitude()));
        assert!(popup.actions.is_empty());
    }

    #[test]
    fn test_route_end_popup_centers_on_start() {
        let popup = route_end_popup(&route(), 13);
        assert_eq!(popup.title, "Elbrus (finish)");
        assert_eq!(
            popup.actions[0].action,
            MapAction::CenterOn {
                point: Point::new(43.25, 42.5).unwrap(),
                zoom: 13
            }
        );
    }

    #[test]
    fn test_hiker_popup() {
        let group = Group {
            id: "group-1".to_string(),
            name: "Team".to_string(),
            route_id: None,
            hikers: vec![],
        };
        let hiker = Hiker {
            id: "h1".to_string(),
            name: "Anna".to_string(),
            status: HikerStatus::OnWater,
            battery: 87.5,
            coords: "43 42".to_string(),
            last_update: "just now".to_string(),
            last_update_at: None,
        };
        let popup = hiker_popup(&hiker, &group);
        assert_eq!(popup.title, "Anna");
        assert_eq!(popup.field("Status"), Some("On water"));
        assert_eq!(popup.field("Battery"), Some("87.5%"));
        assert_eq!(
            popup.actions[0].action,
            MapAction::OpenGroupChat {
                group_id: "group-1".to_string()
            }
        );
    }
}

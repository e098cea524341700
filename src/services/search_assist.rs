//! Search-area suggestions for a missing hiker.
//!
//! The suggestion model itself lives behind the [`SearchAssist`] trait. This
//! module turns its answer into a map overlay or a user-facing notice.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::models::{MapOverlay, Path};

/// What is known about the missing hiker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    /// Free-text last known location
    pub last_known_location: String,
    /// Weather at the time of disappearance
    pub weather_conditions: String,
    /// Route the hiker intended to follow
    pub planned_route: String,
}

/// Suggestion returned by the assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchSuggestion {
    /// Prose description of where to search
    pub suggested_search_areas: String,
    /// Prose confidence assessment
    pub confidence_level: String,
    /// Polygon to draw on the map, if the assistant produced one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_area_polygon: Option<Path>,
}

/// Source of search-area suggestions.
pub trait SearchAssist {
    /// Produces a suggestion for the request.
    fn suggest_search_areas(&self, request: &SearchRequest) -> anyhow::Result<SearchSuggestion>;
}

/// Short message for the user (a toast in a GUI, a line on stderr in the CLI).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    /// Heading
    pub title: String,
    /// Body text
    pub description: String,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.title, self.description)
    }
}

/// Successful result of [`request_search_overlay`].
#[derive(Debug, Clone, PartialEq)]
pub struct SearchOutcome {
    /// The assistant's answer
    pub suggestion: SearchSuggestion,
    /// Overlay built from the polygon, when there is one
    pub overlay: Option<MapOverlay>,
    /// Confirmation to show when an overlay was produced
    pub notice: Option<Notice>,
}

/// Title of the notice shown when the assistant fails.
pub const ERROR_TITLE: &str = "Search assistant error";

const FALLBACK_ERROR: &str =
    "Could not get suggestions. Check the logs for details and try again.";

/// Asks the assistant for a search area and prepares the map overlay.
///
/// The overlay id is `search-area-{unix millis}` of `now`. Failures become a
/// [`Notice`]; nothing else changes.
pub fn request_search_overlay(
    assist: &dyn SearchAssist,
    request: &SearchRequest,
    now: DateTime<Utc>,
) -> Result<SearchOutcome, Notice> {
    let suggestion = match assist.suggest_search_areas(request) {
        Ok(suggestion) => suggestion,
        Err(e) => {
            warn!("Search assistant failed: {e:#}");
            let message = e.to_string();
            return Err(Notice {
                title: ERROR_TITLE.to_string(),
                description: if message.trim().is_empty() {
                    FALLBACK_ERROR.to_string()
                } else {
                    message
                },
            });
        }
    };

    let overlay = suggestion
        .search_area_polygon
        .as_ref()
        .filter(|polygon| !polygon.is_empty())
        .map(|polygon| {
            MapOverlay::search_area(
                format!("search-area-{}", now.timestamp_millis()),
                polygon.clone(),
            )
        });

    let notice = overlay.as_ref().map(|overlay| {
        info!(id = %overlay.id, vertices = overlay.polygon.len(), "Search area suggested");
        Notice {
            title: "Search area added to map".to_string(),
            description: "Switch to the map to see the polygon.".to_string(),
        }
    });

    Ok(SearchOutcome {
        suggestion,
        overlay,
        notice,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Point;
    use anyhow::bail;

    struct Canned(Option<Path>);

    impl SearchAssist for Canned {
        fn suggest_search_areas(&self, _request: &SearchRequest) -> anyhow::Result<SearchSuggestion> {
            Ok(SearchSuggestion {
                suggested_search_areas: "Check the moraine below the saddle".to_string(),
                confidence_level: "Medium".to_string(),
                search_area_polygon: self.0.clone(),
            })
        }
    }

    struct Failing;

    impl SearchAssist for Failing {
        fn suggest_search_areas(&self, _request: &SearchRequest) -> anyhow::Result<SearchSuggestion> {
            bail!("model unavailable")
        }
    }

    fn request() -> SearchRequest {
        SearchRequest {
            last_known_location: "Priut 11".to_string(),
            weather_conditions: "Fog".to_string(),
            planned_route: "Elbrus south".to_string(),
        }
    }

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp_millis(1_700_000_000_123).unwrap()
    }

    #[test]
    fn test_polygon_becomes_overlay() {
        let polygon = vec![
            Point::new(43.30, 42.44).unwrap(),
            Point::new(43.32, 42.44).unwrap(),
            Point::new(43.31, 42.47).unwrap(),
        ];
        let outcome = request_search_overlay(&Canned(Some(polygon.clone())), &request(), now())
            .unwrap();
        let overlay = outcome.overlay.unwrap();
        assert_eq!(overlay.id, "search-area-1700000000123");
        assert_eq!(overlay.polygon, polygon);
        assert!(outcome.notice.is_some());
    }

    #[test]
    fn test_empty_polygon_gives_no_overlay() {
        let outcome = request_search_overlay(&Canned(Some(vec![])), &request(), now()).unwrap();
        assert!(outcome.overlay.is_none());
        assert!(outcome.notice.is_none());

        let outcome = request_search_overlay(&Canned(None), &request(), now()).unwrap();
        assert_eq!(outcome.suggestion.confidence_level, "Medium");
        assert!(outcome.overlay.is_none());
    }

    #[test]
    fn test_failure_becomes_notice() {
        let notice = request_search_overlay(&Failing, &request(), now()).unwrap_err();
        assert_eq!(notice.title, ERROR_TITLE);
        assert_eq!(notice.description, "model unavailable");
    }

    #[test]
    fn test_suggestion_json_uses_camel_case() {
        let json = r#"{
            "suggestedSearchAreas": "North slope",
            "confidenceLevel": "Low",
            "searchAreaPolygon": [[43.3, 42.4], [43.4, 42.4], [43.35, 42.5]]
        }"#;
        let suggestion: SearchSuggestion = serde_json::from_str(json).unwrap();
        assert_eq!(suggestion.search_area_polygon.unwrap().len(), 3);
    }
}

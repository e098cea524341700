//! Temporary map overlays such as suggested search areas.

use serde::{Deserialize, Serialize};

use crate::models::{Bounds, Path};

/// Kind of overlay. Search areas are the only kind produced today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub enum OverlayKind {
    /// Suggested search area for a missing hiker
    #[default]
    SearchArea,
}

/// A user-dismissible polygon shown on the map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapOverlay {
    /// Unique identifier
    pub id: String,
    /// Overlay kind
    #[serde(rename = "type")]
    pub kind: OverlayKind,
    /// Polygon ring (not explicitly closed)
    pub polygon: Path,
}

impl MapOverlay {
    /// Creates a search-area overlay.
    pub fn search_area(id: impl Into<String>, polygon: Path) -> Self {
        Self {
            id: id.into(),
            kind: OverlayKind::SearchArea,
            polygon,
        }
    }

    /// Returns true if the polygon encloses an area the viewport can fit to:
    /// at least three vertices spanning a non-zero extent on both axes.
    #[must_use]
    pub fn is_non_degenerate(&self) -> bool {
        self.polygon.len() >= 3 && self.bounds().is_some_and(|b| b.has_area())
    }

    /// Bounds of the polygon, if it has any vertices.
    #[must_use]
    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::from_points(&self.polygon)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Point;

    fn p(lat: f64, lon: f64) -> Point {
        Point::new(lat, lon).unwrap()
    }

    #[test]
    fn test_non_degenerate_polygon() {
        let overlay = MapOverlay::search_area("s", vec![p(1.0, 1.0), p(1.0, 2.0), p(2.0, 1.5)]);
        assert!(overlay.is_non_degenerate());
    }

    #[test]
    fn test_degenerate_polygons() {
        assert!(!MapOverlay::search_area("s", vec![]).is_non_degenerate());
        assert!(!MapOverlay::search_area("s", vec![p(1.0, 1.0), p(2.0, 2.0)]).is_non_degenerate());
        // Three collinear points on a parallel have no latitude extent
        assert!(!MapOverlay::search_area("s", vec![p(1.0, 1.0), p(1.0, 2.0), p(1.0, 3.0)])
            .is_non_degenerate());
    }

    #[test]
    fn test_overlay_kind_serializes_camel_case() {
        let overlay = MapOverlay::search_area("search-area-1", vec![p(1.0, 1.0)]);
        let value = serde_json::to_value(&overlay).unwrap();
        assert_eq!(value["type"], "searchArea");
    }
}

//! Rendering-surface capability and the plain-data layer descriptions passed to it.
//!
//! The map engine never talks to a drawing toolkit directly. It describes what
//! it wants as [`LayerSpec`] values and asks a [`RenderSurface`] implementation
//! to create, update and remove the corresponding objects. Popup content is a
//! declarative [`PopupContent`] the adapter renders however it likes.

use anyhow::Result;

use crate::map::popup::PopupContent;
use crate::models::{Bounds, Path, Point};

/// Opaque reference to an object living on a rendering surface.
///
/// Handles are not `Clone`: each one has exactly one owner, which drops it
/// once the surface confirms the layer is gone.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct LayerHandle(u64);

impl LayerHandle {
    /// Wraps a surface-assigned identifier. Only surfaces should call this.
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    /// Surface-assigned identifier. Equal ids mean the same live object.
    #[must_use]
    pub const fn id(&self) -> u64 {
        self.0
    }
}

/// Theme color slots. The adapter maps them to concrete colors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorToken {
    /// Regular content color
    Primary,
    /// Highlight color
    Accent,
}

/// Stroke and fill style for lines and polygons.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerStyle {
    /// Stroke (and fill) color
    pub color: ColorToken,
    /// Stroke width in pixels
    pub weight: f32,
    /// Stroke opacity in [0, 1]
    pub opacity: f32,
    /// Fill opacity for polygons
    pub fill_opacity: Option<f32>,
    /// Dash pattern, e.g. "5, 10"
    pub dash_array: Option<String>,
}

impl LayerStyle {
    /// Route line style; the active group's route is emphasized.
    #[must_use]
    pub fn route(active: bool) -> Self {
        if active {
            Self {
                color: ColorToken::Accent,
                weight: 5.0,
                opacity: 0.9,
                fill_opacity: None,
                dash_array: None,
            }
        } else {
            Self {
                color: ColorToken::Primary,
                weight: 3.0,
                opacity: 0.6,
                fill_opacity: None,
                dash_array: None,
            }
        }
    }

    /// Dashed line previewing a route being drawn.
    #[must_use]
    pub fn drawing_preview() -> Self {
        Self {
            color: ColorToken::Accent,
            weight: 4.0,
            opacity: 1.0,
            fill_opacity: None,
            dash_array: Some("5, 10".to_string()),
        }
    }

    /// Translucent search-area polygon.
    #[must_use]
    pub fn search_area() -> Self {
        Self {
            color: ColorToken::Accent,
            weight: 3.0,
            opacity: 1.0,
            fill_opacity: Some(0.2),
            dash_array: None,
        }
    }
}

/// Marker icon variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IconKind {
    /// Standard pin, used for route endpoints and drawn points
    Pin,
    /// Hiker avatar icon
    Hiker,
}

/// A point marker with an optional popup.
#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSpec {
    /// Marker position
    pub position: Point,
    /// Icon
    pub icon: IconKind,
    /// Icon opacity in [0, 1]
    pub opacity: f32,
    /// Popup shown on click
    pub popup: Option<PopupContent>,
}

/// Something the user can trigger from a layer (popup button, close control).
#[derive(Debug, Clone, PartialEq)]
pub enum MapAction {
    /// Pan and zoom the map to a point
    CenterOn {
        /// Target point
        point: Point,
        /// Target zoom
        zoom: u8,
    },
    /// Switch to a group's chat
    OpenGroupChat {
        /// Group to open
        group_id: String,
    },
    /// Remove an overlay from the map
    DismissOverlay {
        /// Overlay to remove
        overlay_id: String,
    },
}

/// Desired state of one map layer.
#[derive(Debug, Clone, PartialEq)]
pub enum LayerSpec {
    /// Point marker
    Marker(MarkerSpec),
    /// Open line
    Polyline {
        /// Vertices in order
        points: Path,
        /// Line style
        style: LayerStyle,
    },
    /// Closed, filled polygon
    Polygon {
        /// Ring vertices
        points: Path,
        /// Stroke/fill style
        style: LayerStyle,
        /// Close control attached to the polygon, if any
        dismiss: Option<MapAction>,
    },
    /// Composite of child layers managed as one unit
    Group(Vec<LayerSpec>),
}

/// Discriminant of a [`LayerSpec`], used to decide whether an in-place update is possible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerKind {
    /// Point marker
    Marker,
    /// Open line
    Polyline,
    /// Filled polygon
    Polygon,
    /// Composite
    Group,
}

impl LayerSpec {
    /// Kind of layer this spec describes.
    #[must_use]
    pub const fn kind(&self) -> LayerKind {
        match self {
            Self::Marker(_) => LayerKind::Marker,
            Self::Polyline { .. } => LayerKind::Polyline,
            Self::Polygon { .. } => LayerKind::Polygon,
            Self::Group(_) => LayerKind::Group,
        }
    }
}

/// Input events coming back from the surface.
#[derive(Debug, Clone, PartialEq)]
pub enum MapEvent {
    /// The user clicked the map background
    Click(Point),
    /// The user triggered an action attached to a layer
    Action(MapAction),
}

/// Capability a map-drawing toolkit must provide.
///
/// Leaf layers are created with the `create_*` methods; composites are created
/// empty and filled with [`attach_to_group`](Self::attach_to_group).
/// `update_layer` only receives leaf specs of the same kind the handle was
/// created with.
pub trait RenderSurface {
    /// Adds a marker.
    fn create_marker(&mut self, marker: &MarkerSpec) -> Result<LayerHandle>;

    /// Adds a polyline.
    fn create_polyline(&mut self, points: &[Point], style: &LayerStyle) -> Result<LayerHandle>;

    /// Adds a polygon, with an optional close control.
    fn create_polygon(
        &mut self,
        points: &[Point],
        style: &LayerStyle,
        dismiss: Option<&MapAction>,
    ) -> Result<LayerHandle>;

    /// Adds an empty composite layer.
    fn create_group(&mut self) -> Result<LayerHandle>;

    /// Moves a created layer into a composite.
    fn attach_to_group(&mut self, group: &LayerHandle, child: &LayerHandle) -> Result<()>;

    /// Mutates an existing leaf layer in place (position, vertices, style, popup).
    fn update_layer(&mut self, handle: &LayerHandle, spec: &LayerSpec) -> Result<()>;

    /// Destroys a layer. Composite children are removed by the caller first.
    ///
    /// On error the layer is assumed to still exist.
    fn remove_layer(&mut self, handle: &LayerHandle) -> Result<()>;

    /// Fits the viewport to a bounding box.
    fn fit_bounds(&mut self, bounds: Bounds, padding_px: u32) -> Result<()>;

    /// Centers the viewport on a point at a zoom level.
    fn set_view(&mut self, center: Point, zoom: u8) -> Result<()>;

    /// Takes all input events received since the last call.
    fn drain_events(&mut self) -> Vec<MapEvent>;

    /// Stops delivering input events. Called once when the owning view unmounts.
    fn detach_listeners(&mut self);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_style_emphasizes_active() {
        let active = LayerStyle::route(true);
        let inactive = LayerStyle::route(false);
        assert_eq!(active.color, ColorToken::Accent);
        assert_eq!(inactive.color, ColorToken::Primary);
        assert!(active.weight > inactive.weight);
        assert!(active.opacity > inactive.opacity);
    }

    #[test]
    fn test_layer_kind() {
        let spec = LayerSpec::Group(vec![LayerSpec::Polyline {
            points: vec![],
            style: LayerStyle::drawing_preview(),
        }]);
        assert_eq!(spec.kind(), LayerKind::Group);
        if let LayerSpec::Group(children) = &spec {
            assert_eq!(children[0].kind(), LayerKind::Polyline);
        }
    }
}

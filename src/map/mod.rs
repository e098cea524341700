//! Map-state reconciliation.
//!
//! Entity collections (routes, hikers, overlays, drawn points) are turned into
//! [`LayerSpec`] values and synchronized onto a [`RenderSurface`] by the
//! [`LayerReconciler`]. [`MapView`] ties the channels together and owns the
//! surface for its lifetime.

pub mod overlays;
pub mod popup;
pub mod reconciler;
pub mod recording;
pub mod surface;
pub mod view;

pub use overlays::OverlayManager;
pub use popup::{PopupAction, PopupContent, PopupField};
pub use reconciler::{Channel, DesiredLayers, LayerReconciler, ReconcileReport};
pub use recording::{RecordedLayer, RecordingSurface, SurfaceOp};
pub use surface::{
    ColorToken, IconKind, LayerHandle, LayerKind, LayerSpec, LayerStyle, MapAction, MapEvent,
    MarkerSpec, RenderSurface,
};
pub use view::{MapView, SuggestionTicket, ViewRequest};

//! Ephemeral, user-dismissible map overlays.
//!
//! Overlays are keyed by id on the [`Channel::Overlays`] channel. Adding an
//! overlay whose id is already shown replaces it, and a non-degenerate polygon
//! pulls the viewport to its bounds.

use anyhow::Result;
use tracing::{debug, info};

use crate::map::reconciler::{Channel, DesiredLayers, LayerReconciler};
use crate::map::surface::{LayerSpec, LayerStyle, MapAction, RenderSurface};
use crate::models::MapOverlay;

/// Tracks the overlays currently shown and keeps their layers in sync.
#[derive(Debug, Clone, Default)]
pub struct OverlayManager {
    overlays: Vec<MapOverlay>,
    fit_padding_px: u32,
}

impl OverlayManager {
    /// Creates a manager that fits new overlays with the given padding.
    #[must_use]
    pub const fn new(fit_padding_px: u32) -> Self {
        Self {
            overlays: Vec::new(),
            fit_padding_px,
        }
    }

    /// Overlays currently shown, oldest first.
    #[must_use]
    pub fn overlays(&self) -> &[MapOverlay] {
        &self.overlays
    }

    /// Looks up an overlay by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&MapOverlay> {
        self.overlays.iter().find(|o| o.id == id)
    }

    /// Shows an overlay, replacing any overlay with the same id.
    ///
    /// The replaced overlay's layer is destroyed and a fresh one created, so
    /// exactly one layer exists per id afterwards.
    pub fn add_overlay<S: RenderSurface + ?Sized>(
        &mut self,
        reconciler: &mut LayerReconciler,
        surface: &mut S,
        overlay: MapOverlay,
    ) -> Result<()> {
        if let Some(index) = self.overlays.iter().position(|o| o.id == overlay.id) {
            // The old overlay stays listed until its layer is really gone
            reconciler.remove(surface, Channel::Overlays, &overlay.id)?;
            self.overlays.remove(index);
            debug!(id = %overlay.id, "Replacing overlay");
        }

        let fit = overlay
            .is_non_degenerate()
            .then(|| overlay.bounds())
            .flatten();
        info!(id = %overlay.id, vertices = overlay.polygon.len(), "Adding overlay");
        self.overlays.push(overlay);
        self.sync(reconciler, surface)?;

        if let Some(bounds) = fit {
            surface.fit_bounds(bounds, self.fit_padding_px)?;
        }
        Ok(())
    }

    /// Hides an overlay. Unknown ids are a no-op.
    ///
    /// Returns true if an overlay was removed.
    pub fn remove_overlay<S: RenderSurface + ?Sized>(
        &mut self,
        reconciler: &mut LayerReconciler,
        surface: &mut S,
        id: &str,
    ) -> Result<bool> {
        let Some(index) = self.overlays.iter().position(|o| o.id == id) else {
            return Ok(false);
        };
        reconciler.remove(surface, Channel::Overlays, id)?;
        self.overlays.remove(index);
        info!(id, "Removed overlay");
        Ok(true)
    }

    /// Reconciles the overlay channel with the current overlay list.
    pub fn sync<S: RenderSurface + ?Sized>(
        &self,
        reconciler: &mut LayerReconciler,
        surface: &mut S,
    ) -> Result<()> {
        reconciler.reconcile(surface, Channel::Overlays, &self.desired())?;
        Ok(())
    }

    fn desired(&self) -> DesiredLayers {
        self.overlays
            .iter()
            .filter(|o| !o.polygon.is_empty())
            .map(|o| (o.id.clone(), overlay_layer(o)))
            .collect()
    }
}

/// Layer for an overlay: a translucent polygon with a close control.
#[must_use]
pub fn overlay_layer(overlay: &MapOverlay) -> LayerSpec {
    LayerSpec::Polygon {
        points: overlay.polygon.clone(),
        style: LayerStyle::search_area(),
        dismiss: Some(MapAction::DismissOverlay {
            overlay_id: overlay.id.clone(),
        }),
    }
}

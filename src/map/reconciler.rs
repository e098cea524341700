//! Incremental synchronization of map layers with keyed entity collections.
//!
//! Each [`Channel`] holds the layers for one kind of entity. A reconciliation
//! pass compares the ids rendered last time with the ids wanted now and
//! applies a three-way set difference:
//!
//! 1. `previous - current`: remove the layer
//! 2. `previous ∩ current`: update the existing layer in place
//! 3. `current - previous`: create a new layer
//!
//! Steps always run in that order. Updating in place keeps object identity, so
//! popups and selection on untouched layers survive a pass.
//!
//! A failing surface call aborts the pass but never loses track of a layer:
//! partially built composites are rolled back, and an id is only forgotten
//! once its layer is confirmed gone. Running the pass again converges.
//!
//! # Examples
//!
//! ```
//! use std::collections::BTreeMap;
//! use trailwatch::map::{Channel, LayerReconciler, LayerSpec, LayerStyle, RecordingSurface};
//! use trailwatch::models::Point;
//!
//! let mut surface = RecordingSurface::new();
//! let mut reconciler = LayerReconciler::new();
//!
//! let line = LayerSpec::Polyline {
//!     points: vec![Point::new(0.0, 0.0).unwrap(), Point::new(0.0, 1.0).unwrap()],
//!     style: LayerStyle::route(false),
//! };
//! let desired = BTreeMap::from([("route-1".to_string(), line)]);
//!
//! let first = reconciler.reconcile(&mut surface, Channel::Routes, &desired).unwrap();
//! assert_eq!(first.created, 1);
//!
//! let second = reconciler.reconcile(&mut surface, Channel::Routes, &desired).unwrap();
//! assert_eq!((second.created, second.removed), (0, 0));
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use anyhow::{Context, Result};
use tracing::{debug, trace, warn};

use crate::map::surface::{LayerHandle, LayerSpec, RenderSurface};

/// Independent groups of layers, each reconciled on its own.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Channel {
    /// Saved routes
    Routes,
    /// Members of the active group
    Hikers,
    /// Search-area overlays
    Overlays,
    /// Points and line of the route being drawn
    DrawingPreview,
}

impl Channel {
    /// All channels, in teardown order.
    pub const ALL: [Self; 4] = [
        Self::DrawingPreview,
        Self::Overlays,
        Self::Hikers,
        Self::Routes,
    ];
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Routes => write!(f, "routes"),
            Self::Hikers => write!(f, "hikers"),
            Self::Overlays => write!(f, "overlays"),
            Self::DrawingPreview => write!(f, "drawing"),
        }
    }
}

/// Desired layers for one channel, keyed by entity id.
pub type DesiredLayers = BTreeMap<String, LayerSpec>;

/// Counts of surface operations performed by one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReconcileReport {
    /// Layers created for new ids
    pub created: usize,
    /// Existing layers mutated in place
    pub updated: usize,
    /// Existing layers whose spec was identical; no surface call was made
    pub unchanged: usize,
    /// Layers removed for ids that disappeared
    pub removed: usize,
}

impl ReconcileReport {
    /// Returns true if the pass created or removed anything.
    #[must_use]
    pub const fn changed_membership(&self) -> bool {
        self.created > 0 || self.removed > 0
    }
}

/// A live layer plus the spec it currently shows.
#[derive(Debug)]
struct RenderedLayer {
    handle: LayerHandle,
    spec: LayerSpec,
    children: Vec<RenderedLayer>,
}

impl RenderedLayer {
    /// Rewrites a composite's spec from the children it actually holds.
    fn sync_group_spec(&mut self) {
        if matches!(self.spec, LayerSpec::Group(_)) {
            self.spec = LayerSpec::Group(self.children.iter().map(|c| c.spec.clone()).collect());
        }
    }
}

/// Owns every layer handle on a surface and keeps them in sync with entity ids.
#[derive(Debug, Default)]
pub struct LayerReconciler {
    channels: BTreeMap<Channel, BTreeMap<String, RenderedLayer>>,
}

impl LayerReconciler {
    /// Creates a reconciler with no layers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Brings one channel in line with `desired`.
    ///
    /// After a successful pass the channel's id set equals the key set of
    /// `desired`.
    pub fn reconcile<S: RenderSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        channel: Channel,
        desired: &DesiredLayers,
    ) -> Result<ReconcileReport> {
        let rendered = self.channels.entry(channel).or_default();
        let mut report = ReconcileReport::default();

        // 1. Remove ids that are gone
        let stale: Vec<String> = rendered
            .keys()
            .filter(|id| !desired.contains_key(*id))
            .cloned()
            .collect();
        for id in stale {
            let Some(layer) = rendered.get_mut(&id) else {
                continue;
            };
            destroy(surface, layer)
                .with_context(|| format!("Failed to remove {channel} layer '{id}'"))?;
            rendered.remove(&id);
            report.removed += 1;
        }

        // 2. Update ids present on both sides
        for (id, layer) in rendered.iter_mut() {
            let Some(spec) = desired.get(id) else {
                continue;
            };
            if layer.spec == *spec {
                report.unchanged += 1;
                continue;
            }
            patch(surface, layer, spec)
                .with_context(|| format!("Failed to update {channel} layer '{id}'"))?;
            report.updated += 1;
        }

        // 3. Create ids that are new
        for (id, spec) in desired {
            if rendered.contains_key(id) {
                continue;
            }
            let layer = build(surface, spec)
                .with_context(|| format!("Failed to create {channel} layer '{id}'"))?;
            rendered.insert(id.clone(), layer);
            report.created += 1;
        }

        debug!(
            %channel,
            created = report.created,
            updated = report.updated,
            unchanged = report.unchanged,
            removed = report.removed,
            "Reconciled layers"
        );
        Ok(report)
    }

    /// Removes a single id from a channel. Unknown ids are a no-op.
    ///
    /// Returns true if a layer was removed.
    pub fn remove<S: RenderSurface + ?Sized>(
        &mut self,
        surface: &mut S,
        channel: Channel,
        id: &str,
    ) -> Result<bool> {
        let Some(layers) = self.channels.get_mut(&channel) else {
            trace!(%channel, id, "Ignoring removal of unknown layer");
            return Ok(false);
        };
        let Some(layer) = layers.get_mut(id) else {
            trace!(%channel, id, "Ignoring removal of unknown layer");
            return Ok(false);
        };
        destroy(surface, layer)
            .with_context(|| format!("Failed to remove {channel} layer '{id}'"))?;
        layers.remove(id);
        Ok(true)
    }

    /// Destroys every layer on every channel.
    ///
    /// Keeps going after a failure so that as much as possible is released,
    /// then reports the first error. Layers that could not be removed stay
    /// tracked, so a later call can retry them.
    pub fn clear<S: RenderSurface + ?Sized>(&mut self, surface: &mut S) -> Result<usize> {
        let mut removed = 0;
        let mut first_error = None;

        for channel in Channel::ALL {
            let Some(layers) = self.channels.get_mut(&channel) else {
                continue;
            };
            layers.retain(|id, layer| match destroy(surface, layer) {
                Ok(()) => {
                    removed += 1;
                    false
                }
                Err(e) => {
                    if first_error.is_none() {
                        first_error =
                            Some(e.context(format!("Failed to remove {channel} layer '{id}'")));
                    }
                    true
                }
            });
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(removed),
        }
    }

    /// Handle currently rendering `id` on a channel.
    #[must_use]
    pub fn handle(&self, channel: Channel, id: &str) -> Option<&LayerHandle> {
        self.channels
            .get(&channel)
            .and_then(|c| c.get(id))
            .map(|layer| &layer.handle)
    }

    /// Handles of a composite layer's children, in spec order.
    #[must_use]
    pub fn child_handles(&self, channel: Channel, id: &str) -> Vec<&LayerHandle> {
        self.channels
            .get(&channel)
            .and_then(|c| c.get(id))
            .map(|layer| layer.children.iter().map(|c| &c.handle).collect())
            .unwrap_or_default()
    }

    /// Ids rendered on a channel.
    #[must_use]
    pub fn ids(&self, channel: Channel) -> BTreeSet<&str> {
        self.channels
            .get(&channel)
            .map(|c| c.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Number of top-level layers on a channel.
    #[must_use]
    pub fn len(&self, channel: Channel) -> usize {
        self.channels.get(&channel).map_or(0, BTreeMap::len)
    }

    /// Returns true if no channel holds any layer.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.channels.values().all(BTreeMap::is_empty)
    }
}

/// Creates a layer (and, for composites, all children) on the surface.
///
/// On error nothing created by this call is left behind.
fn build<S: RenderSurface + ?Sized>(surface: &mut S, spec: &LayerSpec) -> Result<RenderedLayer> {
    let (handle, children) = match spec {
        LayerSpec::Marker(marker) => (surface.create_marker(marker)?, Vec::new()),
        LayerSpec::Polyline { points, style } => {
            (surface.create_polyline(points, style)?, Vec::new())
        }
        LayerSpec::Polygon {
            points,
            style,
            dismiss,
        } => (
            surface.create_polygon(points, style, dismiss.as_ref())?,
            Vec::new(),
        ),
        LayerSpec::Group(child_specs) => {
            let mut group = RenderedLayer {
                handle: surface.create_group()?,
                spec: spec.clone(),
                children: Vec::with_capacity(child_specs.len()),
            };
            for child_spec in child_specs {
                match build_child(surface, &group.handle, child_spec) {
                    Ok(child) => group.children.push(child),
                    Err(e) => {
                        discard(surface, group);
                        return Err(e);
                    }
                }
            }
            return Ok(group);
        }
    };

    Ok(RenderedLayer {
        handle,
        spec: spec.clone(),
        children,
    })
}

/// Builds a layer and attaches it to `group`.
fn build_child<S: RenderSurface + ?Sized>(
    surface: &mut S,
    group: &LayerHandle,
    spec: &LayerSpec,
) -> Result<RenderedLayer> {
    let child = build(surface, spec)?;
    if let Err(e) = surface.attach_to_group(group, &child.handle) {
        discard(surface, child);
        return Err(e);
    }
    Ok(child)
}

/// Removes a layer, children first.
///
/// Children are dropped from `layer` as they go. On error, whatever is still
/// live stays in `layer` and its spec matches what is left.
fn destroy<S: RenderSurface + ?Sized>(surface: &mut S, layer: &mut RenderedLayer) -> Result<()> {
    let result =
        destroy_children(surface, layer).and_then(|()| surface.remove_layer(&layer.handle));
    if result.is_err() {
        layer.sync_group_spec();
    }
    result
}

fn destroy_children<S: RenderSurface + ?Sized>(
    surface: &mut S,
    layer: &mut RenderedLayer,
) -> Result<()> {
    while let Some(mut child) = layer.children.pop() {
        if let Err(e) = destroy(surface, &mut child) {
            layer.children.push(child);
            return Err(e);
        }
    }
    Ok(())
}

/// Best-effort removal of a layer nobody will track.
fn discard<S: RenderSurface + ?Sized>(surface: &mut S, mut layer: RenderedLayer) {
    if let Err(e) = destroy(surface, &mut layer) {
        warn!(id = layer.handle.id(), "Failed to roll back layer: {e:#}");
    }
}

/// Brings an existing layer to `spec` while keeping its handle.
///
/// Leaves are updated in place. Composites patch their children pairwise: a
/// child of the same kind is updated, a child of another kind is replaced,
/// extra children are created and surplus ones removed. A top-level kind
/// change (e.g. marker to polyline) cannot keep identity and replaces the
/// layer.
///
/// On error `layer` still describes exactly what is on the surface, so the
/// next pass picks up where this one stopped.
fn patch<S: RenderSurface + ?Sized>(
    surface: &mut S,
    layer: &mut RenderedLayer,
    spec: &LayerSpec,
) -> Result<()> {
    if layer.spec.kind() != spec.kind() {
        let replacement = build(surface, spec)?;
        if let Err(e) = destroy(surface, layer) {
            discard(surface, replacement);
            return Err(e);
        }
        *layer = replacement;
        return Ok(());
    }

    match spec {
        LayerSpec::Group(child_specs) => {
            let result = patch_children(surface, layer, child_specs);
            layer.sync_group_spec();
            result
        }
        _ => {
            surface.update_layer(&layer.handle, spec)?;
            layer.spec = spec.clone();
            Ok(())
        }
    }
}

fn patch_children<S: RenderSurface + ?Sized>(
    surface: &mut S,
    layer: &mut RenderedLayer,
    child_specs: &[LayerSpec],
) -> Result<()> {
    while layer.children.len() > child_specs.len() {
        let Some(mut child) = layer.children.pop() else {
            break;
        };
        if let Err(e) = destroy(surface, &mut child) {
            layer.children.push(child);
            return Err(e);
        }
    }

    for (index, child_spec) in child_specs.iter().enumerate() {
        let Some(child) = layer.children.get_mut(index) else {
            let child = build_child(surface, &layer.handle, child_spec)?;
            layer.children.push(child);
            continue;
        };
        if child.spec == *child_spec {
            continue;
        }
        if child.spec.kind() == child_spec.kind() {
            patch(surface, child, child_spec)?;
            continue;
        }

        destroy(surface, child)?;
        layer.children.remove(index);
        let replacement = build_child(surface, &layer.handle, child_spec)?;
        layer.children.insert(index, replacement);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::recording::{RecordingSurface, SurfaceOp};
    use crate::map::surface::{IconKind, LayerStyle, MarkerSpec};
    use crate::models::Point;

    fn marker(lat: f64, lon: f64) -> LayerSpec {
        LayerSpec::Marker(MarkerSpec {
            position: Point::new(lat, lon).unwrap(),
            icon: IconKind::Hiker,
            opacity: 1.0,
            popup: None,
        })
    }

    fn line(points: &[(f64, f64)]) -> LayerSpec {
        LayerSpec::Polyline {
            points: points
                .iter()
                .map(|&(lat, lon)| Point::new(lat, lon).unwrap())
                .collect(),
            style: LayerStyle::route(false),
        }
    }

    fn desired(entries: &[(&str, LayerSpec)]) -> DesiredLayers {
        entries
            .iter()
            .map(|(id, spec)| ((*id).to_string(), spec.clone()))
            .collect()
    }

    #[test]
    fn test_remove_update_create() {
        let mut surface = RecordingSurface::new();
        let mut reconciler = LayerReconciler::new();

        reconciler
            .reconcile(
                &mut surface,
                Channel::Hikers,
                &desired(&[("a", marker(1.0, 1.0)), ("b", marker(2.0, 2.0))]),
            )
            .unwrap();
        let a_id = reconciler.handle(Channel::Hikers, "a").unwrap().id();
        let b_id = reconciler.handle(Channel::Hikers, "b").unwrap().id();

        let report = reconciler
            .reconcile(
                &mut surface,
                Channel::Hikers,
                &desired(&[("b", marker(2.5, 2.5)), ("c", marker(3.0, 3.0))]),
            )
            .unwrap();

        assert_eq!(
            report,
            ReconcileReport {
                created: 1,
                updated: 1,
                unchanged: 0,
                removed: 1
            }
        );
        assert_eq!(
            reconciler.ids(Channel::Hikers),
            BTreeSet::from(["b", "c"])
        );
        assert_eq!(reconciler.handle(Channel::Hikers, "b").unwrap().id(), b_id);
        assert!(!surface.contains(a_id));
        assert!(surface.contains(b_id));
        assert_eq!(surface.live_count(), 2);
    }

    #[test]
    fn test_pass_order_is_remove_update_create() {
        let mut surface = RecordingSurface::new();
        let mut reconciler = LayerReconciler::new();
        reconciler
            .reconcile(
                &mut surface,
                Channel::Hikers,
                &desired(&[("a", marker(1.0, 1.0)), ("b", marker(2.0, 2.0))]),
            )
            .unwrap();
        surface.clear_ops();

        reconciler
            .reconcile(
                &mut surface,
                Channel::Hikers,
                &desired(&[("b", marker(2.5, 2.5)), ("c", marker(3.0, 3.0))]),
            )
            .unwrap();

        let ops = surface.ops();
        assert_eq!(ops.len(), 3);
        assert!(matches!(ops[0], SurfaceOp::Remove { .. }));
        assert!(matches!(ops[1], SurfaceOp::Update { .. }));
        assert!(matches!(ops[2], SurfaceOp::Create { .. }));
    }

    #[test]
    fn test_idempotent_second_pass() {
        let mut surface = RecordingSurface::new();
        let mut reconciler = LayerReconciler::new();
        let wanted = desired(&[("a", marker(1.0, 1.0)), ("b", line(&[(0.0, 0.0), (1.0, 1.0)]))]);

        reconciler
            .reconcile(&mut surface, Channel::Routes, &wanted)
            .unwrap();
        surface.clear_ops();

        let report = reconciler
            .reconcile(&mut surface, Channel::Routes, &wanted)
            .unwrap();
        assert_eq!(report.created, 0);
        assert_eq!(report.removed, 0);
        assert_eq!(report.unchanged, 2);
        assert!(!report.changed_membership());
        assert!(surface.ops().is_empty());
    }

    #[test]
    fn test_channels_are_independent() {
        let mut surface = RecordingSurface::new();
        let mut reconciler = LayerReconciler::new();
        reconciler
            .reconcile(&mut surface, Channel::Routes, &desired(&[("x", line(&[(0.0, 0.0), (1.0, 1.0)]))]))
            .unwrap();
        reconciler
            .reconcile(&mut surface, Channel::Hikers, &desired(&[("x", marker(1.0, 1.0))]))
            .unwrap();

        // Emptying hikers leaves routes alone
        reconciler
            .reconcile(&mut surface, Channel::Hikers, &DesiredLayers::new())
            .unwrap();
        assert_eq!(reconciler.len(Channel::Hikers), 0);
        assert_eq!(reconciler.len(Channel::Routes), 1);
    }

    #[test]
    fn test_remove_unknown_id_is_noop() {
        let mut surface = RecordingSurface::new();
        let mut reconciler = LayerReconciler::new();
        assert!(!reconciler
            .remove(&mut surface, Channel::Overlays, "missing")
            .unwrap());
        assert!(surface.ops().is_empty());
    }

    #[test]
    fn test_group_children_patched_in_place() {
        let mut surface = RecordingSurface::new();
        let mut reconciler = LayerReconciler::new();

        let one = LayerSpec::Group(vec![line(&[(0.0, 0.0), (1.0, 1.0)]), marker(0.0, 0.0)]);
        reconciler
            .reconcile(&mut surface, Channel::Routes, &desired(&[("r", one)]))
            .unwrap();
        let group_id = reconciler.handle(Channel::Routes, "r").unwrap().id();
        let line_id = reconciler.child_handles(Channel::Routes, "r")[0].id();
        assert_eq!(surface.live_count(), 3);

        // Restyle the line and gain an end marker
        let mut restyled = line(&[(0.0, 0.0), (1.0, 1.0)]);
        if let LayerSpec::Polyline { style, .. } = &mut restyled {
            *style = LayerStyle::route(true);
        }
        let two = LayerSpec::Group(vec![restyled, marker(0.0, 0.0), marker(1.0, 1.0)]);
        let report = reconciler
            .reconcile(&mut surface, Channel::Routes, &desired(&[("r", two)]))
            .unwrap();

        assert_eq!(report.updated, 1);
        assert_eq!(reconciler.handle(Channel::Routes, "r").unwrap().id(), group_id);
        let children = reconciler.child_handles(Channel::Routes, "r");
        assert_eq!(children.len(), 3);
        assert_eq!(children[0].id(), line_id);
        assert_eq!(surface.live_count(), 4);
        assert_eq!(surface.children_of(group_id).len(), 3);

        // Shrink back to just the line
        let three = LayerSpec::Group(vec![line(&[(0.0, 0.0), (1.0, 1.0)])]);
        reconciler
            .reconcile(&mut surface, Channel::Routes, &desired(&[("r", three)]))
            .unwrap();
        assert_eq!(surface.live_count(), 2);
        assert_eq!(reconciler.child_handles(Channel::Routes, "r")[0].id(), line_id);
    }

    #[test]
    fn test_kind_change_replaces_layer() {
        let mut surface = RecordingSurface::new();
        let mut reconciler = LayerReconciler::new();
        reconciler
            .reconcile(&mut surface, Channel::Overlays, &desired(&[("o", marker(1.0, 1.0))]))
            .unwrap();
        let old = reconciler.handle(Channel::Overlays, "o").unwrap().id();

        reconciler
            .reconcile(
                &mut surface,
                Channel::Overlays,
                &desired(&[("o", line(&[(0.0, 0.0), (1.0, 1.0)]))]),
            )
            .unwrap();
        let new = reconciler.handle(Channel::Overlays, "o").unwrap().id();
        assert_ne!(old, new);
        assert!(!surface.contains(old));
        assert_eq!(surface.live_count(), 1);
    }

    #[test]
    fn test_clear_destroys_everything() {
        let mut surface = RecordingSurface::new();
        let mut reconciler = LayerReconciler::new();
        reconciler
            .reconcile(
                &mut surface,
                Channel::Routes,
                &desired(&[(
                    "r",
                    LayerSpec::Group(vec![line(&[(0.0, 0.0), (1.0, 1.0)]), marker(0.0, 0.0)]),
                )]),
            )
            .unwrap();
        reconciler
            .reconcile(&mut surface, Channel::Hikers, &desired(&[("h", marker(1.0, 1.0))]))
            .unwrap();

        let removed = reconciler.clear(&mut surface).unwrap();
        assert_eq!(removed, 2);
        assert!(reconciler.is_empty());
        assert_eq!(surface.live_count(), 0);
    }
}

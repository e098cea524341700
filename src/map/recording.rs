//! In-memory [`RenderSurface`] that records every call.
//!
//! Used by the CLI simulator and by tests. Clones share state, so a test can
//! keep one clone for inspection while a [`MapView`](crate::map::MapView) owns
//! another.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use anyhow::{bail, Result};

use crate::map::surface::{
    LayerHandle, LayerKind, LayerSpec, LayerStyle, MapAction, MapEvent, MarkerSpec, RenderSurface,
};
use crate::models::{Bounds, Point};

/// One recorded surface call.
#[derive(Debug, Clone, PartialEq)]
pub enum SurfaceOp {
    /// A layer was created
    Create {
        /// Surface id
        id: u64,
        /// Layer kind
        kind: LayerKind,
    },
    /// A leaf layer was mutated
    Update {
        /// Surface id
        id: u64,
    },
    /// A layer was destroyed
    Remove {
        /// Surface id
        id: u64,
    },
    /// A layer was moved into a composite
    Attach {
        /// Composite id
        group: u64,
        /// Child id
        child: u64,
    },
    /// Viewport fitted to bounds
    FitBounds {
        /// Target box
        bounds: Bounds,
        /// Padding in pixels
        padding_px: u32,
    },
    /// Viewport centered
    SetView {
        /// Center
        center: Point,
        /// Zoom
        zoom: u8,
    },
}

/// A live layer as the surface sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedLayer {
    /// Layer kind
    pub kind: LayerKind,
    /// Last spec applied (composites store an empty group)
    pub spec: LayerSpec,
    /// Owning composite, if attached
    pub parent: Option<u64>,
    /// Attached children, for composites
    pub children: Vec<u64>,
}

#[derive(Debug, Default)]
struct SurfaceState {
    next_id: u64,
    layers: BTreeMap<u64, RecordedLayer>,
    ops: Vec<SurfaceOp>,
    view: Option<(Point, u8)>,
    fitted: Option<Bounds>,
    pending: Vec<MapEvent>,
    listening: bool,
}

impl SurfaceState {
    fn insert(&mut self, kind: LayerKind, spec: LayerSpec) -> LayerHandle {
        self.next_id += 1;
        let id = self.next_id;
        self.layers.insert(
            id,
            RecordedLayer {
                kind,
                spec,
                parent: None,
                children: Vec::new(),
            },
        );
        self.ops.push(SurfaceOp::Create { id, kind });
        LayerHandle::new(id)
    }
}

/// Shared-state recording surface.
#[derive(Debug, Clone)]
pub struct RecordingSurface {
    state: Rc<RefCell<SurfaceState>>,
}

impl Default for RecordingSurface {
    fn default() -> Self {
        Self::new()
    }
}

impl RecordingSurface {
    /// Creates an empty surface that accepts events.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Rc::new(RefCell::new(SurfaceState {
                listening: true,
                ..SurfaceState::default()
            })),
        }
    }

    /// Queues an input event, as if the user produced it.
    ///
    /// Events are dropped once listeners are detached.
    pub fn push_event(&self, event: MapEvent) {
        let mut state = self.state.borrow_mut();
        if state.listening {
            state.pending.push(event);
        }
    }

    /// Every call recorded since creation or the last [`clear_ops`](Self::clear_ops).
    #[must_use]
    pub fn ops(&self) -> Vec<SurfaceOp> {
        self.state.borrow().ops.clone()
    }

    /// Forgets the call log. Live layers are kept.
    pub fn clear_ops(&self) {
        self.state.borrow_mut().ops.clear();
    }

    /// Number of create calls in the log.
    #[must_use]
    pub fn creates(&self) -> usize {
        self.count_ops(|op| matches!(op, SurfaceOp::Create { .. }))
    }

    /// Number of remove calls in the log.
    #[must_use]
    pub fn removes(&self) -> usize {
        self.count_ops(|op| matches!(op, SurfaceOp::Remove { .. }))
    }

    /// Number of update calls in the log.
    #[must_use]
    pub fn updates(&self) -> usize {
        self.count_ops(|op| matches!(op, SurfaceOp::Update { .. }))
    }

    fn count_ops(&self, pred: impl Fn(&SurfaceOp) -> bool) -> usize {
        self.state.borrow().ops.iter().filter(|op| pred(op)).count()
    }

    /// Number of layers currently alive, composites and children included.
    #[must_use]
    pub fn live_count(&self) -> usize {
        self.state.borrow().layers.len()
    }

    /// Returns true if a layer with this id is alive.
    #[must_use]
    pub fn contains(&self, id: u64) -> bool {
        self.state.borrow().layers.contains_key(&id)
    }

    /// Snapshot of a live layer.
    #[must_use]
    pub fn layer(&self, id: u64) -> Option<RecordedLayer> {
        self.state.borrow().layers.get(&id).cloned()
    }

    /// Children attached to a composite.
    #[must_use]
    pub fn children_of(&self, id: u64) -> Vec<u64> {
        self.state
            .borrow()
            .layers
            .get(&id)
            .map(|layer| layer.children.clone())
            .unwrap_or_default()
    }

    /// Live layers of one kind.
    #[must_use]
    pub fn count_kind(&self, kind: LayerKind) -> usize {
        self.state
            .borrow()
            .layers
            .values()
            .filter(|layer| layer.kind == kind)
            .count()
    }

    /// Last viewport set with `set_view`.
    #[must_use]
    pub fn view(&self) -> Option<(Point, u8)> {
        self.state.borrow().view
    }

    /// Last bounds passed to `fit_bounds`.
    #[must_use]
    pub fn fitted_bounds(&self) -> Option<Bounds> {
        self.state.borrow().fitted
    }

    /// Returns true until `detach_listeners` is called.
    #[must_use]
    pub fn is_listening(&self) -> bool {
        self.state.borrow().listening
    }
}

impl RenderSurface for RecordingSurface {
    fn create_marker(&mut self, marker: &MarkerSpec) -> Result<LayerHandle> {
        Ok(self
            .state
            .borrow_mut()
            .insert(LayerKind::Marker, LayerSpec::Marker(marker.clone())))
    }

    fn create_polyline(&mut self, points: &[Point], style: &LayerStyle) -> Result<LayerHandle> {
        let spec = LayerSpec::Polyline {
            points: points.to_vec(),
            style: style.clone(),
        };
        Ok(self.state.borrow_mut().insert(LayerKind::Polyline, spec))
    }

    fn create_polygon(
        &mut self,
        points: &[Point],
        style: &LayerStyle,
        dismiss: Option<&MapAction>,
    ) -> Result<LayerHandle> {
        let spec = LayerSpec::Polygon {
            points: points.to_vec(),
            style: style.clone(),
            dismiss: dismiss.cloned(),
        };
        Ok(self.state.borrow_mut().insert(LayerKind::Polygon, spec))
    }

    fn create_group(&mut self) -> Result<LayerHandle> {
        Ok(self
            .state
            .borrow_mut()
            .insert(LayerKind::Group, LayerSpec::Group(Vec::new())))
    }

    fn attach_to_group(&mut self, group: &LayerHandle, child: &LayerHandle) -> Result<()> {
        let mut state = self.state.borrow_mut();
        match state.layers.get(&group.id()) {
            Some(layer) if layer.kind == LayerKind::Group => {}
            Some(_) => bail!("Layer {} is not a group", group.id()),
            None => bail!("Unknown group layer {}", group.id()),
        }
        let Some(child_layer) = state.layers.get_mut(&child.id()) else {
            bail!("Unknown layer {}", child.id());
        };
        if child_layer.parent.is_some() {
            bail!("Layer {} is already attached", child.id());
        }
        child_layer.parent = Some(group.id());

        if let Some(group_layer) = state.layers.get_mut(&group.id()) {
            group_layer.children.push(child.id());
        }
        state.ops.push(SurfaceOp::Attach {
            group: group.id(),
            child: child.id(),
        });
        Ok(())
    }

    fn update_layer(&mut self, handle: &LayerHandle, spec: &LayerSpec) -> Result<()> {
        let mut state = self.state.borrow_mut();
        let Some(layer) = state.layers.get_mut(&handle.id()) else {
            bail!("Unknown layer {}", handle.id());
        };
        if layer.kind == LayerKind::Group || layer.kind != spec.kind() {
            bail!(
                "Cannot update {:?} layer {} with a {:?} spec",
                layer.kind,
                handle.id(),
                spec.kind()
            );
        }
        layer.spec = spec.clone();
        state.ops.push(SurfaceOp::Update { id: handle.id() });
        Ok(())
    }

    fn remove_layer(&mut self, handle: &LayerHandle) -> Result<()> {
        let mut state = self.state.borrow_mut();
        let id = handle.id();
        let Some(layer) = state.layers.get(&id) else {
            bail!("Unknown layer {id}");
        };
        if !layer.children.is_empty() {
            bail!("Group {id} still has {} children", layer.children.len());
        }
        let parent = layer.parent;
        state.layers.remove(&id);
        if let Some(parent) = parent.and_then(|p| state.layers.get_mut(&p)) {
            parent.children.retain(|c| *c != id);
        }
        state.ops.push(SurfaceOp::Remove { id });
        Ok(())
    }

    fn fit_bounds(&mut self, bounds: Bounds, padding_px: u32) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.fitted = Some(bounds);
        state.ops.push(SurfaceOp::FitBounds { bounds, padding_px });
        Ok(())
    }

    fn set_view(&mut self, center: Point, zoom: u8) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.view = Some((center, zoom));
        state.ops.push(SurfaceOp::SetView { center, zoom });
        Ok(())
    }

    fn drain_events(&mut self) -> Vec<MapEvent> {
        std::mem::take(&mut self.state.borrow_mut().pending)
    }

    fn detach_listeners(&mut self) {
        let mut state = self.state.borrow_mut();
        state.listening = false;
        state.pending.clear();
    }
}

//! Scoped owner of a rendering surface.
//!
//! A [`MapView`] is mounted onto a surface, turns entity collections into
//! layer specs for each channel, and tears everything down when it is
//! unmounted or dropped. Nothing outlives the view: every handle is destroyed
//! and input listeners are detached.

use anyhow::{Context, Result};
use tracing::{debug, info, trace, warn};
use uuid::Uuid;

use crate::config::MapConfig;
use crate::map::overlays::OverlayManager;
use crate::map::popup::{drawing_point_popup, hiker_popup, route_end_popup, route_start_popup};
use crate::map::reconciler::{Channel, DesiredLayers, LayerReconciler, ReconcileReport};
use crate::map::surface::{
    IconKind, LayerSpec, LayerStyle, MapAction, MapEvent, MarkerSpec, RenderSurface,
};
use crate::models::{Group, MapOverlay, Point, Route, MIN_ROUTE_POINTS};
use crate::parser::coordinates::CoordinateParser;
use crate::services::drawing::DrawingSession;

/// Key of the preview line on the drawing channel.
pub const DRAWING_PATH_KEY: &str = "path";

/// Opacity of the markers placed while drawing.
const DRAWING_POINT_OPACITY: f32 = 0.7;

/// Something the view cannot handle itself and hands to the surrounding UI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewRequest {
    /// Switch to a group's chat
    OpenGroupChat {
        /// Group to open
        group_id: String,
    },
}

/// Proof that a search-assist request was issued by a particular mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SuggestionTicket {
    mount_id: Uuid,
}

/// A mounted map: one surface, four reconciled channels.
pub struct MapView<S: RenderSurface> {
    surface: S,
    reconciler: LayerReconciler,
    overlays: OverlayManager,
    config: MapConfig,
    parser: CoordinateParser,
    mount_id: Uuid,
    mounted: bool,
    deferred_requests: Vec<ViewRequest>,
}

impl<S: RenderSurface> MapView<S> {
    /// Takes ownership of a surface and centers it on the default view.
    pub fn mount(mut surface: S, config: &MapConfig, parser: CoordinateParser) -> Result<Self> {
        surface
            .set_view(config.default_center, config.default_zoom)
            .context("Failed to set initial map view")?;

        let mount_id = Uuid::new_v4();
        info!(%mount_id, zoom = config.default_zoom, "Mounted map view");

        Ok(Self {
            surface,
            reconciler: LayerReconciler::new(),
            overlays: OverlayManager::new(config.fit_padding_px),
            config: config.clone(),
            parser,
            mount_id,
            mounted: true,
            deferred_requests: Vec::new(),
        })
    }

    /// The owned surface.
    pub const fn surface(&self) -> &S {
        &self.surface
    }

    /// The layer registry, for inspecting handles.
    pub const fn reconciler(&self) -> &LayerReconciler {
        &self.reconciler
    }

    /// Overlays currently shown.
    pub fn overlays(&self) -> &[MapOverlay] {
        self.overlays.overlays()
    }

    /// Renders saved routes, emphasizing the active one.
    ///
    /// Routes with an empty path are not drawn.
    pub fn sync_routes(
        &mut self,
        routes: &[Route],
        active_route_id: Option<&str>,
    ) -> Result<ReconcileReport> {
        let desired: DesiredLayers = routes
            .iter()
            .filter_map(|route| {
                let active = active_route_id == Some(route.id.as_str());
                route_layer(route, active, self.config.focus_zoom).map(|spec| (route.id.clone(), spec))
            })
            .collect();
        self.reconciler
            .reconcile(&mut self.surface, Channel::Routes, &desired)
    }

    /// Renders the members of the active group. Other groups have no markers.
    ///
    /// A hiker whose coordinates do not parse is left off the map until they do.
    pub fn sync_hikers(&mut self, group: Option<&Group>) -> Result<ReconcileReport> {
        let mut desired = DesiredLayers::new();
        if let Some(group) = group {
            for hiker in &group.hikers {
                let Some(position) = hiker.position(&self.parser) else {
                    trace!(hiker = %hiker.id, coords = %hiker.coords, "Skipping hiker without a position");
                    continue;
                };
                let marker = MarkerSpec {
                    position,
                    icon: IconKind::Hiker,
                    opacity: 1.0,
                    popup: Some(hiker_popup(hiker, group)),
                };
                desired.insert(hiker.id.clone(), LayerSpec::Marker(marker));
            }
        }
        self.reconciler
            .reconcile(&mut self.surface, Channel::Hikers, &desired)
    }

    /// Renders the in-progress drawing: a dashed line and one marker per point.
    pub fn sync_drawing(&mut self, session: &DrawingSession) -> Result<ReconcileReport> {
        let desired = drawing_layers(session.points());
        self.reconciler
            .reconcile(&mut self.surface, Channel::DrawingPreview, &desired)
    }

    /// Shows an overlay, replacing one with the same id.
    pub fn add_overlay(&mut self, overlay: MapOverlay) -> Result<()> {
        self.overlays
            .add_overlay(&mut self.reconciler, &mut self.surface, overlay)
    }

    /// Hides an overlay. Unknown ids are a no-op.
    pub fn remove_overlay(&mut self, id: &str) -> Result<bool> {
        self.overlays
            .remove_overlay(&mut self.reconciler, &mut self.surface, id)
    }

    /// Pans to a point at the focus zoom level.
    pub fn center_on(&mut self, point: Point) -> Result<()> {
        self.surface.set_view(point, self.config.focus_zoom)
    }

    /// Processes pending surface input.
    ///
    /// Clicks add points to `drawing` when a session is active and are ignored
    /// otherwise. Viewport and overlay actions are applied here; anything else
    /// is returned for the caller.
    ///
    /// A failing event does not stop the rest of the batch. The first error is
    /// returned once every event has been tried, and the requests collected
    /// meanwhile are handed out by the next call.
    pub fn handle_events(
        &mut self,
        mut drawing: Option<&mut DrawingSession>,
    ) -> Result<Vec<ViewRequest>> {
        let mut requests = std::mem::take(&mut self.deferred_requests);
        let mut first_error = None;

        for event in self.surface.drain_events() {
            if let Err(e) = self.apply_event(event, drawing.as_deref_mut(), &mut requests) {
                warn!("Failed to handle map event: {e:#}");
                first_error.get_or_insert(e);
            }
        }

        if let Some(e) = first_error {
            self.deferred_requests = requests;
            return Err(e);
        }
        Ok(requests)
    }

    fn apply_event(
        &mut self,
        event: MapEvent,
        drawing: Option<&mut DrawingSession>,
        requests: &mut Vec<ViewRequest>,
    ) -> Result<()> {
        match event {
            MapEvent::Click(point) => match drawing {
                Some(session) => {
                    session.add_point(point);
                    self.sync_drawing(session)?;
                }
                None => trace!(?point, "Ignoring click outside drawing mode"),
            },
            MapEvent::Action(MapAction::CenterOn { point, zoom }) => {
                self.surface.set_view(point, zoom)?;
            }
            MapEvent::Action(MapAction::DismissOverlay { overlay_id }) => {
                self.remove_overlay(&overlay_id)?;
            }
            MapEvent::Action(MapAction::OpenGroupChat { group_id }) => {
                requests.push(ViewRequest::OpenGroupChat { group_id });
            }
        }
        Ok(())
    }

    /// Issues a ticket for a search-assist request made from this mount.
    pub const fn begin_suggestion(&self) -> SuggestionTicket {
        SuggestionTicket {
            mount_id: self.mount_id,
        }
    }

    /// Applies a search-assist result if it belongs to this mount.
    ///
    /// Returns true if an overlay was added. Results carrying a ticket from
    /// another mount are dropped.
    pub fn accept_suggestion(
        &mut self,
        ticket: SuggestionTicket,
        overlay: Option<MapOverlay>,
    ) -> Result<bool> {
        if !self.mounted || ticket.mount_id != self.mount_id {
            debug!(
                ticket = %ticket.mount_id,
                mount = %self.mount_id,
                "Ignoring search suggestion for another map view"
            );
            return Ok(false);
        }
        match overlay {
            Some(overlay) => {
                self.add_overlay(overlay)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Destroys every layer and detaches input listeners.
    pub fn unmount(mut self) -> Result<()> {
        self.teardown()
    }

    fn teardown(&mut self) -> Result<()> {
        if !self.mounted {
            return Ok(());
        }
        self.mounted = false;
        self.surface.detach_listeners();
        let removed = self.reconciler.clear(&mut self.surface)?;
        info!(mount_id = %self.mount_id, removed, "Unmounted map view");
        Ok(())
    }
}

impl<S: RenderSurface> Drop for MapView<S> {
    fn drop(&mut self) {
        if let Err(e) = self.teardown() {
            warn!("Map view teardown failed: {e:#}");
        }
    }
}

/// Composite layer for a route: line, start marker and finish marker.
///
/// Returns `None` for a route without points.
#[must_use]
pub fn route_layer(route: &Route, active: bool, focus_zoom: u8) -> Option<LayerSpec> {
    let start = route.start()?;
    let mut children = Vec::with_capacity(3);

    if route.path().len() >= MIN_ROUTE_POINTS {
        children.push(LayerSpec::Polyline {
            points: route.path().to_vec(),
            style: LayerStyle::route(active),
        });
    }
    children.push(LayerSpec::Marker(MarkerSpec {
        position: start,
        icon: IconKind::Pin,
        opacity: 1.0,
        popup: Some(route_start_popup(route)),
    }));
    if let Some(end) = route.end() {
        children.push(LayerSpec::Marker(MarkerSpec {
            position: end,
            icon: IconKind::Pin,
            opacity: 1.0,
            popup: Some(route_end_popup(route, focus_zoom)),
        }));
    }

    Some(LayerSpec::Group(children))
}

/// Preview layers for points placed so far.
#[must_use]
pub fn drawing_layers(points: &[Point]) -> DesiredLayers {
    let mut desired = DesiredLayers::new();
    if points.is_empty() {
        return desired;
    }

    desired.insert(
        DRAWING_PATH_KEY.to_string(),
        LayerSpec::Polyline {
            points: points.to_vec(),
            style: LayerStyle::drawing_preview(),
        },
    );
    for (index, point) in points.iter().enumerate() {
        let number = index + 1;
        desired.insert(
            format!("point-{number}"),
            LayerSpec::Marker(MarkerSpec {
                position: *point,
                icon: IconKind::Pin,
                opacity: DRAWING_POINT_OPACITY,
                popup: Some(drawing_point_popup(number)),
            }),
        );
    }
    desired
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StatsConfig;
    use crate::map::recording::RecordingSurface;
    use crate::map::surface::LayerKind;
    use crate::models::{Difficulty, Hiker, HikerStatus, NewRoute};
    use crate::services::route_stats::FixedAltitude;

    fn p(lat: f64, lon: f64) -> Point {
        Point::new(lat, lon).unwrap()
    }

    fn route(id: &str, path: Vec<Point>) -> Route {
        Route::new(
            id,
            NewRoute {
                name: id.to_uppercase(),
                location: "Caucasus".to_string(),
                difficulty: Difficulty::Easy,
                route_type: "Trekking".to_string(),
                path,
            },
            &StatsConfig::default(),
            &mut FixedAltitude::new(0.0),
        )
    }

    fn hiker(id: &str, coords: &str) -> Hiker {
        Hiker {
            id: id.to_string(),
            name: id.to_string(),
            status: HikerStatus::OnTrail,
            battery: 90.0,
            coords: coords.to_string(),
            last_update: "just now".to_string(),
            last_update_at: None,
        }
    }

    fn mount(surface: &RecordingSurface) -> MapView<RecordingSurface> {
        MapView::mount(
            surface.clone(),
            &MapConfig::default(),
            CoordinateParser::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_mount_sets_default_view() {
        let surface = RecordingSurface::new();
        let _view = mount(&surface);
        let config = MapConfig::default();
        assert_eq!(
            surface.view(),
            Some((config.default_center, config.default_zoom))
        );
    }

    #[test]
    fn test_route_layers() {
        let surface = RecordingSurface::new();
        let mut view = mount(&surface);
        let routes = vec![
            route("a", vec![p(43.0, 42.0), p(43.1, 42.1)]),
            route("b", vec![p(43.2, 42.2)]),
            route("c", vec![]),
        ];

        let report = view.sync_routes(&routes, Some("a")).unwrap();
        assert_eq!(report.created, 2);
        // a: group + line + two markers, b: group + start marker
        assert_eq!(surface.live_count(), 6);
        assert_eq!(surface.count_kind(LayerKind::Polyline), 1);

        // Switching the active route restyles in place
        let a_group = view.reconciler().handle(Channel::Routes, "a").unwrap().id();
        let report = view.sync_routes(&routes, None).unwrap();
        assert_eq!((report.created, report.updated, report.removed), (0, 1, 0));
        assert_eq!(view.reconciler().handle(Channel::Routes, "a").unwrap().id(), a_group);
    }

    #[test]
    fn test_hiker_markers_follow_active_group() {
        let surface = RecordingSurface::new();
        let mut view = mount(&surface);
        let mut group = Group {
            id: "g".to_string(),
            name: "Group".to_string(),
            route_id: None,
            hikers: vec![hiker("h1", "43.1 42.1"), hiker("h2", "garbage")],
        };

        view.sync_hikers(Some(&group)).unwrap();
        assert_eq!(view.reconciler().ids(Channel::Hikers).len(), 1);

        group.hikers[1].coords = "43.2 42.2".to_string();
        let report = view.sync_hikers(Some(&group)).unwrap();
        assert_eq!((report.created, report.unchanged), (1, 1));

        view.sync_hikers(None).unwrap();
        assert_eq!(view.reconciler().len(Channel::Hikers), 0);
        assert_eq!(surface.live_count(), 0);
    }

    #[test]
    fn test_clicks_feed_drawing_session() {
        let surface = RecordingSurface::new();
        let mut view = mount(&surface);
        let mut session = DrawingSession::new();

        surface.push_event(MapEvent::Click(p(43.0, 42.0)));
        surface.push_event(MapEvent::Click(p(43.1, 42.1)));
        view.handle_events(Some(&mut session)).unwrap();

        assert_eq!(session.len(), 2);
        let ids = view.reconciler().ids(Channel::DrawingPreview);
        assert!(ids.contains("path"));
        assert!(ids.contains("point-1"));
        assert!(ids.contains("point-2"));

        // Without a session clicks are dropped
        surface.push_event(MapEvent::Click(p(43.2, 42.2)));
        view.handle_events(None).unwrap();
        assert_eq!(session.len(), 2);

        session.commit().unwrap();
        view.sync_drawing(&session).unwrap();
        assert_eq!(view.reconciler().len(Channel::DrawingPreview), 0);
    }

    #[test]
    fn test_actions_from_popups() {
        let surface = RecordingSurface::new();
        let mut view = mount(&surface);
        view.add_overlay(MapOverlay::search_area(
            "s",
            vec![p(43.0, 42.0), p(43.1, 42.0), p(43.0, 42.1)],
        ))
        .unwrap();

        surface.push_event(MapEvent::Action(MapAction::DismissOverlay {
            overlay_id: "s".to_string(),
        }));
        surface.push_event(MapEvent::Action(MapAction::CenterOn {
            point: p(43.3, 42.4),
            zoom: 13,
        }));
        surface.push_event(MapEvent::Action(MapAction::OpenGroupChat {
            group_id: "g".to_string(),
        }));
        let requests = view.handle_events(None).unwrap();

        assert!(view.overlays().is_empty());
        assert_eq!(surface.view(), Some((p(43.3, 42.4), 13)));
        assert_eq!(
            requests,
            vec![ViewRequest::OpenGroupChat {
                group_id: "g".to_string()
            }]
        );
    }

    #[test]
    fn test_stale_suggestion_is_ignored() {
        let first_surface = RecordingSurface::new();
        let first = mount(&first_surface);
        let stale = first.begin_suggestion();
        drop(first);

        let surface = RecordingSurface::new();
        let mut view = mount(&surface);
        let overlay = MapOverlay::search_area("s", vec![p(1.0, 1.0), p(2.0, 1.0), p(1.0, 2.0)]);

        assert!(!view.accept_suggestion(stale, Some(overlay.clone())).unwrap());
        assert!(view.overlays().is_empty());

        let ticket = view.begin_suggestion();
        assert!(view.accept_suggestion(ticket, Some(overlay)).unwrap());
        assert_eq!(view.overlays().len(), 1);
    }

    #[test]
    fn test_drop_releases_everything() {
        let surface = RecordingSurface::new();
        {
            let mut view = mount(&surface);
            view.sync_routes(&[route("a", vec![p(43.0, 42.0), p(43.1, 42.1)])], None)
                .unwrap();
            assert!(surface.live_count() > 0);
        }
        assert_eq!(surface.live_count(), 0);
        assert!(!surface.is_listening());
    }

    #[test]
    fn test_explicit_unmount() {
        let surface = RecordingSurface::new();
        let mut view = mount(&surface);
        view.sync_hikers(Some(&Group {
            id: "g".to_string(),
            name: "G".to_string(),
            route_id: None,
            hikers: vec![hiker("h1", "43.1 42.1")],
        }))
        .unwrap();
        view.unmount().unwrap();
        assert_eq!(surface.live_count(), 0);
        assert_eq!(surface.removes(), 1);
    }
}

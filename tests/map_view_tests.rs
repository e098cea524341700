//! End-to-end tests for the map view: drawing, telemetry and search overlays.

use chrono::{DateTime, Utc};
use trailwatch::config::{MapConfig, StatsConfig, TelemetryConfig};
use trailwatch::map::{
    Channel, LayerKind, MapAction, MapEvent, MapView, RecordingSurface, ViewRequest,
};
use trailwatch::models::{Difficulty, MapOverlay, NewRoute};
use trailwatch::parser::CoordinateParser;
use trailwatch::services::route_stats::FixedAltitude;
use trailwatch::services::search_assist::{
    request_search_overlay, SearchAssist, SearchRequest, SearchSuggestion,
};
use trailwatch::services::storage::{MemoryStore, RouteRepository};
use trailwatch::services::telemetry::TelemetrySimulator;
use trailwatch::services::DrawingSession;

mod fixtures;
use fixtures::{p, test_group, test_hiker, test_route, FlakySurface};

fn mount(surface: &RecordingSurface) -> MapView<RecordingSurface> {
    MapView::mount(
        surface.clone(),
        &MapConfig::default(),
        CoordinateParser::default(),
    )
    .unwrap()
}

#[test]
fn test_draw_commit_and_show_route() {
    let surface = RecordingSurface::new();
    let mut view = mount(&surface);
    let mut repo = RouteRepository::load(
        MemoryStore::new(),
        StatsConfig::default(),
        Box::new(FixedAltitude::new(0.0)),
    );
    view.sync_routes(repo.routes(), None).unwrap();
    let seeded = repo.routes().len();

    // Place three points, take one back
    let mut session = DrawingSession::new();
    for point in [p(43.40, 42.50), p(43.41, 42.52), p(43.43, 42.55)] {
        surface.push_event(MapEvent::Click(point));
    }
    view.handle_events(Some(&mut session)).unwrap();
    session.undo();
    view.sync_drawing(&session).unwrap();
    assert_eq!(view.reconciler().len(Channel::DrawingPreview), 3);

    // Hand the drawing to the route form
    let text = session.handoff_text();
    session.commit().unwrap();
    let fields = NewRoute::from_form(
        "Drawn",
        "Baksan",
        Difficulty::Easy,
        "Walk",
        &text,
        &CoordinateParser::default(),
    )
    .unwrap();
    let id = repo.add(fields).unwrap().id.clone();

    view.sync_drawing(&session).unwrap();
    let report = view.sync_routes(repo.routes(), Some(&id)).unwrap();

    assert_eq!(report.created, 1);
    assert_eq!(report.unchanged, seeded);
    assert_eq!(view.reconciler().len(Channel::DrawingPreview), 0);
    assert_eq!(view.reconciler().len(Channel::Routes), seeded + 1);
    assert_eq!(repo.get(&id).unwrap().path().len(), 2);
}

#[test]
fn test_telemetry_ticks_update_markers_in_place() {
    let surface = RecordingSurface::new();
    let mut view = mount(&surface);
    let mut group = test_group(
        "g",
        vec![
            test_hiker("h1", "43.285000° с.ш., 42.459000° в.д."),
            test_hiker("h2", "43.2842° N, 42.4598° E"),
        ],
    );
    view.sync_hikers(Some(&group)).unwrap();
    let before: Vec<u64> = ["h1", "h2"]
        .iter()
        .map(|id| view.reconciler().handle(Channel::Hikers, id).unwrap().id())
        .collect();

    let mut simulator = TelemetrySimulator::new(
        TelemetryConfig {
            seed: 3,
            ..TelemetryConfig::default()
        },
        CoordinateParser::default(),
    );
    for _ in 0..5 {
        let mut hikers = group.hikers.clone();
        simulator.tick(&mut hikers, Utc::now());
        group.apply_telemetry(&hikers);

        let report = view.sync_hikers(Some(&group)).unwrap();
        assert_eq!((report.created, report.removed), (0, 0));
    }

    let after: Vec<u64> = ["h1", "h2"]
        .iter()
        .map(|id| view.reconciler().handle(Channel::Hikers, id).unwrap().id())
        .collect();
    assert_eq!(before, after);
    assert!((group.hikers[0].battery - 74.75).abs() < 1e-9);

    // A hiker leaving the group loses their marker
    group.hikers.retain(|h| h.id != "h2");
    let report = view.sync_hikers(Some(&group)).unwrap();
    assert_eq!(report.removed, 1);
    assert_eq!(surface.count_kind(LayerKind::Marker), 1);
}

struct FixedAssist;

impl SearchAssist for FixedAssist {
    fn suggest_search_areas(&self, _request: &SearchRequest) -> anyhow::Result<SearchSuggestion> {
        Ok(SearchSuggestion {
            suggested_search_areas: "Glacier edge above the hut".to_string(),
            confidence_level: "High".to_string(),
            search_area_polygon: Some(vec![p(43.30, 42.44), p(43.33, 42.44), p(43.31, 42.48)]),
        })
    }
}

#[test]
fn test_search_overlay_flow() {
    let surface = RecordingSurface::new();
    let mut view = mount(&surface);
    let request = SearchRequest {
        last_known_location: "Priut 11".to_string(),
        weather_conditions: "Whiteout".to_string(),
        planned_route: "South route".to_string(),
    };

    let ticket = view.begin_suggestion();
    let now = DateTime::from_timestamp_millis(1_000).unwrap();
    let outcome = request_search_overlay(&FixedAssist, &request, now).unwrap();
    assert!(view.accept_suggestion(ticket, outcome.overlay).unwrap());

    assert_eq!(view.overlays().len(), 1);
    assert_eq!(view.overlays()[0].id, "search-area-1000");
    assert!(surface.fitted_bounds().is_some());

    // Dismissing from the polygon's close control removes it
    surface.push_event(MapEvent::Action(MapAction::DismissOverlay {
        overlay_id: "search-area-1000".to_string(),
    }));
    view.handle_events(None).unwrap();
    assert!(view.overlays().is_empty());
    assert_eq!(surface.count_kind(LayerKind::Polygon), 0);
}

#[test]
fn test_unmount_leaves_surface_empty() {
    let surface = RecordingSurface::new();
    let mut view = mount(&surface);
    view.sync_routes(
        &[
            test_route("a", vec![p(43.0, 42.0), p(43.1, 42.1)]),
            test_route("b", vec![p(43.2, 42.2), p(43.3, 42.3)]),
        ],
        Some("a"),
    )
    .unwrap();
    view.sync_hikers(Some(&test_group("g", vec![test_hiker("h", "43 42")])))
        .unwrap();

    view.unmount().unwrap();
    assert_eq!(surface.live_count(), 0);
    assert!(!surface.is_listening());
}

fn search_area(id: &str, lat: f64) -> MapOverlay {
    MapOverlay::search_area(id, vec![p(lat, 42.0), p(lat + 0.1, 42.0), p(lat + 0.05, 42.1)])
}

fn mount_flaky(surface: &FlakySurface) -> MapView<FlakySurface> {
    MapView::mount(
        surface.clone(),
        &MapConfig::default(),
        CoordinateParser::default(),
    )
    .unwrap()
}

#[test]
fn test_failed_overlay_replacement_keeps_old_overlay() {
    let surface = FlakySurface::new();
    let mut view = mount_flaky(&surface);
    view.add_overlay(search_area("x", 43.0)).unwrap();

    surface.fail_removes();
    assert!(view.add_overlay(search_area("x", 43.5)).is_err());
    assert_eq!(view.overlays().len(), 1);
    assert_eq!(view.overlays()[0].polygon[0], p(43.0, 42.0));
    assert_eq!(view.reconciler().len(Channel::Overlays), 1);
    assert_eq!(surface.recording().live_count(), 1);

    surface.heal();
    view.add_overlay(search_area("x", 43.5)).unwrap();
    assert_eq!(view.overlays()[0].polygon[0], p(43.5, 42.0));
    assert_eq!(surface.recording().count_kind(LayerKind::Polygon), 1);
}

#[test]
fn test_failed_event_does_not_drop_the_rest_of_the_batch() {
    let surface = FlakySurface::new();
    let mut view = mount_flaky(&surface);
    view.add_overlay(search_area("x", 43.0)).unwrap();

    surface.fail_removes();
    let events = surface.recording();
    events.push_event(MapEvent::Action(MapAction::DismissOverlay {
        overlay_id: "x".to_string(),
    }));
    events.push_event(MapEvent::Action(MapAction::OpenGroupChat {
        group_id: "g".to_string(),
    }));
    events.push_event(MapEvent::Action(MapAction::CenterOn {
        point: p(43.3, 42.4),
        zoom: 14,
    }));

    assert!(view.handle_events(None).is_err());
    assert_eq!(events.view(), Some((p(43.3, 42.4), 14)));
    assert_eq!(view.overlays().len(), 1);

    // The chat request survives the failed batch
    surface.heal();
    let requests = view.handle_events(None).unwrap();
    assert_eq!(
        requests,
        vec![ViewRequest::OpenGroupChat {
            group_id: "g".to_string()
        }]
    );

    events.push_event(MapEvent::Action(MapAction::DismissOverlay {
        overlay_id: "x".to_string(),
    }));
    assert!(view.handle_events(None).unwrap().is_empty());
    assert!(view.overlays().is_empty());
    assert_eq!(surface.recording().live_count(), 0);
}

//! Shared test fixtures for integration and CLI tests.
#![allow(dead_code)] // Not every test binary uses every fixture

use std::cell::RefCell;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::rc::Rc;

use anyhow::{bail, Result};
use tempfile::TempDir;
use trailwatch::config::StatsConfig;
use trailwatch::map::{
    LayerHandle, LayerSpec, LayerStyle, MapAction, MapEvent, MarkerSpec, RecordingSurface,
    RenderSurface,
};
use trailwatch::models::{
    Bounds, Difficulty, Group, Hiker, HikerStatus, NewRoute, Point, Route,
};
use trailwatch::services::route_stats::FixedAltitude;

/// Builds a point, panicking on out-of-range input.
pub fn p(lat: f64, lon: f64) -> Point {
    Point::new(lat, lon).expect("test point in range")
}

/// Creates a route with deterministic stats.
pub fn test_route(id: &str, path: Vec<Point>) -> Route {
    Route::new(
        id,
        NewRoute {
            name: format!("Route {id}"),
            location: "Test valley".to_string(),
            difficulty: Difficulty::Medium,
            route_type: "Trekking".to_string(),
            path,
        },
        &StatsConfig::default(),
        &mut FixedAltitude::new(0.0),
    )
}

/// Creates a hiker at an encoded position.
pub fn test_hiker(id: &str, coords: &str) -> Hiker {
    Hiker {
        id: id.to_string(),
        name: format!("Hiker {id}"),
        status: HikerStatus::OnTrail,
        battery: 75.0,
        coords: coords.to_string(),
        last_update: "just now".to_string(),
        last_update_at: None,
    }
}

/// Creates a group with the given hikers.
pub fn test_group(id: &str, hikers: Vec<Hiker>) -> Group {
    Group {
        id: id.to_string(),
        name: format!("Group {id}"),
        route_id: None,
        hikers,
    }
}

/// Path to the trailwatch binary
pub fn trailwatch_bin() -> String {
    std::env::var("CARGO_BIN_EXE_trailwatch")
        .unwrap_or_else(|_| "target/debug/trailwatch".to_string())
}

/// Creates a Command with an isolated config directory.
///
/// The config (and the default data directory under it) lives in `config_dir`,
/// so tests never touch the real user configuration.
pub fn isolated_command(args: &[&str], config_dir: &Path) -> Command {
    let mut cmd = Command::new(trailwatch_bin());
    cmd.env("TRAILWATCH_CONFIG_DIR", config_dir);
    cmd.env_remove("RUST_LOG");
    cmd.args(args);
    cmd
}

/// Writes a file into a temp directory and returns its path.
pub fn write_temp_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).expect("Failed to write temp file");
    path
}

#[derive(Debug, Default)]
struct Faults {
    creates_left: Option<usize>,
    fail_attach: bool,
    fail_remove_all: bool,
    fail_remove_ids: BTreeSet<u64>,
}

/// Recording surface that fails the calls a test asks it to.
///
/// Clones share both the recorded layers and the fault settings, so a test
/// can hand one clone to a `MapView` and steer failures through another.
/// A failed call leaves the surface untouched.
#[derive(Debug, Clone, Default)]
pub struct FlakySurface {
    inner: RecordingSurface,
    faults: Rc<RefCell<Faults>>,
}

impl FlakySurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// The recording underneath, for inspecting live layers.
    pub fn recording(&self) -> &RecordingSurface {
        &self.inner
    }

    /// Lets `n` more creates succeed, then fails every create.
    pub fn fail_creates_after(&self, n: usize) {
        self.faults.borrow_mut().creates_left = Some(n);
    }

    /// Fails every attach to a composite.
    pub fn fail_attaches(&self) {
        self.faults.borrow_mut().fail_attach = true;
    }

    /// Fails every removal.
    pub fn fail_removes(&self) {
        self.faults.borrow_mut().fail_remove_all = true;
    }

    /// Fails removal of one surface id only.
    pub fn fail_remove_of(&self, id: u64) {
        self.faults.borrow_mut().fail_remove_ids.insert(id);
    }

    /// Clears every injected fault.
    pub fn heal(&self) {
        *self.faults.borrow_mut() = Faults::default();
    }

    fn check_create(&self) -> Result<()> {
        let mut faults = self.faults.borrow_mut();
        match faults.creates_left.as_mut() {
            Some(0) => bail!("Injected create failure"),
            Some(left) => {
                *left -= 1;
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl RenderSurface for FlakySurface {
    fn create_marker(&mut self, marker: &MarkerSpec) -> Result<LayerHandle> {
        self.check_create()?;
        self.inner.create_marker(marker)
    }

    fn create_polyline(&mut self, points: &[Point], style: &LayerStyle) -> Result<LayerHandle> {
        self.check_create()?;
        self.inner.create_polyline(points, style)
    }

    fn create_polygon(
        &mut self,
        points: &[Point],
        style: &LayerStyle,
        dismiss: Option<&MapAction>,
    ) -> Result<LayerHandle> {
        self.check_create()?;
        self.inner.create_polygon(points, style, dismiss)
    }

    fn create_group(&mut self) -> Result<LayerHandle> {
        self.check_create()?;
        self.inner.create_group()
    }

    fn attach_to_group(&mut self, group: &LayerHandle, child: &LayerHandle) -> Result<()> {
        if self.faults.borrow().fail_attach {
            bail!("Injected attach failure");
        }
        self.inner.attach_to_group(group, child)
    }

    fn update_layer(&mut self, handle: &LayerHandle, spec: &LayerSpec) -> Result<()> {
        self.inner.update_layer(handle, spec)
    }

    fn remove_layer(&mut self, handle: &LayerHandle) -> Result<()> {
        {
            let faults = self.faults.borrow();
            if faults.fail_remove_all || faults.fail_remove_ids.contains(&handle.id()) {
                bail!("Injected remove failure for layer {}", handle.id());
            }
        }
        self.inner.remove_layer(handle)
    }

    fn fit_bounds(&mut self, bounds: Bounds, padding_px: u32) -> Result<()> {
        self.inner.fit_bounds(bounds, padding_px)
    }

    fn set_view(&mut self, center: Point, zoom: u8) -> Result<()> {
        self.inner.set_view(center, zoom)
    }

    fn drain_events(&mut self) -> Vec<MapEvent> {
        self.inner.drain_events()
    }

    fn detach_listeners(&mut self) {
        self.inner.detach_listeners();
    }
}

//! Key/value persistence for routes and groups.
//!
//! Values are stored as JSON under fixed keys. Read failures never abort: the
//! repositories log a warning and fall back to the built-in defaults.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::config::{write_atomic, StatsConfig};
use crate::constants::{GROUPS_STORAGE_KEY, ROUTES_STORAGE_KEY};
use crate::models::{Group, Hiker, NewRoute, Route};
use crate::services::route_stats::AltitudeModel;
use crate::services::seed;

/// A minimal JSON key/value store.
pub trait Store {
    /// Reads a value. `Ok(None)` means the key was never written.
    fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Writes a value, replacing any previous one.
    fn set(&mut self, key: &str, value: &Value) -> Result<()>;
}

/// In-memory store, used by tests and dry runs.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    values: BTreeMap<String, Value>,
}

impl MemoryStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl Store for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &Value) -> Result<()> {
        self.values.insert(key.to_string(), value.clone());
        Ok(())
    }
}

/// Store keeping one pretty-printed JSON file per key in a directory.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Creates a store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Root directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// File backing a key.
    pub fn path_for(&self, key: &str) -> Result<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            bail!("Invalid storage key '{}': use letters, digits, '-' or '_'", key);
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl Store for JsonFileStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        let path = self.path_for(key)?;
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let value = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse JSON in {}", path.display()))?;
        Ok(Some(value))
    }

    fn set(&mut self, key: &str, value: &Value) -> Result<()> {
        let path = self.path_for(key)?;
        let content = serde_json::to_string_pretty(value).context("Failed to serialize value")?;
        write_atomic(&path, &content)
    }
}

/// Reads a list under `key`, seeding `defaults` when the key is absent.
///
/// Unreadable or malformed data falls back to `defaults` without overwriting
/// what is stored.
fn load_or_seed<S, T>(store: &mut S, key: &str, defaults: impl FnOnce() -> Vec<T>) -> Vec<T>
where
    S: Store,
    T: Serialize + DeserializeOwned,
{
    match store.get(key) {
        Ok(Some(value)) => match serde_json::from_value(value) {
            Ok(items) => items,
            Err(e) => {
                warn!(key, "Stored data is malformed, using defaults: {e}");
                defaults()
            }
        },
        Ok(None) => {
            let items = defaults();
            match serde_json::to_value(&items) {
                Ok(value) => match store.set(key, &value) {
                    Ok(()) => info!(key, count = items.len(), "Seeded default data"),
                    Err(e) => warn!(key, "Failed to store default data: {e:#}"),
                },
                Err(e) => warn!(key, "Failed to serialize default data: {e}"),
            }
            items
        }
        Err(e) => {
            warn!(key, "Failed to load stored data, using defaults: {e:#}");
            defaults()
        }
    }
}

fn persist<S: Store, T: Serialize>(store: &mut S, key: &str, items: &[T]) -> Result<()> {
    let value = serde_json::to_value(items).context("Failed to serialize data")?;
    store
        .set(key, &value)
        .with_context(|| format!("Failed to save '{key}'"))?;
    debug!(key, count = items.len(), "Saved data");
    Ok(())
}

/// Picks `{prefix}-{millis}`, bumping the number until it is unused.
fn unique_id(prefix: &str, now: DateTime<Utc>, taken: impl Fn(&str) -> bool) -> String {
    let mut millis = now.timestamp_millis();
    loop {
        let id = format!("{prefix}-{millis}");
        if !taken(&id) {
            return id;
        }
        millis += 1;
    }
}

/// Saved routes, backed by a [`Store`].
pub struct RouteRepository<S: Store> {
    store: S,
    routes: Vec<Route>,
    stats: StatsConfig,
    altitude: Box<dyn AltitudeModel>,
}

impl<S: Store> RouteRepository<S> {
    /// Loads routes from the store, seeding the defaults on first use.
    pub fn load(mut store: S, stats: StatsConfig, mut altitude: Box<dyn AltitudeModel>) -> Self {
        let routes = load_or_seed(&mut store, ROUTES_STORAGE_KEY, || {
            seed::default_routes(&stats, altitude.as_mut())
        });
        Self {
            store,
            routes,
            stats,
            altitude,
        }
    }

    /// All routes, in insertion order.
    #[must_use]
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Looks up a route by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Route> {
        self.routes.iter().find(|r| r.id == id)
    }

    /// Creates a route with a fresh id and saves.
    pub fn add(&mut self, fields: NewRoute) -> Result<&Route> {
        self.add_at(fields, Utc::now())
    }

    /// Creates a route whose id derives from `now` and saves.
    pub fn add_at(&mut self, fields: NewRoute, now: DateTime<Utc>) -> Result<&Route> {
        let id = unique_id("route", now, |id| self.get(id).is_some());
        let route = Route::new(id, fields, &self.stats, self.altitude.as_mut());
        info!(id = %route.id, name = %route.name, "Adding route");
        self.routes.push(route);
        self.save()?;

        let last = self.routes.len() - 1;
        Ok(&self.routes[last])
    }

    /// Replaces a route's fields, recomputing its stats, and saves.
    pub fn update(&mut self, id: &str, fields: NewRoute) -> Result<&Route> {
        let Some(index) = self.routes.iter().position(|r| r.id == id) else {
            bail!("Route '{}' not found", id);
        };
        self.routes[index].apply(fields, &self.stats, self.altitude.as_mut());
        self.save()?;
        Ok(&self.routes[index])
    }

    /// Deletes a route and saves. Returns false for an unknown id.
    pub fn delete(&mut self, id: &str) -> Result<bool> {
        let before = self.routes.len();
        self.routes.retain(|r| r.id != id);
        if self.routes.len() == before {
            return Ok(false);
        }
        info!(id, "Deleted route");
        self.save()?;
        Ok(true)
    }

    fn save(&mut self) -> Result<()> {
        persist(&mut self.store, ROUTES_STORAGE_KEY, &self.routes)
    }
}

/// Hiking groups, backed by a [`Store`].
pub struct GroupRepository<S: Store> {
    store: S,
    groups: Vec<Group>,
}

impl<S: Store> GroupRepository<S> {
    /// Loads groups from the store, seeding the demo group on first use.
    pub fn load(mut store: S) -> Self {
        let groups = load_or_seed(&mut store, GROUPS_STORAGE_KEY, seed::default_groups);
        Self { store, groups }
    }

    /// All groups, in insertion order.
    #[must_use]
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Looks up a group by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Group> {
        self.groups.iter().find(|g| g.id == id)
    }

    /// Creates a group with a fresh id and saves.
    pub fn add(
        &mut self,
        name: impl Into<String>,
        route_id: Option<String>,
        hikers: Vec<Hiker>,
    ) -> Result<&Group> {
        self.add_at(name, route_id, hikers, Utc::now())
    }

    /// Creates a group whose id derives from `now` and saves.
    ///
    /// Hikers with a duplicate id are dropped.
    pub fn add_at(
        &mut self,
        name: impl Into<String>,
        route_id: Option<String>,
        hikers: Vec<Hiker>,
        now: DateTime<Utc>,
    ) -> Result<&Group> {
        let id = unique_id("group", now, |id| self.get(id).is_some());
        let mut group = Group {
            id,
            name: name.into(),
            route_id,
            hikers: Vec::with_capacity(hikers.len()),
        };
        for hiker in hikers {
            let hiker_id = hiker.id.clone();
            if !group.add_hiker(hiker) {
                warn!(group = %group.id, hiker = %hiker_id, "Dropping duplicate hiker");
            }
        }
        info!(id = %group.id, "Adding group");
        self.groups.push(group);
        self.save()?;

        let last = self.groups.len() - 1;
        Ok(&self.groups[last])
    }

    /// Points a group at a route (or clears it) and saves.
    ///
    /// Returns false for an unknown group id.
    pub fn set_active_route(&mut self, group_id: &str, route_id: Option<String>) -> Result<bool> {
        let Some(group) = self.groups.iter_mut().find(|g| g.id == group_id) else {
            return Ok(false);
        };
        group.route_id = route_id;
        self.save()?;
        Ok(true)
    }

    /// Deletes a group and saves. Returns false for an unknown id.
    pub fn delete(&mut self, id: &str) -> Result<bool> {
        let before = self.groups.len();
        self.groups.retain(|g| g.id != id);
        if self.groups.len() == before {
            return Ok(false);
        }
        self.save()?;
        Ok(true)
    }

    /// Merges simulated hiker updates into every group, matched by hiker id.
    ///
    /// Telemetry is live state and is not saved.
    pub fn apply_telemetry(&mut self, simulated: &[Hiker]) {
        if simulated.is_empty() {
            return;
        }
        for group in &mut self.groups {
            group.apply_telemetry(simulated);
        }
    }

    fn save(&mut self) -> Result<()> {
        persist(&mut self.store, GROUPS_STORAGE_KEY, &self.groups)
    }
}

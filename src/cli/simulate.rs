//! `trailwatch simulate`: run the telemetry simulation headlessly.
//!
//! Mounts a map view on an in-memory surface, then on every tick moves the
//! group's hikers and reconciles their markers, reporting what changed.

use std::time::Duration;

use chrono::Utc;
use clap::Args;
use serde::Serialize;
use tracing::info;

use crate::cli::common::{load_config, open_store, parser, print_json, CliError, CliResult};
use crate::config::Config;
use crate::map::{Channel, MapView, RecordingSurface};
use crate::services::route_stats::SeededAltitude;
use crate::services::storage::{GroupRepository, RouteRepository};
use crate::services::telemetry::TelemetrySimulator;

/// Simulate hiker telemetry and reconcile the map after every update
#[derive(Debug, Clone, Args)]
pub struct SimulateArgs {
    /// Number of updates to run
    #[arg(long, default_value_t = 3)]
    pub ticks: u32,

    /// Group to simulate (default: first group)
    #[arg(long, value_name = "ID")]
    pub group: Option<String>,

    /// Do not wait between updates
    #[arg(long)]
    pub fast: bool,

    /// Print a JSON summary instead of text
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct TickSummary {
    tick: u32,
    created: usize,
    updated: usize,
    unchanged: usize,
    removed: usize,
    markers: usize,
}

#[derive(Debug, Serialize)]
struct HikerSummary {
    id: String,
    name: String,
    coords: String,
    battery: f64,
}

#[derive(Debug, Serialize)]
struct SimulationOutput {
    group: String,
    ticks: Vec<TickSummary>,
    hikers: Vec<HikerSummary>,
    live_layers_after_unmount: usize,
}

impl SimulateArgs {
    /// Execute the simulate command on a current-thread runtime
    pub fn execute(&self) -> CliResult<()> {
        let config = load_config()?;
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .map_err(|e| CliError::io(format!("Failed to start runtime: {e}")))?;
        runtime.block_on(self.run(&config))
    }

    async fn run(&self, config: &Config) -> CliResult<()> {
        let mut groups = GroupRepository::load(open_store(config)?);
        let routes = RouteRepository::load(
            open_store(config)?,
            config.stats.clone(),
            Box::new(SeededAltitude::new(config.stats.altitude_seed)),
        );

        let group_id = match &self.group {
            Some(id) => id.clone(),
            None => groups
                .groups()
                .first()
                .map(|g| g.id.clone())
                .ok_or_else(|| CliError::validation("No groups to simulate"))?,
        };
        let Some(group) = groups.get(&group_id) else {
            return Err(CliError::validation(format!("Group '{group_id}' not found")));
        };
        let active_route = group.route_id.clone();

        let surface = RecordingSurface::new();
        let mut view = MapView::mount(surface.clone(), &config.map, parser(config))
            .map_err(|e| CliError::io(format!("{e:#}")))?;
        view.sync_routes(routes.routes(), active_route.as_deref())
            .map_err(|e| CliError::io(format!("{e:#}")))?;
        view.sync_hikers(Some(group))
            .map_err(|e| CliError::io(format!("{e:#}")))?;

        let mut simulator = TelemetrySimulator::new(config.telemetry.clone(), parser(config));
        let mut interval = tokio::time::interval(Duration::from_secs(config.telemetry.interval_secs.max(1)));
        // The first tick of an interval completes immediately
        interval.tick().await;

        let mut ticks = Vec::new();
        for tick in 1..=self.ticks {
            if !self.fast {
                interval.tick().await;
            }

            let mut hikers = groups
                .get(&group_id)
                .map(|g| g.hikers.clone())
                .unwrap_or_default();
            simulator.tick(&mut hikers, Utc::now());
            groups.apply_telemetry(&hikers);

            let report = view
                .sync_hikers(groups.get(&group_id))
                .map_err(|e| CliError::io(format!("{e:#}")))?;
            let markers = view.reconciler().len(Channel::Hikers);
            info!(tick, updated = report.updated, markers, "Telemetry tick");

            if !self.json {
                println!(
                    "tick {tick}: {} created, {} updated, {} unchanged, {} removed ({markers} markers)",
                    report.created, report.updated, report.unchanged, report.removed
                );
            }
            ticks.push(TickSummary {
                tick,
                created: report.created,
                updated: report.updated,
                unchanged: report.unchanged,
                removed: report.removed,
                markers,
            });
        }

        view.unmount().map_err(|e| CliError::io(format!("{e:#}")))?;

        let hikers: Vec<HikerSummary> = groups
            .get(&group_id)
            .map(|g| {
                g.hikers
                    .iter()
                    .map(|h| HikerSummary {
                        id: h.id.clone(),
                        name: h.name.clone(),
                        coords: h.coords.clone(),
                        battery: h.battery,
                    })
                    .collect()
            })
            .unwrap_or_default();

        if self.json {
            return print_json(&SimulationOutput {
                group: group_id,
                ticks,
                hikers,
                live_layers_after_unmount: surface.live_count(),
            });
        }

        for hiker in &hikers {
            println!("{:<12} {:<10} {:>6}%  {}", hiker.id, hiker.name, hiker.battery, hiker.coords);
        }
        Ok(())
    }
}

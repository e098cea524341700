//! `trailwatch stats`: distance, time and altitude for a path.

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use crate::cli::common::{load_config, parser, print_json, read_input, CliError, CliResult};
use crate::models::MIN_ROUTE_POINTS;
use crate::services::route_stats::{compute_stats_with, SeededAltitude};

/// Compute route statistics for a path
#[derive(Debug, Clone, Args)]
pub struct StatsArgs {
    /// File with one coordinate pair per line ('-' for stdin)
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Inline coordinate text ('\n' separates lines)
    #[arg(long, value_name = "TEXT")]
    pub text: Option<String>,

    /// Seed for the altitude estimate (overrides config; 0 = random)
    #[arg(long, value_name = "N")]
    pub seed: Option<u64>,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct StatsOutput {
    points: usize,
    distance_km: f64,
    altitude_m: u64,
    total_hours: f64,
    distance: String,
    time: String,
    altitude: String,
}

impl StatsArgs {
    /// Execute the stats command
    pub fn execute(&self) -> CliResult<()> {
        let config = load_config()?;
        let input = read_input(self.text.as_deref(), self.file.as_deref())?;
        let path = parser(&config).parse_path(&input);

        if path.len() < MIN_ROUTE_POINTS {
            return Err(CliError::validation(format!(
                "Need at least {} valid points to compute stats, found {}",
                MIN_ROUTE_POINTS,
                path.len()
            )));
        }

        let seed = self.seed.unwrap_or(config.stats.altitude_seed);
        let stats = compute_stats_with(&path, &config.stats, &mut SeededAltitude::new(seed));

        if self.json {
            return print_json(&StatsOutput {
                points: path.len(),
                distance_km: stats.distance_km,
                altitude_m: stats.altitude_m,
                total_hours: stats.total_hours,
                distance: stats.distance_label(),
                time: stats.time_label.clone(),
                altitude: stats.altitude_label(),
            });
        }

        println!("Points:   {}", path.len());
        println!("Distance: {}", stats.distance_label());
        println!("Time:     {}", stats.time_label);
        println!("Altitude: {}", stats.altitude_label());
        Ok(())
    }
}

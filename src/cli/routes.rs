//! `trailwatch routes`: manage saved routes.

use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::cli::common::{load_config, open_store, parser, print_json, read_input, CliError, CliResult};
use crate::config::Config;
use crate::models::{Difficulty, NewRoute, Route};
use crate::services::drawing::DrawingSession;
use crate::services::route_stats::SeededAltitude;
use crate::services::storage::{JsonFileStore, RouteRepository};

/// Manage saved routes
#[derive(Debug, Args)]
pub struct RoutesArgs {
    #[command(subcommand)]
    command: RoutesCommand,
}

#[derive(Debug, Subcommand)]
enum RoutesCommand {
    /// List saved routes
    List(ListArgs),
    /// Show one route with its path
    Show(ShowArgs),
    /// Create a route from coordinate text
    Add(AddArgs),
    /// Create a route by replaying map clicks
    Draw(DrawArgs),
    /// Delete a route
    Delete(DeleteArgs),
}

/// List saved routes
#[derive(Debug, Args)]
pub struct ListArgs {
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Show one route
#[derive(Debug, Args)]
pub struct ShowArgs {
    /// Route id
    id: String,

    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Fields shared by `add` and `draw`
#[derive(Debug, Args)]
pub struct RouteFieldArgs {
    /// Route name
    #[arg(long)]
    name: String,

    /// Location label
    #[arg(long, default_value = "")]
    location: String,

    /// Difficulty (easy, medium, hard, very-hard)
    #[arg(long, default_value = "medium")]
    difficulty: String,

    /// Route type (e.g., Trekking, Ascent)
    #[arg(long = "type", default_value = "Trekking")]
    route_type: String,
}

/// Create a route from coordinate text
#[derive(Debug, Args)]
pub struct AddArgs {
    #[command(flatten)]
    fields: RouteFieldArgs,

    /// File with one coordinate pair per line ('-' for stdin)
    #[arg(long, value_name = "FILE")]
    coords_file: Option<PathBuf>,

    /// Inline coordinate text ('\n' separates lines)
    #[arg(long, value_name = "TEXT")]
    coords: Option<String>,
}

/// Create a route by replaying clicks.
///
/// Each input line is a clicked coordinate pair, or one of the commands
/// `undo` and `reset`.
#[derive(Debug, Args)]
pub struct DrawArgs {
    #[command(flatten)]
    fields: RouteFieldArgs,

    /// File with one click per line ('-' for stdin)
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Inline clicks ('\n' separates lines)
    #[arg(long, value_name = "TEXT")]
    text: Option<String>,
}

/// Delete a route
#[derive(Debug, Args)]
pub struct DeleteArgs {
    /// Route id
    id: String,
}

impl RoutesArgs {
    /// Execute routes subcommand
    pub fn execute(&self) -> CliResult<()> {
        let config = load_config()?;
        let mut repo = open_repository(&config)?;

        match &self.command {
            RoutesCommand::List(args) => args.execute(&repo),
            RoutesCommand::Show(args) => args.execute(&repo),
            RoutesCommand::Add(args) => args.execute(&config, &mut repo),
            RoutesCommand::Draw(args) => args.execute(&config, &mut repo),
            RoutesCommand::Delete(args) => args.execute(&mut repo),
        }
    }
}

fn open_repository(config: &Config) -> CliResult<RouteRepository<JsonFileStore>> {
    let store = open_store(config)?;
    Ok(RouteRepository::load(
        store,
        config.stats.clone(),
        Box::new(SeededAltitude::new(config.stats.altitude_seed)),
    ))
}

impl ListArgs {
    fn execute(&self, repo: &RouteRepository<JsonFileStore>) -> CliResult<()> {
        if self.json {
            return print_json(&repo.routes());
        }

        if repo.routes().is_empty() {
            println!("No saved routes.");
            return Ok(());
        }
        for route in repo.routes() {
            println!(
                "{:<28} {:<30} {:<10} {:>10} {:>8} {:>8}",
                route.id,
                route.name,
                route.difficulty,
                route.distance(),
                route.time(),
                route.altitude()
            );
        }
        Ok(())
    }
}

impl ShowArgs {
    fn execute(&self, repo: &RouteRepository<JsonFileStore>) -> CliResult<()> {
        let route = repo
            .get(&self.id)
            .ok_or_else(|| CliError::validation(format!("Route '{}' not found", self.id)))?;

        if self.json {
            return print_json(route);
        }
        print_route(route);
        Ok(())
    }
}

impl RouteFieldArgs {
    fn difficulty(&self) -> CliResult<Difficulty> {
        self.difficulty
            .parse()
            .map_err(|e| CliError::validation(format!("{e}")))
    }

    fn to_new_route(&self, config: &Config, coords_text: &str) -> CliResult<NewRoute> {
        NewRoute::from_form(
            self.name.as_str(),
            self.location.as_str(),
            self.difficulty()?,
            self.route_type.as_str(),
            coords_text,
            &parser(config),
        )
        .map_err(|e| CliError::validation(format!("{e}")))
    }
}

impl AddArgs {
    fn execute(
        &self,
        config: &Config,
        repo: &mut RouteRepository<JsonFileStore>,
    ) -> CliResult<()> {
        let text = read_input(self.coords.as_deref(), self.coords_file.as_deref())?;
        let fields = self.fields.to_new_route(config, &text)?;
        let route = repo
            .add(fields)
            .map_err(|e| CliError::io(format!("{e:#}")))?;
        println!("Created route {}", route.id);
        print_route(route);
        Ok(())
    }
}

impl DrawArgs {
    fn execute(
        &self,
        config: &Config,
        repo: &mut RouteRepository<JsonFileStore>,
    ) -> CliResult<()> {
        let input = read_input(self.text.as_deref(), self.file.as_deref())?;
        let parser = parser(config);
        let mut session = DrawingSession::new();

        for (number, line) in input.lines().enumerate() {
            let line = line.trim();
            match line {
                "" => {}
                "undo" => {
                    session.undo();
                }
                "reset" => session.reset(),
                _ => match parser.parse_pair(line) {
                    Some(point) => session.add_point(point),
                    None => {
                        return Err(CliError::validation(format!(
                            "Line {}: '{}' is not a coordinate pair",
                            number + 1,
                            line
                        )))
                    }
                },
            }
        }

        // Commit empties the session
        let handoff = session.handoff_text();
        session
            .commit()
            .map_err(|e| CliError::validation(e.to_string()))?;

        let fields = self.fields.to_new_route(config, &handoff)?;
        let route = repo
            .add(fields)
            .map_err(|e| CliError::io(format!("{e:#}")))?;
        println!("Created route {}", route.id);
        print_route(route);
        Ok(())
    }
}

impl DeleteArgs {
    fn execute(&self, repo: &mut RouteRepository<JsonFileStore>) -> CliResult<()> {
        let deleted = repo
            .delete(&self.id)
            .map_err(|e| CliError::io(format!("{e:#}")))?;
        if !deleted {
            return Err(CliError::validation(format!(
                "Route '{}' not found",
                self.id
            )));
        }
        println!("Deleted route {}", self.id);
        Ok(())
    }
}

fn print_route(route: &Route) {
    println!("Name:       {}", route.name);
    println!("Location:   {}", route.location);
    println!("Difficulty: {}", route.difficulty);
    println!("Type:       {}", route.route_type);
    println!("Start:      {}", route.start_coordinates());
    println!("Distance:   {}", route.distance());
    println!("Time:       {}", route.time());
    println!("Altitude:   {}", route.altitude());
    println!("Points:     {}", route.path().len());
}

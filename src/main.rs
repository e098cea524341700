//! Trailwatch - headless hiking-group tracker
//!
//! Parses coordinates, computes route statistics, manages saved routes and
//! runs the hiker telemetry simulation against an in-memory map surface.

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trailwatch::cli::{self, CliResult, ExitCode};
use trailwatch::constants::{APP_BINARY_NAME, APP_NAME};

/// Trailwatch - hiking-group tracker engine
#[derive(Parser, Debug)]
#[command(name = APP_BINARY_NAME, author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Parse coordinate text into points
    Parse(cli::ParseArgs),
    /// Compute distance, time and altitude for a path
    Stats(cli::StatsArgs),
    /// Manage saved routes
    Routes(cli::RoutesArgs),
    /// Simulate hiker telemetry against the map
    #[cfg(feature = "simulate")]
    Simulate(cli::SimulateArgs),
    /// Manage configuration
    Config(cli::ConfigArgs),
}

impl Commands {
    fn execute(&self) -> CliResult<()> {
        match self {
            Self::Parse(args) => args.execute(),
            Self::Stats(args) => args.execute(),
            Self::Routes(args) => args.execute(),
            #[cfg(feature = "simulate")]
            Self::Simulate(args) => args.execute(),
            Self::Config(args) => args.execute(),
        }
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize tracing; RUST_LOG wins over --verbose
    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    tracing::debug!("{} v{}", APP_NAME, env!("CARGO_PKG_VERSION"));

    let code = match cli.command.execute() {
        Ok(()) => ExitCode::Success,
        Err(e) => {
            eprintln!("Error: {e}");
            e.exit_code()
        }
    };
    std::process::exit(code.code());
}

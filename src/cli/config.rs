//! Configuration management CLI commands.

use clap::{Args, Subcommand};

use crate::cli::common::{load_config, print_json, CliError, CliResult};
use crate::config::Config;

/// Configuration management commands
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    command: ConfigCommand,
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Display current configuration
    Show(ConfigShowArgs),
    /// Print the configuration file path
    Path,
    /// Write a configuration file with default values
    Init(ConfigInitArgs),
}

/// Display current configuration
#[derive(Args, Debug)]
pub struct ConfigShowArgs {
    /// Output as JSON
    #[arg(long)]
    json: bool,
}

/// Write a default configuration file
#[derive(Args, Debug)]
pub struct ConfigInitArgs {
    /// Overwrite an existing file
    #[arg(long)]
    force: bool,
}

impl ConfigArgs {
    /// Execute config subcommand
    pub fn execute(&self) -> CliResult<()> {
        match &self.command {
            ConfigCommand::Show(args) => args.execute(),
            ConfigCommand::Path => {
                let path = Config::config_file_path()
                    .map_err(|e| CliError::io(format!("Failed to resolve config path: {e:#}")))?;
                println!("{}", path.display());
                Ok(())
            }
            ConfigCommand::Init(args) => args.execute(),
        }
    }
}

impl ConfigShowArgs {
    /// Execute show command
    pub fn execute(&self) -> CliResult<()> {
        let config = load_config()?;

        if self.json {
            return print_json(&config);
        }

        let toml = toml::to_string_pretty(&config)
            .map_err(|e| CliError::io(format!("Failed to serialize configuration: {e}")))?;
        print!("{toml}");
        Ok(())
    }
}

impl ConfigInitArgs {
    /// Execute init command
    pub fn execute(&self) -> CliResult<()> {
        if Config::exists() && !self.force {
            return Err(CliError::validation(
                "Configuration file already exists (use --force to overwrite)",
            ));
        }

        Config::new()
            .save()
            .map_err(|e| CliError::io(format!("Failed to save configuration: {e:#}")))?;

        let path = Config::config_file_path()
            .map_err(|e| CliError::io(format!("Failed to resolve config path: {e:#}")))?;
        println!("Wrote default configuration to {}", path.display());
        Ok(())
    }
}

//! Shared CLI plumbing: error type, exit codes and input helpers.

use std::fmt;
use std::fs;
use std::io::Read;
use std::path::Path;

use serde::Serialize;

use crate::config::Config;
use crate::parser::coordinates::CoordinateParser;
use crate::services::storage::JsonFileStore;

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    /// Command succeeded
    Success = 0,
    /// Invalid input or arguments
    Validation = 1,
    /// I/O or unexpected failure
    Io = 2,
}

impl ExitCode {
    /// Numeric code passed to the OS.
    #[must_use]
    pub const fn code(self) -> i32 {
        self as i32
    }
}

/// Category of a CLI failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliErrorKind {
    /// Bad input from the user
    Validation,
    /// Filesystem or serialization failure
    Io,
}

/// Error returned by command handlers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliError {
    /// Failure category
    pub kind: CliErrorKind,
    /// Message for stderr
    pub message: String,
}

impl CliError {
    /// Creates a validation error (exit code 1).
    pub fn validation(message: impl Into<String>) -> Self {
        Self {
            kind: CliErrorKind::Validation,
            message: message.into(),
        }
    }

    /// Creates an I/O error (exit code 2).
    pub fn io(message: impl Into<String>) -> Self {
        Self {
            kind: CliErrorKind::Io,
            message: message.into(),
        }
    }

    /// Exit code for this error.
    #[must_use]
    pub const fn exit_code(&self) -> ExitCode {
        match self.kind {
            CliErrorKind::Validation => ExitCode::Validation,
            CliErrorKind::Io => ExitCode::Io,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

/// Result type for command handlers.
pub type CliResult<T> = Result<T, CliError>;

/// Loads the configuration, reporting a broken file as a validation error.
pub fn load_config() -> CliResult<Config> {
    Config::load().map_err(|e| CliError::validation(format!("Failed to load configuration: {e:#}")))
}

/// Opens the route/group store configured for this user.
pub fn open_store(config: &Config) -> CliResult<JsonFileStore> {
    let dir = config
        .storage
        .resolve_data_dir()
        .map_err(|e| CliError::io(format!("Failed to resolve data directory: {e:#}")))?;
    Ok(JsonFileStore::new(dir))
}

/// Builds a coordinate parser from the configured suffix table.
pub fn parser(config: &Config) -> CoordinateParser {
    CoordinateParser::new(&config.parser)
}

/// Reads coordinate text from `--text`, a file, or stdin (`-`).
pub fn read_input(text: Option<&str>, file: Option<&Path>) -> CliResult<String> {
    match (text, file) {
        (Some(_), Some(_)) => Err(CliError::validation(
            "Pass either --text or a file, not both",
        )),
        (Some(text), None) => Ok(text.replace("\\n", "\n")),
        (None, Some(path)) if path == Path::new("-") => {
            let mut buffer = String::new();
            std::io::stdin()
                .read_to_string(&mut buffer)
                .map_err(|e| CliError::io(format!("Failed to read stdin: {e}")))?;
            Ok(buffer)
        }
        (None, Some(path)) => fs::read_to_string(path)
            .map_err(|e| CliError::io(format!("Failed to read {}: {e}", path.display()))),
        (None, None) => Err(CliError::validation(
            "No input: pass a file, '-' for stdin, or --text",
        )),
    }
}

/// Prints a value as pretty JSON.
pub fn print_json<T: Serialize>(value: &T) -> CliResult<()> {
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| CliError::io(format!("Failed to serialize JSON: {e}")))?;
    println!("{json}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes() {
        assert_eq!(CliError::validation("x").exit_code().code(), 1);
        assert_eq!(CliError::io("x").exit_code().code(), 2);
        assert_eq!(ExitCode::Success.code(), 0);
    }

    #[test]
    fn test_read_input_text_expands_escaped_newlines() {
        let text = read_input(Some("1 1\\n2 2"), None).unwrap();
        assert_eq!(text, "1 1\n2 2");
    }

    #[test]
    fn test_read_input_requires_one_source() {
        assert!(read_input(None, None).is_err());
        assert!(read_input(Some("1 1"), Some(Path::new("f"))).is_err());
    }
}

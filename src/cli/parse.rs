//! `trailwatch parse`: decode coordinate text into points.

use std::path::PathBuf;

use clap::Args;
use serde::Serialize;

use crate::cli::common::{load_config, parser, print_json, read_input, CliResult};
use crate::models::Point;
use crate::parser::coordinates::format_pair;

/// Parse coordinate lines and print the points that were understood
#[derive(Debug, Clone, Args)]
pub struct ParseArgs {
    /// File with one coordinate pair per line ('-' for stdin)
    #[arg(value_name = "FILE")]
    pub file: Option<PathBuf>,

    /// Inline coordinate text ('\n' separates lines)
    #[arg(long, value_name = "TEXT")]
    pub text: Option<String>,

    /// Output results as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Debug, Serialize)]
struct ParseOutput {
    points: Vec<Point>,
    skipped: usize,
}

impl ParseArgs {
    /// Execute the parse command
    pub fn execute(&self) -> CliResult<()> {
        let config = load_config()?;
        let parser = parser(&config);
        let input = read_input(self.text.as_deref(), self.file.as_deref())?;

        let mut points = Vec::new();
        let mut skipped = 0;
        for line in input.lines().filter(|l| !l.trim().is_empty()) {
            match parser.parse_pair(line) {
                Some(point) => points.push(point),
                None => {
                    tracing::debug!(line, "Skipping unparseable line");
                    skipped += 1;
                }
            }
        }

        if self.json {
            return print_json(&ParseOutput { points, skipped });
        }

        for point in &points {
            println!("{}", format_pair(*point));
        }
        if skipped > 0 {
            eprintln!("Skipped {skipped} line(s) that are not valid coordinates");
        }
        Ok(())
    }
}

//! # Blueprint CLI
//!
//! Command-line interface for Blueprint Studio.
//!
//! Creates, checks and inspects project documents without the visual
//! designer, driving the same stores and canvas layer the designer uses.
//!
//! ## Commands
//!
//! - `new` - Create an empty project document
//! - `validate` - Check a project document and list every violation
//! - `info` - Display information about a project
//! - `layout` - Run auto-layout over a project and write it back
//! - `canvas` - Print the node and edge lists a renderer would receive
//!

mod commands;

use anyhow::{Context, Result};
use blueprint_state::EngineConfig;
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// CLI version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// CLI name
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[derive(Debug, Parser)]
#[command(name = "blueprint", author, version, about = "Blueprint Studio project tools")]
pub struct Cli {
    /// More log output (-v debug, -vv trace)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Engine config file (defaults to ./blueprint.toml when present)
    #[arg(long, global = true, env = "BLUEPRINT_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create an empty project document
    New {
        /// Project name
        name: String,
        /// Output file (defaults to <name>.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Project description
        #[arg(short, long)]
        description: Option<String>,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Check a project document
    Validate {
        file: PathBuf,
    },
    /// Summarize a project document
    Info {
        file: PathBuf,
    },
    /// Auto-layout services and entities
    Layout {
        file: PathBuf,
        /// Spacing between cards
        #[arg(long, value_parser = ["compact", "comfortable", "spacious"])]
        density: Option<String>,
        /// Write here instead of in place
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the canvas node and edge lists
    Canvas {
        file: PathBuf,
        #[arg(long, default_value = "entities", value_parser = ["entities", "services"])]
        mode: String,
        /// `all`, `unassigned`, or a service name
        #[arg(long, default_value = "all")]
        filter: String,
        /// Print JSON instead of a listing
        #[arg(long)]
        json: bool,
    },
}

/// Parse arguments, run, and turn errors into a failing exit code
pub fn main_entry() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{} {:#}", "error:".red().bold(), err);
            ExitCode::FAILURE
        }
    }
}

pub fn run(cli: Cli) -> Result<ExitCode> {
    let cwd = std::env::current_dir().context("cannot read working directory")?;
    let config = EngineConfig::discover(cli.config.as_deref(), &cwd)
        .context("failed to load engine config")?;

    match cli.command {
        Command::New {
            name,
            output,
            description,
            force,
        } => commands::new_project(&config, &name, output, description, force),
        Command::Validate { file } => commands::validate(&file),
        Command::Info { file } => commands::info(&config, &file),
        Command::Layout {
            file,
            density,
            output,
        } => commands::layout(&config, &file, density.as_deref(), output),
        Command::Canvas {
            file,
            mode,
            filter,
            json,
        } => commands::canvas(&config, &file, &mode, &filter, json),
    }
}

/// Logs go to stderr so command output can be piped
fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert_eq!(NAME, "blueprint_cli");
    }

    #[test]
    fn test_parse_canvas_args() {
        let cli = Cli::parse_from([
            "blueprint", "-v", "canvas", "shop.json", "--mode", "services", "--json",
        ]);
        assert_eq!(cli.verbose, 1);
        let Command::Canvas { mode, json, filter, .. } = cli.command else {
            panic!("expected canvas command");
        };
        assert_eq!(mode, "services");
        assert_eq!(filter, "all");
        assert!(json);
    }
}

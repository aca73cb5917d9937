//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's
//! derive macros. It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// StackHealth -- cloud platform verification harness.
///
/// Use `stackhealth <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "stackhealth", version, about, long_about = None)]
pub struct Cli {
    /// Path to the stackhealth.toml configuration file.
    #[arg(short, long, default_value = "stackhealth.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table / text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run verification scenarios against a deployment.
    Run(RunArgs),

    /// List registered scenarios.
    List(ListArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- run ----

/// Run verification scenarios.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Run against the in-memory fake cloud instead of a deployment.
    #[arg(long)]
    pub simulate: bool,

    /// Run only the named scenario; may be repeated.
    #[arg(long = "scenario")]
    pub scenarios: Vec<String>,
}

// ---- list ----

/// List registered scenarios with component and duration budget.
#[derive(Args, Debug)]
pub struct ListArgs {}

// ---- config ----

/// Manage stackhealth configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Check,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, compute, network, volume,
        /// telemetry, data_processing).
        #[arg(long)]
        section: Option<String>,
    },
}

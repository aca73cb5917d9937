//! stackhealth binary -- runs platform verification scenarios.

mod cli;
mod commands;
mod error;
mod logging;
mod output;

use clap::Parser;

use stackhealth_core::config::{GeneralConfig, StackhealthConfig};

use crate::cli::{Cli, Commands};
use crate::output::OutputWriter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Logging comes up before the command runs; if the config file is
    // unreadable the command itself reports that, so fall back to defaults
    // here rather than failing early.
    let general = match StackhealthConfig::from_file(&cli.config).await {
        Ok(config) => config.general,
        Err(_) => GeneralConfig::default(),
    };
    if let Err(e) = logging::init_tracing(&general, cli.log_level.as_deref()) {
        eprintln!("warning: {e}");
    }

    let writer = OutputWriter::new(cli.output);

    let result = match cli.command {
        Commands::Run(args) => commands::run::execute(args, &cli.config, &writer).await,
        Commands::List(args) => commands::list::execute(args, &writer),
        Commands::Config(args) => commands::config::execute(args, &cli.config, &writer).await,
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(e.exit_code());
    }
}

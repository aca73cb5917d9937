//! Command handlers -- one module per subcommand

pub mod config;
pub mod list;
pub mod run;

use stackhealth_core::scenario::ScenarioRegistry;

use crate::error::CliError;

/// Build the registry with every scenario the binary ships.
pub fn build_registry() -> Result<ScenarioRegistry, CliError> {
    let mut registry = ScenarioRegistry::new();
    stackhealth_telemetry::register_scenarios(&mut registry)?;
    stackhealth_network::register_scenarios(&mut registry)?;
    Ok(registry)
}

//! `stackhealth list` command handler

use std::io::Write;

use serde::Serialize;

use stackhealth_core::scenario::ScenarioInfo;

use crate::cli::ListArgs;
use crate::commands::build_registry;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `list` command.
pub fn execute(_args: ListArgs, writer: &OutputWriter) -> Result<(), CliError> {
    let registry = build_registry()?;
    let report = ScenarioList {
        scenarios: registry.list(),
    };
    writer.render(&report)?;
    Ok(())
}

/// Registered scenarios, in execution order.
#[derive(Serialize)]
pub struct ScenarioList {
    pub scenarios: Vec<ScenarioInfo>,
}

impl Render for ScenarioList {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        writeln!(
            w,
            "{:<36} {:<12} {:>10}",
            "Scenario".bold(),
            "Component".bold(),
            "Budget".bold()
        )?;
        for info in &self.scenarios {
            writeln!(
                w,
                "{:<36} {:<12} {:>9}s",
                info.name, info.component, info.duration_budget_secs
            )?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_lists_every_scenario_once() {
        let registry = build_registry().expect("scenario names are unique");
        let infos = registry.list();
        assert_eq!(infos.len(), 11);

        let mut names: Vec<&str> = infos.iter().map(|i| i.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), 11, "names should be unique");
        assert!(infos.iter().any(|i| i.name == "network-connectivity"));
        assert!(infos.iter().any(|i| i.component == "telemetry"));
    }

    #[test]
    fn test_list_render_text_is_tabular() {
        let report = ScenarioList {
            scenarios: vec![ScenarioInfo {
                name: "network-connectivity".to_owned(),
                component: "network".to_owned(),
                duration_budget_secs: 1200,
            }],
        };

        let mut buffer = Vec::new();
        report
            .render_text(&mut buffer)
            .expect("text rendering should succeed");
        let output = String::from_utf8(buffer).expect("valid UTF-8");

        assert!(output.contains("network-connectivity"));
        assert!(output.contains("1200s"));
    }
}

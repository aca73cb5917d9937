//! `stackhealth run` command handler

use std::io::Write;
use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};

use stackhealth_core::config::StackhealthConfig;
use stackhealth_core::context::CloudContext;
use stackhealth_core::scenario::{ScenarioReport, ScenarioStatus};
use stackhealth_core::step::StepOutcome;
use stackhealth_testkit::FakeCloud;

use crate::cli::RunArgs;
use crate::commands::build_registry;
use crate::error::CliError;
use crate::output::{OutputWriter, Render};

/// Execute the `run` command.
///
/// Builds the scenario registry, runs the selected scenarios sequentially,
/// and renders one report per scenario. Exits non-zero if any scenario
/// failed; skips do not fail the run.
pub async fn execute(
    args: RunArgs,
    config_path: &Path,
    writer: &OutputWriter,
) -> Result<(), CliError> {
    let config = load_config(config_path).await?;
    let registry = build_registry()?;

    let ctx = build_context(&args, config)?;

    info!(
        scenarios = registry.count(),
        simulate = args.simulate,
        "starting verification run"
    );

    let reports = if args.scenarios.is_empty() {
        registry.run_all(&ctx).await
    } else {
        registry.run_named(&ctx, &args.scenarios).await?
    };

    let report = RunReport::from_reports(reports);
    writer.render(&report)?;

    if report.failed > 0 {
        return Err(CliError::ScenariosFailed {
            failed: report.failed,
        });
    }
    Ok(())
}

/// Load the configuration file, falling back to defaults when it is absent.
///
/// Env overrides apply either way; an unreadable or invalid file is a
/// configuration error.
async fn load_config(config_path: &Path) -> Result<StackhealthConfig, CliError> {
    if config_path.exists() {
        return StackhealthConfig::load(config_path).await.map_err(CliError::from);
    }
    warn!(path = %config_path.display(), "config file not found, using defaults");
    let mut config = StackhealthConfig::default();
    config.apply_env_overrides();
    config.validate()?;
    Ok(config)
}

/// Wire client handles into a run context.
///
/// The binary only ships the in-memory fake; real deployments embed the
/// library and inject their own SDK adapters.
fn build_context(args: &RunArgs, config: StackhealthConfig) -> Result<CloudContext, CliError> {
    if !args.simulate {
        return Err(CliError::Command(
            "no cloud adapters are wired into this binary; \
             run with --simulate, or embed the stackhealth libraries and \
             inject SDK adapters through CloudContext::builder()"
                .to_owned(),
        ));
    }
    let fake = FakeCloud::builder()
        .image(config.compute.test_image_name())
        .tagged_image(
            "dp-base-image",
            &config.data_processing.plugin_name,
            &config.data_processing.plugin_version,
        )
        .build();
    Ok(fake.context(config))
}

/// Aggregated result of a `run` invocation.
#[derive(Serialize)]
pub struct RunReport {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub skipped: usize,
    pub scenarios: Vec<ScenarioReport>,
}

impl RunReport {
    fn from_reports(scenarios: Vec<ScenarioReport>) -> Self {
        let mut passed = 0;
        let mut failed = 0;
        let mut skipped = 0;
        for report in &scenarios {
            match report.status {
                ScenarioStatus::Passed => passed += 1,
                ScenarioStatus::Failed { .. } => failed += 1,
                ScenarioStatus::Skipped { .. } => skipped += 1,
            }
        }
        Self {
            total: scenarios.len(),
            passed,
            failed,
            skipped,
            scenarios,
        }
    }
}

impl Render for RunReport {
    fn render_text(&self, w: &mut dyn Write) -> std::io::Result<()> {
        use colored::Colorize;

        for report in &self.scenarios {
            match &report.status {
                ScenarioStatus::Passed => {
                    writeln!(
                        w,
                        "{} {} ({} steps, {} ms)",
                        "PASS".green().bold(),
                        report.name,
                        report.steps.len(),
                        report.elapsed_ms
                    )?;
                }
                ScenarioStatus::Failed { at_step, message } => {
                    writeln!(
                        w,
                        "{} {} at step {}: {}",
                        "FAIL".red().bold(),
                        report.name,
                        at_step,
                        message
                    )?;
                    for step in &report.steps {
                        if let StepOutcome::Failure { reason, .. } = &step.outcome {
                            writeln!(w, "       step {}: {}", step.ordinal, reason)?;
                        }
                    }
                }
                ScenarioStatus::Skipped { reason } => {
                    writeln!(w, "{} {}: {}", "SKIP".yellow().bold(), report.name, reason)?;
                }
            }
        }

        writeln!(w)?;
        writeln!(
            w,
            "{} scenarios: {} passed, {} failed, {} skipped",
            self.total, self.passed, self.failed, self.skipped
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use stackhealth_core::step::StepRecord;

    use super::*;

    fn report(name: &str, status: ScenarioStatus, steps: Vec<StepRecord>) -> ScenarioReport {
        ScenarioReport {
            name: name.to_owned(),
            component: "telemetry".to_owned(),
            duration_budget_secs: 600,
            status,
            steps,
            elapsed_ms: 42,
        }
    }

    #[test]
    fn test_run_report_counts_statuses() {
        let reports = vec![
            report("a", ScenarioStatus::Passed, Vec::new()),
            report(
                "b",
                ScenarioStatus::Failed {
                    at_step: 2,
                    message: "Alarm state verification failed.".to_owned(),
                },
                Vec::new(),
            ),
            report(
                "c",
                ScenarioStatus::Skipped {
                    reason: "There are no storage nodes for volumes".to_owned(),
                },
                Vec::new(),
            ),
        ];
        let run = RunReport::from_reports(reports);
        assert_eq!(run.total, 3);
        assert_eq!(run.passed, 1);
        assert_eq!(run.failed, 1);
        assert_eq!(run.skipped, 1);
    }

    #[test]
    fn test_run_report_render_text() {
        let run = RunReport::from_reports(vec![
            report("telemetry-alarm-lifecycle", ScenarioStatus::Passed, Vec::new()),
            report(
                "network-connectivity",
                ScenarioStatus::Failed {
                    at_step: 12,
                    message: "Instance is not reachable by its floating IP.".to_owned(),
                },
                Vec::new(),
            ),
        ]);

        let mut buffer = Vec::new();
        run.render_text(&mut buffer).expect("text rendering should succeed");
        let output = String::from_utf8(buffer).expect("valid UTF-8");

        assert!(output.contains("telemetry-alarm-lifecycle"));
        assert!(output.contains("at step 12"));
        assert!(output.contains("2 scenarios: 1 passed, 1 failed, 0 skipped"));
    }

    #[test]
    fn test_run_report_json_shape() {
        let run = RunReport::from_reports(vec![report(
            "telemetry-sample-lifecycle",
            ScenarioStatus::Passed,
            Vec::new(),
        )]);
        let json = serde_json::to_value(&run).expect("serializes");
        assert_eq!(json["total"].as_u64(), Some(1));
        assert_eq!(
            json["scenarios"][0]["name"].as_str(),
            Some("telemetry-sample-lifecycle")
        );
        assert_eq!(json["scenarios"][0]["status"]["status"].as_str(), Some("passed"));
    }

    #[test]
    fn test_build_context_requires_simulate() {
        let args = RunArgs {
            simulate: false,
            scenarios: Vec::new(),
        };
        let err = build_context(&args, StackhealthConfig::default()).unwrap_err();
        assert!(matches!(err, CliError::Command(_)));
    }
}

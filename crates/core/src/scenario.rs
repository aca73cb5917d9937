//! Scenario trait, registry, and sequential runner.
//!
//! A scenario is one end-to-end verification: create or obtain resources,
//! assert or wait for state, mutate, assert again, clean up. Scenarios are
//! self-contained given the shared client handles in [`CloudContext`]; none
//! depends on another scenario's resources.
//!
//! Scheduling is strictly sequential: one scenario at a time, steps in
//! declared order, polling loops sleeping the task between queries. Any
//! parallelism across scenarios belongs to an external runner, not here.

use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{error, info, warn};

use crate::clients::BoxFuture;
use crate::context::CloudContext;
use crate::error::{ScenarioError, StackhealthError};
use crate::step::{StepRecord, StepRunner};

/// One end-to-end verification scenario.
pub trait Scenario: Send + Sync {
    /// Unique scenario name, e.g. "telemetry-alarm-lifecycle".
    fn name(&self) -> &'static str;

    /// Target service component, e.g. "telemetry".
    fn component(&self) -> &'static str;

    /// Declared duration budget. Informational only; not enforced.
    fn duration_budget(&self) -> Duration;

    /// Execute the step sequence against the given context.
    fn run<'a>(
        &'a self,
        ctx: &'a CloudContext,
        runner: &'a mut StepRunner,
    ) -> BoxFuture<'a, Result<(), ScenarioError>>;
}

/// Terminal status of a scenario run.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScenarioStatus {
    /// Every step succeeded.
    Passed,
    /// A step failed; no later steps were executed.
    Failed { at_step: u32, message: String },
    /// A required capability is absent; neither pass nor fail.
    Skipped { reason: String },
}

/// Aggregated result of one scenario run -- the reporting contract.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioReport {
    pub name: String,
    pub component: String,
    pub duration_budget_secs: u64,
    pub status: ScenarioStatus,
    pub steps: Vec<StepRecord>,
    pub elapsed_ms: u64,
}

impl ScenarioReport {
    /// Whether the scenario failed (skips are not failures).
    pub fn is_failure(&self) -> bool {
        matches!(self.status, ScenarioStatus::Failed { .. })
    }
}

/// Descriptive entry for `list`-style output.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioInfo {
    pub name: String,
    pub component: String,
    pub duration_budget_secs: u64,
}

/// Ordered collection of scenarios.
///
/// Registration order is preserved and is the execution order.
#[derive(Default)]
pub struct ScenarioRegistry {
    scenarios: Vec<Box<dyn Scenario>>,
}

impl ScenarioRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a scenario. Duplicate names are rejected.
    pub fn register(&mut self, scenario: Box<dyn Scenario>) -> Result<(), StackhealthError> {
        let name = scenario.name();
        if self.scenarios.iter().any(|s| s.name() == name) {
            return Err(StackhealthError::DuplicateScenario(name.to_owned()));
        }
        self.scenarios.push(scenario);
        Ok(())
    }

    /// Number of registered scenarios.
    pub fn count(&self) -> usize {
        self.scenarios.len()
    }

    /// Descriptive info for every registered scenario, in order.
    pub fn list(&self) -> Vec<ScenarioInfo> {
        self.scenarios
            .iter()
            .map(|s| ScenarioInfo {
                name: s.name().to_owned(),
                component: s.component().to_owned(),
                duration_budget_secs: s.duration_budget().as_secs(),
            })
            .collect()
    }

    /// Run every registered scenario sequentially.
    pub async fn run_all(&self, ctx: &CloudContext) -> Vec<ScenarioReport> {
        let mut reports = Vec::with_capacity(self.scenarios.len());
        for scenario in &self.scenarios {
            reports.push(run_scenario(scenario.as_ref(), ctx).await);
        }
        reports
    }

    /// Run only the named scenarios, in registration order.
    ///
    /// Fails up front if any requested name is unknown.
    pub async fn run_named(
        &self,
        ctx: &CloudContext,
        names: &[String],
    ) -> Result<Vec<ScenarioReport>, StackhealthError> {
        for name in names {
            if !self.scenarios.iter().any(|s| s.name() == name) {
                return Err(StackhealthError::Config(
                    crate::error::ConfigError::InvalidValue {
                        field: "scenario".to_owned(),
                        reason: format!("unknown scenario '{name}'"),
                    },
                ));
            }
        }
        let mut reports = Vec::new();
        for scenario in &self.scenarios {
            if names.iter().any(|n| n == scenario.name()) {
                reports.push(run_scenario(scenario.as_ref(), ctx).await);
            }
        }
        Ok(reports)
    }
}

/// Run one scenario and always execute its deferred cleanups afterwards.
async fn run_scenario(scenario: &dyn Scenario, ctx: &CloudContext) -> ScenarioReport {
    info!(scenario = scenario.name(), "starting scenario");
    let mut runner = StepRunner::new();
    let started = Instant::now();

    let result = scenario.run(ctx, &mut runner).await;

    // Guaranteed-on-exit teardown; failures here never mask `result`.
    let leaked = ctx.run_cleanups().await;
    if leaked > 0 {
        warn!(
            scenario = scenario.name(),
            failed_cleanups = leaked,
            "some resources could not be cleaned up"
        );
    }

    let elapsed = started.elapsed();
    let status = match result {
        Ok(()) => {
            info!(scenario = scenario.name(), "scenario passed");
            ScenarioStatus::Passed
        }
        Err(ScenarioError::Skipped { reason }) => {
            info!(scenario = scenario.name(), reason = reason.as_str(), "scenario skipped");
            ScenarioStatus::Skipped { reason }
        }
        Err(ScenarioError::Step(failure)) => {
            error!(scenario = scenario.name(), %failure, "scenario failed");
            ScenarioStatus::Failed {
                at_step: failure.ordinal,
                message: failure.message,
            }
        }
    };

    ScenarioReport {
        name: scenario.name().to_owned(),
        component: scenario.component().to_owned(),
        duration_budget_secs: scenario.duration_budget().as_secs(),
        status,
        steps: runner.into_records(),
        elapsed_ms: u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX),
    }
}

//! Step executor -- runs one unit of scenario work under a timeout budget
//! and normalizes the outcome into a step record.
//!
//! Step ordinals are owned by the executor and assigned sequentially, so a
//! scenario can never produce mismatched or gapping step numbers.

use std::fmt::Debug;
use std::time::{Duration, Instant};

use serde::Serialize;
use tracing::{debug, warn};

use crate::error::{ScenarioError, StepError, StepFailure};

/// Extra wall-clock allowance on the executor's backstop timer, so a polling
/// action that bounds itself with the same budget can report its own timeout
/// (with the last observed state) before the backstop fires.
const BACKSTOP_GRACE: Duration = Duration::from_millis(500);

/// Failure category carried in a step record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Observed state did not match the expected value.
    Assertion,
    /// The condition never became true within the budget.
    Timeout,
    /// The polled resource disappeared.
    Gone,
    /// Unexpected client failure.
    Unexpected,
}

impl From<&StepError> for FailureKind {
    fn from(err: &StepError) -> Self {
        match err {
            StepError::Assertion { .. } => Self::Assertion,
            StepError::Timeout { .. } => Self::Timeout,
            StepError::Gone { .. } => Self::Gone,
            // Skips never reach a record; treat defensively as unexpected.
            StepError::Skipped { .. } | StepError::Cloud(_) => Self::Unexpected,
        }
    }
}

/// Outcome of one executed step.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum StepOutcome {
    /// The step completed; `message` is the step description.
    Success { message: String },
    /// The step failed; `reason` renders the classified cause.
    Failure { kind: FailureKind, reason: String },
}

impl StepOutcome {
    /// Whether this outcome is a success.
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }
}

/// Immutable record of one executed step.
#[derive(Debug, Clone, Serialize)]
pub struct StepRecord {
    /// 1-based ordinal, sequential within a scenario run.
    pub ordinal: u32,
    /// What the step does, e.g. "creating alarm".
    pub description: String,
    /// Message reported if the step fails.
    pub failure_message: String,
    pub outcome: StepOutcome,
    /// Wall-clock time the step took, in milliseconds.
    pub elapsed_ms: u64,
}

/// Executes steps for one scenario run and accumulates their records.
#[derive(Debug, Default)]
pub struct StepRunner {
    steps: Vec<StepRecord>,
}

impl StepRunner {
    /// Create an executor with an empty step log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ordinal the next step will receive.
    fn next_ordinal(&self) -> u32 {
        self.steps.len() as u32 + 1
    }

    /// Execute one step: await `action` under a `timeout` backstop and record
    /// the outcome.
    ///
    /// On success the action's value is returned for chaining (e.g. "create
    /// server" hands the server to later steps). On failure exactly one
    /// failure record is captured and the scenario halts at this step via
    /// the returned error. A [`StepError::Skipped`] marks the whole scenario
    /// as skipped without recording a step.
    pub async fn verify<T, F>(
        &mut self,
        timeout: Duration,
        description: &str,
        failure_message: &str,
        action: F,
    ) -> Result<T, ScenarioError>
    where
        F: Future<Output = Result<T, StepError>>,
    {
        let ordinal = self.next_ordinal();
        let started = Instant::now();
        debug!(ordinal, description, "running step");

        let outcome = match tokio::time::timeout(timeout + BACKSTOP_GRACE, action).await {
            Ok(result) => result,
            // The backstop fired before the action bounded itself.
            Err(_) => Err(StepError::Timeout {
                condition: description.to_owned(),
                waited: timeout,
                last_observed: None,
            }),
        };
        let elapsed = started.elapsed();

        match outcome {
            Ok(value) => {
                self.record_success(ordinal, description, failure_message, elapsed);
                Ok(value)
            }
            Err(StepError::Skipped { reason }) => {
                debug!(ordinal, reason = %reason, "scenario skipped");
                Err(ScenarioError::Skipped { reason })
            }
            Err(error) => {
                warn!(ordinal, description, %error, "step failed");
                self.steps.push(StepRecord {
                    ordinal,
                    description: description.to_owned(),
                    failure_message: failure_message.to_owned(),
                    outcome: StepOutcome::Failure {
                        kind: FailureKind::from(&error),
                        reason: error.to_string(),
                    },
                    elapsed_ms: elapsed_millis(elapsed),
                });
                Err(ScenarioError::Step(StepFailure {
                    ordinal,
                    message: failure_message.to_owned(),
                    error,
                }))
            }
        }
    }

    /// One-shot equality assertion recorded as a step.
    pub fn verify_value<T>(
        &mut self,
        description: &str,
        failure_message: &str,
        actual: &T,
        expected: &T,
    ) -> Result<(), ScenarioError>
    where
        T: PartialEq + Debug,
    {
        let ordinal = self.next_ordinal();
        if actual == expected {
            self.record_success(ordinal, description, failure_message, Duration::ZERO);
            return Ok(());
        }
        let error = StepError::assertion(format!("expected {expected:?}, observed {actual:?}"));
        warn!(ordinal, description, %error, "assertion step failed");
        self.steps.push(StepRecord {
            ordinal,
            description: description.to_owned(),
            failure_message: failure_message.to_owned(),
            outcome: StepOutcome::Failure {
                kind: FailureKind::Assertion,
                reason: error.to_string(),
            },
            elapsed_ms: 0,
        });
        Err(ScenarioError::Step(StepFailure {
            ordinal,
            message: failure_message.to_owned(),
            error,
        }))
    }

    fn record_success(
        &mut self,
        ordinal: u32,
        description: &str,
        failure_message: &str,
        elapsed: Duration,
    ) {
        self.steps.push(StepRecord {
            ordinal,
            description: description.to_owned(),
            failure_message: failure_message.to_owned(),
            outcome: StepOutcome::Success {
                message: description.to_owned(),
            },
            elapsed_ms: elapsed_millis(elapsed),
        });
    }

    /// Records captured so far, in execution order.
    pub fn records(&self) -> &[StepRecord] {
        &self.steps
    }

    /// Consume the runner, yielding the full step log.
    pub fn into_records(self) -> Vec<StepRecord> {
        self.steps
    }
}

fn elapsed_millis(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX)
}

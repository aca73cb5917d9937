//! Error types -- per-layer error definitions and step failure classification.

use std::time::Duration;

/// StackHealth top-level error type.
#[derive(Debug, thiserror::Error)]
pub enum StackhealthError {
    /// Configuration loading or validation failure.
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    /// A scenario step failed.
    #[error("step error: {0}")]
    Step(#[from] StepFailure),

    /// A cloud service call failed outside of any step.
    #[error("cloud error: {0}")]
    Cloud(#[from] CloudError),

    /// Two scenarios were registered under the same name.
    #[error("scenario already registered: {0}")]
    DuplicateScenario(String),

    /// The context builder was not given a client for a service.
    #[error("no {0} client configured")]
    MissingClient(&'static str),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Configuration file does not exist.
    #[error("config file not found: {path}")]
    FileNotFound { path: String },

    /// Configuration file failed to parse.
    #[error("failed to parse config: {reason}")]
    ParseFailed { reason: String },

    /// A configuration value is out of range or malformed.
    #[error("invalid config value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

/// Error returned by a cloud service client.
///
/// Every client trait method resolves to this type so that the harness can
/// classify failures uniformly: not-found conditions abort polling loops,
/// transient faults are retried until the step deadline, and everything else
/// surfaces as an unexpected failure.
#[derive(Debug, Clone, thiserror::Error)]
pub enum CloudError {
    /// The referenced resource does not exist (HTTP 404 family).
    #[error("{resource} not found")]
    NotFound { resource: String },

    /// The service answered with an error status.
    #[error("api error {code}: {message}")]
    Api { code: u16, message: String },

    /// The service could not be reached at all.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The request was rejected before reaching the service.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl CloudError {
    /// Shorthand for a not-found error on a named resource.
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound {
            resource: resource.into(),
        }
    }

    /// Check whether this error indicates a not-found condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check whether this error is worth retrying inside a polling loop.
    ///
    /// Server-side errors, rate limiting, and connection faults are
    /// transient; validation and not-found errors are not.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Api { code, .. } => *code >= 500 || *code == 429,
            Self::Connection(_) => true,
            Self::NotFound { .. } | Self::InvalidRequest(_) => false,
        }
    }
}

/// Classified cause of a failed step.
///
/// The categories are kept distinct so a report reader can tell "timed out
/// waiting for X" apart from "X is broken". See [`FailureKind`] for the
/// serialized form used in step records.
///
/// [`FailureKind`]: crate::step::FailureKind
#[derive(Debug, thiserror::Error)]
pub enum StepError {
    /// An observed value did not match the expected one.
    #[error("assertion failed: {detail}")]
    Assertion { detail: String },

    /// A polling condition never became true within its budget.
    #[error("timed out after {waited:?} waiting for {condition}")]
    Timeout {
        condition: String,
        waited: Duration,
        /// Last state observed before the deadline, when available.
        last_observed: Option<String>,
    },

    /// The polled resource disappeared (404 while waiting).
    #[error("{resource} disappeared while polling")]
    Gone { resource: String },

    /// The environment lacks a capability the scenario requires.
    #[error("precondition not met: {reason}")]
    Skipped { reason: String },

    /// Any other client failure (network error, malformed response).
    #[error(transparent)]
    Cloud(#[from] CloudError),
}

impl StepError {
    /// Shorthand for an assertion failure.
    pub fn assertion(detail: impl Into<String>) -> Self {
        Self::Assertion {
            detail: detail.into(),
        }
    }

    /// Shorthand for a skip condition.
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped {
            reason: reason.into(),
        }
    }
}

/// A failed step, attributed to its ordinal and the supplied failure message.
///
/// Produced by [`StepRunner::verify`] and propagated unchanged to the
/// scenario boundary.
///
/// [`StepRunner::verify`]: crate::step::StepRunner::verify
#[derive(Debug, thiserror::Error)]
#[error("step {ordinal} failed: {message} ({error})")]
pub struct StepFailure {
    /// 1-based ordinal of the failed step.
    pub ordinal: u32,
    /// Human-readable failure message supplied by the scenario.
    pub message: String,
    /// Classified cause.
    pub error: StepError,
}

/// Why a scenario run ended before completing all steps.
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    /// The scenario cannot run in this environment. Not a failure.
    #[error("skipped: {reason}")]
    Skipped { reason: String },

    /// A step failed and halted the scenario.
    #[error(transparent)]
    Step(#[from] StepFailure),
}

impl ScenarioError {
    /// Shorthand for a scenario-level skip.
    pub fn skipped(reason: impl Into<String>) -> Self {
        Self::Skipped {
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_5xx_and_connection_errors_are_retryable() {
        assert!(
            CloudError::Api {
                code: 503,
                message: "unavailable".to_owned(),
            }
            .is_retryable()
        );
        assert!(
            CloudError::Api {
                code: 429,
                message: "slow down".to_owned(),
            }
            .is_retryable()
        );
        assert!(CloudError::Connection("refused".to_owned()).is_retryable());
    }

    #[test]
    fn not_found_and_4xx_errors_are_not_retryable() {
        assert!(!CloudError::not_found("server abc").is_retryable());
        assert!(
            !CloudError::Api {
                code: 400,
                message: "bad request".to_owned(),
            }
            .is_retryable()
        );
        assert!(!CloudError::InvalidRequest("missing name".to_owned()).is_retryable());
    }

    #[test]
    fn step_failure_display_carries_ordinal_and_message() {
        let failure = StepFailure {
            ordinal: 3,
            message: "Creation of alarm failed.".to_owned(),
            error: StepError::assertion("state was 'alarm'"),
        };
        let rendered = failure.to_string();
        assert!(rendered.contains("step 3"));
        assert!(rendered.contains("Creation of alarm failed."));
    }

    #[test]
    fn timeout_display_includes_condition() {
        let err = StepError::Timeout {
            condition: "alarm state 'ok'".to_owned(),
            waited: Duration::from_secs(5),
            last_observed: Some("insufficient data".to_owned()),
        };
        assert!(err.to_string().contains("alarm state 'ok'"));
    }
}

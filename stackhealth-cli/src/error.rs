//! CLI-specific error types and exit code mapping

use stackhealth_core::error::StackhealthError;

/// CLI-specific error type.
///
/// Each variant carries enough context for a user-friendly message.
/// The `exit_code()` method maps errors to process exit codes.
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration loading or validation failure.
    #[error("configuration error: {0}")]
    Config(String),

    /// A subcommand-specific operation failed.
    #[error("{0}")]
    Command(String),

    /// One or more scenarios failed during a run.
    #[error("{failed} scenario(s) failed")]
    ScenariosFailed { failed: usize },

    /// JSON serialisation failed during output rendering.
    #[error("json output error: {0}")]
    JsonSerialize(#[from] serde_json::Error),

    /// IO error (file read, stdout write, etc.).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Wrapped domain error from stackhealth-core.
    #[error("{0}")]
    Core(StackhealthError),
}

impl CliError {
    /// Map the error to a process exit code.
    ///
    /// | Code | Meaning                        |
    /// |------|--------------------------------|
    /// | 0    | Success (all passed or skipped) |
    /// | 1    | General / scenario failure      |
    /// | 2    | Configuration error             |
    /// | 10   | IO error                        |
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Core(StackhealthError::Config(_)) => 2,
            Self::Io(_) => 10,
            Self::ScenariosFailed { .. }
            | Self::JsonSerialize(_)
            | Self::Command(_)
            | Self::Core(_) => 1,
        }
    }
}

impl From<StackhealthError> for CliError {
    fn from(e: StackhealthError) -> Self {
        Self::Core(e)
    }
}

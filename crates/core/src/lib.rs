//! StackHealth core -- the shared verification harness.
//!
//! This crate holds everything the scenario crates build on: the step
//! executor ([`step::StepRunner`]), poll-until-condition helpers
//! ([`poll::poll_until`]), the minimal client traits for each cloud service
//! family ([`clients`]), the per-run context with guaranteed cleanup
//! ([`context::CloudContext`]), the scenario registry and sequential runner
//! ([`scenario`]), configuration, and the error taxonomy.

pub mod clients;
pub mod config;
pub mod context;
pub mod error;
pub mod meters;
pub mod poll;
pub mod scenario;
pub mod step;
pub mod types;

// Errors
pub use error::{
    CloudError, ConfigError, ScenarioError, StackhealthError, StepError, StepFailure,
};

// Configuration
pub use config::StackhealthConfig;

// Harness
pub use context::CloudContext;
pub use scenario::{Scenario, ScenarioRegistry, ScenarioReport, ScenarioStatus};
pub use step::{StepOutcome, StepRecord, StepRunner};

// Client traits
pub use clients::{
    BoxFuture, CloudResult, ComputeClient, DataProcessingClient, IdentityClient, ImageClient,
    NetworkClient, TelemetryClient, VolumeClient,
};

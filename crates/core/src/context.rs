//! Per-run context -- shared client handles, settings, and deferred cleanup.
//!
//! One [`CloudContext`] is owned by the harness and passed into every
//! scenario. Scenarios register teardown actions as they create resources;
//! the runner executes them after the scenario body returns, whether it
//! passed or failed, so a failed step does not leak cloud resources.

use std::sync::{Arc, Mutex};

use tracing::{debug, warn};
use uuid::Uuid;

use crate::clients::{
    BoxFuture, CloudResult, ComputeClient, DataProcessingClient, IdentityClient, ImageClient,
    NetworkClient, TelemetryClient, VolumeClient,
};
use crate::config::StackhealthConfig;
use crate::error::StackhealthError;

type CleanupFn = Box<dyn FnOnce() -> BoxFuture<'static, CloudResult<()>> + Send>;

struct CleanupAction {
    label: String,
    action: CleanupFn,
}

/// Shared handles for one verification run.
///
/// Replaces any notion of module-global state: registries of created
/// resources live here, scoped to the run, owned by the harness.
pub struct CloudContext {
    pub compute: Arc<dyn ComputeClient>,
    pub network: Arc<dyn NetworkClient>,
    pub telemetry: Arc<dyn TelemetryClient>,
    pub volume: Arc<dyn VolumeClient>,
    pub identity: Arc<dyn IdentityClient>,
    pub image: Arc<dyn ImageClient>,
    pub data_processing: Arc<dyn DataProcessingClient>,
    pub config: Arc<StackhealthConfig>,
    cleanups: Mutex<Vec<CleanupAction>>,
}

impl std::fmt::Debug for CloudContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudContext")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl CloudContext {
    /// Start building a context.
    pub fn builder() -> CloudContextBuilder {
        CloudContextBuilder::default()
    }

    /// Generate a unique resource name with the given prefix.
    pub fn unique_name(&self, prefix: &str) -> String {
        let suffix = Uuid::new_v4().simple().to_string();
        format!("{prefix}-{}", &suffix[..8])
    }

    /// Register a teardown action for a resource created by a scenario.
    ///
    /// Actions run in reverse registration order once the scenario body
    /// finishes, regardless of its outcome.
    pub fn defer_cleanup<F, Fut>(&self, label: impl Into<String>, action: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = CloudResult<()>> + Send + 'static,
    {
        let entry = CleanupAction {
            label: label.into(),
            action: Box::new(move || Box::pin(action())),
        };
        self.cleanups
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(entry);
    }

    /// Run and drain all registered cleanups, newest first.
    ///
    /// Best-effort: every action runs even if earlier ones fail, failures
    /// are logged, and none of them can mask the scenario's own outcome.
    /// Returns the number of cleanups that failed.
    pub async fn run_cleanups(&self) -> usize {
        let mut actions: Vec<CleanupAction> = {
            let mut guard = self.cleanups.lock().unwrap_or_else(|e| e.into_inner());
            guard.drain(..).collect()
        };
        actions.reverse();

        let mut failures = 0;
        for entry in actions {
            match (entry.action)().await {
                Ok(()) => debug!(label = entry.label.as_str(), "cleanup done"),
                // A missing resource was already torn down by the scenario.
                Err(err) if err.is_not_found() => {
                    debug!(label = entry.label.as_str(), "cleanup target already gone");
                }
                Err(err) => {
                    failures += 1;
                    warn!(label = entry.label.as_str(), %err, "cleanup failed, resource may leak");
                }
            }
        }
        failures
    }

    /// Number of cleanups currently registered.
    pub fn pending_cleanups(&self) -> usize {
        self.cleanups
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }
}

/// Builder for [`CloudContext`].
#[derive(Default)]
pub struct CloudContextBuilder {
    compute: Option<Arc<dyn ComputeClient>>,
    network: Option<Arc<dyn NetworkClient>>,
    telemetry: Option<Arc<dyn TelemetryClient>>,
    volume: Option<Arc<dyn VolumeClient>>,
    identity: Option<Arc<dyn IdentityClient>>,
    image: Option<Arc<dyn ImageClient>>,
    data_processing: Option<Arc<dyn DataProcessingClient>>,
    config: Option<StackhealthConfig>,
}

impl CloudContextBuilder {
    pub fn compute(mut self, client: Arc<dyn ComputeClient>) -> Self {
        self.compute = Some(client);
        self
    }

    pub fn network(mut self, client: Arc<dyn NetworkClient>) -> Self {
        self.network = Some(client);
        self
    }

    pub fn telemetry(mut self, client: Arc<dyn TelemetryClient>) -> Self {
        self.telemetry = Some(client);
        self
    }

    pub fn volume(mut self, client: Arc<dyn VolumeClient>) -> Self {
        self.volume = Some(client);
        self
    }

    pub fn identity(mut self, client: Arc<dyn IdentityClient>) -> Self {
        self.identity = Some(client);
        self
    }

    pub fn image(mut self, client: Arc<dyn ImageClient>) -> Self {
        self.image = Some(client);
        self
    }

    pub fn data_processing(mut self, client: Arc<dyn DataProcessingClient>) -> Self {
        self.data_processing = Some(client);
        self
    }

    pub fn config(mut self, config: StackhealthConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Build the context; every client handle must have been provided.
    pub fn build(self) -> Result<CloudContext, StackhealthError> {
        Ok(CloudContext {
            compute: self
                .compute
                .ok_or(StackhealthError::MissingClient("compute"))?,
            network: self
                .network
                .ok_or(StackhealthError::MissingClient("network"))?,
            telemetry: self
                .telemetry
                .ok_or(StackhealthError::MissingClient("telemetry"))?,
            volume: self.volume.ok_or(StackhealthError::MissingClient("volume"))?,
            identity: self
                .identity
                .ok_or(StackhealthError::MissingClient("identity"))?,
            image: self.image.ok_or(StackhealthError::MissingClient("image"))?,
            data_processing: self
                .data_processing
                .ok_or(StackhealthError::MissingClient("data_processing"))?,
            config: Arc::new(self.config.unwrap_or_default()),
            cleanups: Mutex::new(Vec::new()),
        })
    }
}

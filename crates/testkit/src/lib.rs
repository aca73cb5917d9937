//! stackhealth-testkit -- an in-memory fake cloud.
//!
//! [`FakeCloud`] implements every client trait from `stackhealth-core` over
//! a single shared state, so scenarios and the harness itself can be
//! exercised end to end without a deployment. Behavior is programmable
//! through the builder: how many status polls a server spends in BUILD,
//! fixed meter observations, seeded images, and injected faults.
//!
//! ```no_run
//! use stackhealth_core::StackhealthConfig;
//! use stackhealth_testkit::FakeCloud;
//!
//! let fake = FakeCloud::with_defaults();
//! let ctx = fake.context(StackhealthConfig::default());
//! ```

mod clients;
mod state;

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, MutexGuard};

use stackhealth_core::config::StackhealthConfig;
use stackhealth_core::context::CloudContext;
use stackhealth_core::error::CloudError;
use stackhealth_core::meters::IMAGE_PLUGIN_TAG_PREFIX;
use stackhealth_core::types::Image;

use crate::state::{BuildOutcome, FakeState, Faults};

pub use crate::state::FAKE_PROJECT;

/// In-memory implementation of all seven client traits.
///
/// Cloning is cheap and every clone shares the same state, so a test can
/// keep a handle for inspection while the context owns the client handles.
#[derive(Clone)]
pub struct FakeCloud {
    state: Arc<Mutex<FakeState>>,
}

impl FakeCloud {
    /// Start building a fake with explicit behavior.
    pub fn builder() -> FakeCloudBuilder {
        FakeCloudBuilder::default()
    }

    /// A happy-path fake: the `TestVM` image is registered, servers become
    /// ACTIVE after one status poll, and the `image` / `cpu_util` meters
    /// report fixed observations.
    pub fn with_defaults() -> Self {
        Self::builder().image("TestVM").build()
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Build a [`CloudContext`] with this fake behind every client handle.
    pub fn context(&self, config: StackhealthConfig) -> CloudContext {
        let build = CloudContext::builder()
            .compute(Arc::new(self.clone()))
            .network(Arc::new(self.clone()))
            .telemetry(Arc::new(self.clone()))
            .volume(Arc::new(self.clone()))
            .identity(Arc::new(self.clone()))
            .image(Arc::new(self.clone()))
            .data_processing(Arc::new(self.clone()))
            .config(config)
            .build();
        match build {
            Ok(ctx) => ctx,
            // All seven handles were just provided.
            Err(_) => unreachable!("context builder rejected a fully-populated fake"),
        }
    }

    /// Override a fixed meter observation mid-test.
    pub fn set_meter_value(&self, meter: impl Into<String>, value: f64) {
        self.lock().meter_values.insert(meter.into(), value);
    }

    /// Scenario-created resources that still exist (seeded images excluded).
    pub fn remaining_resources(&self) -> usize {
        self.lock().remaining_resources()
    }

    /// Number of recorded samples for a meter.
    pub fn sample_count(&self, meter: &str) -> usize {
        self.lock()
            .samples
            .iter()
            .filter(|s| s.counter_name == meter)
            .count()
    }

    /// Whether a server with the given id still exists.
    pub fn server_exists(&self, id: &str) -> bool {
        self.lock().servers.contains_key(id)
    }

    /// Number of alarms currently defined.
    pub fn alarm_count(&self) -> usize {
        self.lock().alarms.len()
    }
}

/// Builder for [`FakeCloud`].
pub struct FakeCloudBuilder {
    build_polls: u32,
    meter_values: HashMap<String, f64>,
    images: Vec<Image>,
    faults: Faults,
    image_seq: u32,
}

impl Default for FakeCloudBuilder {
    fn default() -> Self {
        let mut meter_values = HashMap::new();
        meter_values.insert("image".to_owned(), 1.0);
        meter_values.insert("cpu_util".to_owned(), 60.0);
        Self {
            build_polls: 1,
            meter_values,
            images: Vec::new(),
            faults: Faults::default(),
            image_seq: 0,
        }
    }
}

impl FakeCloudBuilder {
    /// How many `get_server` calls a new server spends in BUILD.
    pub fn server_build_polls(mut self, polls: u32) -> Self {
        self.build_polls = polls;
        self
    }

    /// Fix the observation reported for a meter.
    pub fn meter_value(mut self, meter: impl Into<String>, value: f64) -> Self {
        self.meter_values.insert(meter.into(), value);
        self
    }

    /// Drop a fixed meter observation so the meter reads as absent.
    pub fn without_meter(mut self, meter: &str) -> Self {
        self.meter_values.remove(meter);
        self
    }

    /// Seed a registered image.
    pub fn image(mut self, name: impl Into<String>) -> Self {
        self.push_image(name.into(), BTreeMap::new());
        self
    }

    /// Seed an image tagged for a data-processing plugin.
    pub fn tagged_image(
        mut self,
        name: impl Into<String>,
        plugin_name: &str,
        plugin_version: &str,
    ) -> Self {
        let mut properties = BTreeMap::new();
        properties.insert(format!("{IMAGE_PLUGIN_TAG_PREFIX}{plugin_name}"), "true".to_owned());
        properties.insert(
            format!("{IMAGE_PLUGIN_TAG_PREFIX}{plugin_version}"),
            "true".to_owned(),
        );
        self.push_image(name.into(), properties);
        self
    }

    fn push_image(&mut self, name: String, properties: BTreeMap<String, String>) {
        self.image_seq += 1;
        self.images.push(Image {
            id: format!("img-seed-{:02}", self.image_seq),
            name,
            properties,
        });
    }

    /// Fail every `create_server` call with the given error.
    pub fn fail_server_create(mut self, err: CloudError) -> Self {
        self.faults.create_server = Some(err);
        self
    }

    /// Fail every `create_volume` call with the given error.
    pub fn fail_volume_create(mut self, err: CloudError) -> Self {
        self.faults.create_volume = Some(err);
        self
    }

    /// New servers never leave BUILD.
    pub fn servers_stuck_in_build(mut self) -> Self {
        self.faults.build_outcome = BuildOutcome::Stuck;
        self
    }

    /// New servers end up in ERROR instead of ACTIVE.
    pub fn servers_error_on_build(mut self) -> Self {
        self.faults.build_outcome = BuildOutcome::Error;
        self
    }

    /// Floating IPs do not answer pings.
    pub fn unreachable_addresses(mut self) -> Self {
        self.faults.ping_unreachable = true;
        self
    }

    pub fn build(self) -> FakeCloud {
        FakeCloud {
            state: Arc::new(Mutex::new(FakeState::new(
                self.build_polls,
                self.meter_values,
                self.images,
                self.faults,
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use stackhealth_core::types::{
        AlarmRequest, AlarmState, ClusterRequest, Comparison, SampleQuery, ServerRequest,
        ServerStatus, Statistic,
    };
    use stackhealth_core::{ComputeClient, DataProcessingClient, ImageClient, TelemetryClient};

    use super::*;

    fn server_request() -> ServerRequest {
        ServerRequest {
            name: "ost1-test".to_owned(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn server_becomes_active_after_configured_polls() {
        let fake = FakeCloud::builder().server_build_polls(2).build();
        let server = fake.create_server(&server_request()).await.unwrap();
        assert_eq!(server.status, ServerStatus::Build);

        assert_eq!(
            fake.get_server(&server.id).await.unwrap().status,
            ServerStatus::Build
        );
        assert_eq!(
            fake.get_server(&server.id).await.unwrap().status,
            ServerStatus::Active
        );
    }

    #[tokio::test]
    async fn stuck_server_never_leaves_build() {
        let fake = FakeCloud::builder()
            .server_build_polls(1)
            .servers_stuck_in_build()
            .build();
        let server = fake.create_server(&server_request()).await.unwrap();
        for _ in 0..5 {
            assert_eq!(
                fake.get_server(&server.id).await.unwrap().status,
                ServerStatus::Build
            );
        }
    }

    #[tokio::test]
    async fn injected_fault_fails_server_creation() {
        let fake = FakeCloud::builder()
            .fail_server_create(CloudError::Connection("refused".to_owned()))
            .build();
        let err = fake.create_server(&server_request()).await.unwrap_err();
        assert!(matches!(err, CloudError::Connection(_)));
    }

    #[tokio::test]
    async fn alarm_state_follows_threshold_updates() {
        let fake = FakeCloud::with_defaults();
        // image meter reads 1.0 by default.
        let alarm = fake
            .create_alarm(&AlarmRequest {
                name: "img-low".to_owned(),
                meter_name: "image".to_owned(),
                threshold: 0.9,
                comparison: Comparison::Lt,
                statistic: Statistic::Avg,
                period: 600,
            })
            .await
            .unwrap();
        assert_eq!(alarm.state, AlarmState::Ok);

        let updated = fake.update_alarm_threshold(&alarm.alarm_id, 1.1).await.unwrap();
        assert_eq!(updated.state, AlarmState::Alarm);
    }

    #[tokio::test]
    async fn set_state_pins_until_rule_change() {
        let fake = FakeCloud::with_defaults();
        let alarm = fake
            .create_alarm(&AlarmRequest {
                name: "pinned".to_owned(),
                meter_name: "image".to_owned(),
                threshold: 0.9,
                comparison: Comparison::Lt,
                statistic: Statistic::Avg,
                period: 600,
            })
            .await
            .unwrap();

        fake.set_alarm_state(&alarm.alarm_id, AlarmState::InsufficientData)
            .await
            .unwrap();
        assert_eq!(
            fake.get_alarm_state(&alarm.alarm_id).await.unwrap(),
            AlarmState::InsufficientData
        );

        // Rule change puts the alarm back under evaluation.
        fake.update_alarm_threshold(&alarm.alarm_id, 1.1).await.unwrap();
        assert_eq!(
            fake.get_alarm_state(&alarm.alarm_id).await.unwrap(),
            AlarmState::Alarm
        );
    }

    #[tokio::test]
    async fn unknown_meter_reads_insufficient_data() {
        let fake = FakeCloud::builder().without_meter("image").build();
        let alarm = fake
            .create_alarm(&AlarmRequest {
                name: "no-data".to_owned(),
                meter_name: "image".to_owned(),
                threshold: 0.9,
                comparison: Comparison::Lt,
                statistic: Statistic::Avg,
                period: 600,
            })
            .await
            .unwrap();
        assert_eq!(alarm.state, AlarmState::InsufficientData);
    }

    #[tokio::test]
    async fn server_creation_emits_notification_samples() {
        let fake = FakeCloud::with_defaults();
        let server = fake.create_server(&server_request()).await.unwrap();

        let samples = fake
            .list_samples("memory", &[SampleQuery::resource_eq(server.id.clone())])
            .await
            .unwrap();
        assert!(!samples.is_empty());

        let disk = fake
            .list_samples(
                "disk.device.read.bytes",
                &[SampleQuery::resource_eq(format!("{}-vda", server.id))],
            )
            .await
            .unwrap();
        assert!(!disk.is_empty());
    }

    #[tokio::test]
    async fn alarm_history_survives_deletion() {
        let fake = FakeCloud::with_defaults();
        let alarm = fake
            .create_alarm(&AlarmRequest {
                name: "hist".to_owned(),
                meter_name: "image".to_owned(),
                threshold: 0.9,
                comparison: Comparison::Lt,
                statistic: Statistic::Avg,
                period: 600,
            })
            .await
            .unwrap();
        fake.update_alarm_threshold(&alarm.alarm_id, 1.1).await.unwrap();
        fake.delete_alarm(&alarm.alarm_id).await.unwrap();

        let history = fake.alarm_history(&alarm.alarm_id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].change, "creation");
        assert!(fake.get_alarm(&alarm.alarm_id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn booted_server_resolves_its_flavor() {
        let fake = FakeCloud::with_defaults();
        let server = fake
            .create_server(&ServerRequest {
                name: "ost1-test".to_owned(),
                flavor_name: Some("m1.micro".to_owned()),
                ..Default::default()
            })
            .await
            .unwrap();

        let flavor = fake.get_flavor(&server.flavor_id).await.unwrap();
        assert_eq!(flavor.name, "m1.micro");
        assert!(fake.get_flavor("flavor-nope").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn cluster_requires_a_registered_image() {
        let fake = FakeCloud::with_defaults();
        let image = &fake.list_images().await.unwrap()[0];

        let cluster = fake
            .create_cluster(&ClusterRequest {
                name: "ost1-test-cluster".to_owned(),
                image_id: image.id.clone(),
                plugin_name: "vanilla".to_owned(),
                plugin_version: "2.6.0".to_owned(),
            })
            .await
            .unwrap();
        assert_eq!(fake.get_cluster(&cluster.id).await.unwrap().status, "Active");

        let err = fake
            .create_cluster(&ClusterRequest {
                name: "ost1-bad-cluster".to_owned(),
                image_id: "image-nope".to_owned(),
                plugin_name: "vanilla".to_owned(),
                plugin_version: "2.6.0".to_owned(),
            })
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn remaining_resources_ignores_seeded_images() {
        let fake = FakeCloud::with_defaults();
        assert_eq!(fake.remaining_resources(), 0);

        let server = fake.create_server(&server_request()).await.unwrap();
        assert_eq!(fake.remaining_resources(), 1);

        fake.delete_server(&server.id).await.unwrap();
        assert_eq!(fake.remaining_resources(), 0);
    }
}

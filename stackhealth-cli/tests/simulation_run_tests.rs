//! End-to-end simulation run: every shipped scenario against the fake cloud.
//!
//! Mirrors what `stackhealth run --simulate` wires up, without going through
//! process spawning.

use stackhealth_core::StackhealthConfig;
use stackhealth_core::scenario::{ScenarioRegistry, ScenarioStatus};
use stackhealth_testkit::FakeCloud;

fn full_registry() -> ScenarioRegistry {
    let mut registry = ScenarioRegistry::new();
    stackhealth_telemetry::register_scenarios(&mut registry).expect("unique names");
    stackhealth_network::register_scenarios(&mut registry).expect("unique names");
    registry
}

fn simulation_fake(config: &StackhealthConfig) -> FakeCloud {
    FakeCloud::builder()
        .image(config.compute.test_image_name())
        .tagged_image(
            "dp-base-image",
            &config.data_processing.plugin_name,
            &config.data_processing.plugin_version,
        )
        .build()
}

#[tokio::test(start_paused = true)]
async fn simulated_full_run_passes_every_scenario() {
    let config = StackhealthConfig::default();
    let fake = simulation_fake(&config);
    let ctx = fake.context(config);

    let reports = full_registry().run_all(&ctx).await;

    assert_eq!(reports.len(), 11);
    for report in &reports {
        assert!(
            matches!(report.status, ScenarioStatus::Passed),
            "{} did not pass: {:?}",
            report.name,
            report.status
        );
    }
    assert_eq!(fake.remaining_resources(), 0, "no resources should leak");
}

#[tokio::test(start_paused = true)]
async fn simulated_run_without_storage_backend_skips_volume_scenario() {
    let config = StackhealthConfig::parse(
        "[volume]\ncinder_node_present = false\nceph_present = false",
    )
    .expect("config parses");
    let fake = simulation_fake(&config);
    let ctx = fake.context(config);

    let reports = full_registry().run_all(&ctx).await;

    let volume = reports
        .iter()
        .find(|r| r.name == "telemetry-volume-notifications")
        .expect("volume scenario is registered");
    assert!(matches!(volume.status, ScenarioStatus::Skipped { .. }));
    assert!(!reports.iter().any(|r| r.is_failure()));
}

#[tokio::test(start_paused = true)]
async fn simulated_named_run_executes_only_the_selection() {
    let config = StackhealthConfig::default();
    let fake = simulation_fake(&config);
    let ctx = fake.context(config);

    let reports = full_registry()
        .run_named(&ctx, &["network-connectivity".to_owned()])
        .await
        .expect("scenario is registered");

    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].name, "network-connectivity");
    assert!(matches!(reports[0].status, ScenarioStatus::Passed));
}

#[tokio::test(start_paused = true)]
async fn simulated_named_run_rejects_unknown_scenario() {
    let config = StackhealthConfig::default();
    let fake = simulation_fake(&config);
    let ctx = fake.context(config);

    let result = full_registry()
        .run_named(&ctx, &["no-such-scenario".to_owned()])
        .await;
    assert!(result.is_err(), "unknown scenario name should be rejected");
}

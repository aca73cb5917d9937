//! Connectivity scenario run end to end against the fake cloud.

use stackhealth_core::StackhealthConfig;
use stackhealth_core::scenario::{ScenarioRegistry, ScenarioReport, ScenarioStatus};
use stackhealth_core::step::{FailureKind, StepOutcome};
use stackhealth_network::register_scenarios;
use stackhealth_testkit::FakeCloud;

fn registry() -> ScenarioRegistry {
    let mut registry = ScenarioRegistry::new();
    register_scenarios(&mut registry).expect("scenario names are unique");
    registry
}

async fn run_connectivity(fake: &FakeCloud, config: StackhealthConfig) -> ScenarioReport {
    let ctx = fake.context(config);
    let mut reports = registry()
        .run_named(&ctx, &["network-connectivity".to_owned()])
        .await
        .expect("scenario is registered");
    assert_eq!(reports.len(), 1);
    reports.remove(0)
}

#[tokio::test(start_paused = true)]
async fn connectivity_passes_all_nineteen_steps() {
    let fake = FakeCloud::with_defaults();
    let report = run_connectivity(&fake, StackhealthConfig::default()).await;
    assert!(
        matches!(report.status, ScenarioStatus::Passed),
        "scenario did not pass: {:?}",
        report.status
    );
    let ordinals: Vec<u32> = report.steps.iter().map(|s| s.ordinal).collect();
    let expected: Vec<u32> = (1..=19).collect();
    assert_eq!(ordinals, expected);
    assert!(report.steps.iter().all(|s| s.outcome.is_success()));
    // Everything was deleted in-scenario; cleanups found nothing left over.
    assert_eq!(fake.remaining_resources(), 0);
}

#[tokio::test(start_paused = true)]
async fn missing_test_image_skips_before_any_step() {
    // No seeded images at all.
    let fake = FakeCloud::builder().build();
    let report = run_connectivity(&fake, StackhealthConfig::default()).await;
    match &report.status {
        ScenarioStatus::Skipped { reason } => {
            assert!(reason.contains("TestVM"), "reason: {reason}");
            assert!(reason.contains("not registered"), "reason: {reason}");
        }
        other => panic!("expected skip, got {other:?}"),
    }
    assert!(report.steps.is_empty());
    assert_eq!(fake.remaining_resources(), 0);
}

#[tokio::test(start_paused = true)]
async fn unreachable_instance_fails_the_ping_step() {
    let fake = FakeCloud::builder()
        .image("TestVM")
        .unreachable_addresses()
        .build();
    let report = run_connectivity(&fake, StackhealthConfig::default()).await;
    match &report.status {
        ScenarioStatus::Failed { at_step, message } => {
            assert_eq!(*at_step, 12);
            assert_eq!(message, "Instance is not reachable by its floating IP.");
        }
        other => panic!("expected failure, got {other:?}"),
    }
    assert_eq!(report.steps.len(), 12);
    match &report.steps[11].outcome {
        StepOutcome::Failure { kind, reason } => {
            assert_eq!(*kind, FailureKind::Timeout);
            assert!(reason.contains("timed out"), "reason: {reason}");
        }
        other => panic!("expected failure outcome, got {other:?}"),
    }
    // Deferred cleanups tore down everything the scenario had built.
    assert_eq!(fake.remaining_resources(), 0);
}

#[tokio::test(start_paused = true)]
async fn instance_boot_failure_halts_at_step_seven() {
    let fake = FakeCloud::builder()
        .image("TestVM")
        .servers_error_on_build()
        .build();
    let report = run_connectivity(&fake, StackhealthConfig::default()).await;
    match &report.status {
        ScenarioStatus::Failed { at_step, message } => {
            assert_eq!(*at_step, 7);
            assert_eq!(message, "Instance is not available.");
        }
        other => panic!("expected failure, got {other:?}"),
    }
    assert_eq!(report.steps.len(), 7);
    match &report.steps[6].outcome {
        StepOutcome::Failure { kind, reason } => {
            assert_eq!(*kind, FailureKind::Assertion);
            assert!(reason.contains("ERROR"), "reason: {reason}");
        }
        other => panic!("expected failure outcome, got {other:?}"),
    }
    assert_eq!(fake.remaining_resources(), 0);
}

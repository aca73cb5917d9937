//! End-to-end harness tests: scenarios running against the fake cloud
//! through the registry, with cleanup and reporting behavior verified from
//! the outside.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use stackhealth_core::StackhealthConfig;
use stackhealth_core::clients::BoxFuture;
use stackhealth_core::context::CloudContext;
use stackhealth_core::error::{CloudError, ScenarioError, StepError};
use stackhealth_core::poll::wait_for_server_status;
use stackhealth_core::scenario::{Scenario, ScenarioRegistry, ScenarioStatus};
use stackhealth_core::step::StepRunner;
use stackhealth_core::types::{
    AlarmRequest, AlarmState, Comparison, ServerRequest, ServerStatus, Statistic,
};
use stackhealth_testkit::FakeCloud;

const STEP_BUDGET: Duration = Duration::from_secs(30);
const POLL: Duration = Duration::from_millis(10);

fn alarm_request(name: &str) -> AlarmRequest {
    AlarmRequest {
        name: name.to_owned(),
        meter_name: "image".to_owned(),
        threshold: 0.9,
        comparison: Comparison::Lt,
        statistic: Statistic::Avg,
        period: 600,
    }
}

/// Boots a server, waits for it, and deletes it.
struct BootScenario;

impl Scenario for BootScenario {
    fn name(&self) -> &'static str {
        "compute-boot"
    }

    fn component(&self) -> &'static str {
        "compute"
    }

    fn duration_budget(&self) -> Duration {
        Duration::from_secs(60)
    }

    fn run<'a>(
        &'a self,
        ctx: &'a CloudContext,
        runner: &'a mut StepRunner,
    ) -> BoxFuture<'a, Result<(), ScenarioError>> {
        Box::pin(async move {
            let request = ServerRequest {
                name: ctx.unique_name("ost1-test-boot"),
                flavor_name: Some(ctx.config.compute.flavor_name.clone()),
                ..Default::default()
            };
            let server = runner
                .verify(
                    STEP_BUDGET,
                    "creating instance",
                    "Instance creation failed.",
                    async { ctx.compute.create_server(&request).await.map_err(StepError::from) },
                )
                .await?;

            let compute = ctx.compute.clone();
            let server_id = server.id.clone();
            ctx.defer_cleanup("test instance", move || async move {
                compute.delete_server(&server_id).await
            });

            runner
                .verify(
                    STEP_BUDGET,
                    "waiting for instance to boot",
                    "Instance is not available.",
                    wait_for_server_status(
                        ctx.compute.as_ref(),
                        &server.id,
                        ServerStatus::Active,
                        STEP_BUDGET,
                        POLL,
                    ),
                )
                .await?;

            runner
                .verify(
                    STEP_BUDGET,
                    "deleting instance",
                    "Instance deletion failed.",
                    async { ctx.compute.delete_server(&server.id).await.map_err(StepError::from) },
                )
                .await?;
            Ok(())
        })
    }
}

/// Creates an alarm and then asserts a state it will not be in.
struct WrongStateScenario;

impl Scenario for WrongStateScenario {
    fn name(&self) -> &'static str {
        "telemetry-wrong-state"
    }

    fn component(&self) -> &'static str {
        "telemetry"
    }

    fn duration_budget(&self) -> Duration {
        Duration::from_secs(60)
    }

    fn run<'a>(
        &'a self,
        ctx: &'a CloudContext,
        runner: &'a mut StepRunner,
    ) -> BoxFuture<'a, Result<(), ScenarioError>> {
        Box::pin(async move {
            let request = alarm_request("wrong-state");
            let alarm = runner
                .verify(
                    STEP_BUDGET,
                    "creating alarm",
                    "Alarm creation failed.",
                    async { ctx.telemetry.create_alarm(&request).await.map_err(StepError::from) },
                )
                .await?;

            let telemetry = ctx.telemetry.clone();
            let alarm_id = alarm.alarm_id.clone();
            ctx.defer_cleanup("test alarm", move || async move {
                telemetry.delete_alarm(&alarm_id).await
            });

            // image reads 1.0 against threshold lt 0.9, so the state is 'ok'.
            runner.verify_value(
                "verifying alarm state",
                "Alarm state verification failed.",
                &alarm.state,
                &AlarmState::InsufficientData,
            )?;
            Ok(())
        })
    }
}

/// Skips before creating anything.
struct NoBackendScenario;

impl Scenario for NoBackendScenario {
    fn name(&self) -> &'static str {
        "volume-no-backend"
    }

    fn component(&self) -> &'static str {
        "volume"
    }

    fn duration_budget(&self) -> Duration {
        Duration::from_secs(60)
    }

    fn run<'a>(
        &'a self,
        _ctx: &'a CloudContext,
        runner: &'a mut StepRunner,
    ) -> BoxFuture<'a, Result<(), ScenarioError>> {
        Box::pin(async move {
            runner
                .verify(
                    STEP_BUDGET,
                    "checking storage backend",
                    "Storage backend check failed.",
                    async {
                        Err::<(), _>(StepError::skipped(
                            "There are no storage nodes for volumes",
                        ))
                    },
                )
                .await?;
            Ok(())
        })
    }
}

/// Passes after registering cleanups that record their execution order.
struct OrderedCleanupScenario {
    log: Arc<Mutex<Vec<&'static str>>>,
    fail_middle_cleanup: bool,
}

impl Scenario for OrderedCleanupScenario {
    fn name(&self) -> &'static str {
        "cleanup-order"
    }

    fn component(&self) -> &'static str {
        "harness"
    }

    fn duration_budget(&self) -> Duration {
        Duration::from_secs(60)
    }

    fn run<'a>(
        &'a self,
        ctx: &'a CloudContext,
        runner: &'a mut StepRunner,
    ) -> BoxFuture<'a, Result<(), ScenarioError>> {
        Box::pin(async move {
            for label in ["first", "second", "third"] {
                let log = self.log.clone();
                let fail = self.fail_middle_cleanup && label == "second";
                ctx.defer_cleanup(label, move || async move {
                    log.lock().unwrap().push(label);
                    if fail {
                        Err(CloudError::Api {
                            code: 500,
                            message: "teardown exploded".to_owned(),
                        })
                    } else {
                        Ok(())
                    }
                });
            }
            runner
                .verify(STEP_BUDGET, "doing nothing", "Nothing failed.", async {
                    Ok::<_, StepError>(())
                })
                .await?;
            Ok(())
        })
    }
}

fn registry_with(scenario: Box<dyn Scenario>) -> ScenarioRegistry {
    let mut registry = ScenarioRegistry::new();
    registry.register(scenario).expect("register");
    registry
}

#[tokio::test(start_paused = true)]
async fn passing_scenario_reports_gapless_steps_and_leaks_nothing() {
    let fake = FakeCloud::builder().server_build_polls(2).build();
    let ctx = fake.context(StackhealthConfig::default());
    let registry = registry_with(Box::new(BootScenario));

    let reports = registry.run_all(&ctx).await;
    assert_eq!(reports.len(), 1);
    let report = &reports[0];
    assert!(matches!(report.status, ScenarioStatus::Passed));
    let ordinals: Vec<u32> = report.steps.iter().map(|s| s.ordinal).collect();
    assert_eq!(ordinals, vec![1, 2, 3]);
    assert!(report.steps.iter().all(|s| s.outcome.is_success()));

    // The instance was deleted in-scenario; the deferred cleanup finds it
    // gone and tolerates that.
    assert_eq!(fake.remaining_resources(), 0);
    assert_eq!(ctx.pending_cleanups(), 0);
}

#[tokio::test(start_paused = true)]
async fn failing_scenario_halts_and_cleanups_still_run() {
    let fake = FakeCloud::with_defaults();
    let ctx = fake.context(StackhealthConfig::default());
    let registry = registry_with(Box::new(WrongStateScenario));

    let reports = registry.run_all(&ctx).await;
    let report = &reports[0];
    match &report.status {
        ScenarioStatus::Failed { at_step, message } => {
            assert_eq!(*at_step, 2);
            assert_eq!(message, "Alarm state verification failed.");
        }
        other => panic!("expected failure, got {other:?}"),
    }
    assert!(report.is_failure());
    assert_eq!(report.steps.len(), 2);
    assert!(report.steps[0].outcome.is_success());
    assert!(!report.steps[1].outcome.is_success());

    // The alarm created at step 1 was torn down despite the failure.
    assert_eq!(fake.alarm_count(), 0);
    assert_eq!(fake.remaining_resources(), 0);
}

#[tokio::test(start_paused = true)]
async fn connection_error_at_creation_carries_supplied_message() {
    let fake = FakeCloud::builder()
        .fail_server_create(CloudError::Connection("connection refused".to_owned()))
        .build();
    let ctx = fake.context(StackhealthConfig::default());
    let registry = registry_with(Box::new(BootScenario));

    let reports = registry.run_all(&ctx).await;
    let report = &reports[0];
    match &report.status {
        ScenarioStatus::Failed { at_step, message } => {
            assert_eq!(*at_step, 1);
            assert_eq!(message, "Instance creation failed.");
        }
        other => panic!("expected failure, got {other:?}"),
    }
    // No steps ran after the failed creation.
    assert_eq!(report.steps.len(), 1);
}

#[tokio::test(start_paused = true)]
async fn skipped_scenario_is_neither_passed_nor_failed() {
    let fake = FakeCloud::with_defaults();
    let ctx = fake.context(StackhealthConfig::default());
    let registry = registry_with(Box::new(NoBackendScenario));

    let reports = registry.run_all(&ctx).await;
    let report = &reports[0];
    match &report.status {
        ScenarioStatus::Skipped { reason } => {
            assert!(reason.contains("no storage nodes"));
        }
        other => panic!("expected skip, got {other:?}"),
    }
    assert!(!report.is_failure());
    assert!(report.steps.is_empty());
}

#[tokio::test(start_paused = true)]
async fn cleanups_run_newest_first() {
    let fake = FakeCloud::with_defaults();
    let ctx = fake.context(StackhealthConfig::default());
    let log = Arc::new(Mutex::new(Vec::new()));
    let registry = registry_with(Box::new(OrderedCleanupScenario {
        log: log.clone(),
        fail_middle_cleanup: false,
    }));

    let reports = registry.run_all(&ctx).await;
    assert!(matches!(reports[0].status, ScenarioStatus::Passed));
    assert_eq!(*log.lock().unwrap(), vec!["third", "second", "first"]);
}

#[tokio::test(start_paused = true)]
async fn failed_cleanup_never_masks_the_scenario_outcome() {
    let fake = FakeCloud::with_defaults();
    let ctx = fake.context(StackhealthConfig::default());
    let log = Arc::new(Mutex::new(Vec::new()));
    let registry = registry_with(Box::new(OrderedCleanupScenario {
        log: log.clone(),
        fail_middle_cleanup: true,
    }));

    let reports = registry.run_all(&ctx).await;
    // The middle cleanup failed; the scenario still reports Passed and the
    // remaining cleanups still ran.
    assert!(matches!(reports[0].status, ScenarioStatus::Passed));
    assert_eq!(*log.lock().unwrap(), vec!["third", "second", "first"]);
}

#[tokio::test]
async fn registry_rejects_duplicate_names_and_unknown_run_targets() {
    let mut registry = ScenarioRegistry::new();
    registry.register(Box::new(BootScenario)).expect("first");
    assert!(registry.register(Box::new(BootScenario)).is_err());
    assert_eq!(registry.count(), 1);

    let fake = FakeCloud::with_defaults();
    let ctx = fake.context(StackhealthConfig::default());
    let err = registry
        .run_named(&ctx, &["no-such-scenario".to_owned()])
        .await
        .expect_err("unknown name must fail");
    assert!(err.to_string().contains("no-such-scenario"));
}

#[tokio::test(start_paused = true)]
async fn run_named_filters_to_requested_scenarios() {
    let fake = FakeCloud::with_defaults();
    let ctx = fake.context(StackhealthConfig::default());
    let mut registry = ScenarioRegistry::new();
    registry.register(Box::new(BootScenario)).expect("boot");
    registry
        .register(Box::new(NoBackendScenario))
        .expect("volume");

    let reports = registry
        .run_named(&ctx, &["volume-no-backend".to_owned()])
        .await
        .expect("known name");
    assert_eq!(reports.len(), 1);
    assert_eq!(reports[0].name, "volume-no-backend");
}

//! Instance-backed scenarios: pollster meters and the event pipeline.

use std::time::Duration;

use stackhealth_core::clients::BoxFuture;
use stackhealth_core::context::CloudContext;
use stackhealth_core::error::{ScenarioError, StepError};
use stackhealth_core::meters;
use stackhealth_core::poll::wait_for_server_status;
use stackhealth_core::scenario::Scenario;
use stackhealth_core::step::StepRunner;
use stackhealth_core::types::{
    AlarmRequest, AlarmState, Comparison, SampleQuery, ServerStatus, Statistic,
};

use crate::helpers::test_server_request;
use crate::waits;

use super::{
    API_TIMEOUT, BOOT_TIMEOUT, METRIC_TIMEOUT, STATE_TIMEOUT, defer_alarm_cleanup,
    defer_server_cleanup, owned, poll_interval,
};

/// Boots an instance and verifies its notification meters, pollster meters,
/// per-device disk meters, and a `cpu_util` statistic-backed alarm.
pub struct InstanceMetricsScenario;

impl Scenario for InstanceMetricsScenario {
    fn name(&self) -> &'static str {
        "telemetry-instance-metrics"
    }

    fn component(&self) -> &'static str {
        "telemetry"
    }

    fn duration_budget(&self) -> Duration {
        Duration::from_secs(1000)
    }

    fn run<'a>(
        &'a self,
        ctx: &'a CloudContext,
        runner: &'a mut StepRunner,
    ) -> BoxFuture<'a, Result<(), ScenarioError>> {
        Box::pin(async move {
            let interval = poll_interval(ctx);
            let period = ctx.config.telemetry.statistic_period_secs;
            let use_vcenter = ctx.config.compute.use_vcenter;

            let request = test_server_request(ctx, "ost1-test-metrics");
            let server = runner
                .verify(
                    API_TIMEOUT,
                    "creating instance",
                    "Creation of instance failed.",
                    async {
                        ctx.compute
                            .create_server(&request)
                            .await
                            .map_err(StepError::from)
                    },
                )
                .await?;
            defer_server_cleanup(ctx, &server.id);

            runner
                .verify(
                    BOOT_TIMEOUT,
                    "waiting for instance to become available",
                    "Instance is not available.",
                    wait_for_server_status(
                        ctx.compute.as_ref(),
                        &server.id,
                        ServerStatus::Active,
                        BOOT_TIMEOUT,
                        interval,
                    ),
                )
                .await?;

            let instance_query = [SampleQuery::resource_eq(server.id.clone())];

            runner
                .verify(
                    METRIC_TIMEOUT,
                    "waiting for instance notification meters",
                    "Instance notification meters did not appear.",
                    waits::wait_metrics(
                        ctx.telemetry.as_ref(),
                        &owned(meters::NOVA_NOTIFICATIONS),
                        &instance_query,
                        METRIC_TIMEOUT,
                        interval,
                    ),
                )
                .await?;

            // vCenter deployments expose a reduced pollster set; otherwise a
            // per-flavor instance meter joins the common table.
            let mut pollsters = if use_vcenter {
                owned(meters::NOVA_VSPHERE_POLLSTERS)
            } else {
                owned(meters::NOVA_INSTANCE_POLLSTERS)
            };
            if !use_vcenter {
                let flavor_name = &ctx.config.compute.flavor_name;
                pollsters.push(format!("instance:{flavor_name}"));
            }
            runner
                .verify(
                    METRIC_TIMEOUT,
                    "waiting for instance pollster meters",
                    "Instance pollster meters did not appear.",
                    waits::wait_metrics(
                        ctx.telemetry.as_ref(),
                        &pollsters,
                        &instance_query,
                        METRIC_TIMEOUT,
                        interval,
                    ),
                )
                .await?;

            // Per-device disk meters are not collected on vCenter; the empty
            // table is trivially satisfied there.
            let disk_meters = if use_vcenter {
                Vec::new()
            } else {
                owned(meters::NOVA_DISK_DEVICE_POLLSTERS)
            };
            let disk_query = [SampleQuery::resource_eq(format!("{}-vda", server.id))];
            runner
                .verify(
                    METRIC_TIMEOUT,
                    "waiting for disk device meters",
                    "Disk device meters did not appear.",
                    waits::wait_metrics(
                        ctx.telemetry.as_ref(),
                        &disk_meters,
                        &disk_query,
                        METRIC_TIMEOUT,
                        interval,
                    ),
                )
                .await?;

            let statistic = runner
                .verify(
                    METRIC_TIMEOUT,
                    "getting statistic of 'cpu_util' meter",
                    "Getting statistic of metric failed.",
                    async {
                        let stats = waits::wait_for_statistic_of_metric(
                            ctx.telemetry.as_ref(),
                            "cpu_util",
                            &instance_query,
                            Some(period),
                            METRIC_TIMEOUT,
                            interval,
                        )
                        .await?;
                        stats
                            .into_iter()
                            .next()
                            .ok_or_else(|| StepError::assertion("statistics are empty"))
                    },
                )
                .await?;

            let alarm_request = AlarmRequest {
                name: ctx.unique_name("ost1-test-metrics-alarm"),
                meter_name: "cpu_util".to_owned(),
                threshold: statistic.avg,
                comparison: Comparison::Ge,
                statistic: Statistic::Avg,
                period,
            };
            let alarm = runner
                .verify(
                    API_TIMEOUT,
                    "creating alarm from observed statistic",
                    "Creation of alarm failed.",
                    async {
                        ctx.telemetry
                            .create_alarm(&alarm_request)
                            .await
                            .map_err(StepError::from)
                    },
                )
                .await?;
            defer_alarm_cleanup(ctx, &alarm.alarm_id);

            runner
                .verify(
                    STATE_TIMEOUT,
                    "waiting for alarm to evaluate",
                    "Alarm state verification failed.",
                    async {
                        waits::wait_for_alarm_state_in(
                            ctx.telemetry.as_ref(),
                            &alarm.alarm_id,
                            &[AlarmState::Alarm, AlarmState::Ok],
                            STATE_TIMEOUT,
                            interval,
                        )
                        .await
                        .map(|_| ())
                    },
                )
                .await?;

            Ok(())
        })
    }
}

/// Boots an instance and walks the event pipeline: event types, events by
/// type and by instance, trait descriptions, and traits.
pub struct EventsAndTraitsScenario;

impl Scenario for EventsAndTraitsScenario {
    fn name(&self) -> &'static str {
        "telemetry-events-and-traits"
    }

    fn component(&self) -> &'static str {
        "telemetry"
    }

    fn duration_budget(&self) -> Duration {
        Duration::from_secs(600)
    }

    fn run<'a>(
        &'a self,
        ctx: &'a CloudContext,
        runner: &'a mut StepRunner,
    ) -> BoxFuture<'a, Result<(), ScenarioError>> {
        Box::pin(async move {
            let interval = poll_interval(ctx);
            let event_type = meters::INSTANCE_UPDATE_EVENT;

            let request = test_server_request(ctx, "ost1-test-events");
            let server = runner
                .verify(
                    API_TIMEOUT,
                    "creating instance",
                    "Creation of instance failed.",
                    async {
                        ctx.compute
                            .create_server(&request)
                            .await
                            .map_err(StepError::from)
                    },
                )
                .await?;
            defer_server_cleanup(ctx, &server.id);

            runner
                .verify(
                    BOOT_TIMEOUT,
                    "waiting for instance to become available",
                    "Instance is not available.",
                    wait_for_server_status(
                        ctx.compute.as_ref(),
                        &server.id,
                        ServerStatus::Active,
                        BOOT_TIMEOUT,
                        interval,
                    ),
                )
                .await?;

            runner
                .verify(
                    METRIC_TIMEOUT,
                    "checking instance update event type",
                    "Event type is not registered.",
                    waits::check_event_type(
                        ctx.telemetry.as_ref(),
                        event_type,
                        METRIC_TIMEOUT,
                        interval,
                    ),
                )
                .await?;

            let type_query = [SampleQuery::field_eq("event_type", event_type)];
            runner
                .verify(
                    METRIC_TIMEOUT,
                    "listing events by type",
                    "Getting event list failed.",
                    async {
                        waits::wait_for_event(
                            ctx.telemetry.as_ref(),
                            &type_query,
                            METRIC_TIMEOUT,
                            interval,
                        )
                        .await
                        .map(|_| ())
                    },
                )
                .await?;

            runner
                .verify(
                    API_TIMEOUT,
                    "checking trait descriptions",
                    "Trait descriptions are incomplete.",
                    async {
                        waits::check_traits(
                            ctx.telemetry.as_ref(),
                            event_type,
                            meters::INSTANCE_EVENT_TRAITS,
                        )
                        .await
                        .map(|_| ())
                    },
                )
                .await?;

            let instance_query = [
                SampleQuery::field_eq("event_type", event_type),
                SampleQuery::field_eq("instance_id", server.id.clone()),
            ];
            let event = runner
                .verify(
                    METRIC_TIMEOUT,
                    "finding event for the instance",
                    "No event found for the instance.",
                    waits::wait_for_event(
                        ctx.telemetry.as_ref(),
                        &instance_query,
                        METRIC_TIMEOUT,
                        interval,
                    ),
                )
                .await?;

            runner
                .verify(
                    API_TIMEOUT,
                    "getting event by message id",
                    "Getting event by message id failed.",
                    async {
                        waits::check_event_message_id(ctx.telemetry.as_ref(), &event.message_id)
                            .await
                            .map(|_| ())
                    },
                )
                .await?;

            runner
                .verify(
                    API_TIMEOUT,
                    "listing instance id traits",
                    "Getting trait list failed.",
                    async {
                        let traits = ctx
                            .telemetry
                            .list_traits(event_type, "instance_id")
                            .await?;
                        if traits.is_empty() {
                            Err(StepError::assertion(format!(
                                "no 'instance_id' traits recorded for {event_type}"
                            )))
                        } else {
                            Ok(())
                        }
                    },
                )
                .await?;

            runner
                .verify(
                    API_TIMEOUT,
                    "deleting instance",
                    "Instance deleting failed.",
                    async {
                        ctx.compute
                            .delete_server(&server.id)
                            .await
                            .map_err(StepError::from)
                    },
                )
                .await?;

            Ok(())
        })
    }
}

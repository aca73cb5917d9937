//! Alarm lifecycle scenarios.

use std::time::Duration;

use stackhealth_core::clients::BoxFuture;
use stackhealth_core::context::CloudContext;
use stackhealth_core::error::{ScenarioError, StepError};
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
    defer_server_cleanup, poll_interval,
};

/// Full alarm lifecycle against the always-present `image` meter: create,
/// get, list, state transitions on threshold changes, history, explicit
/// state set, delete.
pub struct AlarmLifecycleScenario;

impl Scenario for AlarmLifecycleScenario {
    fn name(&self) -> &'static str {
        "telemetry-alarm-lifecycle"
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
            let period = ctx.config.telemetry.statistic_period_secs;

            runner
                .verify(
                    METRIC_TIMEOUT,
                    "getting statistic of 'image' meter",
                    "Getting statistic of metric failed.",
                    waits::wait_for_statistic_of_metric(
                        ctx.telemetry.as_ref(),
                        "image",
                        &[],
                        Some(period),
                        METRIC_TIMEOUT,
                        interval,
                    ),
                )
                .await?;

            let request = AlarmRequest {
                name: ctx.unique_name("ost1-test-alarm"),
                meter_name: "image".to_owned(),
                threshold: 0.9,
                comparison: Comparison::Lt,
                statistic: Statistic::Avg,
                period,
            };
            let alarm = runner
                .verify(
                    API_TIMEOUT,
                    "creating alarm",
                    "Creation of alarm failed.",
                    async {
                        ctx.telemetry
                            .create_alarm(&request)
                            .await
                            .map_err(StepError::from)
                    },
                )
                .await?;
            defer_alarm_cleanup(ctx, &alarm.alarm_id);

            runner
                .verify(API_TIMEOUT, "getting alarm", "Getting alarm failed.", async {
                    let fetched = ctx.telemetry.get_alarm(&alarm.alarm_id).await?;
                    if fetched.name == request.name {
                        Ok(())
                    } else {
                        Err(StepError::assertion(format!(
                            "fetched alarm is named '{}', expected '{}'",
                            fetched.name, request.name
                        )))
                    }
                })
                .await?;

            runner
                .verify(
                    API_TIMEOUT,
                    "getting list of alarms",
                    "Getting alarm list failed.",
                    async {
                        let query = [SampleQuery::project_eq(alarm.project_id.clone())];
                        let alarms = ctx.telemetry.list_alarms(&query).await?;
                        if alarms.iter().any(|a| a.alarm_id == alarm.alarm_id) {
                            Ok(())
                        } else {
                            Err(StepError::assertion(format!(
                                "alarm {} is not in the project's alarm list",
                                alarm.alarm_id
                            )))
                        }
                    },
                )
                .await?;

            runner
                .verify(
                    STATE_TIMEOUT,
                    "waiting for 'ok' alarm state",
                    "Alarm state verification failed.",
                    waits::wait_for_alarm_state(
                        ctx.telemetry.as_ref(),
                        &alarm.alarm_id,
                        AlarmState::Ok,
                        STATE_TIMEOUT,
                        interval,
                    ),
                )
                .await?;

            runner
                .verify(
                    API_TIMEOUT,
                    "updating alarm threshold",
                    "Alarm update failed.",
                    async {
                        ctx.telemetry
                            .update_alarm_threshold(&alarm.alarm_id, 1.1)
                            .await
                            .map_err(StepError::from)
                            .map(|_| ())
                    },
                )
                .await?;

            runner
                .verify(
                    STATE_TIMEOUT,
                    "waiting for 'alarm' alarm state",
                    "Alarm state verification failed.",
                    waits::wait_for_alarm_state(
                        ctx.telemetry.as_ref(),
                        &alarm.alarm_id,
                        AlarmState::Alarm,
                        STATE_TIMEOUT,
                        interval,
                    ),
                )
                .await?;

            runner
                .verify(
                    API_TIMEOUT,
                    "getting alarm history",
                    "Alarm history verification failed.",
                    async {
                        let history = ctx.telemetry.alarm_history(&alarm.alarm_id).await?;
                        if history.is_empty() {
                            Err(StepError::assertion("alarm history is empty"))
                        } else {
                            Ok(())
                        }
                    },
                )
                .await?;

            runner
                .verify(
                    API_TIMEOUT,
                    "setting alarm state to 'insufficient data'",
                    "Alarm setting state failed.",
                    async {
                        ctx.telemetry
                            .set_alarm_state(&alarm.alarm_id, AlarmState::InsufficientData)
                            .await
                            .map_err(StepError::from)
                    },
                )
                .await?;

            runner
                .verify(
                    API_TIMEOUT,
                    "verifying alarm state",
                    "Alarm state verification failed.",
                    waits::verify_alarm_state(
                        ctx.telemetry.as_ref(),
                        &alarm.alarm_id,
                        AlarmState::InsufficientData,
                    ),
                )
                .await?;

            runner
                .verify(
                    API_TIMEOUT,
                    "deleting alarm",
                    "Alarm deleting failed.",
                    async {
                        ctx.telemetry
                            .delete_alarm(&alarm.alarm_id)
                            .await
                            .map_err(StepError::from)
                    },
                )
                .await?;

            Ok(())
        })
    }
}

/// Alarm lifecycle bound to a booted instance's `cpu_util` meter.
pub struct AlarmOnInstanceScenario;

impl Scenario for AlarmOnInstanceScenario {
    fn name(&self) -> &'static str {
        "telemetry-alarm-on-instance"
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

            let request = test_server_request(ctx, "ost1-test-alarm-instance");
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

            let alarm_request = AlarmRequest {
                name: ctx.unique_name("ost1-test-cpu-alarm"),
                meter_name: "cpu_util".to_owned(),
                threshold: 80.0,
                comparison: Comparison::Ge,
                statistic: Statistic::Avg,
                period,
            };
            let alarm = runner
                .verify(
                    API_TIMEOUT,
                    "creating alarm",
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
                    API_TIMEOUT,
                    "getting list of alarms",
                    "Getting alarm list failed.",
                    async {
                        let query = [SampleQuery::project_eq(alarm.project_id.clone())];
                        let alarms = ctx.telemetry.list_alarms(&query).await?;
                        if alarms.iter().any(|a| a.alarm_id == alarm.alarm_id) {
                            Ok(())
                        } else {
                            Err(StepError::assertion(format!(
                                "alarm {} is not in the project's alarm list",
                                alarm.alarm_id
                            )))
                        }
                    },
                )
                .await?;

            runner
                .verify(
                    STATE_TIMEOUT,
                    "waiting for 'ok' alarm state",
                    "Alarm state verification failed.",
                    waits::wait_for_alarm_state(
                        ctx.telemetry.as_ref(),
                        &alarm.alarm_id,
                        AlarmState::Ok,
                        STATE_TIMEOUT,
                        interval,
                    ),
                )
                .await?;

            runner
                .verify(
                    API_TIMEOUT,
                    "lowering alarm threshold",
                    "Alarm update failed.",
                    async {
                        ctx.telemetry
                            .update_alarm_threshold(&alarm.alarm_id, 0.0)
                            .await
                            .map_err(StepError::from)
                            .map(|_| ())
                    },
                )
                .await?;

            runner
                .verify(
                    STATE_TIMEOUT,
                    "waiting for 'alarm' alarm state",
                    "Alarm state verification failed.",
                    waits::wait_for_alarm_state(
                        ctx.telemetry.as_ref(),
                        &alarm.alarm_id,
                        AlarmState::Alarm,
                        STATE_TIMEOUT,
                        interval,
                    ),
                )
                .await?;

            runner
                .verify(
                    API_TIMEOUT,
                    "getting alarm history",
                    "Alarm history verification failed.",
                    async {
                        let history = ctx.telemetry.alarm_history(&alarm.alarm_id).await?;
                        if history.is_empty() {
                            Err(StepError::assertion("alarm history is empty"))
                        } else {
                            Ok(())
                        }
                    },
                )
                .await?;

            runner
                .verify(
                    API_TIMEOUT,
                    "restoring alarm threshold",
                    "Alarm update failed.",
                    async {
                        ctx.telemetry
                            .update_alarm_threshold(&alarm.alarm_id, 80.0)
                            .await
                            .map_err(StepError::from)
                            .map(|_| ())
                    },
                )
                .await?;

            runner
                .verify(
                    API_TIMEOUT,
                    "setting alarm state to 'insufficient data'",
                    "Alarm setting state failed.",
                    async {
                        ctx.telemetry
                            .set_alarm_state(&alarm.alarm_id, AlarmState::InsufficientData)
                            .await
                            .map_err(StepError::from)
                    },
                )
                .await?;

            runner
                .verify(
                    API_TIMEOUT,
                    "verifying alarm state",
                    "Alarm state verification failed.",
                    waits::verify_alarm_state(
                        ctx.telemetry.as_ref(),
                        &alarm.alarm_id,
                        AlarmState::InsufficientData,
                    ),
                )
                .await?;

            runner
                .verify(
                    API_TIMEOUT,
                    "deleting alarm",
                    "Alarm deleting failed.",
                    async {
                        ctx.telemetry
                            .delete_alarm(&alarm.alarm_id)
                            .await
                            .map_err(StepError::from)
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

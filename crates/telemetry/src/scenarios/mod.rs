//! Telemetry verification scenarios.
//!
//! Each scenario is a fixed step sequence; ordinals come from the step
//! executor and failure messages are the operator-facing text shown in the
//! report. Step budgets are generous: polls bound themselves and report the
//! last observation on timeout.

mod alarms;
mod instances;
mod notifications;
mod samples;

use std::time::Duration;

use stackhealth_core::context::CloudContext;
use stackhealth_core::error::StackhealthError;
use stackhealth_core::scenario::ScenarioRegistry;

pub use alarms::{AlarmLifecycleScenario, AlarmOnInstanceScenario};
pub use instances::{EventsAndTraitsScenario, InstanceMetricsScenario};
pub use notifications::{
    ClusterNotificationsScenario, IdentityNotificationsScenario, ImageNotificationsScenario,
    NetworkNotificationsScenario, VolumeNotificationsScenario,
};
pub use samples::SampleLifecycleScenario;

/// Budget for one-shot API-call steps.
pub(crate) const API_TIMEOUT: Duration = Duration::from_secs(60);
/// Budget for waiting out instance provisioning.
pub(crate) const BOOT_TIMEOUT: Duration = Duration::from_secs(300);
/// Budget for meter and event propagation waits.
pub(crate) const METRIC_TIMEOUT: Duration = Duration::from_secs(600);
/// Budget for alarm state transitions.
pub(crate) const STATE_TIMEOUT: Duration = Duration::from_secs(1000);

pub(crate) fn poll_interval(ctx: &CloudContext) -> Duration {
    Duration::from_secs(ctx.config.telemetry.poll_interval_secs)
}

pub(crate) fn owned(meters: &[&str]) -> Vec<String> {
    meters.iter().map(|m| (*m).to_owned()).collect()
}

pub(crate) fn defer_server_cleanup(ctx: &CloudContext, server_id: &str) {
    let compute = ctx.compute.clone();
    let id = server_id.to_owned();
    ctx.defer_cleanup("test instance", move || async move {
        compute.delete_server(&id).await
    });
}

pub(crate) fn defer_alarm_cleanup(ctx: &CloudContext, alarm_id: &str) {
    let telemetry = ctx.telemetry.clone();
    let id = alarm_id.to_owned();
    ctx.defer_cleanup("test alarm", move || async move {
        telemetry.delete_alarm(&id).await
    });
}

/// Register every telemetry scenario, in the order reports should list them.
pub fn register_scenarios(registry: &mut ScenarioRegistry) -> Result<(), StackhealthError> {
    registry.register(Box::new(AlarmLifecycleScenario))?;
    registry.register(Box::new(AlarmOnInstanceScenario))?;
    registry.register(Box::new(InstanceMetricsScenario))?;
    registry.register(Box::new(SampleLifecycleScenario))?;
    registry.register(Box::new(EventsAndTraitsScenario))?;
    registry.register(Box::new(VolumeNotificationsScenario))?;
    registry.register(Box::new(ImageNotificationsScenario))?;
    registry.register(Box::new(IdentityNotificationsScenario))?;
    registry.register(Box::new(NetworkNotificationsScenario))?;
    registry.register(Box::new(ClusterNotificationsScenario))?;
    Ok(())
}

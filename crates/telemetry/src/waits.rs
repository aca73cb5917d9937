//! Telemetry wait and check primitives used by the scenario steps.
//!
//! Waits poll through [`poll_until`] and so inherit its timeout semantics:
//! the loop bounds itself, reports the last observation on timeout, and
//! treats a vanished resource as [`StepError::Gone`]. Checks are one-shot.

use std::time::Duration;

use tracing::debug;

use stackhealth_core::clients::TelemetryClient;
use stackhealth_core::error::StepError;
use stackhealth_core::poll::poll_until;
use stackhealth_core::types::{
    AlarmState, EventRecord, MeterStatistic, Sample, SampleQuery, TraitDescription,
};

/// Wait until an alarm reaches the target state.
pub async fn wait_for_alarm_state(
    telemetry: &dyn TelemetryClient,
    alarm_id: &str,
    target: AlarmState,
    timeout: Duration,
    interval: Duration,
) -> Result<AlarmState, StepError> {
    wait_for_alarm_state_in(telemetry, alarm_id, &[target], timeout, interval).await
}

/// Wait until an alarm reaches any of the target states.
pub async fn wait_for_alarm_state_in(
    telemetry: &dyn TelemetryClient,
    alarm_id: &str,
    targets: &[AlarmState],
    timeout: Duration,
    interval: Duration,
) -> Result<AlarmState, StepError> {
    let wanted = targets
        .iter()
        .map(|s| format!("'{s}'"))
        .collect::<Vec<_>>()
        .join(" or ");
    let what = format!("alarm {alarm_id} state {wanted}");
    poll_until(
        timeout,
        interval,
        &what,
        || telemetry.get_alarm_state(alarm_id),
        |state| Ok(targets.contains(state)),
    )
    .await
}

/// One-shot alarm state assertion.
pub async fn verify_alarm_state(
    telemetry: &dyn TelemetryClient,
    alarm_id: &str,
    expected: AlarmState,
) -> Result<(), StepError> {
    let state = telemetry.get_alarm_state(alarm_id).await?;
    if state == expected {
        Ok(())
    } else {
        Err(StepError::assertion(format!(
            "alarm {alarm_id} state is '{state}', expected '{expected}'"
        )))
    }
}

/// Wait until at least one of the expected meters has produced a sample
/// matching the query.
///
/// An empty meter table is trivially satisfied: nothing is expected.
pub async fn wait_metrics(
    telemetry: &dyn TelemetryClient,
    meters: &[String],
    query: &[SampleQuery],
    timeout: Duration,
    interval: Duration,
) -> Result<(), StepError> {
    if meters.is_empty() {
        debug!("no meters expected, nothing to wait for");
        return Ok(());
    }
    let what = format!("samples for any of {meters:?}");
    poll_until(
        timeout,
        interval,
        &what,
        || async move {
            let mut observed = 0usize;
            for meter in meters {
                if !telemetry.list_samples(meter, query).await?.is_empty() {
                    observed += 1;
                }
            }
            Ok(observed)
        },
        |observed| Ok(*observed > 0),
    )
    .await
    .map(|_| ())
}

/// Wait until a meter has more than `count` samples matching the query.
pub async fn wait_samples_count(
    telemetry: &dyn TelemetryClient,
    meter: &str,
    query: &[SampleQuery],
    count: usize,
    timeout: Duration,
    interval: Duration,
) -> Result<Vec<Sample>, StepError> {
    let what = format!("more than {count} samples of meter {meter}");
    poll_until(
        timeout,
        interval,
        &what,
        || telemetry.list_samples(meter, query),
        |samples| Ok(samples.len() > count),
    )
    .await
}

/// Wait until statistics for a meter are available.
pub async fn wait_for_statistic_of_metric(
    telemetry: &dyn TelemetryClient,
    meter: &str,
    query: &[SampleQuery],
    period: Option<u64>,
    timeout: Duration,
    interval: Duration,
) -> Result<Vec<MeterStatistic>, StepError> {
    let what = format!("statistics for meter {meter}");
    poll_until(
        timeout,
        interval,
        &what,
        || telemetry.statistics(meter, query, period),
        |stats| Ok(!stats.is_empty()),
    )
    .await
}

/// Wait until the service advertises an event type.
pub async fn check_event_type(
    telemetry: &dyn TelemetryClient,
    event_type: &str,
    timeout: Duration,
    interval: Duration,
) -> Result<(), StepError> {
    let what = format!("event type {event_type}");
    poll_until(
        timeout,
        interval,
        &what,
        || telemetry.list_event_types(),
        |types| Ok(types.iter().any(|t| t == event_type)),
    )
    .await
    .map(|_| ())
}

/// Wait until at least one event matches the query; yields the first match.
pub async fn wait_for_event(
    telemetry: &dyn TelemetryClient,
    query: &[SampleQuery],
    timeout: Duration,
    interval: Duration,
) -> Result<EventRecord, StepError> {
    let what = format!("event matching {query:?}");
    let mut events = poll_until(
        timeout,
        interval,
        &what,
        || telemetry.list_events(query),
        |events| Ok(!events.is_empty()),
    )
    .await?;
    // Non-empty by the accept condition.
    Ok(events.remove(0))
}

/// Check that the trait descriptions of an event type cover the expected
/// trait names.
pub async fn check_traits(
    telemetry: &dyn TelemetryClient,
    event_type: &str,
    expected: &[&str],
) -> Result<Vec<TraitDescription>, StepError> {
    let descriptions = telemetry.trait_descriptions(event_type).await?;
    let missing: Vec<&str> = expected
        .iter()
        .filter(|name| !descriptions.iter().any(|d| d.name == **name))
        .copied()
        .collect();
    if missing.is_empty() {
        Ok(descriptions)
    } else {
        Err(StepError::assertion(format!(
            "event type {event_type} is missing trait descriptions for {missing:?}"
        )))
    }
}

/// Check that an event can be fetched back by its message id.
pub async fn check_event_message_id(
    telemetry: &dyn TelemetryClient,
    message_id: &str,
) -> Result<EventRecord, StepError> {
    let event = telemetry.get_event(message_id).await?;
    if event.message_id == message_id {
        Ok(event)
    } else {
        Err(StepError::assertion(format!(
            "event fetched by message id {message_id} reports id {}",
            event.message_id
        )))
    }
}

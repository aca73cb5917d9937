//! Poll-until-condition helpers.
//!
//! A polling step queries an external resource's observable state until a
//! predicate holds or the deadline elapses. The loop enforces its own
//! wall-clock budget so that a timeout can report the last observed state;
//! the step executor's backstop only catches actions that fail to bound
//! themselves.

use std::fmt::Debug;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, trace};

use crate::clients::{CloudResult, ComputeClient};
use crate::error::StepError;
use crate::types::{Server, ServerStatus};

/// Repeatedly fetch a resource state until `accept` says it matches.
///
/// * `Ok(true)` from `accept` stops the loop and yields the value; no
///   further query is issued after the match.
/// * `Ok(false)` remembers the observation and sleeps `interval`.
/// * `Err` aborts immediately (e.g. a resource that entered a terminal
///   error state is an assertion failure, not a timeout).
///
/// A not-found error from `fetch` aborts with [`StepError::Gone`]: a
/// resource vanishing mid-poll is a distinct failure class, never retried.
/// Retryable client errors (5xx, 429, connection faults) count as "not yet
/// observable" and keep the loop going until the deadline.
pub async fn poll_until<T, F, Fut, A>(
    timeout: Duration,
    interval: Duration,
    what: &str,
    mut fetch: F,
    mut accept: A,
) -> Result<T, StepError>
where
    T: Debug,
    F: FnMut() -> Fut,
    Fut: Future<Output = CloudResult<T>>,
    A: FnMut(&T) -> Result<bool, StepError>,
{
    let deadline = Instant::now() + timeout;
    let mut last_observed: Option<String> = None;

    loop {
        match fetch().await {
            Ok(value) => {
                if accept(&value)? {
                    debug!(what, "poll condition satisfied");
                    return Ok(value);
                }
                last_observed = Some(format!("{value:?}"));
            }
            Err(err) if err.is_not_found() => {
                return Err(StepError::Gone {
                    resource: what.to_owned(),
                });
            }
            Err(err) if err.is_retryable() => {
                trace!(what, %err, "transient error while polling");
                last_observed = Some(err.to_string());
            }
            Err(err) => return Err(StepError::Cloud(err)),
        }

        if Instant::now() + interval > deadline {
            return Err(StepError::Timeout {
                condition: what.to_owned(),
                waited: timeout,
                last_observed,
            });
        }
        tokio::time::sleep(interval).await;
    }
}

/// Wait until a server reaches `target` status.
///
/// A server that lands in `ERROR` while another status is expected fails
/// immediately as an assertion: provisioning is broken, not slow.
pub async fn wait_for_server_status(
    compute: &dyn ComputeClient,
    server_id: &str,
    target: ServerStatus,
    timeout: Duration,
    interval: Duration,
) -> Result<Server, StepError> {
    let what = format!("server {server_id} status {target}");
    poll_until(
        timeout,
        interval,
        &what,
        || compute.get_server(server_id),
        |server| {
            if server.status == target {
                return Ok(true);
            }
            if server.status == ServerStatus::Error {
                return Err(StepError::assertion(format!(
                    "server {server_id} entered ERROR state"
                )));
            }
            Ok(false)
        },
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU32, Ordering};

    use crate::error::CloudError;

    const FAST: Duration = Duration::from_millis(10);

    #[tokio::test(start_paused = true)]
    async fn stops_polling_at_first_match() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_in = calls.clone();
        let result = poll_until(
            Duration::from_secs(60),
            FAST,
            "status ACTIVE",
            move || {
                let calls = calls_in.clone();
                async move {
                    let n = calls.fetch_add(1, Ordering::SeqCst) + 1;
                    Ok::<_, CloudError>(if n >= 3 { "ACTIVE" } else { "BUILD" })
                }
            },
            |status| Ok(*status == "ACTIVE"),
        )
        .await
        .unwrap();
        assert_eq!(result, "ACTIVE");
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn never_true_condition_times_out_with_last_observation() {
        let err = poll_until(
            Duration::from_secs(2),
            FAST,
            "alarm state 'ok'",
            || async { Ok::<_, CloudError>("insufficient data") },
            |_| Ok(false),
        )
        .await
        .unwrap_err();
        match err {
            StepError::Timeout {
                condition,
                last_observed,
                ..
            } => {
                assert_eq!(condition, "alarm state 'ok'");
                assert_eq!(last_observed.as_deref(), Some("\"insufficient data\""));
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn empty_result_set_never_satisfies_non_empty_expectation() {
        let err = poll_until(
            Duration::from_secs(1),
            FAST,
            "samples for image",
            || async { Ok::<_, CloudError>(Vec::<u32>::new()) },
            |samples| Ok(!samples.is_empty()),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, StepError::Timeout { .. }));
    }

    #[tokio::test(start_paused = true)]
    async fn vanished_resource_aborts_as_gone() {
        let calls = Arc::new(AtomicU32::new(0));
        let calls_in = calls.clone();
        let err = poll_until(
            Duration::from_secs(60),
            FAST,
            "alarm a-1",
            move || {
                let calls = calls_in.clone();
                async move {
                    if calls.fetch_add(1, Ordering::SeqCst) == 0 {
                        Ok("insufficient data")
                    } else {
                        Err(CloudError::not_found("alarm a-1"))
                    }
                }
            },
            |_| Ok(false),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, StepError::Gone { .. }));
        // Not retried forever: exactly one poll after the resource vanished.
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn transient_errors_are_retried_until_deadline() {
        let err = poll_until(
            Duration::from_secs(1),
            FAST,
            "server list",
            || async {
                Err::<u32, _>(CloudError::Api {
                    code: 503,
                    message: "unavailable".to_owned(),
                })
            },
            |_| Ok(true),
        )
        .await
        .unwrap_err();
        match err {
            StepError::Timeout { last_observed, .. } => {
                assert!(last_observed.unwrap().contains("503"));
            }
            other => panic!("expected timeout, got {other:?}"),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn non_retryable_error_surfaces_unchanged() {
        let err = poll_until(
            Duration::from_secs(60),
            FAST,
            "bad request",
            || async { Err::<u32, _>(CloudError::InvalidRequest("missing field".to_owned())) },
            |_| Ok(true),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, StepError::Cloud(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn accept_error_aborts_immediately() {
        let err = poll_until(
            Duration::from_secs(60),
            FAST,
            "server status",
            || async { Ok::<_, CloudError>("ERROR") },
            |status| {
                if *status == "ERROR" {
                    Err(StepError::assertion("server entered ERROR state"))
                } else {
                    Ok(false)
                }
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, StepError::Assertion { .. }));
    }
}

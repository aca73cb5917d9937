//! Hand-pushed sample lifecycle.

use std::time::Duration;

use stackhealth_core::clients::BoxFuture;
use stackhealth_core::context::CloudContext;
use stackhealth_core::error::{ScenarioError, StepError};
use stackhealth_core::scenario::Scenario;
use stackhealth_core::step::StepRunner;
use stackhealth_core::types::{SampleQuery, SampleRequest};

use crate::waits;

use super::{API_TIMEOUT, METRIC_TIMEOUT, poll_interval};

/// Pushes a sample by hand and verifies it becomes queryable: list, create,
/// resource match, count growth, resource lookup.
pub struct SampleLifecycleScenario;

impl Scenario for SampleLifecycleScenario {
    fn name(&self) -> &'static str {
        "telemetry-sample-lifecycle"
    }

    fn component(&self) -> &'static str {
        "telemetry"
    }

    fn duration_budget(&self) -> Duration {
        Duration::from_secs(180)
    }

    fn run<'a>(
        &'a self,
        ctx: &'a CloudContext,
        runner: &'a mut StepRunner,
    ) -> BoxFuture<'a, Result<(), ScenarioError>> {
        Box::pin(async move {
            let interval = poll_interval(ctx);
            let resource_id = ctx.unique_name("ost1-test-sample");
            let query = [SampleQuery::resource_eq(resource_id.clone())];

            let before = runner
                .verify(
                    API_TIMEOUT,
                    "getting samples of 'image' meter",
                    "Getting samples failed.",
                    async {
                        ctx.telemetry
                            .list_samples("image", &query)
                            .await
                            .map_err(StepError::from)
                    },
                )
                .await?;

            let request = SampleRequest {
                resource_id: resource_id.clone(),
                counter_name: "image".to_owned(),
                counter_type: "delta".to_owned(),
                counter_unit: "image".to_owned(),
                counter_volume: 1.0,
                resource_metadata: Default::default(),
            };
            let sample = runner
                .verify(
                    API_TIMEOUT,
                    "creating sample",
                    "Creation of sample failed.",
                    async {
                        ctx.telemetry
                            .create_sample(&request)
                            .await
                            .map_err(StepError::from)
                    },
                )
                .await?;

            runner.verify_value(
                "verifying sample resource",
                "Resource of sample does not match.",
                &sample.resource_id,
                &resource_id,
            )?;

            runner
                .verify(
                    METRIC_TIMEOUT,
                    "waiting for samples count to grow",
                    "Samples count did not grow.",
                    async {
                        waits::wait_samples_count(
                            ctx.telemetry.as_ref(),
                            "image",
                            &query,
                            before.len(),
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
                    "getting resource of sample",
                    "Getting resource failed.",
                    async {
                        ctx.telemetry
                            .get_resource(&resource_id)
                            .await
                            .map_err(StepError::from)
                            .map(|_| ())
                    },
                )
                .await?;

            Ok(())
        })
    }
}

//! Notification scenarios: create a service's resources and verify the
//! meters the service is expected to emit for them.

use std::time::Duration;

use stackhealth_core::clients::BoxFuture;
use stackhealth_core::context::CloudContext;
use stackhealth_core::error::{ScenarioError, StepError};
use stackhealth_core::meters;
use stackhealth_core::poll::wait_for_server_status;
use stackhealth_core::scenario::Scenario;
use stackhealth_core::step::StepRunner;
use stackhealth_core::types::{SampleQuery, ServerStatus};

use crate::helpers::{
    self, find_and_check_image, glance_helper, identity_helper, neutron_helper, sahara_helper,
    volume_helper,
};
use crate::waits;

use super::{API_TIMEOUT, BOOT_TIMEOUT, METRIC_TIMEOUT, defer_server_cleanup, owned, poll_interval};

async fn wait_resource_meters(
    ctx: &CloudContext,
    meter_table: &[&str],
    resource_id: &str,
) -> Result<(), StepError> {
    let query = [SampleQuery::resource_eq(resource_id.to_owned())];
    waits::wait_metrics(
        ctx.telemetry.as_ref(),
        &owned(meter_table),
        &query,
        METRIC_TIMEOUT,
        poll_interval(ctx),
    )
    .await
}

/// Volume and snapshot notifications for an attached test volume.
///
/// Skips when the deployment has no storage backend at all.
pub struct VolumeNotificationsScenario;

impl Scenario for VolumeNotificationsScenario {
    fn name(&self) -> &'static str {
        "telemetry-volume-notifications"
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
            if !ctx.config.volume.storage_available() {
                return Err(ScenarioError::skipped(
                    "There are no storage nodes for volumes",
                ));
            }
            let interval = poll_interval(ctx);

            let request = helpers::test_server_request(ctx, "ost1-test-volume-notifications");
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

            let (volume, snapshot) = runner
                .verify(
                    API_TIMEOUT,
                    "creating volume and snapshot",
                    "Creation of volume or snapshot failed.",
                    volume_helper(ctx, &server.id),
                )
                .await?;

            runner
                .verify(
                    METRIC_TIMEOUT,
                    "waiting for snapshot meters",
                    "Snapshot meters did not appear.",
                    wait_resource_meters(ctx, meters::SNAPSHOT_NOTIFICATIONS, &snapshot.id),
                )
                .await?;

            runner
                .verify(
                    METRIC_TIMEOUT,
                    "waiting for volume meters",
                    "Volume meters did not appear.",
                    wait_resource_meters(ctx, meters::VOLUME_NOTIFICATIONS, &volume.id),
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

/// Image notifications for a freshly created test image.
pub struct ImageNotificationsScenario;

impl Scenario for ImageNotificationsScenario {
    fn name(&self) -> &'static str {
        "telemetry-image-notifications"
    }

    fn component(&self) -> &'static str {
        "telemetry"
    }

    fn duration_budget(&self) -> Duration {
        Duration::from_secs(300)
    }

    fn run<'a>(
        &'a self,
        ctx: &'a CloudContext,
        runner: &'a mut StepRunner,
    ) -> BoxFuture<'a, Result<(), ScenarioError>> {
        Box::pin(async move {
            let image = runner
                .verify(
                    API_TIMEOUT,
                    "creating image",
                    "Creation of image failed.",
                    glance_helper(ctx),
                )
                .await?;

            runner
                .verify(
                    METRIC_TIMEOUT,
                    "waiting for image meters",
                    "Image meters did not appear.",
                    wait_resource_meters(ctx, meters::GLANCE_NOTIFICATIONS, &image.id),
                )
                .await?;

            Ok(())
        })
    }
}

/// Identity notifications for a project, user, role, group, and trust.
pub struct IdentityNotificationsScenario;

impl Scenario for IdentityNotificationsScenario {
    fn name(&self) -> &'static str {
        "telemetry-identity-notifications"
    }

    fn component(&self) -> &'static str {
        "telemetry"
    }

    fn duration_budget(&self) -> Duration {
        Duration::from_secs(300)
    }

    fn run<'a>(
        &'a self,
        ctx: &'a CloudContext,
        runner: &'a mut StepRunner,
    ) -> BoxFuture<'a, Result<(), ScenarioError>> {
        Box::pin(async move {
            let bundle = runner
                .verify(
                    API_TIMEOUT,
                    "creating identity resources",
                    "Creation of identity resources failed.",
                    identity_helper(ctx),
                )
                .await?;

            runner
                .verify(
                    METRIC_TIMEOUT,
                    "waiting for project meters",
                    "Project meters did not appear.",
                    wait_resource_meters(ctx, meters::KEYSTONE_PROJECT_NOTIFICATIONS, &bundle.tenant.id),
                )
                .await?;

            runner
                .verify(
                    METRIC_TIMEOUT,
                    "waiting for user meters",
                    "User meters did not appear.",
                    wait_resource_meters(ctx, meters::KEYSTONE_USER_NOTIFICATIONS, &bundle.user.id),
                )
                .await?;

            runner
                .verify(
                    METRIC_TIMEOUT,
                    "waiting for role meters",
                    "Role meters did not appear.",
                    wait_resource_meters(ctx, meters::KEYSTONE_ROLE_NOTIFICATIONS, &bundle.role.id),
                )
                .await?;

            runner
                .verify(
                    METRIC_TIMEOUT,
                    "waiting for group meters",
                    "Group meters did not appear.",
                    wait_resource_meters(ctx, meters::KEYSTONE_GROUP_NOTIFICATIONS, &bundle.group.id),
                )
                .await?;

            runner
                .verify(
                    METRIC_TIMEOUT,
                    "waiting for trust meters",
                    "Trust meters did not appear.",
                    wait_resource_meters(ctx, meters::KEYSTONE_TRUST_NOTIFICATIONS, &bundle.trust.id),
                )
                .await?;

            Ok(())
        })
    }
}

/// Networking notifications for a network, subnet, port, router, and
/// floating IP.
pub struct NetworkNotificationsScenario;

impl Scenario for NetworkNotificationsScenario {
    fn name(&self) -> &'static str {
        "telemetry-network-notifications"
    }

    fn component(&self) -> &'static str {
        "telemetry"
    }

    fn duration_budget(&self) -> Duration {
        Duration::from_secs(300)
    }

    fn run<'a>(
        &'a self,
        ctx: &'a CloudContext,
        runner: &'a mut StepRunner,
    ) -> BoxFuture<'a, Result<(), ScenarioError>> {
        Box::pin(async move {
            let bundle = runner
                .verify(
                    API_TIMEOUT,
                    "creating network resources",
                    "Creation of network resources failed.",
                    neutron_helper(ctx),
                )
                .await?;

            runner
                .verify(
                    METRIC_TIMEOUT,
                    "waiting for network meters",
                    "Network meters did not appear.",
                    wait_resource_meters(ctx, meters::NEUTRON_NETWORK_NOTIFICATIONS, &bundle.network.id),
                )
                .await?;

            runner
                .verify(
                    METRIC_TIMEOUT,
                    "waiting for subnet meters",
                    "Subnet meters did not appear.",
                    wait_resource_meters(ctx, meters::NEUTRON_SUBNET_NOTIFICATIONS, &bundle.subnet.id),
                )
                .await?;

            runner
                .verify(
                    METRIC_TIMEOUT,
                    "waiting for port meters",
                    "Port meters did not appear.",
                    wait_resource_meters(ctx, meters::NEUTRON_PORT_NOTIFICATIONS, &bundle.port.id),
                )
                .await?;

            runner
                .verify(
                    METRIC_TIMEOUT,
                    "waiting for router meters",
                    "Router meters did not appear.",
                    wait_resource_meters(ctx, meters::NEUTRON_ROUTER_NOTIFICATIONS, &bundle.router.id),
                )
                .await?;

            runner
                .verify(
                    METRIC_TIMEOUT,
                    "waiting for floating ip meters",
                    "Floating IP meters did not appear.",
                    wait_resource_meters(
                        ctx,
                        meters::NEUTRON_FLOATING_IP_NOTIFICATIONS,
                        &bundle.floating_ip.id,
                    ),
                )
                .await?;

            Ok(())
        })
    }
}

/// Cluster notifications for a data-processing cluster.
///
/// Skips when no image is registered for the configured plugin.
pub struct ClusterNotificationsScenario;

impl Scenario for ClusterNotificationsScenario {
    fn name(&self) -> &'static str {
        "telemetry-cluster-notifications"
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
            let image = runner
                .verify(
                    API_TIMEOUT,
                    "finding image registered for the plugin",
                    "No registered image found.",
                    find_and_check_image(ctx),
                )
                .await?;

            let cluster = runner
                .verify(
                    API_TIMEOUT,
                    "creating cluster",
                    "Creation of cluster failed.",
                    sahara_helper(ctx, &image.id),
                )
                .await?;

            runner
                .verify(
                    METRIC_TIMEOUT,
                    "waiting for cluster meters",
                    "Cluster meters did not appear.",
                    wait_resource_meters(ctx, meters::SAHARA_CLUSTER_NOTIFICATIONS, &cluster.id),
                )
                .await?;

            Ok(())
        })
    }
}

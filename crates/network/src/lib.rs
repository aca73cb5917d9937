//! stackhealth-network -- end-to-end connectivity verification.
//!
//! One scenario builds a full networking stack (security group, routers,
//! network, subnet, instance, floating IP), proves the instance reachable
//! from the harness host, and tears everything down in explicit steps.

use std::time::Duration;

use tracing::debug;

use stackhealth_core::clients::{BoxFuture, ComputeClient};
use stackhealth_core::context::CloudContext;
use stackhealth_core::error::{ScenarioError, StackhealthError, StepError, StepFailure};
use stackhealth_core::poll::{poll_until, wait_for_server_status};
use stackhealth_core::scenario::{Scenario, ScenarioRegistry};
use stackhealth_core::step::StepRunner;
use stackhealth_core::types::{ServerRequest, ServerStatus};

/// Budget for one-shot API-call steps.
const API_TIMEOUT: Duration = Duration::from_secs(60);
/// Budget for instance provisioning (creation plus status wait).
const BOOT_TIMEOUT: Duration = Duration::from_secs(300);

/// Register the networking scenarios.
pub fn register_scenarios(registry: &mut ScenarioRegistry) -> Result<(), StackhealthError> {
    registry.register(Box::new(ConnectivityScenario))
}

/// Precondition: the configured test image must be registered.
///
/// Absence is a skip; a listing error is reported as a failure before the
/// first step (ordinal 0).
async fn check_test_image(ctx: &CloudContext) -> Result<(), ScenarioError> {
    let wanted = ctx.config.compute.test_image_name();
    let images = ctx.image.list_images().await.map_err(|err| {
        ScenarioError::Step(StepFailure {
            ordinal: 0,
            message: "Image listing failed.".to_owned(),
            error: StepError::from(err),
        })
    })?;
    if images.iter().any(|image| image.name == wanted) {
        Ok(())
    } else {
        Err(ScenarioError::skipped(format!(
            "image {wanted} is not registered"
        )))
    }
}

/// Probe an address until it answers, within the configured ping budget.
async fn wait_reachable(
    compute: &dyn ComputeClient,
    address: &str,
    attempts: u32,
    interval: Duration,
) -> Result<(), StepError> {
    let timeout = interval * attempts;
    let what = format!("address {address} answering pings");
    poll_until(
        timeout,
        interval,
        &what,
        || compute.ping(address),
        |reachable| Ok(*reachable),
    )
    .await
    .map(|_| ())
}

/// Builds the full networking stack around a booted instance, verifies
/// reachability through a floating IP, and deletes everything in order.
pub struct ConnectivityScenario;

impl Scenario for ConnectivityScenario {
    fn name(&self) -> &'static str {
        "network-connectivity"
    }

    fn component(&self) -> &'static str {
        "network"
    }

    fn duration_budget(&self) -> Duration {
        Duration::from_secs(1200)
    }

    fn run<'a>(
        &'a self,
        ctx: &'a CloudContext,
        runner: &'a mut StepRunner,
    ) -> BoxFuture<'a, Result<(), ScenarioError>> {
        Box::pin(async move {
            check_test_image(ctx).await?;

            let ping_attempts = ctx.config.network.ping_attempts;
            let ping_interval = Duration::from_secs(ctx.config.network.ping_interval_secs);
            let ping_budget = ping_interval * ping_attempts;

            let group = runner
                .verify(
                    API_TIMEOUT,
                    "creating security group",
                    "Security group creation failed.",
                    async {
                        ctx.compute
                            .create_security_group(&ctx.unique_name("ost1-test-secgroup"))
                            .await
                            .map_err(StepError::from)
                    },
                )
                .await?;
            {
                let compute = ctx.compute.clone();
                let id = group.id.clone();
                ctx.defer_cleanup("security group", move || async move {
                    compute.delete_security_group(&id).await
                });
            }

            let router = runner
                .verify(
                    API_TIMEOUT,
                    "creating router",
                    "Router creation failed.",
                    async {
                        ctx.network
                            .create_router(&ctx.unique_name("ost1-test-router"))
                            .await
                            .map_err(StepError::from)
                    },
                )
                .await?;
            {
                let network = ctx.network.clone();
                let id = router.id.clone();
                ctx.defer_cleanup("router", move || async move {
                    network.delete_router(&id).await
                });
            }

            let second_router = runner
                .verify(
                    API_TIMEOUT,
                    "creating second router",
                    "Router creation failed.",
                    async {
                        ctx.network
                            .create_router(&ctx.unique_name("ost1-test-router2"))
                            .await
                            .map_err(StepError::from)
                    },
                )
                .await?;
            {
                let network = ctx.network.clone();
                let id = second_router.id.clone();
                ctx.defer_cleanup("second router", move || async move {
                    network.delete_router(&id).await
                });
            }

            let net = runner
                .verify(
                    API_TIMEOUT,
                    "creating network",
                    "Network creation failed.",
                    async {
                        ctx.network
                            .create_network(&ctx.unique_name("ost1-test-net"))
                            .await
                            .map_err(StepError::from)
                    },
                )
                .await?;
            {
                let network = ctx.network.clone();
                let id = net.id.clone();
                ctx.defer_cleanup("network", move || async move {
                    network.delete_network(&id).await
                });
            }

            let subnet = runner
                .verify(
                    API_TIMEOUT,
                    "creating subnet",
                    "Subnet creation failed.",
                    async {
                        ctx.network
                            .create_subnet(
                                &ctx.unique_name("ost1-test-subnet"),
                                &net.id,
                                &ctx.config.network.subnet_cidr,
                            )
                            .await
                            .map_err(StepError::from)
                    },
                )
                .await?;
            {
                let network = ctx.network.clone();
                let id = subnet.id.clone();
                ctx.defer_cleanup("subnet", move || async move {
                    network.delete_subnet(&id).await
                });
            }

            runner
                .verify(
                    API_TIMEOUT,
                    "uplinking subnet to router",
                    "Subnet uplink failed.",
                    async {
                        ctx.network
                            .attach_subnet(&router.id, &subnet.id)
                            .await
                            .map_err(StepError::from)
                    },
                )
                .await?;
            {
                let network = ctx.network.clone();
                let router_id = router.id.clone();
                let subnet_id = subnet.id.clone();
                ctx.defer_cleanup("subnet uplink", move || async move {
                    network.detach_subnet(&router_id, &subnet_id).await
                });
            }

            let request = ServerRequest {
                name: ctx.unique_name("ost1-test-connectivity"),
                security_groups: vec![group.name.clone()],
                network_id: Some(net.id.clone()),
                image_name: Some(ctx.config.compute.test_image_name().to_owned()),
                flavor_name: Some(ctx.config.compute.flavor_name.clone()),
            };
            let server = runner
                .verify(
                    BOOT_TIMEOUT,
                    "creating instance in the network",
                    "Instance is not available.",
                    async {
                        let server = ctx.compute.create_server(&request).await?;
                        let compute = ctx.compute.clone();
                        let id = server.id.clone();
                        ctx.defer_cleanup("test instance", move || async move {
                            compute.delete_server(&id).await
                        });
                        debug!(server = server.id.as_str(), "instance created, waiting for boot");
                        wait_for_server_status(
                            ctx.compute.as_ref(),
                            &server.id,
                            ServerStatus::Active,
                            BOOT_TIMEOUT,
                            ping_interval,
                        )
                        .await
                    },
                )
                .await?;

            let floating_ip = runner
                .verify(
                    API_TIMEOUT,
                    "creating floating ip",
                    "Floating IP creation failed.",
                    async {
                        ctx.compute
                            .create_floating_ip(&ctx.config.network.floating_ip_pool)
                            .await
                            .map_err(StepError::from)
                    },
                )
                .await?;
            {
                let compute = ctx.compute.clone();
                let id = floating_ip.id.clone();
                ctx.defer_cleanup("floating ip", move || async move {
                    compute.delete_floating_ip(&id).await
                });
            }

            runner
                .verify(
                    API_TIMEOUT,
                    "assigning floating ip to instance",
                    "Floating IP assignment failed.",
                    async {
                        ctx.compute
                            .assign_floating_ip(&server.id, &floating_ip.id)
                            .await
                            .map_err(StepError::from)
                    },
                )
                .await?;

            runner
                .verify(
                    API_TIMEOUT,
                    "updating second router",
                    "Router update failed.",
                    async {
                        ctx.network
                            .update_router(&second_router.id)
                            .await
                            .map_err(StepError::from)
                            .map(|_| ())
                    },
                )
                .await?;

            runner
                .verify(
                    API_TIMEOUT,
                    "getting router hosting agent",
                    "Getting router hosting agent failed.",
                    async {
                        let agent = ctx
                            .network
                            .router_hosting_agent(&second_router.id)
                            .await?;
                        if agent.is_empty() {
                            Err(StepError::assertion("no L3 agent hosts the router"))
                        } else {
                            Ok(())
                        }
                    },
                )
                .await?;

            runner
                .verify(
                    ping_budget,
                    "pinging the floating ip",
                    "Instance is not reachable by its floating IP.",
                    wait_reachable(
                        ctx.compute.as_ref(),
                        &floating_ip.ip,
                        ping_attempts,
                        ping_interval,
                    ),
                )
                .await?;

            runner
                .verify(
                    API_TIMEOUT,
                    "disassociating floating ip",
                    "Floating IP disassociation failed.",
                    async {
                        ctx.compute
                            .remove_floating_ip(&server.id, &floating_ip.id)
                            .await
                            .map_err(StepError::from)
                    },
                )
                .await?;

            runner
                .verify(
                    API_TIMEOUT,
                    "deleting floating ip",
                    "Floating IP deletion failed.",
                    async {
                        ctx.compute
                            .delete_floating_ip(&floating_ip.id)
                            .await
                            .map_err(StepError::from)
                    },
                )
                .await?;

            runner
                .verify(
                    API_TIMEOUT,
                    "deleting instance",
                    "Instance deletion failed.",
                    async {
                        ctx.compute
                            .delete_server(&server.id)
                            .await
                            .map_err(StepError::from)
                    },
                )
                .await?;

            runner
                .verify(
                    API_TIMEOUT,
                    "removing router",
                    "Router deletion failed.",
                    async {
                        ctx.network
                            .delete_router(&router.id)
                            .await
                            .map_err(StepError::from)
                    },
                )
                .await?;

            runner
                .verify(
                    API_TIMEOUT,
                    "removing second router",
                    "Router deletion failed.",
                    async {
                        ctx.network
                            .delete_router(&second_router.id)
                            .await
                            .map_err(StepError::from)
                    },
                )
                .await?;

            runner
                .verify(
                    API_TIMEOUT,
                    "removing subnet",
                    "Subnet deletion failed.",
                    async {
                        ctx.network
                            .delete_subnet(&subnet.id)
                            .await
                            .map_err(StepError::from)
                    },
                )
                .await?;

            runner
                .verify(
                    API_TIMEOUT,
                    "removing network",
                    "Network deletion failed.",
                    async {
                        ctx.network
                            .delete_network(&net.id)
                            .await
                            .map_err(StepError::from)
                    },
                )
                .await?;

            Ok(())
        })
    }
}

//! Resource-bundle helpers: create the fixtures a scenario measures and
//! register their teardown on the run context.
//!
//! Every created resource gets a deferred cleanup immediately, so a later
//! step failing can never leak it. Cleanups run newest-first, which keeps
//! dependent resources (snapshot before volume, trust before user) valid
//! during teardown.

use stackhealth_core::context::CloudContext;
use stackhealth_core::error::StepError;
use stackhealth_core::meters::IMAGE_PLUGIN_TAG_PREFIX;
use stackhealth_core::types::{
    Cluster, ClusterRequest, Group, Image, Role, ServerRequest, Snapshot, Tenant, Trust, User,
    Volume,
};
use stackhealth_core::types::{FloatingIp, Network, Port, Router, Subnet};

/// Identity fixtures measured by the identity-notifications scenario.
pub struct IdentityBundle {
    pub tenant: Tenant,
    pub user: User,
    pub role: Role,
    pub group: Group,
    pub trust: Trust,
}

/// Networking fixtures measured by the network-notifications scenario.
pub struct NeutronBundle {
    pub network: Network,
    pub subnet: Subnet,
    pub port: Port,
    pub router: Router,
    pub floating_ip: FloatingIp,
}

/// Request for a scenario-owned test instance, built from configuration.
pub fn test_server_request(ctx: &CloudContext, prefix: &str) -> ServerRequest {
    ServerRequest {
        name: ctx.unique_name(prefix),
        image_name: Some(ctx.config.compute.test_image_name().to_owned()),
        flavor_name: Some(ctx.config.compute.flavor_name.clone()),
        ..Default::default()
    }
}

/// Create a test image and defer its deletion.
pub async fn glance_helper(ctx: &CloudContext) -> Result<Image, StepError> {
    let image = ctx
        .image
        .create_image(&ctx.unique_name("ost1-test-image"))
        .await?;
    let client = ctx.image.clone();
    let id = image.id.clone();
    ctx.defer_cleanup("test image", move || async move {
        client.delete_image(&id).await
    });
    Ok(image)
}

/// Create a tenant, user, role, group, and trust, deferring all deletions.
pub async fn identity_helper(ctx: &CloudContext) -> Result<IdentityBundle, StepError> {
    let tenant = ctx
        .identity
        .create_tenant(&ctx.unique_name("ost1-test-tenant"))
        .await?;
    let client = ctx.identity.clone();
    let id = tenant.id.clone();
    ctx.defer_cleanup("test tenant", move || async move {
        client.delete_tenant(&id).await
    });

    let user = ctx
        .identity
        .create_user(&ctx.unique_name("ost1-test-user"), &tenant.id)
        .await?;
    let client = ctx.identity.clone();
    let id = user.id.clone();
    ctx.defer_cleanup("test user", move || async move {
        client.delete_user(&id).await
    });

    let role = ctx
        .identity
        .create_role(&ctx.unique_name("ost1-test-role"))
        .await?;
    let client = ctx.identity.clone();
    let id = role.id.clone();
    ctx.defer_cleanup("test role", move || async move {
        client.delete_role(&id).await
    });

    let group = ctx
        .identity
        .create_group(&ctx.unique_name("ost1-test-group"))
        .await?;
    let client = ctx.identity.clone();
    let id = group.id.clone();
    ctx.defer_cleanup("test group", move || async move {
        client.delete_group(&id).await
    });

    let trust = ctx.identity.create_trust(&user.id, &role.id).await?;
    let client = ctx.identity.clone();
    let id = trust.id.clone();
    ctx.defer_cleanup("test trust", move || async move {
        client.delete_trust(&id).await
    });

    Ok(IdentityBundle {
        tenant,
        user,
        role,
        group,
        trust,
    })
}

/// Create a network, subnet, port, router, and floating IP, deferring all
/// deletions.
pub async fn neutron_helper(ctx: &CloudContext) -> Result<NeutronBundle, StepError> {
    let network = ctx
        .network
        .create_network(&ctx.unique_name("ost1-test-net"))
        .await?;
    let client = ctx.network.clone();
    let id = network.id.clone();
    ctx.defer_cleanup("test network", move || async move {
        client.delete_network(&id).await
    });

    let subnet = ctx
        .network
        .create_subnet(
            &ctx.unique_name("ost1-test-subnet"),
            &network.id,
            &ctx.config.network.subnet_cidr,
        )
        .await?;
    let client = ctx.network.clone();
    let id = subnet.id.clone();
    ctx.defer_cleanup("test subnet", move || async move {
        client.delete_subnet(&id).await
    });

    let port = ctx.network.create_port(&network.id).await?;
    let client = ctx.network.clone();
    let id = port.id.clone();
    ctx.defer_cleanup("test port", move || async move {
        client.delete_port(&id).await
    });

    let router = ctx
        .network
        .create_router(&ctx.unique_name("ost1-test-router"))
        .await?;
    let client = ctx.network.clone();
    let id = router.id.clone();
    ctx.defer_cleanup("test router", move || async move {
        client.delete_router(&id).await
    });

    let floating_ip = ctx
        .compute
        .create_floating_ip(&ctx.config.network.floating_ip_pool)
        .await?;
    let client = ctx.compute.clone();
    let id = floating_ip.id.clone();
    ctx.defer_cleanup("test floating ip", move || async move {
        client.delete_floating_ip(&id).await
    });

    Ok(NeutronBundle {
        network,
        subnet,
        port,
        router,
        floating_ip,
    })
}

/// Create a volume attached to the given server plus a snapshot of it,
/// deferring both deletions (snapshot first).
pub async fn volume_helper(
    ctx: &CloudContext,
    server_id: &str,
) -> Result<(Volume, Snapshot), StepError> {
    let volume = ctx.volume.create_volume(1).await?;
    let client = ctx.volume.clone();
    let id = volume.id.clone();
    ctx.defer_cleanup("test volume", move || async move {
        client.delete_volume(&id).await
    });

    ctx.volume.attach_volume(server_id, &volume.id).await?;

    let snapshot = ctx.volume.create_snapshot(&volume.id).await?;
    let client = ctx.volume.clone();
    let id = snapshot.id.clone();
    ctx.defer_cleanup("test snapshot", move || async move {
        client.delete_snapshot(&id).await
    });

    Ok((volume, snapshot))
}

/// Create a data-processing cluster from a registered image, deferring its
/// deletion.
pub async fn sahara_helper(ctx: &CloudContext, image_id: &str) -> Result<Cluster, StepError> {
    let request = ClusterRequest {
        name: ctx.unique_name("ost1-test-cluster"),
        image_id: image_id.to_owned(),
        plugin_name: ctx.config.data_processing.plugin_name.clone(),
        plugin_version: ctx.config.data_processing.plugin_version.clone(),
    };
    let cluster = ctx.data_processing.create_cluster(&request).await?;
    let client = ctx.data_processing.clone();
    let id = cluster.id.clone();
    ctx.defer_cleanup("test cluster", move || async move {
        client.delete_cluster(&id).await
    });
    Ok(cluster)
}

/// Find an image tagged for the configured data-processing plugin.
///
/// Absence is a skip condition, not a failure: the deployment simply has no
/// image registered for the plugin.
pub async fn find_and_check_image(ctx: &CloudContext) -> Result<Image, StepError> {
    let plugin_tag = format!(
        "{IMAGE_PLUGIN_TAG_PREFIX}{}",
        ctx.config.data_processing.plugin_name
    );
    let version_tag = format!(
        "{IMAGE_PLUGIN_TAG_PREFIX}{}",
        ctx.config.data_processing.plugin_version
    );
    let images = ctx.image.list_images().await?;
    images
        .into_iter()
        .find(|image| {
            image.properties.get(&plugin_tag).map(String::as_str) == Some("true")
                && image.properties.get(&version_tag).map(String::as_str) == Some("true")
        })
        .ok_or_else(|| {
            StepError::skipped(format!(
                "no image registered for data-processing plugin {} {}",
                ctx.config.data_processing.plugin_name, ctx.config.data_processing.plugin_version
            ))
        })
}

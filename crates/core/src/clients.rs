//! Client traits -- the minimal surface scenarios need from each service.
//!
//! Scenarios never talk to an SDK directly. Each service family is an
//! interface with exactly the methods the scenarios invoke, implemented by
//! an adapter over the real client (or by the in-memory fake from
//! `stackhealth-testkit`). The traits return [`BoxFuture`] so client handles
//! can live behind `Arc<dyn ...>` in the run context.

use std::future::Future;
use std::pin::Pin;

use crate::error::CloudError;
use crate::types::{
    Alarm, AlarmHistoryEntry, AlarmRequest, AlarmState, Cluster, ClusterRequest, EventRecord,
    EventTrait, Flavor, FloatingIp, Group, Image, MeterStatistic, MeteredResource, Network, Port,
    Role, Router, Sample, SampleQuery, SampleRequest, SecurityGroup, Server, ServerRequest,
    Snapshot, Subnet, Tenant, Trust, User, Volume,
};

/// Boxed future used by the dyn-compatible client traits.
pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Result alias for client calls.
pub type CloudResult<T> = Result<T, CloudError>;

/// Compute service: servers, flavors, security groups, floating IPs.
pub trait ComputeClient: Send + Sync {
    fn create_server<'a>(&'a self, req: &'a ServerRequest) -> BoxFuture<'a, CloudResult<Server>>;
    fn get_server<'a>(&'a self, id: &'a str) -> BoxFuture<'a, CloudResult<Server>>;
    fn delete_server<'a>(&'a self, id: &'a str) -> BoxFuture<'a, CloudResult<()>>;
    fn get_flavor<'a>(&'a self, id: &'a str) -> BoxFuture<'a, CloudResult<Flavor>>;
    fn create_security_group<'a>(
        &'a self,
        name: &'a str,
    ) -> BoxFuture<'a, CloudResult<SecurityGroup>>;
    fn delete_security_group<'a>(&'a self, id: &'a str) -> BoxFuture<'a, CloudResult<()>>;
    fn create_floating_ip<'a>(&'a self, pool: &'a str) -> BoxFuture<'a, CloudResult<FloatingIp>>;
    fn assign_floating_ip<'a>(
        &'a self,
        server_id: &'a str,
        ip_id: &'a str,
    ) -> BoxFuture<'a, CloudResult<()>>;
    fn remove_floating_ip<'a>(
        &'a self,
        server_id: &'a str,
        ip_id: &'a str,
    ) -> BoxFuture<'a, CloudResult<()>>;
    fn delete_floating_ip<'a>(&'a self, ip_id: &'a str) -> BoxFuture<'a, CloudResult<()>>;
    /// Probe connectivity to an address from the harness host.
    fn ping<'a>(&'a self, address: &'a str) -> BoxFuture<'a, CloudResult<bool>>;
}

/// Networking service: routers, networks, subnets, ports.
pub trait NetworkClient: Send + Sync {
    fn create_router<'a>(&'a self, name: &'a str) -> BoxFuture<'a, CloudResult<Router>>;
    /// Touch the router (no-op update used as a liveness check).
    fn update_router<'a>(&'a self, id: &'a str) -> BoxFuture<'a, CloudResult<Router>>;
    /// Name of the L3 agent hosting the router.
    fn router_hosting_agent<'a>(&'a self, id: &'a str) -> BoxFuture<'a, CloudResult<String>>;
    fn delete_router<'a>(&'a self, id: &'a str) -> BoxFuture<'a, CloudResult<()>>;
    fn create_network<'a>(&'a self, name: &'a str) -> BoxFuture<'a, CloudResult<Network>>;
    fn delete_network<'a>(&'a self, id: &'a str) -> BoxFuture<'a, CloudResult<()>>;
    fn create_subnet<'a>(
        &'a self,
        name: &'a str,
        network_id: &'a str,
        cidr: &'a str,
    ) -> BoxFuture<'a, CloudResult<Subnet>>;
    fn delete_subnet<'a>(&'a self, id: &'a str) -> BoxFuture<'a, CloudResult<()>>;
    fn attach_subnet<'a>(
        &'a self,
        router_id: &'a str,
        subnet_id: &'a str,
    ) -> BoxFuture<'a, CloudResult<()>>;
    fn detach_subnet<'a>(
        &'a self,
        router_id: &'a str,
        subnet_id: &'a str,
    ) -> BoxFuture<'a, CloudResult<()>>;
    fn create_port<'a>(&'a self, network_id: &'a str) -> BoxFuture<'a, CloudResult<Port>>;
    fn delete_port<'a>(&'a self, id: &'a str) -> BoxFuture<'a, CloudResult<()>>;
}

/// Telemetry service: alarms, samples, statistics, events, traits.
pub trait TelemetryClient: Send + Sync {
    fn create_alarm<'a>(&'a self, req: &'a AlarmRequest) -> BoxFuture<'a, CloudResult<Alarm>>;
    fn get_alarm<'a>(&'a self, alarm_id: &'a str) -> BoxFuture<'a, CloudResult<Alarm>>;
    fn list_alarms<'a>(
        &'a self,
        query: &'a [SampleQuery],
    ) -> BoxFuture<'a, CloudResult<Vec<Alarm>>>;
    fn update_alarm_threshold<'a>(
        &'a self,
        alarm_id: &'a str,
        threshold: f64,
    ) -> BoxFuture<'a, CloudResult<Alarm>>;
    fn set_alarm_state<'a>(
        &'a self,
        alarm_id: &'a str,
        state: AlarmState,
    ) -> BoxFuture<'a, CloudResult<()>>;
    fn get_alarm_state<'a>(&'a self, alarm_id: &'a str) -> BoxFuture<'a, CloudResult<AlarmState>>;
    fn alarm_history<'a>(
        &'a self,
        alarm_id: &'a str,
    ) -> BoxFuture<'a, CloudResult<Vec<AlarmHistoryEntry>>>;
    fn delete_alarm<'a>(&'a self, alarm_id: &'a str) -> BoxFuture<'a, CloudResult<()>>;

    fn list_samples<'a>(
        &'a self,
        meter: &'a str,
        query: &'a [SampleQuery],
    ) -> BoxFuture<'a, CloudResult<Vec<Sample>>>;
    fn create_sample<'a>(&'a self, req: &'a SampleRequest) -> BoxFuture<'a, CloudResult<Sample>>;
    fn statistics<'a>(
        &'a self,
        meter: &'a str,
        query: &'a [SampleQuery],
        period: Option<u64>,
    ) -> BoxFuture<'a, CloudResult<Vec<MeterStatistic>>>;
    fn get_resource<'a>(
        &'a self,
        resource_id: &'a str,
    ) -> BoxFuture<'a, CloudResult<MeteredResource>>;

    fn list_event_types<'a>(&'a self) -> BoxFuture<'a, CloudResult<Vec<String>>>;
    fn list_events<'a>(
        &'a self,
        query: &'a [SampleQuery],
    ) -> BoxFuture<'a, CloudResult<Vec<EventRecord>>>;
    fn get_event<'a>(&'a self, message_id: &'a str) -> BoxFuture<'a, CloudResult<EventRecord>>;
    fn trait_descriptions<'a>(
        &'a self,
        event_type: &'a str,
    ) -> BoxFuture<'a, CloudResult<Vec<crate::types::TraitDescription>>>;
    fn list_traits<'a>(
        &'a self,
        event_type: &'a str,
        trait_name: &'a str,
    ) -> BoxFuture<'a, CloudResult<Vec<EventTrait>>>;
}

/// Block storage service: volumes and snapshots.
pub trait VolumeClient: Send + Sync {
    fn create_volume<'a>(&'a self, size_gb: u32) -> BoxFuture<'a, CloudResult<Volume>>;
    fn attach_volume<'a>(
        &'a self,
        server_id: &'a str,
        volume_id: &'a str,
    ) -> BoxFuture<'a, CloudResult<()>>;
    fn delete_volume<'a>(&'a self, id: &'a str) -> BoxFuture<'a, CloudResult<()>>;
    fn create_snapshot<'a>(&'a self, volume_id: &'a str) -> BoxFuture<'a, CloudResult<Snapshot>>;
    fn delete_snapshot<'a>(&'a self, id: &'a str) -> BoxFuture<'a, CloudResult<()>>;
}

/// Identity service: projects, users, roles, groups, trusts.
pub trait IdentityClient: Send + Sync {
    fn create_tenant<'a>(&'a self, name: &'a str) -> BoxFuture<'a, CloudResult<Tenant>>;
    fn create_user<'a>(
        &'a self,
        name: &'a str,
        tenant_id: &'a str,
    ) -> BoxFuture<'a, CloudResult<User>>;
    fn create_role<'a>(&'a self, name: &'a str) -> BoxFuture<'a, CloudResult<Role>>;
    fn create_group<'a>(&'a self, name: &'a str) -> BoxFuture<'a, CloudResult<Group>>;
    fn create_trust<'a>(
        &'a self,
        trustor_user_id: &'a str,
        role_id: &'a str,
    ) -> BoxFuture<'a, CloudResult<Trust>>;
    fn delete_tenant<'a>(&'a self, id: &'a str) -> BoxFuture<'a, CloudResult<()>>;
    fn delete_user<'a>(&'a self, id: &'a str) -> BoxFuture<'a, CloudResult<()>>;
    fn delete_role<'a>(&'a self, id: &'a str) -> BoxFuture<'a, CloudResult<()>>;
    fn delete_group<'a>(&'a self, id: &'a str) -> BoxFuture<'a, CloudResult<()>>;
    fn delete_trust<'a>(&'a self, id: &'a str) -> BoxFuture<'a, CloudResult<()>>;
}

/// Image service.
pub trait ImageClient: Send + Sync {
    fn create_image<'a>(&'a self, name: &'a str) -> BoxFuture<'a, CloudResult<Image>>;
    fn list_images<'a>(&'a self) -> BoxFuture<'a, CloudResult<Vec<Image>>>;
    fn delete_image<'a>(&'a self, id: &'a str) -> BoxFuture<'a, CloudResult<()>>;
}

/// Data-processing service: clusters.
pub trait DataProcessingClient: Send + Sync {
    fn create_cluster<'a>(&'a self, req: &'a ClusterRequest)
    -> BoxFuture<'a, CloudResult<Cluster>>;
    fn get_cluster<'a>(&'a self, id: &'a str) -> BoxFuture<'a, CloudResult<Cluster>>;
    fn delete_cluster<'a>(&'a self, id: &'a str) -> BoxFuture<'a, CloudResult<()>>;
}

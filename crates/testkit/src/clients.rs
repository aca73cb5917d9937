//! Client trait implementations over the shared fake state.
//!
//! Every method takes the state lock, performs the operation synchronously,
//! and completes immediately; the lock is never held across an await.

use stackhealth_core::clients::{
    BoxFuture, CloudResult, ComputeClient, DataProcessingClient, IdentityClient, ImageClient,
    NetworkClient, TelemetryClient, VolumeClient,
};
use stackhealth_core::types::{
    Alarm, AlarmHistoryEntry, AlarmRequest, AlarmState, Cluster, ClusterRequest, EventRecord,
    EventTrait, Flavor, FloatingIp, Group, Image, MeterStatistic, MeteredResource, Network, Port,
    Role, Router, Sample, SampleQuery, SampleRequest, SecurityGroup, Server, ServerRequest,
    Snapshot, Subnet, Tenant, TraitDescription, Trust, User, Volume,
};

use crate::FakeCloud;

impl ComputeClient for FakeCloud {
    fn create_server<'a>(&'a self, req: &'a ServerRequest) -> BoxFuture<'a, CloudResult<Server>> {
        Box::pin(async move { self.lock().create_server(req) })
    }

    fn get_server<'a>(&'a self, id: &'a str) -> BoxFuture<'a, CloudResult<Server>> {
        Box::pin(async move { self.lock().get_server(id) })
    }

    fn delete_server<'a>(&'a self, id: &'a str) -> BoxFuture<'a, CloudResult<()>> {
        Box::pin(async move { self.lock().delete_server(id) })
    }

    fn get_flavor<'a>(&'a self, id: &'a str) -> BoxFuture<'a, CloudResult<Flavor>> {
        Box::pin(async move { self.lock().get_flavor(id) })
    }

    fn create_security_group<'a>(
        &'a self,
        name: &'a str,
    ) -> BoxFuture<'a, CloudResult<SecurityGroup>> {
        Box::pin(async move { Ok(self.lock().create_security_group(name)) })
    }

    fn delete_security_group<'a>(&'a self, id: &'a str) -> BoxFuture<'a, CloudResult<()>> {
        Box::pin(async move { self.lock().delete_security_group(id) })
    }

    fn create_floating_ip<'a>(&'a self, pool: &'a str) -> BoxFuture<'a, CloudResult<FloatingIp>> {
        Box::pin(async move { Ok(self.lock().create_floating_ip(pool)) })
    }

    fn assign_floating_ip<'a>(
        &'a self,
        server_id: &'a str,
        ip_id: &'a str,
    ) -> BoxFuture<'a, CloudResult<()>> {
        Box::pin(async move { self.lock().assign_floating_ip(server_id, ip_id) })
    }

    fn remove_floating_ip<'a>(
        &'a self,
        server_id: &'a str,
        ip_id: &'a str,
    ) -> BoxFuture<'a, CloudResult<()>> {
        Box::pin(async move { self.lock().remove_floating_ip(server_id, ip_id) })
    }

    fn delete_floating_ip<'a>(&'a self, ip_id: &'a str) -> BoxFuture<'a, CloudResult<()>> {
        Box::pin(async move { self.lock().delete_floating_ip(ip_id) })
    }

    fn ping<'a>(&'a self, address: &'a str) -> BoxFuture<'a, CloudResult<bool>> {
        Box::pin(async move { Ok(self.lock().ping(address)) })
    }
}

impl NetworkClient for FakeCloud {
    fn create_router<'a>(&'a self, name: &'a str) -> BoxFuture<'a, CloudResult<Router>> {
        Box::pin(async move { Ok(self.lock().create_router(name)) })
    }

    fn update_router<'a>(&'a self, id: &'a str) -> BoxFuture<'a, CloudResult<Router>> {
        Box::pin(async move { self.lock().update_router(id) })
    }

    fn router_hosting_agent<'a>(&'a self, id: &'a str) -> BoxFuture<'a, CloudResult<String>> {
        Box::pin(async move { self.lock().router_hosting_agent(id) })
    }

    fn delete_router<'a>(&'a self, id: &'a str) -> BoxFuture<'a, CloudResult<()>> {
        Box::pin(async move { self.lock().delete_router(id) })
    }

    fn create_network<'a>(&'a self, name: &'a str) -> BoxFuture<'a, CloudResult<Network>> {
        Box::pin(async move { Ok(self.lock().create_network(name)) })
    }

    fn delete_network<'a>(&'a self, id: &'a str) -> BoxFuture<'a, CloudResult<()>> {
        Box::pin(async move { self.lock().delete_network(id) })
    }

    fn create_subnet<'a>(
        &'a self,
        name: &'a str,
        network_id: &'a str,
        cidr: &'a str,
    ) -> BoxFuture<'a, CloudResult<Subnet>> {
        Box::pin(async move { self.lock().create_subnet(name, network_id, cidr) })
    }

    fn delete_subnet<'a>(&'a self, id: &'a str) -> BoxFuture<'a, CloudResult<()>> {
        Box::pin(async move { self.lock().delete_subnet(id) })
    }

    fn attach_subnet<'a>(
        &'a self,
        router_id: &'a str,
        subnet_id: &'a str,
    ) -> BoxFuture<'a, CloudResult<()>> {
        Box::pin(async move { self.lock().attach_subnet(router_id, subnet_id) })
    }

    fn detach_subnet<'a>(
        &'a self,
        router_id: &'a str,
        subnet_id: &'a str,
    ) -> BoxFuture<'a, CloudResult<()>> {
        Box::pin(async move { self.lock().detach_subnet(router_id, subnet_id) })
    }

    fn create_port<'a>(&'a self, network_id: &'a str) -> BoxFuture<'a, CloudResult<Port>> {
        Box::pin(async move { self.lock().create_port(network_id) })
    }

    fn delete_port<'a>(&'a self, id: &'a str) -> BoxFuture<'a, CloudResult<()>> {
        Box::pin(async move { self.lock().delete_port(id) })
    }
}

impl TelemetryClient for FakeCloud {
    fn create_alarm<'a>(&'a self, req: &'a AlarmRequest) -> BoxFuture<'a, CloudResult<Alarm>> {
        Box::pin(async move { Ok(self.lock().create_alarm(req)) })
    }

    fn get_alarm<'a>(&'a self, alarm_id: &'a str) -> BoxFuture<'a, CloudResult<Alarm>> {
        Box::pin(async move { self.lock().get_alarm(alarm_id) })
    }

    fn list_alarms<'a>(
        &'a self,
        query: &'a [SampleQuery],
    ) -> BoxFuture<'a, CloudResult<Vec<Alarm>>> {
        Box::pin(async move { Ok(self.lock().list_alarms(query)) })
    }

    fn update_alarm_threshold<'a>(
        &'a self,
        alarm_id: &'a str,
        threshold: f64,
    ) -> BoxFuture<'a, CloudResult<Alarm>> {
        Box::pin(async move { self.lock().update_alarm_threshold(alarm_id, threshold) })
    }

    fn set_alarm_state<'a>(
        &'a self,
        alarm_id: &'a str,
        state: AlarmState,
    ) -> BoxFuture<'a, CloudResult<()>> {
        Box::pin(async move { self.lock().set_alarm_state(alarm_id, state) })
    }

    fn get_alarm_state<'a>(&'a self, alarm_id: &'a str) -> BoxFuture<'a, CloudResult<AlarmState>> {
        Box::pin(async move { self.lock().get_alarm_state(alarm_id) })
    }

    fn alarm_history<'a>(
        &'a self,
        alarm_id: &'a str,
    ) -> BoxFuture<'a, CloudResult<Vec<AlarmHistoryEntry>>> {
        Box::pin(async move { self.lock().alarm_history(alarm_id) })
    }

    fn delete_alarm<'a>(&'a self, alarm_id: &'a str) -> BoxFuture<'a, CloudResult<()>> {
        Box::pin(async move { self.lock().delete_alarm(alarm_id) })
    }

    fn list_samples<'a>(
        &'a self,
        meter: &'a str,
        query: &'a [SampleQuery],
    ) -> BoxFuture<'a, CloudResult<Vec<Sample>>> {
        Box::pin(async move { Ok(self.lock().list_samples(meter, query)) })
    }

    fn create_sample<'a>(&'a self, req: &'a SampleRequest) -> BoxFuture<'a, CloudResult<Sample>> {
        Box::pin(async move { Ok(self.lock().create_sample(req)) })
    }

    fn statistics<'a>(
        &'a self,
        meter: &'a str,
        query: &'a [SampleQuery],
        _period: Option<u64>,
    ) -> BoxFuture<'a, CloudResult<Vec<MeterStatistic>>> {
        Box::pin(async move { Ok(self.lock().statistics(meter, query)) })
    }

    fn get_resource<'a>(
        &'a self,
        resource_id: &'a str,
    ) -> BoxFuture<'a, CloudResult<MeteredResource>> {
        Box::pin(async move { self.lock().get_resource(resource_id) })
    }

    fn list_event_types<'a>(&'a self) -> BoxFuture<'a, CloudResult<Vec<String>>> {
        Box::pin(async move { Ok(self.lock().list_event_types()) })
    }

    fn list_events<'a>(
        &'a self,
        query: &'a [SampleQuery],
    ) -> BoxFuture<'a, CloudResult<Vec<EventRecord>>> {
        Box::pin(async move { Ok(self.lock().list_events(query)) })
    }

    fn get_event<'a>(&'a self, message_id: &'a str) -> BoxFuture<'a, CloudResult<EventRecord>> {
        Box::pin(async move { self.lock().get_event(message_id) })
    }

    fn trait_descriptions<'a>(
        &'a self,
        event_type: &'a str,
    ) -> BoxFuture<'a, CloudResult<Vec<TraitDescription>>> {
        Box::pin(async move { Ok(self.lock().trait_descriptions(event_type)) })
    }

    fn list_traits<'a>(
        &'a self,
        event_type: &'a str,
        trait_name: &'a str,
    ) -> BoxFuture<'a, CloudResult<Vec<EventTrait>>> {
        Box::pin(async move { Ok(self.lock().list_traits(event_type, trait_name)) })
    }
}

impl VolumeClient for FakeCloud {
    fn create_volume<'a>(&'a self, size_gb: u32) -> BoxFuture<'a, CloudResult<Volume>> {
        Box::pin(async move { self.lock().create_volume(size_gb) })
    }

    fn attach_volume<'a>(
        &'a self,
        server_id: &'a str,
        volume_id: &'a str,
    ) -> BoxFuture<'a, CloudResult<()>> {
        Box::pin(async move { self.lock().attach_volume(server_id, volume_id) })
    }

    fn delete_volume<'a>(&'a self, id: &'a str) -> BoxFuture<'a, CloudResult<()>> {
        Box::pin(async move { self.lock().delete_volume(id) })
    }

    fn create_snapshot<'a>(&'a self, volume_id: &'a str) -> BoxFuture<'a, CloudResult<Snapshot>> {
        Box::pin(async move { self.lock().create_snapshot(volume_id) })
    }

    fn delete_snapshot<'a>(&'a self, id: &'a str) -> BoxFuture<'a, CloudResult<()>> {
        Box::pin(async move { self.lock().delete_snapshot(id) })
    }
}

impl IdentityClient for FakeCloud {
    fn create_tenant<'a>(&'a self, name: &'a str) -> BoxFuture<'a, CloudResult<Tenant>> {
        Box::pin(async move { Ok(self.lock().create_tenant(name)) })
    }

    fn create_user<'a>(
        &'a self,
        name: &'a str,
        tenant_id: &'a str,
    ) -> BoxFuture<'a, CloudResult<User>> {
        Box::pin(async move { self.lock().create_user(name, tenant_id) })
    }

    fn create_role<'a>(&'a self, name: &'a str) -> BoxFuture<'a, CloudResult<Role>> {
        Box::pin(async move { Ok(self.lock().create_role(name)) })
    }

    fn create_group<'a>(&'a self, name: &'a str) -> BoxFuture<'a, CloudResult<Group>> {
        Box::pin(async move { Ok(self.lock().create_group(name)) })
    }

    fn create_trust<'a>(
        &'a self,
        trustor_user_id: &'a str,
        role_id: &'a str,
    ) -> BoxFuture<'a, CloudResult<Trust>> {
        Box::pin(async move { self.lock().create_trust(trustor_user_id, role_id) })
    }

    fn delete_tenant<'a>(&'a self, id: &'a str) -> BoxFuture<'a, CloudResult<()>> {
        Box::pin(async move { self.lock().delete_tenant(id) })
    }

    fn delete_user<'a>(&'a self, id: &'a str) -> BoxFuture<'a, CloudResult<()>> {
        Box::pin(async move { self.lock().delete_user(id) })
    }

    fn delete_role<'a>(&'a self, id: &'a str) -> BoxFuture<'a, CloudResult<()>> {
        Box::pin(async move { self.lock().delete_role(id) })
    }

    fn delete_group<'a>(&'a self, id: &'a str) -> BoxFuture<'a, CloudResult<()>> {
        Box::pin(async move { self.lock().delete_group(id) })
    }

    fn delete_trust<'a>(&'a self, id: &'a str) -> BoxFuture<'a, CloudResult<()>> {
        Box::pin(async move { self.lock().delete_trust(id) })
    }
}

impl ImageClient for FakeCloud {
    fn create_image<'a>(&'a self, name: &'a str) -> BoxFuture<'a, CloudResult<Image>> {
        Box::pin(async move { Ok(self.lock().create_image(name)) })
    }

    fn list_images<'a>(&'a self) -> BoxFuture<'a, CloudResult<Vec<Image>>> {
        Box::pin(async move { Ok(self.lock().list_images()) })
    }

    fn delete_image<'a>(&'a self, id: &'a str) -> BoxFuture<'a, CloudResult<()>> {
        Box::pin(async move { self.lock().delete_image(id) })
    }
}

impl DataProcessingClient for FakeCloud {
    fn create_cluster<'a>(
        &'a self,
        req: &'a ClusterRequest,
    ) -> BoxFuture<'a, CloudResult<Cluster>> {
        Box::pin(async move { self.lock().create_cluster(req) })
    }

    fn get_cluster<'a>(&'a self, id: &'a str) -> BoxFuture<'a, CloudResult<Cluster>> {
        Box::pin(async move { self.lock().get_cluster(id) })
    }

    fn delete_cluster<'a>(&'a self, id: &'a str) -> BoxFuture<'a, CloudResult<()>> {
        Box::pin(async move { self.lock().delete_cluster(id) })
    }
}

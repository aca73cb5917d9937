//! In-memory cloud state and the synchronous operations over it.
//!
//! All mutation happens under one mutex held by [`FakeCloud`]; the trait
//! impls in `clients` are thin async shims over the methods here.
//!
//! [`FakeCloud`]: crate::FakeCloud

use std::collections::{BTreeMap, BTreeSet, HashMap};

use stackhealth_core::error::CloudError;
use stackhealth_core::meters;
use stackhealth_core::types::{
    Alarm, AlarmHistoryEntry, AlarmRequest, AlarmState, Cluster, ClusterRequest, EventRecord,
    EventTrait, Flavor, FloatingIp, Group, Image, MeterStatistic, MeteredResource, Network, Port,
    Role, Router, Sample, SampleQuery, SampleRequest, SecurityGroup, Server, ServerRequest,
    ServerStatus, Snapshot, Subnet, Tenant, Trust, User, Volume,
};

/// Project all fake-owned resources and samples belong to.
pub const FAKE_PROJECT: &str = "proj-fake";

/// What a freshly created server turns into once its build polls run out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum BuildOutcome {
    /// Provisioning succeeds.
    #[default]
    Active,
    /// Provisioning fails with status ERROR.
    Error,
    /// The server never leaves BUILD.
    Stuck,
}

/// Injected failures, set through the builder.
#[derive(Debug, Clone, Default)]
pub(crate) struct Faults {
    pub create_server: Option<CloudError>,
    pub create_volume: Option<CloudError>,
    pub build_outcome: BuildOutcome,
    pub ping_unreachable: bool,
}

pub(crate) struct ServerEntry {
    pub server: Server,
    /// `get_server` calls remaining until the build outcome applies.
    pub polls_left: u32,
}

pub(crate) struct AlarmEntry {
    pub alarm: Alarm,
    /// Explicit state set via `set_alarm_state`; cleared on rule change.
    pub pinned: Option<AlarmState>,
}

pub(crate) struct FakeState {
    seq: u64,
    pub build_polls: u32,
    pub faults: Faults,
    /// Images seeded through the builder, not counted as scenario leftovers.
    pub baseline_images: usize,
    /// Fixed per-meter observations backing statistics and alarm evaluation.
    pub meter_values: HashMap<String, f64>,

    pub servers: HashMap<String, ServerEntry>,
    pub flavors: HashMap<String, Flavor>,
    pub security_groups: HashMap<String, SecurityGroup>,
    pub floating_ips: HashMap<String, FloatingIp>,
    pub networks: HashMap<String, Network>,
    pub subnets: HashMap<String, Subnet>,
    pub routers: HashMap<String, Router>,
    /// router id -> attached subnet ids.
    pub router_attachments: HashMap<String, Vec<String>>,
    pub ports: HashMap<String, Port>,
    pub alarms: HashMap<String, AlarmEntry>,
    /// Histories outlive their alarms, as the real service's do.
    pub alarm_histories: HashMap<String, Vec<AlarmHistoryEntry>>,
    pub samples: Vec<Sample>,
    pub events: Vec<EventRecord>,
    pub volumes: HashMap<String, Volume>,
    pub snapshots: HashMap<String, Snapshot>,
    pub tenants: HashMap<String, Tenant>,
    pub users: HashMap<String, User>,
    pub roles: HashMap<String, Role>,
    pub groups: HashMap<String, Group>,
    pub trusts: HashMap<String, Trust>,
    pub images: HashMap<String, Image>,
    pub clusters: HashMap<String, Cluster>,
}

impl FakeState {
    pub fn new(
        build_polls: u32,
        meter_values: HashMap<String, f64>,
        images: Vec<Image>,
        faults: Faults,
    ) -> Self {
        let baseline_images = images.len();
        Self {
            seq: 0,
            build_polls,
            faults,
            baseline_images,
            meter_values,
            servers: HashMap::new(),
            flavors: HashMap::new(),
            security_groups: HashMap::new(),
            floating_ips: HashMap::new(),
            networks: HashMap::new(),
            subnets: HashMap::new(),
            routers: HashMap::new(),
            router_attachments: HashMap::new(),
            ports: HashMap::new(),
            alarms: HashMap::new(),
            alarm_histories: HashMap::new(),
            samples: Vec::new(),
            events: Vec::new(),
            volumes: HashMap::new(),
            snapshots: HashMap::new(),
            tenants: HashMap::new(),
            users: HashMap::new(),
            roles: HashMap::new(),
            groups: HashMap::new(),
            trusts: HashMap::new(),
            images: images.into_iter().map(|i| (i.id.clone(), i)).collect(),
            clusters: HashMap::new(),
        }
    }

    fn next_id(&mut self, prefix: &str) -> String {
        self.seq += 1;
        format!("{prefix}-{:08x}", self.seq)
    }

    /// Resources created by scenarios that still exist.
    ///
    /// Seeded images do not count; everything else does.
    pub fn remaining_resources(&self) -> usize {
        self.servers.len()
            + self.security_groups.len()
            + self.floating_ips.len()
            + self.networks.len()
            + self.subnets.len()
            + self.routers.len()
            + self.ports.len()
            + self.alarms.len()
            + self.volumes.len()
            + self.snapshots.len()
            + self.tenants.len()
            + self.users.len()
            + self.roles.len()
            + self.groups.len()
            + self.trusts.len()
            + self.clusters.len()
            + self.images.len().saturating_sub(self.baseline_images)
    }

    /// Record one sample per meter against the given resource.
    fn notify(&mut self, meter_names: &[&str], resource_id: &str, volume: f64) {
        for meter in meter_names {
            self.samples.push(Sample {
                resource_id: resource_id.to_owned(),
                project_id: FAKE_PROJECT.to_owned(),
                counter_name: (*meter).to_owned(),
                counter_type: "gauge".to_owned(),
                counter_unit: "unit".to_owned(),
                counter_volume: volume,
            });
        }
    }

    /// Current observation for a meter: a fixed value if one is configured,
    /// otherwise the average of recorded samples.
    fn observed(&self, meter: &str) -> Option<f64> {
        if let Some(v) = self.meter_values.get(meter) {
            return Some(*v);
        }
        let matching: Vec<f64> = self
            .samples
            .iter()
            .filter(|s| s.counter_name == meter)
            .map(|s| s.counter_volume)
            .collect();
        if matching.is_empty() {
            None
        } else {
            Some(matching.iter().sum::<f64>() / matching.len() as f64)
        }
    }

    // -- compute ------------------------------------------------------------

    pub fn create_server(&mut self, req: &ServerRequest) -> Result<Server, CloudError> {
        if let Some(err) = self.faults.create_server.clone() {
            return Err(err);
        }
        let flavor_name = req.flavor_name.clone().unwrap_or_else(|| "m1.micro".to_owned());
        let flavor_id = format!("flavor-{flavor_name}");
        self.flavors.entry(flavor_id.clone()).or_insert_with(|| Flavor {
            id: flavor_id.clone(),
            name: flavor_name.clone(),
        });

        let id = self.next_id("srv");
        let status = if self.build_polls == 0 && self.faults.build_outcome == BuildOutcome::Active {
            ServerStatus::Active
        } else {
            ServerStatus::Build
        };
        let server = Server {
            id: id.clone(),
            name: req.name.clone(),
            status,
            flavor_id,
        };
        self.servers.insert(
            id.clone(),
            ServerEntry {
                server: server.clone(),
                polls_left: self.build_polls,
            },
        );

        self.notify(meters::NOVA_NOTIFICATIONS, &id, 1.0);
        let cpu = self.meter_values.get("cpu_util").copied().unwrap_or(60.0);
        self.notify(meters::NOVA_INSTANCE_POLLSTERS, &id, cpu);
        let per_flavor = format!("instance:{flavor_name}");
        self.notify(&[per_flavor.as_str()], &id, 1.0);
        let disk_resource = format!("{id}-vda");
        self.notify(meters::NOVA_DISK_DEVICE_POLLSTERS, &disk_resource, 1.0);

        let message_id = self.next_id("msg");
        let request_id = self.next_id("req");
        self.events.push(EventRecord {
            message_id,
            event_type: meters::INSTANCE_UPDATE_EVENT.to_owned(),
            traits: vec![
                EventTrait { name: "instance_id".to_owned(), value: id },
                EventTrait { name: "request_id".to_owned(), value: request_id },
                EventTrait { name: "state".to_owned(), value: "building".to_owned() },
                EventTrait { name: "service".to_owned(), value: "compute".to_owned() },
                EventTrait { name: "host".to_owned(), value: "fake-host".to_owned() },
            ],
        });

        Ok(server)
    }

    pub fn get_server(&mut self, id: &str) -> Result<Server, CloudError> {
        let outcome = self.faults.build_outcome;
        let entry = self
            .servers
            .get_mut(id)
            .ok_or_else(|| CloudError::not_found(format!("server {id}")))?;
        if entry.server.status == ServerStatus::Build && outcome != BuildOutcome::Stuck {
            if entry.polls_left > 0 {
                entry.polls_left -= 1;
            }
            if entry.polls_left == 0 {
                entry.server.status = match outcome {
                    BuildOutcome::Active => ServerStatus::Active,
                    BuildOutcome::Error => ServerStatus::Error,
                    BuildOutcome::Stuck => unreachable!(),
                };
            }
        }
        Ok(entry.server.clone())
    }

    pub fn delete_server(&mut self, id: &str) -> Result<(), CloudError> {
        self.servers
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| CloudError::not_found(format!("server {id}")))
    }

    pub fn get_flavor(&self, id: &str) -> Result<Flavor, CloudError> {
        self.flavors
            .get(id)
            .cloned()
            .ok_or_else(|| CloudError::not_found(format!("flavor {id}")))
    }

    pub fn create_security_group(&mut self, name: &str) -> SecurityGroup {
        let id = self.next_id("secgroup");
        let group = SecurityGroup {
            id: id.clone(),
            name: name.to_owned(),
        };
        self.security_groups.insert(id, group.clone());
        group
    }

    pub fn delete_security_group(&mut self, id: &str) -> Result<(), CloudError> {
        self.security_groups
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| CloudError::not_found(format!("security group {id}")))
    }

    pub fn create_floating_ip(&mut self, _pool: &str) -> FloatingIp {
        let id = self.next_id("fip");
        let ip = format!("172.16.0.{}", (self.seq % 250) + 1);
        let fip = FloatingIp {
            id: id.clone(),
            ip,
            server_id: None,
        };
        self.floating_ips.insert(id.clone(), fip.clone());
        self.notify(meters::NEUTRON_FLOATING_IP_NOTIFICATIONS, &id, 1.0);
        fip
    }

    pub fn assign_floating_ip(&mut self, server_id: &str, ip_id: &str) -> Result<(), CloudError> {
        if !self.servers.contains_key(server_id) {
            return Err(CloudError::not_found(format!("server {server_id}")));
        }
        let fip = self
            .floating_ips
            .get_mut(ip_id)
            .ok_or_else(|| CloudError::not_found(format!("floating ip {ip_id}")))?;
        fip.server_id = Some(server_id.to_owned());
        Ok(())
    }

    pub fn remove_floating_ip(&mut self, server_id: &str, ip_id: &str) -> Result<(), CloudError> {
        let fip = self
            .floating_ips
            .get_mut(ip_id)
            .ok_or_else(|| CloudError::not_found(format!("floating ip {ip_id}")))?;
        if fip.server_id.as_deref() != Some(server_id) {
            return Err(CloudError::InvalidRequest(format!(
                "floating ip {ip_id} is not associated with server {server_id}"
            )));
        }
        fip.server_id = None;
        Ok(())
    }

    pub fn delete_floating_ip(&mut self, ip_id: &str) -> Result<(), CloudError> {
        self.floating_ips
            .remove(ip_id)
            .map(|_| ())
            .ok_or_else(|| CloudError::not_found(format!("floating ip {ip_id}")))
    }

    pub fn ping(&self, _address: &str) -> bool {
        !self.faults.ping_unreachable
    }

    // -- networking ---------------------------------------------------------

    pub fn create_router(&mut self, name: &str) -> Router {
        let id = self.next_id("router");
        let router = Router {
            id: id.clone(),
            name: name.to_owned(),
        };
        self.routers.insert(id.clone(), router.clone());
        self.notify(meters::NEUTRON_ROUTER_NOTIFICATIONS, &id, 1.0);
        router
    }

    pub fn update_router(&mut self, id: &str) -> Result<Router, CloudError> {
        self.routers
            .get(id)
            .cloned()
            .ok_or_else(|| CloudError::not_found(format!("router {id}")))
    }

    pub fn router_hosting_agent(&self, id: &str) -> Result<String, CloudError> {
        if self.routers.contains_key(id) {
            Ok("fake-l3-agent".to_owned())
        } else {
            Err(CloudError::not_found(format!("router {id}")))
        }
    }

    pub fn delete_router(&mut self, id: &str) -> Result<(), CloudError> {
        self.router_attachments.remove(id);
        self.routers
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| CloudError::not_found(format!("router {id}")))
    }

    pub fn create_network(&mut self, name: &str) -> Network {
        let id = self.next_id("net");
        let network = Network {
            id: id.clone(),
            name: name.to_owned(),
        };
        self.networks.insert(id.clone(), network.clone());
        self.notify(meters::NEUTRON_NETWORK_NOTIFICATIONS, &id, 1.0);
        network
    }

    pub fn delete_network(&mut self, id: &str) -> Result<(), CloudError> {
        self.networks
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| CloudError::not_found(format!("network {id}")))
    }

    pub fn create_subnet(
        &mut self,
        name: &str,
        network_id: &str,
        cidr: &str,
    ) -> Result<Subnet, CloudError> {
        if !self.networks.contains_key(network_id) {
            return Err(CloudError::not_found(format!("network {network_id}")));
        }
        let id = self.next_id("subnet");
        let subnet = Subnet {
            id: id.clone(),
            name: name.to_owned(),
            network_id: network_id.to_owned(),
            cidr: cidr.to_owned(),
        };
        self.subnets.insert(id.clone(), subnet.clone());
        self.notify(meters::NEUTRON_SUBNET_NOTIFICATIONS, &id, 1.0);
        Ok(subnet)
    }

    pub fn delete_subnet(&mut self, id: &str) -> Result<(), CloudError> {
        self.subnets
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| CloudError::not_found(format!("subnet {id}")))
    }

    pub fn attach_subnet(&mut self, router_id: &str, subnet_id: &str) -> Result<(), CloudError> {
        if !self.routers.contains_key(router_id) {
            return Err(CloudError::not_found(format!("router {router_id}")));
        }
        if !self.subnets.contains_key(subnet_id) {
            return Err(CloudError::not_found(format!("subnet {subnet_id}")));
        }
        self.router_attachments
            .entry(router_id.to_owned())
            .or_default()
            .push(subnet_id.to_owned());
        Ok(())
    }

    pub fn detach_subnet(&mut self, router_id: &str, subnet_id: &str) -> Result<(), CloudError> {
        let attached = self
            .router_attachments
            .get_mut(router_id)
            .ok_or_else(|| CloudError::not_found(format!("router {router_id}")))?;
        let before = attached.len();
        attached.retain(|s| s != subnet_id);
        if attached.len() == before {
            return Err(CloudError::InvalidRequest(format!(
                "subnet {subnet_id} is not attached to router {router_id}"
            )));
        }
        Ok(())
    }

    pub fn create_port(&mut self, network_id: &str) -> Result<Port, CloudError> {
        if !self.networks.contains_key(network_id) {
            return Err(CloudError::not_found(format!("network {network_id}")));
        }
        let id = self.next_id("port");
        let port = Port {
            id: id.clone(),
            network_id: network_id.to_owned(),
        };
        self.ports.insert(id.clone(), port.clone());
        self.notify(meters::NEUTRON_PORT_NOTIFICATIONS, &id, 1.0);
        Ok(port)
    }

    pub fn delete_port(&mut self, id: &str) -> Result<(), CloudError> {
        self.ports
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| CloudError::not_found(format!("port {id}")))
    }

    // -- telemetry: alarms --------------------------------------------------

    /// Current state of an alarm: the pinned state if one was set, otherwise
    /// the threshold rule evaluated against the meter's observation.
    fn evaluate(&self, entry: &AlarmEntry) -> AlarmState {
        if let Some(pinned) = entry.pinned {
            return pinned;
        }
        match self.observed(&entry.alarm.meter_name) {
            Some(value) => {
                if entry.alarm.comparison.evaluate(value, entry.alarm.threshold) {
                    AlarmState::Alarm
                } else {
                    AlarmState::Ok
                }
            }
            None => AlarmState::InsufficientData,
        }
    }

    fn push_history(&mut self, alarm_id: &str, change: &str, detail: String) {
        self.alarm_histories
            .entry(alarm_id.to_owned())
            .or_default()
            .push(AlarmHistoryEntry {
                alarm_id: alarm_id.to_owned(),
                change: change.to_owned(),
                detail,
            });
    }

    pub fn create_alarm(&mut self, req: &AlarmRequest) -> Alarm {
        let id = self.next_id("alarm");
        let alarm = Alarm {
            alarm_id: id.clone(),
            name: req.name.clone(),
            project_id: FAKE_PROJECT.to_owned(),
            meter_name: req.meter_name.clone(),
            threshold: req.threshold,
            comparison: req.comparison,
            statistic: req.statistic,
            period: req.period,
            state: AlarmState::InsufficientData,
        };
        let mut entry = AlarmEntry {
            alarm,
            pinned: None,
        };
        entry.alarm.state = self.evaluate(&entry);
        let alarm = entry.alarm.clone();
        self.alarms.insert(id.clone(), entry);
        self.push_history(&id, "creation", format!("alarm {} created", req.name));
        alarm
    }

    pub fn get_alarm(&mut self, alarm_id: &str) -> Result<Alarm, CloudError> {
        let entry = self
            .alarms
            .get(alarm_id)
            .ok_or_else(|| CloudError::not_found(format!("alarm {alarm_id}")))?;
        let state = self.evaluate(entry);
        let entry = self
            .alarms
            .get_mut(alarm_id)
            .ok_or_else(|| CloudError::not_found(format!("alarm {alarm_id}")))?;
        entry.alarm.state = state;
        Ok(entry.alarm.clone())
    }

    pub fn list_alarms(&mut self, query: &[SampleQuery]) -> Vec<Alarm> {
        let ids: Vec<String> = self.alarms.keys().cloned().collect();
        let mut result = Vec::new();
        for id in ids {
            if let Ok(alarm) = self.get_alarm(&id) {
                let matches = query.iter().all(|q| match q.field.as_str() {
                    "project" => alarm.project_id == q.value,
                    "name" => alarm.name == q.value,
                    _ => true,
                });
                if matches {
                    result.push(alarm);
                }
            }
        }
        result.sort_by(|a, b| a.alarm_id.cmp(&b.alarm_id));
        result
    }

    pub fn update_alarm_threshold(
        &mut self,
        alarm_id: &str,
        threshold: f64,
    ) -> Result<Alarm, CloudError> {
        {
            let entry = self
                .alarms
                .get_mut(alarm_id)
                .ok_or_else(|| CloudError::not_found(format!("alarm {alarm_id}")))?;
            entry.alarm.threshold = threshold;
            // A rule change puts the alarm back under evaluation.
            entry.pinned = None;
        }
        self.push_history(alarm_id, "rule change", format!("threshold set to {threshold}"));
        self.get_alarm(alarm_id)
    }

    pub fn set_alarm_state(&mut self, alarm_id: &str, state: AlarmState) -> Result<(), CloudError> {
        let entry = self
            .alarms
            .get_mut(alarm_id)
            .ok_or_else(|| CloudError::not_found(format!("alarm {alarm_id}")))?;
        entry.pinned = Some(state);
        entry.alarm.state = state;
        self.push_history(alarm_id, "state transition", format!("state set to {state}"));
        Ok(())
    }

    pub fn get_alarm_state(&mut self, alarm_id: &str) -> Result<AlarmState, CloudError> {
        self.get_alarm(alarm_id).map(|a| a.state)
    }

    pub fn alarm_history(&self, alarm_id: &str) -> Result<Vec<AlarmHistoryEntry>, CloudError> {
        match self.alarm_histories.get(alarm_id) {
            Some(entries) => Ok(entries.clone()),
            None => Err(CloudError::not_found(format!("alarm {alarm_id}"))),
        }
    }

    pub fn delete_alarm(&mut self, alarm_id: &str) -> Result<(), CloudError> {
        self.alarms
            .remove(alarm_id)
            .map(|_| ())
            .ok_or_else(|| CloudError::not_found(format!("alarm {alarm_id}")))
    }

    // -- telemetry: samples, statistics, events -----------------------------

    fn sample_matches(sample: &Sample, query: &[SampleQuery]) -> bool {
        query.iter().all(|q| match q.field.as_str() {
            "resource" => sample.resource_id == q.value,
            "project" => sample.project_id == q.value,
            _ => true,
        })
    }

    pub fn list_samples(&self, meter: &str, query: &[SampleQuery]) -> Vec<Sample> {
        self.samples
            .iter()
            .filter(|s| s.counter_name == meter && Self::sample_matches(s, query))
            .cloned()
            .collect()
    }

    pub fn create_sample(&mut self, req: &SampleRequest) -> Sample {
        let sample = Sample {
            resource_id: req.resource_id.clone(),
            project_id: FAKE_PROJECT.to_owned(),
            counter_name: req.counter_name.clone(),
            counter_type: req.counter_type.clone(),
            counter_unit: req.counter_unit.clone(),
            counter_volume: req.counter_volume,
        };
        self.samples.push(sample.clone());
        sample
    }

    pub fn statistics(&self, meter: &str, query: &[SampleQuery]) -> Vec<MeterStatistic> {
        if query.is_empty() {
            if let Some(value) = self.meter_values.get(meter) {
                return vec![MeterStatistic {
                    avg: *value,
                    sum: *value,
                    min: *value,
                    max: *value,
                    count: 1,
                }];
            }
        }
        let volumes: Vec<f64> = self
            .samples
            .iter()
            .filter(|s| s.counter_name == meter && Self::sample_matches(s, query))
            .map(|s| s.counter_volume)
            .collect();
        if volumes.is_empty() {
            return Vec::new();
        }
        let sum: f64 = volumes.iter().sum();
        let min = volumes.iter().copied().fold(f64::INFINITY, f64::min);
        let max = volumes.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        vec![MeterStatistic {
            avg: sum / volumes.len() as f64,
            sum,
            min,
            max,
            count: volumes.len() as u64,
        }]
    }

    pub fn get_resource(&self, resource_id: &str) -> Result<MeteredResource, CloudError> {
        self.samples
            .iter()
            .find(|s| s.resource_id == resource_id)
            .map(|s| MeteredResource {
                resource_id: s.resource_id.clone(),
                project_id: s.project_id.clone(),
            })
            .ok_or_else(|| CloudError::not_found(format!("resource {resource_id}")))
    }

    pub fn list_event_types(&self) -> Vec<String> {
        let types: BTreeSet<String> = self.events.iter().map(|e| e.event_type.clone()).collect();
        types.into_iter().collect()
    }

    pub fn list_events(&self, query: &[SampleQuery]) -> Vec<EventRecord> {
        self.events
            .iter()
            .filter(|e| {
                query.iter().all(|q| {
                    if q.field == "event_type" {
                        e.event_type == q.value
                    } else {
                        e.trait_value(&q.field) == Some(q.value.as_str())
                    }
                })
            })
            .cloned()
            .collect()
    }

    pub fn get_event(&self, message_id: &str) -> Result<EventRecord, CloudError> {
        self.events
            .iter()
            .find(|e| e.message_id == message_id)
            .cloned()
            .ok_or_else(|| CloudError::not_found(format!("event {message_id}")))
    }

    pub fn trait_descriptions(
        &self,
        event_type: &str,
    ) -> Vec<stackhealth_core::types::TraitDescription> {
        let names: BTreeSet<&str> = self
            .events
            .iter()
            .filter(|e| e.event_type == event_type)
            .flat_map(|e| e.traits.iter().map(|t| t.name.as_str()))
            .collect();
        names
            .into_iter()
            .map(|name| stackhealth_core::types::TraitDescription {
                name: name.to_owned(),
                trait_type: "string".to_owned(),
            })
            .collect()
    }

    pub fn list_traits(&self, event_type: &str, trait_name: &str) -> Vec<EventTrait> {
        self.events
            .iter()
            .filter(|e| e.event_type == event_type)
            .flat_map(|e| e.traits.iter())
            .filter(|t| t.name == trait_name)
            .cloned()
            .collect()
    }

    // -- block storage ------------------------------------------------------

    pub fn create_volume(&mut self, size_gb: u32) -> Result<Volume, CloudError> {
        if let Some(err) = self.faults.create_volume.clone() {
            return Err(err);
        }
        let id = self.next_id("vol");
        let volume = Volume {
            id: id.clone(),
            status: "available".to_owned(),
        };
        self.volumes.insert(id.clone(), volume.clone());
        self.notify(meters::VOLUME_NOTIFICATIONS, &id, f64::from(size_gb));
        Ok(volume)
    }

    pub fn attach_volume(&mut self, server_id: &str, volume_id: &str) -> Result<(), CloudError> {
        if !self.servers.contains_key(server_id) {
            return Err(CloudError::not_found(format!("server {server_id}")));
        }
        let volume = self
            .volumes
            .get_mut(volume_id)
            .ok_or_else(|| CloudError::not_found(format!("volume {volume_id}")))?;
        volume.status = "in-use".to_owned();
        Ok(())
    }

    pub fn delete_volume(&mut self, id: &str) -> Result<(), CloudError> {
        self.volumes
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| CloudError::not_found(format!("volume {id}")))
    }

    pub fn create_snapshot(&mut self, volume_id: &str) -> Result<Snapshot, CloudError> {
        if !self.volumes.contains_key(volume_id) {
            return Err(CloudError::not_found(format!("volume {volume_id}")));
        }
        let id = self.next_id("snap");
        let snapshot = Snapshot {
            id: id.clone(),
            volume_id: volume_id.to_owned(),
        };
        self.snapshots.insert(id.clone(), snapshot.clone());
        self.notify(meters::SNAPSHOT_NOTIFICATIONS, &id, 1.0);
        Ok(snapshot)
    }

    pub fn delete_snapshot(&mut self, id: &str) -> Result<(), CloudError> {
        self.snapshots
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| CloudError::not_found(format!("snapshot {id}")))
    }

    // -- identity -----------------------------------------------------------

    pub fn create_tenant(&mut self, name: &str) -> Tenant {
        let id = self.next_id("tenant");
        let tenant = Tenant {
            id: id.clone(),
            name: name.to_owned(),
        };
        self.tenants.insert(id.clone(), tenant.clone());
        self.notify(meters::KEYSTONE_PROJECT_NOTIFICATIONS, &id, 1.0);
        tenant
    }

    pub fn create_user(&mut self, name: &str, tenant_id: &str) -> Result<User, CloudError> {
        if !self.tenants.contains_key(tenant_id) {
            return Err(CloudError::not_found(format!("tenant {tenant_id}")));
        }
        let id = self.next_id("user");
        let user = User {
            id: id.clone(),
            name: name.to_owned(),
        };
        self.users.insert(id.clone(), user.clone());
        self.notify(meters::KEYSTONE_USER_NOTIFICATIONS, &id, 1.0);
        Ok(user)
    }

    pub fn create_role(&mut self, name: &str) -> Role {
        let id = self.next_id("role");
        let role = Role {
            id: id.clone(),
            name: name.to_owned(),
        };
        self.roles.insert(id.clone(), role.clone());
        self.notify(meters::KEYSTONE_ROLE_NOTIFICATIONS, &id, 1.0);
        role
    }

    pub fn create_group(&mut self, name: &str) -> Group {
        let id = self.next_id("group");
        let group = Group {
            id: id.clone(),
            name: name.to_owned(),
        };
        self.groups.insert(id.clone(), group.clone());
        self.notify(meters::KEYSTONE_GROUP_NOTIFICATIONS, &id, 1.0);
        group
    }

    pub fn create_trust(
        &mut self,
        trustor_user_id: &str,
        role_id: &str,
    ) -> Result<Trust, CloudError> {
        if !self.users.contains_key(trustor_user_id) {
            return Err(CloudError::not_found(format!("user {trustor_user_id}")));
        }
        if !self.roles.contains_key(role_id) {
            return Err(CloudError::not_found(format!("role {role_id}")));
        }
        let id = self.next_id("trust");
        let trust = Trust { id: id.clone() };
        self.trusts.insert(id.clone(), trust.clone());
        self.notify(meters::KEYSTONE_TRUST_NOTIFICATIONS, &id, 1.0);
        Ok(trust)
    }

    pub fn delete_tenant(&mut self, id: &str) -> Result<(), CloudError> {
        self.tenants
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| CloudError::not_found(format!("tenant {id}")))
    }

    pub fn delete_user(&mut self, id: &str) -> Result<(), CloudError> {
        self.users
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| CloudError::not_found(format!("user {id}")))
    }

    pub fn delete_role(&mut self, id: &str) -> Result<(), CloudError> {
        self.roles
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| CloudError::not_found(format!("role {id}")))
    }

    pub fn delete_group(&mut self, id: &str) -> Result<(), CloudError> {
        self.groups
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| CloudError::not_found(format!("group {id}")))
    }

    pub fn delete_trust(&mut self, id: &str) -> Result<(), CloudError> {
        self.trusts
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| CloudError::not_found(format!("trust {id}")))
    }

    // -- images -------------------------------------------------------------

    pub fn create_image(&mut self, name: &str) -> Image {
        let id = self.next_id("img");
        let image = Image {
            id: id.clone(),
            name: name.to_owned(),
            properties: BTreeMap::new(),
        };
        self.images.insert(id.clone(), image.clone());
        self.notify(meters::GLANCE_NOTIFICATIONS, &id, 1.0);
        image
    }

    pub fn list_images(&self) -> Vec<Image> {
        let mut images: Vec<Image> = self.images.values().cloned().collect();
        images.sort_by(|a, b| a.id.cmp(&b.id));
        images
    }

    pub fn delete_image(&mut self, id: &str) -> Result<(), CloudError> {
        self.images
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| CloudError::not_found(format!("image {id}")))
    }

    // -- data processing ----------------------------------------------------

    pub fn create_cluster(&mut self, req: &ClusterRequest) -> Result<Cluster, CloudError> {
        if !self.images.contains_key(&req.image_id) {
            return Err(CloudError::not_found(format!("image {}", req.image_id)));
        }
        let id = self.next_id("cluster");
        let cluster = Cluster {
            id: id.clone(),
            name: req.name.clone(),
            status: "Active".to_owned(),
        };
        self.clusters.insert(id.clone(), cluster.clone());
        self.notify(meters::SAHARA_CLUSTER_NOTIFICATIONS, &id, 1.0);
        Ok(cluster)
    }

    pub fn get_cluster(&self, id: &str) -> Result<Cluster, CloudError> {
        self.clusters
            .get(id)
            .cloned()
            .ok_or_else(|| CloudError::not_found(format!("cluster {id}")))
    }

    pub fn delete_cluster(&mut self, id: &str) -> Result<(), CloudError> {
        self.clusters
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| CloudError::not_found(format!("cluster {id}")))
    }
}

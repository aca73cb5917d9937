//! Meter-name tables for notification and pollster checks.
//!
//! Each table lists the meters a service is expected to emit for a resource
//! it owns. A notification wait is satisfied once at least one expected
//! meter has produced a sample for the queried resource.

/// Meters emitted by the compute service for an instance.
pub const NOVA_NOTIFICATIONS: &[&str] =
    &["memory", "vcpus", "disk.root.size", "disk.ephemeral.size"];

/// Pollster meters produced periodically for a running instance.
pub const NOVA_INSTANCE_POLLSTERS: &[&str] = &["instance", "cpu", "cpu_util", "memory.usage"];

/// Pollster meters available on vSphere-backed deployments.
pub const NOVA_VSPHERE_POLLSTERS: &[&str] = &["cpu_util"];

/// Per-device disk pollsters (queried with the `<instance>-vda` resource).
pub const NOVA_DISK_DEVICE_POLLSTERS: &[&str] = &[
    "disk.device.read.bytes",
    "disk.device.write.bytes",
    "disk.device.read.requests",
    "disk.device.write.requests",
];

/// Meters emitted by the image service.
pub const GLANCE_NOTIFICATIONS: &[&str] = &["image", "image.size"];

/// Meters emitted by the block storage service for a volume.
pub const VOLUME_NOTIFICATIONS: &[&str] = &["volume", "volume.size"];

/// Meters emitted by the block storage service for a snapshot.
pub const SNAPSHOT_NOTIFICATIONS: &[&str] = &["snapshot", "snapshot.size"];

/// Meters emitted by the identity service per principal kind.
pub const KEYSTONE_PROJECT_NOTIFICATIONS: &[&str] = &[
    "identity.project.created",
    "identity.project.updated",
    "identity.project.deleted",
];
pub const KEYSTONE_USER_NOTIFICATIONS: &[&str] = &[
    "identity.user.created",
    "identity.user.updated",
    "identity.user.deleted",
];
pub const KEYSTONE_ROLE_NOTIFICATIONS: &[&str] = &[
    "identity.role.created",
    "identity.role.updated",
    "identity.role.deleted",
];
pub const KEYSTONE_GROUP_NOTIFICATIONS: &[&str] = &[
    "identity.group.created",
    "identity.group.updated",
    "identity.group.deleted",
];
pub const KEYSTONE_TRUST_NOTIFICATIONS: &[&str] =
    &["identity.trust.created", "identity.trust.deleted"];

/// Meters emitted by the networking service per resource kind.
pub const NEUTRON_NETWORK_NOTIFICATIONS: &[&str] = &["network", "network.create", "network.update"];
pub const NEUTRON_SUBNET_NOTIFICATIONS: &[&str] = &["subnet", "subnet.create", "subnet.update"];
pub const NEUTRON_PORT_NOTIFICATIONS: &[&str] = &["port", "port.create", "port.update"];
pub const NEUTRON_ROUTER_NOTIFICATIONS: &[&str] = &["router", "router.create", "router.update"];
pub const NEUTRON_FLOATING_IP_NOTIFICATIONS: &[&str] =
    &["ip.floating", "ip.floating.create", "ip.floating.update"];

/// Meters emitted by the data-processing service for a cluster.
pub const SAHARA_CLUSTER_NOTIFICATIONS: &[&str] = &["cluster", "cluster.create", "cluster.update"];

/// Event type recorded when an instance is updated.
pub const INSTANCE_UPDATE_EVENT: &str = "compute.instance.update";

/// Trait names every instance event is expected to describe.
pub const INSTANCE_EVENT_TRAITS: &[&str] =
    &["instance_id", "request_id", "state", "service", "host"];

/// Image property prefix marking a data-processing plugin registration.
pub const IMAGE_PLUGIN_TAG_PREFIX: &str = "_sahara_tag_";

//! Domain types -- handles for externally-owned cloud resources.
//!
//! Every resource created through a client trait is referenced by an opaque
//! identifier returned from the creation call. The structs here carry only
//! the fields the scenarios actually read; the services own everything else.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Observable status of a compute instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServerStatus {
    /// Instance is running.
    Active,
    /// Instance is still being provisioned.
    Build,
    /// Provisioning failed.
    Error,
    /// Instance was shut down.
    Shutoff,
    /// Any status the harness does not interpret.
    #[serde(untagged)]
    Other(String),
}

impl fmt::Display for ServerStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "ACTIVE"),
            Self::Build => write!(f, "BUILD"),
            Self::Error => write!(f, "ERROR"),
            Self::Shutoff => write!(f, "SHUTOFF"),
            Self::Other(s) => write!(f, "{s}"),
        }
    }
}

/// A compute instance handle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Server {
    pub id: String,
    pub name: String,
    pub status: ServerStatus,
    pub flavor_id: String,
}

/// Parameters for creating a compute instance.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ServerRequest {
    pub name: String,
    /// Security group names applied to the instance.
    pub security_groups: Vec<String>,
    /// Network to boot the instance into, if any.
    pub network_id: Option<String>,
    /// Image to boot from; the deployment default when absent.
    pub image_name: Option<String>,
    /// Flavor to use; the deployment default when absent.
    pub flavor_name: Option<String>,
}

/// A compute flavor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Flavor {
    pub id: String,
    pub name: String,
}

/// A security group handle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityGroup {
    pub id: String,
    pub name: String,
}

/// A floating IP handle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloatingIp {
    pub id: String,
    pub ip: String,
    /// Instance the address is associated with, if any.
    pub server_id: Option<String>,
}

/// Telemetry alarm state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AlarmState {
    /// The rule evaluated and the condition does not hold.
    #[serde(rename = "ok")]
    Ok,
    /// The rule evaluated and the condition holds.
    #[serde(rename = "alarm")]
    Alarm,
    /// Not enough datapoints to evaluate the rule.
    #[serde(rename = "insufficient data")]
    InsufficientData,
}

impl fmt::Display for AlarmState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ok => write!(f, "ok"),
            Self::Alarm => write!(f, "alarm"),
            Self::InsufficientData => write!(f, "insufficient data"),
        }
    }
}

/// Comparison operator for alarm threshold rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Comparison {
    Lt,
    Le,
    Eq,
    Ne,
    Ge,
    Gt,
}

impl Comparison {
    /// Apply the operator to `observed <op> threshold`.
    pub fn evaluate(self, observed: f64, threshold: f64) -> bool {
        match self {
            Self::Lt => observed < threshold,
            Self::Le => observed <= threshold,
            Self::Eq => observed == threshold,
            Self::Ne => observed != threshold,
            Self::Ge => observed >= threshold,
            Self::Gt => observed > threshold,
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Lt => "lt",
            Self::Le => "le",
            Self::Eq => "eq",
            Self::Ne => "ne",
            Self::Ge => "ge",
            Self::Gt => "gt",
        };
        write!(f, "{s}")
    }
}

/// Aggregation statistic for alarm rules and meter queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Statistic {
    Avg,
    Sum,
    Min,
    Max,
    Count,
}

/// A telemetry alarm handle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alarm {
    pub alarm_id: String,
    pub name: String,
    pub project_id: String,
    pub meter_name: String,
    pub threshold: f64,
    pub comparison: Comparison,
    pub statistic: Statistic,
    /// Evaluation window in seconds.
    pub period: u64,
    pub state: AlarmState,
}

/// Parameters for creating a telemetry alarm.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlarmRequest {
    pub name: String,
    pub meter_name: String,
    pub threshold: f64,
    pub comparison: Comparison,
    pub statistic: Statistic,
    pub period: u64,
}

/// One entry in an alarm's change history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlarmHistoryEntry {
    pub alarm_id: String,
    /// Change type, e.g. "creation", "rule change", "state transition".
    pub change: String,
    pub detail: String,
}

/// A single field/op/value filter for telemetry list queries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SampleQuery {
    pub field: String,
    pub op: String,
    pub value: String,
}

impl SampleQuery {
    /// Equality filter on an arbitrary field.
    pub fn field_eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            op: "eq".to_owned(),
            value: value.into(),
        }
    }

    /// Filter samples belonging to a resource.
    pub fn resource_eq(id: impl Into<String>) -> Self {
        Self {
            field: "resource".to_owned(),
            op: "eq".to_owned(),
            value: id.into(),
        }
    }

    /// Filter samples belonging to a project.
    pub fn project_eq(id: impl Into<String>) -> Self {
        Self {
            field: "project".to_owned(),
            op: "eq".to_owned(),
            value: id.into(),
        }
    }
}

/// A telemetry sample.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sample {
    pub resource_id: String,
    pub project_id: String,
    pub counter_name: String,
    pub counter_type: String,
    pub counter_unit: String,
    pub counter_volume: f64,
}

/// Parameters for pushing a sample by hand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SampleRequest {
    pub resource_id: String,
    pub counter_name: String,
    pub counter_type: String,
    pub counter_unit: String,
    pub counter_volume: f64,
    #[serde(default)]
    pub resource_metadata: BTreeMap<String, String>,
}

/// Aggregated statistics for one meter over one period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeterStatistic {
    pub avg: f64,
    pub sum: f64,
    pub min: f64,
    pub max: f64,
    pub count: u64,
}

/// A resource known to the telemetry service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MeteredResource {
    pub resource_id: String,
    pub project_id: String,
}

/// One trait attached to a telemetry event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventTrait {
    pub name: String,
    pub value: String,
}

/// A telemetry event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub message_id: String,
    pub event_type: String,
    pub traits: Vec<EventTrait>,
}

impl EventRecord {
    /// Look up a trait value by name.
    pub fn trait_value(&self, name: &str) -> Option<&str> {
        self.traits
            .iter()
            .find(|t| t.name == name)
            .map(|t| t.value.as_str())
    }
}

/// Description of a trait an event type can carry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraitDescription {
    pub name: String,
    /// Declared type, e.g. "string", "int".
    pub trait_type: String,
}

/// A virtual network handle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Network {
    pub id: String,
    pub name: String,
}

/// A subnet handle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Subnet {
    pub id: String,
    pub name: String,
    pub network_id: String,
    pub cidr: String,
}

/// A router handle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Router {
    pub id: String,
    pub name: String,
}

/// A port handle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Port {
    pub id: String,
    pub network_id: String,
}

/// A block storage volume handle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Volume {
    pub id: String,
    pub status: String,
}

/// A volume snapshot handle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub id: String,
    pub volume_id: String,
}

/// An identity project/tenant handle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tenant {
    pub id: String,
    pub name: String,
}

/// An identity user handle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub name: String,
}

/// An identity role handle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    pub id: String,
    pub name: String,
}

/// An identity group handle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub name: String,
}

/// An identity trust handle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Trust {
    pub id: String,
}

/// An image handle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Image {
    pub id: String,
    pub name: String,
    /// Free-form image metadata (registration tags and the like).
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

/// A data-processing cluster handle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cluster {
    pub id: String,
    pub name: String,
    pub status: String,
}

/// Parameters for creating a data-processing cluster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterRequest {
    pub name: String,
    pub image_id: String,
    pub plugin_name: String,
    pub plugin_version: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comparison_operators_evaluate() {
        assert!(Comparison::Ge.evaluate(85.0, 80.0));
        assert!(!Comparison::Ge.evaluate(60.0, 80.0));
        assert!(Comparison::Lt.evaluate(1.0, 1.1));
        assert!(!Comparison::Lt.evaluate(1.0, 0.9));
    }

    #[test]
    fn alarm_state_serializes_to_service_strings() {
        assert_eq!(
            serde_json::to_string(&AlarmState::InsufficientData).unwrap(),
            "\"insufficient data\""
        );
        assert_eq!(serde_json::to_string(&AlarmState::Ok).unwrap(), "\"ok\"");
    }

    #[test]
    fn server_status_display_matches_api_strings() {
        assert_eq!(ServerStatus::Active.to_string(), "ACTIVE");
        assert_eq!(ServerStatus::Other("PAUSED".to_owned()).to_string(), "PAUSED");
    }

    #[test]
    fn event_trait_lookup() {
        let event = EventRecord {
            message_id: "m-1".to_owned(),
            event_type: "compute.instance.update".to_owned(),
            traits: vec![EventTrait {
                name: "instance_id".to_owned(),
                value: "srv-1".to_owned(),
            }],
        };
        assert_eq!(event.trait_value("instance_id"), Some("srv-1"));
        assert_eq!(event.trait_value("host"), None);
    }
}

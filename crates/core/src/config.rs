//! Configuration -- stackhealth.toml parsing and runtime settings.
//!
//! [`StackhealthConfig`] is the top-level structure holding every section.
//!
//! # Loading precedence
//! 1. CLI arguments (highest)
//! 2. Environment variables (`STACKHEALTH_COMPUTE_USE_VCENTER=true` form)
//! 3. Configuration file (`stackhealth.toml`)
//! 4. Defaults (`Default` impls)
//!
//! # Example
//! ```no_run
//! # async fn example() -> Result<(), stackhealth_core::error::StackhealthError> {
//! use stackhealth_core::config::StackhealthConfig;
//!
//! // Load from file + env overrides
//! let config = StackhealthConfig::load("stackhealth.toml").await?;
//!
//! // Parse a TOML string directly
//! let config = StackhealthConfig::parse("[general]\nlog_level = \"debug\"")?;
//! # Ok(())
//! # }
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{ConfigError, StackhealthError};

/// StackHealth unified configuration.
///
/// Represents the top-level structure of `stackhealth.toml`. Each scenario
/// family reads only its own section; the settings object is read-only for
/// the duration of a run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StackhealthConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub compute: ComputeConfig,
    #[serde(default)]
    pub network: NetworkConfig,
    #[serde(default)]
    pub volume: VolumeConfig,
    #[serde(default)]
    pub telemetry: TelemetryConfig,
    #[serde(default)]
    pub data_processing: DataProcessingConfig,
}

impl StackhealthConfig {
    /// Load from a TOML file and apply environment overrides.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, StackhealthError> {
        let mut config = Self::from_file(path).await?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file (no environment overrides).
    pub async fn from_file(path: impl AsRef<Path>) -> Result<Self, StackhealthError> {
        let path = path.as_ref();
        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StackhealthError::Config(ConfigError::FileNotFound {
                    path: path.display().to_string(),
                })
            } else {
                StackhealthError::Io(e)
            }
        })?;
        let config = Self::parse(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse from a TOML string.
    pub fn parse(toml_str: &str) -> Result<Self, StackhealthError> {
        toml::from_str(toml_str).map_err(|e| {
            StackhealthError::Config(ConfigError::ParseFailed {
                reason: e.to_string(),
            })
        })
    }

    /// Apply `STACKHEALTH_{SECTION}_{FIELD}` environment overrides.
    pub fn apply_env_overrides(&mut self) {
        // General
        override_string(&mut self.general.log_level, "STACKHEALTH_GENERAL_LOG_LEVEL");
        override_string(
            &mut self.general.log_format,
            "STACKHEALTH_GENERAL_LOG_FORMAT",
        );

        // Compute
        override_string(&mut self.compute.image_name, "STACKHEALTH_COMPUTE_IMAGE_NAME");
        override_string(
            &mut self.compute.vcenter_image_name,
            "STACKHEALTH_COMPUTE_VCENTER_IMAGE_NAME",
        );
        override_string(
            &mut self.compute.flavor_name,
            "STACKHEALTH_COMPUTE_FLAVOR_NAME",
        );
        override_bool(
            &mut self.compute.use_vcenter,
            "STACKHEALTH_COMPUTE_USE_VCENTER",
        );

        // Network
        override_string(
            &mut self.network.floating_ip_pool,
            "STACKHEALTH_NETWORK_FLOATING_IP_POOL",
        );
        override_string(
            &mut self.network.subnet_cidr,
            "STACKHEALTH_NETWORK_SUBNET_CIDR",
        );
        override_u32(
            &mut self.network.ping_attempts,
            "STACKHEALTH_NETWORK_PING_ATTEMPTS",
        );
        override_u64(
            &mut self.network.ping_interval_secs,
            "STACKHEALTH_NETWORK_PING_INTERVAL_SECS",
        );

        // Volume
        override_bool(
            &mut self.volume.cinder_node_present,
            "STACKHEALTH_VOLUME_CINDER_NODE_PRESENT",
        );
        override_bool(&mut self.volume.ceph_present, "STACKHEALTH_VOLUME_CEPH_PRESENT");

        // Telemetry
        override_u64(
            &mut self.telemetry.poll_interval_secs,
            "STACKHEALTH_TELEMETRY_POLL_INTERVAL_SECS",
        );
        override_u64(
            &mut self.telemetry.statistic_period_secs,
            "STACKHEALTH_TELEMETRY_STATISTIC_PERIOD_SECS",
        );

        // Data processing
        override_string(
            &mut self.data_processing.plugin_name,
            "STACKHEALTH_DATA_PROCESSING_PLUGIN_NAME",
        );
        override_string(
            &mut self.data_processing.plugin_version,
            "STACKHEALTH_DATA_PROCESSING_PLUGIN_VERSION",
        );
    }

    /// Validate configured values.
    pub fn validate(&self) -> Result<(), StackhealthError> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.general.log_level.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_level".to_owned(),
                reason: format!("must be one of: {}", valid_levels.join(", ")),
            }
            .into());
        }

        let valid_formats = ["json", "pretty"];
        if !valid_formats.contains(&self.general.log_format.as_str()) {
            return Err(ConfigError::InvalidValue {
                field: "general.log_format".to_owned(),
                reason: format!("must be one of: {}", valid_formats.join(", ")),
            }
            .into());
        }

        if self.compute.image_name.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "compute.image_name".to_owned(),
                reason: "image name must not be empty".to_owned(),
            }
            .into());
        }

        if self.network.ping_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "network.ping_attempts".to_owned(),
                reason: "must be at least 1".to_owned(),
            }
            .into());
        }

        if self.telemetry.poll_interval_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "telemetry.poll_interval_secs".to_owned(),
                reason: "must be at least 1".to_owned(),
            }
            .into());
        }

        Ok(())
    }
}

/// General settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,
    /// Log format (json, pretty).
    pub log_format: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_owned(),
            log_format: "json".to_owned(),
        }
    }
}

/// Compute settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ComputeConfig {
    /// Name of the registered test image.
    pub image_name: String,
    /// Image name used when the deployment runs on vCenter.
    pub vcenter_image_name: String,
    /// Flavor used for test instances.
    pub flavor_name: String,
    /// Virtualization-backend flag: vCenter deployments boot VMDK images.
    pub use_vcenter: bool,
}

impl ComputeConfig {
    /// Image name effective for this deployment's virtualization backend.
    pub fn test_image_name(&self) -> &str {
        if self.use_vcenter {
            &self.vcenter_image_name
        } else {
            &self.image_name
        }
    }
}

impl Default for ComputeConfig {
    fn default() -> Self {
        Self {
            image_name: "TestVM".to_owned(),
            vcenter_image_name: "TestVM-VMDK".to_owned(),
            flavor_name: "m1.micro".to_owned(),
            use_vcenter: false,
        }
    }
}

/// Networking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Pool floating IPs are allocated from.
    pub floating_ip_pool: String,
    /// CIDR for scenario-created subnets.
    pub subnet_cidr: String,
    /// Ping attempts before declaring the instance unreachable.
    pub ping_attempts: u32,
    /// Seconds between ping attempts.
    pub ping_interval_secs: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            floating_ip_pool: "public".to_owned(),
            subnet_cidr: "10.100.0.0/24".to_owned(),
            ping_attempts: 30,
            ping_interval_secs: 6,
        }
    }
}

/// Block storage backend flags.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VolumeConfig {
    /// A Cinder node exists in the deployment.
    pub cinder_node_present: bool,
    /// Ceph backs volumes in the deployment.
    pub ceph_present: bool,
}

impl VolumeConfig {
    /// Whether any storage backend can host test volumes.
    pub fn storage_available(&self) -> bool {
        self.cinder_node_present || self.ceph_present
    }
}

impl Default for VolumeConfig {
    fn default() -> Self {
        Self {
            cinder_node_present: true,
            ceph_present: false,
        }
    }
}

/// Telemetry polling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Seconds between polls of telemetry state.
    pub poll_interval_secs: u64,
    /// Evaluation window passed to statistic queries, in seconds.
    pub statistic_period_secs: u64,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            poll_interval_secs: 10,
            statistic_period_secs: 600,
        }
    }
}

/// Data-processing (cluster) settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataProcessingConfig {
    /// Provisioning plugin the cluster scenario uses.
    pub plugin_name: String,
    /// Plugin version a registered image must be tagged with.
    pub plugin_version: String,
}

impl Default for DataProcessingConfig {
    fn default() -> Self {
        Self {
            plugin_name: "vanilla".to_owned(),
            plugin_version: "2.6.0".to_owned(),
        }
    }
}

// --- env override helpers ---

fn override_string(target: &mut String, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        *target = val;
    }
}

fn override_bool(target: &mut bool, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<bool>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse bool from env var, ignoring"
            ),
        }
    }
}

fn override_u32(target: &mut u32, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u32>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u32 from env var, ignoring"
            ),
        }
    }
}

fn override_u64(target: &mut u64, env_key: &str) {
    if let Ok(val) = std::env::var(env_key) {
        match val.parse::<u64>() {
            Ok(parsed) => *target = parsed,
            Err(_) => warn!(
                env_key,
                value = val.as_str(),
                "failed to parse u64 from env var, ignoring"
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_sane_values() {
        let config = StackhealthConfig::default();
        assert_eq!(config.general.log_level, "info");
        assert_eq!(config.general.log_format, "json");
        assert!(!config.compute.use_vcenter);
        assert_eq!(config.compute.test_image_name(), "TestVM");
        assert!(config.volume.storage_available());
    }

    #[test]
    fn default_config_passes_validation() {
        let config = StackhealthConfig::default();
        config.validate().unwrap();
    }

    #[test]
    fn empty_toml_uses_defaults() {
        let config = StackhealthConfig::parse("").unwrap();
        assert_eq!(config.network.ping_attempts, 30);
        assert_eq!(config.telemetry.poll_interval_secs, 10);
    }

    #[test]
    fn partial_toml_fills_remaining_defaults() {
        let config = StackhealthConfig::parse(
            r#"
[compute]
use_vcenter = true

[volume]
cinder_node_present = false
ceph_present = false
"#,
        )
        .unwrap();
        assert_eq!(config.compute.test_image_name(), "TestVM-VMDK");
        assert!(!config.volume.storage_available());
        assert_eq!(config.general.log_level, "info");
    }

    #[test]
    fn invalid_log_level_fails_validation() {
        let config = StackhealthConfig::parse("[general]\nlog_level = \"loud\"").unwrap();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("general.log_level"));
    }

    #[test]
    fn zero_ping_attempts_fails_validation() {
        let config = StackhealthConfig::parse("[network]\nping_attempts = 0").unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn malformed_toml_is_a_parse_error() {
        let err = StackhealthConfig::parse("[general\nlog_level = ").unwrap_err();
        assert!(matches!(
            err,
            StackhealthError::Config(ConfigError::ParseFailed { .. })
        ));
    }
}

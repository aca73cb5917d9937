//! stackhealth.toml integration tests.
//!
//! - stackhealth.toml.example parsing
//! - partial config loading (only some sections present)
//! - environment variable precedence
//! - missing / malformed file errors

use stackhealth_core::config::StackhealthConfig;
use stackhealth_core::error::{ConfigError, StackhealthError};

// =============================================================================
// stackhealth.toml.example parsing
// =============================================================================

#[test]
fn example_config_parses_successfully() {
    let content = include_str!("../../../stackhealth.toml.example");
    let config = StackhealthConfig::parse(content).expect("example config should parse");

    assert_eq!(config.general.log_level, "info");
    assert_eq!(config.general.log_format, "json");
}

#[test]
fn example_config_passes_validation() {
    let content = include_str!("../../../stackhealth.toml.example");
    let config = StackhealthConfig::parse(content).expect("should parse");
    config
        .validate()
        .expect("example config should pass validation");
}

#[test]
fn example_config_matches_builtin_defaults() {
    let content = include_str!("../../../stackhealth.toml.example");
    let from_example = StackhealthConfig::parse(content).expect("should parse");
    let defaults = StackhealthConfig::default();

    assert_eq!(
        from_example.compute.image_name,
        defaults.compute.image_name
    );
    assert_eq!(
        from_example.compute.vcenter_image_name,
        defaults.compute.vcenter_image_name
    );
    assert_eq!(
        from_example.network.ping_attempts,
        defaults.network.ping_attempts
    );
    assert_eq!(
        from_example.volume.cinder_node_present,
        defaults.volume.cinder_node_present
    );
    assert_eq!(
        from_example.telemetry.statistic_period_secs,
        defaults.telemetry.statistic_period_secs
    );
    assert_eq!(
        from_example.data_processing.plugin_name,
        defaults.data_processing.plugin_name
    );
}

// =============================================================================
// file loading
// =============================================================================

#[tokio::test]
async fn from_file_loads_partial_config() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("stackhealth.toml");
    tokio::fs::write(
        &path,
        "[compute]\nuse_vcenter = true\n\n[network]\nping_attempts = 5\n",
    )
    .await
    .expect("write config");

    let config = StackhealthConfig::from_file(&path)
        .await
        .expect("partial config should load");
    assert!(config.compute.use_vcenter);
    assert_eq!(config.network.ping_attempts, 5);
    // Untouched sections keep their defaults.
    assert_eq!(config.telemetry.poll_interval_secs, 10);
}

#[tokio::test]
async fn from_file_missing_path_is_file_not_found() {
    let err = StackhealthConfig::from_file("/nonexistent/stackhealth.toml")
        .await
        .expect_err("should fail");
    assert!(matches!(
        err,
        StackhealthError::Config(ConfigError::FileNotFound { .. })
    ));
}

#[tokio::test]
async fn from_file_rejects_invalid_values() {
    let dir = tempfile::tempdir().expect("tempdir");
    let path = dir.path().join("stackhealth.toml");
    tokio::fs::write(&path, "[general]\nlog_format = \"xml\"\n")
        .await
        .expect("write config");

    let err = StackhealthConfig::from_file(&path)
        .await
        .expect_err("invalid format should fail validation");
    assert!(matches!(
        err,
        StackhealthError::Config(ConfigError::InvalidValue { .. })
    ));
}

// =============================================================================
// environment variable precedence
// =============================================================================

#[test]
#[serial_test::serial]
fn env_override_beats_file_value() {
    let mut config =
        StackhealthConfig::parse("[compute]\nimage_name = \"FromFile\"").expect("parse");

    // SAFETY: serialized test; no other thread reads the environment.
    unsafe {
        std::env::set_var("STACKHEALTH_COMPUTE_IMAGE_NAME", "FromEnv");
    }
    config.apply_env_overrides();
    unsafe {
        std::env::remove_var("STACKHEALTH_COMPUTE_IMAGE_NAME");
    }

    assert_eq!(config.compute.image_name, "FromEnv");
}

#[test]
#[serial_test::serial]
fn unparseable_env_bool_is_ignored() {
    let mut config = StackhealthConfig::parse("[compute]\nuse_vcenter = false").expect("parse");

    // SAFETY: serialized test; no other thread reads the environment.
    unsafe {
        std::env::set_var("STACKHEALTH_COMPUTE_USE_VCENTER", "maybe");
    }
    config.apply_env_overrides();
    unsafe {
        std::env::remove_var("STACKHEALTH_COMPUTE_USE_VCENTER");
    }

    assert!(!config.compute.use_vcenter, "bad value must not override");
}

#[test]
#[serial_test::serial]
fn env_override_applies_to_numeric_fields() {
    let mut config = StackhealthConfig::default();

    // SAFETY: serialized test; no other thread reads the environment.
    unsafe {
        std::env::set_var("STACKHEALTH_TELEMETRY_POLL_INTERVAL_SECS", "3");
    }
    config.apply_env_overrides();
    unsafe {
        std::env::remove_var("STACKHEALTH_TELEMETRY_POLL_INTERVAL_SECS");
    }

    assert_eq!(config.telemetry.poll_interval_secs, 3);
}

//! Integration tests for `stackhealth config` loading behavior.
//!
//! Exercises config validation and display with real TOML files.

use std::fs;

use tempfile::TempDir;

use stackhealth_core::config::StackhealthConfig;

#[tokio::test]
async fn test_config_check_valid_toml() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = temp_dir.path().join("stackhealth.toml");

    let valid_config = r#"
[general]
log_level = "info"
log_format = "json"

[compute]
image_name = "TestVM"
flavor_name = "m1.micro"

[network]
ping_attempts = 10
ping_interval_secs = 2

[volume]
cinder_node_present = true
"#;

    fs::write(&config_path, valid_config).expect("should write config");

    let result = StackhealthConfig::load(&config_path).await;
    assert!(result.is_ok(), "valid config should load successfully");
    let config = result.expect("config loads");
    assert_eq!(config.network.ping_attempts, 10);
    assert_eq!(config.compute.test_image_name(), "TestVM");
}

#[tokio::test]
async fn test_config_check_malformed_toml() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = temp_dir.path().join("bad.toml");

    let malformed_config = r#"
[general
log_level = "info"
"#;

    fs::write(&config_path, malformed_config).expect("should write bad config");

    let result = StackhealthConfig::load(&config_path).await;
    assert!(result.is_err(), "malformed TOML should fail to load");
}

#[tokio::test]
async fn test_config_check_missing_file() {
    let config_path = std::path::PathBuf::from("/nonexistent/stackhealth.toml");

    let result = StackhealthConfig::load(&config_path).await;
    assert!(result.is_err(), "missing file should fail to load");
}

#[tokio::test]
async fn test_config_check_empty_file_uses_defaults() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = temp_dir.path().join("empty.toml");

    fs::write(&config_path, "").expect("should write empty file");

    let result = StackhealthConfig::load(&config_path).await;
    assert!(result.is_ok(), "empty config should use defaults");
    let config = result.expect("config loads");
    assert_eq!(config.general.log_level, "info");
    assert_eq!(config.network.ping_attempts, 30);
}

#[tokio::test]
async fn test_config_check_invalid_value_rejected() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = temp_dir.path().join("stackhealth.toml");

    fs::write(&config_path, "[network]\nping_attempts = 0").expect("should write config");

    let result = StackhealthConfig::load(&config_path).await;
    assert!(result.is_err(), "zero ping_attempts should fail validation");
}

#[tokio::test]
async fn test_config_show_round_trips_through_toml() {
    let temp_dir = TempDir::new().expect("should create temp dir");
    let config_path = temp_dir.path().join("stackhealth.toml");

    fs::write(&config_path, "[telemetry]\npoll_interval_secs = 5")
        .expect("should write config");

    let config = StackhealthConfig::load(&config_path)
        .await
        .expect("config loads");
    let rendered = toml::to_string_pretty(&config).expect("config serializes");

    let reparsed = StackhealthConfig::parse(&rendered).expect("rendered config parses");
    assert_eq!(reparsed.telemetry.poll_interval_secs, 5);
}

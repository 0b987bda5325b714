//! Tests for config functionality.

use crate::config::{FailurePolicy, LockConfig};
use crate::error::LockError;
use std::path::Path;
use tempfile::TempDir;

#[test]
fn test_default_config() {
    let config = LockConfig::default();

    assert_eq!(config.lock_file, "app.lock");
    assert_eq!(config.stale_threshold_minutes, 60);
    assert_eq!(config.heartbeat_interval_secs, 60);
    assert_eq!(config.io_timeout_secs, 10);
    assert_eq!(config.failure_policy, FailurePolicy::FailOpen);
    assert!(config.display_name.is_none());
    assert!(config.validate().is_ok());
}

#[test]
fn test_parse_minimal_yaml() {
    let config = LockConfig::from_yaml("").unwrap();
    assert_eq!(config, LockConfig::default());
}

#[test]
fn test_parse_partial_yaml() {
    let yaml = r#"
stale_threshold_minutes: 30
failure_policy: fail_closed
"#;
    let config = LockConfig::from_yaml(yaml).unwrap();

    assert_eq!(config.stale_threshold_minutes, 30);
    assert_eq!(config.failure_policy, FailurePolicy::FailClosed);
    assert_eq!(config.lock_file, "app.lock");
    assert_eq!(config.heartbeat_interval_secs, 60);
}

#[test]
fn test_parse_full_yaml() {
    let yaml = r#"
lock_file: issues.lock
stale_threshold_minutes: 15
heartbeat_interval_secs: 20
io_timeout_secs: 3
failure_policy: fail_open
display_name: "Ada L."
"#;
    let config = LockConfig::from_yaml(yaml).unwrap();

    assert_eq!(config.lock_file, "issues.lock");
    assert_eq!(config.stale_threshold(), chrono::Duration::minutes(15));
    assert_eq!(config.heartbeat_interval(), std::time::Duration::from_secs(20));
    assert_eq!(config.io_timeout(), std::time::Duration::from_secs(3));
    assert_eq!(config.display_name_override(), Some("Ada L."));
}

#[test]
fn test_unknown_fields_are_ignored() {
    let yaml = r#"
stale_threshold_minutes: 90
theme: dark
"#;
    let config = LockConfig::from_yaml(yaml).unwrap();
    assert_eq!(config.stale_threshold_minutes, 90);
}

#[test]
fn test_invalid_policy_is_rejected() {
    let result = LockConfig::from_yaml("failure_policy: sometimes");
    assert!(matches!(result, Err(LockError::Config(_))));
}

#[test]
fn test_zero_values_are_rejected() {
    for yaml in [
        "stale_threshold_minutes: 0",
        "heartbeat_interval_secs: 0",
        "io_timeout_secs: 0",
    ] {
        let err = LockConfig::from_yaml(yaml).unwrap_err();
        assert!(err.to_string().contains("greater than 0"), "{}: {}", yaml, err);
    }
}

#[test]
fn test_heartbeat_must_be_shorter_than_threshold() {
    let yaml = r#"
stale_threshold_minutes: 1
heartbeat_interval_secs: 60
"#;
    let err = LockConfig::from_yaml(yaml).unwrap_err();
    assert!(err.to_string().contains("shorter than the stale threshold"));

    let yaml = r#"
stale_threshold_minutes: 1
heartbeat_interval_secs: 59
"#;
    assert!(LockConfig::from_yaml(yaml).is_ok());
}

#[test]
fn test_lock_file_must_be_plain_name() {
    let err = LockConfig::from_yaml("lock_file: ../elsewhere/app.lock").unwrap_err();
    assert!(err.to_string().contains("plain file name"));

    let err = LockConfig::from_yaml("lock_file: \"  \"").unwrap_err();
    assert!(err.to_string().contains("plain file name"));
}

#[test]
fn test_blank_display_name_is_unset() {
    let config = LockConfig::from_yaml("display_name: \"   \"").unwrap();
    assert_eq!(config.display_name_override(), None);
}

#[test]
fn test_lock_path_joins_shared_dir() {
    let config = LockConfig::default();
    assert_eq!(
        config.lock_path("/mnt/team"),
        Path::new("/mnt/team").join("app.lock")
    );
}

#[test]
fn test_yaml_roundtrip_preserves_policy() {
    let config = LockConfig {
        failure_policy: FailurePolicy::FailClosed,
        display_name: Some("ops".to_string()),
        ..LockConfig::default()
    };

    let parsed = LockConfig::from_yaml(&config.to_yaml().unwrap()).unwrap();
    assert_eq!(parsed, config);
}

#[test]
fn test_load_or_default_missing_file() {
    let temp_dir = TempDir::new().unwrap();
    let config = LockConfig::load_or_default(temp_dir.path().join("editlock.yaml")).unwrap();
    assert_eq!(config, LockConfig::default());
}

#[test]
fn test_load_reads_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("editlock.yaml");
    std::fs::write(&path, "io_timeout_secs: 2\n").unwrap();

    let config = LockConfig::load(&path).unwrap();
    assert_eq!(config.io_timeout_secs, 2);

    std::fs::write(&path, "io_timeout_secs: [oops\n").unwrap();
    assert!(LockConfig::load_or_default(&path).is_err());
}

#[test]
fn test_failure_policy_display_matches_yaml() {
    assert_eq!(FailurePolicy::FailClosed.to_string(), "fail_closed");
    let config = LockConfig::from_yaml("failure_policy: fail_closed\n").unwrap();
    assert_eq!(config.failure_policy, FailurePolicy::FailClosed);
    assert!(LockConfig::from_yaml("failure_policy: open\n").is_err());
}

use channel_monitor::types::MonitorError;
use channel_monitor::Config;
use tempfile::tempdir;

fn write_config(content: &str) -> (tempfile::TempDir, std::path::PathBuf) {
    let dir = tempdir().unwrap();
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, content).unwrap();
    (dir, path)
}

#[test]
fn loads_config_with_defaults() {
    let (_dir, path) = write_config(
        r#"
api_key: "test-key"
channels:
  UCabc: {}
  UCdef:
    name: "Second channel"
    max_results: 25
"#,
    );

    let config = Config::load(&path).unwrap();
    assert_eq!(config.api_key, "test-key");
    assert_eq!(config.poll_interval_seconds, 3600);
    assert_eq!(config.channels.len(), 2);
    assert_eq!(config.channels["UCabc"].max_results, 10);
    assert_eq!(config.channels["UCdef"].max_results, 25);
    assert_eq!(config.channels["UCdef"].name.as_deref(), Some("Second channel"));
}

#[test]
fn channel_iteration_order_is_stable() {
    let (_dir, path) = write_config(
        r#"
api_key: "test-key"
channels:
  UCzzz: {}
  UCaaa: {}
  UCmmm: {}
"#,
    );

    let config = Config::load(&path).unwrap();
    let order: Vec<&String> = config.channels.keys().collect();
    assert_eq!(order, vec!["UCaaa", "UCmmm", "UCzzz"]);
}

#[test]
fn missing_file_is_a_config_error() {
    let dir = tempdir().unwrap();
    let err = Config::load(&dir.path().join("nope.yaml")).unwrap_err();
    assert!(matches!(err, MonitorError::Config(_)));
}

#[test]
fn empty_api_key_is_rejected() {
    let (_dir, path) = write_config(
        r#"
api_key: ""
channels:
  UCabc: {}
"#,
    );
    let err = Config::load(&path).unwrap_err();
    assert!(matches!(err, MonitorError::Config(_)));
}

#[test]
fn empty_channel_map_is_rejected() {
    let (_dir, path) = write_config(
        r#"
api_key: "test-key"
channels: {}
"#,
    );
    let err = Config::load(&path).unwrap_err();
    assert!(matches!(err, MonitorError::Config(_)));
}

#[test]
fn zero_poll_interval_is_rejected() {
    let (_dir, path) = write_config(
        r#"
api_key: "test-key"
poll_interval_seconds: 0
channels:
  UCabc: {}
"#,
    );
    let err = Config::load(&path).unwrap_err();
    assert!(matches!(err, MonitorError::Config(_)));
}

use recordreplay::config::{Config, DirectoryConfig, StoreConfig, DEFAULT_REDIS_URL};
use recordreplay::topology::ComponentStatus;
use std::io::Write;
use tempfile::NamedTempFile;

#[test]
fn test_defaults() {
    let config = Config::from_yaml("{}").unwrap();

    assert_eq!(config.command_port, 10080);
    assert_eq!(config.request_timeout_ms, 5000);
    assert_eq!(config.store, StoreConfig::Memory);
    assert_eq!(config.directory, DirectoryConfig::Static { instances: Vec::new() });
}

#[test]
fn test_load_from_file() {
    let yaml = r#"
command_port: 10081
request_timeout_ms: 250
store:
  kind: redis
  url: redis://127.0.0.1:6379/2
directory:
  kind: static
  instances:
    - ip: 10.0.0.1
    - ip: 10.0.0.2
      port: 4001
      status: down
"#;
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();

    let config = Config::load(file.path()).unwrap();

    assert_eq!(config.command_port, 10081);
    assert_eq!(config.request_timeout().as_millis(), 250);
    assert_eq!(config.store, StoreConfig::Redis {
        url: "redis://127.0.0.1:6379/2".to_string(),
        namespace: "recordreplay".to_string(),
    });
    match &config.directory {
        DirectoryConfig::Static { instances } => {
            assert_eq!(instances.len(), 2);
            assert_eq!(instances[0].port, 4000);
            assert_eq!(instances[0].status_port, 10080);
            assert_eq!(instances[0].status, ComponentStatus::Up);
            assert_eq!(instances[1].port, 4001);
            assert_eq!(instances[1].status, ComponentStatus::Down);
        }
        other => panic!("unexpected directory {:?}", other),
    }
}

#[test]
fn test_probe_directory_config() {
    let config = Config::from_yaml("directory:\n  kind: probe\n  instances:\n    - ip: tidb-0\n").unwrap();

    match &config.directory {
        DirectoryConfig::Probe { instances, probe_timeout_ms } => {
            assert_eq!(instances.len(), 1);
            assert_eq!(instances[0].ip, "tidb-0");
            assert_eq!(*probe_timeout_ms, 1000);
        }
        other => panic!("unexpected directory {:?}", other),
    }
    assert!(config.build_directory().is_ok());
}

#[test]
fn test_invalid_yaml_is_an_error() {
    assert!(Config::from_yaml("store: {kind: sqlite}").is_err());
}

#[test]
fn test_missing_file_is_an_error() {
    assert!(Config::load(std::path::Path::new("/nonexistent/recordreplay.yaml")).is_err());
}

#[tokio::test]
async fn test_build_static_directory() {
    let config = Config::from_yaml("directory:\n  kind: static\n  instances:\n    - ip: a\n    - ip: b\n      status: unknown\n").unwrap();

    let instances = config.build_directory().unwrap().list_targets().await.unwrap();

    let up: Vec<&str> = instances.iter().filter(|i| i.is_up()).map(|i| i.ip.as_str()).collect();
    assert_eq!(up, vec!["a"]);
}

#[test]
fn test_resolve_without_config_uses_default_redis() {
    let config = Config::resolve(None, None).unwrap();

    assert_eq!(config.store, StoreConfig::redis(DEFAULT_REDIS_URL));
    assert_eq!(config.store, StoreConfig::Redis {
        url: "redis://127.0.0.1:6379/0".to_string(),
        namespace: "recordreplay".to_string(),
    });
    assert_eq!(config.command_port, 10080);
}

#[test]
fn test_resolve_redis_flag_overrides_config_file() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"command_port: 10090\nstore:\n  kind: memory\n").unwrap();

    let from_file = Config::resolve(Some(file.path()), None).unwrap();
    assert_eq!(from_file.store, StoreConfig::Memory);

    let overridden = Config::resolve(Some(file.path()), Some("redis://cache:6379/3")).unwrap();
    assert_eq!(overridden.store, StoreConfig::redis("redis://cache:6379/3"));
    assert_eq!(overridden.command_port, 10090);
}

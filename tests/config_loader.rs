mod common;

use std::path::PathBuf;
use std::time::Duration;

use common::temp_config;
use velostore::config::{Config, ConfigError};
use velostore::StoreOptions;

/// Test that Config::default() produces the documented values.
#[test]
fn test_config_default_values() {
    let config = Config::default();

    assert_eq!(config.store.drain_warning_threshold, 1000);
    assert_eq!(config.garage.persist_debounce_ms, 300);
    assert!(config.garage.data_file.is_none());
    assert_eq!(config.store_options(), StoreOptions::default());
}

/// Test that Config::config_path() returns a path ending with the expected filename.
#[test]
fn test_config_path_ends_with_expected() {
    let path = Config::config_path();
    assert!(path.ends_with("velostore/config.toml"));
}

#[test]
fn test_default_data_file_lives_under_velostore() {
    let config = Config::default();
    assert!(config.garage.data_file().ends_with("velostore/garage.json"));
}

#[test]
fn test_parse_valid_toml() {
    let (_dir, path) = temp_config(
        r#"[store]
drain_warning_threshold = 50

[garage]
data_file = "/tmp/bikes.json"
persist_debounce_ms = 1500
"#,
    );

    let config = Config::load_from(&path).unwrap();

    assert_eq!(config.store_options().drain_warning_threshold, 50);
    assert_eq!(config.garage.data_file(), PathBuf::from("/tmp/bikes.json"));
    assert_eq!(config.garage.persist_debounce(), Duration::from_millis(1500));
}

/// Missing sections and keys fall back to defaults.
#[test]
fn test_partial_toml_uses_defaults() {
    let (_dir, path) = temp_config("[garage]\npersist_debounce_ms = 10\n");

    let config = Config::load_from(&path).unwrap();

    assert_eq!(config.store.drain_warning_threshold, 1000);
    assert_eq!(config.garage.persist_debounce_ms, 10);
}

#[test]
fn test_parse_invalid_toml() {
    let (_dir, path) = temp_config("[store\ndrain_warning_threshold = ");

    match Config::load_from(&path).unwrap_err() {
        ConfigError::ParseError { path: reported, .. } => assert_eq!(reported, path),
        other => panic!("Expected ParseError, got {other:?}"),
    }
}

#[test]
fn test_missing_file_is_read_error() {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("absent.toml");

    let result = Config::load_from(&path);

    assert!(matches!(result, Err(ConfigError::ReadError { .. })));
}

#[test]
fn test_validation_rejects_zero_threshold() {
    let (_dir, path) = temp_config("[store]\ndrain_warning_threshold = 0\n");

    match Config::load_from(&path).unwrap_err() {
        ConfigError::ValidationError { message } => {
            assert!(message.contains("drain_warning_threshold"));
        }
        other => panic!("Expected ValidationError, got {other:?}"),
    }
}

#[test]
fn test_validation_rejects_long_debounce() {
    let mut config = Config::default();
    config.garage.persist_debounce_ms = 60_001;

    assert!(matches!(
        config.validate(),
        Err(ConfigError::ValidationError { .. })
    ));

    config.garage.persist_debounce_ms = 60_000;
    assert!(config.validate().is_ok());
}

#[test]
fn test_config_roundtrip() {
    let mut config = Config::default();
    config.garage.data_file = Some(PathBuf::from("/srv/garage.json"));

    let text = toml::to_string(&config).unwrap();
    let parsed: Config = toml::from_str(&text).unwrap();

    assert_eq!(parsed, config);
}

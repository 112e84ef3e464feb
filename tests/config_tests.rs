//! Config loading, TOML parsing, and env var override tests.

use std::fs;

use figment::providers::{Format, Toml};
use figment::Figment;
use tempfile::TempDir;

use loom_dsl::Config;

#[test]
fn test_config_default_seed_is_zero() {
    let config = Config::default();
    assert_eq!(config.seed, 0);
}

#[test]
fn test_config_default_generation_settings() {
    let config = Config::default();
    assert!(!config.generation.strict);
    assert!((config.generation.optional_field_probability - 0.7).abs() < f64::EPSILON);
}

#[test]
fn test_config_default_retry_limits() {
    let config = Config::default();
    assert_eq!(config.retry_limits.instance, 50);
    assert_eq!(config.retry_limits.unique, 1000);
}

#[test]
fn test_config_default_logging() {
    let config = Config::default();
    assert_eq!(config.logging.level, "info");
    assert_eq!(config.logging.format, "text");
}

#[test]
fn test_load_config_from_toml() {
    let temp = TempDir::new().unwrap();
    let config_path = temp.path().join("loom.toml");

    let config_content = r#"
seed = 42

[generation]
strict = true
optional_field_probability = 0.5

[retry_limits]
instance = 10
unique = 200

[logging]
level = "debug"
format = "json"
"#;
    fs::write(&config_path, config_content).unwrap();

    let config = Config::from_file(config_path.to_str().unwrap()).unwrap();
    assert_eq!(config.seed, 42);
    assert!(config.generation.strict);
    assert!((config.generation.optional_field_probability - 0.5).abs() < f64::EPSILON);
    assert_eq!(config.retry_limits.instance, 10);
    assert_eq!(config.retry_limits.unique, 200);
    assert_eq!(config.logging.level, "debug");
    assert_eq!(config.logging.format, "json");
}

#[test]
fn test_load_missing_config_file_falls_back_to_defaults() {
    let temp = TempDir::new().unwrap();
    let nonexistent = temp.path().join("nonexistent.toml");

    let config = Config::from_file(nonexistent.to_str().unwrap()).unwrap();
    assert_eq!(config.seed, 0);
    assert_eq!(config.retry_limits.instance, 50);
}

#[test]
fn test_partial_toml_file_keeps_remaining_defaults() {
    let temp = TempDir::new().unwrap();
    let config_path = temp.path().join("loom.toml");
    fs::write(&config_path, "seed = 7\n").unwrap();

    let config = Config::from_file(config_path.to_str().unwrap()).unwrap();
    assert_eq!(config.seed, 7);
    assert_eq!(config.retry_limits.instance, 50);
    assert_eq!(config.logging.level, "info");
}

#[test]
fn test_local_overrides_base() {
    let temp = TempDir::new().unwrap();
    let base_path = temp.path().join("loom.toml");
    let local_path = temp.path().join("loom.local.toml");

    fs::write(&base_path, "seed = 1\n[retry_limits]\ninstance = 50\nunique = 1000\n").unwrap();
    fs::write(&local_path, "seed = 99\n").unwrap();

    let config: Config = Figment::new()
        .merge(Toml::file(&base_path))
        .merge(Toml::file(&local_path))
        .extract()
        .unwrap();

    assert_eq!(config.seed, 99);
    assert_eq!(config.retry_limits.instance, 50);
}

#[test]
fn test_into_parts_splits_config_correctly() {
    let mut config = Config::default();
    config.seed = 3;
    config.generation.strict = true;
    let (seed, options, limits) = config.into_parts();
    assert_eq!(seed, 3);
    assert!(options.strict);
    assert_eq!(limits.unique, 1000);
}

//! Configuration system
//!
//! Provides hierarchical configuration loading from:
//! - `loom.toml` (default configuration)
//! - `loom.local.toml` (git-ignored local overrides)
//! - Environment variables (`LOOM_*` prefix)
//!
//! ## Example
//!
//! ```toml
//! # loom.toml
//! seed = 42
//!
//! [generation]
//! strict = false
//! optional_field_probability = 0.7
//!
//! [retry_limits]
//! instance = 50
//! unique = 1000
//!
//! [logging]
//! level = "info"
//! format = "text"
//! ```
//!
//! Environment variable overrides:
//! ```bash
//! LOOM_SEED=7
//! LOOM_GENERATION__STRICT=true
//! LOOM_RETRY_LIMITS__INSTANCE=100
//! ```

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::context::{GeneratorOptions, RetryLimits};

/// Top-level configuration, loaded once at the CLI binary boundary and
/// turned into the library's own [`GeneratorOptions`]/[`RetryLimits`]
/// (library callers are free to construct those directly without going
/// through this module at all).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Default seed used when the caller doesn't supply one explicitly.
    #[serde(default)]
    pub seed: u64,

    #[serde(default)]
    pub generation: GenerationConfig,

    #[serde(default)]
    pub retry_limits: RetryLimitsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Mirrors [`GeneratorOptions`] as a serializable config section (spec §9,
/// "Optional-field inclusion probability is a policy knob... document it as
/// configuration").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default)]
    pub strict: bool,

    #[serde(default = "default_optional_field_probability")]
    pub optional_field_probability: f64,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        GenerationConfig {
            strict: false,
            optional_field_probability: default_optional_field_probability(),
        }
    }
}

impl From<GenerationConfig> for GeneratorOptions {
    fn from(cfg: GenerationConfig) -> Self {
        GeneratorOptions {
            strict: cfg.strict,
            optional_field_probability: cfg.optional_field_probability,
        }
    }
}

/// Mirrors [`RetryLimits`] as a serializable config section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryLimitsConfig {
    #[serde(default = "default_instance_retries")]
    pub instance: u32,

    #[serde(default = "default_unique_retries")]
    pub unique: u32,
}

impl Default for RetryLimitsConfig {
    fn default() -> Self {
        RetryLimitsConfig {
            instance: default_instance_retries(),
            unique: default_unique_retries(),
        }
    }
}

impl From<RetryLimitsConfig> for RetryLimits {
    fn from(cfg: RetryLimitsConfig) -> Self {
        RetryLimits { instance: cfg.instance, unique: cfg.unique }
    }
}

/// Logging configuration consumed at the binary boundary to build a
/// `tracing_subscriber::EnvFilter` (the library itself never reads this —
/// it only ever emits `tracing` events).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format (text, json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig { level: default_log_level(), format: default_log_format() }
    }
}

fn default_optional_field_probability() -> f64 {
    0.7
}
fn default_instance_retries() -> u32 {
    50
}
fn default_unique_retries() -> u32 {
    1000
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "text".to_string()
}

impl Config {
    /// Loads configuration from default locations.
    ///
    /// Merges in order:
    /// 1. `loom.toml` (base configuration)
    /// 2. `loom.local.toml` (local overrides, git-ignored)
    /// 3. Environment variables (`LOOM_*` prefix)
    pub fn load() -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file("loom.toml"))
            .merge(Toml::file("loom.local.toml"))
            .merge(Env::prefixed("LOOM_").split("__"))
            .extract()
    }

    /// Loads configuration from a specific file path.
    pub fn from_file(path: &str) -> Result<Self, figment::Error> {
        Figment::new()
            .merge(Toml::file(path))
            .merge(Env::prefixed("LOOM_").split("__"))
            .extract()
    }

    /// Splits this config into the `(seed, GeneratorOptions, RetryLimits)`
    /// triple [`crate::dataset::Generator`] and [`crate::context::GenerationContext`]
    /// actually consume.
    pub fn into_parts(self) -> (u64, GeneratorOptions, RetryLimits) {
        (self.seed, self.generation.into(), self.retry_limits.into())
    }
}

impl Default for Config {
    fn default() -> Self {
        Config {
            seed: 0,
            generation: GenerationConfig::default(),
            retry_limits: RetryLimitsConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_documented_defaults() {
        let config = Config::default();
        assert_eq!(config.seed, 0);
        assert!(!config.generation.strict);
        assert!((config.generation.optional_field_probability - 0.7).abs() < f64::EPSILON);
        assert_eq!(config.retry_limits.instance, 50);
        assert_eq!(config.retry_limits.unique, 1000);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn config_round_trips_through_toml() {
        let config = Config::default();
        let toml_str = toml::to_string(&config).unwrap();
        assert!(toml_str.contains("seed"));
        assert!(toml_str.contains("[generation]"));
        assert!(toml_str.contains("[retry_limits]"));
    }

    #[test]
    fn into_parts_carries_values_through() {
        let mut config = Config::default();
        config.generation.strict = true;
        config.retry_limits.instance = 5;
        let (seed, options, limits) = config.into_parts();
        assert_eq!(seed, 0);
        assert!(options.strict);
        assert_eq!(limits.instance, 5);
    }

    #[test]
    fn loading_a_missing_file_falls_back_to_defaults() {
        let config = Config::from_file("definitely-not-a-real-loom-config.toml").unwrap();
        assert_eq!(config.seed, 0);
    }
}

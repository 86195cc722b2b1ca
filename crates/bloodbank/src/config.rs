//! Configuration management for bloodbank.
//!
//! This module provides configuration loading and validation using figment,
//! supporting TOML config files, environment variables, and defaults.

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::notify::DeliveryPreferences;
use crate::selector::SelectorConfig;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "bloodbank";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "bloodbank.db";

/// Environment variable prefix. Nested keys are separated by `__`, as in
/// `BLOODBANK_WORKER__INTERVAL_MINUTES`.
const ENV_PREFIX: &str = "BLOODBANK_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `BLOODBANK_`)
/// 2. TOML config file at `~/.config/bloodbank/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Alert selection tuning.
    pub selector: SelectorConfig,
    /// Background worker configuration.
    pub worker: WorkerConfig,
    /// Delivery preferences applied before an alert is sent.
    pub preferences: DeliveryPreferences,
}

/// Storage-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/bloodbank/bloodbank.db`
    pub database_path: Option<PathBuf>,
    /// Maximum number of alerts to retain.
    /// Set to 0 for unlimited.
    pub max_alerts: usize,
}

/// Worker-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Minutes between alert cycles.
    pub interval_minutes: u64,
    /// Persist delivered alerts to the store.
    pub store_alerts: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: None, // Will be resolved to default at runtime
            max_alerts: 1_000,
        }
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            interval_minutes: 240,
            store_alerts: true,
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// A missing file is not an error; defaults and environment apply.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing or validation
    /// fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let config: Config = Self::figment(&config_file).extract()?;
        config.validate()?;
        Ok(config)
    }

    fn figment(config_file: &Path) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_file))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        let probability = self.selector.positive_feedback_probability;
        if !(0.0..=1.0).contains(&probability) {
            return Err(Error::ConfigValidation {
                message: format!(
                    "positive_feedback_probability ({probability}) must be between 0 and 1"
                ),
            });
        }

        if self.worker.interval_minutes == 0 {
            return Err(Error::ConfigValidation {
                message: "interval_minutes must be greater than 0".to_string(),
            });
        }

        for (name, hour) in [
            ("quiet_hours_start", self.preferences.quiet_hours_start),
            ("quiet_hours_end", self.preferences.quiet_hours_end),
        ] {
            if hour > 23 {
                return Err(Error::ConfigValidation {
                    message: format!("{name} ({hour}) must be an hour between 0 and 23"),
                });
            }
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the worker interval as a Duration.
    #[must_use]
    pub fn worker_interval(&self) -> Duration {
        Duration::from_secs(self.worker.interval_minutes * 60)
    }

    /// Alert retention limit, `None` when unlimited.
    #[must_use]
    pub fn max_alerts(&self) -> Option<usize> {
        (self.storage.max_alerts > 0).then_some(self.storage.max_alerts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blood_group::BloodGroup;
    use crate::selector::WeekendBoostMode;

    fn temp_config(name: &str, contents: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("bloodbank-config-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert!(config.storage.database_path.is_none());
        assert_eq!(config.storage.max_alerts, 1_000);
        assert_eq!(config.worker.interval_minutes, 240);
        assert!(config.worker.store_alerts);
        assert_eq!(config.selector, SelectorConfig::default());
        assert_eq!(config.preferences, DeliveryPreferences::default());
    }

    #[test]
    fn test_validate_valid_config() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_validate_probability_out_of_range() {
        let mut config = Config::default();
        config.selector.positive_feedback_probability = 1.5;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("positive_feedback_probability"));
    }

    #[test]
    fn test_validate_zero_interval() {
        let mut config = Config::default();
        config.worker.interval_minutes = 0;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("interval_minutes"));
    }

    #[test]
    fn test_validate_quiet_hours() {
        let mut config = Config::default();
        config.preferences.quiet_hours_end = 24;

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("quiet_hours_end"));
    }

    #[test]
    fn test_database_path_default() {
        let path = Config::default().database_path();
        assert!(path.to_string_lossy().contains("bloodbank.db"));
    }

    #[test]
    fn test_database_path_custom() {
        let mut config = Config::default();
        config.storage.database_path = Some(PathBuf::from("/custom/path/db.sqlite"));

        assert_eq!(
            config.database_path(),
            PathBuf::from("/custom/path/db.sqlite")
        );
    }

    #[test]
    fn test_worker_interval() {
        assert_eq!(
            Config::default().worker_interval(),
            Duration::from_secs(4 * 60 * 60)
        );
    }

    #[test]
    fn test_max_alerts_none_when_zero() {
        let mut config = Config::default();
        assert_eq!(config.max_alerts(), Some(1_000));
        config.storage.max_alerts = 0;
        assert_eq!(config.max_alerts(), None);
    }

    #[test]
    fn test_default_config_path() {
        let path = Config::default_config_path();
        assert!(path.to_string_lossy().contains("bloodbank"));
        assert!(path.to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_load_nonexistent_config() {
        let config = Config::load_from(Some(PathBuf::from("/nonexistent/config.toml"))).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_load_from_toml() {
        let path = temp_config(
            "valid.toml",
            r#"
[selector]
weekend_boost = "weekends_only"
positive_feedback_probability = 0.1

[worker]
interval_minutes = 30

[preferences]
health_tips = false
preferred_blood_groups = ["O-", "AB-"]
"#,
        );

        let config = Config::load_from(Some(path)).unwrap();
        assert_eq!(config.selector.weekend_boost, WeekendBoostMode::WeekendsOnly);
        assert!((config.selector.positive_feedback_probability - 0.1).abs() < f64::EPSILON);
        assert_eq!(config.worker.interval_minutes, 30);
        assert!(config.worker.store_alerts);
        assert!(!config.preferences.health_tips);
        assert_eq!(
            config.preferences.preferred_blood_groups,
            vec![BloodGroup::ONeg, BloodGroup::AbNeg]
        );
    }

    #[test]
    fn test_load_rejects_invalid_values() {
        let path = temp_config("invalid.toml", "[worker]\ninterval_minutes = 0\n");
        let result = Config::load_from(Some(path));
        assert!(matches!(result, Err(Error::ConfigValidation { .. })));
    }

    #[test]
    fn test_load_rejects_malformed_toml() {
        let path = temp_config("malformed.toml", "[worker\n");
        assert!(matches!(
            Config::load_from(Some(path)),
            Err(Error::ConfigLoad(_))
        ));
    }

    #[test]
    fn test_config_serialize() {
        let json = serde_json::to_string(&Config::default()).unwrap();
        assert!(json.contains("interval_minutes"));
        assert!(json.contains("weekend_boost"));
        assert!(json.contains("quiet_hours_start"));
    }

    #[test]
    fn test_storage_config_deserialize() {
        let json = r#"{"max_alerts": 50}"#;
        let storage: StorageConfig = serde_json::from_str(json).unwrap();
        assert_eq!(storage.max_alerts, 50);
        assert!(storage.database_path.is_none());
    }
}

//! Configuration management for the patient registry.
//!
//! Configuration is loaded with figment from defaults, a TOML file, and
//! environment variables.

use std::fmt::Write as _;
use std::path::PathBuf;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::search::SearchScope;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "patient-registry";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "registry.db";

/// Slot key used by earlier releases; changing it orphans existing data.
pub const DEFAULT_SLOT_KEY: &str = "patients-data";

/// Environment variable prefix for configuration overrides.
pub const ENV_PREFIX: &str = "PATIENT_REGISTRY_";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `PATIENT_REGISTRY_`, sections
///    separated by `__`, e.g. `PATIENT_REGISTRY_STORAGE__SLOT_KEY`)
/// 2. TOML config file at `~/.config/patient-registry/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Registry behaviour.
    pub registry: RegistryConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/patient-registry/registry.db`
    pub database_path: Option<PathBuf>,
    /// Name of the slot holding the patient collection.
    pub slot_key: String,
    /// Maximum total bytes stored across slots.
    /// Set to 0 for unlimited.
    pub max_slot_bytes: usize,
}

/// Registry-related configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// `chrono` format string for the registration date label.
    /// Rendered from the local date and time, so time and offset
    /// specifiers are allowed.
    pub date_format: String,
    /// Scope used by searches that don't name one.
    pub default_scope: SearchScope,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            slot_key: DEFAULT_SLOT_KEY.to_string(),
            max_slot_bytes: 5 * 1024 * 1024,
        }
    }
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            date_format: "%-m/%-d/%Y".to_string(),
            default_scope: SearchScope::All,
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
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);
        Self::from_figment(
            Figment::new()
                .merge(Serialized::defaults(Config::default()))
                .merge(Toml::file(&config_file))
                .merge(Env::prefixed(ENV_PREFIX).split("__")),
        )
    }

    /// Extract and validate a configuration from a prepared figment.
    ///
    /// # Errors
    ///
    /// Returns an error if extraction or validation fails.
    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
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
        if self.storage.slot_key.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "slot_key must not be empty".to_string(),
            });
        }

        if self.registry.date_format.is_empty() {
            return Err(Error::ConfigValidation {
                message: "date_format must not be empty".to_string(),
            });
        }

        // chrono reports bad specifiers only when formatting
        let mut rendered = String::new();
        let now = chrono::Local::now();
        if write!(rendered, "{}", now.format(&self.registry.date_format)).is_err() {
            return Err(Error::ConfigValidation {
                message: format!("invalid date_format: {}", self.registry.date_format),
            });
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

    /// Get the storage quota, or `None` when unlimited.
    #[must_use]
    pub fn quota(&self) -> Option<usize> {
        if self.storage.max_slot_bytes == 0 {
            None
        } else {
            Some(self.storage.max_slot_bytes)
        }
    }
}

//! Clinic core configuration.
//!
//! # Responsibility
//! - Describe database location, logging and booking/billing defaults.
//! - Load settings from TOML with per-field defaults.
//!
//! # Invariants
//! - A loaded config has already passed `validate()`.

use crate::logging::default_log_level;
use crate::model::validation::check_currency;
use crate::service::billing_service::DEFAULT_CURRENCY;
use crate::service::booking_service::DEFAULT_APPOINTMENT_MINUTES;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_DATABASE_FILE: &str = "clinic.sqlite3";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config `{path}`: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClinicConfig {
    pub database_path: PathBuf,
    pub log_level: String,
    /// Absolute directory for rolling log files.
    pub log_dir: PathBuf,
    pub default_appointment_minutes: u32,
    /// ISO 4217 code used for new invoices.
    pub currency: String,
}

impl Default for ClinicConfig {
    fn default() -> Self {
        Self {
            database_path: PathBuf::from(DEFAULT_DATABASE_FILE),
            log_level: default_log_level().to_string(),
            log_dir: std::env::temp_dir().join("clinic-logs"),
            default_appointment_minutes: DEFAULT_APPOINTMENT_MINUTES,
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }
}

impl ClinicConfig {
    /// Parses TOML text; missing keys keep their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.database_path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("database_path must not be empty".into()));
        }
        if self.default_appointment_minutes == 0 {
            return Err(ConfigError::Invalid(
                "default_appointment_minutes must be positive".into(),
            ));
        }
        check_currency(&self.currency).map_err(|err| ConfigError::Invalid(err.to_string()))?;
        Ok(())
    }
}

//! Main application configuration
//!
//! This module defines the top-level configuration of the dota-elo binary,
//! including environment variable loading, TOML files and validation.

use crate::config::rating::RatingConfig;
use crate::error::{RatingError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;

/// Main application configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service: ServiceSettings,
    pub rating: RatingConfig,
}

/// Service-level settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceSettings {
    /// Service name for logging
    pub name: String,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            name: "dota-elo".to_string(),
            log_level: "info".to_string(),
        }
    }
}

fn config_error(message: String) -> anyhow::Error {
    RatingError::ConfigurationError { message }.into()
}

fn parse_var<T: FromStr>(name: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| config_error(format!("Invalid {} value: {}", name, value)))
}

impl AppConfig {
    /// Load configuration from environment variables with fallback to defaults
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Load configuration from a TOML file. Missing sections use defaults;
    /// environment variables still override file values.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|e| {
            config_error(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let mut config = Self::from_toml(&contents)?;
        config.apply_env()?;
        validate_config(&config)?;
        Ok(config)
    }

    /// Parse configuration from TOML text without validating it
    pub fn from_toml(contents: &str) -> Result<Self> {
        toml::from_str(contents).map_err(|e| config_error(format!("Invalid TOML: {}", e)))
    }

    fn apply_env(&mut self) -> Result<()> {
        // Service settings
        if let Ok(name) = env::var("SERVICE_NAME") {
            self.service.name = name;
        }
        if let Ok(log_level) = env::var("LOG_LEVEL") {
            self.service.log_level = log_level;
        }

        // Rating settings
        if let Ok(value) = env::var("ELO_BASELINE_RATING") {
            self.rating.baseline_rating = parse_var("ELO_BASELINE_RATING", &value)?;
        }
        if let Ok(value) = env::var("ELO_SCALE") {
            self.rating.scale = parse_var("ELO_SCALE", &value)?;
        }
        if let Ok(value) = env::var("ELO_BASE_K_FACTOR") {
            self.rating.k_factor.base_k = parse_var("ELO_BASE_K_FACTOR", &value)?;
        }
        if let Ok(value) = env::var("ELO_ALLOW_DRAWS") {
            self.rating.allow_draws = parse_var("ELO_ALLOW_DRAWS", &value)?;
        }

        // Decay settings
        if let Ok(value) = env::var("ELO_DECAY_ENABLED") {
            self.rating.decay.enabled = parse_var("ELO_DECAY_ENABLED", &value)?;
        }
        if let Ok(value) = env::var("ELO_DECAY_GRACE_DAYS") {
            self.rating.decay.grace_period_days = parse_var("ELO_DECAY_GRACE_DAYS", &value)?;
        }
        if let Ok(value) = env::var("ELO_DECAY_PERIOD_DAYS") {
            self.rating.decay.period_days = parse_var("ELO_DECAY_PERIOD_DAYS", &value)?;
        }
        if let Ok(value) = env::var("ELO_DECAY_RATE") {
            self.rating.decay.rate = parse_var("ELO_DECAY_RATE", &value)?;
        }

        Ok(())
    }
}

/// Validate configuration values
pub fn validate_config(config: &AppConfig) -> Result<()> {
    match config.service.log_level.to_lowercase().as_str() {
        "trace" | "debug" | "info" | "warn" | "error" => {}
        _ => {
            return Err(config_error(format!(
                "Invalid log level: {}",
                config.service.log_level
            )))
        }
    }

    if config.service.name.trim().is_empty() {
        return Err(config_error("Service name cannot be empty".to_string()));
    }

    config.rating.validate()
}

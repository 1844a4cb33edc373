//! Configuration management for a Tessera host.
//!
//! This module provides TOML-based configuration file loading and saving.
//! The default configuration path is `~/.config/tessera/config.toml`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tessera_protocol::ResumeConfig;
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("log_level must be a level (trace, debug, info, warn, error, off) or target=level directives; got {0}")]
    InvalidLogLevel(String),

    #[error("invalid [resume] settings: {0}")]
    InvalidResume(String),

    #[error("reserve_block must be greater than 0, got {0}")]
    InvalidReserveBlock(u64),
}

/// Valid log level values for tracing configuration.
const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error", "off"];

/// Main configuration structure for a Tessera host.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    /// General host configuration.
    pub host: HostConfig,

    /// Resume ticket settings.
    pub resume: ResumeConfig,

    /// Ticket index persistence.
    pub persistence: PersistenceConfig,
}

/// General host configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HostConfig {
    /// Directory holding the ticket key and the index watermark.
    pub data_dir: PathBuf,

    /// Logging level, or a filter such as `info,tessera_protocol=debug`.
    pub log_level: String,
}

/// Ticket index persistence settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PersistenceConfig {
    /// Number of ticket indices reserved on disk per write.
    pub reserve_block: u64,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            log_level: "info".to_string(),
        }
    }
}

impl Default for PersistenceConfig {
    fn default() -> Self {
        Self { reserve_block: 1024 }
    }
}

/// Returns the default configuration file path.
pub fn default_config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tessera")
        .join("config.toml")
}

/// Returns the default data directory path.
fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("tessera")
}

impl Config {
    /// Apply environment variable overrides to the configuration.
    ///
    /// Environment variables take precedence over config file values.
    /// Supported variables:
    /// - TESSERA_LOG_LEVEL: Override log level (trace, debug, info, warn, error)
    /// - TESSERA_DATA_DIR: Override the data directory
    pub fn apply_env_overrides(&mut self) {
        if let Ok(level) = std::env::var("TESSERA_LOG_LEVEL") {
            if !level.is_empty() {
                tracing::info!("Overriding log_level from environment: {}", level);
                self.host.log_level = level;
            }
        }

        if let Ok(dir) = std::env::var("TESSERA_DATA_DIR") {
            if !dir.is_empty() {
                tracing::info!("Overriding data_dir from environment: {}", dir);
                self.host.data_dir = PathBuf::from(dir);
            }
        }
    }

    /// Validate the configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !is_valid_log_filter(&self.host.log_level) {
            return Err(ConfigError::InvalidLogLevel(self.host.log_level.clone()));
        }

        self.resume
            .validate()
            .map_err(|e| ConfigError::InvalidResume(e.to_string()))?;

        if self.persistence.reserve_block == 0 {
            return Err(ConfigError::InvalidReserveBlock(
                self.persistence.reserve_block,
            ));
        }

        Ok(())
    }

    /// Load configuration from a file.
    ///
    /// If the file does not exist, returns the default configuration.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        if !path.exists() {
            tracing::debug!("Config file not found at {:?}, using defaults", path);
            return Ok(Self::default());
        }

        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Load configuration from the default path.
    pub fn load_default() -> Result<Self> {
        Self::load(default_config_path())
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str)
            .map_err(|e| anyhow::anyhow!("Invalid TOML configuration: {}", format_toml_error(&e)))
    }

    /// Save configuration to a file.
    ///
    /// Creates parent directories if they don't exist.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create config directory: {}", parent.display())
            })?;
        }

        let contents = self.to_toml()?;
        fs::write(path, contents)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;

        tracing::debug!("Configuration saved to {:?}", path);
        Ok(())
    }

    /// Serialize configuration to a TOML string.
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize configuration to TOML")
    }
}

/// Accepts a bare level or comma-separated `target=level` directives.
///
/// A bare target with no level is rejected even though `EnvFilter` reads it
/// as `target=trace`; otherwise a misspelled level would silently enable
/// tracing for a target of that name.
fn is_valid_log_filter(filter: &str) -> bool {
    let levels_ok = filter.split(',').all(|directive| {
        let level = match directive.rsplit_once('=') {
            Some((target, level)) if !target.trim().is_empty() => level,
            Some(_) => return false,
            None => directive,
        };
        VALID_LOG_LEVELS.contains(&level.trim().to_lowercase().as_str())
    });
    levels_ok && crate::logging::filter_for(filter).is_ok()
}

/// Format a TOML deserialization error for user-friendly display.
fn format_toml_error(error: &toml::de::Error) -> String {
    let mut msg = error.message().to_string();

    if let Some(span) = error.span() {
        msg.push_str(&format!(" (at position {}..{})", span.start, span.end));
    }

    msg
}

//! Configuration management for askops.
//!
//! Configuration is loaded from `~/.config/askops/config.toml`. Every key is
//! optional; command-line flags take precedence over the file.

use crate::dispatch::DEFAULT_MODEL;
use crate::transport::fallback::RESOLV_CONF;
use crate::transport::FallbackSource;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Main configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Ollama server URL (default: http://localhost:11434).
    #[serde(default = "default_host")]
    pub host: String,
    /// Model name (default: gemma3:12b).
    #[serde(default = "default_model")]
    pub model: String,
    /// Per-attempt request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Where the alternate server address comes from.
    #[serde(default)]
    pub fallback: FallbackConfig,
    /// Interaction history settings.
    #[serde(default)]
    pub history: HistoryConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: default_host(),
            model: default_model(),
            timeout_secs: default_timeout_secs(),
            fallback: FallbackConfig::default(),
            history: HistoryConfig::default(),
        }
    }
}

fn default_host() -> String {
    "http://localhost:11434".to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_timeout_secs() -> u64 {
    10
}

/// Alternate endpoint provider selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FallbackConfig {
    /// First IPv4 nameserver of a resolver file.
    ResolvConf {
        #[serde(default = "default_resolv_conf")]
        path: PathBuf,
    },
    /// No fallback attempt.
    Disabled,
}

impl Default for FallbackConfig {
    fn default() -> Self {
        FallbackConfig::ResolvConf {
            path: default_resolv_conf(),
        }
    }
}

fn default_resolv_conf() -> PathBuf {
    PathBuf::from(RESOLV_CONF)
}

impl FallbackConfig {
    pub fn source(&self) -> FallbackSource {
        match self {
            FallbackConfig::ResolvConf { path } => FallbackSource::ResolvConf(path.clone()),
            FallbackConfig::Disabled => FallbackSource::Disabled,
        }
    }
}

/// Interaction history settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    /// Override for the history file; defaults to beside the executable.
    #[serde(default)]
    pub path: Option<PathBuf>,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            path: None,
        }
    }
}

fn default_true() -> bool {
    true
}

impl Config {
    /// Get the config directory path.
    pub fn config_dir() -> Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join("askops"))
            .context("Could not determine config directory")
    }

    /// Get the config file path.
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::config_dir()?.join("config.toml"))
    }

    /// Load configuration from the default location, using defaults if not found.
    pub fn load() -> Result<Self> {
        match Self::config_path() {
            Ok(path) => Self::load_from(&path),
            Err(_) => Ok(Self::default()),
        }
    }

    /// Load configuration from `path`, using defaults if it does not exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            toml::from_str(&contents)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))
        } else {
            Ok(Self::default())
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

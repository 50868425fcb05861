use anyhow::{anyhow, Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::default::Default;
use std::path::Path;

use crate::dictionary::DictionaryFiles;
use crate::segment_merger::MergeOptions;
use crate::style_processor::StyleOptions;

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.
/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Segment merge limits
    #[serde(default)]
    pub merge: MergeOptions,

    /// Text transform options
    #[serde(default)]
    pub style: StyleOptions,

    /// Sentence correction settings
    #[serde(default)]
    pub correction: CorrectionConfig,

    /// Dictionary file overrides
    #[serde(default)]
    pub dictionaries: DictionaryFiles,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Settings for the optional correction pass
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CorrectionConfig {
    // @field: Whether the correction pass runs at all
    #[serde(default)]
    pub enabled: bool,

    // @field: Endpoint of the local completion service, loopback only
    #[serde(default = "default_correction_endpoint")]
    pub endpoint: String,

    // @field: Model served by the completion service
    #[serde(default = "default_correction_model")]
    pub model: String,

    // @field: Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    // @field: Attempts per request before the fallback engages
    #[serde(default = "default_retry_count")]
    pub retry_count: u32,

    // @field: Base backoff time in milliseconds, doubled on each retry
    #[serde(default = "default_retry_backoff_ms")]
    pub retry_backoff_ms: u64,

    // @field: Sentences per correction request
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,

    // @field: Maximum number of in-flight correction requests
    #[serde(default = "default_concurrent_requests")]
    pub concurrent_requests: usize,
}

impl Default for CorrectionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_correction_endpoint(),
            model: default_correction_model(),
            timeout_secs: default_timeout_secs(),
            retry_count: default_retry_count(),
            retry_backoff_ms: default_retry_backoff_ms(),
            batch_size: default_batch_size(),
            concurrent_requests: default_concurrent_requests(),
        }
    }
}

/// Log verbosity level
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Map to the `log` crate's level filter.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

impl Config {
    /// Load the configuration from a JSON file, creating the file with
    /// default settings when it does not exist.
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to open config file: {}", path.display()))?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
            Ok(config)
        } else {
            warn!(
                "Config file not found at '{}', creating default config.",
                path.display()
            );
            let config = Config::default();
            let config_json = serde_json::to_string_pretty(&config)
                .context("Failed to serialize default config to JSON")?;
            std::fs::write(path, config_json).with_context(|| {
                format!("Failed to write default config to file: {}", path.display())
            })?;
            Ok(config)
        }
    }

    /// Validate the configuration for consistency and required values
    pub fn validate(&self) -> Result<()> {
        if !self.merge.max_gap.is_finite() || self.merge.max_gap <= 0.0 {
            return Err(anyhow!(
                "merge.max_gap must be a positive number of seconds, got {}",
                self.merge.max_gap
            ));
        }
        if self.merge.max_chars == 0 {
            return Err(anyhow!("merge.max_chars must be at least 1"));
        }
        if !self.merge.min_duration.is_finite() || self.merge.min_duration < 0.0 {
            return Err(anyhow!(
                "merge.min_duration must be zero or positive, got {}",
                self.merge.min_duration
            ));
        }

        if self.style.split_threshold == 0 {
            return Err(anyhow!("style.split_threshold must be at least 1"));
        }

        if self.correction.enabled {
            if self.correction.model.trim().is_empty() {
                return Err(anyhow!(
                    "correction.model is required when correction is enabled"
                ));
            }
            if self.correction.endpoint.trim().is_empty() {
                return Err(anyhow!(
                    "correction.endpoint is required when correction is enabled"
                ));
            }
            if self.correction.timeout_secs == 0 {
                return Err(anyhow!("correction.timeout_secs must be at least 1"));
            }
            if self.correction.batch_size == 0 {
                return Err(anyhow!("correction.batch_size must be at least 1"));
            }
            if self.correction.concurrent_requests == 0 {
                return Err(anyhow!("correction.concurrent_requests must be at least 1"));
            }
        }

        Ok(())
    }
}

/// Default implementation for Config
impl Default for Config {
    fn default() -> Self {
        Config {
            merge: MergeOptions::default(),
            style: StyleOptions::default(),
            correction: CorrectionConfig::default(),
            dictionaries: DictionaryFiles::default(),
            log_level: LogLevel::default(),
        }
    }
}

fn default_correction_endpoint() -> String {
    "http://localhost:11434".to_string()
}

fn default_correction_model() -> String {
    "qwen:14b".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

fn default_retry_count() -> u32 {
    3 // Default to 3 retries
}

fn default_retry_backoff_ms() -> u64 {
    1000 // 1 second base backoff time, doubled on each retry
}

fn default_batch_size() -> usize {
    5
}

fn default_concurrent_requests() -> usize {
    2
}

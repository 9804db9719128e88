use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::chunker;
use crate::translation::{QuotaDetector, RetryPolicy};

/// Application configuration module
/// This module handles the application configuration including loading,
/// validating and saving configuration settings.

/// Hard ceiling on concurrent workers, bounding rate-limit exposure
pub const MAX_WORKERS: usize = 50;

/// Environment variables consulted when the config carries no API key
const API_KEY_ENV_VARS: &[&str] = &["GEMINI_API_KEY", "GOOGLE_AI_API_KEY"];

/// Represents the application configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// API key for the translation service; falls back to the environment
    #[serde(default)]
    pub api_key: String,

    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,

    /// Service endpoint URL (optional, for proxies or self-hosted gateways)
    #[serde(default)]
    pub endpoint: String,

    /// System instruction guiding tone and context of the translation
    #[serde(default = "default_system_instruction")]
    pub system_instruction: String,

    /// Concurrent worker count; None derives it from available parallelism
    #[serde(default)]
    pub workers: Option<usize>,

    /// Lines per chunk
    #[serde(default = "default_chunk_size_lines")]
    pub chunk_size_lines: usize,

    /// Request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Sampling temperature for the model
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    /// Retry caps and pacing
    #[serde(default)]
    pub retry: RetryConfig,

    /// Substrings of provider error text that mean "quota exhausted"
    #[serde(default = "default_quota_markers")]
    pub quota_markers: Vec<String>,

    /// Normalize paragraph breaks in the output after a completed run
    #[serde(default = "default_true")]
    pub auto_reformat: bool,

    /// Log level
    #[serde(default)]
    pub log_level: LogLevel,
}

/// Retry configuration
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct RetryConfig {
    /// Attempts allowed when every response is safety-blocked
    #[serde(default = "default_safety_retries")]
    pub max_safety_retries: u32,

    /// Attempts allowed per safety cycle when responses are low quality
    #[serde(default = "default_quality_retries")]
    pub max_quality_retries: u32,

    /// Fixed delay between attempts, in milliseconds
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_safety_retries: default_safety_retries(),
            max_quality_retries: default_quality_retries(),
            retry_delay_ms: default_retry_delay_ms(),
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

fn default_model() -> String {
    "gemini-2.0-flash".to_string()
}

fn default_system_instruction() -> String {
    "You are a professional literary translator. Translate the given text into \
     natural, fluent English. Keep character dialogue in quotation marks, \
     preserve every plot detail, and keep the original tone and register. \
     Never refuse, summarize, or add commentary."
        .to_string()
}

fn default_chunk_size_lines() -> usize {
    100
}

fn default_timeout_secs() -> u64 {
    120
}

fn default_temperature() -> f32 {
    0.3
}

fn default_safety_retries() -> u32 {
    5
}

fn default_quality_retries() -> u32 {
    5
}

fn default_retry_delay_ms() -> u64 {
    2000
}

fn default_quota_markers() -> Vec<String> {
    vec!["quota".to_string(), "resource_exhausted".to_string()]
}

fn default_true() -> bool {
    true
}

impl Default for Config {
    fn default() -> Self {
        Config {
            api_key: String::new(),
            model: default_model(),
            endpoint: String::new(),
            system_instruction: default_system_instruction(),
            workers: None,
            chunk_size_lines: default_chunk_size_lines(),
            timeout_secs: default_timeout_secs(),
            temperature: default_temperature(),
            retry: RetryConfig::default(),
            quota_markers: default_quota_markers(),
            auto_reformat: default_true(),
            log_level: LogLevel::default(),
        }
    }
}

/// Derive a worker count from the machine: the workload is I/O bound, so
/// twice the core count, kept inside [4, 20] to stay clear of rate limits
pub fn optimal_workers() -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4);
    (cores * 2).clamp(4, 20)
}

/// Clamp a user-supplied worker count into [1, MAX_WORKERS]
pub fn validate_workers(workers: usize) -> usize {
    workers.clamp(1, MAX_WORKERS)
}

impl Config {
    /// Load a config file, or create one with defaults when it is missing
    pub fn load_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to open config file: {:?}", path))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))
        } else {
            let config = Config::default();
            config.save_to_file(path)?;
            Ok(config)
        }
    }

    /// Write the config as pretty JSON
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string_pretty(self)
            .context("Failed to serialize config to JSON")?;
        std::fs::write(path.as_ref(), json)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))?;
        Ok(())
    }

    /// API key from the config, or from the environment when unset
    pub fn resolve_api_key(&self) -> String {
        if !self.api_key.is_empty() {
            return self.api_key.clone();
        }
        for var in API_KEY_ENV_VARS {
            if let Ok(value) = std::env::var(var) {
                if !value.is_empty() {
                    return value;
                }
            }
        }
        String::new()
    }

    /// Worker count after defaulting and clamping
    pub fn effective_workers(&self) -> usize {
        match self.workers {
            Some(w) => validate_workers(w),
            None => optimal_workers(),
        }
    }

    /// Chunk size after clamping
    pub fn effective_chunk_size(&self) -> usize {
        chunker::clamp_chunk_size(self.chunk_size_lines)
    }

    /// Retry policy derived from the retry section
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_safety_retries: self.retry.max_safety_retries.max(1),
            max_quality_retries: self.retry.max_quality_retries.max(1),
            retry_delay: Duration::from_millis(self.retry.retry_delay_ms),
        }
    }

    /// Quota predicate derived from the configured markers
    pub fn quota_detector(&self) -> QuotaDetector {
        QuotaDetector::new(self.quota_markers.clone())
    }

    /// Validate the configuration for required values
    pub fn validate(&self) -> Result<()> {
        if self.resolve_api_key().is_empty() {
            return Err(anyhow!(
                "An API key is required: set `api_key` in the config file or the GEMINI_API_KEY environment variable"
            ));
        }
        if self.model.is_empty() {
            return Err(anyhow!("Model identifier must not be empty"));
        }
        Ok(())
    }
}

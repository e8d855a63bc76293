//! Application configuration management
//!
//! Handles config loading, validation, and environment variable processing
//! following the precedence: defaults -> .env -> env vars -> CLI args.

use crate::primitives::*;
use crate::resolver::{BackoffConfig, ResolverConfig, RetryPolicy};
use clap::Parser;
use reqwest::Url;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

/// Default configuration values
pub mod defaults {
    pub const REGISTRY_URL: &str = crate::registry::npm::DEFAULT_REGISTRY_URL;
    pub const JOBS: usize = crate::resolver::DEFAULT_MAX_CONCURRENT_FETCHES;
    pub const NET_TIMEOUT: u64 = 30;
    pub const RETRIES: u32 = 2;
    pub const FAILURE_POLICY: &str = "abort";
    pub const CACHE_TTL: u64 = crate::registry::cache::DEFAULT_CACHE_TTL_SECS;
    pub const LOG_LEVEL: u8 = 0; // Error-only logging by default
    pub const LOG_FORMAT: &str = "text";
    pub const LOG_OUTPUT: &str = "stderr";
    pub const COLOR: &str = "auto";
}

/// Upper bound on `--jobs`
pub const MAX_JOBS: usize = 1024;

/// Default value functions for configuration fields
mod default_fns {
    use super::*;

    pub fn registry_url() -> String {
        defaults::REGISTRY_URL.to_string()
    }

    pub fn jobs() -> usize {
        defaults::JOBS
    }

    pub fn net_timeout() -> u64 {
        defaults::NET_TIMEOUT
    }

    pub fn retries() -> u32 {
        defaults::RETRIES
    }

    pub fn cache_ttl() -> u64 {
        defaults::CACHE_TTL
    }

    pub fn log_level() -> u8 {
        defaults::LOG_LEVEL
    }
}

/// Application configuration structure
#[derive(Debug, Clone, PartialEq, Parser, Deserialize)]
pub struct AppConfig {
    /// Base URL of the npm-compatible registry
    #[arg(long = "registry", env = "DEPTREE_REGISTRY_URL", default_value = defaults::REGISTRY_URL, global = true)]
    #[serde(default = "default_fns::registry_url")]
    pub registry_url: String,

    /// Registry requests allowed in flight at once
    #[arg(short = 'j', long, env = "DEPTREE_JOBS", default_value_t = defaults::JOBS, global = true)]
    #[serde(default = "default_fns::jobs")]
    pub jobs: usize,

    /// Per-request timeout in seconds
    #[arg(long, env = "DEPTREE_NET_TIMEOUT", default_value_t = defaults::NET_TIMEOUT, global = true)]
    #[serde(default = "default_fns::net_timeout")]
    pub net_timeout: u64,

    /// Retries after a transient registry failure
    #[arg(long, env = "DEPTREE_RETRIES", default_value_t = defaults::RETRIES, global = true)]
    #[serde(default = "default_fns::retries")]
    pub retries: u32,

    /// What an unresolvable dependency does (abort, annotate)
    #[arg(long, env = "DEPTREE_FAILURE_POLICY", default_value = defaults::FAILURE_POLICY, global = true)]
    #[serde(default)]
    pub failure_policy: FailurePolicy,

    /// Deadline for a whole resolution in seconds
    #[arg(long, env = "DEPTREE_RESOLVE_TIMEOUT", global = true)]
    #[serde(default)]
    pub resolve_timeout: Option<u64>,

    /// Directory for the persistent registry cache (disabled when unset)
    #[arg(long, env = "DEPTREE_CACHE_DIR", global = true)]
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,

    /// Seconds a cached packument is trusted before revalidation
    #[arg(long, env = "DEPTREE_CACHE_TTL", default_value_t = defaults::CACHE_TTL, global = true)]
    #[serde(default = "default_fns::cache_ttl")]
    pub cache_ttl: u64,

    /// Verbosity level (0=error, 1=warn, 2=info, 3=debug, 4=trace)
    #[arg(long, env = "DEPTREE_LOG_LEVEL", default_value_t = defaults::LOG_LEVEL, global = true)]
    #[serde(default = "default_fns::log_level")]
    pub log_level: u8,

    /// Log format (text, json, pretty)
    #[arg(long, env = "DEPTREE_LOG_FORMAT", default_value = defaults::LOG_FORMAT, global = true)]
    #[serde(default = "LogFormat::default")]
    pub log_format: LogFormat,

    /// Log output stream (stderr, stdout)
    #[arg(long, env = "DEPTREE_LOG_OUTPUT", default_value = defaults::LOG_OUTPUT, global = true)]
    #[serde(default = "LogOutput::default")]
    pub log_output: LogOutput,

    /// Color output control (auto, always, never)
    #[arg(short, long, env = "DEPTREE_COLOR", default_value = defaults::COLOR, global = true)]
    #[serde(default = "ColorIntent::default")]
    pub color: ColorIntent,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            registry_url: default_fns::registry_url(),
            jobs: default_fns::jobs(),
            net_timeout: default_fns::net_timeout(),
            retries: default_fns::retries(),
            failure_policy: FailurePolicy::default(),
            resolve_timeout: None,
            cache_dir: None,
            cache_ttl: default_fns::cache_ttl(),
            log_level: default_fns::log_level(),
            log_format: LogFormat::default(),
            log_output: LogOutput::default(),
            color: ColorIntent::default(),
        }
    }
}

impl AppConfig {
    /// Create LoggerConfig from AppConfig
    pub fn to_logger_config(&self) -> LoggerConfig {
        LoggerConfig {
            level: LogLevel::from_verbosity(self.log_level),
            format: self.log_format,
            output: self.log_output,
            color: self.color.enabled(),
        }
    }

    /// Create ResolverConfig from AppConfig
    pub fn to_resolver_config(&self) -> ResolverConfig {
        ResolverConfig {
            max_concurrent_fetches: self.jobs,
            failure_policy: self.failure_policy,
            retry: RetryPolicy {
                max_attempts: self.retries.saturating_add(1),
                backoff: BackoffConfig::default(),
            },
            timeout: self.resolve_timeout.map(Duration::from_secs),
        }
    }

    pub fn net_timeout(&self) -> Duration {
        Duration::from_secs(self.net_timeout)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl)
    }

    /// Merge this config with another, taking non-default values from other
    pub fn merge_with(mut self, other: Self) -> Self {
        // For Option fields, take other if it's Some
        if other.resolve_timeout.is_some() {
            self.resolve_timeout = other.resolve_timeout;
        }
        if other.cache_dir.is_some() {
            self.cache_dir = other.cache_dir;
        }

        // For primitive fields, take other if it's not the default
        if other.registry_url != default_fns::registry_url() {
            self.registry_url = other.registry_url;
        }
        if other.jobs != default_fns::jobs() {
            self.jobs = other.jobs;
        }
        if other.net_timeout != default_fns::net_timeout() {
            self.net_timeout = other.net_timeout;
        }
        if other.retries != default_fns::retries() {
            self.retries = other.retries;
        }
        if other.cache_ttl != default_fns::cache_ttl() {
            self.cache_ttl = other.cache_ttl;
        }
        if other.log_level != default_fns::log_level() {
            self.log_level = other.log_level;
        }

        // For enums, detect if it's non-default
        if other.failure_policy != FailurePolicy::default() {
            self.failure_policy = other.failure_policy;
        }
        if other.log_format != LogFormat::default() {
            self.log_format = other.log_format;
        }
        if other.log_output != LogOutput::default() {
            self.log_output = other.log_output;
        }
        if other.color != ColorIntent::default() {
            self.color = other.color;
        }

        self
    }

    /// Validate the final configuration
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        let url = Url::parse(&self.registry_url).map_err(|e| ConfigError::InvalidRegistryUrl {
            url: self.registry_url.clone(),
            reason: e.to_string(),
        })?;
        if !matches!(url.scheme(), "http" | "https") {
            return Err(ConfigError::InvalidRegistryUrl {
                url: self.registry_url.clone(),
                reason: format!("unsupported scheme '{}'", url.scheme()),
            });
        }
        self.registry_url = self.registry_url.trim_end_matches('/').to_string();

        if self.jobs == 0 || self.jobs > MAX_JOBS {
            return Err(ConfigError::ValidationFailed {
                reason: format!("jobs must be between 1 and {}", MAX_JOBS),
            });
        }
        if self.net_timeout == 0 {
            return Err(ConfigError::ValidationFailed {
                reason: "net timeout must be greater than 0".to_string(),
            });
        }
        if self.resolve_timeout == Some(0) {
            return Err(ConfigError::ValidationFailed {
                reason: "resolve timeout must be greater than 0".to_string(),
            });
        }

        Ok(())
    }
}

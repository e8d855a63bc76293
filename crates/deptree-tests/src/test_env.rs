//! Isolated environments for end-to-end resolution tests
//!
//! Each environment owns a fixture registry and a scratch cache directory,
//! and builds the same `AppConfig` the CLI would load.

use crate::fixtures::RegistryFixture;
use anyhow::Result;
use deptree_lib::AppConfig;
use deptree_lib::primitives::FailurePolicy;
use std::path::Path;
use tempfile::TempDir;

pub struct TestEnvironment {
    pub registry: RegistryFixture,
    cache_dir: TempDir,
    config: AppConfig,
}

impl TestEnvironment {
    /// Environment around an existing registry fixture, no retries, no cache
    pub fn new(registry: RegistryFixture) -> Result<Self> {
        let config = AppConfig {
            registry_url: registry.url(),
            retries: 0,
            ..AppConfig::default()
        };
        Ok(Self {
            registry,
            cache_dir: TempDir::new()?,
            config,
        })
    }

    /// Environment serving the recorded react packuments
    pub async fn react() -> Result<Self> {
        Self::new(RegistryFixture::react().await?)
    }

    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.config.failure_policy = policy;
        self
    }

    pub fn with_jobs(mut self, jobs: usize) -> Self {
        self.config.jobs = jobs;
        self
    }

    pub fn with_retries(mut self, retries: u32) -> Self {
        self.config.retries = retries;
        self
    }

    /// Persist registry responses under the scratch directory
    pub fn with_cache(mut self) -> Self {
        self.config.cache_dir = Some(self.cache_dir.path().to_path_buf());
        self
    }

    pub fn cache_dir(&self) -> &Path {
        self.cache_dir.path()
    }

    /// Validated configuration for this environment
    pub fn config(&self) -> Result<AppConfig> {
        let mut config = self.config.clone();
        config.validate()?;
        Ok(config)
    }
}

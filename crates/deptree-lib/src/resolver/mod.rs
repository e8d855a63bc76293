//! # Resolver Module
//!
//! Resolves the full transitive dependency tree of `name@version` against an
//! injected [`RegistryClient`].
//!
//! A run has two phases. Discovery ([`graph`]) fetches every reachable
//! package name once, concurrently under a fetch bound, and records the
//! selected versions in a graph. Assembly ([`tree`]) then walks that graph
//! from the root, detects cycles, and builds the immutable tree with shared
//! subtrees. Both phases keep all state local to the run.
//!
//! ## Modules
//!
//! - [`select`] - npm range parsing and version selection
//! - [`graph`] - discovery of selected packages
//! - [`tree`] - resolved tree types and assembly
//! - [`retry`] - retry policy for transient registry failures
//! - [`error`] - resolution errors

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tracing::{debug, info};

pub mod error;
pub(crate) mod graph;
pub mod retry;
pub mod select;
pub mod tree;

pub use error::{ErrorKind, ResolveError};
pub use retry::{BackoffConfig, RetryPolicy};
pub use select::{RangeError, VersionRange, select, select_str};
pub use tree::{PackageId, ResolutionPath, ResolvedDependency, ResolvedPackage, UnresolvedDependency};

use crate::primitives::FailurePolicy;
use crate::registry::RegistryClient;
use graph::Discovery;

/// Default bound on registry requests in flight per run
pub const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 16;

/// Resolver tuning
#[derive(Debug, Clone, PartialEq)]
pub struct ResolverConfig {
    /// Registry requests allowed in flight at once, retries included
    pub max_concurrent_fetches: usize,
    /// What an unresolvable dependency does to the run
    pub failure_policy: FailurePolicy,
    pub retry: RetryPolicy,
    /// Deadline for a whole run
    pub timeout: Option<Duration>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            max_concurrent_fetches: DEFAULT_MAX_CONCURRENT_FETCHES,
            failure_policy: FailurePolicy::default(),
            retry: RetryPolicy::default(),
            timeout: None,
        }
    }
}

/// Dependency tree resolver over a registry client
pub struct Resolver<R> {
    registry: Arc<R>,
    config: ResolverConfig,
}

impl<R> Clone for Resolver<R> {
    fn clone(&self) -> Self {
        Self {
            registry: Arc::clone(&self.registry),
            config: self.config.clone(),
        }
    }
}

impl<R: RegistryClient + 'static> Resolver<R> {
    pub fn new(registry: Arc<R>, config: ResolverConfig) -> Self {
        Self { registry, config }
    }

    pub fn with_defaults(registry: Arc<R>) -> Self {
        Self::new(registry, ResolverConfig::default())
    }

    pub fn registry(&self) -> &Arc<R> {
        &self.registry
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve the tree of `name` at `version`
    ///
    /// `version` should name a published version; a dist-tag or range is
    /// accepted and goes through the same selection as child requirements.
    /// Dropping the returned future cancels every outstanding fetch.
    pub async fn resolve(&self, name: &str, version: &str) -> Result<ResolvedPackage, ResolveError> {
        match self.config.timeout {
            Some(timeout) => tokio::time::timeout(timeout, self.run(name, version))
                .await
                .map_err(|_| ResolveError::TimedOut { timeout })?,
            None => self.run(name, version).await,
        }
    }

    async fn run(&self, name: &str, version: &str) -> Result<ResolvedPackage, ResolveError> {
        if name.trim().is_empty() {
            return Err(ResolveError::PackageNotFound {
                name: name.to_string(),
            });
        }

        info!("Resolving {}@{}", name, version);
        let permits = Arc::new(Semaphore::new(
            self.config
                .max_concurrent_fetches
                .clamp(1, Semaphore::MAX_PERMITS),
        ));
        let discovery = Discovery::new(
            Arc::clone(&self.registry),
            permits,
            self.config.retry.clone(),
        );

        let (graph, root) = discovery.run(name, version).await?;
        let tree = tree::assemble(&graph, root, self.config.failure_policy)?;
        debug!(
            "Resolved {}@{} ({} packages)",
            tree.name,
            tree.version,
            graph.node_count()
        );
        Ok(tree)
    }
}

#[cfg(test)]
mod tests {
    include!("mod.test.rs");
}

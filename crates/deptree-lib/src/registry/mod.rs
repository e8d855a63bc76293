//! # Registry Module
//!
//! The resolver's view of a package registry: given a package name, return its
//! published versions and each version's declared dependency ranges, or fail.
//!
//! ## Modules
//!
//! - [`npm`] - HTTP client for npm-compatible registries
//! - [`cache`] - Optional persistent response cache with ETag revalidation
//! - [`mock`] - In-memory registry for tests and fixtures

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use std::future::Future;
use thiserror::Error;

pub mod cache;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod npm;

pub use cache::{CachedResponse, RegistryCache};
#[cfg(any(test, feature = "test-utils"))]
pub use mock::MockRegistryClient;
pub use npm::NpmRegistryClient;

/// Registry lookup failures
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("Package '{name}' not found in registry")]
    NotFound { name: String },

    #[error("Transient registry failure for '{name}': {reason}")]
    Transient { name: String, reason: String },

    #[error("Invalid registry response for '{name}': {reason}")]
    InvalidResponse { name: String, reason: String },
}

impl RegistryError {
    /// Whether retrying the same request may succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, RegistryError::Transient { .. })
    }

    /// Package name the failure refers to
    pub fn name(&self) -> &str {
        match self {
            RegistryError::NotFound { name }
            | RegistryError::Transient { name, .. }
            | RegistryError::InvalidResponse { name, .. } => name,
        }
    }
}

/// Dependency declarations of one published version
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionMetadata {
    /// Dependency name to range expression
    #[serde(default, deserialize_with = "null_as_default")]
    pub dependencies: BTreeMap<String, String>,
}

/// Registry document for one package name (a "packument")
///
/// Published versions never change, so a fetched document is treated as
/// read-only for the rest of a resolution run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageMetadata {
    #[serde(default)]
    pub name: String,

    /// Named pointers to versions, e.g. `latest`
    #[serde(rename = "dist-tags", default, deserialize_with = "null_as_default")]
    pub dist_tags: BTreeMap<String, String>,

    /// Version string to that version's dependency declarations
    #[serde(default, deserialize_with = "null_as_default")]
    pub versions: BTreeMap<String, VersionMetadata>,
}

impl PackageMetadata {
    /// Create an empty document for `name`
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Add a version with its dependency ranges
    pub fn with_version(mut self, version: &str, dependencies: &[(&str, &str)]) -> Self {
        let dependencies = dependencies
            .iter()
            .map(|(name, range)| (name.to_string(), range.to_string()))
            .collect();
        self.versions
            .insert(version.to_string(), VersionMetadata { dependencies });
        self
    }

    /// Point a dist-tag at a version
    pub fn with_dist_tag(mut self, tag: &str, version: &str) -> Self {
        self.dist_tags.insert(tag.to_string(), version.to_string());
        self
    }

    /// Dependencies declared by `version`, if that version is published
    pub fn dependencies_of(&self, version: &str) -> Option<&BTreeMap<String, String>> {
        self.versions.get(version).map(|v| &v.dependencies)
    }

    /// Published version strings
    pub fn version_keys(&self) -> impl Iterator<Item = &str> {
        self.versions.keys().map(String::as_str)
    }
}

/// Source of package metadata
///
/// Implementations are injected into the resolver; the resolver never knows
/// where the registry lives.
pub trait RegistryClient: Send + Sync {
    /// Fetch the metadata document for `name`
    fn fetch(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<PackageMetadata, RegistryError>> + Send;
}

/// Registries occasionally emit `null` where an object is expected
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    include!("mod.test.rs");
}

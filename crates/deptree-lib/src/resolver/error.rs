//! Resolution errors

use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::AcquireError;
use tokio::task::JoinError;

use super::tree::ResolutionPath;

/// Why a resolution (or one subtree of it) failed
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ResolveError {
    #[error("Package '{name}' not found in registry")]
    PackageNotFound { name: String },

    #[error("No version of '{name}' matches '{requested}'")]
    VersionNotFound { name: String, requested: String },

    #[error("Dependency cycle detected: {path}")]
    CycleDetected { path: ResolutionPath },

    #[error("Registry unavailable for '{name}' after {attempts} attempt(s): {reason}")]
    RegistryUnavailable {
        name: String,
        attempts: u32,
        reason: String,
    },

    #[error("Registry returned an unusable response for '{name}': {reason}")]
    InvalidResponse { name: String, reason: String },

    /// Attributes a failure to the requirement that triggered it
    #[error("Cannot resolve {name}@{range} required by {path}")]
    Dependency {
        path: ResolutionPath,
        name: String,
        range: String,
        #[source]
        source: Box<ResolveError>,
    },

    #[error("Resolution timed out after {timeout:?}")]
    TimedOut { timeout: Duration },

    #[error("Fetch task failed: {reason}")]
    TaskFailed { reason: String },

    #[error("Fetch pool closed")]
    PoolClosed,
}

impl ResolveError {
    /// Innermost error below any `Dependency` wrappers
    pub fn root_cause(&self) -> &ResolveError {
        let mut current = self;
        while let ResolveError::Dependency { source, .. } = current {
            current = source;
        }
        current
    }

    /// Category of the root cause
    pub fn kind(&self) -> ErrorKind {
        match self.root_cause() {
            ResolveError::PackageNotFound { .. } => ErrorKind::PackageNotFound,
            ResolveError::VersionNotFound { .. } => ErrorKind::VersionNotFound,
            ResolveError::CycleDetected { .. } => ErrorKind::CycleDetected,
            ResolveError::RegistryUnavailable { .. } => ErrorKind::RegistryUnavailable,
            ResolveError::InvalidResponse { .. } => ErrorKind::InvalidResponse,
            ResolveError::TimedOut { .. } => ErrorKind::TimedOut,
            ResolveError::Dependency { .. }
            | ResolveError::TaskFailed { .. }
            | ResolveError::PoolClosed => ErrorKind::Internal,
        }
    }
}

impl From<JoinError> for ResolveError {
    fn from(error: JoinError) -> Self {
        ResolveError::TaskFailed {
            reason: error.to_string(),
        }
    }
}

impl From<AcquireError> for ResolveError {
    fn from(_: AcquireError) -> Self {
        ResolveError::PoolClosed
    }
}

/// Coarse failure category, stable across wrapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    PackageNotFound,
    VersionNotFound,
    CycleDetected,
    RegistryUnavailable,
    TimedOut,
    InvalidResponse,
    Internal,
}

impl ErrorKind {
    /// Process exit code for the CLI
    pub fn exit_code(self) -> i32 {
        match self {
            ErrorKind::Internal => 1,
            ErrorKind::PackageNotFound => 2,
            ErrorKind::VersionNotFound => 3,
            ErrorKind::CycleDetected => 4,
            ErrorKind::RegistryUnavailable => 5,
            ErrorKind::TimedOut => 6,
            ErrorKind::InvalidResponse => 7,
        }
    }
}

#[cfg(test)]
mod tests {
    include!("error.test.rs");
}

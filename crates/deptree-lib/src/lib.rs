//! # deptree Library
//!
//! Concurrent dependency tree resolution against npm-compatible registries.
//!
//! ## Core Modules
//!
//! - [`primitives`] - Foundation types, errors, and shared enums
//! - [`logger`] - Structured logging with progress tracking
//! - [`registry`] - Registry client abstraction, npm HTTP client, response cache
//! - [`resolver`] - Version selection and concurrent tree resolution
//! - [`application`] - CLI interface, configuration, and command execution
//!
//! ## Quick Start
//!
//! ```no_run
//! # async fn run() -> anyhow::Result<()> {
//! use deptree_lib::{NpmRegistryClient, Resolver};
//! use std::sync::Arc;
//! use std::time::Duration;
//!
//! let registry = NpmRegistryClient::new("https://registry.npmjs.org", Duration::from_secs(30))?;
//! let tree = Resolver::with_defaults(Arc::new(registry))
//!     .resolve("react", "16.13.0")
//!     .await?;
//! println!("{}", serde_json::to_string_pretty(&tree)?);
//! # Ok(())
//! # }
//! ```

pub mod application;
pub mod logger;
pub mod primitives;
pub mod registry;
pub mod resolver;

// Re-export commonly used types for convenience
pub use application::{AppConfig, Cli, Commands, execute_command, exit_code};
pub use logger::Logger;
pub use primitives::{
    ColorIntent, ConfigError, FailurePolicy, LogFormat, LogLevel, LogOutput, LoggerError,
    TreeFormat,
};
pub use registry::{NpmRegistryClient, PackageMetadata, RegistryClient, RegistryError};
pub use resolver::{
    ResolveError, ResolvedDependency, ResolvedPackage, Resolver, ResolverConfig,
    UnresolvedDependency,
};

// Private imports for the main function
use anyhow::Result;

pub async fn main() -> Result<()> {
    // Load configuration and command: defaults -> .env -> env vars -> CLI
    let config = AppConfig::load()?;

    Logger::init(config.app_config.to_logger_config())?;

    execute_command(config).await
}

//! Command execution handlers
//!
//! Each handler builds its registry client from the loaded configuration,
//! runs the library operation, and leaves rendering to the dispatcher.

use crate::application::{AppConfig, CliConfig, Commands};
use crate::primitives::TreeFormat;
use crate::progress_span;
use crate::registry::{NpmRegistryClient, RegistryCache};
use crate::resolver::graph::select_version;
use crate::resolver::retry::fetch_with_retry;
use crate::resolver::{ResolveError, ResolvedPackage, Resolver};
use anyhow::{Context, Result};
use percent_encoding::percent_decode_str;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{Instrument, debug, warn};

/// Execute a parsed command, printing its result to stdout
pub async fn execute_command(config: CliConfig) -> Result<()> {
    let CliConfig {
        app_config,
        command,
    } = config;
    debug!("Running command for package '{}'", command.package_name());

    match command {
        Commands::Resolve {
            name,
            version,
            compact,
        } => {
            let format = if compact {
                TreeFormat::Compact
            } else {
                TreeFormat::Pretty
            };
            let tree = handle_resolve(&app_config, &name, &version).await?;
            println!("{}", render_tree(&tree, format)?);
        }
        Commands::Select { name, range } => {
            let version = handle_select(&app_config, &name, &range).await?;
            println!("{}", version);
        }
    }

    Ok(())
}

/// Resolve `name@version` against the configured registry
pub async fn handle_resolve(config: &AppConfig, name: &str, version: &str) -> Result<ResolvedPackage> {
    let name = decode_package_name(name)?;
    let cache = open_cache(config).await;
    let registry = registry_client(config, cache.clone())?;
    let resolver = Resolver::new(Arc::new(registry), config.to_resolver_config());

    let operation = format!("Resolving {}@{}", name, version);
    let result = resolver
        .resolve(&name, version)
        .instrument(progress_span!(operation.as_str()))
        .await;

    persist_cache(cache).await;
    Ok(result?)
}

/// Version of `name` that `range` selects
pub async fn handle_select(config: &AppConfig, name: &str, range: &str) -> Result<String> {
    let name = decode_package_name(name)?;
    let cache = open_cache(config).await;
    let registry = registry_client(config, cache.clone())?;
    let resolver_config = config.to_resolver_config();

    let permits = Semaphore::new(1);
    let operation = format!("Fetching {}", name);
    let result = fetch_with_retry(&registry, &permits, &resolver_config.retry, &name)
        .instrument(progress_span!(operation.as_str()))
        .await;

    persist_cache(cache).await;
    let metadata = result?;
    let version = select_version(&metadata, range)?;
    debug!("{}@{} selects {}", name, range, version);
    Ok(version)
}

/// Pretty or single-line JSON for a resolved tree
pub fn render_tree(tree: &ResolvedPackage, format: TreeFormat) -> Result<String> {
    let rendered = match format {
        TreeFormat::Pretty => serde_json::to_string_pretty(tree),
        TreeFormat::Compact => serde_json::to_string(tree),
    };
    rendered.context("Failed to serialize resolved tree")
}

/// Accept package names as they appear in registry URLs
///
/// `%40types%2Freact` and `@types/react` name the same package.
pub fn decode_package_name(raw: &str) -> Result<String> {
    let decoded = percent_decode_str(raw.trim())
        .decode_utf8()
        .with_context(|| format!("Package name '{}' is not valid UTF-8 once decoded", raw))?;
    Ok(decoded.into_owned())
}

/// Process exit code for an error returned by a command
pub fn exit_code(error: &anyhow::Error) -> u8 {
    error
        .downcast_ref::<ResolveError>()
        .map(|e| e.kind().exit_code())
        .and_then(|code| u8::try_from(code).ok())
        .unwrap_or(1)
}

fn registry_client(config: &AppConfig, cache: Option<Arc<RegistryCache>>) -> Result<NpmRegistryClient> {
    let client = NpmRegistryClient::new(config.registry_url.as_str(), config.net_timeout())
        .context("Failed to build HTTP client")?;
    Ok(match cache {
        Some(cache) => client.with_cache(cache),
        None => client,
    })
}

/// Registry cache from the configured directory; an unreadable cache starts empty
async fn open_cache(config: &AppConfig) -> Option<Arc<RegistryCache>> {
    let dir = config.cache_dir.clone()?;
    let cache = RegistryCache::with_ttl(dir, config.cache_ttl());
    if let Err(e) = cache.load_from_disk().await {
        warn!("Ignoring unreadable registry cache: {}", e);
    }
    Some(Arc::new(cache))
}

async fn persist_cache(cache: Option<Arc<RegistryCache>>) {
    if let Some(cache) = cache
        && let Err(e) = cache.save_to_disk().await
    {
        warn!("Failed to save registry cache: {}", e);
    }
}

#[cfg(test)]
mod tests {
    include!("commands.test.rs");
}

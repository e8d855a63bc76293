use reqwest::{Client, Response, StatusCode, header};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, trace};

/// Default cache TTL (Time To Live) - 5 minutes
pub const DEFAULT_CACHE_TTL_SECS: u64 = 300;

const CACHE_FILE: &str = "registry_cache.json";

/// Persistent cache failures
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Cache file {path} is not valid JSON: {source}")]
    Serialization {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Cached registry response with ETag support
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedResponse {
    /// Response body
    pub data: Vec<u8>,
    /// ETag value for revalidation (if the registry provided one)
    pub etag: Option<String>,
    /// Expiration timestamp
    pub expires: SystemTime,
    /// Response status code
    pub status: u16,
}

impl CachedResponse {
    /// Check if the cached response is expired
    pub fn is_expired(&self) -> bool {
        SystemTime::now() >= self.expires
    }

    /// Extend the TTL of this cached response
    pub fn extend_ttl(&mut self, ttl: Duration) {
        self.expires = SystemTime::now() + ttl;
    }
}

/// Registry response cache that survives between runs
///
/// The TTL is the knob for how far published metadata is trusted: entries
/// younger than the TTL are served without a request, older ones are
/// revalidated with `If-None-Match`. A zero TTL revalidates every time.
pub struct RegistryCache {
    cache: Arc<RwLock<HashMap<String, CachedResponse>>>,
    cache_dir: PathBuf,
    default_ttl: Duration,
}

impl RegistryCache {
    /// Create a cache rooted at `cache_dir` with the default TTL
    pub fn new(cache_dir: PathBuf) -> Self {
        Self::with_ttl(cache_dir, Duration::from_secs(DEFAULT_CACHE_TTL_SECS))
    }

    /// Create a cache with a custom TTL
    pub fn with_ttl(cache_dir: PathBuf, ttl: Duration) -> Self {
        Self {
            cache: Arc::new(RwLock::new(HashMap::new())),
            cache_dir,
            default_ttl: ttl,
        }
    }

    pub fn cache_dir(&self) -> &PathBuf {
        &self.cache_dir
    }

    pub fn ttl(&self) -> Duration {
        self.default_ttl
    }

    fn cache_file(&self) -> PathBuf {
        self.cache_dir.join(CACHE_FILE)
    }

    /// Load cache from disk, dropping expired entries without an ETag
    pub async fn load_from_disk(&self) -> Result<(), CacheError> {
        let cache_file = self.cache_file();
        if !cache_file.exists() {
            trace!("No cache file found, starting with empty cache");
            return Ok(());
        }

        let data = tokio::fs::read_to_string(&cache_file)
            .await
            .map_err(|source| CacheError::Io {
                path: cache_file.clone(),
                source,
            })?;

        let loaded: HashMap<String, CachedResponse> =
            serde_json::from_str(&data).map_err(|source| CacheError::Serialization {
                path: cache_file.clone(),
                source,
            })?;

        let mut cache = self.cache.write().await;
        let mut dropped = 0;
        for (url, entry) in loaded {
            // Expired entries are still worth a conditional request
            if entry.is_expired() && entry.etag.is_none() {
                dropped += 1;
                continue;
            }
            cache.insert(url, entry);
        }

        debug!(
            "Loaded registry cache: {} entries kept, {} dropped",
            cache.len(),
            dropped
        );
        Ok(())
    }

    /// Save cache to disk
    pub async fn save_to_disk(&self) -> Result<(), CacheError> {
        let cache = self.cache.read().await;

        tokio::fs::create_dir_all(&self.cache_dir)
            .await
            .map_err(|source| CacheError::Io {
                path: self.cache_dir.clone(),
                source,
            })?;

        let cache_file = self.cache_file();
        let data = serde_json::to_string(&*cache).map_err(|source| CacheError::Serialization {
            path: cache_file.clone(),
            source,
        })?;

        tokio::fs::write(&cache_file, data)
            .await
            .map_err(|source| CacheError::Io {
                path: cache_file.clone(),
                source,
            })?;

        debug!("Saved {} registry cache entries to disk", cache.len());
        Ok(())
    }

    pub async fn get(&self, url: &str) -> Option<CachedResponse> {
        self.cache.read().await.get(url).cloned()
    }

    pub async fn put(&self, url: String, response: CachedResponse) {
        self.cache.write().await.insert(url, response);
    }

    pub async fn len(&self) -> usize {
        self.cache.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.cache.read().await.is_empty()
    }

    /// GET `url` through the cache, revalidating stale entries by ETag
    pub async fn get_with_etag(
        &self,
        client: &Client,
        url: &str,
        accept: &str,
    ) -> Result<CachedResponse, reqwest::Error> {
        if let Some(cached) = self.get(url).await {
            if !cached.is_expired() {
                trace!("Cache hit for URL: {}", url);
                return Ok(cached);
            }

            if let Some(etag) = cached.etag.clone() {
                trace!("Cache expired, revalidating with ETag: {}", url);

                let response = client
                    .get(url)
                    .header(header::ACCEPT, accept)
                    .header(header::IF_NONE_MATCH, etag)
                    .send()
                    .await?;

                if response.status() == StatusCode::NOT_MODIFIED {
                    trace!("ETag revalidation successful (304), extending TTL");
                    let mut updated = cached;
                    updated.extend_ttl(self.default_ttl);
                    self.put(url.to_string(), updated.clone()).await;
                    return Ok(updated);
                }

                return self.process_and_cache_response(url, response).await;
            }
        }

        trace!("Cache miss for URL: {}", url);
        let response = client
            .get(url)
            .header(header::ACCEPT, accept)
            .send()
            .await?;
        self.process_and_cache_response(url, response).await
    }

    async fn process_and_cache_response(
        &self,
        url: &str,
        response: Response,
    ) -> Result<CachedResponse, reqwest::Error> {
        let status = response.status().as_u16();
        let etag = response
            .headers()
            .get(header::ETAG)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        let data = response.bytes().await?.to_vec();

        let cached_response = CachedResponse {
            data,
            etag,
            expires: SystemTime::now() + self.default_ttl,
            status,
        };

        if (200..300).contains(&status) {
            self.put(url.to_string(), cached_response.clone()).await;
            trace!("Cached response for URL: {}", url);
        } else {
            debug!(
                "Not caching non-success response (status {}): {}",
                status, url
            );
        }

        Ok(cached_response)
    }
}

#[cfg(test)]
mod tests {
    include!("cache.test.rs");
}

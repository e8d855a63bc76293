//! npm registry client
//!
//! Fetches packuments from an npm-compatible registry over HTTP. The base URL
//! is always injected so the same client serves the public registry, a
//! private mirror, or a mock server in tests.

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use reqwest::{Client, StatusCode, header};
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

use super::{PackageMetadata, RegistryClient, RegistryError, RegistryCache};

/// Public npm registry
pub const DEFAULT_REGISTRY_URL: &str = "https://registry.npmjs.org";

/// Abbreviated packument media type; carries versions, dependencies and dist-tags
pub const ABBREVIATED_METADATA: &str = "application/vnd.npm.install-v1+json";

/// Characters escaped in a package name path segment. `@` stays literal and
/// the scope separator `/` is escaped so `@scope/pkg` stays one segment.
const PACKAGE_NAME: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'?')
    .add(b'<')
    .add(b'>');

/// HTTP registry client
#[derive(Clone)]
pub struct NpmRegistryClient {
    client: Client,
    base_url: String,
    cache: Option<Arc<RegistryCache>>,
}

impl NpmRegistryClient {
    /// Create a client for `base_url` with a request timeout
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("deptree/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self::with_client(client, base_url))
    }

    /// Wrap an existing HTTP client
    pub fn with_client(client: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            cache: None,
        }
    }

    /// Route requests through a response cache
    pub fn with_cache(mut self, cache: Arc<RegistryCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// URL of the packument for `name`
    pub fn package_url(&self, name: &str) -> String {
        format!(
            "{}/{}",
            self.base_url,
            utf8_percent_encode(name, PACKAGE_NAME)
        )
    }

    async fn get(&self, name: &str, url: &str) -> Result<(u16, Vec<u8>), RegistryError> {
        if let Some(cache) = &self.cache {
            let cached = cache
                .get_with_etag(&self.client, url, ABBREVIATED_METADATA)
                .await
                .map_err(|e| transport_error(name, e))?;
            return Ok((cached.status, cached.data));
        }

        let response = self
            .client
            .get(url)
            .header(header::ACCEPT, ABBREVIATED_METADATA)
            .send()
            .await
            .map_err(|e| transport_error(name, e))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| transport_error(name, e))?;
        Ok((status, body.to_vec()))
    }
}

impl RegistryClient for NpmRegistryClient {
    async fn fetch(&self, name: &str) -> Result<PackageMetadata, RegistryError> {
        let url = self.package_url(name);
        trace!("Fetching packument: {}", url);

        let (status, body) = self.get(name, &url).await?;
        classify_response(name, status, &body)
    }
}

fn transport_error(name: &str, error: reqwest::Error) -> RegistryError {
    RegistryError::Transient {
        name: name.to_string(),
        reason: error.to_string(),
    }
}

/// Map an HTTP status and body onto the registry contract
fn classify_response(name: &str, status: u16, body: &[u8]) -> Result<PackageMetadata, RegistryError> {
    let status = StatusCode::from_u16(status).map_err(|e| RegistryError::InvalidResponse {
        name: name.to_string(),
        reason: e.to_string(),
    })?;

    if status.is_success() {
        let mut metadata: PackageMetadata =
            serde_json::from_slice(body).map_err(|e| RegistryError::InvalidResponse {
                name: name.to_string(),
                reason: format!("malformed packument: {}", e),
            })?;
        if metadata.name.is_empty() {
            metadata.name = name.to_string();
        }
        return Ok(metadata);
    }

    match status {
        StatusCode::NOT_FOUND => Err(RegistryError::NotFound {
            name: name.to_string(),
        }),
        StatusCode::TOO_MANY_REQUESTS | StatusCode::REQUEST_TIMEOUT => {
            Err(RegistryError::Transient {
                name: name.to_string(),
                reason: format!("HTTP {}", status),
            })
        }
        s if s.is_server_error() => Err(RegistryError::Transient {
            name: name.to_string(),
            reason: format!("HTTP {}", status),
        }),
        _ => Err(RegistryError::InvalidResponse {
            name: name.to_string(),
            reason: format!("HTTP {}", status),
        }),
    }
}

#[cfg(test)]
mod tests {
    include!("npm.test.rs");
}

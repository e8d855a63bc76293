//! Fixture infrastructure for E2E tests
//!
//! Loads VCR cassettes holding recorded npm registry responses and replays
//! them from a local mockito server.

use anyhow::Result;
use mockito::{Mock, Server, ServerGuard};
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Packages recorded under `fixtures/cassettes/npm`, enough to resolve react@16.13.0
pub const REACT_PACKAGES: [&str; 6] = [
    "react",
    "loose-envify",
    "js-tokens",
    "object-assign",
    "prop-types",
    "react-is",
];

/// VCR cassette structure matching our recorded HTTP interactions
#[derive(Debug, Deserialize)]
pub struct VcrCassette {
    pub name: String,
    pub request: VcrRequest,
    pub response: VcrResponse,
}

#[derive(Debug, Deserialize)]
pub struct VcrRequest {
    pub method: String,
    pub url: String,
    #[serde(default)]
    pub headers: Value,
}

#[derive(Debug, Deserialize)]
pub struct VcrResponse {
    pub status: u16,
    #[serde(default)]
    pub headers: Value,
    pub body: Value,
}

impl VcrResponse {
    fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(Value::as_str)
    }
}

/// Path of the npm cassette recorded for `package`
pub fn npm_cassette_path(package: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures/cassettes/npm")
        .join(format!("{}.json", package.replace('/', "__")))
}

/// Load a VCR cassette from disk
pub fn load_cassette(cassette_path: &Path) -> Result<VcrCassette> {
    let cassette_content = std::fs::read_to_string(cassette_path).map_err(|e| {
        anyhow::anyhow!("Failed to load VCR cassette '{}': {}", cassette_path.display(), e)
    })?;

    serde_json::from_str(&cassette_content).map_err(|e| {
        anyhow::anyhow!("Failed to parse VCR cassette '{}': {}", cassette_path.display(), e)
    })
}

/// Load a VCR cassette and extract the response body as a typed value
pub fn load_vcr_response<T>(cassette_path: &Path) -> Result<T>
where
    T: DeserializeOwned,
{
    let vcr = load_cassette(cassette_path)?;
    serde_json::from_value(vcr.response.body).map_err(|e| {
        anyhow::anyhow!(
            "Failed to deserialize response body from '{}': {}",
            cassette_path.display(),
            e
        )
    })
}

/// Registry path the npm client requests for `package`
pub fn registry_path(package: &str) -> String {
    format!("/{}", package.replacen('/', "%2F", 1))
}

/// Local registry replaying recorded packuments
pub struct RegistryFixture {
    server: ServerGuard,
    mocks: Vec<Mock>,
}

impl RegistryFixture {
    /// Start an empty registry
    pub async fn start() -> Self {
        Self {
            server: Server::new_async().await,
            mocks: Vec::new(),
        }
    }

    /// Start a registry serving every react cassette, each expected once
    pub async fn react() -> Result<Self> {
        let mut fixture = Self::start().await;
        for package in REACT_PACKAGES {
            fixture.replay(package, 1).await?;
        }
        Ok(fixture)
    }

    /// Serve the recorded response for `package`, expecting `hits` requests
    pub async fn replay(&mut self, package: &str, hits: usize) -> Result<&mut Self> {
        let vcr = load_cassette(&npm_cassette_path(package))?;
        let mut mock = self
            .server
            .mock(vcr.request.method.as_str(), registry_path(package).as_str())
            .with_status(usize::from(vcr.response.status))
            .with_body(serde_json::to_string(&vcr.response.body)?);
        if let Some(content_type) = vcr.response.header("content-type") {
            mock = mock.with_header("content-type", content_type);
        }
        if let Some(etag) = vcr.response.header("etag") {
            mock = mock.with_header("etag", etag);
        }
        self.mocks.push(mock.expect(hits).create_async().await);
        Ok(self)
    }

    /// Serve an inline packument for `package`
    pub async fn packument(&mut self, package: &str, body: Value) -> &mut Self {
        let mock = self
            .server
            .mock("GET", registry_path(package).as_str())
            .with_status(200)
            .with_body(body.to_string())
            .create_async()
            .await;
        self.mocks.push(mock);
        self
    }

    /// Answer every request for `package` with a bare status code
    pub async fn status(&mut self, package: &str, status: usize, hits: usize) -> &mut Self {
        let mock = self
            .server
            .mock("GET", registry_path(package).as_str())
            .with_status(status)
            .expect(hits)
            .create_async()
            .await;
        self.mocks.push(mock);
        self
    }

    pub fn url(&self) -> String {
        self.server.url()
    }

    /// Assert every mounted response was requested as often as expected
    pub async fn assert_hits(&self) {
        for mock in &self.mocks {
            mock.assert_async().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deptree_lib::PackageMetadata;

    #[test]
    fn test_load_vcr_cassette() {
        let vcr = load_cassette(&npm_cassette_path("react")).unwrap();

        assert_eq!(vcr.name, "npm/react");
        assert_eq!(vcr.request.method, "GET");
        assert_eq!(vcr.request.url, "https://registry.npmjs.org/react");
        assert_eq!(vcr.response.status, 200);
        assert_eq!(vcr.response.header("etag"), Some("W/\"react-fixture\""));
    }

    #[test]
    fn test_every_react_cassette_parses_as_packument() {
        for package in REACT_PACKAGES {
            let metadata: PackageMetadata =
                load_vcr_response(&npm_cassette_path(package)).unwrap();
            assert_eq!(metadata.name, package);
            assert!(!metadata.versions.is_empty(), "{} has no versions", package);
        }
    }

    #[test]
    fn test_registry_path_encodes_scope() {
        assert_eq!(registry_path("react"), "/react");
        assert_eq!(registry_path("@types/react"), "/@types%2Freact");
    }
}

use super::*;
use mockito::Server;

fn client_for(server: &Server) -> NpmRegistryClient {
    NpmRegistryClient::new(server.url(), Duration::from_secs(5)).unwrap()
}

#[test]
fn test_package_url_encodes_scope_separator() {
    let client = NpmRegistryClient::with_client(Client::new(), "https://registry.test/");

    assert_eq!(client.base_url(), "https://registry.test");
    assert_eq!(client.package_url("react"), "https://registry.test/react");
    assert_eq!(
        client.package_url("@types/react"),
        "https://registry.test/@types%2Freact"
    );
}

#[tokio::test]
async fn test_fetch_parses_packument() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/object-assign")
        .match_header("accept", ABBREVIATED_METADATA)
        .with_status(200)
        .with_header("content-type", ABBREVIATED_METADATA)
        .with_body(
            r#"{"name":"object-assign","dist-tags":{"latest":"4.1.1"},
                "versions":{"4.1.0":{},"4.1.1":{"dependencies":{}}}}"#,
        )
        .create_async()
        .await;

    let metadata = client_for(&server).fetch("object-assign").await.unwrap();

    assert_eq!(metadata.name, "object-assign");
    assert_eq!(metadata.versions.len(), 2);
    assert_eq!(metadata.dist_tags["latest"], "4.1.1");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_fetch_scoped_package_hits_encoded_path() {
    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/@types%2Freact")
        .with_status(200)
        .with_body(r#"{"versions":{"16.9.0":{"dependencies":{"csstype":"^2.2.0"}}}}"#)
        .create_async()
        .await;

    let metadata = client_for(&server).fetch("@types/react").await.unwrap();

    // Missing name falls back to the requested one
    assert_eq!(metadata.name, "@types/react");
    assert_eq!(
        metadata.dependencies_of("16.9.0").unwrap()["csstype"],
        "^2.2.0"
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn test_fetch_404_is_not_found() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/does-not-exist")
        .with_status(404)
        .with_body(r#"{"error":"Not found"}"#)
        .create_async()
        .await;

    let result = client_for(&server).fetch("does-not-exist").await;

    assert_eq!(
        result,
        Err(RegistryError::NotFound {
            name: "does-not-exist".to_string()
        })
    );
}

#[tokio::test]
async fn test_fetch_server_errors_are_transient() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/flaky")
        .with_status(503)
        .create_async()
        .await;
    server
        .mock("GET", "/throttled")
        .with_status(429)
        .create_async()
        .await;

    let client = client_for(&server);

    assert!(client.fetch("flaky").await.unwrap_err().is_transient());
    assert!(client.fetch("throttled").await.unwrap_err().is_transient());
}

#[tokio::test]
async fn test_fetch_client_errors_are_not_retryable() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/private")
        .with_status(401)
        .create_async()
        .await;

    let error = client_for(&server).fetch("private").await.unwrap_err();

    assert!(matches!(error, RegistryError::InvalidResponse { .. }));
    assert!(!error.is_transient());
}

#[tokio::test]
async fn test_fetch_malformed_body_is_invalid_response() {
    let mut server = Server::new_async().await;
    server
        .mock("GET", "/garbage")
        .with_status(200)
        .with_body("<html>oops</html>")
        .create_async()
        .await;

    let error = client_for(&server).fetch("garbage").await.unwrap_err();

    assert!(matches!(error, RegistryError::InvalidResponse { ref reason, .. } if reason.starts_with("malformed packument")));
}

#[tokio::test]
async fn test_fetch_connection_refused_is_transient() {
    // Nothing listens on port 9 of localhost in the test environment
    let client = NpmRegistryClient::new("http://127.0.0.1:9", Duration::from_secs(2)).unwrap();

    let error = client.fetch("react").await.unwrap_err();
    assert!(error.is_transient());
}

#[tokio::test]
async fn test_fetch_through_cache_reuses_response() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let cache = Arc::new(RegistryCache::new(temp_dir.path().to_path_buf()));

    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/js-tokens")
        .with_status(200)
        .with_body(r#"{"name":"js-tokens","versions":{"4.0.0":{}}}"#)
        .expect(1)
        .create_async()
        .await;

    let client = client_for(&server).with_cache(Arc::clone(&cache));
    let first = client.fetch("js-tokens").await.unwrap();
    let second = client.fetch("js-tokens").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(cache.len().await, 1);
    mock.assert_async().await;
}

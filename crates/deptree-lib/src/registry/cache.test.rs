use super::*;
use mockito::Server;
use tempfile::TempDir;

const ACCEPT: &str = "application/json";

fn entry(data: &[u8], etag: Option<&str>, expires: SystemTime) -> CachedResponse {
    CachedResponse {
        data: data.to_vec(),
        etag: etag.map(str::to_string),
        expires,
        status: 200,
    }
}

#[tokio::test]
async fn test_cache_creation() {
    let temp_dir = TempDir::new().unwrap();
    let cache = RegistryCache::new(temp_dir.path().to_path_buf());

    assert_eq!(cache.cache_dir(), &temp_dir.path().to_path_buf());
    assert_eq!(cache.ttl(), Duration::from_secs(DEFAULT_CACHE_TTL_SECS));
    assert!(cache.is_empty().await);
}

#[test]
fn test_cached_response_expiry() {
    let expired = entry(b"x", None, SystemTime::now() - Duration::from_secs(10));
    assert!(expired.is_expired());

    let mut fresh = entry(b"x", None, SystemTime::now() + Duration::from_secs(10));
    assert!(!fresh.is_expired());

    let old_expires = fresh.expires;
    fresh.extend_ttl(Duration::from_secs(300));
    assert!(fresh.expires > old_expires);
}

#[tokio::test]
async fn test_put_get_and_overwrite() {
    let temp_dir = TempDir::new().unwrap();
    let cache = RegistryCache::new(temp_dir.path().to_path_buf());
    let later = SystemTime::now() + Duration::from_secs(300);

    cache
        .put("https://registry.test/a".to_string(), entry(b"a", None, later))
        .await;
    cache
        .put("https://registry.test/b".to_string(), entry(b"b", None, later))
        .await;
    assert_eq!(cache.len().await, 2);
    assert_eq!(
        cache.get("https://registry.test/a").await.map(|e| e.data),
        Some(b"a".to_vec())
    );
    assert!(cache.get("https://registry.test/missing").await.is_none());

    cache
        .put(
            "https://registry.test/a".to_string(),
            entry(b"a2", Some("\"v2\""), later),
        )
        .await;
    assert_eq!(cache.len().await, 2);
    let replaced = cache.get("https://registry.test/a").await.unwrap();
    assert_eq!(replaced.data, b"a2".to_vec());
    assert_eq!(replaced.etag.as_deref(), Some("\"v2\""));
}

#[tokio::test]
async fn test_disk_persistence_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let cache_dir = temp_dir.path().join("nested");

    {
        let cache = RegistryCache::new(cache_dir.clone());
        cache
            .put(
                "https://registry.test/react".to_string(),
                entry(
                    b"{}",
                    Some("\"abc123\""),
                    SystemTime::now() + Duration::from_secs(300),
                ),
            )
            .await;
        cache.save_to_disk().await.unwrap();
    }

    let cache = RegistryCache::new(cache_dir);
    cache.load_from_disk().await.unwrap();

    let loaded = cache.get("https://registry.test/react").await.unwrap();
    assert_eq!(loaded.data, b"{}");
    assert_eq!(loaded.etag.as_deref(), Some("\"abc123\""));
}

#[tokio::test]
async fn test_load_keeps_expired_entries_with_etag_only() {
    let temp_dir = TempDir::new().unwrap();
    let cache_dir = temp_dir.path().to_path_buf();
    let past = SystemTime::now() - Duration::from_secs(10);

    {
        let cache = RegistryCache::new(cache_dir.clone());
        cache
            .put("https://registry.test/etag".to_string(), entry(b"1", Some("\"e\""), past))
            .await;
        cache
            .put("https://registry.test/plain".to_string(), entry(b"2", None, past))
            .await;
        cache.save_to_disk().await.unwrap();
    }

    let cache = RegistryCache::new(cache_dir);
    cache.load_from_disk().await.unwrap();

    assert_eq!(cache.len().await, 1);
    assert!(cache.get("https://registry.test/etag").await.is_some());
}

#[tokio::test]
async fn test_load_missing_file_is_empty() {
    let temp_dir = TempDir::new().unwrap();
    let cache = RegistryCache::new(temp_dir.path().join("never-created"));

    cache.load_from_disk().await.unwrap();
    assert!(cache.is_empty().await);
}

#[tokio::test]
async fn test_load_corrupt_file_is_error() {
    let temp_dir = TempDir::new().unwrap();
    std::fs::write(temp_dir.path().join(CACHE_FILE), "not json").unwrap();
    let cache = RegistryCache::new(temp_dir.path().to_path_buf());

    let result = cache.load_from_disk().await;
    assert!(matches!(result, Err(CacheError::Serialization { .. })));
}

#[tokio::test]
async fn test_cache_hit_skips_network() {
    let temp_dir = TempDir::new().unwrap();
    let cache = RegistryCache::new(temp_dir.path().to_path_buf());
    let client = Client::new();

    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/react")
        .match_header("accept", ACCEPT)
        .with_status(200)
        .with_header("etag", "\"abc123\"")
        .with_body("response data")
        .expect(1)
        .create_async()
        .await;

    let url = format!("{}/react", server.url());
    let first = cache.get_with_etag(&client, &url, ACCEPT).await.unwrap();
    let second = cache.get_with_etag(&client, &url, ACCEPT).await.unwrap();

    assert_eq!(first.data, b"response data");
    assert_eq!(second.data, b"response data");
    assert_eq!(first.etag.as_deref(), Some("\"abc123\""));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_zero_ttl_revalidates_with_304() {
    let temp_dir = TempDir::new().unwrap();
    let cache = RegistryCache::with_ttl(temp_dir.path().to_path_buf(), Duration::ZERO);
    let client = Client::new();

    let mut server = Server::new_async().await;
    let initial = server
        .mock("GET", "/react")
        .with_status(200)
        .with_header("etag", "\"abc123\"")
        .with_body("original data")
        .expect(1)
        .create_async()
        .await;

    let url = format!("{}/react", server.url());
    let first = cache.get_with_etag(&client, &url, ACCEPT).await.unwrap();
    assert_eq!(first.data, b"original data");
    initial.assert_async().await;

    let revalidated = server
        .mock("GET", "/react")
        .match_header("if-none-match", "\"abc123\"")
        .with_status(304)
        .expect(1)
        .create_async()
        .await;

    let second = cache.get_with_etag(&client, &url, ACCEPT).await.unwrap();
    assert_eq!(second.data, b"original data");
    assert_eq!(second.status, 200);
    revalidated.assert_async().await;
}

#[tokio::test]
async fn test_changed_etag_replaces_entry() {
    let temp_dir = TempDir::new().unwrap();
    let cache = RegistryCache::with_ttl(temp_dir.path().to_path_buf(), Duration::ZERO);
    let client = Client::new();

    let mut server = Server::new_async().await;
    let url = format!("{}/react", server.url());
    cache
        .put(
            url.clone(),
            entry(b"original data", Some("\"abc123\""), SystemTime::now()),
        )
        .await;

    let mock = server
        .mock("GET", "/react")
        .match_header("if-none-match", "\"abc123\"")
        .with_status(200)
        .with_header("etag", "\"xyz789\"")
        .with_body("new data")
        .expect(1)
        .create_async()
        .await;

    let result = cache.get_with_etag(&client, &url, ACCEPT).await.unwrap();
    assert_eq!(result.data, b"new data");
    assert_eq!(result.etag.as_deref(), Some("\"xyz789\""));
    assert_eq!(
        cache.get(&url).await.map(|e| e.data),
        Some(b"new data".to_vec())
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn test_non_success_response_not_cached() {
    let temp_dir = TempDir::new().unwrap();
    let cache = RegistryCache::new(temp_dir.path().to_path_buf());
    let client = Client::new();

    let mut server = Server::new_async().await;
    let mock = server
        .mock("GET", "/missing")
        .with_status(404)
        .with_body("{\"error\":\"Not found\"}")
        .create_async()
        .await;

    let url = format!("{}/missing", server.url());
    let result = cache.get_with_etag(&client, &url, ACCEPT).await.unwrap();

    assert_eq!(result.status, 404);
    assert!(cache.is_empty().await);
    mock.assert_async().await;
}

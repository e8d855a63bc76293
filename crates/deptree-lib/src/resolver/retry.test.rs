use super::*;
use crate::registry::MockRegistryClient;

fn fast_policy(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        backoff: BackoffConfig {
            initial: Duration::from_millis(1),
            max: Duration::from_millis(5),
            multiplier: 2.0,
        },
    }
}

#[test]
fn test_backoff_grows_and_caps() {
    let backoff = BackoffConfig {
        initial: Duration::from_millis(100),
        max: Duration::from_millis(350),
        multiplier: 2.0,
    };

    assert_eq!(backoff.delay_for(1), Duration::from_millis(100));
    assert_eq!(backoff.delay_for(2), Duration::from_millis(200));
    assert_eq!(backoff.delay_for(3), Duration::from_millis(350));
    assert_eq!(backoff.delay_for(u32::MAX), Duration::from_millis(350));
}

#[test]
fn test_policy_constructors() {
    assert_eq!(RetryPolicy::default().max_attempts, 3);
    assert_eq!(RetryPolicy::none().max_attempts, 1);
    assert_eq!(RetryPolicy::with_retries(4).max_attempts, 5);
    assert_eq!(RetryPolicy::with_retries(u32::MAX).max_attempts, u32::MAX);
}

#[tokio::test]
async fn test_transient_failure_then_success() {
    let registry = MockRegistryClient::new()
        .with_package(PackageMetadata::new("flaky").with_version("1.0.0", &[]))
        .with_transient_failures("flaky", 2);
    let permits = Semaphore::new(1);

    let metadata = fetch_with_retry(&registry, &permits, &fast_policy(3), "flaky")
        .await
        .unwrap();

    assert_eq!(metadata.name, "flaky");
    assert_eq!(registry.fetch_count("flaky"), 3);
    assert_eq!(permits.available_permits(), 1);
}

#[tokio::test]
async fn test_retries_exhausted_is_registry_unavailable() {
    let registry = MockRegistryClient::new()
        .with_package(PackageMetadata::new("down").with_version("1.0.0", &[]))
        .with_transient_failures("down", 10);
    let permits = Semaphore::new(1);

    let error = fetch_with_retry(&registry, &permits, &fast_policy(3), "down")
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        ResolveError::RegistryUnavailable { ref name, attempts: 3, .. } if name == "down"
    ));
    assert_eq!(registry.fetch_count("down"), 3);
}

#[tokio::test]
async fn test_not_found_is_not_retried() {
    let registry = MockRegistryClient::new();
    let permits = Semaphore::new(1);

    let error = fetch_with_retry(&registry, &permits, &fast_policy(5), "ghost")
        .await
        .unwrap_err();

    assert_eq!(
        error,
        ResolveError::PackageNotFound {
            name: "ghost".to_string()
        }
    );
    assert_eq!(registry.fetch_count("ghost"), 1);
}

#[tokio::test]
async fn test_zero_attempts_still_fetches_once() {
    let registry = MockRegistryClient::new()
        .with_package(PackageMetadata::new("once").with_version("1.0.0", &[]));
    let permits = Semaphore::new(1);

    fetch_with_retry(&registry, &permits, &fast_policy(0), "once")
        .await
        .unwrap();
    assert_eq!(registry.fetch_count("once"), 1);
}

#[tokio::test]
async fn test_rejected_response_is_not_retried() {
    let mut server = mockito::Server::new_async().await;
    let forbidden = server
        .mock("GET", "/private-pkg")
        .with_status(403)
        .expect(1)
        .create_async()
        .await;
    let registry =
        crate::registry::NpmRegistryClient::new(server.url(), Duration::from_secs(5)).unwrap();
    let permits = Semaphore::new(1);

    let error = fetch_with_retry(&registry, &permits, &fast_policy(3), "private-pkg")
        .await
        .unwrap_err();

    assert!(matches!(
        error,
        ResolveError::InvalidResponse { ref name, .. } if name == "private-pkg"
    ));
    assert_eq!(error.kind(), crate::resolver::ErrorKind::InvalidResponse);
    assert!(!error.to_string().contains("attempt"));
    forbidden.assert_async().await;
}

#[tokio::test]
async fn test_malformed_packument_is_invalid_response() {
    let mut server = mockito::Server::new_async().await;
    let _garbled = server
        .mock("GET", "/garbled")
        .with_status(200)
        .with_body("{\"versions\": [")
        .create_async()
        .await;
    let registry =
        crate::registry::NpmRegistryClient::new(server.url(), Duration::from_secs(5)).unwrap();
    let permits = Semaphore::new(1);

    let error = fetch_with_retry(&registry, &permits, &fast_policy(3), "garbled")
        .await
        .unwrap_err();

    assert_eq!(error.kind().exit_code(), 7);
}

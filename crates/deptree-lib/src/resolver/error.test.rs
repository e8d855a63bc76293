use super::*;
use crate::resolver::tree::PackageId;

fn path(ids: &[(&str, &str)]) -> ResolutionPath {
    ids.iter()
        .map(|(name, version)| PackageId::new(*name, *version))
        .collect::<Vec<_>>()
        .into()
}

#[test]
fn test_kind_sees_through_dependency_wrappers() {
    let error = ResolveError::Dependency {
        path: path(&[("app", "1.0.0"), ("lib", "2.0.0")]),
        name: "leaf".to_string(),
        range: "^3.0.0".to_string(),
        source: Box::new(ResolveError::VersionNotFound {
            name: "leaf".to_string(),
            requested: "^3.0.0".to_string(),
        }),
    };

    assert_eq!(error.kind(), ErrorKind::VersionNotFound);
    assert!(matches!(
        error.root_cause(),
        ResolveError::VersionNotFound { .. }
    ));
}

#[test]
fn test_display_names_requirement_and_path() {
    let error = ResolveError::Dependency {
        path: path(&[("app", "1.0.0")]),
        name: "left-pad".to_string(),
        range: "^1.0.0".to_string(),
        source: Box::new(ResolveError::PackageNotFound {
            name: "left-pad".to_string(),
        }),
    };

    assert_eq!(
        error.to_string(),
        "Cannot resolve left-pad@^1.0.0 required by app@1.0.0"
    );
    let source = std::error::Error::source(&error).map(|e| e.to_string());
    assert_eq!(
        source.as_deref(),
        Some("Package 'left-pad' not found in registry")
    );
}

#[test]
fn test_cycle_display() {
    let error = ResolveError::CycleDetected {
        path: path(&[("a", "1.0.0"), ("b", "1.0.0"), ("a", "1.0.0")]),
    };

    assert_eq!(
        error.to_string(),
        "Dependency cycle detected: a@1.0.0 -> b@1.0.0 -> a@1.0.0"
    );
    assert_eq!(error.kind(), ErrorKind::CycleDetected);
}

#[test]
fn test_exit_codes_are_distinct() {
    let kinds = [
        ErrorKind::Internal,
        ErrorKind::PackageNotFound,
        ErrorKind::VersionNotFound,
        ErrorKind::CycleDetected,
        ErrorKind::RegistryUnavailable,
        ErrorKind::TimedOut,
        ErrorKind::InvalidResponse,
    ];
    let codes: std::collections::HashSet<i32> = kinds.iter().map(|k| k.exit_code()).collect();

    assert_eq!(codes.len(), kinds.len());
    assert!(!codes.contains(&0));
    assert_eq!(ErrorKind::PackageNotFound.exit_code(), 2);
    assert_eq!(ErrorKind::TimedOut.exit_code(), 6);
}

#[test]
fn test_error_kind_serializes_snake_case() {
    let json = serde_json::to_string(&ErrorKind::RegistryUnavailable).unwrap();
    assert_eq!(json, "\"registry_unavailable\"");
}

#[tokio::test]
async fn test_closed_semaphore_maps_to_pool_closed() {
    let semaphore = tokio::sync::Semaphore::new(1);
    semaphore.close();

    let error: ResolveError = semaphore.acquire().await.unwrap_err().into();
    assert_eq!(error, ResolveError::PoolClosed);
    assert_eq!(error.kind(), ErrorKind::Internal);
}

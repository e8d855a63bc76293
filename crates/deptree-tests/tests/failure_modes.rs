//! Registry failures surfaced through end-to-end resolution

use anyhow::Result;
use deptree_lib::application::commands::{exit_code, handle_resolve};
use deptree_lib::primitives::FailurePolicy;
use deptree_lib::resolver::{ErrorKind, ResolveError};
use deptree_tests::{RegistryFixture, TestEnvironment};
use serde_json::json;

async fn app_depending_on(dependency: &str, range: &str) -> RegistryFixture {
    let mut registry = RegistryFixture::start().await;
    registry
        .packument(
            "app",
            json!({"name": "app", "versions": {"1.0.0": {"dependencies": {dependency: range}}}}),
        )
        .await;
    registry
}

#[tokio::test]
async fn missing_root_package() -> Result<()> {
    let mut registry = RegistryFixture::start().await;
    registry.status("ghost", 404, 1).await;
    let env = TestEnvironment::new(registry)?;

    let error = handle_resolve(&env.config()?, "ghost", "1.0.0")
        .await
        .unwrap_err();

    assert_eq!(
        error.downcast_ref::<ResolveError>(),
        Some(&ResolveError::PackageNotFound {
            name: "ghost".to_string()
        })
    );
    assert_eq!(exit_code(&error), 2);
    Ok(())
}

#[tokio::test]
async fn missing_root_version() -> Result<()> {
    let env = TestEnvironment::react().await?;

    let error = handle_resolve(&env.config()?, "react", "99.0.0")
        .await
        .unwrap_err();

    assert_eq!(
        error.downcast_ref::<ResolveError>().map(ResolveError::kind),
        Some(ErrorKind::VersionNotFound)
    );
    Ok(())
}

#[tokio::test]
async fn abort_reports_path_to_missing_dependency() -> Result<()> {
    let mut registry = app_depending_on("left-pad", "^1.0.0").await;
    registry.status("left-pad", 404, 1).await;
    let env = TestEnvironment::new(registry)?;

    let error = handle_resolve(&env.config()?, "app", "1.0.0")
        .await
        .unwrap_err();
    let resolve_error = error.downcast_ref::<ResolveError>().expect("resolve error");

    match resolve_error {
        ResolveError::Dependency {
            path, name, range, ..
        } => {
            assert_eq!(path.to_string(), "app@1.0.0");
            assert_eq!(name, "left-pad");
            assert_eq!(range, "^1.0.0");
        }
        other => panic!("expected dependency error, got {:?}", other),
    }
    assert_eq!(resolve_error.kind(), ErrorKind::PackageNotFound);
    Ok(())
}

#[tokio::test]
async fn annotate_keeps_partial_tree() -> Result<()> {
    let mut registry = app_depending_on("left-pad", "^1.0.0").await;
    registry.status("left-pad", 404, 1).await;
    let env = TestEnvironment::new(registry)?.with_failure_policy(FailurePolicy::Annotate);

    let tree = handle_resolve(&env.config()?, "app", "1.0.0").await?;

    let unresolved = tree.unresolved();
    assert_eq!(unresolved.len(), 1);
    assert_eq!(unresolved[0].name, "left-pad");
    assert_eq!(unresolved[0].error.kind(), ErrorKind::PackageNotFound);
    assert_eq!(
        serde_json::to_value(&tree)?["dependencies"]["left-pad"]["error"]["kind"],
        "package_not_found"
    );
    Ok(())
}

#[tokio::test]
async fn server_errors_are_retried_then_reported() -> Result<()> {
    let mut registry = RegistryFixture::start().await;
    registry.status("flaky", 503, 3).await;
    let env = TestEnvironment::new(registry)?.with_retries(2);

    let error = handle_resolve(&env.config()?, "flaky", "1.0.0")
        .await
        .unwrap_err();

    match error.downcast_ref::<ResolveError>() {
        Some(ResolveError::RegistryUnavailable { name, attempts, .. }) => {
            assert_eq!(name, "flaky");
            assert_eq!(*attempts, 3);
        }
        other => panic!("expected registry unavailable, got {:?}", other),
    }
    assert_eq!(exit_code(&error), 5);
    env.registry.assert_hits().await;
    Ok(())
}

#[tokio::test]
async fn cycle_in_registry_data_is_reported() -> Result<()> {
    let mut registry = RegistryFixture::start().await;
    registry
        .packument(
            "chicken",
            json!({"versions": {"1.0.0": {"dependencies": {"egg": "^1.0.0"}}}}),
        )
        .await
        .packument(
            "egg",
            json!({"versions": {"1.0.0": {"dependencies": {"chicken": "1.0.0"}}}}),
        )
        .await;
    let env = TestEnvironment::new(registry)?.with_failure_policy(FailurePolicy::Annotate);

    let error = handle_resolve(&env.config()?, "chicken", "1.0.0")
        .await
        .unwrap_err();

    assert_eq!(exit_code(&error), 4);
    assert!(error.to_string().contains("chicken@1.0.0 -> egg@1.0.0 -> chicken@1.0.0"));
    Ok(())
}

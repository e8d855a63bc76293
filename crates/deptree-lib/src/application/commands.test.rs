use super::*;
use crate::primitives::FailurePolicy;
use crate::resolver::ErrorKind;
use mockito::{Mock, Server, ServerGuard};
use serde_json::{Value, json};
use std::time::Duration;

async fn mount(server: &mut ServerGuard, path: &str, body: Value) -> Mock {
    server
        .mock("GET", path)
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(body.to_string())
        .create_async()
        .await
}

async fn envify_registry() -> (ServerGuard, Vec<Mock>) {
    let mut server = Server::new_async().await;
    let envify = mount(
        &mut server,
        "/loose-envify",
        json!({
            "name": "loose-envify",
            "dist-tags": {"latest": "1.4.0"},
            "versions": {
                "1.3.1": {"dependencies": {"js-tokens": "^3.0.0"}},
                "1.4.0": {"dependencies": {"js-tokens": "^3.0.0 || ^4.0.0"}}
            }
        }),
    )
    .await;
    let tokens = mount(
        &mut server,
        "/js-tokens",
        json!({
            "name": "js-tokens",
            "dist-tags": {"latest": "4.0.0"},
            "versions": {"3.0.2": {}, "4.0.0": {}}
        }),
    )
    .await;
    (server, vec![envify, tokens])
}

fn config_for(server: &ServerGuard) -> AppConfig {
    AppConfig {
        registry_url: server.url(),
        retries: 0,
        ..AppConfig::default()
    }
}

#[tokio::test]
async fn test_handle_resolve_builds_tree_over_http() {
    let (server, _mocks) = envify_registry().await;

    let tree = handle_resolve(&config_for(&server), "loose-envify", "1.4.0")
        .await
        .unwrap();

    assert_eq!(tree.version, "1.4.0");
    assert_eq!(tree.dependencies["js-tokens"].version(), Some("4.0.0"));
}

#[tokio::test]
async fn test_handle_resolve_accepts_dist_tag() {
    let (server, _mocks) = envify_registry().await;

    let tree = handle_resolve(&config_for(&server), "loose-envify", "latest")
        .await
        .unwrap();

    assert_eq!(tree.version, "1.4.0");
}

#[tokio::test]
async fn test_handle_resolve_keeps_resolve_error_downcastable() {
    let mut server = Server::new_async().await;
    let _ghost = server
        .mock("GET", "/ghost")
        .with_status(404)
        .create_async()
        .await;

    let error = handle_resolve(&config_for(&server), "ghost", "1.0.0")
        .await
        .unwrap_err();

    assert_eq!(
        error.downcast_ref::<ResolveError>(),
        Some(&ResolveError::PackageNotFound {
            name: "ghost".to_string()
        })
    );
    assert_eq!(exit_code(&error), 2);
}

#[tokio::test]
async fn test_handle_resolve_annotates_when_configured() {
    let mut server = Server::new_async().await;
    let _app = mount(
        &mut server,
        "/app",
        json!({"versions": {"1.0.0": {"dependencies": {"left-pad": "^9.0.0"}}}}),
    )
    .await;
    let _left_pad = mount(&mut server, "/left-pad", json!({"versions": {"1.3.0": {}}})).await;

    let config = AppConfig {
        failure_policy: FailurePolicy::Annotate,
        ..config_for(&server)
    };
    let tree = handle_resolve(&config, "app", "1.0.0").await.unwrap();

    let unresolved = tree.dependencies["left-pad"].as_unresolved().unwrap();
    assert_eq!(unresolved.error.kind(), ErrorKind::VersionNotFound);
}

#[tokio::test]
async fn test_handle_resolve_decodes_scoped_names() {
    let mut server = Server::new_async().await;
    let mock = mount(
        &mut server,
        "/@types%2Fnode",
        json!({"name": "@types/node", "versions": {"14.0.0": {}}}),
    )
    .await;

    let tree = handle_resolve(&config_for(&server), "%40types%2Fnode", "14.0.0")
        .await
        .unwrap();

    assert_eq!(tree.name, "@types/node");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_handle_resolve_persists_cache_directory() {
    let (server, _mocks) = envify_registry().await;
    let cache_dir = tempfile::tempdir().unwrap();
    let config = AppConfig {
        cache_dir: Some(cache_dir.path().to_path_buf()),
        ..config_for(&server)
    };

    handle_resolve(&config, "loose-envify", "1.4.0").await.unwrap();

    let entries = std::fs::read_dir(cache_dir.path()).unwrap().count();
    assert!(entries > 0, "cache directory should not be empty");
}

#[tokio::test]
async fn test_handle_select_picks_highest_match() {
    let (server, _mocks) = envify_registry().await;
    let config = config_for(&server);

    assert_eq!(
        handle_select(&config, "js-tokens", "^3.0.0 || ^4.0.0").await.unwrap(),
        "4.0.0"
    );
    assert_eq!(
        handle_select(&config, "js-tokens", "~3.0.0").await.unwrap(),
        "3.0.2"
    );
}

#[tokio::test]
async fn test_handle_select_reports_unsatisfied_range() {
    let (server, _mocks) = envify_registry().await;

    let error = handle_select(&config_for(&server), "js-tokens", "^5.0.0")
        .await
        .unwrap_err();

    assert_eq!(exit_code(&error), 3);
}

#[tokio::test]
async fn test_execute_command_runs_resolve() {
    let (server, _mocks) = envify_registry().await;
    let config = CliConfig {
        app_config: config_for(&server),
        command: Commands::Resolve {
            name: "loose-envify".to_string(),
            version: "1.4.0".to_string(),
            compact: true,
        },
    };

    execute_command(config).await.unwrap();
}

#[test]
fn test_render_tree_formats() {
    let tree = ResolvedPackage {
        name: "js-tokens".to_string(),
        version: "4.0.0".to_string(),
        dependencies: Default::default(),
    };

    let compact = render_tree(&tree, TreeFormat::Compact).unwrap();
    assert_eq!(
        compact,
        r#"{"name":"js-tokens","version":"4.0.0","dependencies":{}}"#
    );

    let pretty = render_tree(&tree, TreeFormat::Pretty).unwrap();
    assert!(pretty.contains('\n'));
    assert_eq!(
        serde_json::from_str::<Value>(&pretty).unwrap(),
        serde_json::from_str::<Value>(&compact).unwrap()
    );
}

#[test]
fn test_decode_package_name() {
    assert_eq!(decode_package_name("react").unwrap(), "react");
    assert_eq!(decode_package_name("%40types%2Freact").unwrap(), "@types/react");
    assert_eq!(decode_package_name(" @babel/core ").unwrap(), "@babel/core");
}

#[test]
fn test_decode_package_name_rejects_invalid_utf8() {
    let error = decode_package_name("left%FFpad").unwrap_err();
    assert!(error.to_string().contains("left%FFpad"));
    assert_eq!(exit_code(&error), 1);
}

#[tokio::test]
async fn test_handle_resolve_never_queries_undecodable_name() {
    let mut server = Server::new_async().await;
    let any_request = server
        .mock("GET", mockito::Matcher::Any)
        .expect(0)
        .create_async()
        .await;

    let result = handle_resolve(&config_for(&server), "%C3%28", "1.0.0").await;

    assert!(result.is_err());
    any_request.assert_async().await;
}

#[test]
fn test_exit_code_mapping() {
    let timed_out = anyhow::Error::new(ResolveError::TimedOut {
        timeout: Duration::from_secs(1),
    });
    assert_eq!(exit_code(&timed_out), 6);

    let wrapped = anyhow::Error::new(ResolveError::VersionNotFound {
        name: "react".to_string(),
        requested: "^99".to_string(),
    })
    .context("while resolving");
    assert_eq!(exit_code(&wrapped), 3);

    assert_eq!(exit_code(&anyhow::anyhow!("anything else")), 1);
}

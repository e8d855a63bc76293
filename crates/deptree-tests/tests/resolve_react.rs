//! End-to-end resolution of react@16.13.0 against recorded packuments
//!
//! Exercises the HTTP client, version selection, and the concurrent resolver
//! together through the same entry point the CLI uses.

use anyhow::Result;
use deptree_lib::application::commands::handle_resolve;
use deptree_lib::resolver::PackageId;
use deptree_tests::TestEnvironment;
use serde_json::{Value, json};
use std::sync::Arc;

fn expected_react_tree() -> Value {
    let leaf = |name: &str, version: &str| json!({"name": name, "version": version, "dependencies": {}});
    let loose_envify = json!({
        "name": "loose-envify",
        "version": "1.4.0",
        "dependencies": {"js-tokens": leaf("js-tokens", "4.0.0")}
    });

    json!({
        "name": "react",
        "version": "16.13.0",
        "dependencies": {
            "loose-envify": loose_envify,
            "object-assign": leaf("object-assign", "4.1.1"),
            "prop-types": {
                "name": "prop-types",
                "version": "15.7.2",
                "dependencies": {
                    "loose-envify": loose_envify,
                    "object-assign": leaf("object-assign", "4.1.1"),
                    "react-is": leaf("react-is", "16.13.1")
                }
            }
        }
    })
}

#[tokio::test]
async fn react_tree_matches_recorded_registry() -> Result<()> {
    let env = TestEnvironment::react().await?;

    let tree = handle_resolve(&env.config()?, "react", "16.13.0").await?;

    assert_eq!(serde_json::to_value(&tree)?, expected_react_tree());
    Ok(())
}

#[tokio::test]
async fn each_packument_is_requested_once() -> Result<()> {
    let env = TestEnvironment::react().await?;

    handle_resolve(&env.config()?, "react", "16.13.0").await?;

    // loose-envify and object-assign are reached twice but fetched once
    env.registry.assert_hits().await;
    Ok(())
}

#[tokio::test]
async fn repeated_packages_share_one_subtree() -> Result<()> {
    let env = TestEnvironment::react().await?;

    let tree = handle_resolve(&env.config()?, "react", "16.13.0").await?;

    let direct = tree.dependency("loose-envify").expect("direct loose-envify");
    let via_prop_types = tree
        .dependency("prop-types")
        .and_then(|p| p.dependency("loose-envify"))
        .expect("transitive loose-envify");
    assert!(Arc::ptr_eq(direct, via_prop_types));

    let ids = tree.package_ids();
    assert_eq!(ids.len(), 6);
    assert!(ids.contains(&PackageId::new("react-is", "16.13.1")));
    Ok(())
}

#[tokio::test]
async fn result_does_not_depend_on_parallelism() -> Result<()> {
    let serial = TestEnvironment::react().await?.with_jobs(1);
    let parallel = TestEnvironment::react().await?.with_jobs(32);

    let serial_tree = handle_resolve(&serial.config()?, "react", "16.13.0").await?;
    let parallel_tree = handle_resolve(&parallel.config()?, "react", "16.13.0").await?;

    assert_eq!(serial_tree, parallel_tree);
    Ok(())
}

#[tokio::test]
async fn dist_tags_select_the_root_version() -> Result<()> {
    let env = TestEnvironment::react().await?;
    let config = env.config()?;

    let latest = handle_resolve(&config, "react", "latest").await?;
    assert_eq!(latest.version, "16.13.0");

    let next = handle_resolve(&config, "react", "next").await?;
    assert_eq!(next.version, "0.0.0-experimental-33c3af284");
    assert!(next.dependency("prop-types").is_none());
    Ok(())
}

#[tokio::test]
async fn root_range_selects_highest_release() -> Result<()> {
    let env = TestEnvironment::react().await?;

    let tree = handle_resolve(&env.config()?, "react", "^16.0.0").await?;

    assert_eq!(tree.version, "16.13.0");
    Ok(())
}

//! Persistent registry cache across separate resolutions

use anyhow::Result;
use deptree_lib::application::commands::handle_resolve;
use deptree_tests::TestEnvironment;

#[tokio::test]
async fn second_run_is_served_from_cache() -> Result<()> {
    let env = TestEnvironment::react().await?.with_cache();
    let config = env.config()?;

    let first = handle_resolve(&config, "react", "16.13.0").await?;
    assert!(env.cache_dir().join("registry_cache.json").exists());

    let second = handle_resolve(&config, "react", "16.13.0").await?;

    assert_eq!(first, second);
    // Every cassette expects exactly one request across both runs
    env.registry.assert_hits().await;
    Ok(())
}

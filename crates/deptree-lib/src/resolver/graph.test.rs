use super::*;
use crate::registry::MockRegistryClient;

fn metadata() -> PackageMetadata {
    PackageMetadata::new("lib")
        .with_version("1.0.0", &[])
        .with_version("1.2.0", &[])
        .with_version("2.0.0", &[])
        .with_version("3.0.0-beta.1", &[])
        .with_dist_tag("latest", "2.0.0")
        .with_dist_tag("next", "3.0.0-beta.1")
        .with_dist_tag("stale", "0.9.0")
}

#[test]
fn test_select_version_prefers_exact_key() {
    assert_eq!(select_version(&metadata(), "1.0.0").unwrap(), "1.0.0");
    assert_eq!(select_version(&metadata(), " 1.2.0 ").unwrap(), "1.2.0");
}

#[test]
fn test_select_version_follows_dist_tags() {
    assert_eq!(select_version(&metadata(), "latest").unwrap(), "2.0.0");
    assert_eq!(select_version(&metadata(), "next").unwrap(), "3.0.0-beta.1");
}

#[test]
fn test_select_version_falls_back_to_range() {
    assert_eq!(select_version(&metadata(), "^1.0.0").unwrap(), "1.2.0");
    assert_eq!(select_version(&metadata(), "*").unwrap(), "2.0.0");
}

#[test]
fn test_select_version_never_echoes_the_request() {
    for requested in ["999.0.0", "stale", "^4.0.0", "not a range"] {
        let error = select_version(&metadata(), requested).unwrap_err();
        assert_eq!(
            error,
            ResolveError::VersionNotFound {
                name: "lib".to_string(),
                requested: requested.to_string(),
            }
        );
    }
}

fn discovery(registry: MockRegistryClient) -> (Arc<MockRegistryClient>, Discovery<MockRegistryClient>) {
    let registry = Arc::new(registry);
    let discovery = Discovery::new(
        Arc::clone(&registry),
        Arc::new(Semaphore::new(4)),
        RetryPolicy::none(),
    );
    (registry, discovery)
}

#[tokio::test]
async fn test_discovery_records_nodes_edges_and_failures() {
    let (registry, discovery) = discovery(
        MockRegistryClient::new()
            .with_package(
                PackageMetadata::new("app")
                    .with_version("1.0.0", &[("lib", "^1.0.0"), ("util", "^1.0.0"), ("gone", "*")]),
            )
            .with_package(
                PackageMetadata::new("lib")
                    .with_version("1.0.0", &[("util", "^1.0.0")])
                    .with_version("1.5.0", &[("util", "^1.1.0")]),
            )
            .with_package(
                PackageMetadata::new("util")
                    .with_version("1.0.0", &[])
                    .with_version("1.1.0", &[]),
            ),
    );

    let (graph, root) = discovery.run("app", "1.0.0").await.unwrap();

    assert_eq!(graph.node_count(), 3);
    assert_eq!(graph.edge_count(), 3);
    assert_eq!(graph.package(root), &PackageId::new("app", "1.0.0"));

    let children = graph.children(root);
    let names: Vec<&str> = children.iter().map(Child::name).collect();
    assert_eq!(names, ["gone", "lib", "util"]);
    assert!(matches!(
        children[0],
        Child::Unresolved(UnresolvedDependency { error: ResolveError::PackageNotFound { .. }, .. })
    ));

    for name in ["app", "lib", "util", "gone"] {
        assert_eq!(registry.fetch_count(name), 1, "{} fetched once", name);
    }
}

#[tokio::test]
async fn test_discovery_terminates_on_cycles() {
    let (registry, discovery) = discovery(
        MockRegistryClient::new()
            .with_package(PackageMetadata::new("a").with_version("1.0.0", &[("b", "1.0.0")]))
            .with_package(PackageMetadata::new("b").with_version("1.0.0", &[("a", "1.0.0")])),
    );

    let (graph, _) = discovery.run("a", "1.0.0").await.unwrap();

    assert_eq!(graph.node_count(), 2);
    assert_eq!(graph.edge_count(), 2);
    assert_eq!(registry.total_fetches(), 2);
}

#[tokio::test]
async fn test_discovery_root_failures_are_errors() {
    let (_, missing) = discovery(MockRegistryClient::new());
    assert_eq!(
        missing.run("nope", "1.0.0").await.unwrap_err(),
        ResolveError::PackageNotFound {
            name: "nope".to_string()
        }
    );

    let (_, wrong_version) = discovery(
        MockRegistryClient::new().with_package(PackageMetadata::new("pkg").with_version("1.0.0", &[])),
    );
    assert!(matches!(
        wrong_version.run("pkg", "999.0.0").await.unwrap_err(),
        ResolveError::VersionNotFound { .. }
    ));
}

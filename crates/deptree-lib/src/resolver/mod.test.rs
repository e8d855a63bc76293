use super::*;
use crate::registry::{MockRegistryClient, PackageMetadata};

/// react@16.13.0 and its transitive dependencies, with neighbouring versions
fn react_registry() -> MockRegistryClient {
    MockRegistryClient::new()
        .with_package(
            PackageMetadata::new("react")
                .with_version(
                    "16.13.0",
                    &[
                        ("loose-envify", "^1.1.0"),
                        ("object-assign", "^4.1.1"),
                        ("prop-types", "^15.6.2"),
                    ],
                )
                .with_version("16.12.0", &[("loose-envify", "^1.1.0")])
                .with_dist_tag("latest", "16.13.0"),
        )
        .with_package(
            PackageMetadata::new("loose-envify")
                .with_version("1.3.1", &[("js-tokens", "^3.0.0")])
                .with_version("1.4.0", &[("js-tokens", "^3.0.0 || ^4.0.0")]),
        )
        .with_package(
            PackageMetadata::new("js-tokens")
                .with_version("3.0.2", &[])
                .with_version("4.0.0", &[]),
        )
        .with_package(
            PackageMetadata::new("object-assign")
                .with_version("4.1.0", &[])
                .with_version("4.1.1", &[]),
        )
        .with_package(
            PackageMetadata::new("prop-types")
                .with_version(
                    "15.7.2",
                    &[
                        ("loose-envify", "^1.4.0"),
                        ("object-assign", "^4.1.1"),
                        ("react-is", "^16.8.1"),
                    ],
                )
                .with_version("16.0.0-alpha.0", &[]),
        )
        .with_package(
            PackageMetadata::new("react-is")
                .with_version("16.8.1", &[])
                .with_version("16.13.1", &[])
                .with_version("17.0.2", &[]),
        )
}

fn resolver(registry: MockRegistryClient) -> Resolver<MockRegistryClient> {
    Resolver::with_defaults(Arc::new(registry))
}

fn resolver_with(registry: MockRegistryClient, config: ResolverConfig) -> Resolver<MockRegistryClient> {
    Resolver::new(Arc::new(registry), config)
}

fn fast_retry(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        backoff: BackoffConfig {
            initial: Duration::from_millis(1),
            max: Duration::from_millis(5),
            multiplier: 2.0,
        },
    }
}

fn version_of<'a>(package: &'a ResolvedPackage, name: &str) -> &'a str {
    package.dependencies[name]
        .version()
        .unwrap_or_else(|| panic!("{} should be resolved", name))
}

#[tokio::test]
async fn test_resolves_react_tree() {
    let resolver = resolver(react_registry());

    let react = resolver.resolve("react", "16.13.0").await.unwrap();

    assert_eq!(react.name, "react");
    assert_eq!(react.version, "16.13.0");
    assert_eq!(
        react.dependencies.keys().collect::<Vec<_>>(),
        ["loose-envify", "object-assign", "prop-types"]
    );
    assert_eq!(version_of(&react, "loose-envify"), "1.4.0");
    assert_eq!(version_of(&react, "object-assign"), "4.1.1");
    assert_eq!(version_of(&react, "prop-types"), "15.7.2");

    let loose_envify = react.dependency("loose-envify").unwrap();
    assert_eq!(version_of(loose_envify, "js-tokens"), "4.0.0");

    let prop_types = react.dependency("prop-types").unwrap();
    assert_eq!(version_of(prop_types, "react-is"), "16.13.1");
    assert_eq!(version_of(prop_types, "loose-envify"), "1.4.0");
    assert!(react.unresolved().is_empty());
}

#[tokio::test]
async fn test_react_fetches_each_package_once() {
    let resolver = resolver(react_registry());

    resolver.resolve("react", "16.13.0").await.unwrap();

    let registry = resolver.registry();
    for name in ["react", "loose-envify", "js-tokens", "object-assign", "prop-types", "react-is"] {
        assert_eq!(registry.fetch_count(name), 1, "{} fetched once", name);
    }
    assert_eq!(registry.total_fetches(), 6);
}

#[tokio::test]
async fn test_shared_subtrees_are_the_same_allocation() {
    let resolver = resolver(react_registry());

    let react = resolver.resolve("react", "16.13.0").await.unwrap();

    let direct = react.dependency("loose-envify").unwrap();
    let via_prop_types = react
        .dependency("prop-types")
        .and_then(|p| p.dependency("loose-envify"))
        .unwrap();
    assert!(Arc::ptr_eq(direct, via_prop_types));
}

#[tokio::test]
async fn test_resolution_is_deterministic() {
    let quick = resolver(react_registry());
    let slow = resolver(react_registry().with_latency(Duration::from_millis(5)));

    let first = quick.resolve("react", "16.13.0").await.unwrap();
    let second = quick.resolve("react", "16.13.0").await.unwrap();
    let third = slow.resolve("react", "16.13.0").await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first, third);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&third).unwrap()
    );
}

#[tokio::test]
async fn test_root_accepts_dist_tag() {
    let resolver = resolver(react_registry());

    let react = resolver.resolve("react", "latest").await.unwrap();
    assert_eq!(react.version, "16.13.0");
}

#[tokio::test]
async fn test_diamond_fetches_shared_dependency_once() {
    let registry = MockRegistryClient::new()
        .with_package(PackageMetadata::new("a").with_version("1.0.0", &[("b", "^1.0.0"), ("c", "^1.0.0")]))
        .with_package(PackageMetadata::new("b").with_version("1.0.0", &[("d", "^1.0.0")]))
        .with_package(PackageMetadata::new("c").with_version("1.0.0", &[("d", "^1.0.0")]))
        .with_package(PackageMetadata::new("d").with_version("1.0.0", &[]).with_version("1.1.0", &[]))
        .with_latency(Duration::from_millis(10));
    let resolver = resolver(registry);

    let a = resolver.resolve("a", "1.0.0").await.unwrap();

    assert_eq!(resolver.registry().fetch_count("d"), 1);
    let via_b = a.dependency("b").and_then(|b| b.dependency("d")).unwrap();
    let via_c = a.dependency("c").and_then(|c| c.dependency("d")).unwrap();
    assert_eq!(via_b.version, "1.1.0");
    assert!(Arc::ptr_eq(via_b, via_c));
}

fn cyclic_registry() -> MockRegistryClient {
    MockRegistryClient::new()
        .with_package(PackageMetadata::new("a").with_version("1.0.0", &[("b", "1.0.0")]))
        .with_package(PackageMetadata::new("b").with_version("1.0.0", &[("a", "1.0.0")]))
}

#[tokio::test]
async fn test_cycle_is_detected_under_every_policy() {
    for policy in [FailurePolicy::Abort, FailurePolicy::Annotate] {
        let resolver = resolver_with(
            cyclic_registry(),
            ResolverConfig {
                failure_policy: policy,
                ..Default::default()
            },
        );

        let error = resolver.resolve("a", "1.0.0").await.unwrap_err();

        assert_eq!(error.kind(), ErrorKind::CycleDetected, "{:?}", policy);
        assert_eq!(
            error.to_string(),
            "Dependency cycle detected: a@1.0.0 -> b@1.0.0 -> a@1.0.0"
        );
        assert_eq!(resolver.registry().total_fetches(), 2);
    }
}

#[tokio::test]
async fn test_cycle_by_name_across_versions() {
    let registry = MockRegistryClient::new()
        .with_package(PackageMetadata::new("a").with_version("1.0.0", &[("a", "^0.9.0")]).with_version("0.9.5", &[]));
    let resolver = resolver(registry);

    let error = resolver.resolve("a", "1.0.0").await.unwrap_err();
    assert_eq!(
        error,
        ResolveError::CycleDetected {
            path: vec![PackageId::new("a", "1.0.0"), PackageId::new("a", "0.9.5")].into()
        }
    );
}

#[tokio::test]
async fn test_reused_subtree_still_detects_cycle() {
    // x@1.0.0 is first built under a, then reached again under b@1.0.0 where
    // its own dependency on b@2.0.0 would repeat the name b
    let registry = MockRegistryClient::new()
        .with_package(PackageMetadata::new("r").with_version("1.0.0", &[("a", "1.0.0"), ("b", "1.0.0")]))
        .with_package(PackageMetadata::new("a").with_version("1.0.0", &[("x", "1.0.0")]))
        .with_package(
            PackageMetadata::new("b")
                .with_version("1.0.0", &[("x", "1.0.0")])
                .with_version("2.0.0", &[]),
        )
        .with_package(PackageMetadata::new("x").with_version("1.0.0", &[("b", "2.0.0")]));
    let resolver = resolver(registry);

    let error = resolver.resolve("r", "1.0.0").await.unwrap_err();
    assert_eq!(
        error.to_string(),
        "Dependency cycle detected: r@1.0.0 -> b@1.0.0 -> x@1.0.0 -> b@2.0.0"
    );
}

#[tokio::test]
async fn test_missing_root_version() {
    let resolver = resolver(react_registry());

    let error = resolver.resolve("react", "999.0.0").await.unwrap_err();
    assert_eq!(
        error,
        ResolveError::VersionNotFound {
            name: "react".to_string(),
            requested: "999.0.0".to_string(),
        }
    );
    assert_eq!(error.kind().exit_code(), 3);
}

#[tokio::test]
async fn test_missing_root_package() {
    let resolver = resolver(react_registry());

    let error = resolver.resolve("no-such-package", "1.0.0").await.unwrap_err();
    assert_eq!(error.kind(), ErrorKind::PackageNotFound);

    let error = resolver.resolve("  ", "1.0.0").await.unwrap_err();
    assert_eq!(error.kind(), ErrorKind::PackageNotFound);
}

fn app_with_missing_leaf() -> MockRegistryClient {
    MockRegistryClient::new()
        .with_package(
            PackageMetadata::new("app").with_version(
                "1.0.0",
                &[("lib", "^1.0.0"), ("zeta-gone", "^1.0.0"), ("alpha-gone", "*")],
            ),
        )
        .with_package(PackageMetadata::new("lib").with_version("1.0.0", &[("util", "^2.0.0")]))
        .with_package(PackageMetadata::new("util").with_version("1.0.0", &[]))
}

#[tokio::test]
async fn test_abort_policy_reports_first_failure_by_name() {
    let resolver = resolver(app_with_missing_leaf());

    let error = resolver.resolve("app", "1.0.0").await.unwrap_err();

    match &error {
        ResolveError::Dependency { path, name, range, source } => {
            assert_eq!(path.to_string(), "app@1.0.0");
            assert_eq!(name, "alpha-gone");
            assert_eq!(range, "*");
            assert!(matches!(**source, ResolveError::PackageNotFound { .. }));
        }
        other => panic!("expected dependency error, got {:?}", other),
    }
    assert_eq!(error.kind(), ErrorKind::PackageNotFound);
}

#[tokio::test]
async fn test_annotate_policy_keeps_going() {
    let resolver = resolver_with(
        app_with_missing_leaf(),
        ResolverConfig {
            failure_policy: FailurePolicy::Annotate,
            ..Default::default()
        },
    );

    let app = resolver.resolve("app", "1.0.0").await.unwrap();

    let alpha = app.dependencies["alpha-gone"].as_unresolved().unwrap();
    assert_eq!(alpha.error.kind(), ErrorKind::PackageNotFound);
    assert!(app.dependencies["zeta-gone"].as_unresolved().is_some());

    let lib = app.dependency("lib").unwrap();
    let util = lib.dependencies["util"].as_unresolved().unwrap();
    assert_eq!(util.range, "^2.0.0");
    assert_eq!(
        util.error,
        ResolveError::VersionNotFound {
            name: "util".to_string(),
            requested: "^2.0.0".to_string(),
        }
    );
    assert_eq!(app.unresolved().len(), 3);
}

#[tokio::test]
async fn test_fetch_concurrency_is_bounded() {
    let leaves: Vec<String> = (0..20).map(|i| format!("leaf-{:02}", i)).collect();
    let deps: Vec<(&str, &str)> = leaves.iter().map(|name| (name.as_str(), "^1.0.0")).collect();

    let mut registry = MockRegistryClient::new()
        .with_package(PackageMetadata::new("wide").with_version("1.0.0", &deps))
        .with_latency(Duration::from_millis(20));
    for name in &leaves {
        registry = registry.with_package(PackageMetadata::new(name.as_str()).with_version("1.0.0", &[]));
    }

    let resolver = resolver_with(
        registry,
        ResolverConfig {
            max_concurrent_fetches: 3,
            ..Default::default()
        },
    );

    let wide = resolver.resolve("wide", "1.0.0").await.unwrap();

    assert_eq!(wide.dependencies.len(), 20);
    assert!(resolver.registry().max_in_flight() <= 3);
    assert!(resolver.registry().max_in_flight() >= 2);
}

#[tokio::test]
async fn test_fetch_bound_extremes_are_clamped() {
    for max_concurrent_fetches in [0, usize::MAX] {
        let resolver = resolver_with(
            react_registry(),
            ResolverConfig {
                max_concurrent_fetches,
                ..Default::default()
            },
        );

        let react = resolver.resolve("react", "16.13.0").await.unwrap();
        assert_eq!(react.version, "16.13.0", "bound {}", max_concurrent_fetches);
    }
}

#[tokio::test]
async fn test_timeout_cancels_outstanding_fetches() {
    let registry = react_registry()
        .with_package(PackageMetadata::new("slow-app").with_version(
            "1.0.0",
            &[("react", "^16.0.0"), ("stuck", "^1.0.0")],
        ))
        .with_hanging("stuck");
    let resolver = resolver_with(
        registry,
        ResolverConfig {
            timeout: Some(Duration::from_millis(100)),
            ..Default::default()
        },
    );

    let error = resolver.resolve("slow-app", "1.0.0").await.unwrap_err();
    assert_eq!(
        error,
        ResolveError::TimedOut {
            timeout: Duration::from_millis(100)
        }
    );

    // Aborted tasks are dropped by the runtime shortly after the join set goes
    for _ in 0..100 {
        if resolver.registry().in_flight() == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(resolver.registry().in_flight(), 0);

    // Nothing from the cancelled run leaks into the next one
    let react = resolver.resolve("react", "16.13.0").await.unwrap();
    assert_eq!(react.version, "16.13.0");
}

#[tokio::test]
async fn test_dropping_the_future_cancels_fetches() {
    let registry = MockRegistryClient::new()
        .with_package(PackageMetadata::new("app").with_version("1.0.0", &[("stuck", "*")]))
        .with_hanging("stuck");
    let resolver = resolver(registry);

    let outcome = tokio::time::timeout(Duration::from_millis(50), resolver.resolve("app", "1.0.0")).await;
    assert!(outcome.is_err());

    for _ in 0..100 {
        if resolver.registry().in_flight() == 0 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(resolver.registry().in_flight(), 0);
    assert_eq!(resolver.registry().fetch_count("stuck"), 1);
}

#[tokio::test]
async fn test_transient_failures_are_retried() {
    let resolver = resolver_with(
        react_registry().with_transient_failures("js-tokens", 2),
        ResolverConfig {
            retry: fast_retry(3),
            ..Default::default()
        },
    );

    let react = resolver.resolve("react", "16.13.0").await.unwrap();

    let loose_envify = react.dependency("loose-envify").unwrap();
    assert_eq!(version_of(loose_envify, "js-tokens"), "4.0.0");
    assert_eq!(resolver.registry().fetch_count("js-tokens"), 3);
}

#[tokio::test]
async fn test_retry_exhaustion_is_registry_unavailable() {
    let resolver = resolver_with(
        react_registry().with_transient_failures("object-assign", 5),
        ResolverConfig {
            retry: fast_retry(2),
            ..Default::default()
        },
    );

    let error = resolver.resolve("react", "16.13.0").await.unwrap_err();

    assert_eq!(error.kind(), ErrorKind::RegistryUnavailable);
    assert!(matches!(
        error.root_cause(),
        ResolveError::RegistryUnavailable { attempts: 2, .. }
    ));
    assert_eq!(resolver.registry().fetch_count("object-assign"), 2);
}

#[tokio::test]
async fn test_failed_fetch_is_not_retried_within_a_run() {
    let registry = MockRegistryClient::new()
        .with_package(
            PackageMetadata::new("app")
                .with_version("1.0.0", &[("left", "*"), ("right", "*")]),
        )
        .with_package(PackageMetadata::new("left").with_version("1.0.0", &[("ghost", "*")]))
        .with_package(PackageMetadata::new("right").with_version("1.0.0", &[("ghost", "^1.0.0")]));
    let resolver = resolver_with(
        registry,
        ResolverConfig {
            failure_policy: FailurePolicy::Annotate,
            ..Default::default()
        },
    );

    let app = resolver.resolve("app", "1.0.0").await.unwrap();

    assert_eq!(app.unresolved().len(), 2);
    assert_eq!(resolver.registry().fetch_count("ghost"), 1);
}

#[test]
fn test_default_config() {
    let config = ResolverConfig::default();
    assert_eq!(config.max_concurrent_fetches, DEFAULT_MAX_CONCURRENT_FETCHES);
    assert_eq!(config.failure_policy, FailurePolicy::Abort);
    assert_eq!(config.retry.max_attempts, 3);
    assert_eq!(config.timeout, None);
}

use deptree_lib::application::config::AppConfig;
use deptree_lib::primitives::{ColorIntent, ConfigError, FailurePolicy};
use std::time::Duration;

#[test]
fn test_config_default_creation() {
    let config = AppConfig::default();

    assert!(config.log_level <= 4);
    assert!(config.net_timeout > 0);
    assert_eq!(config.registry_url, "https://registry.npmjs.org");
    assert_eq!(config.failure_policy, FailurePolicy::Abort);
    assert_eq!(config.color, ColorIntent::Auto);
}

#[test]
fn test_config_merging_integration() {
    let base_config = AppConfig::default();
    let override_config = AppConfig {
        log_level: 3,
        jobs: 4,
        color: ColorIntent::Never,
        ..AppConfig::default()
    };

    let merged = base_config.merge_with(override_config);

    // Override values should be preserved
    assert_eq!(merged.log_level, 3);
    assert_eq!(merged.jobs, 4);
    assert_eq!(merged.color, ColorIntent::Never);

    // Default values should remain for non-overridden fields
    assert_eq!(merged.net_timeout, 30);
}

#[test]
fn test_resolver_config_from_app_config() {
    let config = AppConfig {
        jobs: 3,
        retries: 4,
        resolve_timeout: Some(10),
        failure_policy: FailurePolicy::Annotate,
        ..AppConfig::default()
    };

    let resolver = config.to_resolver_config();

    assert_eq!(resolver.max_concurrent_fetches, 3);
    assert_eq!(resolver.retry.max_attempts, 5);
    assert_eq!(resolver.timeout, Some(Duration::from_secs(10)));
    assert_eq!(resolver.failure_policy, FailurePolicy::Annotate);
}

#[test]
fn test_validation_rejects_non_http_registry() {
    let mut config = AppConfig {
        registry_url: "file:///srv/registry".to_string(),
        ..AppConfig::default()
    };

    assert!(matches!(
        config.validate(),
        Err(ConfigError::InvalidRegistryUrl { .. })
    ));
}

#[test]
fn test_validation_bounds_jobs() {
    let mut too_many = AppConfig {
        jobs: deptree_lib::application::config::MAX_JOBS + 1,
        ..AppConfig::default()
    };
    assert!(matches!(
        too_many.validate(),
        Err(ConfigError::ValidationFailed { .. })
    ));

    let mut ceiling = AppConfig {
        jobs: deptree_lib::application::config::MAX_JOBS,
        ..AppConfig::default()
    };
    assert!(ceiling.validate().is_ok());
}

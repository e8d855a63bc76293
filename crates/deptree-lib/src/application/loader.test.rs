use super::*;
use crate::primitives::{ColorIntent, FailurePolicy};

#[test]
fn test_config_loading_defaults() {
    let config = AppConfig::default();
    assert_eq!(config.log_level, 0);
    assert_eq!(config.net_timeout, 30);
    assert_eq!(config.jobs, 16);
    assert_eq!(config.registry_url, "https://registry.npmjs.org");
    assert_eq!(config.color, ColorIntent::Auto);
}

#[test]
fn test_config_merging() {
    let base = AppConfig::default();
    let override_config = AppConfig {
        log_level: 4,
        color: ColorIntent::Always,
        jobs: 4,
        ..AppConfig::default()
    };

    let merged = base.merge_with(override_config);
    assert_eq!(merged.log_level, 4);
    assert_eq!(merged.color, ColorIntent::Always);
    assert_eq!(merged.jobs, 4);
    assert_eq!(merged.net_timeout, 30);
}

#[test]
fn test_env_color_applies_under_default_cli() {
    let env = EnvironmentConfig {
        no_color: Some("1".to_string()),
        ..Default::default()
    };

    let config = AppConfig::from_sources(AppConfig::default(), &env).unwrap();
    assert_eq!(config.color, ColorIntent::Never);
}

#[test]
fn test_cli_color_beats_env() {
    let env = EnvironmentConfig {
        no_color: Some("1".to_string()),
        ..Default::default()
    };
    let cli = AppConfig {
        color: ColorIntent::Always,
        ..AppConfig::default()
    };

    let config = AppConfig::from_sources(cli, &env).unwrap();
    assert_eq!(config.color, ColorIntent::Always);
}

#[test]
fn test_from_sources_validates() {
    let cli = AppConfig {
        jobs: 0,
        ..AppConfig::default()
    };

    let result = AppConfig::from_sources(cli, &EnvironmentConfig::default());
    assert!(matches!(result, Err(ConfigError::ValidationFailed { .. })));
}

#[test]
fn test_from_sources_rejects_oversized_jobs() {
    let cli = AppConfig {
        jobs: usize::MAX,
        ..AppConfig::default()
    };

    let result = AppConfig::from_sources(cli, &EnvironmentConfig::default());
    assert!(matches!(result, Err(ConfigError::ValidationFailed { .. })));

    let at_limit = AppConfig {
        jobs: crate::application::config::MAX_JOBS,
        ..AppConfig::default()
    };
    assert!(AppConfig::from_sources(at_limit, &EnvironmentConfig::default()).is_ok());
}

#[test]
fn test_cli_arguments_parse_into_config() {
    let cli = CliConfig::from_args([
        "deptree",
        "--registry",
        "http://localhost:4873/",
        "-j",
        "4",
        "--failure-policy",
        "annotate",
        "resolve",
        "react",
        "16.13.0",
    ])
    .unwrap();

    let config = AppConfig::from_sources(cli.app_config, &EnvironmentConfig::default()).unwrap();
    assert_eq!(config.registry_url, "http://localhost:4873");
    assert_eq!(config.jobs, 4);
    assert_eq!(config.failure_policy, FailurePolicy::Annotate);
}

#[test]
fn test_missing_env_files_are_fine() {
    // The crate directory carries no .env files
    assert!(AppConfig::load_env_files().is_ok());
}

use super::*;
use crate::primitives::FailurePolicy;

#[test]
fn test_resolve_command_parses_positionals() {
    let cli = CliConfig::from_args(["deptree", "resolve", "react", "16.13.0"]).unwrap();

    assert_eq!(
        cli.command,
        Commands::Resolve {
            name: "react".to_string(),
            version: "16.13.0".to_string(),
            compact: false,
        }
    );
    assert_eq!(cli.command.package_name(), "react");
}

#[test]
fn test_resolve_compact_flag() {
    let cli =
        CliConfig::from_args(["deptree", "resolve", "--compact", "@types/react", "latest"]).unwrap();

    assert!(matches!(cli.command, Commands::Resolve { compact: true, .. }));
    assert_eq!(cli.command.package_name(), "@types/react");
}

#[test]
fn test_select_command_keeps_range_verbatim() {
    let cli = CliConfig::from_args(["deptree", "select", "js-tokens", ">=3.0.0 <5.0.0"]).unwrap();

    assert_eq!(
        cli.command,
        Commands::Select {
            name: "js-tokens".to_string(),
            range: ">=3.0.0 <5.0.0".to_string(),
        }
    );
}

#[test]
fn test_global_flags_after_subcommand() {
    let cli = CliConfig::from_args([
        "deptree",
        "resolve",
        "react",
        "16.13.0",
        "--jobs",
        "4",
        "--failure-policy",
        "annotate",
        "--registry",
        "http://localhost:4873",
    ])
    .unwrap();

    assert_eq!(cli.app_config.jobs, 4);
    assert_eq!(cli.app_config.failure_policy, FailurePolicy::Annotate);
    assert_eq!(cli.app_config.registry_url, "http://localhost:4873");
}

#[test]
fn test_missing_version_is_rejected() {
    assert!(CliConfig::from_args(["deptree", "resolve", "react"]).is_err());
    assert!(CliConfig::from_args(["deptree"]).is_err());
}

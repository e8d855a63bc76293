use super::*;

#[test]
fn test_filter_directives_quiet_http_stack() {
    let directives = filter_directives(LogLevel::Debug);

    assert!(directives.starts_with("deptree=debug,deptree_lib=debug"));
    assert!(directives.contains("reqwest=warn"));
    assert!(directives.contains("hyper_util=warn"));
    assert!(directives.ends_with(",debug"));
}

#[test]
fn test_filter_directives_parse() {
    for level in [LogLevel::Error, LogLevel::Info, LogLevel::Trace] {
        let directives = filter_directives(level);
        assert!(
            EnvFilter::try_new(&directives).is_ok(),
            "directives should parse: {}",
            directives
        );
    }
}

#[test]
fn test_logger_not_initialized_initially() {
    // Other tests in this binary never install the global subscriber
    assert!(!Logger::is_initialized() || Logger::global().is_some());
}

#[test]
fn test_progress_template_is_valid() {
    assert!(ProgressStyle::with_template(PROGRESS_TEMPLATE).is_ok());
}

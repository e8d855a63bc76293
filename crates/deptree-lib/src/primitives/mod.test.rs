use super::*;

// =============================================================================
// LEVEL A: EXHAUSTIVE DATA TYPE TESTING
// =============================================================================

macro_rules! test_enum_completeness {
    ($enum_type:ty, $test_name:ident) => {
        #[test]
        fn $test_name() {
            for variant in <$enum_type>::value_variants() {
                let possible_value = variant.to_possible_value();
                assert!(
                    possible_value.is_some(),
                    "PossibleValue should exist for all variants"
                );

                let possible_val = possible_value.unwrap();
                let primary_name = possible_val.get_name();
                let parsed: Result<$enum_type, _> = primary_name.parse();
                assert_eq!(
                    parsed.ok(),
                    Some(*variant),
                    "Round-trip through '{}' should preserve variant",
                    primary_name
                );
            }
        }
    };
}

macro_rules! test_fromstr_aliases {
    ($enum_type:ty, $test_name:ident, $expected_mappings:expr) => {
        #[test]
        fn $test_name() {
            let mappings: &[(&str, $enum_type)] = &$expected_mappings;

            for (input, expected) in mappings {
                let parsed: Result<$enum_type, _> = input.parse();
                assert_eq!(
                    parsed.ok(),
                    Some(*expected),
                    "Wrong variant for input '{}' ({})",
                    input,
                    stringify!($enum_type)
                );
            }
        }
    };
}

test_enum_completeness!(LogLevel, test_log_level_completeness);
test_enum_completeness!(LogFormat, test_log_format_completeness);
test_enum_completeness!(LogOutput, test_log_output_completeness);
test_enum_completeness!(ColorIntent, test_color_intent_completeness);
test_enum_completeness!(FailurePolicy, test_failure_policy_completeness);
test_enum_completeness!(TreeFormat, test_tree_format_completeness);

test_fromstr_aliases!(
    LogLevel,
    test_log_level_aliases,
    [
        ("error", LogLevel::Error),
        ("err", LogLevel::Error),
        ("fatal", LogLevel::Error),
        ("warn", LogLevel::Warning),
        ("warning", LogLevel::Warning),
        ("info", LogLevel::Info),
        ("debug", LogLevel::Debug),
        ("trace", LogLevel::Trace),
        ("verbose", LogLevel::Trace),
        ("TRACE", LogLevel::Trace),
    ]
);

test_fromstr_aliases!(
    LogFormat,
    test_log_format_aliases,
    [
        ("text", LogFormat::Text),
        ("plain", LogFormat::Text),
        ("json", LogFormat::Json),
        ("pretty", LogFormat::Pretty),
        ("yaml", LogFormat::Pretty),
    ]
);

test_fromstr_aliases!(
    ColorIntent,
    test_color_intent_aliases,
    [
        ("auto", ColorIntent::Auto),
        ("detect", ColorIntent::Auto),
        ("always", ColorIntent::Always),
        ("force", ColorIntent::Always),
        ("never", ColorIntent::Never),
        ("off", ColorIntent::Never),
    ]
);

test_fromstr_aliases!(
    FailurePolicy,
    test_failure_policy_aliases,
    [
        ("abort", FailurePolicy::Abort),
        ("fail", FailurePolicy::Abort),
        ("annotate", FailurePolicy::Annotate),
        ("partial", FailurePolicy::Annotate),
    ]
);

// =============================================================================
// LEVEL B: BEHAVIORS
// =============================================================================

#[test]
fn test_unknown_value_is_parse_error() {
    let err = "sometimes".parse::<ColorIntent>().unwrap_err();
    assert!(matches!(err, ConfigError::ParseError { ref value, .. } if value == "sometimes"));
    assert_eq!(
        err.to_string(),
        "Failed to parse configuration value 'sometimes': invalid color intent"
    );
}

#[test]
fn test_log_level_from_verbosity_boundary_conditions() {
    assert_eq!(LogLevel::from_verbosity(0), LogLevel::Error);
    assert_eq!(LogLevel::from_verbosity(1), LogLevel::Warning);
    assert_eq!(LogLevel::from_verbosity(2), LogLevel::Info);
    assert_eq!(LogLevel::from_verbosity(3), LogLevel::Debug);
    assert_eq!(LogLevel::from_verbosity(4), LogLevel::Trace);
    assert_eq!(LogLevel::from_verbosity(u8::MAX), LogLevel::Trace);
}

#[test]
fn test_log_level_should_log_matrix() {
    let levels = [
        LogLevel::Error,
        LogLevel::Warning,
        LogLevel::Info,
        LogLevel::Debug,
        LogLevel::Trace,
    ];

    for (i, message_level) in levels.iter().enumerate() {
        for (j, current_level) in levels.iter().enumerate() {
            assert_eq!(
                message_level.should_log(*current_level),
                i <= j,
                "message_level: {:?}, current_level: {:?}",
                message_level,
                current_level
            );
        }
    }
}

#[test]
fn test_directives_match_env_filter_names() {
    assert_eq!(LogLevel::Error.as_directive(), "error");
    assert_eq!(LogLevel::Warning.as_directive(), "warn");
    assert_eq!(LogLevel::Trace.as_directive(), "trace");
}

#[test]
fn test_color_intent_forced_values() {
    assert!(ColorIntent::Always.enabled());
    assert!(!ColorIntent::Never.enabled());
}

#[test]
fn test_policy_defaults() {
    assert_eq!(FailurePolicy::default(), FailurePolicy::Abort);
    assert_eq!(TreeFormat::default(), TreeFormat::Pretty);
    assert_eq!(LogFormat::default(), LogFormat::Text);
    assert_eq!(LogOutput::default(), LogOutput::Stderr);
    assert_eq!(ColorIntent::default(), ColorIntent::Auto);
}

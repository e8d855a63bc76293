use super::*;

fn env(pairs: &[(&str, &str)]) -> EnvironmentConfig {
    let mut config = EnvironmentConfig::default();
    for (key, value) in pairs {
        let value = Some(value.to_string());
        match *key {
            "NO_COLOR" => config.no_color = value,
            "FORCE_COLOR" => config.force_color = value,
            "CLICOLOR" => config.clicolor = value,
            "CI" => config.ci = value,
            other => panic!("unexpected variable {}", other),
        }
    }
    config
}

#[test]
fn test_no_color_disables_color() {
    let color = env(&[("NO_COLOR", "1")]).apply_color_config(ColorIntent::Auto);
    assert_eq!(color, ColorIntent::Never);
}

#[test]
fn test_force_color_enables_color() {
    let color = env(&[("FORCE_COLOR", "1")]).apply_color_config(ColorIntent::Auto);
    assert_eq!(color, ColorIntent::Always);

    let color = env(&[("FORCE_COLOR", "false")]).apply_color_config(ColorIntent::Always);
    assert_eq!(color, ColorIntent::Never);
}

#[test]
fn test_environment_variable_precedence() {
    let config = env(&[("CLICOLOR", "0"), ("NO_COLOR", "1"), ("FORCE_COLOR", "1")]);

    // FORCE_COLOR wins over NO_COLOR and CLICOLOR
    assert_eq!(config.apply_color_config(ColorIntent::Auto), ColorIntent::Always);
}

#[test]
fn test_ci_disables_color_unless_forced() {
    assert_eq!(
        env(&[("CI", "true")]).apply_color_config(ColorIntent::Auto),
        ColorIntent::Never
    );
    assert_eq!(
        env(&[("CI", "true"), ("FORCE_COLOR", "3")]).apply_color_config(ColorIntent::Auto),
        ColorIntent::Always
    );
}

#[test]
fn test_empty_no_color_is_ignored() {
    let color = env(&[("NO_COLOR", "")]).apply_color_config(ColorIntent::Auto);
    assert_eq!(color, ColorIntent::Auto);
}

#[test]
fn test_invalid_force_color_values_ignored() {
    let color = env(&[("FORCE_COLOR", "invalid")]).apply_color_config(ColorIntent::Auto);
    assert_eq!(color, ColorIntent::Auto);
}

#[test]
fn test_clicolor_one_keeps_intent() {
    let color = env(&[("CLICOLOR", "1")]).apply_color_config(ColorIntent::Always);
    assert_eq!(color, ColorIntent::Always);
}

#[test]
fn test_envy_reads_lowercased_fields() {
    let vars = vec![
        ("NO_COLOR".to_string(), "1".to_string()),
        ("UNRELATED".to_string(), "x".to_string()),
    ];
    let config: EnvironmentConfig = envy::from_iter(vars).unwrap();

    assert_eq!(config.no_color.as_deref(), Some("1"));
    assert!(config.force_color.is_none());
}

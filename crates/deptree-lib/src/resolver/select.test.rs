use super::*;

const REACT_VERSIONS: [&str; 6] = ["0.14.0", "15.0.0", "15.6.2", "16.0.0", "16.14.0", "17.0.0-rc.1"];

#[test]
fn test_caret_picks_highest_compatible() {
    assert_eq!(select_str(REACT_VERSIONS, "^15.0.0").as_deref(), Some("15.6.2"));
    assert_eq!(select_str(REACT_VERSIONS, "^16.0.0").as_deref(), Some("16.14.0"));
}

#[test]
fn test_tilde_stays_within_minor() {
    let available = ["1.2.0", "1.2.9", "1.3.0"];
    assert_eq!(select_str(available, "~1.2.0").as_deref(), Some("1.2.9"));
    assert_eq!(select_str(available, "~>1.2.0").as_deref(), Some("1.2.9"));
}

#[test]
fn test_bare_version_is_exact() {
    let available = ["1.2.3", "1.2.4", "1.9.0"];
    assert_eq!(select_str(available, "1.2.3").as_deref(), Some("1.2.3"));
    assert_eq!(select_str(available, "=1.2.3").as_deref(), Some("1.2.3"));
    assert_eq!(select_str(available, "v1.2.3").as_deref(), Some("1.2.3"));
}

#[test]
fn test_space_separated_comparators_intersect() {
    let available = ["0.9.0", "1.0.0", "1.5.0", "2.0.0"];
    assert_eq!(select_str(available, ">=1.0.0 <2.0.0").as_deref(), Some("1.5.0"));
    assert_eq!(select_str(available, ">= 1.0.0 < 2.0.0").as_deref(), Some("1.5.0"));
}

#[test]
fn test_alternatives_take_the_highest_match() {
    let available = ["1.0.0", "2.0.0", "3.0.0"];
    assert_eq!(select_str(available, "1.0.0 || 2.0.0").as_deref(), Some("2.0.0"));
    assert_eq!(select_str(available, "^1.0.0||^3.0.0").as_deref(), Some("3.0.0"));
}

#[test]
fn test_wildcards() {
    let available = ["1.0.0", "1.4.2", "2.0.0"];
    assert_eq!(select_str(available, "*").as_deref(), Some("2.0.0"));
    assert_eq!(select_str(available, "").as_deref(), Some("2.0.0"));
    assert_eq!(select_str(available, "x").as_deref(), Some("2.0.0"));
    assert_eq!(select_str(available, "1.x").as_deref(), Some("1.4.2"));
    assert_eq!(select_str(available, "1.*").as_deref(), Some("1.4.2"));
    assert_eq!(select_str(available, "1").as_deref(), Some("1.4.2"));
}

#[test]
fn test_hyphen_range_is_inclusive() {
    let available = ["1.2.2", "1.2.3", "2.3.4", "2.3.5"];
    assert_eq!(select_str(available, "1.2.3 - 2.3.4").as_deref(), Some("2.3.4"));
}

#[test]
fn test_no_match_returns_none() {
    assert_eq!(select_str(REACT_VERSIONS, "999.0.0"), None);
    assert_eq!(select_str(REACT_VERSIONS, "^18.0.0"), None);
    assert_eq!(select_str(std::iter::empty::<&str>(), "*"), None);
}

#[test]
fn test_pre_releases_need_explicit_opt_in() {
    assert_eq!(select_str(REACT_VERSIONS, ">=16.0.0").as_deref(), Some("16.14.0"));
    assert_eq!(
        select_str(REACT_VERSIONS, "17.0.0-rc.1").as_deref(),
        Some("17.0.0-rc.1")
    );
}

#[test]
fn test_malformed_versions_are_skipped() {
    let available = ["not-a-version", "1.0", "1.0.0", "latest"];
    assert_eq!(select_str(available, "*").as_deref(), Some("1.0.0"));
}

#[test]
fn test_selection_ignores_input_order() {
    let forward = ["1.0.0", "1.1.0", "1.2.0"];
    let backward = ["1.2.0", "1.1.0", "1.0.0"];
    assert_eq!(select_str(forward, "^1.0.0"), select_str(backward, "^1.0.0"));
}

#[test]
fn test_invalid_range_is_error() {
    let error = VersionRange::parse("github:facebook/react").unwrap_err();
    assert_eq!(error.range, "github:facebook/react");
    assert!(error.to_string().starts_with("Invalid version range"));

    assert_eq!(select_str(REACT_VERSIONS, "github:facebook/react"), None);
}

#[test]
fn test_range_keeps_raw_text() {
    let range = VersionRange::parse("^15.0.0 || ^16.0.0").unwrap();
    assert_eq!(range.as_str(), "^15.0.0 || ^16.0.0");
    assert!(range.matches(&Version::new(16, 2, 0)));
    assert!(!range.matches(&Version::new(14, 0, 0)));
}

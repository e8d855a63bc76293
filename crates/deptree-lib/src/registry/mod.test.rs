use super::*;

#[test]
fn test_parse_abbreviated_packument() {
    let body = r#"{
        "name": "loose-envify",
        "modified": "2022-01-01T00:00:00.000Z",
        "dist-tags": { "latest": "1.4.0" },
        "versions": {
            "1.3.1": { "name": "loose-envify", "version": "1.3.1", "dependencies": { "js-tokens": "^3.0.0" } },
            "1.4.0": { "name": "loose-envify", "version": "1.4.0", "dependencies": { "js-tokens": "^3.0.0 || ^4.0.0" } }
        }
    }"#;

    let metadata: PackageMetadata = serde_json::from_str(body).unwrap();

    assert_eq!(metadata.name, "loose-envify");
    assert_eq!(metadata.dist_tags.get("latest").map(String::as_str), Some("1.4.0"));
    assert_eq!(metadata.versions.len(), 2);
    assert_eq!(
        metadata
            .dependencies_of("1.4.0")
            .and_then(|deps| deps.get("js-tokens"))
            .map(String::as_str),
        Some("^3.0.0 || ^4.0.0")
    );
}

#[test]
fn test_parse_tolerates_missing_and_null_fields() {
    let body = r#"{
        "name": "object-assign",
        "dist-tags": null,
        "versions": {
            "4.1.1": { "version": "4.1.1" },
            "4.1.0": { "version": "4.1.0", "dependencies": null }
        }
    }"#;

    let metadata: PackageMetadata = serde_json::from_str(body).unwrap();

    assert!(metadata.dist_tags.is_empty());
    assert_eq!(metadata.dependencies_of("4.1.1").map(|d| d.len()), Some(0));
    assert_eq!(metadata.dependencies_of("4.1.0").map(|d| d.len()), Some(0));
    assert!(metadata.dependencies_of("9.9.9").is_none());
}

#[test]
fn test_builder_helpers() {
    let metadata = PackageMetadata::new("react")
        .with_version("16.13.0", &[("loose-envify", "^1.1.0")])
        .with_version("16.13.1", &[])
        .with_dist_tag("latest", "16.13.1");

    let versions: Vec<&str> = metadata.version_keys().collect();
    assert_eq!(versions, vec!["16.13.0", "16.13.1"]);
    assert_eq!(metadata.dist_tags["latest"], "16.13.1");
}

#[test]
fn test_registry_error_classification() {
    let transient = RegistryError::Transient {
        name: "react".to_string(),
        reason: "HTTP 503".to_string(),
    };
    let missing = RegistryError::NotFound {
        name: "nope".to_string(),
    };

    assert!(transient.is_transient());
    assert!(!missing.is_transient());
    assert_eq!(transient.name(), "react");
    assert_eq!(missing.to_string(), "Package 'nope' not found in registry");
}

use super::*;
use serde_json::json;

fn leaf(name: &str, version: &str) -> Arc<ResolvedPackage> {
    Arc::new(ResolvedPackage {
        name: name.to_string(),
        version: version.to_string(),
        dependencies: BTreeMap::new(),
    })
}

fn package(name: &str, version: &str, deps: Vec<ResolvedDependency>) -> ResolvedPackage {
    let dependencies = deps
        .into_iter()
        .map(|dep| {
            let key = match &dep {
                ResolvedDependency::Resolved(p) => p.name.clone(),
                ResolvedDependency::Unresolved(u) => u.name.clone(),
            };
            (key, dep)
        })
        .collect();
    ResolvedPackage {
        name: name.to_string(),
        version: version.to_string(),
        dependencies,
    }
}

fn missing(name: &str, range: &str) -> ResolvedDependency {
    ResolvedDependency::Unresolved(UnresolvedDependency {
        name: name.to_string(),
        range: range.to_string(),
        error: ResolveError::PackageNotFound {
            name: name.to_string(),
        },
    })
}

#[test]
fn test_package_id_and_path_display() {
    let path: ResolutionPath = vec![
        PackageId::new("react", "16.13.0"),
        PackageId::new("loose-envify", "1.4.0"),
    ]
    .into();

    assert_eq!(path.to_string(), "react@16.13.0 -> loose-envify@1.4.0");
    assert_eq!(path.names().collect::<Vec<_>>(), ["react", "loose-envify"]);
    assert_eq!(path.len(), 2);
    assert!(ResolutionPath::default().is_empty());
}

#[test]
fn test_resolved_tree_serializes_as_nested_objects() {
    let tree = package(
        "loose-envify",
        "1.4.0",
        vec![ResolvedDependency::Resolved(leaf("js-tokens", "4.0.0"))],
    );

    assert_eq!(
        serde_json::to_value(&tree).unwrap(),
        json!({
            "name": "loose-envify",
            "version": "1.4.0",
            "dependencies": {
                "js-tokens": {"name": "js-tokens", "version": "4.0.0", "dependencies": {}}
            }
        })
    );
}

#[test]
fn test_unresolved_child_serializes_error_kind() {
    let tree = package("app", "1.0.0", vec![missing("left-pad", "^1.0.0")]);

    assert_eq!(
        serde_json::to_value(&tree).unwrap()["dependencies"]["left-pad"],
        json!({
            "name": "left-pad",
            "range": "^1.0.0",
            "error": {
                "kind": "package_not_found",
                "message": "Package 'left-pad' not found in registry"
            }
        })
    );
}

#[test]
fn test_accessors() {
    let tokens = leaf("js-tokens", "4.0.0");
    let tree = package(
        "app",
        "1.0.0",
        vec![
            ResolvedDependency::Resolved(Arc::clone(&tokens)),
            missing("ghost", "*"),
        ],
    );

    assert_eq!(tree.id(), PackageId::new("app", "1.0.0"));
    assert!(Arc::ptr_eq(tree.dependency("js-tokens").unwrap(), &tokens));
    assert!(tree.dependency("ghost").is_none());
    assert_eq!(tree.dependencies["js-tokens"].version(), Some("4.0.0"));
    assert_eq!(tree.dependencies["ghost"].version(), None);
    assert_eq!(
        tree.dependencies["ghost"].as_unresolved().map(|u| u.range.as_str()),
        Some("*")
    );
}

#[test]
fn test_unresolved_walks_the_whole_subtree() {
    let middle = Arc::new(package("middle", "1.0.0", vec![missing("deep", "^2.0.0")]));
    let tree = package(
        "app",
        "1.0.0",
        vec![ResolvedDependency::Resolved(middle), missing("shallow", "^1.0.0")],
    );

    let mut names: Vec<&str> = tree.unresolved().into_iter().map(|u| u.name.as_str()).collect();
    names.sort();
    assert_eq!(names, ["deep", "shallow"]);
}

#[test]
fn test_package_ids_counts_shared_subtrees_once() {
    let shared = leaf("object-assign", "4.1.1");
    let prop_types = Arc::new(package(
        "prop-types",
        "15.7.2",
        vec![ResolvedDependency::Resolved(Arc::clone(&shared))],
    ));
    let tree = package(
        "react",
        "16.13.0",
        vec![
            ResolvedDependency::Resolved(shared),
            ResolvedDependency::Resolved(prop_types),
        ],
    );

    let ids = tree.package_ids();
    assert_eq!(ids.len(), 3);
    assert!(ids.contains(&PackageId::new("object-assign", "4.1.1")));
}

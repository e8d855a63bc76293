use assert_cmd::Command;
use mockito::{Mock, Server, ServerGuard};
use predicates::prelude::*;
use serde_json::{Value, json};
use tempfile::TempDir;

struct TestEnv {
    server: ServerGuard,
    mocks: Vec<Mock>,
    work_dir: TempDir,
}

impl TestEnv {
    fn new() -> Self {
        Self {
            server: Server::new(),
            mocks: Vec::new(),
            work_dir: TempDir::new().expect("temp dir"),
        }
    }

    fn package(&mut self, name: &str, body: Value) -> &mut Self {
        let path = format!("/{}", name.replacen('/', "%2F", 1));
        let mock = self
            .server
            .mock("GET", path.as_str())
            .with_status(200)
            .with_body(body.to_string())
            .create();
        self.mocks.push(mock);
        self
    }

    fn status(&mut self, name: &str, status: usize) -> &mut Self {
        let mock = self
            .server
            .mock("GET", format!("/{}", name).as_str())
            .with_status(status)
            .create();
        self.mocks.push(mock);
        self
    }

    fn deptree(&self) -> Command {
        let mut cmd = Command::cargo_bin("deptree").expect("deptree binary");
        cmd.current_dir(self.work_dir.path())
            .env("DEPTREE_REGISTRY_URL", self.server.url())
            .env("DEPTREE_RETRIES", "0")
            .env_remove("DEPTREE_CACHE_DIR")
            .env_remove("DEPTREE_FAILURE_POLICY")
            .env("NO_COLOR", "1");
        cmd
    }
}

fn envify_registry() -> TestEnv {
    let mut env = TestEnv::new();
    env.package(
        "loose-envify",
        json!({
            "name": "loose-envify",
            "dist-tags": {"latest": "1.4.0"},
            "versions": {"1.4.0": {"dependencies": {"js-tokens": "^3.0.0 || ^4.0.0"}}}
        }),
    )
    .package(
        "js-tokens",
        json!({"name": "js-tokens", "versions": {"3.0.2": {}, "4.0.0": {}}}),
    );
    env
}

#[test]
fn resolve_prints_compact_tree() {
    let env = envify_registry();

    let output = env
        .deptree()
        .args(["resolve", "--compact", "loose-envify", "1.4.0"])
        .output()
        .expect("run deptree");

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout.trim().lines().count(), 1);
    assert_eq!(
        serde_json::from_str::<Value>(&stdout).unwrap(),
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
fn resolve_pretty_prints_by_default() {
    let env = envify_registry();

    env.deptree()
        .args(["resolve", "loose-envify", "latest"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\n  \"version\": \"1.4.0\""));
}

#[test]
fn select_prints_chosen_version() {
    let env = envify_registry();

    env.deptree()
        .args(["select", "js-tokens", "^3.0.0"])
        .assert()
        .success()
        .stdout("3.0.2\n");
}

#[test]
fn missing_package_exits_with_not_found_code() {
    let mut env = TestEnv::new();
    env.status("ghost", 404);

    env.deptree()
        .args(["resolve", "ghost", "1.0.0"])
        .assert()
        .code(2)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Package 'ghost' not found"));
}

#[test]
fn unsatisfied_dependency_exits_with_version_code() {
    let mut env = TestEnv::new();
    env.package(
        "app",
        json!({"versions": {"1.0.0": {"dependencies": {"js-tokens": "^9.0.0"}}}}),
    )
    .package("js-tokens", json!({"versions": {"4.0.0": {}}}));

    env.deptree()
        .args(["resolve", "app", "1.0.0"])
        .assert()
        .code(3)
        .stderr(predicate::str::contains("js-tokens@^9.0.0"));
}

#[test]
fn annotate_policy_keeps_partial_tree() {
    let mut env = TestEnv::new();
    env.package(
        "app",
        json!({"versions": {"1.0.0": {"dependencies": {"js-tokens": "^9.0.0"}}}}),
    )
    .package("js-tokens", json!({"versions": {"4.0.0": {}}}));

    env.deptree()
        .args(["resolve", "app", "1.0.0", "--failure-policy", "annotate"])
        .assert()
        .success()
        .stdout(predicate::str::contains("version_not_found"));
}

#[test]
fn server_errors_exit_with_unavailable_code() {
    let mut env = TestEnv::new();
    env.status("flaky", 503);

    env.deptree()
        .args(["resolve", "flaky", "1.0.0"])
        .assert()
        .code(5);
}

#[test]
fn invalid_registry_url_is_rejected() {
    let env = TestEnv::new();

    env.deptree()
        .args(["resolve", "react", "16.13.0"])
        .env("DEPTREE_REGISTRY_URL", "ftp://registry.test")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("ftp://registry.test"));
}

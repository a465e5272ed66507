use assert_cmd::Command;
use envgen_cli::test_utils::{LISTING_TEMPLATE, SchemaFixture, write_template};
use httpmock::prelude::*;
use predicates::prelude::*;
use serde_json::json;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Settings pointing the standard repository at `api_base`, without retries.
fn write_settings(dir: &Path, api_base: &str) -> PathBuf {
    let path = dir.join("settings.toml");
    fs::write(
        &path,
        format!(
            r#"[repository]
owner = "acme"
name = "tpl"
api_base = "{api_base}"
raw_base = "{api_base}/raw"
timeout_secs = 5

[retry]
max_retries = 0
"#
        ),
    )
    .unwrap();
    path
}

/// Settings pointing at a port nothing listens on.
fn offline_settings(dir: &Path) -> PathBuf {
    write_settings(dir, "http://127.0.0.1:1")
}

fn envgen() -> Command {
    let mut cmd = Command::cargo_bin("envgen").unwrap();
    cmd.env_remove("ENVGEN_CONFIG_PATH").env_remove("RUST_LOG");
    cmd
}

#[test]
fn version_command() {
    envgen()
        .arg("version")
        .assert()
        .success()
        .stdout(format!("envgen version {}\n", env!("CARGO_PKG_VERSION")));
}

#[test]
fn help_exits_successfully() {
    envgen().arg("--help").assert().success().stdout(predicate::str::contains("gen"));
}

#[test]
fn argument_errors_exit_with_one() {
    envgen().assert().code(1);
    envgen().args(["gen", "-c", "env.yaml"]).assert().code(1).stderr(predicate::str::contains("--out"));
}

#[test]
fn ls_prints_standard_templates() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/repos/acme/tpl/contents/templates");
        then.status(200).json_body(json!([
            { "name": "go-env", "path": "templates/go-env", "type": "file" },
            { "name": "docs", "path": "templates/docs", "type": "dir" },
            { "name": "ts-env", "path": "templates/ts-env", "type": "file" }
        ]));
    });
    let dir = TempDir::new().unwrap();
    let settings = write_settings(dir.path(), &server.base_url());

    envgen()
        .arg("--settings")
        .arg(&settings)
        .arg("ls")
        .assert()
        .success()
        .stdout("Available standard templates:\n  go-env\n  ts-env\n");
}

#[test]
fn ls_reads_settings_from_the_environment() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/repos/acme/tpl/contents/templates");
        then.status(200).json_body(json!([]));
    });
    let dir = TempDir::new().unwrap();
    let settings = write_settings(dir.path(), &server.base_url());

    envgen()
        .env("ENVGEN_CONFIG_PATH", &settings)
        .arg("templates")
        .assert()
        .success()
        .stdout("No standard templates available\n");
}

#[test]
fn ls_fails_when_the_repository_is_unreachable() {
    let dir = TempDir::new().unwrap();
    let settings = offline_settings(dir.path());

    envgen()
        .arg("--settings")
        .arg(&settings)
        .arg("list")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Failed to list standard templates"));
}

#[test]
fn gen_with_local_template() {
    let dir = TempDir::new().unwrap();
    let settings = offline_settings(dir.path());
    let schema = SchemaFixture::basic().write_to(dir.path()).unwrap();
    let template = write_template(dir.path(), "config.tmpl", LISTING_TEMPLATE).unwrap();
    let output = dir.path().join("internal").join("config").join("config.go");

    envgen()
        .arg("--settings")
        .arg(&settings)
        .arg("gen")
        .arg("-c")
        .arg(&schema)
        .arg("-o")
        .arg(&output)
        .arg("-t")
        .arg(&template)
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("Generated {}", output.display())));

    let content = fs::read_to_string(&output).unwrap();
    assert!(content.contains("type App struct"), "{content}");
    assert!(content.contains("HttpPort int"), "{content}");
}

#[test]
fn gen_with_standard_template() {
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/repos/acme/tpl/contents/templates");
        then.status(200).json_body(json!([
            { "name": "go-env", "path": "templates/go-env", "type": "file" }
        ]));
    });
    server.mock(|when, then| {
        when.method(GET).path("/repos/acme/tpl/commits/main");
        then.status(200).json_body(json!({ "sha": "abc123" }));
    });
    server.mock(|when, then| {
        when.method(GET).path("/raw/acme/tpl/abc123/templates/go-env");
        then.status(200).body("// source: {{ template_path }}\npackage {{ config.options.go_package }}\n");
    });

    let dir = TempDir::new().unwrap();
    let settings = write_settings(dir.path(), &server.base_url());
    let schema = SchemaFixture::basic().write_to(dir.path()).unwrap();
    let output = dir.path().join("config.go");

    envgen()
        .arg("--settings")
        .arg(&settings)
        .args(["generate", "--template", "go-env", "--config"])
        .arg(&schema)
        .arg("--out")
        .arg(&output)
        .assert()
        .success();

    let content = fs::read_to_string(&output).unwrap();
    assert_eq!(
        content,
        format!(
            "// source: {}/raw/acme/tpl/abc123/templates/go-env\npackage config\n",
            server.base_url()
        )
    );
}

#[test]
fn gen_ignores_groups() {
    let dir = TempDir::new().unwrap();
    let settings = offline_settings(dir.path());
    let schema = SchemaFixture::two_groups().write_to(dir.path()).unwrap();
    let template = write_template(dir.path(), "t.tmpl", LISTING_TEMPLATE).unwrap();
    let output = dir.path().join("out.go");

    envgen()
        .arg("--settings")
        .arg(&settings)
        .arg("gen")
        .arg("-c")
        .arg(&schema)
        .arg("-o")
        .arg(&output)
        .arg("-t")
        .arg(&template)
        .arg("--ignore-groups")
        .arg("db,unknown")
        .assert()
        .success();

    let content = fs::read_to_string(&output).unwrap();
    assert!(content.contains("type App struct"));
    assert!(!content.contains("Dsn"));
}

#[test]
fn gen_reports_invalid_schema() {
    let dir = TempDir::new().unwrap();
    let settings = offline_settings(dir.path());
    let schema = SchemaFixture::invalid().write_to(dir.path()).unwrap();
    let output = dir.path().join("out.go");

    envgen()
        .arg("--settings")
        .arg(&settings)
        .arg("gen")
        .arg("-c")
        .arg(&schema)
        .arg("-o")
        .arg(&output)
        .arg("-t")
        .arg("go-env")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("at least one group is required"));

    assert!(!output.exists());
}

#[test]
fn gen_reports_missing_local_template() {
    let dir = TempDir::new().unwrap();
    let settings = offline_settings(dir.path());
    let schema = SchemaFixture::basic().write_to(dir.path()).unwrap();

    envgen()
        .arg("--settings")
        .arg(&settings)
        .arg("gen")
        .arg("-c")
        .arg(&schema)
        .arg("-o")
        .arg(dir.path().join("out.go"))
        .arg("-t")
        .arg("no-such-template")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("failed to read local template: no-such-template"));
}

// ABOUTME: Integration tests for the CLI application
// ABOUTME: Runs the reportsmith binary end to end against temporary templates and data files

use std::path::Path;
use std::process::{Command, Output};

mod common;
use common::{sample_assessment, TestEnvironment};

/// Run the binary inside `dir` with no ambient configuration
fn reportsmith(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_reportsmith"))
        .args(args)
        .current_dir(dir)
        .env("HOME", dir)
        .env_remove("RUST_LOG")
        .env_remove("REPORTSMITH_LOG_LEVEL")
        .env_remove("REPORTSMITH_LOG_FORMAT")
        .env_remove("REPORTSMITH_MAX_DEPTH")
        .env_remove("REPORTSMITH_PARTIALS_DIR")
        .output()
        .expect("Failed to execute reportsmith")
}

fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).to_string()
}

#[tokio::test]
async fn test_cli_help_command() {
    let env = TestEnvironment::new();
    let output = reportsmith(env.path(), &["--help"]);

    assert!(output.status.success());
    let out = stdout(&output);
    assert!(out.contains("render"));
    assert!(out.contains("validate"));
    assert!(out.contains("--help"));
}

#[tokio::test]
async fn test_cli_version_command() {
    let env = TestEnvironment::new();
    let output = reportsmith(env.path(), &["--version"]);

    assert!(output.status.success());
    assert!(stdout(&output).contains(env!("CARGO_PKG_VERSION")));
}

#[tokio::test]
async fn test_cli_render_to_stdout() {
    let env = TestEnvironment::new();
    env.write("hello.html", "Hello {{name}}{{!-- note --}}!").await;
    env.write("data.json", r#"{"name": "Ann & co"}"#).await;

    let output = reportsmith(env.path(), &["render", "hello.html", "--data", "data.json"]);

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output), "Hello Ann &amp; co!\n");
}

#[tokio::test]
async fn test_cli_render_with_vars_and_output_file() {
    let env = TestEnvironment::new();
    env.write("t.html", "{{report.title}} for {{vars.org}} ({{vars.quarter}})").await;
    env.write("data.yaml", "title: Tool review\n").await;

    let output = reportsmith(
        env.path(),
        &[
            "render",
            "t.html",
            "--data",
            "data.yaml",
            "--var",
            "org=Acme",
            "--var",
            "quarter=Q3",
            "--output",
            "out/report.html",
        ],
    );

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(stdout(&output).is_empty());
    assert_eq!(env.read("out/report.html").await, "Tool review for Acme (Q3)");
}

#[tokio::test]
async fn test_cli_render_builtin_assessment_with_partials_dir() {
    let env = TestEnvironment::new();
    env.write_json("copilot.json", &sample_assessment()).await;
    env.write("theme/note.html", "<aside>{{tool.vendor}}</aside>").await;
    env.write("wrapper.html", "{{> note}}{{> assessment/footer}}").await;

    let output = reportsmith(
        env.path(),
        &["render", "builtin:assessment", "--data", "copilot.json"],
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.starts_with("<!DOCTYPE html>"));
    assert!(out.contains("<h1>GitHub Copilot assessment</h1>"));

    let output = reportsmith(
        env.path(),
        &[
            "render",
            "wrapper.html",
            "--data",
            "copilot.json",
            "--partials",
            "theme",
        ],
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.starts_with("<aside>GitHub</aside><footer>"));
    assert!(out.contains("ISO 27001, SOC 2"));
}

#[tokio::test]
async fn test_cli_render_missing_data_file() {
    let env = TestEnvironment::new();
    env.write("t.html", "x").await;

    let output = reportsmith(env.path(), &["render", "t.html", "--data", "nope.json"]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("nope.json"));
}

#[tokio::test]
async fn test_cli_render_unsupported_data_format() {
    let env = TestEnvironment::new();
    env.write("t.html", "x").await;
    env.write("data.toml", "a = 1").await;

    let output = reportsmith(env.path(), &["render", "t.html", "--data", "data.toml"]);

    assert!(!output.status.success());
    assert!(stderr(&output).contains("Unsupported data format"));
}

#[tokio::test]
async fn test_cli_validate_template() {
    let env = TestEnvironment::new();
    env.write("good.html", "{{#if a}}{{b}}{{#else}}{{mystery x}}{{/if}}").await;
    env.write("bad.html", "line one\n{{#each items}}{{this}}").await;

    let output = reportsmith(env.path(), &["validate", "good.html"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("Template 'good' is valid"));
    assert!(out.contains("unknown helper 'mystery'"));

    let output = reportsmith(env.path(), &["validate", "bad.html"]);
    assert!(!output.status.success());
    assert!(stdout(&output).contains("2:1: error:"));
    assert!(stderr(&output).contains("1 error(s)"));
}

#[tokio::test]
async fn test_cli_validate_builtin_templates() {
    let env = TestEnvironment::new();
    for name in ["builtin:assessment", "builtin:summary"] {
        let output = reportsmith(env.path(), &["validate", name]);
        assert!(output.status.success(), "{}: {}", name, stderr(&output));
    }
}

#[tokio::test]
async fn test_cli_init_then_render() {
    let env = TestEnvironment::new();

    let output = reportsmith(
        env.path(),
        &["init", "vendor-review", "--output-dir", "reports", "--template", "assessment"],
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert!(env.file("reports/vendor-review.html").exists());
    assert!(env.file("reports/vendor-review.data.yaml").exists());

    let output = reportsmith(
        env.path(),
        &[
            "render",
            "reports/vendor-review.html",
            "--data",
            "reports/vendor-review.data.yaml",
        ],
    );
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let out = stdout(&output);
    assert!(out.contains("<title>vendor-review risk assessment</title>"));
    assert!(!out.contains("not found"));

    let output = reportsmith(
        env.path(),
        &["init", "vendor-review", "--output-dir", "reports"],
    );
    assert!(!output.status.success());
}

#[tokio::test]
async fn test_cli_helpers_lists_builtins_and_aliases() {
    let env = TestEnvironment::new();
    env.write(
        "reportsmith.yaml",
        "rendering:\n  helper_aliases:\n    fmtDate: formatDate\n",
    )
    .await;

    let output = reportsmith(env.path(), &["helpers"]);
    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let out = stdout(&output);
    for helper in ["formatDate", "riskLevel", "riskClass", "join", "default"] {
        assert!(out.lines().any(|line| line == helper), "missing {}", helper);
    }
    assert!(out.contains("fmtDate (alias of formatDate)"));
}

#[tokio::test]
async fn test_cli_config_file_settings() {
    let env = TestEnvironment::new();
    env.write(
        "settings.yaml",
        r#"
logging:
  level: warn
  format: compact
rendering:
  max_partial_depth: 1
  builtin_partials: false
template_vars:
  org: Config Org
"#,
    )
    .await;
    env.write("t.html", "{{vars.org}}|{{> nested}}").await;
    env.write("partials/nested.html", "a{{> inner}}").await;
    env.write("partials/inner.html", "b").await;
    env.write("data.json", "{}").await;

    let output = reportsmith(
        env.path(),
        &[
            "--config",
            "settings.yaml",
            "render",
            "t.html",
            "--data",
            "data.json",
            "--partials",
            "partials",
        ],
    );

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(
        stdout(&output),
        "Config Org|a<!-- Recursion limit exceeded rendering partial \"inner\" (limit 1) -->\n"
    );
}

#[tokio::test]
async fn test_cli_missing_config_file() {
    let env = TestEnvironment::new();
    let output = reportsmith(env.path(), &["--config", "absent.yaml", "helpers"]);
    assert!(!output.status.success());
}

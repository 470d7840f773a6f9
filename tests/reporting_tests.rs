// ABOUTME: Integration tests for the report layer
// ABOUTME: Tests template sources, data loading, the template manager and report delivery

use serde_json::json;

use reportsmith::reporting::{
    load_context, DirectorySource, FileDeliverer, RenderingConfig, ReportDeliverer,
    ReportTemplateManager, ReportingError, TemplateSource,
};
use reportsmith::{TemplateProcessor, Value};

mod common;
use common::{sample_assessment, TestEnvironment};

#[tokio::test]
async fn test_partials_from_directory_source() {
    let env = TestEnvironment::new();
    env.write("partials/row.html", "<tr><td>{{name}}</td></tr>").await;
    env.write("partials/layout/footer.html", "<footer>{{vars.org}}</footer>").await;

    let mut manager = ReportTemplateManager::new(TemplateProcessor::new().unwrap());
    let source = DirectorySource::new(env.file("partials"), "html");
    let registered = manager.register_partials_from(&source).await.unwrap();
    assert_eq!(registered, 2);

    manager.add_global_variable("org", "Acme");
    manager.add_template(
        "table",
        "<table>{{#each rows}}{{> row}}{{/each}}</table>{{> layout/footer}}",
    );

    let data = Value::from(json!({"rows": [{"name": "a"}, {"name": "<b>"}]}));
    let report = manager.render_report("table", &data).unwrap();
    assert_eq!(
        report.content,
        "<table><tr><td>a</td></tr><tr><td>&lt;b&gt;</td></tr></table><footer>Acme</footer>"
    );
}

#[tokio::test]
async fn test_config_partial_dirs_and_depth() {
    let env = TestEnvironment::new();
    env.write("shared/loop.hbs", "x{{> loop}}").await;

    let config = RenderingConfig {
        partial_dirs: vec![env.file("shared")],
        template_extension: "hbs".to_string(),
        max_partial_depth: 2,
        ..RenderingConfig::default()
    };
    let mut manager = ReportTemplateManager::from_config(&config).await.unwrap();
    manager.add_template("t", "{{> loop}}");

    let report = manager.render_report("t", &Value::Null).unwrap();
    assert_eq!(
        report.content,
        "xx<!-- Recursion limit exceeded rendering partial \"loop\" (limit 2) -->"
    );
}

#[tokio::test]
async fn test_builtin_assessment_report() {
    let env = TestEnvironment::new();
    let data_path = env.write_json("copilot.json", &sample_assessment()).await;

    let mut manager = ReportTemplateManager::from_config(&RenderingConfig::default())
        .await
        .unwrap();
    let content = reportsmith::reporting::BuiltinSource
        .load("assessment")
        .await
        .unwrap();
    manager.add_template("assessment", &content);

    let data = load_context(&data_path).await.unwrap();
    let report = manager.render_report("assessment", &data).unwrap();

    assert_eq!(report.title, "GitHub Copilot assessment");
    assert!(report.content.contains("<title>GitHub Copilot assessment</title>"));
    assert!(report.content.contains("GitHub Copilot by GitHub (version 1.180)"));
    assert!(report.content.contains("<strong class=\"risk-critical\">Critical</strong> (81/100)"));
    assert!(report.content.contains("Assessed by AppSec &lt;team&gt; on March 5, 2024"));
    assert!(report.content.contains("<td class=\"risk-high\">High</td>"));
    assert!(report.content.contains("<td>Licensing</td><td>30</td><td class=\"risk-medium\">Medium</td><td>-</td>"));
    assert!(report.content.contains("<strong>Code snippets sent to vendor</strong> <em>(Critical)</em></li>"));
    assert!(report.content.contains("<li>Block for regulated repos</li>"));
    assert!(report.content.contains("Frameworks reviewed: ISO 27001, SOC 2"));
    assert!(report.content.contains("from template assessment"));
    assert!(!report.content.contains("<!--"));
}

#[tokio::test]
async fn test_builtin_summary_without_optional_fields() {
    let mut manager = ReportTemplateManager::from_config(&RenderingConfig::default())
        .await
        .unwrap();
    let content = reportsmith::reporting::BuiltinSource
        .load("summary")
        .await
        .unwrap();
    manager.add_template("summary", &content);

    let data = Value::from(json!({"tool": {"name": "Notes AI"}, "overall_score": 12}));
    let report = manager.render_report("summary", &data).unwrap();
    assert_eq!(
        report.content.trim(),
        "<p><strong>Notes AI</strong> was assessed as <span class=\"risk-low\">Low risk</span> (12/100).</p>"
    );
}

#[tokio::test]
async fn test_yaml_data_context() {
    let env = TestEnvironment::new();
    let path = env
        .write("data.yml", "tool:\n  name: Claude\nscores: [10, 60]\n")
        .await;

    let data = load_context(&path).await.unwrap();
    let processor = TemplateProcessor::new().unwrap();
    let out = processor.render(
        "{{tool.name}}:{{#each scores}}{{riskLevel this}}{{#if @last}}{{#else}},{{/if}}{{/each}}",
        &data,
    );
    assert_eq!(out, "Claude:Low,High");
}

#[tokio::test]
async fn test_unsupported_data_format() {
    let env = TestEnvironment::new();
    let path = env.write("data.csv", "a,b").await;
    assert!(matches!(
        load_context(&path).await,
        Err(ReportingError::UnsupportedDataFormat { .. })
    ));
}

#[tokio::test]
async fn test_load_missing_template_file() {
    let env = TestEnvironment::new();
    let mut manager = ReportTemplateManager::new(TemplateProcessor::new().unwrap());
    let result = manager.load_template("x", env.file("absent.html")).await;
    assert!(matches!(result, Err(ReportingError::TemplateNotFound { .. })));
}

#[tokio::test]
async fn test_render_and_deliver_to_file() {
    let env = TestEnvironment::new();
    let template_path = env.write("weekly.html", "<h1>{{report.title}}</h1>").await;

    let mut manager = ReportTemplateManager::new(TemplateProcessor::new().unwrap());
    manager.load_template("weekly", &template_path).await.unwrap();
    let report = manager
        .render_report("weekly", &Value::from(json!({"title": "Week 12"})))
        .unwrap();
    assert_eq!(
        report.metadata.get("template_file").map(String::as_str),
        template_path.to_str()
    );

    FileDeliverer::new(env.file("out/weekly.html"))
        .deliver_report(&report)
        .await
        .unwrap();
    assert_eq!(env.read("out/weekly.html").await, "<h1>Week 12</h1>");
}

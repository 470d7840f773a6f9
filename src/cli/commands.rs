// ABOUTME: Command implementations for the reportsmith CLI
// ABOUTME: Handles execution of render, validate, init, and helpers commands

use anyhow::{Context, Result};
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use super::config::Config;
use crate::reporting::{
    builtin, load_context, BuiltinSource, FileDeliverer, ReportDeliverer, ReportTemplateManager,
    StdoutDeliverer, TemplateSource,
};
use crate::template::value::Map;
use crate::template::{Severity, TemplateProcessor, Value};

const BUILTIN_PREFIX: &str = "builtin:";

/// Render a template against a data file
pub async fn render_report(
    template: &str,
    data_path: PathBuf,
    partials: Vec<PathBuf>,
    output: Option<PathBuf>,
    config: &Config,
) -> Result<()> {
    info!("Rendering report from template: {}", template);

    let mut manager = build_manager(partials, config).await?;
    let name = load_template(&mut manager, template).await?;

    let data = load_context(&data_path)
        .await
        .with_context(|| format!("Failed to load data from {}", data_path.display()))?;

    let report = manager
        .render_report(&name, &data)
        .map_err(|e| anyhow::anyhow!("Failed to render report: {}", e))?;

    let deliverer: Box<dyn ReportDeliverer> = match output {
        Some(path) => Box::new(FileDeliverer::new(path)),
        None => Box::new(StdoutDeliverer),
    };
    deliverer.deliver_report(&report).await?;

    info!("Report '{}' delivered to {}", report.title, deliverer.describe());
    Ok(())
}

/// Validate a template without rendering it
pub async fn validate_template(template: &str, partials: Vec<PathBuf>, config: &Config) -> Result<()> {
    info!("Validating template: {}", template);

    let mut manager = build_manager(partials, config).await?;
    let name = load_template(&mut manager, template).await?;
    let content = manager.template_content(&name).unwrap_or_default();

    let diagnostics = manager.processor().lint(content);
    for diagnostic in &diagnostics {
        println!("  {}", diagnostic);
    }

    let errors = diagnostics
        .iter()
        .filter(|d| d.severity == Severity::Error)
        .count();
    if errors > 0 {
        return Err(anyhow::anyhow!(
            "Template '{}' has {} error(s)",
            name,
            errors
        ));
    }

    println!("✓ Template '{}' is valid", name);
    println!("  Warnings: {}", diagnostics.len());
    println!("  Partials available: {}", manager.processor().partial_names().len());

    info!("Template validation completed successfully");
    Ok(())
}

/// Create a starter template and sample data file
pub async fn init_report(
    name: String,
    output_dir: PathBuf,
    template: String,
    _config: &Config,
) -> Result<()> {
    info!("Initializing report '{}' in {}", name, output_dir.display());

    let (template_content, data) = starter_files(&name, &template)?;

    tokio::fs::create_dir_all(&output_dir).await?;

    let template_file = output_dir.join(format!("{}.html", name));
    let data_file = output_dir.join(format!("{}.data.yaml", name));
    for file in [&template_file, &data_file] {
        if file.exists() {
            return Err(anyhow::anyhow!("File already exists: {}", file.display()));
        }
    }

    tokio::fs::write(&template_file, template_content).await?;
    tokio::fs::write(&data_file, serde_yaml::to_string(&data)?).await?;

    println!("Created {}", template_file.display());
    println!("Created {}", data_file.display());
    println!(
        "Render it with: reportsmith render {} --data {}",
        template_file.display(),
        data_file.display()
    );

    info!("Created report files for '{}'", name);
    Ok(())
}

/// Print every helper name templates can call
pub fn list_helpers(config: &Config) -> Result<()> {
    let mut processor = TemplateProcessor::new()?;
    for (alias, target) in &config.rendering.helper_aliases {
        processor
            .register_helper_alias(alias, target)
            .with_context(|| format!("Invalid helper alias '{}'", alias))?;
    }

    for name in processor.helper_names() {
        match config.rendering.helper_aliases.get(name) {
            Some(target) => println!("{} (alias of {})", name, target),
            None => println!("{}", name),
        }
    }
    Ok(())
}

async fn build_manager(partials: Vec<PathBuf>, config: &Config) -> Result<ReportTemplateManager> {
    let mut rendering = config.rendering.clone();
    rendering.partial_dirs.extend(partials);

    for dir in &rendering.partial_dirs {
        if !dir.is_dir() {
            warn!("Partials directory {} does not exist", dir.display());
        }
    }
    rendering.partial_dirs.retain(|dir| dir.is_dir());

    let manager = ReportTemplateManager::from_config(&rendering)
        .await
        .context("Failed to prepare template processor")?;

    let mut names: Vec<&String> = config.template_vars.keys().collect();
    names.sort();
    let vars: Map = names
        .into_iter()
        .map(|key| (key.clone(), Value::from(config.template_vars[key].as_str())))
        .collect();

    Ok(manager.with_global_variables(vars))
}

/// Cache the template named on the command line and return its cache name
async fn load_template(manager: &mut ReportTemplateManager, template: &str) -> Result<String> {
    if let Some(name) = template.strip_prefix(BUILTIN_PREFIX) {
        let content = BuiltinSource
            .load(name)
            .await
            .with_context(|| format!("Unknown built-in template '{}'", name))?;
        manager.add_template(name, &content);
        return Ok(name.to_string());
    }

    let path = Path::new(template);
    let name = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or(template)
        .to_string();
    manager
        .load_template(&name, path)
        .await
        .with_context(|| format!("Failed to load template {}", path.display()))?;
    Ok(name)
}

fn starter_files(name: &str, template_type: &str) -> Result<(String, serde_json::Value)> {
    match template_type {
        "basic" => Ok((BASIC_TEMPLATE.to_string(), basic_data(name))),
        "assessment" => {
            let content = builtin::template("assessment")
                .ok_or_else(|| anyhow::anyhow!("Built-in assessment template is missing"))?;
            Ok((content.to_string(), assessment_data(name)))
        }
        _ => Err(anyhow::anyhow!("Unknown template type: {}", template_type)),
    }
}

const BASIC_TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{{report.title}}</title>
</head>
<body>
<h1>{{report.title}}</h1>
{{!-- every field of the data file is available by name --}}
<p>Prepared for {{default vars.org 'your organization'}} on {{formatDate report.generated_at 'long'}}</p>
{{#if items}}<ul>
{{#each items}}<li>{{name}}: {{formatNumber value}}</li>
{{/each}}</ul>{{#else}}<p>No items.</p>{{/if}}
</body>
</html>
"##;

fn basic_data(name: &str) -> serde_json::Value {
    json!({
        "title": name,
        "items": [
            {"name": "First item", "value": 1200},
            {"name": "Second item", "value": 34.5}
        ]
    })
}

fn assessment_data(name: &str) -> serde_json::Value {
    json!({
        "title": format!("{} risk assessment", name),
        "tool": {"name": name, "vendor": "Example Vendor", "version": "1.0"},
        "assessor": "Security Team",
        "assessed_at": "2024-03-05",
        "overall_score": 48,
        "categories": [
            {"name": "Data privacy", "score": 62, "notes": "Prompts retained for 30 days"},
            {"name": "Access control", "score": 20},
            {"name": "Output reliability", "score": 55}
        ],
        "findings": [
            {"title": "Prompt retention", "severity": "high", "description": "Vendor keeps prompts for model improvement."},
            {"title": "No SSO", "severity": "medium"}
        ],
        "recommendations": [
            "Disable prompt retention in the admin console",
            "Require SSO before rollout"
        ],
        "compliance": ["GDPR", "SOC 2"]
    })
}

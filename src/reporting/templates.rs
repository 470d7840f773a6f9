// ABOUTME: Report template management and rendering
// ABOUTME: Caches report templates, registers partials from sources and renders reports with a built context

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn, Level};

use super::config::RenderingConfig;
use super::error::{ReportingError, Result};
use super::source::{BuiltinSource, DirectorySource, TemplateSource};
use super::GeneratedReport;
use crate::template::value::Map;
use crate::template::{TemplateProcessor, Value};

pub struct ReportTemplateManager {
    processor: TemplateProcessor,
    template_cache: HashMap<String, CachedTemplate>,
    global_variables: Map,
}

#[derive(Debug, Clone)]
struct CachedTemplate {
    content: String,
    last_modified: DateTime<Utc>,
    file_path: Option<PathBuf>,
}

impl ReportTemplateManager {
    pub fn new(processor: TemplateProcessor) -> Self {
        Self {
            processor,
            template_cache: HashMap::new(),
            global_variables: Map::new(),
        }
    }

    /// Build a manager with built-in helpers, configured aliases and recursion
    /// limits, and partials from the built-in theme and configured directories
    pub async fn from_config(config: &RenderingConfig) -> Result<Self> {
        let mut processor = TemplateProcessor::new()?
            .with_max_depth(config.max_partial_depth)
            .with_max_expansions(config.max_partial_expansions);
        for (alias, target) in &config.helper_aliases {
            processor.register_helper_alias(alias, target)?;
        }

        let mut manager = Self::new(processor);
        if config.builtin_partials {
            manager.register_partials_from(&BuiltinSource).await?;
        }
        for dir in &config.partial_dirs {
            let source = DirectorySource::new(dir, &config.template_extension);
            manager.register_partials_from(&source).await?;
        }
        Ok(manager)
    }

    pub fn with_global_variables(mut self, variables: Map) -> Self {
        self.global_variables = variables;
        self
    }

    pub fn processor(&self) -> &TemplateProcessor {
        &self.processor
    }

    pub fn processor_mut(&mut self) -> &mut TemplateProcessor {
        &mut self.processor
    }

    /// Load a template from a file and cache it
    pub async fn load_template(&mut self, template_name: &str, file_path: impl AsRef<Path>) -> Result<()> {
        let path = file_path.as_ref();

        if !fs::try_exists(path).await.unwrap_or(false) {
            return Err(ReportingError::TemplateNotFound {
                name: path.display().to_string(),
            });
        }

        let content = fs::read_to_string(path).await?;
        let last_modified: DateTime<Utc> = fs::metadata(path).await?.modified()?.into();

        debug!("Cached template '{}' from {}", template_name, path.display());
        self.template_cache.insert(
            template_name.to_string(),
            CachedTemplate {
                content,
                last_modified,
                file_path: Some(path.to_path_buf()),
            },
        );

        Ok(())
    }

    /// Add a template from string content
    pub fn add_template(&mut self, template_name: &str, content: &str) {
        self.template_cache.insert(
            template_name.to_string(),
            CachedTemplate {
                content: content.to_string(),
                last_modified: Utc::now(),
                file_path: None,
            },
        );
    }

    /// Register every template a source lists as a partial under its source name.
    /// Returns the number of partials registered.
    pub async fn register_partials_from(&mut self, source: &dyn TemplateSource) -> Result<usize> {
        let names = source.list().await?;
        for name in &names {
            let content = source.load(name).await?;
            self.processor.register_partial(name, &content);
        }

        info!("Registered {} partial(s) from {}", names.len(), source.describe());
        Ok(names.len())
    }

    /// Render a cached template into a report
    pub fn render_report(&self, template_name: &str, data: &Value) -> Result<GeneratedReport> {
        let cached = self.template_cache.get(template_name).ok_or_else(|| {
            ReportingError::TemplateNotFound {
                name: template_name.to_string(),
            }
        })?;

        let generated_at = Utc::now();
        let title = report_title(template_name, data);
        let context = self.build_template_context(template_name, &title, generated_at, data);

        // diagnostics cost a second parse; the validate command reports them otherwise
        if tracing::enabled!(Level::DEBUG) {
            for diagnostic in self.processor.lint(&cached.content) {
                debug!("{}: {}", template_name, diagnostic);
            }
        }

        let content = self.processor.render(&cached.content, &context);
        debug!("Rendered '{}' ({} bytes)", template_name, content.len());

        Ok(GeneratedReport {
            template: template_name.to_string(),
            title,
            content,
            generated_at,
            metadata: self.build_metadata(cached, data),
        })
    }

    /// Reload file-backed templates whose modification time moved forward.
    /// Returns the names that were reloaded.
    pub async fn refresh_templates(&mut self) -> Result<Vec<String>> {
        let mut templates_to_reload = Vec::new();

        for (name, cached) in &self.template_cache {
            if let Some(file_path) = &cached.file_path {
                if !fs::try_exists(file_path).await.unwrap_or(false) {
                    warn!("Template file {} disappeared, keeping cached copy", file_path.display());
                    continue;
                }
                let file_modified: DateTime<Utc> = fs::metadata(file_path).await?.modified()?.into();
                if file_modified > cached.last_modified {
                    templates_to_reload.push((name.clone(), file_path.clone()));
                }
            }
        }

        let mut reloaded = Vec::with_capacity(templates_to_reload.len());
        for (name, file_path) in templates_to_reload {
            self.load_template(&name, &file_path).await?;
            reloaded.push(name);
        }

        Ok(reloaded)
    }

    /// Cached template names, sorted
    pub fn list_templates(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.template_cache.keys().map(|k| k.as_str()).collect();
        names.sort_unstable();
        names
    }

    pub fn template_content(&self, template_name: &str) -> Option<&str> {
        self.template_cache.get(template_name).map(|c| c.content.as_str())
    }

    /// Remove a template from cache
    pub fn remove_template(&mut self, template_name: &str) -> bool {
        self.template_cache.remove(template_name).is_some()
    }

    pub fn clear_cache(&mut self) {
        self.template_cache.clear();
    }

    pub fn set_global_variables(&mut self, variables: Map) {
        self.global_variables = variables;
    }

    pub fn add_global_variable(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.global_variables.insert(key.into(), value.into());
    }

    fn build_template_context(
        &self,
        template_name: &str,
        title: &str,
        generated_at: DateTime<Utc>,
        data: &Value,
    ) -> Value {
        let mut context = match data {
            Value::Map(fields) => fields.clone(),
            Value::Null => Map::new(),
            other => {
                let mut wrapped = Map::new();
                wrapped.insert("data".to_string(), other.clone());
                wrapped
            }
        };

        if !self.global_variables.is_empty() {
            let mut vars = match context.shift_remove("vars") {
                Some(Value::Map(existing)) => existing,
                _ => Map::new(),
            };
            for (key, value) in &self.global_variables {
                vars.insert(key.clone(), value.clone());
            }
            context.insert("vars".to_string(), Value::Map(vars));
        }

        let mut report = Map::new();
        report.insert("template".to_string(), Value::from(template_name));
        report.insert("generated_at".to_string(), Value::Date(generated_at));
        report.insert("title".to_string(), Value::from(title));
        context.insert("report".to_string(), Value::Map(report));

        Value::Map(context)
    }

    fn build_metadata(&self, cached: &CachedTemplate, data: &Value) -> HashMap<String, String> {
        let mut metadata = HashMap::new();
        metadata.insert(
            "template_modified".to_string(),
            cached.last_modified.to_rfc3339(),
        );
        if let Some(path) = &cached.file_path {
            metadata.insert("template_file".to_string(), path.display().to_string());
        }
        if let Some(fields) = data.as_map() {
            metadata.insert("data_fields".to_string(), fields.len().to_string());
        }
        metadata.insert(
            "partials".to_string(),
            self.processor.partial_names().len().to_string(),
        );
        metadata
    }
}

fn report_title(template_name: &str, data: &Value) -> String {
    match data.get_segment("title") {
        Some(title) if title.is_truthy() => title.to_string(),
        _ => format!("{} report", template_name),
    }
}

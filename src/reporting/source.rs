// ABOUTME: Template sources supplying raw template and partial text by name
// ABOUTME: Provides a directory-backed source and the built-in assessment theme source

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;
use walkdir::WalkDir;

use super::builtin;
use super::error::{ReportingError, Result};

#[async_trait]
pub trait TemplateSource: Send + Sync {
    /// Raw template text for `name`
    async fn load(&self, name: &str) -> Result<String>;

    /// All template names this source can load, sorted
    async fn list(&self) -> Result<Vec<String>>;

    fn describe(&self) -> String;
}

/// Templates stored as files under a directory.
///
/// `partials/risk_table.html` under the root is named `partials/risk_table`.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
    extension: String,
}

impl DirectorySource {
    pub fn new(root: impl Into<PathBuf>, extension: &str) -> Self {
        Self {
            root: root.into(),
            extension: extension.trim_start_matches('.').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, name: &str) -> Result<PathBuf> {
        let relative = Path::new(name);
        let escapes_root = relative.components().any(|c| {
            !matches!(c, std::path::Component::Normal(_))
        });
        if name.is_empty() || escapes_root {
            return Err(ReportingError::TemplateNotFound {
                name: name.to_string(),
            });
        }
        Ok(self.root.join(format!("{}.{}", name, self.extension)))
    }

    fn name_for(&self, path: &Path) -> Option<String> {
        if path.extension().and_then(|e| e.to_str()) != Some(self.extension.as_str()) {
            return None;
        }
        let relative = path.strip_prefix(&self.root).ok()?.with_extension("");
        let parts: Vec<&str> = relative
            .components()
            .map(|c| c.as_os_str().to_str())
            .collect::<Option<_>>()?;
        Some(parts.join("/"))
    }
}

#[async_trait]
impl TemplateSource for DirectorySource {
    async fn load(&self, name: &str) -> Result<String> {
        let path = self.path_for(name)?;
        if !fs::try_exists(&path).await.unwrap_or(false) {
            return Err(ReportingError::TemplateNotFound {
                name: name.to_string(),
            });
        }
        debug!("Loading template '{}' from {}", name, path.display());
        Ok(fs::read_to_string(&path).await?)
    }

    async fn list(&self) -> Result<Vec<String>> {
        let root = self.root.clone();
        let entries = tokio::task::spawn_blocking(move || {
            WalkDir::new(&root)
                .follow_links(true)
                .into_iter()
                .collect::<std::result::Result<Vec<_>, walkdir::Error>>()
        })
        .await
        .map_err(|e| ReportingError::TemplateError {
            message: format!("Template directory scan failed: {}", e),
        })??;

        let mut names: Vec<String> = entries
            .iter()
            .filter(|entry| entry.file_type().is_file())
            .filter_map(|entry| self.name_for(entry.path()))
            .collect();
        names.sort();
        Ok(names)
    }

    fn describe(&self) -> String {
        format!("directory {} (*.{})", self.root.display(), self.extension)
    }
}

/// The templates compiled into the binary
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinSource;

#[async_trait]
impl TemplateSource for BuiltinSource {
    async fn load(&self, name: &str) -> Result<String> {
        builtin::template(name)
            .map(str::to_string)
            .ok_or_else(|| ReportingError::TemplateNotFound {
                name: name.to_string(),
            })
    }

    async fn list(&self) -> Result<Vec<String>> {
        let mut names: Vec<String> = builtin::TEMPLATES
            .iter()
            .chain(builtin::PARTIALS.iter())
            .map(|(name, _)| name.to_string())
            .collect();
        names.sort();
        Ok(names)
    }

    fn describe(&self) -> String {
        "built-in templates".to_string()
    }
}

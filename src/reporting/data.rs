// ABOUTME: Loads report data contexts from JSON and YAML files
// ABOUTME: Converts parsed documents into template values, keeping mapping key order

use serde_json::Value as JsonValue;
use std::path::Path;
use tokio::fs;
use tracing::debug;

use super::error::{ReportingError, Result};
use crate::template::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataFormat {
    Json,
    Yaml,
}

impl DataFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        match extension.as_str() {
            "json" => Ok(Self::Json),
            "yaml" | "yml" => Ok(Self::Yaml),
            _ => Err(ReportingError::UnsupportedDataFormat { extension }),
        }
    }
}

/// Read a data file into a template context
pub async fn load_context(path: impl AsRef<Path>) -> Result<Value> {
    let path = path.as_ref();
    let format = DataFormat::from_path(path)?;
    let content = fs::read_to_string(path)
        .await
        .map_err(|e| ReportingError::DataError {
            message: format!("Failed to read data file {}: {}", path.display(), e),
        })?;
    debug!("Loaded {} bytes of {:?} data from {}", content.len(), format, path.display());
    parse_context(&content, format)
}

pub fn parse_context(content: &str, format: DataFormat) -> Result<Value> {
    let json: JsonValue = match format {
        DataFormat::Json => serde_json::from_str(content)?,
        // an empty YAML document is an empty context, not null
        DataFormat::Yaml if content.trim().is_empty() => JsonValue::Object(Default::default()),
        DataFormat::Yaml => serde_yaml::from_str(content)?,
    };
    Ok(Value::from(json))
}

// ABOUTME: Report layer on top of the template processor
// ABOUTME: Loads templates and data contexts, renders reports and delivers them

pub mod builtin;
pub mod config;
pub mod data;
pub mod delivery;
pub mod error;
pub mod source;
pub mod templates;

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

pub use config::RenderingConfig;
pub use data::{load_context, DataFormat};
pub use delivery::{FileDeliverer, ReportDeliverer, StdoutDeliverer};
pub use error::{ReportingError, Result};
pub use source::{BuiltinSource, DirectorySource, TemplateSource};
pub use templates::ReportTemplateManager;

#[derive(Debug, Clone, Serialize)]
pub struct GeneratedReport {
    pub template: String,
    pub title: String,
    pub content: String,
    pub generated_at: DateTime<Utc>,
    pub metadata: HashMap<String, String>,
}

// ABOUTME: Main library module for the reportsmith template processor
// ABOUTME: Exports the template engine, report layer and CLI components

pub mod cli;
pub mod reporting;
pub mod template;

// Re-export commonly used types
pub use cli::{App, Args, Config};
pub use reporting::{GeneratedReport, ReportTemplateManager};
pub use template::{TemplateError, TemplateProcessor, Value};

// Error handling
pub type Result<T> = anyhow::Result<T>;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ABOUTME: Error types for report loading and rendering operations
// ABOUTME: Defines errors for template sources, data contexts and report output

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReportingError {
    #[error("Template not found: {name}")]
    TemplateNotFound { name: String },

    #[error("Template error: {message}")]
    TemplateError { message: String },

    #[error("Unsupported data format '{extension}' (expected json, yaml or yml)")]
    UnsupportedDataFormat { extension: String },

    #[error("Data context error: {message}")]
    DataError { message: String },

    #[error("Delivery error: {message}")]
    DeliveryError { message: String },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("YAML serialization error: {0}")]
    YamlSerializationError(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Directory walk error: {0}")]
    WalkError(#[from] walkdir::Error),

    #[error("Template engine error: {0}")]
    TemplateEngineError(#[from] crate::template::TemplateError),
}

pub type Result<T> = std::result::Result<T, ReportingError>;

// ABOUTME: Error types for template processor operations
// ABOUTME: Defines registration errors and the error type returned by helper functions

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TemplateError {
    #[error("Invalid helper '{name}': {reason}")]
    InvalidHelper { name: String, reason: String },

    #[error("Template syntax error: {0}")]
    SyntaxError(String),
}

impl TemplateError {
    pub fn invalid_helper(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidHelper {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

/// Failure raised by a helper function while rendering a single directive
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct HelperError {
    message: String,
}

impl HelperError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

pub type Result<T> = std::result::Result<T, TemplateError>;

// ABOUTME: Template processor module for report rendering
// ABOUTME: Parses `{{ ... }}` templates into an AST and renders them against dynamic data contexts

pub mod ast;
pub mod context;
pub mod engine;
pub mod error;
pub mod escape;
pub mod helpers;
pub mod lexer;
pub mod parser;
pub mod registry;
pub mod value;

pub use context::Context;
pub use engine::{
    CompiledTemplate, Diagnostic, Severity, TemplateProcessor, DEFAULT_MAX_DEPTH,
    DEFAULT_MAX_EXPANSIONS,
};
pub use error::{HelperError, Result, TemplateError};
pub use escape::escape_html;
pub use registry::{HelperFn, HelperRegistry, HelperResult, PartialRegistry};
pub use value::Value;

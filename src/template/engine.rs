// ABOUTME: Template processor rendering parsed templates against data contexts
// ABOUTME: Evaluates interpolation, conditionals, loops, partials and helpers with fail-soft markers

use std::cell::Cell;
use std::panic::{self, AssertUnwindSafe};

use serde_json::Value as JsonValue;
use tracing::{debug, warn};

use super::ast::{Arg, HelperCall, Node};
use super::context::Context;
use super::error::{Result, TemplateError};
use super::escape::{escape_html_into, html_comment};
use super::helpers;
use super::lexer::{tokenize, TokenKind};
use super::parser;
use super::registry::{HelperFn, HelperRegistry, HelperResult, PartialRegistry};
use super::value::Value;

/// Partial expansions allowed inside one render before the recursion marker is emitted
pub const DEFAULT_MAX_DEPTH: usize = 32;

/// Total partial expansions allowed in one render, however they fan out
pub const DEFAULT_MAX_EXPANSIONS: usize = 10_000;

/// Ceiling on nested blocks and partials combined while rendering
const MAX_RENDER_NESTING: usize = 256;

/// Renders `{{ ... }}` templates into HTML.
///
/// Each processor owns its helper and partial registries. Registration takes
/// `&mut self` and rendering `&self`; callers sharing a processor across
/// threads must finish registering before rendering or guard it with a lock.
#[derive(Debug, Clone)]
pub struct TemplateProcessor {
    helpers: HelperRegistry,
    partials: PartialRegistry,
    max_depth: usize,
    max_expansions: usize,
}

impl TemplateProcessor {
    /// Create a processor with all built-in helpers
    pub fn new() -> Result<Self> {
        let mut processor = Self::without_helpers();
        helpers::register_builtins(&mut processor.helpers)?;
        Ok(processor)
    }

    /// Create a processor with empty registries
    pub fn without_helpers() -> Self {
        Self {
            helpers: HelperRegistry::new(),
            partials: PartialRegistry::new(),
            max_depth: DEFAULT_MAX_DEPTH,
            max_expansions: DEFAULT_MAX_EXPANSIONS,
        }
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn set_max_depth(&mut self, max_depth: usize) {
        self.max_depth = max_depth;
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn with_max_expansions(mut self, max_expansions: usize) -> Self {
        self.max_expansions = max_expansions;
        self
    }

    pub fn set_max_expansions(&mut self, max_expansions: usize) {
        self.max_expansions = max_expansions;
    }

    pub fn max_expansions(&self) -> usize {
        self.max_expansions
    }

    /// Register a custom helper function, replacing any helper with the same name
    pub fn register_helper<F>(&mut self, name: &str, helper: F) -> Result<()>
    where
        F: Fn(&[Value], &Context<'_>) -> HelperResult + Send + Sync + 'static,
    {
        self.helpers.register(name, helper)
    }

    /// Make a registered helper available under another name
    pub fn register_helper_alias(&mut self, alias: &str, target: &str) -> Result<()> {
        self.helpers.alias(alias, target)
    }

    /// Register a partial; its syntax is not checked until it is rendered
    pub fn register_partial(&mut self, name: &str, template: &str) {
        self.partials.register(name, template);
    }

    pub fn has_helper(&self, name: &str) -> bool {
        self.helpers.contains(name)
    }

    pub fn has_partial(&self, name: &str) -> bool {
        self.partials.contains(name)
    }

    pub fn helper_names(&self) -> Vec<&str> {
        self.helpers.names()
    }

    pub fn partial_names(&self) -> Vec<&str> {
        self.partials.names()
    }

    pub fn partials(&self) -> &PartialRegistry {
        &self.partials
    }

    pub fn partials_mut(&mut self) -> &mut PartialRegistry {
        &mut self.partials
    }

    /// Render a template string against a data context. Never fails: problems
    /// show up as empty output, verbatim text or an HTML comment marker.
    pub fn render(&self, template: &str, context: &Value) -> String {
        let nodes = parser::parse(template);
        self.render_nodes(&nodes, context)
    }

    /// Render with a JSON data context
    pub fn render_json(&self, template: &str, context: &JsonValue) -> String {
        self.render(template, &Value::from(context.clone()))
    }

    /// Parse a template once for repeated rendering
    pub fn compile(&self, template: &str) -> CompiledTemplate<'_> {
        debug!("Compiling template ({} bytes)", template.len());
        CompiledTemplate {
            processor: self,
            nodes: parser::parse(template),
        }
    }

    fn render_nodes(&self, nodes: &[Node], context: &Value) -> String {
        let mut out = String::new();
        let renderer = Renderer {
            processor: self,
            expansions: Cell::new(0),
        };
        renderer.render(nodes, &Context::new(context), Frame::default(), &mut out);
        out
    }

    /// Check a template for structural problems without rendering it
    pub fn lint(&self, template: &str) -> Vec<Diagnostic> {
        let (_, issues) = parser::parse_with_issues(template);
        let mut diagnostics: Vec<Diagnostic> = issues
            .into_iter()
            .map(|issue| Diagnostic::at(template, issue.offset, Severity::Error, issue.message))
            .collect();

        for token in tokenize(template) {
            let message = match &token.kind {
                TokenKind::Expr { head, args } if !args.is_empty() && !self.has_helper(head.raw()) => {
                    format!("unknown helper '{}' is rendered verbatim", head.raw())
                }
                TokenKind::Partial(name) if !self.has_partial(name) => {
                    format!("partial '{}' is not registered", name)
                }
                _ => continue,
            };
            diagnostics.push(Diagnostic::at(template, token.offset, Severity::Warning, message));
        }

        diagnostics.sort_by_key(|d| (d.line, d.column));
        diagnostics
    }

    /// Fail with a syntax error when `lint` reports any error
    pub fn validate_template(&self, template: &str) -> Result<()> {
        let errors: Vec<String> = self
            .lint(template)
            .into_iter()
            .filter(|d| d.severity == Severity::Error)
            .map(|d| d.to_string())
            .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(TemplateError::SyntaxError(errors.join("; ")))
        }
    }

    /// Check if a string contains template directives
    pub fn has_directives(text: &str) -> bool {
        text.contains("{{") && text.contains("}}")
    }
}

/// A template parsed once and rendered against the processor's current registries
#[derive(Debug, Clone)]
pub struct CompiledTemplate<'p> {
    processor: &'p TemplateProcessor,
    nodes: Vec<Node>,
}

impl CompiledTemplate<'_> {
    pub fn render(&self, context: &Value) -> String {
        self.processor.render_nodes(&self.nodes, context)
    }
}

/// Per-render state; the expansion count is shared by every branch of the render
struct Renderer<'p> {
    processor: &'p TemplateProcessor,
    expansions: Cell<usize>,
}

/// Partial depth and total nesting at one point of the render
#[derive(Debug, Clone, Copy, Default)]
struct Frame {
    depth: usize,
    nesting: usize,
}

impl Frame {
    fn block(self) -> Self {
        Self {
            nesting: self.nesting + 1,
            ..self
        }
    }

    fn partial(self) -> Self {
        Self {
            depth: self.depth + 1,
            nesting: self.nesting + 1,
        }
    }
}

impl Renderer<'_> {
    fn render(&self, nodes: &[Node], ctx: &Context<'_>, frame: Frame, out: &mut String) {
        for node in nodes {
            match node {
                Node::Text(text) => out.push_str(text),
                Node::Variable(path) => {
                    let helper = path
                        .as_simple_name()
                        .and_then(|name| self.processor.helpers.get(name).map(|h| (name, h)));
                    if let Some((name, helper)) = helper {
                        self.call_helper(name, helper, &[], ctx, out);
                    } else if let Some(value) = ctx.lookup(path) {
                        escape_html_into(&value.to_string(), out);
                    }
                }
                Node::Helper(call) => self.render_helper(call, ctx, out),
                Node::If {
                    condition,
                    then_branch,
                    else_branch,
                } => {
                    let truthy = ctx.lookup(condition).is_some_and(|value| value.is_truthy());
                    if truthy {
                        self.render(then_branch, ctx, frame.block(), out);
                    } else if let Some(else_branch) = else_branch {
                        self.render(else_branch, ctx, frame.block(), out);
                    }
                }
                Node::Each { target, body } => {
                    let Some(value) = ctx.lookup(target) else {
                        continue;
                    };
                    let Some(items) = value.as_seq() else {
                        continue;
                    };
                    for (index, item) in items.iter().enumerate() {
                        let item_ctx = ctx.for_item(item, index, items.len());
                        self.render(body, &item_ctx, frame.block(), out);
                    }
                }
                Node::Partial { name } => self.render_partial(name, ctx, frame, out),
            }
        }
    }

    fn render_partial(&self, name: &str, ctx: &Context<'_>, frame: Frame, out: &mut String) {
        let Some(partial) = self.processor.partials.get(name) else {
            warn!("Partial '{}' not found", name);
            out.push_str(&html_comment(&format!("Partial \"{}\" not found", name)));
            return;
        };

        let limit = if frame.depth >= self.processor.max_depth {
            Some(format!("limit {}", self.processor.max_depth))
        } else if frame.nesting >= MAX_RENDER_NESTING {
            Some(format!("nesting limit {}", MAX_RENDER_NESTING))
        } else if self.expansions.get() >= self.processor.max_expansions {
            Some(format!("expansion limit {}", self.processor.max_expansions))
        } else {
            None
        };

        if let Some(limit) = limit {
            warn!("Recursion limit exceeded rendering partial '{}' ({})", name, limit);
            out.push_str(&html_comment(&format!(
                "Recursion limit exceeded rendering partial \"{}\" ({})",
                name, limit
            )));
            return;
        }

        self.expansions.set(self.expansions.get() + 1);
        self.render(partial.nodes(), ctx, frame.partial(), out);
    }

    fn render_helper(&self, call: &HelperCall, ctx: &Context<'_>, out: &mut String) {
        let Some(helper) = self.processor.helpers.get(&call.name) else {
            debug!("Unknown helper '{}', leaving directive as is", call.name);
            out.push_str(&call.raw);
            return;
        };

        let args: Vec<Value> = call
            .args
            .iter()
            .map(|arg| match arg {
                Arg::Literal(value) => value.clone(),
                Arg::Path(path) => ctx
                    .lookup(path)
                    .map(|value| value.into_owned())
                    .unwrap_or_default(),
            })
            .collect();

        self.call_helper(&call.name, helper, &args, ctx, out);
    }

    fn call_helper(
        &self,
        name: &str,
        helper: &HelperFn,
        args: &[Value],
        ctx: &Context<'_>,
        out: &mut String,
    ) {
        // helpers are caller code; a panic fails only this directive
        let result = panic::catch_unwind(AssertUnwindSafe(|| helper(args, ctx)))
            .unwrap_or_else(|_| Err(super::error::HelperError::new("helper panicked")));

        match result {
            Ok(value) => escape_html_into(&value.to_string(), out),
            Err(e) => {
                warn!("Helper '{}' failed: {}", name, e);
                out.push_str(&html_comment(&format!("Helper \"{}\" failed: {}", name, e)));
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Warning,
}

/// A lint finding with a 1-based source position
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl Diagnostic {
    fn at(source: &str, offset: usize, severity: Severity, message: String) -> Self {
        let before = &source[..offset];
        let line = before.matches('\n').count() + 1;
        let line_start = before.rfind('\n').map(|i| i + 1).unwrap_or(0);
        let column = source[line_start..offset].chars().count() + 1;
        Self {
            severity,
            line,
            column,
            message,
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let level = match self.severity {
            Severity::Error => "error",
            Severity::Warning => "warning",
        };
        write!(f, "{}:{}: {}: {}", self.line, self.column, level, self.message)
    }
}

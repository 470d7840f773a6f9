// ABOUTME: Helper and partial registries owned by each template processor
// ABOUTME: Maps names to helper functions and to pre-parsed partial templates

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use super::ast::{check_helper_name, Node};
use super::context::Context;
use super::error::{HelperError, Result, TemplateError};
use super::parser;
use super::value::Value;

pub type HelperResult = std::result::Result<Value, HelperError>;

/// A helper receives its resolved arguments and the scope it was called in.
pub type HelperFn = Arc<dyn Fn(&[Value], &Context<'_>) -> HelperResult + Send + Sync>;

#[derive(Clone, Default)]
pub struct HelperRegistry {
    helpers: HashMap<String, HelperFn>,
}

impl HelperRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a helper. The last registration for a name wins.
    pub fn register<F>(&mut self, name: &str, helper: F) -> Result<()>
    where
        F: Fn(&[Value], &Context<'_>) -> HelperResult + Send + Sync + 'static,
    {
        check_helper_name(name).map_err(|reason| TemplateError::invalid_helper(name, reason))?;
        debug!("Registering helper '{}'", name);
        self.helpers.insert(name.to_string(), Arc::new(helper));
        Ok(())
    }

    /// Make an existing helper callable under another name.
    pub fn alias(&mut self, alias: &str, target: &str) -> Result<()> {
        check_helper_name(alias).map_err(|reason| TemplateError::invalid_helper(alias, reason))?;
        let helper = self.helpers.get(target).cloned().ok_or_else(|| {
            TemplateError::invalid_helper(
                alias,
                format!("alias target '{}' is not a registered helper", target),
            )
        })?;
        debug!("Registering helper alias '{}' -> '{}'", alias, target);
        self.helpers.insert(alias.to_string(), helper);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&HelperFn> {
        self.helpers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.helpers.contains_key(name)
    }

    /// Registered helper names in sorted order
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.helpers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.helpers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.helpers.is_empty()
    }
}

impl fmt::Debug for HelperRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HelperRegistry")
            .field("helpers", &self.names())
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct Partial {
    source: String,
    nodes: Arc<Vec<Node>>,
}

impl Partial {
    pub fn source(&self) -> &str {
        &self.source
    }

    pub(crate) fn nodes(&self) -> &[Node] {
        &self.nodes
    }
}

#[derive(Debug, Clone, Default)]
pub struct PartialRegistry {
    partials: HashMap<String, Partial>,
}

impl PartialRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a partial. Parsing never fails; problems in the partial
    /// show up as literal text when it is rendered.
    pub fn register(&mut self, name: &str, source: &str) {
        debug!("Registering partial '{}' ({} bytes)", name, source.len());
        self.partials.insert(
            name.to_string(),
            Partial {
                source: source.to_string(),
                nodes: Arc::new(parser::parse(source)),
            },
        );
    }

    pub fn get(&self, name: &str) -> Option<&Partial> {
        self.partials.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.partials.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.partials.remove(name).is_some()
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.partials.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.partials.len()
    }

    pub fn is_empty(&self) -> bool {
        self.partials.is_empty()
    }
}

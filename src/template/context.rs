// ABOUTME: Render-time scope chain for resolving template paths
// ABOUTME: Derives per-item loop scopes binding `this`, `@index`, `@first` and `@last` without copying data

use std::borrow::Cow;

use super::ast::PathExpr;
use super::value::Value;

/// Scope a template is evaluated in.
///
/// The root scope wraps the data context. Each `{{#each}}` iteration derives a
/// child scope that binds the current item; lookups search the innermost scope
/// first and fall back to enclosing scopes, so loop bodies see both the item's
/// fields and everything visible outside the loop. Child scopes borrow their
/// parent and never modify it.
#[derive(Debug, Clone, Copy)]
pub struct Context<'a> {
    root: &'a Value,
    frame: Option<LoopFrame<'a>>,
    parent: Option<&'a Context<'a>>,
}

#[derive(Debug, Clone, Copy)]
struct LoopFrame<'a> {
    item: &'a Value,
    index: usize,
    len: usize,
}

impl<'a> Context<'a> {
    pub fn new(root: &'a Value) -> Self {
        Self {
            root,
            frame: None,
            parent: None,
        }
    }

    /// Derive the scope for one loop item.
    pub fn for_item<'b>(&'b self, item: &'b Value, index: usize, len: usize) -> Context<'b> {
        Context {
            root: self.root,
            frame: Some(LoopFrame { item, index, len }),
            parent: Some(self),
        }
    }

    pub fn root(&self) -> &'a Value {
        self.root
    }

    /// The value bound to `this`: the innermost loop item, or the root outside loops.
    pub fn this(&self) -> &'a Value {
        self.frame.map(|frame| frame.item).unwrap_or(self.root)
    }

    /// Loop nesting depth of this scope; zero at the root.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut scope = self.parent;
        while let Some(ctx) = scope {
            depth += 1;
            scope = ctx.parent;
        }
        depth
    }

    /// Resolve a path, returning `None` as soon as a segment is missing.
    pub fn lookup(&self, path: &PathExpr) -> Option<Cow<'a, Value>> {
        let (head, rest) = path.segments().split_first()?;
        let base = self.resolve_head(head)?;
        walk(base, rest)
    }

    /// Parse and resolve a path string; convenience for helpers.
    pub fn resolve(&self, path: &str) -> Option<Value> {
        let path = PathExpr::parse(path)?;
        self.lookup(&path).map(Cow::into_owned)
    }

    fn resolve_head(&self, name: &str) -> Option<Cow<'a, Value>> {
        let mut scope = Some(self);

        while let Some(ctx) = scope {
            let Some(frame) = ctx.frame else {
                if name == "this" {
                    return Some(Cow::Borrowed(ctx.root));
                }
                return ctx.root.get_segment(name).map(Cow::Borrowed);
            };

            match name {
                "this" => return Some(Cow::Borrowed(frame.item)),
                "@index" => return Some(Cow::Owned(Value::from(frame.index))),
                "@first" => return Some(Cow::Owned(Value::Bool(frame.index == 0))),
                "@last" => return Some(Cow::Owned(Value::Bool(frame.index + 1 == frame.len))),
                _ => {}
            }
            if let Some(value) = frame.item.as_map().and_then(|map| map.get(name)) {
                return Some(Cow::Borrowed(value));
            }

            scope = ctx.parent;
        }

        None
    }
}

fn walk<'a>(base: Cow<'a, Value>, rest: &[String]) -> Option<Cow<'a, Value>> {
    let mut value = match base {
        Cow::Borrowed(value) => value,
        // loop bindings are scalars with nothing below them
        Cow::Owned(value) => return rest.is_empty().then_some(Cow::Owned(value)),
    };

    for (i, segment) in rest.iter().enumerate() {
        match value.get_segment(segment) {
            Some(next) => value = next,
            None if segment == "length" && i + 1 == rest.len() => {
                return value.length().map(|n| Cow::Owned(Value::from(n)));
            }
            None => return None,
        }
    }

    Some(Cow::Borrowed(value))
}

// ABOUTME: Abstract syntax tree for parsed templates
// ABOUTME: Defines template nodes, helper arguments and dotted path expressions

use super::value::Value;

/// Parsed template body
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Literal text, including directive-like text that did not parse
    Text(String),
    /// `{{path}}`; a zero-argument helper call when `path` names a helper
    Variable(PathExpr),
    /// `{{name arg ...}}` with at least one argument
    Helper(HelperCall),
    /// `{{#if path}} ... {{#else}} ... {{/if}}`
    If {
        condition: PathExpr,
        then_branch: Vec<Node>,
        else_branch: Option<Vec<Node>>,
    },
    /// `{{#each path}} ... {{/each}}`
    Each { target: PathExpr, body: Vec<Node> },
    /// `{{> name}}`
    Partial { name: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct HelperCall {
    pub name: String,
    pub args: Vec<Arg>,
    /// Source text of the directive, emitted verbatim when the helper is unknown
    pub raw: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Literal(Value),
    Path(PathExpr),
}

/// Dotted lookup path; `items[0].name` and `items.0.name` parse identically.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathExpr {
    raw: String,
    segments: Vec<String>,
}

impl PathExpr {
    pub fn parse(raw: &str) -> Option<Self> {
        let mut segments = Vec::new();
        let mut current = String::new();
        let mut chars = raw.chars();
        // true right after a `]`, where only `.`, `[` or the end may follow
        let mut closed_bracket = false;

        while let Some(c) = chars.next() {
            match c {
                '.' => {
                    if current.is_empty() && !closed_bracket {
                        return None;
                    }
                    if !current.is_empty() {
                        segments.push(std::mem::take(&mut current));
                    }
                    closed_bracket = false;
                    // a trailing dot leaves nothing to look up
                    if chars.as_str().is_empty() {
                        return None;
                    }
                }
                '[' => {
                    if current.is_empty() && segments.is_empty() {
                        return None;
                    }
                    if !current.is_empty() {
                        segments.push(std::mem::take(&mut current));
                    }
                    let mut index = String::new();
                    loop {
                        match chars.next() {
                            Some(']') => break,
                            Some(c) if is_segment_char(c) => index.push(c),
                            _ => return None,
                        }
                    }
                    if index.is_empty() {
                        return None;
                    }
                    segments.push(index);
                    closed_bracket = true;
                }
                c if is_segment_char(c) => {
                    if closed_bracket {
                        return None;
                    }
                    current.push(c);
                }
                _ => return None,
            }
        }

        if !current.is_empty() {
            segments.push(current);
        }
        if segments.is_empty() {
            return None;
        }

        Some(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// A single-segment path that could also name a helper
    pub fn as_simple_name(&self) -> Option<&str> {
        match self.segments.as_slice() {
            [only] if only == &self.raw => Some(only),
            _ => None,
        }
    }
}

fn is_segment_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '$' | '-' | '@')
}

/// Check that `name` can be invoked as a helper from template syntax.
pub fn check_helper_name(name: &str) -> Result<(), &'static str> {
    let Some(first) = name.chars().next() else {
        return Err("helper name is empty");
    };
    if matches!(first, '#' | '/' | '>' | '!' | '@') {
        return Err("helper name starts with a directive sigil");
    }
    if first.is_ascii_digit() {
        return Err("helper name starts with a digit");
    }
    if name == "this" {
        return Err("'this' is reserved for loop items");
    }
    if !name
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '_' | '$' | '-'))
    {
        return Err("helper name contains characters not allowed in a directive");
    }
    Ok(())
}

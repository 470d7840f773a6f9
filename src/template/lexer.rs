// ABOUTME: Tokenizer for template source text
// ABOUTME: Splits templates into literal text and classified `{{ ... }}` tags, dropping comments

use super::ast::{check_helper_name, Arg, PathExpr};
use super::value::Value;

#[derive(Debug, Clone, PartialEq)]
pub struct Token<'s> {
    pub kind: TokenKind,
    /// Exact source text covered by this token
    pub raw: &'s str,
    /// Byte offset of `raw` in the template
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Text,
    If(PathExpr),
    Else,
    EndIf,
    Each(PathExpr),
    EndEach,
    Partial(String),
    /// Bare path or helper call; `args` is empty for `{{name}}`
    Expr { head: PathExpr, args: Vec<Arg> },
    /// Looked like a directive but did not parse; rendered verbatim
    Malformed(String),
}

const OPEN: &str = "{{";
const CLOSE: &str = "}}";
const COMMENT_OPEN: &str = "{{!--";
const COMMENT_CLOSE: &str = "--}}";

pub fn tokenize(source: &str) -> Vec<Token<'_>> {
    let mut tokens = Vec::new();
    let mut pos = 0;
    let mut text_start = 0;

    while let Some(rel) = source[pos..].find(OPEN) {
        let open = pos + rel;

        if source[open..].starts_with(COMMENT_OPEN) {
            let body = open + COMMENT_OPEN.len();
            match source[body..].find(COMMENT_CLOSE) {
                Some(end) => {
                    push_text(&mut tokens, source, text_start, open);
                    pos = body + end + COMMENT_CLOSE.len();
                    text_start = pos;
                }
                // unterminated comments stay in the output
                None => pos = open + OPEN.len(),
            }
            continue;
        }

        let body = open + OPEN.len();
        let Some(close_rel) = source[body..].find(CLOSE) else {
            break;
        };
        let inner = &source[body..body + close_rel];
        if let Some(nested) = inner.find(OPEN) {
            // `{{ a {{b}}`: the first `{{` is literal, retry from the inner one
            pos = body + nested;
            continue;
        }

        let close = body + close_rel + CLOSE.len();
        push_text(&mut tokens, source, text_start, open);
        tokens.push(Token {
            kind: classify(inner),
            raw: &source[open..close],
            offset: open,
        });
        pos = close;
        text_start = close;
    }

    push_text(&mut tokens, source, text_start, source.len());
    tokens
}

fn push_text<'s>(tokens: &mut Vec<Token<'s>>, source: &'s str, start: usize, end: usize) {
    if start < end {
        tokens.push(Token {
            kind: TokenKind::Text,
            raw: &source[start..end],
            offset: start,
        });
    }
}

fn classify(inner: &str) -> TokenKind {
    let content = inner.trim();

    match content {
        "#else" => return TokenKind::Else,
        "/if" => return TokenKind::EndIf,
        "/each" => return TokenKind::EndEach,
        "" => return TokenKind::Malformed("empty tag".to_string()),
        _ => {}
    }

    if let Some(rest) = block_argument(content, "#if") {
        return match PathExpr::parse(rest) {
            Some(path) => TokenKind::If(path),
            None => TokenKind::Malformed(format!("invalid #if condition '{}'", rest)),
        };
    }
    if let Some(rest) = block_argument(content, "#each") {
        return match PathExpr::parse(rest) {
            Some(path) => TokenKind::Each(path),
            None => TokenKind::Malformed(format!("invalid #each target '{}'", rest)),
        };
    }
    if let Some(rest) = content.strip_prefix('>') {
        let name = rest.trim();
        if name.is_empty() || name.contains(char::is_whitespace) {
            return TokenKind::Malformed(format!("invalid partial name '{}'", name));
        }
        return TokenKind::Partial(name.to_string());
    }
    if content.starts_with(['#', '/', '!']) {
        return TokenKind::Malformed(format!("unknown directive '{}'", content));
    }

    classify_expression(content)
}

/// `#if path` / `#each path`: the keyword must be followed by whitespace.
fn block_argument<'c>(content: &'c str, keyword: &str) -> Option<&'c str> {
    let rest = content.strip_prefix(keyword)?;
    if rest.is_empty() || rest.starts_with(char::is_whitespace) {
        Some(rest.trim())
    } else {
        None
    }
}

fn classify_expression(content: &str) -> TokenKind {
    let words = match split_words(content) {
        Ok(words) => words,
        Err(reason) => return TokenKind::Malformed(reason),
    };

    let mut words = words.into_iter();
    let head = match words.next() {
        Some(Word::Bare(head)) => head,
        Some(Word::Quoted(_)) => {
            return TokenKind::Malformed("tag starts with a string literal".to_string())
        }
        None => return TokenKind::Malformed("empty tag".to_string()),
    };
    let Some(head_path) = PathExpr::parse(&head) else {
        return TokenKind::Malformed(format!("invalid path '{}'", head));
    };

    let mut args = Vec::new();
    for word in words {
        match word {
            Word::Quoted(text) => args.push(Arg::Literal(Value::String(text))),
            Word::Bare(text) => match bare_argument(&text) {
                Some(arg) => args.push(arg),
                None => return TokenKind::Malformed(format!("invalid argument '{}'", text)),
            },
        }
    }

    if !args.is_empty() {
        if let Err(reason) = check_helper_name(&head) {
            return TokenKind::Malformed(format!("invalid helper name '{}': {}", head, reason));
        }
    }

    TokenKind::Expr {
        head: head_path,
        args,
    }
}

fn bare_argument(text: &str) -> Option<Arg> {
    match text {
        "true" => return Some(Arg::Literal(Value::Bool(true))),
        "false" => return Some(Arg::Literal(Value::Bool(false))),
        "null" => return Some(Arg::Literal(Value::Null)),
        _ => {}
    }
    let numeric_start = text
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit() || c == '-' || c == '.');
    if numeric_start {
        if let Ok(n) = text.parse::<f64>() {
            return Some(Arg::Literal(Value::Number(n)));
        }
    }
    PathExpr::parse(text).map(Arg::Path)
}

#[derive(Debug, PartialEq)]
enum Word {
    Bare(String),
    Quoted(String),
}

fn split_words(content: &str) -> Result<Vec<Word>, String> {
    let mut words = Vec::new();
    let mut chars = content.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() {
            chars.next();
            continue;
        }

        if c == '"' || c == '\'' {
            chars.next();
            let mut text = String::new();
            loop {
                match chars.next() {
                    Some(q) if q == c => break,
                    Some(other) => text.push(other),
                    None => return Err("unterminated string literal".to_string()),
                }
            }
            if chars.peek().is_some_and(|next| !next.is_whitespace()) {
                return Err("string literal must be followed by whitespace".to_string());
            }
            words.push(Word::Quoted(text));
            continue;
        }

        let mut text = String::new();
        while let Some(&next) = chars.peek() {
            if next.is_whitespace() {
                break;
            }
            if next == '"' || next == '\'' {
                return Err(format!("unexpected quote after '{}'", text));
            }
            text.push(next);
            chars.next();
        }
        words.push(Word::Bare(text));
    }

    Ok(words)
}

// ABOUTME: Parser building the template AST from the token stream
// ABOUTME: Pairs block openers with closers and keeps unmatched directives as literal text

use super::ast::{HelperCall, Node};
use super::lexer::{tokenize, Token, TokenKind};

/// Blocks nested deeper than this are kept as literal text
pub const MAX_BLOCK_NESTING: usize = 64;

/// Structural problem found while parsing; rendering treats the tag as text.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseIssue {
    pub offset: usize,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum BlockKind {
    If,
    Each,
}

impl BlockKind {
    fn opener(self) -> &'static str {
        match self {
            BlockKind::If => "{{#if}}",
            BlockKind::Each => "{{#each}}",
        }
    }
}

struct OpenBlock {
    index: usize,
    kind: BlockKind,
    else_at: Option<usize>,
}

#[derive(Clone, Copy)]
struct Pairing {
    close: usize,
    else_at: Option<usize>,
}

pub fn parse(source: &str) -> Vec<Node> {
    parse_with_issues(source).0
}

pub fn parse_with_issues(source: &str) -> (Vec<Node>, Vec<ParseIssue>) {
    let tokens = tokenize(source);
    let mut parser = Parser::new(&tokens);
    parser.match_blocks();
    let nodes = parser.build(0, tokens.len());
    (nodes, parser.issues)
}

struct Parser<'t, 's> {
    tokens: &'t [Token<'s>],
    pairings: Vec<Option<Pairing>>,
    literal: Vec<bool>,
    issues: Vec<ParseIssue>,
}

impl<'t, 's> Parser<'t, 's> {
    fn new(tokens: &'t [Token<'s>]) -> Self {
        Self {
            tokens,
            pairings: vec![None; tokens.len()],
            literal: vec![false; tokens.len()],
            issues: Vec::new(),
        }
    }

    /// Bracket-match block tags. Unclosed openers, stray closers and
    /// misplaced `{{#else}}` tags are marked literal, as is every tag of a
    /// block nested deeper than `MAX_BLOCK_NESTING`.
    fn match_blocks(&mut self) {
        let tokens = self.tokens;
        let mut stack: Vec<OpenBlock> = Vec::new();
        // openers past the nesting cap, innermost last
        let mut overflow: Vec<BlockKind> = Vec::new();

        for (index, token) in tokens.iter().enumerate() {
            match &token.kind {
                TokenKind::If(_) => self.open_block(&mut stack, &mut overflow, index, BlockKind::If),
                TokenKind::Each(_) => {
                    self.open_block(&mut stack, &mut overflow, index, BlockKind::Each)
                }
                TokenKind::Else if overflow.last() == Some(&BlockKind::If) => {
                    self.literal[index] = true;
                }
                TokenKind::Else => match stack.last_mut() {
                    Some(open) if open.kind == BlockKind::If && open.else_at.is_none() => {
                        open.else_at = Some(index);
                    }
                    _ => self.mark_literal(index, "{{#else}} outside of an {{#if}} block"),
                },
                TokenKind::EndIf if close_overflow(&mut overflow, BlockKind::If) => {
                    self.literal[index] = true;
                }
                TokenKind::EndEach if close_overflow(&mut overflow, BlockKind::Each) => {
                    self.literal[index] = true;
                }
                TokenKind::EndIf => {
                    overflow.clear();
                    self.close_block(&mut stack, index, BlockKind::If)
                }
                TokenKind::EndEach => {
                    overflow.clear();
                    self.close_block(&mut stack, index, BlockKind::Each)
                }
                TokenKind::Malformed(reason) => {
                    let message = format!("malformed tag {}: {}", token.raw, reason);
                    self.issue(index, message);
                }
                _ => {}
            }
        }

        for open in stack {
            self.mark_unclosed(open);
        }
    }

    fn open_block(
        &mut self,
        stack: &mut Vec<OpenBlock>,
        overflow: &mut Vec<BlockKind>,
        index: usize,
        kind: BlockKind,
    ) {
        if stack.len() < MAX_BLOCK_NESTING {
            stack.push(OpenBlock {
                index,
                kind,
                else_at: None,
            });
            return;
        }

        let message = format!(
            "{} is nested deeper than {} blocks",
            self.tokens[index].raw, MAX_BLOCK_NESTING
        );
        self.mark_literal(index, message);
        overflow.push(kind);
    }

    fn close_block(&mut self, stack: &mut Vec<OpenBlock>, index: usize, kind: BlockKind) {
        let Some(position) = stack.iter().rposition(|open| open.kind == kind) else {
            let message = format!("{} without a matching {}", self.tokens[index].raw, kind.opener());
            self.mark_literal(index, message);
            return;
        };

        let mut inner = stack.split_off(position);
        let open = inner.remove(0);
        for unclosed in inner {
            self.mark_unclosed(unclosed);
        }
        self.pairings[open.index] = Some(Pairing {
            close: index,
            else_at: open.else_at,
        });
    }

    fn mark_unclosed(&mut self, open: OpenBlock) {
        let message = format!("{} is never closed", self.tokens[open.index].raw);
        self.mark_literal(open.index, message);
        if let Some(else_at) = open.else_at {
            self.literal[else_at] = true;
        }
    }

    fn mark_literal(&mut self, index: usize, message: impl Into<String>) {
        self.literal[index] = true;
        self.issue(index, message);
    }

    fn issue(&mut self, index: usize, message: impl Into<String>) {
        self.issues.push(ParseIssue {
            offset: self.tokens[index].offset,
            message: message.into(),
        });
    }

    fn build(&self, start: usize, end: usize) -> Vec<Node> {
        let mut nodes = Vec::new();
        let mut index = start;

        while index < end {
            let token = &self.tokens[index];
            if self.literal[index] {
                push_text(&mut nodes, token.raw);
                index += 1;
                continue;
            }

            match (&token.kind, self.pairings[index]) {
                (TokenKind::If(condition), Some(pairing)) => {
                    let then_end = pairing.else_at.unwrap_or(pairing.close);
                    nodes.push(Node::If {
                        condition: condition.clone(),
                        then_branch: self.build(index + 1, then_end),
                        else_branch: pairing
                            .else_at
                            .map(|else_at| self.build(else_at + 1, pairing.close)),
                    });
                    index = pairing.close + 1;
                    continue;
                }
                (TokenKind::Each(target), Some(pairing)) => {
                    nodes.push(Node::Each {
                        target: target.clone(),
                        body: self.build(index + 1, pairing.close),
                    });
                    index = pairing.close + 1;
                    continue;
                }
                (TokenKind::Partial(name), _) => {
                    nodes.push(Node::Partial { name: name.clone() });
                }
                (TokenKind::Expr { head, args }, _) if args.is_empty() => {
                    nodes.push(Node::Variable(head.clone()));
                }
                (TokenKind::Expr { head, args }, _) => {
                    nodes.push(Node::Helper(HelperCall {
                        name: head.raw().to_string(),
                        args: args.clone(),
                        raw: token.raw.to_string(),
                    }));
                }
                _ => push_text(&mut nodes, token.raw),
            }
            index += 1;
        }

        nodes
    }
}

/// Close the innermost literal opener of `kind`, if any is pending
fn close_overflow(overflow: &mut Vec<BlockKind>, kind: BlockKind) -> bool {
    match overflow.iter().rposition(|open| *open == kind) {
        Some(position) => {
            overflow.truncate(position);
            true
        }
        None => false,
    }
}

fn push_text(nodes: &mut Vec<Node>, text: &str) {
    if let Some(Node::Text(existing)) = nodes.last_mut() {
        existing.push_str(text);
    } else {
        nodes.push(Node::Text(text.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::template::ast::PathExpr;

    fn path(raw: &str) -> PathExpr {
        PathExpr::parse(raw).unwrap()
    }

    fn text(s: &str) -> Node {
        Node::Text(s.to_string())
    }

    #[test]
    fn test_if_else_tree() {
        let nodes = parse("{{#if ok}}Y{{#else}}N{{/if}}");
        assert_eq!(
            nodes,
            vec![Node::If {
                condition: path("ok"),
                then_branch: vec![text("Y")],
                else_branch: Some(vec![text("N")]),
            }]
        );
    }

    #[test]
    fn test_nested_blocks_pair_innermost_first() {
        let nodes = parse("{{#if a}}{{#if b}}x{{/if}}y{{/if}}");
        assert_eq!(
            nodes,
            vec![Node::If {
                condition: path("a"),
                then_branch: vec![
                    Node::If {
                        condition: path("b"),
                        then_branch: vec![text("x")],
                        else_branch: None,
                    },
                    text("y"),
                ],
                else_branch: None,
            }]
        );
    }

    #[test]
    fn test_each_with_variable() {
        let nodes = parse("{{#each items}}<li>{{this}}</li>{{/each}}");
        assert_eq!(
            nodes,
            vec![Node::Each {
                target: path("items"),
                body: vec![text("<li>"), Node::Variable(path("this")), text("</li>")],
            }]
        );
    }

    #[test]
    fn test_unclosed_block_is_literal() {
        let (nodes, issues) = parse_with_issues("{{#if a}}body {{name}}");
        assert_eq!(
            nodes,
            vec![text("{{#if a}}body "), Node::Variable(path("name"))]
        );
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("never closed"));
        assert_eq!(issues[0].offset, 0);
    }

    #[test]
    fn test_stray_closer_and_else_are_literal() {
        let (nodes, issues) = parse_with_issues("a{{/each}}b{{#else}}c");
        assert_eq!(nodes, vec![text("a{{/each}}b{{#else}}c")]);
        assert_eq!(issues.len(), 2);
    }

    #[test]
    fn test_interleaved_blocks() {
        // the {{#each}} is cut off by the outer {{/if}} and stays literal
        let nodes = parse("{{#if a}}{{#each xs}}x{{/if}}{{/each}}");
        assert_eq!(
            nodes,
            vec![
                Node::If {
                    condition: path("a"),
                    then_branch: vec![text("{{#each xs}}x")],
                    else_branch: None,
                },
                text("{{/each}}"),
            ]
        );
    }

    #[test]
    fn test_else_inside_each_is_literal() {
        let nodes = parse("{{#if a}}{{#each xs}}{{#else}}{{/each}}{{/if}}");
        assert_eq!(
            nodes,
            vec![Node::If {
                condition: path("a"),
                then_branch: vec![Node::Each {
                    target: path("xs"),
                    body: vec![text("{{#else}}")],
                }],
                else_branch: None,
            }]
        );
    }

    #[test]
    fn test_helper_call_keeps_raw_text() {
        let nodes = parse("{{formatDate created 'short'}}");
        match &nodes[0] {
            Node::Helper(call) => {
                assert_eq!(call.name, "formatDate");
                assert_eq!(call.args.len(), 2);
                assert_eq!(call.raw, "{{formatDate created 'short'}}");
            }
            other => panic!("unexpected node {:?}", other),
        }
    }

    #[test]
    fn test_blocks_past_nesting_cap_are_literal() {
        let depth = MAX_BLOCK_NESTING + 2;
        let source = format!("{}x{}", "{{#if a}}".repeat(depth), "{{/if}}".repeat(depth));
        let (nodes, issues) = parse_with_issues(&source);

        assert_eq!(issues.len(), 2);
        assert!(issues[0].message.contains("nested deeper than 64 blocks"));

        let mut innermost = &nodes;
        for _ in 0..MAX_BLOCK_NESTING {
            assert_eq!(innermost.len(), 1);
            match &innermost[0] {
                Node::If { then_branch, .. } => innermost = then_branch,
                other => panic!("unexpected node {:?}", other),
            }
        }
        assert_eq!(innermost, &vec![text("{{#if a}}{{#if a}}x{{/if}}{{/if}}")]);
    }

    #[test]
    fn test_malformed_tag_reports_issue() {
        let (nodes, issues) = parse_with_issues("x {{fmt 'open}} y");
        assert_eq!(nodes, vec![text("x {{fmt 'open}} y")]);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].offset, 2);
    }
}

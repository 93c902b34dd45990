//! Template parsing.
//!
//! Parsing runs in two passes over the token stream:
//!
//! 1. **Matching**: a stack pairs every block opener with its closer (and an
//!    `IF` with its optional `ELSE`). Directives that end up without a partner
//!    are recorded as unmatched.
//! 2. **Tree building**: recursive descent over the tokens. Matched directives
//!    become block nodes, unmatched ones become literal text.
//!
//! Because pairing is settled before the tree is built, the descent never has
//! to backtrack and malformed templates cost no more than well-formed ones.
//!
//! # Matching Rules
//!
//! - `{{/IF}}` closes the nearest open `IF`, `{{/FOREACH}}` the nearest open
//!   `FOREACH`. Openers of the other kind in between are abandoned.
//! - `{{#ELSE}}` binds to the innermost open block only when that block is an
//!   `IF` that has no `ELSE` yet.
//! - Closers without an opener, and openers still open at the end of input,
//!   are unmatched.
//! - Blocks nested deeper than [`MAX_DEPTH`] are unmatched together with
//!   their `ELSE` and closer, so their whole span renders as literal text.

use std::collections::BTreeSet;

use crate::ast::{push_text, ForeachBlock, IfBlock, Node, VariableRef};
use crate::token::{Spanned, Token, Tokenizer};

/// A directive that could not be paired, reported by [`Template::unmatched`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// The directive as written, e.g. `{{/FOREACH}}`.
    pub directive: String,
    /// Byte offset of the directive in the template source.
    pub offset: usize,
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "unmatched directive {} at byte {}",
            self.directive, self.offset
        )
    }
}

/// A parsed template.
///
/// Parsing never fails; see the [module docs](self) for how malformed
/// directives are handled.
///
/// # Example
///
/// ```rust
/// use forge_template::Template;
///
/// let template = Template::parse("{{#IF ENABLED}}on{{/IF}}{{/FOREACH}}");
/// assert_eq!(template.unmatched().len(), 1);
/// assert_eq!(template.referenced_names(), vec!["ENABLED"]);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    source: String,
    nodes: Vec<Node>,
    unmatched: Vec<Diagnostic>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BlockKind {
    If,
    Foreach,
}

/// Maximum nesting of matched blocks.
///
/// Building and rendering recurse once per level; this keeps both within
/// the stack for any input.
pub const MAX_DEPTH: usize = 256;

struct OpenBlock {
    index: usize,
    kind: BlockKind,
    else_index: Option<usize>,
    too_deep: bool,
}

impl Template {
    /// Parses template source into a directive tree.
    pub fn parse(source: &str) -> Template {
        let tokens: Vec<Spanned<'_>> = Tokenizer::new(source).collect();
        let matched = match_blocks(&tokens);

        let unmatched = tokens
            .iter()
            .zip(&matched)
            .filter(|(spanned, ok)| !**ok && !matches!(spanned.token, Token::Text(_)))
            .map(|(spanned, _)| Diagnostic {
                directive: spanned.token.raw().to_string(),
                offset: spanned.offset,
            })
            .collect();

        let mut builder = TreeBuilder {
            tokens: &tokens,
            matched: &matched,
            pos: 0,
        };
        let (nodes, _) = builder.build();

        Template {
            source: source.to_string(),
            nodes,
            unmatched,
        }
    }

    /// Returns the original template text.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the top-level nodes.
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Returns directives that were left as literal text.
    pub fn unmatched(&self) -> &[Diagnostic] {
        &self.unmatched
    }

    /// Returns the names this template reads from the outermost context.
    ///
    /// Includes substituted variables, `IF` conditions and `FOREACH`
    /// sequences outside any `FOREACH` body. Names inside a body usually
    /// refer to item fields and are skipped. Dotted names contribute their
    /// first segment. The result is sorted and deduplicated.
    pub fn referenced_names(&self) -> Vec<String> {
        let mut names = BTreeSet::new();
        collect_names(&self.nodes, &mut names);
        names.into_iter().collect()
    }
}

fn collect_names(nodes: &[Node], names: &mut BTreeSet<String>) {
    fn root(name: &str) -> String {
        name.split('.').next().unwrap_or(name).to_string()
    }

    for node in nodes {
        match node {
            Node::Text(_) => {}
            Node::Variable(var) => {
                names.insert(root(&var.name));
            }
            Node::If(block) => {
                names.insert(root(&block.name));
                collect_names(&block.then_branch, names);
                if let Some(else_branch) = &block.else_branch {
                    collect_names(else_branch, names);
                }
            }
            Node::Foreach(block) => {
                names.insert(root(&block.name));
            }
        }
    }
}

/// Open blocks per kind, so closers with nothing to close skip the stack
/// search.
#[derive(Default)]
struct OpenCounts {
    ifs: usize,
    foreachs: usize,
}

impl OpenCounts {
    fn slot(&mut self, kind: BlockKind) -> &mut usize {
        match kind {
            BlockKind::If => &mut self.ifs,
            BlockKind::Foreach => &mut self.foreachs,
        }
    }
}

/// Pairs block directives. Returns, per token, whether it takes part in a
/// well-formed directive.
fn match_blocks(tokens: &[Spanned<'_>]) -> Vec<bool> {
    let mut matched = vec![false; tokens.len()];
    let mut stack: Vec<OpenBlock> = Vec::new();
    let mut counts = OpenCounts::default();

    for (index, spanned) in tokens.iter().enumerate() {
        let closing = match spanned.token {
            Token::Text(_) => continue,
            Token::Variable { .. } => {
                matched[index] = true;
                continue;
            }
            Token::If { .. } | Token::Foreach { .. } => {
                let kind = match spanned.token {
                    Token::If { .. } => BlockKind::If,
                    _ => BlockKind::Foreach,
                };
                *counts.slot(kind) += 1;
                stack.push(OpenBlock {
                    index,
                    kind,
                    else_index: None,
                    too_deep: stack.len() >= MAX_DEPTH,
                });
                continue;
            }
            Token::Else { .. } => {
                if let Some(top) = stack.last_mut() {
                    if top.kind == BlockKind::If && top.else_index.is_none() {
                        top.else_index = Some(index);
                    }
                }
                continue;
            }
            Token::EndIf { .. } => BlockKind::If,
            Token::EndForeach { .. } => BlockKind::Foreach,
        };

        if *counts.slot(closing) == 0 {
            continue;
        }
        let Some(position) = stack.iter().rposition(|open| open.kind == closing) else {
            continue;
        };

        // Anything opened after the matching block is abandoned
        for abandoned in stack.drain(position + 1..) {
            *counts.slot(abandoned.kind) -= 1;
        }
        if let Some(open) = stack.pop() {
            *counts.slot(open.kind) -= 1;
            if open.too_deep {
                continue;
            }
            matched[open.index] = true;
            if let Some(else_index) = open.else_index {
                matched[else_index] = true;
            }
            matched[index] = true;
        }
    }

    matched
}

/// Why a block body stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stop {
    Else,
    EndIf,
    EndForeach,
    Eof,
}

struct TreeBuilder<'t, 'a> {
    tokens: &'t [Spanned<'a>],
    matched: &'t [bool],
    pos: usize,
}

impl TreeBuilder<'_, '_> {
    /// Builds nodes until a matched `ELSE`/closer or the end of input.
    fn build(&mut self) -> (Vec<Node>, Stop) {
        let tokens = self.tokens;
        let mut nodes = Vec::new();

        while let Some(spanned) = tokens.get(self.pos) {
            let matched = self.matched[self.pos];
            self.pos += 1;

            if !matched {
                push_text(&mut nodes, spanned.token.raw());
                continue;
            }

            match spanned.token {
                Token::Text(text) => push_text(&mut nodes, text),
                Token::Variable { raw, name } => nodes.push(Node::Variable(VariableRef {
                    name: name.to_string(),
                    raw: raw.to_string(),
                })),
                Token::If { name, negated, .. } => {
                    let (then_branch, stop) = self.build();
                    let else_branch = match stop {
                        Stop::Else => Some(self.build().0),
                        _ => None,
                    };
                    nodes.push(Node::If(IfBlock {
                        name: name.to_string(),
                        negated,
                        then_branch,
                        else_branch,
                    }));
                }
                Token::Foreach { name, .. } => {
                    let (body, _) = self.build();
                    nodes.push(Node::Foreach(ForeachBlock {
                        name: name.to_string(),
                        body,
                    }));
                }
                Token::Else { .. } => return (nodes, Stop::Else),
                Token::EndIf { .. } => return (nodes, Stop::EndIf),
                Token::EndForeach { .. } => return (nodes, Stop::EndForeach),
            }
        }

        (nodes, Stop::Eof)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Node {
        Node::Text(s.to_string())
    }

    fn var(name: &str) -> Node {
        Node::Variable(VariableRef {
            name: name.to_string(),
            raw: format!("{{{{{}}}}}", name),
        })
    }

    #[test]
    fn parses_plain_text() {
        let template = Template::parse("using UnityEngine;");
        assert_eq!(template.nodes(), &[text("using UnityEngine;")]);
        assert!(template.unmatched().is_empty());
    }

    #[test]
    fn parses_if_else() {
        let template = Template::parse("{{#IF SHOW}}yes{{#ELSE}}no{{/IF}}");
        assert_eq!(
            template.nodes(),
            &[Node::If(IfBlock {
                name: "SHOW".to_string(),
                negated: false,
                then_branch: vec![text("yes")],
                else_branch: Some(vec![text("no")]),
            })]
        );
    }

    #[test]
    fn parses_nested_blocks() {
        let template =
            Template::parse("{{#FOREACH FIELDS}}{{#IF !HIDDEN}}{{NAME}}{{/IF}};{{/FOREACH}}");
        assert_eq!(
            template.nodes(),
            &[Node::Foreach(ForeachBlock {
                name: "FIELDS".to_string(),
                body: vec![
                    Node::If(IfBlock {
                        name: "HIDDEN".to_string(),
                        negated: true,
                        then_branch: vec![var("NAME")],
                        else_branch: None,
                    }),
                    text(";"),
                ],
            })]
        );
    }

    #[test]
    fn unclosed_if_becomes_text() {
        let template = Template::parse("a{{#IF X}}b{{NAME}}");
        assert_eq!(template.nodes(), &[text("a{{#IF X}}b"), var("NAME")]);
        assert_eq!(
            template.unmatched(),
            &[Diagnostic {
                directive: "{{#IF X}}".to_string(),
                offset: 1,
            }]
        );
    }

    #[test]
    fn orphan_closers_become_text() {
        let template = Template::parse("x{{/IF}}y{{/FOREACH}}{{#ELSE}}");
        assert_eq!(template.nodes(), &[text("x{{/IF}}y{{/FOREACH}}{{#ELSE}}")]);
        assert_eq!(template.unmatched().len(), 3);
    }

    #[test]
    fn crossed_blocks_abandon_inner_opener() {
        let template = Template::parse("{{#IF A}}{{#FOREACH B}}x{{/IF}}{{/FOREACH}}");
        assert_eq!(
            template.nodes(),
            &[
                Node::If(IfBlock {
                    name: "A".to_string(),
                    negated: false,
                    then_branch: vec![text("{{#FOREACH B}}x")],
                    else_branch: None,
                }),
                text("{{/FOREACH}}"),
            ]
        );
        let offsets: Vec<usize> = template.unmatched().iter().map(|d| d.offset).collect();
        assert_eq!(offsets, vec![9, 31]);
    }

    #[test]
    fn second_else_is_literal() {
        let template = Template::parse("{{#IF A}}1{{#ELSE}}2{{#ELSE}}3{{/IF}}");
        assert_eq!(
            template.nodes(),
            &[Node::If(IfBlock {
                name: "A".to_string(),
                negated: false,
                then_branch: vec![text("1")],
                else_branch: Some(vec![text("2{{#ELSE}}3")]),
            })]
        );
    }

    #[test]
    fn else_inside_foreach_in_if_stays_with_foreach_scope() {
        // The ELSE sits directly in the FOREACH body, not in an IF
        let template =
            Template::parse("{{#IF A}}{{#FOREACH B}}x{{#ELSE}}y{{/FOREACH}}{{/IF}}");
        let Node::If(block) = &template.nodes()[0] else {
            panic!("expected IF node");
        };
        assert!(block.else_branch.is_none());
        assert_eq!(
            block.then_branch,
            vec![Node::Foreach(ForeachBlock {
                name: "B".to_string(),
                body: vec![text("x{{#ELSE}}y")],
            })]
        );
    }

    #[test]
    fn else_of_unclosed_if_is_literal() {
        let template = Template::parse("{{#IF A}}1{{#ELSE}}2");
        assert_eq!(template.nodes(), &[text("{{#IF A}}1{{#ELSE}}2")]);
        assert_eq!(template.unmatched().len(), 2);
    }

    #[test]
    fn deeply_unclosed_openers_parse_linearly() {
        let source = "{{#IF X}}".repeat(2000);
        let template = Template::parse(&source);
        assert_eq!(template.nodes(), &[text(&source)]);
        assert_eq!(template.unmatched().len(), 2000);
    }

    #[test]
    fn nesting_beyond_max_depth_is_literal() {
        let n = MAX_DEPTH + 2;
        let source = format!("{}x{}", "{{#IF A}}".repeat(n), "{{/IF}}".repeat(n));
        let template = Template::parse(&source);

        // The two innermost blocks are reported, opener and closer each
        assert_eq!(template.unmatched().len(), 4);
        assert_eq!(template.unmatched()[0].offset, MAX_DEPTH * "{{#IF A}}".len());

        let mut depth = 0;
        let mut nodes = template.nodes();
        while let [Node::If(block)] = nodes {
            depth += 1;
            nodes = &block.then_branch;
        }
        assert_eq!(depth, MAX_DEPTH);
        assert_eq!(nodes, &[text("{{#IF A}}{{#IF A}}x{{/IF}}{{/IF}}")]);
    }

    #[test]
    fn too_deep_else_stays_with_its_block() {
        let source = format!(
            "{}{{{{#IF B}}}}1{{{{#ELSE}}}}2{{{{/IF}}}}{}",
            "{{#FOREACH S}}".repeat(MAX_DEPTH),
            "{{/FOREACH}}".repeat(MAX_DEPTH)
        );
        let template = Template::parse(&source);
        let directives: Vec<&str> = template
            .unmatched()
            .iter()
            .map(|d| d.directive.as_str())
            .collect();
        assert_eq!(directives, vec!["{{#IF B}}", "{{#ELSE}}", "{{/IF}}"]);
    }

    #[test]
    fn orphan_closers_after_many_openers_parse_linearly() {
        let source = format!("{}{}", "{{#FOREACH S}}".repeat(20_000), "{{/IF}}".repeat(20_000));
        let template = Template::parse(&source);
        assert_eq!(template.unmatched().len(), 40_000);
    }

    #[test]
    fn referenced_names_skip_foreach_bodies() {
        let template = Template::parse(
            "{{CLASS_NAME}} {{#IF !ABSTRACT}}{{BASE.NAME}}{{#ELSE}}{{OTHER}}{{/IF}}\
             {{#FOREACH FIELDS}}{{FIELD_NAME}}{{/FOREACH}}",
        );
        assert_eq!(
            template.referenced_names(),
            vec!["ABSTRACT", "BASE", "CLASS_NAME", "FIELDS", "OTHER"]
        );
    }

    #[test]
    fn diagnostic_display() {
        let diagnostic = Diagnostic {
            directive: "{{/IF}}".to_string(),
            offset: 12,
        };
        assert_eq!(
            diagnostic.to_string(),
            "unmatched directive {{/IF}} at byte 12"
        );
    }
}

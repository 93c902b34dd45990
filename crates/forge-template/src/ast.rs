//! Directive tree produced by the parser.
//!
//! Nodes own their strings so a parsed [`Template`](crate::Template) can be
//! stored and rendered repeatedly without keeping the source borrowed.

/// A node in the directive tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Literal text, emitted unchanged. Unmatched directives end up here too.
    Text(String),

    /// Variable substitution: `{{NAME}}`
    Variable(VariableRef),

    /// Conditional block: `{{#IF NAME}}...{{#ELSE}}...{{/IF}}`
    If(IfBlock),

    /// Iteration block: `{{#FOREACH NAME}}...{{/FOREACH}}`
    Foreach(ForeachBlock),
}

/// A variable substitution.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableRef {
    /// Variable name, possibly dotted (`PLAYER.NAME`).
    pub name: String,
    /// Exact source spelling, emitted when the name is not bound.
    pub raw: String,
}

/// A conditional block.
#[derive(Debug, Clone, PartialEq)]
pub struct IfBlock {
    /// Name of the condition variable.
    pub name: String,
    /// `true` for `{{#IF !NAME}}`.
    pub negated: bool,
    /// Content rendered when the condition holds.
    pub then_branch: Vec<Node>,
    /// Content rendered otherwise, if an `{{#ELSE}}` was present.
    pub else_branch: Option<Vec<Node>>,
}

/// An iteration block.
#[derive(Debug, Clone, PartialEq)]
pub struct ForeachBlock {
    /// Name of the sequence variable.
    pub name: String,
    /// Content rendered once per item.
    pub body: Vec<Node>,
}

/// Appends literal text, merging with a preceding text node.
pub(crate) fn push_text(nodes: &mut Vec<Node>, text: &str) {
    if text.is_empty() {
        return;
    }
    if let Some(Node::Text(last)) = nodes.last_mut() {
        last.push_str(text);
    } else {
        nodes.push(Node::Text(text.to_string()));
    }
}

//! Forge Template - code-generation template renderer.
//!
//! This crate renders source-code templates (typically C# scripts) from a
//! template string and a mapping of named values. It supports:
//!
//! - Variable substitution: `{{CLASS_NAME}}`, dotted access `{{PLAYER.NAME}}`
//! - Conditionals: `{{#IF NAME}}...{{#ELSE}}...{{/IF}}`, negated `{{#IF !NAME}}`
//! - Iteration: `{{#FOREACH ITEMS}}...{{/FOREACH}}` with `_INDEX`, `_FIRST`,
//!   `_LAST` and `_ITEM` metadata
//! - Named templates loaded from directories via [`TemplateRegistry`]
//!
//! # Quick Start
//!
//! ```rust
//! use forge_template::{render, Value, Variables};
//!
//! let mut vars = Variables::new();
//! vars.insert("CLASS_NAME".into(), Value::from("PlayerHealth"));
//! vars.insert("USE_EVENTS".into(), Value::Bool(true));
//! vars.insert(
//!     "FIELDS".into(),
//!     Value::from(vec![
//!         Value::Map([("NAME".to_string(), Value::from("maxHealth")), ("DEFAULT".to_string(), Value::Float(100.0))].into()),
//!         Value::Map([("NAME".to_string(), Value::from("regen")), ("DEFAULT".to_string(), Value::Float(0.5))].into()),
//!     ]),
//! );
//!
//! let template = "\
//! public class {{CLASS_NAME}} : MonoBehaviour
//! {
//! {{#FOREACH FIELDS}}    public float {{NAME}} = {{DEFAULT}};
//! {{/FOREACH}}{{#IF USE_EVENTS}}    public event System.Action Changed;
//! {{/IF}}}";
//!
//! let output = render(template, &vars);
//! assert_eq!(output, "\
//! public class PlayerHealth : MonoBehaviour
//! {
//!     public float maxHealth = 100f;
//!     public float regen = 0.5f;
//!     public event System.Action Changed;
//! }");
//! ```
//!
//! # Rendering Never Fails
//!
//! Rendering is a total function of its inputs:
//!
//! - A missing variable leaves its `{{NAME}}` token in the output unchanged.
//! - A missing `IF` condition is falsy; a missing or non-sequence `FOREACH`
//!   binding expands to nothing.
//! - Malformed or unpaired directives are emitted as literal text (use
//!   [`Template::unmatched`] to find them). So are blocks nested deeper
//!   than [`MAX_DEPTH`].
//! - [`render_optional`] maps absent inputs: no template renders as `""`, no
//!   variables returns the template unchanged.
//!
//! Only the edges can fail: looking up a named template, reading template
//! directories, and parsing variable files. Those return [`TemplateError`].
//!
//! # Values
//!
//! | Type | Substitution | Truthy when |
//! |------|--------------|-------------|
//! | `Str` | verbatim | non-empty |
//! | `Int` | decimal digits | nonzero |
//! | `Float` | decimal + `f` suffix | nonzero |
//! | `Bool` | `true` / `false` | true |
//! | `Seq` | items joined by `", "` | non-empty |
//! | `Map` | nothing | non-empty |
//! | `Null` | nothing | never |

mod ast;
mod error;
mod parser;
mod registry;
mod render;
mod scope;
mod token;
mod value;

pub use ast::{ForeachBlock, IfBlock, Node, VariableRef};
pub use error::{Result, TemplateError};
pub use parser::{Diagnostic, Template, MAX_DEPTH};
pub use registry::{walk_template_dir, TemplateFile, TemplateRegistry, TEMPLATE_EXTENSIONS};
pub use render::Renderer;
pub use scope::{FIRST_KEY, INDEX_KEY, ITEM_KEY, LAST_KEY};
pub use value::{
    variables_from_json, variables_from_json_str, variables_from_yaml_str, Value, Variables,
    DEFAULT_FLOAT_SUFFIX,
};

/// Renders `template` against `variables` with the default [`Renderer`].
///
/// An empty template renders as an empty string. See the
/// [crate docs](crate) for directive semantics.
pub fn render(template: &str, variables: &Variables) -> String {
    Renderer::new().render(template, variables)
}

/// Renders with optional inputs, using the default [`Renderer`].
///
/// - `None` or empty template: `""`
/// - `None` variables: the template unchanged
///
/// ```rust
/// use forge_template::{render_optional, Variables};
///
/// assert_eq!(render_optional(None, Some(&Variables::new())), "");
/// assert_eq!(render_optional(Some("Hello {{NAME}}"), None), "Hello {{NAME}}");
/// ```
pub fn render_optional(template: Option<&str>, variables: Option<&Variables>) -> String {
    Renderer::new().render_optional(template, variables)
}

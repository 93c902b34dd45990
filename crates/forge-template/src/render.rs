//! Template evaluation.
//!
//! [`Renderer`] walks a parsed [`Template`] depth-first against a variable
//! mapping and flattens it to text. Evaluation is total: every missing or
//! ill-typed binding has a defined fallback, so rendering returns a `String`
//! rather than a `Result`.
//!
//! | Directive | Bound | Missing / wrong type |
//! |-----------|-------|----------------------|
//! | `{{NAME}}` | formatted value | token left as written |
//! | `{{#IF NAME}}` | truthiness | falsy |
//! | `{{#FOREACH NAME}}` | one expansion per item | empty |
//!
//! # Example
//!
//! ```rust
//! use forge_template::{Renderer, Value, Variables};
//!
//! let mut vars = Variables::new();
//! vars.insert("CLASS_NAME".into(), Value::from("PlayerHealth"));
//! vars.insert("MAX_HP".into(), Value::Float(100.0));
//!
//! let renderer = Renderer::new();
//! let output = renderer.render(
//!     "public class {{CLASS_NAME}} { float max = {{MAX_HP}}; }",
//!     &vars,
//! );
//! assert_eq!(output, "public class PlayerHealth { float max = 100f; }");
//! ```

use tracing::{debug, trace};

use crate::ast::{ForeachBlock, IfBlock, Node};
use crate::error::Result;
use crate::parser::Template;
use crate::registry::TemplateRegistry;
use crate::scope::Scope;
use crate::value::{Value, Variables, DEFAULT_FLOAT_SUFFIX};

/// A configured template renderer.
///
/// The renderer holds configuration and an optional [`TemplateRegistry`]
/// but no per-render state, so a single instance can be shared across
/// threads.
///
/// # Configuration
///
/// - [`with_float_suffix`](Self::with_float_suffix): suffix for float
///   substitutions (default `f`, the C# literal suffix)
/// - [`with_registry`](Self::with_registry): named templates for
///   [`render_named`](Self::render_named)
#[derive(Debug, Clone)]
pub struct Renderer {
    float_suffix: String,
    registry: TemplateRegistry,
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

impl Renderer {
    /// Creates a renderer with the C# float suffix and an empty registry.
    pub fn new() -> Self {
        Self {
            float_suffix: DEFAULT_FLOAT_SUFFIX.to_string(),
            registry: TemplateRegistry::new(),
        }
    }

    /// Sets the suffix appended to floating-point substitutions.
    pub fn with_float_suffix(mut self, suffix: impl Into<String>) -> Self {
        self.float_suffix = suffix.into();
        self
    }

    /// Uses `registry` to resolve names in [`render_named`](Self::render_named).
    pub fn with_registry(mut self, registry: TemplateRegistry) -> Self {
        self.registry = registry;
        self
    }

    /// Returns the configured float suffix.
    pub fn float_suffix(&self) -> &str {
        &self.float_suffix
    }

    /// Returns the template registry.
    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    /// Returns the template registry for modification.
    pub fn registry_mut(&mut self) -> &mut TemplateRegistry {
        &mut self.registry
    }

    /// Registers an inline template under `name`.
    pub fn add_template(&mut self, name: impl Into<String>, content: impl Into<String>) {
        self.registry.add_inline(name, content);
    }

    /// Renders template text against `variables`.
    ///
    /// An empty template renders as an empty string.
    pub fn render(&self, template: &str, variables: &Variables) -> String {
        if template.is_empty() {
            return String::new();
        }
        self.render_template(&Template::parse(template), variables)
    }

    /// Renders with optional inputs.
    ///
    /// - No template (or an empty one): empty string.
    /// - No variables: the template text, unchanged and unparsed.
    pub fn render_optional(&self, template: Option<&str>, variables: Option<&Variables>) -> String {
        match (template, variables) {
            (None, _) => String::new(),
            (Some(template), None) => template.to_string(),
            (Some(template), Some(variables)) => self.render(template, variables),
        }
    }

    /// Renders an already parsed template.
    ///
    /// Use this to render the same template many times without re-parsing.
    pub fn render_template(&self, template: &Template, variables: &Variables) -> String {
        debug!(
            len = template.source().len(),
            unmatched = template.unmatched().len(),
            "rendering template"
        );

        let scope = Scope::root(variables);
        let mut output = String::with_capacity(template.source().len());
        self.render_nodes(template.nodes(), &scope, &mut output);
        output
    }

    /// Renders the template registered under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::NotFound`](crate::TemplateError::NotFound) if
    /// no template has that name. Rendering itself cannot fail.
    pub fn render_named(&self, name: &str, variables: &Variables) -> Result<String> {
        let source = self.registry.get(name)?;
        debug!(template = name, "rendering named template");
        Ok(self.render(source, variables))
    }

    fn render_nodes(&self, nodes: &[Node], scope: &Scope<'_>, output: &mut String) {
        for node in nodes {
            match node {
                Node::Text(text) => output.push_str(text),
                Node::Variable(var) => match scope.lookup(&var.name) {
                    Some(value) => output.push_str(&value.format(&self.float_suffix)),
                    None => {
                        trace!(variable = %var.name, "unbound variable left in place");
                        output.push_str(&var.raw);
                    }
                },
                Node::If(block) => self.render_if(block, scope, output),
                Node::Foreach(block) => self.render_foreach(block, scope, output),
            }
        }
    }

    fn render_if(&self, block: &IfBlock, scope: &Scope<'_>, output: &mut String) {
        let truthy = scope.lookup(&block.name).is_some_and(Value::is_truthy);

        if truthy != block.negated {
            self.render_nodes(&block.then_branch, scope, output);
        } else if let Some(else_branch) = &block.else_branch {
            self.render_nodes(else_branch, scope, output);
        }
    }

    fn render_foreach(&self, block: &ForeachBlock, scope: &Scope<'_>, output: &mut String) {
        let Some(items) = scope.lookup(&block.name).and_then(Value::as_seq) else {
            trace!(sequence = %block.name, "FOREACH over unbound or non-sequence value");
            return;
        };

        for (index, item) in items.iter().enumerate() {
            let child = scope.iteration(item, index, items.len());
            self.render_nodes(&block.body, &child, output);
        }
    }
}

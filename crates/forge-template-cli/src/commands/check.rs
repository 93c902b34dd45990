//! `check` command: validate directive pairing and variable coverage.

use std::collections::BTreeSet;
use std::process::ExitCode;

use anyhow::Result;
use forge_template::{
    Node, Template, TemplateRegistry, Value, Variables, FIRST_KEY, INDEX_KEY, ITEM_KEY, LAST_KEY,
};
use tracing::info;

use super::resolve_template;
use crate::{vars, VarArgs};

/// Problems found in one template.
#[derive(Debug, Default, PartialEq)]
pub struct Report {
    pub issues: Vec<String>,
}

impl Report {
    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }
}

/// Checks `template` for unmatched directives and, when `variables` is
/// given, for names it reads that nothing binds.
///
/// Inside a `FOREACH` body a name counts as bound when it is iteration
/// metadata, an outer variable, or a key of at least one item of the
/// sequence. Bodies over missing or empty sequences never render and are
/// not checked.
pub fn inspect(template: &Template, variables: Option<&Variables>) -> Report {
    let mut issues: Vec<String> = template
        .unmatched()
        .iter()
        .map(ToString::to_string)
        .collect();

    if let Some(variables) = variables {
        let mut unbound = BTreeSet::new();
        Coverage { root: variables }.walk(template.nodes(), &[], &mut unbound);
        issues.extend(
            unbound
                .into_iter()
                .map(|name| format!("unbound variable {}", name)),
        );
    }

    Report { issues }
}

const METADATA_KEYS: [&str; 4] = [INDEX_KEY, FIRST_KEY, LAST_KEY, ITEM_KEY];

/// Walks the directive tree tracking the item mappings of every enclosing
/// `FOREACH`, outermost first.
struct Coverage<'v> {
    root: &'v Variables,
}

impl<'v> Coverage<'v> {
    fn walk(&self, nodes: &[Node], frames: &[Vec<&'v Variables>], unbound: &mut BTreeSet<String>) {
        for node in nodes {
            match node {
                Node::Text(_) => {}
                Node::Variable(var) => self.check(&var.name, frames, unbound),
                Node::If(block) => {
                    self.check(&block.name, frames, unbound);
                    self.walk(&block.then_branch, frames, unbound);
                    if let Some(else_branch) = &block.else_branch {
                        self.walk(else_branch, frames, unbound);
                    }
                }
                Node::Foreach(block) => {
                    self.check(&block.name, frames, unbound);
                    let items: Vec<&'v Value> = self
                        .lookup_all(&block.name, frames)
                        .into_iter()
                        .filter_map(Value::as_seq)
                        .flatten()
                        .collect();
                    if items.is_empty() {
                        continue;
                    }

                    let mut inner = frames.to_vec();
                    inner.push(items.into_iter().filter_map(Value::as_map).collect());
                    self.walk(&block.body, &inner, unbound);
                }
            }
        }
    }

    fn check(&self, name: &str, frames: &[Vec<&'v Variables>], unbound: &mut BTreeSet<String>) {
        let metadata = !frames.is_empty() && METADATA_KEYS.contains(&name);
        if !metadata && self.lookup_all(name, frames).is_empty() {
            unbound.insert(name.to_string());
        }
    }

    /// Every value `name` resolves to, in the root mapping or any item.
    fn lookup_all(&self, name: &str, frames: &[Vec<&'v Variables>]) -> Vec<&'v Value> {
        let (head, rest): (&str, Vec<&str>) = match name.split_once('.') {
            Some((head, rest)) => (head, rest.split('.').collect()),
            None => (name, Vec::new()),
        };

        std::iter::once(self.root)
            .chain(frames.iter().flatten().copied())
            .filter_map(|scope| scope.get(name).or_else(|| scope.get(head)?.get_path(&rest)))
            .collect()
    }
}

pub fn execute(registry: &TemplateRegistry, template: &str, var_args: &VarArgs) -> Result<ExitCode> {
    let source = resolve_template(registry, template)?;
    let variables = if vars::supplied(var_args) {
        Some(vars::load(var_args)?)
    } else {
        None
    };

    let report = inspect(&Template::parse(&source.text), variables.as_ref());
    for issue in &report.issues {
        println!("{}: {}", source.label, issue);
    }

    if report.is_clean() {
        info!(template = %source.label, "no issues found");
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(1))
    }
}

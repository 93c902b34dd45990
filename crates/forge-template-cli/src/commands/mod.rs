//! Command implementations for the forge-template CLI.
//!
//! Each command handles its CLI surface and delegates template work to the
//! `forge_template` library.

pub mod check;
pub mod list;
pub mod render;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use forge_template::TemplateRegistry;
use tracing::debug;

/// Builds the registry from every `--template-dir`.
pub fn load_registry(dirs: &[PathBuf]) -> Result<TemplateRegistry> {
    let mut registry = TemplateRegistry::new();
    for dir in dirs {
        registry
            .add_template_dir(dir)
            .with_context(|| format!("loading templates from {}", dir.display()))?;
    }
    Ok(registry)
}

/// Template text plus a label for messages.
#[derive(Debug)]
pub struct TemplateSource {
    pub label: String,
    pub text: String,
}

/// Resolves `template` as a file path first, then as a registered name.
pub fn resolve_template(registry: &TemplateRegistry, template: &str) -> Result<TemplateSource> {
    let path = Path::new(template);
    if path.is_file() {
        debug!(path = %path.display(), "reading template file");
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading template {}", path.display()))?;
        return Ok(TemplateSource {
            label: path.display().to_string(),
            text,
        });
    }

    let text = registry
        .get(template)
        .with_context(|| format!("{} is neither a file nor a registered template", template))?;
    Ok(TemplateSource {
        label: template.to_string(),
        text: text.to_string(),
    })
}

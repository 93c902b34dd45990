//! `render` command: render a template to stdout or a file.

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use forge_template::{Renderer, Template, TemplateRegistry};
use tracing::{info, warn};

use super::resolve_template;
use crate::{vars, VarArgs};

/// Options for one `render` invocation.
pub struct RenderOptions {
    pub registry: TemplateRegistry,
    pub template: String,
    /// `None` renders without a mapping (`--no-vars`).
    pub vars: Option<VarArgs>,
    pub output: Option<PathBuf>,
    pub float_suffix: String,
}

pub fn execute(options: RenderOptions) -> Result<ExitCode> {
    let source = resolve_template(&options.registry, &options.template)?;
    let variables = options.vars.as_ref().map(vars::load).transpose()?;

    let template = Template::parse(&source.text);
    for diagnostic in template.unmatched() {
        warn!(template = %source.label, "{}", diagnostic);
    }

    let renderer = Renderer::new().with_float_suffix(options.float_suffix);
    let output = match &variables {
        Some(variables) => renderer.render_template(&template, variables),
        None => renderer.render_optional(Some(source.text.as_str()), None),
    };

    match options.output {
        Some(path) => {
            write_output(&path, &output)?;
            info!(path = %path.display(), bytes = output.len(), "wrote rendered template");
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(output.as_bytes())
                .and_then(|()| stdout.flush())
                .context("writing to stdout")?;
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// Writes `content` to `path`, creating parent directories.
fn write_output(path: &std::path::Path, content: &str) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating directory {}", parent.display()))?;
    }
    std::fs::write(path, content).with_context(|| format!("writing {}", path.display()))
}

//! `list` command: print registered template names.

use std::process::ExitCode;

use anyhow::Result;
use forge_template::TemplateRegistry;
use tracing::warn;

pub fn execute(registry: &TemplateRegistry) -> Result<ExitCode> {
    if registry.is_empty() {
        warn!("no templates registered; pass --template-dir DIR");
    }
    for name in registry.names() {
        println!("{}", name);
    }
    Ok(ExitCode::SUCCESS)
}

//! forge-template CLI - render code-generation templates outside the editor.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod vars;

#[derive(Parser)]
#[command(name = "forge-template")]
#[command(version)]
#[command(about = "Render code-generation templates with variables, IF/ELSE and FOREACH blocks", long_about = None)]
struct Cli {
    /// Directory of named templates (repeatable)
    #[arg(long = "template-dir", global = true, value_name = "DIR")]
    template_dirs: Vec<PathBuf>,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

/// Variable sources shared by `render` and `check`.
#[derive(Args, Debug, Default)]
pub struct VarArgs {
    /// JSON or YAML file with the variable mapping
    #[arg(long = "vars", value_name = "FILE")]
    pub vars_file: Option<PathBuf>,

    /// Set a top-level variable (KEY=VALUE, repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE")]
    pub assignments: Vec<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a template file or registered template
    Render {
        /// Template file path or registered template name
        template: String,

        #[command(flatten)]
        vars: VarArgs,

        /// Write output to FILE instead of stdout
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Suffix appended to floating-point values
        #[arg(long, value_name = "SUFFIX", default_value = forge_template::DEFAULT_FLOAT_SUFFIX)]
        float_suffix: String,

        /// Render without a variable mapping (template passes through unchanged)
        #[arg(long, conflicts_with_all = ["vars_file", "assignments"])]
        no_vars: bool,
    },

    /// Report unmatched directives and unbound variables
    Check {
        /// Template file path or registered template name
        template: String,

        #[command(flatten)]
        vars: VarArgs,
    },

    /// List templates registered from --template-dir
    List,
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("forge_template={}", level).into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let registry = commands::load_registry(&cli.template_dirs)?;

    match cli.command {
        Commands::Render {
            template,
            vars,
            output,
            float_suffix,
            no_vars,
        } => commands::render::execute(commands::render::RenderOptions {
            registry,
            template,
            vars: (!no_vars).then_some(vars),
            output,
            float_suffix,
        }),
        Commands::Check { template, vars } => commands::check::execute(&registry, &template, &vars),
        Commands::List => commands::list::execute(&registry),
    }
}

mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::run::RunExit;
use std::path::PathBuf;
use tracing_subscriber::filter::LevelFilter;

#[derive(Parser)]
#[command(
    name = "retrofit",
    about = "Run your framework CLI and install whatever it cannot resolve",
    version,
    propagate_version = true
)]
struct Cli {
    /// Project root (default: nearest ancestor with package.json)
    #[arg(long, global = true, env = "RETROFIT_ROOT")]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the framework, installing missing packages and retrying
    Run {
        /// Arguments passed to the framework unchanged
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },

    /// Show the detected project root and package manager
    Detect {
        /// Output as JSON
        #[arg(long, short = 'j')]
        json: bool,
    },

    /// Set up Tailwind (configs, css directives, devDependencies)
    Tailwind,

    /// Rewrite an import prefix in files git reports as changed or new
    FixImports {
        /// Prefix emitted by the generator
        #[arg(long, default_value = "@/")]
        from: String,

        /// Prefix your project resolves
        #[arg(long)]
        to: String,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            // RUST_LOG wins; warn when it is unset.
            tracing_subscriber::EnvFilter::builder()
                .with_default_directive(LevelFilter::WARN.into())
                .from_env_lossy(),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let project = root::resolve_root(cli.root.as_deref());

    let result = match cli.command {
        Commands::Run { args } => cmd::run::run(&project, args),
        Commands::Detect { json } => cmd::detect::run(&project, json),
        Commands::Tailwind => cmd::tailwind::run(&project),
        Commands::FixImports { from, to } => cmd::imports::run(&project, &from, &to),
    };

    if let Err(e) = result {
        // The wrapped process already printed its own diagnostics.
        if let Some(exit) = e.downcast_ref::<RunExit>() {
            std::process::exit(exit.exit_code());
        }
        // Print the full error chain (anyhow's alternate Display)
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

mod cmd;
mod output;
mod root;

use clap::{Parser, Subcommand};
use cmd::FetchArgs;
use lazyload_core::LoadMode;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "lazyload",
    about = "Load application packages on demand: plan, run and inspect lazy package manifests",
    version,
    propagate_version = true
)]
struct Cli {
    /// Application manifest (default: nearest lazyload.yaml upward from cwd)
    #[arg(long, global = true, env = "LAZYLOAD_CONFIG")]
    config: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true, short = 'j')]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a starter manifest if none exists
    Init {
        /// Application name recorded in the manifest
        #[arg(long, default_value = "App")]
        name: String,
    },

    /// Validate the manifest
    Check,

    /// List the assets every package would fetch, in order
    Plan {
        /// Override the manifest's load mode (build or dev)
        #[arg(long)]
        mode: Option<LoadMode>,
    },

    /// Load every package and report when the application may start
    Run {
        #[command(flatten)]
        fetch: FetchArgs,
    },

    /// Render one lazy panel and print its load sequence
    Panel {
        /// Module (or panel id) to render
        module: String,

        /// Namespaces to treat as already loaded
        #[arg(long = "loaded", value_name = "NAMESPACE")]
        loaded: Vec<String>,

        #[command(flatten)]
        fetch: FetchArgs,
    },
}

fn main() {
    let cli = Cli::parse();

    let default_level = match &cli.command {
        Commands::Run { .. } | Commands::Panel { .. } => tracing::Level::INFO,
        _ => tracing::Level::WARN,
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let config_path = root::resolve_config(cli.config.as_deref());

    let result = match cli.command {
        Commands::Init { name } => cmd::init::run(&config_path, &name),
        Commands::Check => cmd::check::run(&config_path, cli.json),
        Commands::Plan { mode } => cmd::plan::run(&config_path, mode, cli.json),
        Commands::Run { fetch } => cmd::run::run(&config_path, &fetch, cli.json),
        Commands::Panel {
            module,
            loaded,
            fetch,
        } => cmd::panel::run(&config_path, &module, &loaded, &fetch, cli.json),
    };

    if let Err(e) = result {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

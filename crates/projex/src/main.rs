//! Projex - snapshot project folders and apply file operations back.
//!
//! This is the main entry point for the projex CLI.

mod commands;

use clap::{Parser, Subcommand};
use commands::*;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "projex")]
#[command(
    author,
    version,
    about = "Snapshot project folders into a single document and apply file operations back",
    long_about = None
)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Size of the file classification pool
    #[arg(long, global = true)]
    max_workers: Option<usize>,

    /// Directory name to exclude from snapshots (repeatable, replaces the defaults)
    #[arg(long = "exclude", global = true)]
    exclude: Vec<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export a directory to a Markdown document
    Export {
        /// Directory to export
        path: PathBuf,
        /// Write the document here instead of the run store
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print the folder structure of a directory
    Tree {
        /// Directory to render
        path: PathBuf,
    },
    /// Apply a JSON array of file operations to a project root
    Apply {
        /// Project root
        root: PathBuf,
        /// Operations file, or `-` for stdin
        #[arg(default_value = "-")]
        input: String,
    },
    /// Start the HTTP server
    Serve {
        /// Address to bind to
        #[arg(short, long)]
        address: Option<String>,
    },
    /// Show configuration
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cwd = std::env::current_dir()?;

    let (mut config, sources) = projex_core::Config::load(Some(&cwd)).await?;
    if let Some(workers) = cli.max_workers {
        config.max_workers = Some(workers);
    }
    if !cli.exclude.is_empty() {
        config.excluded_dirs = Some(cli.exclude.clone());
    }

    let serving = matches!(cli.command, Commands::Serve { .. });
    let log_file = init_logging(&config, cli.verbose, serving);
    if let Some(path) = &log_file {
        tracing::debug!(path = %path.display(), "Logging to file");
    }

    match cli.command {
        Commands::Export { path, output } => handle_export(&config, &path, output).await,
        Commands::Tree { path } => handle_tree(&config, &path).await,
        Commands::Apply { root, input } => handle_apply(&root, &input).await,
        Commands::Serve { address } => {
            if let Some(address) = address {
                let server = config.server.get_or_insert_with(Default::default);
                server.address = Some(address);
            }
            run_server(&config).await
        }
        Commands::Config => show_config(&config, &sources),
    }
}

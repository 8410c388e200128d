//! Strata CLI entry point

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod config;

use config::Config;

#[derive(Parser)]
#[command(name = "strata")]
#[command(about = "Mine the structural history of a JavaScript repository", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Configuration file (defaults to ./strata.toml when present)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Walk every commit reachable from a branch and record per-edge diffs
    Mine {
        /// Path of the git repository
        repo: PathBuf,

        /// Branch or revision to start from
        branch: String,

        /// Output directory (overrides the config file)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Rebuild and print the classes and methods of one version
    Replay {
        /// Commit id or unique prefix
        version: String,

        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Print per-edge operation counts and method churn
    Analyze {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Remove the output directory
    Clear {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Show version
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    dotenvy::dotenv().ok();

    // Initialize logging; RUST_LOG wins over --verbose
    let log_level = if cli.verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!(
            "strata={log_level},strata_core={log_level},strata_parser={log_level},strata_history={log_level}"
        ))
    });
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let config = Config::load(cli.config.as_deref())?;

    match cli.command {
        Commands::Mine { repo, branch, output } => {
            commands::mine(repo, branch, with_output(config, output)).await
        }
        Commands::Replay { version, output } => commands::replay(&version, &with_output(config, output)),
        Commands::Analyze { output } => commands::analyze(&with_output(config, output)),
        Commands::Clear { output } => commands::clear(&with_output(config, output)),
        Commands::Version => {
            println!("Strata v{}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn with_output(mut config: Config, output: Option<PathBuf>) -> Config {
    if let Some(output) = output {
        config.output_dir = output;
    }
    config
}

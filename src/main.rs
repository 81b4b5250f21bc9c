//! Precache - offline-first cache proxy tooling
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use precache::cli::{Cli, Commands, LogFormat};
use precache::config::ConfigManager;
use precache::error::{PrecacheError, PrecacheResult};
use precache::version::VersionTag;
use std::process::ExitCode;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {}", style("Error:").red().bold(), e);
            if let Some(hint) = e.hint() {
                eprintln!("{} {}", style("Hint:").yellow(), hint);
            }
            ExitCode::from(e.exit_code())
        }
    }
}

async fn run() -> PrecacheResult<()> {
    let cli = Cli::parse();

    let root = match cli.root {
        Some(ref root) => root.clone(),
        None => std::env::current_dir()
            .map_err(|e| PrecacheError::io("getting current directory", e))?,
    };

    // A malformed tag is a usage error whatever state the config file is in
    if let Commands::Bump(ref args) = cli.command {
        VersionTag::parse(&args.tag)?;
    }

    let config_manager = match cli.config {
        Some(ref path) => ConfigManager::with_path(path.clone()),
        None => ConfigManager::for_root(&root),
    };
    let config = config_manager.load().await?;

    // 0 = warn, 1 = info, 2+ = debug
    let filter = match cli.verbose {
        0 => EnvFilter::new("precache=warn"),
        1 => EnvFilter::new("precache=info"),
        _ => EnvFilter::new("precache=debug"),
    };
    let format = cli
        .log_format
        .unwrap_or_else(|| LogFormat::from_config(&config.general.log_format));

    match format {
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .without_time()
            .with_writer(std::io::stderr)
            .init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .without_time()
            .with_writer(std::io::stderr)
            .init(),
    }

    debug!(
        "Site root {}, config {}",
        root.display(),
        config_manager.path().display()
    );

    match cli.command {
        Commands::Bump(args) => precache::cli::commands::bump(args, &root, &config).await,
        Commands::Validate(args) => precache::cli::commands::validate(args, &root, &config).await,
        Commands::Generate(args) => precache::cli::commands::generate(args, &root, &config).await,
        Commands::Warm(args) => precache::cli::commands::warm(args, &root, &config).await,
        Commands::Config(args) => {
            precache::cli::commands::config(args, &config_manager, &config).await
        }
    }
}

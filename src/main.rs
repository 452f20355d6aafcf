//! Depot - artifact repository content router
//!
//! CLI entry point that dispatches to subcommands.

use clap::Parser;
use console::style;
use depot::cli::{commands, Cli, Commands};
use depot::config::{Config, ConfigManager};
use depot::error::DepotResult;
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
            ExitCode::FAILURE
        }
    }
}

fn init_logging(verbose: u8, config: &Config) {
    // 0 = warn, 1 = info, 2+ = debug
    let filter = match verbose {
        0 => EnvFilter::new("depot=warn"),
        1 => EnvFilter::new("depot=info"),
        _ => EnvFilter::new("depot=debug"),
    };

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr);

    if config.general.log_format == "json" {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run() -> DepotResult<()> {
    let cli = Cli::parse();

    let config_manager = ConfigManager::resolve(cli.config.clone());
    let config = config_manager.load().await?;

    init_logging(cli.verbose, &config);
    debug!("Using config {}", config_manager.path().display());

    match cli.command {
        Commands::Get(args) => commands::get(args, &config).await,
        Commands::Put(args) => commands::put(args, &config).await,
        Commands::Delete(args) => commands::delete(args, &config).await,
        Commands::Ls(args) => commands::ls(args, &config).await,
        Commands::Exists(args) => commands::exists(args, &config).await,
        Commands::Members(args) => commands::members(args, &config).await,
        Commands::Stores(args) => commands::stores(args, &config).await,
        Commands::Config(args) => commands::config(args, &config, &config_manager).await,
    }
}

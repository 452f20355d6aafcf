//! Put command - upload content into a store

use crate::cli::args::PutArgs;
use crate::config::{Config, ConfigManager};
use crate::error::{DepotError, DepotResult};
use crate::factory::Depot;
use console::style;

/// Execute the put command
pub async fn execute(args: PutArgs, config: &Config) -> DepotResult<()> {
    let content = tokio::fs::read(&args.file)
        .await
        .map_err(|e| DepotError::io(format!("reading {}", args.file.display()), e))?;

    ConfigManager::ensure_data_dirs(config).await?;
    let depot = Depot::from_config(config).await?;
    let store = depot.store(&args.store).await?;

    let transfer = depot.content.store(&store, &args.path, &content).await?;
    println!(
        "{} {} in {}",
        style("Stored").green(),
        transfer.path(),
        style(transfer.store_key()).cyan()
    );

    Ok(())
}

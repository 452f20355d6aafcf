//! Get command - fetch content from a store

use crate::cli::args::GetArgs;
use crate::config::Config;
use crate::error::{DepotError, DepotResult};
use crate::factory::Depot;
use console::style;
use tokio::io::AsyncWriteExt;

/// Execute the get command
pub async fn execute(args: GetArgs, config: &Config) -> DepotResult<()> {
    let depot = Depot::from_config(config).await?;
    let store = depot.store(&args.store).await?;

    let transfer = depot
        .content
        .retrieve(&store, &args.path)
        .await?
        .ok_or_else(|| DepotError::User(format!("{} not found in {}", args.path, args.store)))?;
    let content = transfer.read().await?;

    match args.output {
        Some(output) => {
            tokio::fs::write(&output, &content)
                .await
                .map_err(|e| DepotError::io(format!("writing {}", output.display()), e))?;
            eprintln!(
                "{} {} ({} bytes from {})",
                style("Saved").green(),
                output.display(),
                content.len(),
                transfer.store_key()
            );
        }
        None => {
            let mut stdout = tokio::io::stdout();
            stdout
                .write_all(&content)
                .await
                .map_err(|e| DepotError::io("writing to stdout", e))?;
            stdout
                .flush()
                .await
                .map_err(|e| DepotError::io("writing to stdout", e))?;
        }
    }

    Ok(())
}

//! Exists command - check for content

use crate::cli::args::ExistsArgs;
use crate::config::Config;
use crate::error::{DepotError, DepotResult};
use crate::factory::Depot;
use console::style;

/// Execute the exists command. Missing content is reported as an error so
/// the exit status can be scripted against.
pub async fn execute(args: ExistsArgs, config: &Config) -> DepotResult<()> {
    let depot = Depot::from_config(config).await?;
    let store = depot.store(&args.store).await?;

    if depot.content.exists(&store, &args.path).await? {
        println!("{} {} exists in {}", style("✓").green(), args.path, args.store);
        Ok(())
    } else {
        Err(DepotError::User(format!(
            "{} not found in {}",
            args.path, args.store
        )))
    }
}

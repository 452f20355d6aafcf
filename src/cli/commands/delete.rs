//! Delete command - remove content from a store

use crate::cli::args::DeleteArgs;
use crate::config::Config;
use crate::error::{DepotError, DepotResult};
use crate::factory::Depot;
use console::style;

/// Execute the delete command
pub async fn execute(args: DeleteArgs, config: &Config) -> DepotResult<()> {
    let depot = Depot::from_config(config).await?;
    let store = depot.store(&args.store).await?;

    if !depot.content.delete(&store, &args.path).await? {
        return Err(DepotError::User(format!(
            "{} not found in {}",
            args.path, args.store
        )));
    }

    println!("{} {} from {}", style("Deleted").green(), args.path, args.store);
    Ok(())
}

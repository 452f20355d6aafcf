//! Stores command - list store definitions

use crate::cli::args::{OutputFormat, StoresArgs};
use crate::config::Config;
use crate::error::DepotResult;
use crate::factory::Depot;
use crate::store::{ArtifactStore, StoreKind};
use console::style;

/// Execute the stores command
pub async fn execute(args: StoresArgs, config: &Config) -> DepotResult<()> {
    let depot = Depot::from_config(config).await?;
    let stores = depot.catalog.all_stores(None).await?;

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&stores)?),
        OutputFormat::Plain => {
            for store in &stores {
                println!("{}", store.key());
            }
        }
        OutputFormat::Table => print_table(&stores),
    }

    Ok(())
}

fn details(store: &ArtifactStore) -> String {
    match &store.kind {
        StoreKind::Hosted => String::new(),
        StoreKind::Remote { url } => url.clone(),
        StoreKind::Group { constituents } => constituents
            .iter()
            .map(|k| k.to_string())
            .collect::<Vec<_>>()
            .join(", "),
    }
}

fn print_table(stores: &[ArtifactStore]) {
    if stores.is_empty() {
        println!("{}", style("No stores defined").dim());
        return;
    }

    println!(
        "{:<30} {:<10} {:<50}",
        style("KEY").bold(),
        style("STATE").bold(),
        style("DETAILS").bold()
    );
    println!("{}", "-".repeat(90));

    for store in stores {
        let state = if store.disabled {
            style("disabled").dim()
        } else {
            style("enabled").green()
        };
        println!("{:<30} {:<10} {:<50}", store.key(), state, details(store));
    }

    println!();
    println!("{} store(s)", stores.len());
}

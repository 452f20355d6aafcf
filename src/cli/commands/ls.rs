//! Ls command - list a directory in a store

use crate::cli::args::{LsArgs, OutputFormat};
use crate::config::Config;
use crate::error::DepotResult;
use crate::factory::Depot;
use crate::transfer::StoreResource;
use console::style;

/// Execute the ls command
pub async fn execute(args: LsArgs, config: &Config) -> DepotResult<()> {
    let depot = Depot::from_config(config).await?;
    let store = depot.store(&args.store).await?;
    let listed = depot.content.list(&store, &args.path).await?;

    match args.format {
        OutputFormat::Table => print_table(&listed),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&listed)?),
        OutputFormat::Plain => {
            for resource in &listed {
                println!("{}", resource.path);
            }
        }
    }

    Ok(())
}

fn print_table(listed: &[StoreResource]) {
    if listed.is_empty() {
        println!("{}", style("(empty)").dim());
        return;
    }

    println!("{:<50} {:<30}", style("PATH").bold(), style("STORE").bold());
    println!("{}", "-".repeat(80));

    for resource in listed {
        let path = if resource.is_dir {
            style(resource.path.as_str()).blue()
        } else {
            style(resource.path.as_str())
        };
        println!("{:<50} {:<30}", path, resource.key);
    }

    println!();
    println!("{} entr{}", listed.len(), if listed.len() == 1 { "y" } else { "ies" });
}

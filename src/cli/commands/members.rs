//! Members command - show group resolution order

use crate::cli::args::{MembersArgs, OutputFormat};
use crate::config::Config;
use crate::error::DepotResult;
use crate::factory::Depot;
use crate::store::{StoreKey, StoreType};
use console::style;

/// Execute the members command
pub async fn execute(args: MembersArgs, config: &Config) -> DepotResult<()> {
    let name = args.group.strip_prefix("group:").unwrap_or(&args.group);
    let depot = Depot::from_config(config).await?;
    depot.store(&StoreKey::group(name)).await?;

    let members = depot
        .catalog
        .ordered_concrete_stores_in_group(name, args.include_groups)
        .await?;
    let keys: Vec<StoreKey> = members.iter().map(|m| m.key()).collect();

    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&keys)?),
        OutputFormat::Plain => {
            for key in &keys {
                println!("{}", key);
            }
        }
        OutputFormat::Table => {
            if members.is_empty() {
                println!("{}", style("(no members)").dim());
                return Ok(());
            }
            for (position, member) in members.iter().enumerate() {
                let key = match member.store_type() {
                    StoreType::Group => style(member.key().to_string()).yellow(),
                    _ => style(member.key().to_string()).cyan(),
                };
                let note = if member.disabled {
                    style(" (disabled)").dim().to_string()
                } else {
                    String::new()
                };
                println!("{:>3}. {}{}", position + 1, key, note);
            }
        }
    }

    Ok(())
}

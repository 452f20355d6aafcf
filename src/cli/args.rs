//! CLI argument definitions using clap derive

use crate::store::StoreKey;
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Depot - artifact repository content router
///
/// Serves content from hosted, remote, and group repositories, resolving
/// groups to their members in priority order.
#[derive(Parser, Debug)]
#[command(name = "depot")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "DEPOT_CONFIG")]
    pub config: Option<PathBuf>,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch content from a store
    Get(GetArgs),

    /// Upload content into a store
    Put(PutArgs),

    /// Delete content from a store
    Delete(DeleteArgs),

    /// List a directory in a store
    Ls(LsArgs),

    /// Check whether a store has content
    Exists(ExistsArgs),

    /// Show a group's members in retrieval order
    Members(MembersArgs),

    /// List store definitions
    Stores(StoresArgs),

    /// Show or initialize configuration
    Config(ConfigArgs),
}

/// Arguments for the get command
#[derive(Parser, Debug)]
pub struct GetArgs {
    /// Store key (e.g., group:public)
    pub store: StoreKey,

    /// Content path
    pub path: String,

    /// Write content to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the put command
#[derive(Parser, Debug)]
pub struct PutArgs {
    /// Store key (e.g., hosted:local)
    pub store: StoreKey,

    /// Content path
    pub path: String,

    /// File to upload
    pub file: PathBuf,
}

/// Arguments for the delete command
#[derive(Parser, Debug)]
pub struct DeleteArgs {
    /// Store key
    pub store: StoreKey,

    /// Content path
    pub path: String,
}

/// Arguments for the ls command
#[derive(Parser, Debug)]
pub struct LsArgs {
    /// Store key
    pub store: StoreKey,

    /// Directory path (defaults to the store root)
    #[arg(default_value = "")]
    pub path: String,

    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the exists command
#[derive(Parser, Debug)]
pub struct ExistsArgs {
    /// Store key
    pub store: StoreKey,

    /// Content path
    pub path: String,
}

/// Arguments for the members command
#[derive(Parser, Debug)]
pub struct MembersArgs {
    /// Group name, with or without the `group:` prefix
    pub group: String,

    /// Include nested groups in the output
    #[arg(long)]
    pub include_groups: bool,

    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the stores command
#[derive(Parser, Debug)]
pub struct StoresArgs {
    /// Output format
    #[arg(short, long, default_value = "table")]
    pub format: OutputFormat,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write the default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

/// Output format for listing commands
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (one per line)
    Plain,
}

//! CLI command implementations

pub mod config;
pub mod delete;
pub mod exists;
pub mod get;
pub mod ls;
pub mod members;
pub mod put;
pub mod stores;

pub use config::execute as config;
pub use delete::execute as delete;
pub use exists::execute as exists;
pub use get::execute as get;
pub use ls::execute as ls;
pub use members::execute as members;
pub use put::execute as put;
pub use stores::execute as stores;

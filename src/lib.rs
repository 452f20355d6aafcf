//! Depot - artifact repository content router
//!
//! Serves content out of hosted repositories, remote proxies, and groups
//! that aggregate other stores in priority order. Group lookups are
//! accelerated by a content index and a not-found cache.

pub mod catalog;
pub mod cli;
pub mod config;
pub mod content;
pub mod error;
pub mod factory;
pub mod index;
pub mod nfc;
pub mod store;
pub mod transfer;

#[cfg(test)]
mod testing;

pub use error::{DepotError, DepotResult};
pub use factory::Depot;

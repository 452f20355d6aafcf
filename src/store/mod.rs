//! Store model
//!
//! Stores are hosted repositories, remote proxies, or groups of other
//! stores. Groups reference their members by key, so membership forms a
//! graph that may contain diamonds and cycles.

pub mod artifact;
pub mod key;
pub mod location;

pub use artifact::{ArtifactStore, PathMask, StoreKind};
pub use key::{StoreKey, StoreType};
pub use location::{ConcreteResource, Location};

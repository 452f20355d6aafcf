//! Store keys
//!
//! A key is the `(type, name)` pair identifying a store. Its textual form is
//! `type:name`, which is also how keys are serialized.

use crate::error::DepotError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kind of store a key refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreType {
    /// Repository whose content is uploaded into this system
    Hosted,
    /// Proxy of content living at a remote location
    Remote,
    /// Ordered aggregation of other stores
    Group,
}

impl StoreType {
    /// All store types, in a stable order
    pub const ALL: [StoreType; 3] = [Self::Hosted, Self::Remote, Self::Group];

    /// Lowercase name used in keys and on disk
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hosted => "hosted",
            Self::Remote => "remote",
            Self::Group => "group",
        }
    }
}

impl fmt::Display for StoreType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StoreType {
    type Err = DepotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hosted" => Ok(Self::Hosted),
            "remote" => Ok(Self::Remote),
            "group" => Ok(Self::Group),
            other => Err(DepotError::InvalidStoreKey(other.to_string())),
        }
    }
}

/// Identity of a store
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct StoreKey {
    store_type: StoreType,
    name: String,
}

impl StoreKey {
    pub fn new(store_type: StoreType, name: impl Into<String>) -> Self {
        Self {
            store_type,
            name: name.into(),
        }
    }

    pub fn hosted(name: impl Into<String>) -> Self {
        Self::new(StoreType::Hosted, name)
    }

    pub fn remote(name: impl Into<String>) -> Self {
        Self::new(StoreType::Remote, name)
    }

    pub fn group(name: impl Into<String>) -> Self {
        Self::new(StoreType::Group, name)
    }

    pub fn store_type(&self) -> StoreType {
        self.store_type
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_group(&self) -> bool {
        self.store_type == StoreType::Group
    }
}

impl fmt::Display for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.store_type, self.name)
    }
}

impl FromStr for StoreKey {
    type Err = DepotError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (store_type, name) = s
            .split_once(':')
            .ok_or_else(|| DepotError::InvalidStoreKey(s.to_string()))?;

        if name.is_empty() || name.contains('/') || name.contains("..") {
            return Err(DepotError::InvalidStoreKey(s.to_string()));
        }

        let store_type = store_type
            .parse()
            .map_err(|_| DepotError::InvalidStoreKey(s.to_string()))?;

        Ok(Self::new(store_type, name))
    }
}

impl TryFrom<String> for StoreKey {
    type Error = DepotError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<StoreKey> for String {
    fn from(key: StoreKey) -> Self {
        key.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_and_display() {
        let key: StoreKey = "group:public".parse().unwrap();
        assert_eq!(key, StoreKey::group("public"));
        assert_eq!(key.to_string(), "group:public");
        assert!(key.is_group());
    }

    #[test]
    fn parse_rejects_malformed() {
        assert!("public".parse::<StoreKey>().is_err());
        assert!("repository:public".parse::<StoreKey>().is_err());
        assert!("hosted:".parse::<StoreKey>().is_err());
        assert!("hosted:../etc".parse::<StoreKey>().is_err());
    }

    #[test]
    fn equality_covers_type() {
        assert_ne!(StoreKey::hosted("test"), StoreKey::remote("test"));
    }

    #[test]
    fn serializes_as_string() {
        let json = serde_json::to_string(&StoreKey::remote("central")).unwrap();
        assert_eq!(json, "\"remote:central\"");
        let back: StoreKey = serde_json::from_str(&json).unwrap();
        assert_eq!(back, StoreKey::remote("central"));
    }
}

/// Shared types used across the codebase

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Content operations evaluated by the access layer and the observer pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Read,
    Create,
    Update,
    Delete,
}

impl Operation {
    pub const ALL: [Operation; 4] = [
        Operation::Read,
        Operation::Create,
        Operation::Update,
        Operation::Delete,
    ];

    pub fn is_write(&self) -> bool {
        !matches!(self, Operation::Read)
    }
}

/// Collections managed by the CMS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Collection {
    Websites,
    Users,
    Pages,
    Media,
}

impl Collection {
    pub const ALL: [Collection; 4] = [
        Collection::Websites,
        Collection::Users,
        Collection::Pages,
        Collection::Media,
    ];

    /// Collections whose records carry a `website` owner reference
    pub const TENANT_SCOPED: [Collection; 2] = [Collection::Pages, Collection::Media];

    pub fn slug(&self) -> &'static str {
        match self {
            Collection::Websites => "websites",
            Collection::Users => "users",
            Collection::Pages => "pages",
            Collection::Media => "media",
        }
    }

    /// Table backing this collection in the relational store
    pub fn table_name(&self) -> &'static str {
        self.slug()
    }

    pub fn is_tenant_scoped(&self) -> bool {
        matches!(self, Collection::Pages | Collection::Media)
    }

    /// Fields with a storage-level uniqueness constraint
    pub fn unique_fields(&self) -> &'static [&'static str] {
        match self {
            Collection::Websites => &["domain", "slug"],
            Collection::Users => &["email"],
            Collection::Pages | Collection::Media => &[],
        }
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown collection: {0}")]
pub struct UnknownCollection(pub String);

impl FromStr for Collection {
    type Err = UnknownCollection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "websites" => Ok(Collection::Websites),
            "users" => Ok(Collection::Users),
            "pages" => Ok(Collection::Pages),
            "media" => Ok(Collection::Media),
            other => Err(UnknownCollection(other.to_string())),
        }
    }
}

use async_trait::async_trait;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::database::manager::DatabaseError;
use crate::filter::FilterData;
use crate::types::Collection;

/// A stored document, keyed by field name
pub type Record = Map<String, Value>;

/// One page of query results
#[derive(Debug, Clone, Default, Serialize)]
pub struct RecordPage {
    pub docs: Vec<Record>,
    /// Matching rows before pagination
    pub total: u64,
    pub limit: Option<i32>,
    pub offset: i32,
}

/// Persistence collaborator behind every collection.
///
/// Implementations enforce the declared unique fields (reported as
/// [`DatabaseError::UniqueViolation`]) and the referential actions of a website
/// deletion: memberships are removed from users and content ownership is
/// cleared.
#[async_trait]
pub trait Store: Send + Sync {
    async fn find(&self, collection: Collection, filter: &FilterData) -> Result<RecordPage, DatabaseError>;

    async fn find_by_id(&self, collection: Collection, id: &str) -> Result<Option<Record>, DatabaseError>;

    async fn insert(&self, collection: Collection, record: Record) -> Result<Record, DatabaseError>;

    /// Apply `changes` over the stored record and return the new state
    async fn update(&self, collection: Collection, id: &str, changes: Record) -> Result<Record, DatabaseError>;

    /// Remove the record and return its last state
    async fn delete(&self, collection: Collection, id: &str) -> Result<Record, DatabaseError>;

    async fn count(&self, collection: Collection, where_clause: &Value) -> Result<u64, DatabaseError>;

    /// Reachability check for health reporting
    async fn ping(&self) -> Result<(), DatabaseError> {
        Ok(())
    }
}

pub(crate) fn record_id(record: &Record) -> Option<&str> {
    record.get("id").and_then(Value::as_str)
}

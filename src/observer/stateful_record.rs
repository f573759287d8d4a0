use serde_json::Value;

use crate::database::store::Record;

/// A record moving through the write pipeline.
///
/// Keeps the stored state (`original`, loaded by ring 0 for updates and
/// deletes) apart from the incoming `changes`, so observers can reason about
/// both the request and the state that will result from it.
#[derive(Debug, Clone, Default)]
pub struct StatefulRecord {
    pub id: Option<String>,
    pub original: Option<Record>,
    pub changes: Record,
}

impl StatefulRecord {
    /// New record for CREATE (API-supplied data)
    pub fn create(data: Record) -> Self {
        Self {
            id: None,
            original: None,
            changes: data,
        }
    }

    /// Existing record addressed by id for UPDATE/DELETE
    pub fn existing(id: impl Into<String>, changes: Record) -> Self {
        Self {
            id: Some(id.into()),
            original: None,
            changes,
        }
    }

    /// Inject the stored state loaded from the database
    pub fn inject(&mut self, original: Record) {
        self.original = Some(original);
    }

    /// Current value: change if present, otherwise the stored value
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.changes
            .get(field)
            .or_else(|| self.original.as_ref().and_then(|o| o.get(field)))
    }

    pub fn original_value(&self, field: &str) -> Option<&Value> {
        self.original.as_ref().and_then(|o| o.get(field))
    }

    pub fn changed(&self, field: &str) -> bool {
        self.changes.contains_key(field)
    }

    pub fn set(&mut self, field: &str, value: Value) {
        self.changes.insert(field.to_string(), value);
    }

    pub fn remove(&mut self, field: &str) -> Option<Value> {
        self.changes.remove(field)
    }

    /// Stored state with the changes applied on top
    pub fn merged(&self) -> Record {
        let mut merged = self.original.clone().unwrap_or_default();
        for (k, v) in &self.changes {
            merged.insert(k.clone(), v.clone());
        }
        merged
    }
}

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::database::manager::DatabaseError;
use crate::database::store::{record_id, Record, RecordPage, Store};
use crate::filter::{matcher, FilterData};
use crate::types::Collection;

/// In-process [`Store`] keeping records in insertion order.
///
/// Used by tests and local tooling; evaluates filters with the same
/// semantics as the SQL rendering.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<BTreeMap<Collection, Vec<Record>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn check_unique(
        collection: Collection,
        rows: &[Record],
        candidate: &Record,
        except_id: Option<&str>,
    ) -> Result<(), DatabaseError> {
        for field in collection.unique_fields() {
            let Some(value) = candidate.get(*field).filter(|v| !v.is_null()) else {
                continue;
            };
            let clash = rows
                .iter()
                .filter(|row| record_id(row) != except_id)
                .any(|row| row.get(*field) == Some(value));
            if clash {
                return Err(DatabaseError::UniqueViolation { collection, field: field.to_string() });
            }
        }
        Ok(())
    }

    /// Referential actions for a removed website
    fn detach_website(tables: &mut BTreeMap<Collection, Vec<Record>>, website_id: &str) {
        let target = Value::String(website_id.to_string());

        if let Some(users) = tables.get_mut(&Collection::Users) {
            for user in users.iter_mut() {
                if let Some(Value::Array(websites)) = user.get_mut("websites") {
                    websites.retain(|w| w != &target);
                }
                if user.get("default_website") == Some(&target) {
                    user.insert("default_website".to_string(), Value::Null);
                }
            }
        }

        for collection in Collection::TENANT_SCOPED {
            if let Some(rows) = tables.get_mut(&collection) {
                for row in rows.iter_mut().filter(|row| row.get("website") == Some(&target)) {
                    row.insert("website".to_string(), Value::Null);
                }
            }
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn find(&self, collection: Collection, filter: &FilterData) -> Result<RecordPage, DatabaseError> {
        let tables = self.tables.read().await;
        let rows = tables.get(&collection).cloned().unwrap_or_default();
        let max_limit = crate::config::config().api.max_page_size as usize;
        let (docs, total) = matcher::apply_filter(rows, filter, max_limit)?;
        Ok(RecordPage {
            docs,
            total: total as u64,
            limit: filter.limit,
            offset: filter.offset.unwrap_or(0),
        })
    }

    async fn find_by_id(&self, collection: Collection, id: &str) -> Result<Option<Record>, DatabaseError> {
        let tables = self.tables.read().await;
        Ok(tables
            .get(&collection)
            .and_then(|rows| rows.iter().find(|row| record_id(row) == Some(id)))
            .cloned())
    }

    async fn insert(&self, collection: Collection, mut record: Record) -> Result<Record, DatabaseError> {
        if record_id(&record).is_none() {
            record.insert("id".to_string(), Value::String(uuid::Uuid::new_v4().to_string()));
        }

        let mut tables = self.tables.write().await;
        let rows = tables.entry(collection).or_default();
        if rows.iter().any(|row| record_id(row) == record_id(&record)) {
            return Err(DatabaseError::UniqueViolation { collection, field: "id".to_string() });
        }
        Self::check_unique(collection, rows, &record, None)?;
        rows.push(record.clone());
        Ok(record)
    }

    async fn update(&self, collection: Collection, id: &str, changes: Record) -> Result<Record, DatabaseError> {
        let mut tables = self.tables.write().await;
        let rows = tables.entry(collection).or_default();

        let index = rows
            .iter()
            .position(|row| record_id(row) == Some(id))
            .ok_or_else(|| DatabaseError::NotFound(format!("{} {}", collection, id)))?;

        let mut merged = rows[index].clone();
        for (k, v) in changes {
            if k != "id" {
                merged.insert(k, v);
            }
        }
        Self::check_unique(collection, rows, &merged, Some(id))?;
        rows[index] = merged.clone();
        Ok(merged)
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<Record, DatabaseError> {
        let mut tables = self.tables.write().await;
        let rows = tables.entry(collection).or_default();

        let index = rows
            .iter()
            .position(|row| record_id(row) == Some(id))
            .ok_or_else(|| DatabaseError::NotFound(format!("{} {}", collection, id)))?;
        let removed = rows.remove(index);

        if collection == Collection::Websites {
            Self::detach_website(&mut tables, id);
        }
        Ok(removed)
    }

    async fn count(&self, collection: Collection, where_clause: &Value) -> Result<u64, DatabaseError> {
        let tables = self.tables.read().await;
        let mut total = 0;
        for row in tables.get(&collection).map(Vec::as_slice).unwrap_or_default() {
            if matcher::matches(where_clause, row)? {
                total += 1;
            }
        }
        Ok(total)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn enforces_unique_fields_independently() {
        let store = MemoryStore::new();
        store
            .insert(Collection::Websites, record(json!({ "id": "w1", "domain": "acme.com", "slug": "acme" })))
            .await
            .unwrap();

        let same_domain = store
            .insert(Collection::Websites, record(json!({ "id": "w2", "domain": "acme.com", "slug": "other" })))
            .await;
        assert!(matches!(same_domain, Err(DatabaseError::UniqueViolation { ref field, .. }) if field == "domain"));

        let same_slug = store
            .insert(Collection::Websites, record(json!({ "id": "w3", "domain": "other.com", "slug": "acme" })))
            .await;
        assert!(matches!(same_slug, Err(DatabaseError::UniqueViolation { ref field, .. }) if field == "slug"));
    }

    #[tokio::test]
    async fn update_may_keep_its_own_unique_values() {
        let store = MemoryStore::new();
        store.insert(Collection::Users, record(json!({ "id": "u1", "email": "a@example.com" }))).await.unwrap();
        let updated = store
            .update(Collection::Users, "u1", record(json!({ "email": "a@example.com", "name": "A" })))
            .await
            .unwrap();
        assert_eq!(updated["name"], "A");
    }

    #[tokio::test]
    async fn deleting_a_website_detaches_members_and_content() {
        let store = MemoryStore::new();
        store.insert(Collection::Websites, record(json!({ "id": "acme", "domain": "acme.com", "slug": "acme" }))).await.unwrap();
        store
            .insert(Collection::Users, record(json!({ "id": "u1", "email": "a@example.com", "websites": ["acme", "globex"], "default_website": "acme" })))
            .await
            .unwrap();
        store.insert(Collection::Pages, record(json!({ "id": "p1", "website": "acme" }))).await.unwrap();

        store.delete(Collection::Websites, "acme").await.unwrap();

        let user = store.find_by_id(Collection::Users, "u1").await.unwrap().unwrap();
        assert_eq!(user["websites"], json!(["globex"]));
        assert_eq!(user["default_website"], Value::Null);
        let page = store.find_by_id(Collection::Pages, "p1").await.unwrap().unwrap();
        assert_eq!(page["website"], Value::Null);
    }
}

// Ring 4: Enrichment - declared defaults, required fields and model shape
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::database::models::{Media, Page, User, Website};
use crate::database::schema::CollectionSchema;
use crate::database::store::Record;
use crate::observer::context::ObserverContext;
use crate::observer::error::ObserverError;
use crate::observer::traits::{Observer, ObserverRing, SyncObserver};
use crate::types::{Collection, Operation};

/// Last enrichment step: the state about to be written must satisfy the
/// collection schema for the current rollout phase.
#[derive(Default)]
pub struct SchemaConformanceObserver;

impl Observer for SchemaConformanceObserver {
    fn name(&self) -> &'static str {
        "SchemaConformanceObserver"
    }

    fn ring(&self) -> ObserverRing {
        ObserverRing::Enrichment
    }

    fn applies_to_operation(&self, op: Operation) -> bool {
        matches!(op, Operation::Create | Operation::Update)
    }

    fn priority(&self) -> u8 {
        90
    }
}

#[async_trait]
impl SyncObserver for SchemaConformanceObserver {
    async fn execute(&self, ctx: &mut ObserverContext) -> Result<(), ObserverError> {
        let schema = CollectionSchema::for_collection(ctx.collection);

        for record in ctx.records.iter_mut() {
            if let Some(unknown) = record.changes.keys().find(|k| !schema.is_known_field(k)) {
                return Err(ObserverError::ValidationError(format!(
                    "Unknown field '{}' for {}",
                    unknown, ctx.collection
                )));
            }

            if ctx.operation == Operation::Create {
                schema.apply_defaults(&mut record.changes);
            }

            let merged = record.merged();
            let missing = schema.missing_required(&merged, ctx.phase);
            if !missing.is_empty() {
                return Err(ObserverError::ValidationError(format!(
                    "Missing required fields for {}: {}",
                    ctx.collection,
                    missing.join(", ")
                )));
            }

            conform(ctx.collection, merged)?;
        }
        Ok(())
    }
}

/// Check the merged record against its typed model
fn conform(collection: Collection, merged: Record) -> Result<(), ObserverError> {
    match collection {
        Collection::Websites => parse::<Website>(collection, merged).map(drop),
        Collection::Users => parse::<User>(collection, merged).map(drop),
        Collection::Media => parse::<Media>(collection, merged).map(drop),
        Collection::Pages => {
            let page = parse::<Page>(collection, merged)?;
            for (idx, block) in page.layout.iter().enumerate() {
                block
                    .validate()
                    .map_err(|e| ObserverError::ValidationError(format!("layout[{}]: {}", idx, e)))?;
            }
            Ok(())
        }
    }
}

fn parse<T: DeserializeOwned>(collection: Collection, merged: Record) -> Result<T, ObserverError> {
    serde_json::from_value(Value::Object(merged))
        .map_err(|e| ObserverError::ValidationError(format!("Invalid {} record: {}", collection, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn rejects_unknown_role_names() {
        let user = record(json!({
            "id": "u1", "email": "a@example.com", "role": "owner",
            "created_at": "2025-01-01T00:00:00Z", "updated_at": "2025-01-01T00:00:00Z"
        }));
        assert!(matches!(conform(Collection::Users, user), Err(ObserverError::ValidationError(_))));
    }

    #[test]
    fn validates_page_layout_blocks() {
        let page = record(json!({
            "id": "p1", "title": "Home", "slug": "home", "status": "draft",
            "layout": [{ "block_type": "imageGallery", "images": [], "columns": 3 }],
            "created_at": "2025-01-01T00:00:00Z", "updated_at": "2025-01-01T00:00:00Z"
        }));
        let err = conform(Collection::Pages, page).unwrap_err();
        assert_eq!(err, ObserverError::ValidationError("layout[0]: image gallery requires at least one image".to_string()));
    }
}

// Ring 4: Enrichment - stamps the owning website on tenant-scoped content
use async_trait::async_trait;
use serde_json::Value;

use crate::database::schema::{CollectionSchema, FieldHook};
use crate::observer::context::ObserverContext;
use crate::observer::error::ObserverError;
use crate::observer::traits::{Observer, ObserverRing, SyncObserver};
use crate::tenancy::{resolve_website, WebsiteId};
use crate::types::{Collection, Operation};

/// Runs [`resolve_website`] for every field carrying the website assignment
/// hook. Non-super-admins cannot choose or move the owner of a record.
#[derive(Default)]
pub struct WebsiteAssignmentObserver;

impl Observer for WebsiteAssignmentObserver {
    fn name(&self) -> &'static str {
        "WebsiteAssignmentObserver"
    }

    fn ring(&self) -> ObserverRing {
        ObserverRing::Enrichment
    }

    fn applies_to_operation(&self, op: Operation) -> bool {
        matches!(op, Operation::Create | Operation::Update)
    }

    fn applies_to_collection(&self, collection: Collection) -> bool {
        collection.is_tenant_scoped()
    }

    fn priority(&self) -> u8 {
        20
    }
}

#[async_trait]
impl SyncObserver for WebsiteAssignmentObserver {
    async fn execute(&self, ctx: &mut ObserverContext) -> Result<(), ObserverError> {
        let schema = CollectionSchema::for_collection(ctx.collection);
        let user = ctx.caller.user();

        for field in schema.fields_with_hook(FieldHook::WebsiteAssignment) {
            for record in ctx.records.iter_mut() {
                let supplied = record.changes.get(field.name).and_then(WebsiteId::from_reference);
                let original = record.original_value(field.name).and_then(WebsiteId::from_reference);

                let resolved = resolve_website(user, ctx.operation, supplied.clone(), original.as_ref());

                if resolved != supplied {
                    tracing::debug!(
                        "Website for {} {} resolved to {:?} (supplied {:?})",
                        ctx.collection,
                        record.id.as_deref().unwrap_or("new"),
                        resolved,
                        supplied
                    );
                }

                let value = resolved.as_ref().map_or(Value::Null, WebsiteId::to_value);
                if record.changed(field.name) || record.original_value(field.name).unwrap_or(&Value::Null) != &value {
                    record.set(field.name, value);
                }
            }
        }
        Ok(())
    }
}

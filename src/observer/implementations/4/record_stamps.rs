// Ring 4: Enrichment - identifiers and timestamps
use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde_json::Value;
use uuid::Uuid;

use crate::observer::context::ObserverContext;
use crate::observer::error::ObserverError;
use crate::observer::traits::{Observer, ObserverRing, SyncObserver};
use crate::types::Operation;

#[derive(Default)]
pub struct RecordStampsObserver;

impl Observer for RecordStampsObserver {
    fn name(&self) -> &'static str {
        "RecordStampsObserver"
    }

    fn ring(&self) -> ObserverRing {
        ObserverRing::Enrichment
    }

    fn applies_to_operation(&self, op: Operation) -> bool {
        matches!(op, Operation::Create | Operation::Update)
    }

    fn priority(&self) -> u8 {
        10
    }
}

#[async_trait]
impl SyncObserver for RecordStampsObserver {
    async fn execute(&self, ctx: &mut ObserverContext) -> Result<(), ObserverError> {
        let now = Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true));

        for record in ctx.records.iter_mut() {
            match ctx.operation {
                Operation::Create => {
                    // System writes may carry explicit values, API input never reaches here with them
                    if !record.changed("id") {
                        let id = Uuid::new_v4().to_string();
                        record.id = Some(id.clone());
                        record.set("id", Value::String(id));
                    }
                    if !record.changed("created_at") {
                        record.set("created_at", now.clone());
                    }
                    if !record.changed("updated_at") {
                        record.set("updated_at", now.clone());
                    }
                }
                _ => {
                    // Stored identifiers are immutable
                    record.remove("id");
                    record.remove("created_at");
                    record.set("updated_at", now.clone());
                }
            }
        }
        Ok(())
    }
}

// Ring 1: Input Validation - membership shape of user records
use async_trait::async_trait;
use serde_json::Value;

use crate::observer::context::ObserverContext;
use crate::observer::error::ObserverError;
use crate::observer::stateful_record::StatefulRecord;
use crate::observer::traits::{Observer, ObserverRing, SyncObserver};
use crate::tenancy::{extract_website_ids, WebsiteId};
use crate::types::{Collection, Operation};

/// Normalises `websites`/`default_website` references to plain ids and keeps
/// the default inside the membership list.
#[derive(Default)]
pub struct UserMembershipObserver;

impl Observer for UserMembershipObserver {
    fn name(&self) -> &'static str {
        "UserMembershipObserver"
    }

    fn ring(&self) -> ObserverRing {
        ObserverRing::InputValidation
    }

    fn applies_to_operation(&self, op: Operation) -> bool {
        matches!(op, Operation::Create | Operation::Update)
    }

    fn applies_to_collection(&self, collection: Collection) -> bool {
        collection == Collection::Users
    }
}

#[async_trait]
impl SyncObserver for UserMembershipObserver {
    async fn execute(&self, ctx: &mut ObserverContext) -> Result<(), ObserverError> {
        for record in ctx.records.iter_mut() {
            normalize(record);

            if ctx.operation == Operation::Create {
                adopt_single_website(record);
            }

            check_default_is_member(record)?;
        }
        Ok(())
    }
}

fn normalize(record: &mut StatefulRecord) {
    if let Some(websites) = record.changes.get("websites") {
        let ids: Vec<Value> = extract_website_ids(websites).iter().map(WebsiteId::to_value).collect();
        record.set("websites", Value::Array(ids));
    }
    if let Some(default) = record.changes.get("default_website") {
        let id = WebsiteId::from_reference(default).map_or(Value::Null, |w| w.to_value());
        record.set("default_website", id);
    }
}

/// A user created with exactly one website and no default gets that website
fn adopt_single_website(record: &mut StatefulRecord) {
    let has_default = record.get("default_website").is_some_and(|v| !v.is_null());
    if has_default {
        return;
    }
    let websites = record.get("websites").map(extract_website_ids).unwrap_or_default();
    if let [only] = websites.as_slice() {
        tracing::debug!("Defaulting user website to its only membership {}", only);
        record.set("default_website", only.to_value());
    }
}

fn check_default_is_member(record: &StatefulRecord) -> Result<(), ObserverError> {
    let merged = record.merged();
    let websites = merged.get("websites").map(extract_website_ids).unwrap_or_default();
    let default = merged.get("default_website").and_then(WebsiteId::from_reference);

    match default {
        Some(default) if !websites.is_empty() && !websites.contains(&default) => Err(
            ObserverError::ConstraintViolation("default website must be one of the assigned websites".to_string()),
        ),
        _ => Ok(()),
    }
}

// Ring 1: Input Validation - system owned fields are never accepted from callers
use async_trait::async_trait;

use crate::database::schema::SYSTEM_FIELDS;
use crate::observer::context::ObserverContext;
use crate::observer::error::ObserverError;
use crate::observer::traits::{Observer, ObserverRing, SyncObserver};
use crate::types::Operation;

#[derive(Default)]
pub struct SystemFieldsObserver;

impl Observer for SystemFieldsObserver {
    fn name(&self) -> &'static str {
        "SystemFieldsObserver"
    }

    fn ring(&self) -> ObserverRing {
        ObserverRing::InputValidation
    }

    fn applies_to_operation(&self, op: Operation) -> bool {
        matches!(op, Operation::Create | Operation::Update)
    }

    fn priority(&self) -> u8 {
        10
    }
}

#[async_trait]
impl SyncObserver for SystemFieldsObserver {
    async fn execute(&self, ctx: &mut ObserverContext) -> Result<(), ObserverError> {
        // Fixtures and backfills may carry their own identifiers
        if ctx.caller.is_system() {
            return Ok(());
        }

        for record in &ctx.records {
            if let Some(field) = SYSTEM_FIELDS.iter().find(|f| record.changed(f)) {
                return Err(ObserverError::ValidationError(format!("Field '{}' is managed by the system", field)));
            }
        }
        Ok(())
    }
}

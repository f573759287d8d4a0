// Ring 7: Audit - change log written after the store has committed
use async_trait::async_trait;

use crate::config::config;
use crate::database::store::record_id;
use crate::observer::context::ObserverContext;
use crate::observer::error::ObserverError;
use crate::observer::traits::{AsyncObserver, Observer, ObserverRing};
use crate::types::Operation;

#[derive(Default)]
pub struct AuditLogObserver;

impl Observer for AuditLogObserver {
    fn name(&self) -> &'static str {
        "AuditLogObserver"
    }

    fn ring(&self) -> ObserverRing {
        ObserverRing::Audit
    }

    fn applies_to_operation(&self, op: Operation) -> bool {
        op.is_write()
    }
}

#[async_trait]
impl AsyncObserver for AuditLogObserver {
    async fn execute(&self, ctx: &ObserverContext) -> Result<(), ObserverError> {
        if !config().security.enable_audit_logging {
            return Ok(());
        }

        for record in ctx.result.iter().flatten() {
            tracing::info!(
                target: "audit",
                operation = ?ctx.operation,
                collection = %ctx.collection,
                caller = %ctx.caller.label(),
                id = record_id(record).unwrap_or("?"),
                website = ?record.get("website"),
                "record changed"
            );
        }
        Ok(())
    }
}

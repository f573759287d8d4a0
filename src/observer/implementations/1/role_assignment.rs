// Ring 1: Input Validation - only a super-admin may hand out super-admin
use async_trait::async_trait;

use crate::access::may_assign_role;
use crate::observer::context::ObserverContext;
use crate::observer::error::ObserverError;
use crate::observer::traits::{Observer, ObserverRing, SyncObserver};
use crate::tenancy::Role;
use crate::types::{Collection, Operation};

#[derive(Default)]
pub struct RoleAssignmentObserver;

impl Observer for RoleAssignmentObserver {
    fn name(&self) -> &'static str {
        "RoleAssignmentObserver"
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

    fn priority(&self) -> u8 {
        60
    }
}

#[async_trait]
impl SyncObserver for RoleAssignmentObserver {
    async fn execute(&self, ctx: &mut ObserverContext) -> Result<(), ObserverError> {
        // Anonymous writes are rejected by the security ring
        let Some(user) = ctx.caller.user() else {
            return Ok(());
        };

        for record in &ctx.records {
            let Some(value) = record.changes.get("role") else {
                continue;
            };
            if value.is_null() {
                continue;
            }
            let role: Role = value
                .as_str()
                .ok_or_else(|| ObserverError::ValidationError("role must be a string".to_string()))?
                .parse()
                .map_err(ObserverError::ValidationError)?;

            if !may_assign_role(user, role) {
                tracing::warn!("User {} attempted to assign role {}", user.id, role);
                return Err(ObserverError::AuthorizationDenied(format!(
                    "only a super-admin may assign the {} role",
                    role
                )));
            }
        }
        Ok(())
    }
}

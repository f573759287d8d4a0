// Ring 2: Security - access decision per request
use async_trait::async_trait;

use crate::access::{evaluate, record_in_scope, scope_filter, AccessDecision};
use crate::observer::context::ObserverContext;
use crate::observer::error::ObserverError;
use crate::observer::traits::{Observer, ObserverRing, SyncObserver};
use crate::tenancy::Caller;
use crate::types::Operation;

/// Evaluates the caller against the access matrix.
///
/// Denials reject the whole operation. Filtered grants narrow reads with an
/// extra predicate and, for updates and deletes, require the stored record to
/// fall inside the grant.
#[derive(Default)]
pub struct AccessControlObserver;

impl Observer for AccessControlObserver {
    fn name(&self) -> &'static str {
        "AccessControlObserver"
    }

    fn ring(&self) -> ObserverRing {
        ObserverRing::Security
    }

    fn applies_to_operation(&self, _op: Operation) -> bool {
        true
    }
}

#[async_trait]
impl SyncObserver for AccessControlObserver {
    async fn execute(&self, ctx: &mut ObserverContext) -> Result<(), ObserverError> {
        let user = match &ctx.caller {
            Caller::System => return Ok(()),
            Caller::Anonymous => None,
            Caller::User(user) => Some(user),
        };

        let decision = evaluate(user, ctx.operation, ctx.collection, ctx.phase);
        tracing::debug!(
            "Access decision for {} {:?} {}: {:?}",
            ctx.caller.label(),
            ctx.operation,
            ctx.collection,
            decision
        );
        ctx.decision = Some(decision.clone());

        let (websites, user) = match (decision, user) {
            (AccessDecision::Denied, _) => {
                tracing::warn!("Denied {:?} on {} for {}", ctx.operation, ctx.collection, ctx.caller.label());
                return Err(match user {
                    None => ObserverError::Unauthenticated,
                    Some(_) => ObserverError::AuthorizationDenied(format!(
                        "{:?} on {} is not permitted",
                        ctx.operation, ctx.collection
                    )),
                });
            }
            (AccessDecision::AllowFiltered(websites), Some(user)) => (websites, user.clone()),
            _ => return Ok(()),
        };

        match ctx.operation {
            Operation::Read => {
                let scope = scope_filter(ctx.collection, &websites, &user, ctx.phase);
                ctx.filter.get_or_insert_with(Default::default).restrict(scope);
            }
            Operation::Update | Operation::Delete => {
                for record in &ctx.records {
                    let Some(original) = record.original.as_ref() else {
                        return Err(ObserverError::PipelineError("original record not loaded".to_string()));
                    };
                    let in_scope = record_in_scope(ctx.collection, &websites, &user, ctx.phase, original)
                        .map_err(|e| ObserverError::PipelineError(e.to_string()))?;
                    if !in_scope {
                        tracing::warn!(
                            "{} may not {:?} {} {} outside their websites",
                            user.id,
                            ctx.operation,
                            ctx.collection,
                            record.id.as_deref().unwrap_or("?")
                        );
                        return Err(ObserverError::AuthorizationDenied(format!(
                            "{} belongs to a website outside your access",
                            ctx.collection
                        )));
                    }
                }
            }
            // Creates are never filtered
            Operation::Create => {}
        }
        Ok(())
    }
}

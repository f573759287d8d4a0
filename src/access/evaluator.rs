use crate::config::RolloutPhase;
use crate::tenancy::{ActingUser, Role};
use crate::types::{Collection, Operation};

use super::decision::AccessDecision;
use super::matrix::{grant, Grant, RoleSlot};

/// Decide whether `user` may perform `operation` on `collection`.
///
/// `None` is an unauthenticated caller and is always denied. Pure and cheap;
/// callers evaluate it per request rather than caching the result.
pub fn evaluate(
    user: Option<&ActingUser>,
    operation: Operation,
    collection: Collection,
    phase: RolloutPhase,
) -> AccessDecision {
    let Some(user) = user else {
        return AccessDecision::Denied;
    };

    if transitional_widening(user, operation, collection, phase) {
        return AccessDecision::AllowAll;
    }

    match grant(collection, operation, RoleSlot::from(user.role)) {
        Grant::Deny => AccessDecision::Denied,
        Grant::All => AccessDecision::AllowAll,
        Grant::Scoped => AccessDecision::filtered(user.websites.iter().cloned()),
    }
}

/// Expand-phase overlay: callers not yet migrated (no role, or no websites)
/// keep unrestricted read/update/delete on tenant-scoped content.
fn transitional_widening(
    user: &ActingUser,
    operation: Operation,
    collection: Collection,
    phase: RolloutPhase,
) -> bool {
    phase.is_transitional()
        && collection.is_tenant_scoped()
        && operation != Operation::Create
        && (user.role.is_none() || !user.has_websites())
}

/// Field rule on `users.role`: only a super-admin may grant super-admin
pub fn may_assign_role(user: &ActingUser, requested: Role) -> bool {
    requested != Role::SuperAdmin || user.is_super_admin()
}

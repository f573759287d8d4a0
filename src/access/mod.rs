//! Tenant-scoped authorization: the per-request access decision and its
//! translation into query predicates.

pub mod decision;
pub mod evaluator;
pub mod matrix;
pub mod scope;

pub use decision::AccessDecision;
pub use evaluator::{evaluate, may_assign_role};
pub use scope::{record_in_scope, scope_filter};

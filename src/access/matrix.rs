//! Role-based grant table.
//!
//! One row per (collection, operation), one column per role slot. Tenant
//! filtering is layered on by the evaluator: a `Scoped` grant becomes a
//! filter over the caller's websites.

use crate::tenancy::Role;
use crate::types::{Collection, Operation};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grant {
    Deny,
    All,
    Scoped,
}

/// Column index into a rule row
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RoleSlot {
    SuperAdmin = 0,
    WebsiteAdmin = 1,
    Editor = 2,
    Viewer = 3,
    NoRole = 4,
}

impl RoleSlot {
    pub const ALL: [RoleSlot; 5] = [
        RoleSlot::SuperAdmin,
        RoleSlot::WebsiteAdmin,
        RoleSlot::Editor,
        RoleSlot::Viewer,
        RoleSlot::NoRole,
    ];
}

impl From<Option<Role>> for RoleSlot {
    fn from(role: Option<Role>) -> Self {
        match role {
            Some(Role::SuperAdmin) => RoleSlot::SuperAdmin,
            Some(Role::WebsiteAdmin) => RoleSlot::WebsiteAdmin,
            Some(Role::Editor) => RoleSlot::Editor,
            Some(Role::Viewer) => RoleSlot::Viewer,
            None => RoleSlot::NoRole,
        }
    }
}

type Row = [Grant; 5];

use Grant::{All, Deny, Scoped};

#[rustfmt::skip]
mod rows {
    use super::{All, Deny, Row, Scoped};

    //                               super   site    editor  viewer  none
    pub const WEBSITES: Row =       [All,    Deny,   Deny,   Deny,   Deny];

    pub const USERS_READ: Row =     [All,    Scoped, Scoped, Scoped, Scoped];
    pub const USERS_CREATE: Row =   [All,    All,    Deny,   Deny,   Deny];
    pub const USERS_UPDATE: Row =   [All,    Scoped, Deny,   Deny,   Deny];
    pub const USERS_DELETE: Row =   [All,    Deny,   Deny,   Deny,   Deny];

    pub const CONTENT_READ: Row =   [All,    Scoped, Scoped, Scoped, Scoped];
    pub const CONTENT_CREATE: Row = [All,    All,    All,    Deny,   Deny];
    pub const CONTENT_UPDATE: Row = [All,    Scoped, Scoped, Deny,   Deny];
    pub const CONTENT_DELETE: Row = [All,    Scoped, Deny,   Deny,   Deny];
}

fn row(collection: Collection, operation: Operation) -> &'static Row {
    match (collection, operation) {
        (Collection::Websites, _) => &rows::WEBSITES,
        (Collection::Users, Operation::Read) => &rows::USERS_READ,
        (Collection::Users, Operation::Create) => &rows::USERS_CREATE,
        (Collection::Users, Operation::Update) => &rows::USERS_UPDATE,
        (Collection::Users, Operation::Delete) => &rows::USERS_DELETE,
        (Collection::Pages | Collection::Media, Operation::Read) => &rows::CONTENT_READ,
        (Collection::Pages | Collection::Media, Operation::Create) => &rows::CONTENT_CREATE,
        (Collection::Pages | Collection::Media, Operation::Update) => &rows::CONTENT_UPDATE,
        (Collection::Pages | Collection::Media, Operation::Delete) => &rows::CONTENT_DELETE,
    }
}

/// Look up the steady-state grant for an authenticated role slot
pub fn grant(collection: Collection, operation: Operation, slot: RoleSlot) -> Grant {
    row(collection, operation)[slot as usize]
}

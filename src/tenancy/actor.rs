use serde::{Deserialize, Serialize};

use super::reference::WebsiteId;
use super::role::Role;
use crate::database::models::User;

/// The authenticated user an operation runs on behalf of.
///
/// Built fresh from the stored user record on every request so that role and
/// membership changes take effect immediately.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActingUser {
    pub id: String,
    pub email: String,
    pub role: Option<Role>,
    pub websites: Vec<WebsiteId>,
    pub default_website: Option<WebsiteId>,
}

impl ActingUser {
    pub fn is_super_admin(&self) -> bool {
        self.role == Some(Role::SuperAdmin)
    }

    pub fn has_websites(&self) -> bool {
        !self.websites.is_empty()
    }
}

impl From<&User> for ActingUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            email: user.email.clone(),
            role: user.role,
            websites: user.websites.clone(),
            default_website: user.default_website.clone(),
        }
    }
}

impl From<User> for ActingUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            role: user.role,
            websites: user.websites,
            default_website: user.default_website,
        }
    }
}

/// Identity an operation is executed with
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Caller {
    /// No identity was resolved upstream
    Anonymous,
    /// Administrative local operations (migrations, fixtures); not subject to access rules
    System,
    User(ActingUser),
}

impl Caller {
    pub fn user(&self) -> Option<&ActingUser> {
        match self {
            Caller::User(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_system(&self) -> bool {
        matches!(self, Caller::System)
    }

    pub fn label(&self) -> String {
        match self {
            Caller::Anonymous => "anonymous".to_string(),
            Caller::System => "system".to_string(),
            Caller::User(user) => user.id.clone(),
        }
    }
}

impl From<ActingUser> for Caller {
    fn from(user: ActingUser) -> Self {
        Caller::User(user)
    }
}

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tenancy::reference::{deserialize_optional_reference, deserialize_reference_list};
use crate::tenancy::{Role, WebsiteId};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
    /// Absent only for accounts created before tenancy was introduced
    #[serde(default)]
    pub role: Option<Role>,
    #[serde(default, deserialize_with = "deserialize_reference_list")]
    pub websites: Vec<WebsiteId>,
    #[serde(default, deserialize_with = "deserialize_optional_reference")]
    pub default_website: Option<WebsiteId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Role, memberships and default website are all populated
    pub fn is_migrated(&self) -> bool {
        self.role.is_some() && !self.websites.is_empty() && self.default_website.is_some()
    }
}

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fixed privilege levels, serialized as `super-admin`, `website-admin`,
/// `editor` and `viewer`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Role {
    SuperAdmin,
    WebsiteAdmin,
    Editor,
    Viewer,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::SuperAdmin, Role::WebsiteAdmin, Role::Editor, Role::Viewer];

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::SuperAdmin => "super-admin",
            Role::WebsiteAdmin => "website-admin",
            Role::Editor => "editor",
            Role::Viewer => "viewer",
        }
    }

    /// Higher is more privileged
    pub fn privilege(&self) -> u8 {
        match self {
            Role::SuperAdmin => 3,
            Role::WebsiteAdmin => 2,
            Role::Editor => 1,
            Role::Viewer => 0,
        }
    }
}

impl PartialOrd for Role {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Role {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.privilege().cmp(&other.privilege())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Role::ALL
            .into_iter()
            .find(|role| role.as_str() == s)
            .ok_or_else(|| format!("unknown role: {}", s))
    }
}

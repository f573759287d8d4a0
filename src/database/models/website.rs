use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WebsiteStatus {
    #[default]
    Active,
    Suspended,
    Archived,
}

/// Branding for a website; not consulted by access rules
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebsiteSettings {
    /// Media id of the logo
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub primary_color: Option<String>,
    #[serde(default)]
    pub secondary_color: Option<String>,
    #[serde(default)]
    pub analytics_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Website {
    pub id: String,
    pub name: String,
    /// Routing domain, globally unique
    pub domain: String,
    /// URL slug, globally unique
    pub slug: String,
    #[serde(default)]
    pub status: WebsiteStatus,
    #[serde(default)]
    pub settings: WebsiteSettings,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

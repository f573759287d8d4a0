use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::tenancy::reference::deserialize_optional_reference;
use crate::tenancy::WebsiteId;

/// Uploaded asset metadata; the binary lives in external storage
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Media {
    pub id: String,
    pub alt: String,
    #[serde(default)]
    pub filename: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub filesize: Option<i64>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_reference")]
    pub website: Option<WebsiteId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

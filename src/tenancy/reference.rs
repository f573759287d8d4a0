use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::fmt;

/// Opaque website (tenant) identifier.
///
/// Website references arrive either as bare ids or as fully populated website
/// records. Everything past the system boundary works with this newtype only.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct WebsiteId(String);

impl WebsiteId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Normalize a single reference value.
    ///
    /// Strings and numbers are taken as the id itself. Objects are
    /// de-referenced through `id`, falling back to `_id`. Null, empty and
    /// unrecognised values yield `None`.
    pub fn from_reference(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) if !s.is_empty() => Some(Self(s.clone())),
            Value::Number(n) => Some(Self(n.to_string())),
            Value::Object(obj) => obj
                .get("id")
                .and_then(scalar_id)
                .or_else(|| obj.get("_id").and_then(scalar_id)),
            _ => None,
        }
    }

    pub fn to_value(&self) -> Value {
        Value::String(self.0.clone())
    }
}

fn scalar_id(value: &Value) -> Option<WebsiteId> {
    match value {
        Value::String(s) if !s.is_empty() => Some(WebsiteId(s.clone())),
        Value::Number(n) => Some(WebsiteId(n.to_string())),
        _ => None,
    }
}

impl fmt::Display for WebsiteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for WebsiteId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl<'de> Deserialize<'de> for WebsiteId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::deserialize(deserializer)?;
        WebsiteId::from_reference(&value)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid website reference: {}", value)))
    }
}

/// Extract website ids from a reference collection.
///
/// Non-array input (including null) gives an empty list. Entries that do not
/// resolve to an id are dropped and duplicates collapse to their first
/// occurrence.
pub fn extract_website_ids(value: &Value) -> Vec<WebsiteId> {
    let Some(items) = value.as_array() else {
        return Vec::new();
    };

    let mut ids: Vec<WebsiteId> = Vec::with_capacity(items.len());
    for id in items.iter().filter_map(WebsiteId::from_reference) {
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    ids
}

/// serde helper for `Option<WebsiteId>` fields that may hold a populated record
pub fn deserialize_optional_reference<'de, D>(deserializer: D) -> Result<Option<WebsiteId>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(WebsiteId::from_reference))
}

/// serde helper for `Vec<WebsiteId>` fields that may hold populated records
pub fn deserialize_reference_list<'de, D>(deserializer: D) -> Result<Vec<WebsiteId>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().map(extract_website_ids).unwrap_or_default())
}

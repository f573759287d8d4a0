use std::collections::BTreeSet;

use serde::Serialize;

use crate::tenancy::WebsiteId;

/// Outcome of evaluating one operation for one caller
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", content = "websites", rename_all = "snake_case")]
pub enum AccessDecision {
    Denied,
    AllowAll,
    /// Allowed only against records owned by one of these websites. An empty
    /// set matches no records.
    AllowFiltered(BTreeSet<WebsiteId>),
}

impl AccessDecision {
    pub fn filtered<I: IntoIterator<Item = WebsiteId>>(websites: I) -> Self {
        AccessDecision::AllowFiltered(websites.into_iter().collect())
    }

    pub fn is_denied(&self) -> bool {
        matches!(self, AccessDecision::Denied)
    }
}

use std::collections::BTreeSet;

use serde_json::{json, Map, Value};

use crate::config::RolloutPhase;
use crate::filter::matcher;
use crate::filter::FilterError;
use crate::tenancy::{ActingUser, WebsiteId};
use crate::types::Collection;

/// Where-clause restricting `collection` to what a filtered grant covers.
///
/// Content is matched on its `website` owner, users on an overlap of their
/// `websites` memberships. Users can always see their own record. During the
/// expand phase content that has not been assigned a website yet stays
/// visible.
pub fn scope_filter(
    collection: Collection,
    websites: &BTreeSet<WebsiteId>,
    caller: &ActingUser,
    phase: RolloutPhase,
) -> Value {
    let ids: Vec<Value> = websites.iter().map(WebsiteId::to_value).collect();

    match collection {
        Collection::Pages | Collection::Media => {
            let owned = json!({ "website": { "$in": ids } });
            if phase.is_transitional() {
                json!({ "$or": [owned, { "website": null }] })
            } else {
                owned
            }
        }
        Collection::Users => json!({
            "$or": [
                { "websites": { "$any": ids } },
                { "id": caller.id },
            ]
        }),
        Collection::Websites => json!({ "id": { "$in": ids } }),
    }
}

/// Whether a stored record falls inside a filtered grant
pub fn record_in_scope(
    collection: Collection,
    websites: &BTreeSet<WebsiteId>,
    caller: &ActingUser,
    phase: RolloutPhase,
    record: &Map<String, Value>,
) -> Result<bool, FilterError> {
    matcher::matches(&scope_filter(collection, websites, caller, phase), record)
}

use std::fmt;

use serde::Serialize;
use serde_json::json;

use crate::database::store::Store;
use crate::database::DatabaseError;
use crate::types::Collection;

/// Records the backfill still has to touch before the contract phase
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ContractReadiness {
    pub unmigrated_users: u64,
    pub unassigned_pages: u64,
    pub unassigned_media: u64,
}

impl ContractReadiness {
    pub async fn check(store: &dyn Store) -> Result<Self, DatabaseError> {
        let unmigrated_users = store
            .count(
                Collection::Users,
                &json!({ "$or": [
                    { "role": null },
                    { "default_website": null },
                    { "websites": { "$size": 0 } },
                ] }),
            )
            .await?;
        let unassigned_pages = store.count(Collection::Pages, &json!({ "website": null })).await?;
        let unassigned_media = store.count(Collection::Media, &json!({ "website": null })).await?;

        Ok(Self {
            unmigrated_users,
            unassigned_pages,
            unassigned_media,
        })
    }

    pub fn is_ready(&self) -> bool {
        self.unmigrated_users == 0 && self.unassigned_pages == 0 && self.unassigned_media == 0
    }
}

impl fmt::Display for ContractReadiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} unmigrated users, {} unassigned pages, {} unassigned media",
            self.unmigrated_users, self.unassigned_pages, self.unassigned_media
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;

    #[tokio::test]
    async fn counts_records_missing_tenancy() {
        let store = MemoryStore::new();
        store
            .insert(Collection::Users, json!({ "id": "u1", "email": "a@example.com", "websites": [] }).as_object().cloned().unwrap())
            .await
            .unwrap();
        store
            .insert(
                Collection::Users,
                json!({ "id": "u2", "email": "b@example.com", "role": "editor", "websites": ["w1"], "default_website": "w1" })
                    .as_object()
                    .cloned()
                    .unwrap(),
            )
            .await
            .unwrap();
        store
            .insert(Collection::Pages, json!({ "id": "p1", "title": "Home", "slug": "home" }).as_object().cloned().unwrap())
            .await
            .unwrap();

        let readiness = ContractReadiness::check(&store).await.unwrap();
        assert_eq!(
            readiness,
            ContractReadiness { unmigrated_users: 1, unassigned_pages: 1, unassigned_media: 0 }
        );
        assert!(!readiness.is_ready());
    }
}

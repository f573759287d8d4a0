// Ring 0: Data Preparation - loads stored state for updates and deletes
use async_trait::async_trait;

use crate::observer::context::ObserverContext;
use crate::observer::error::ObserverError;
use crate::observer::traits::{Observer, ObserverRing, SyncObserver};
use crate::types::Operation;

#[derive(Default)]
pub struct DataPreparationObserver;

impl Observer for DataPreparationObserver {
    fn name(&self) -> &'static str {
        "DataPreparationObserver"
    }

    fn ring(&self) -> ObserverRing {
        ObserverRing::DataPreparation
    }

    fn applies_to_operation(&self, op: Operation) -> bool {
        matches!(op, Operation::Update | Operation::Delete)
    }
}

#[async_trait]
impl SyncObserver for DataPreparationObserver {
    async fn execute(&self, ctx: &mut ObserverContext) -> Result<(), ObserverError> {
        let collection = ctx.collection;
        let store = ctx.store.clone();

        for record in ctx.records.iter_mut().filter(|r| r.original.is_none()) {
            let id = record.id.clone().ok_or_else(|| {
                ObserverError::ValidationError(format!("{:?} operations require record IDs", ctx.operation))
            })?;

            let original = store
                .find_by_id(collection, &id)
                .await?
                .ok_or_else(|| ObserverError::NotFound(format!("{} {}", collection, id)))?;

            tracing::trace!("Loaded original {} {}", collection, id);
            record.inject(original);
        }
        Ok(())
    }
}

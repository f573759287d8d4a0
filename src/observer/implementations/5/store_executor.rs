// Ring 5: Database - hands the prepared operation to the store
use async_trait::async_trait;

use crate::observer::context::ObserverContext;
use crate::observer::error::ObserverError;
use crate::observer::traits::{Observer, ObserverRing, SyncObserver};
use crate::types::Operation;

#[derive(Default)]
pub struct StoreExecutor;

impl Observer for StoreExecutor {
    fn name(&self) -> &'static str {
        "StoreExecutor"
    }

    fn ring(&self) -> ObserverRing {
        ObserverRing::Database
    }

    fn applies_to_operation(&self, _op: Operation) -> bool {
        true
    }
}

#[async_trait]
impl SyncObserver for StoreExecutor {
    async fn execute(&self, ctx: &mut ObserverContext) -> Result<(), ObserverError> {
        let store = ctx.store.clone();
        let collection = ctx.collection;
        let query_start = std::time::Instant::now();

        if ctx.operation == Operation::Read {
            let filter = ctx.filter.clone().unwrap_or_default();
            let page = store.find(collection, &filter).await.map_err(|e| {
                tracing::error!("Find on {} failed: {}", collection, e);
                ObserverError::from(e)
            })?;
            tracing::debug!("Found {} of {} {} in {:?}", page.docs.len(), page.total, collection, query_start.elapsed());
            ctx.page = Some(page);
            return Ok(());
        }

        let mut results = Vec::with_capacity(ctx.records.len());
        for record in &ctx.records {
            let outcome = match (ctx.operation, record.id.as_deref()) {
                (Operation::Create, _) => store.insert(collection, record.changes.clone()).await,
                (Operation::Update, Some(id)) => store.update(collection, id, record.changes.clone()).await,
                (Operation::Delete, Some(id)) => store.delete(collection, id).await,
                _ => return Err(ObserverError::PipelineError(format!("{:?} requires a record id", ctx.operation))),
            };

            match outcome {
                Ok(stored) => results.push(stored),
                Err(e) => {
                    tracing::error!("{:?} on {} failed: {}", ctx.operation, collection, e);
                    return Err(e.into());
                }
            }
        }

        tracing::info!(
            "{:?} {} {} record(s) in {:?}",
            ctx.operation,
            results.len(),
            collection,
            query_start.elapsed()
        );
        ctx.result = Some(results);
        Ok(())
    }
}

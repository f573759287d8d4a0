use std::sync::Arc;

use crate::config::RolloutPhase;
use crate::database::store::{Record, RecordPage, Store};
use crate::filter::FilterData;
use crate::observer::{ObserverContext, ObserverError, ObserverPipeline, StatefulRecord};
use crate::tenancy::Caller;
use crate::types::{Collection, Operation};

/// Collection operations on behalf of a caller.
///
/// Every call runs through the observer pipeline, so access decisions,
/// website assignment and schema checks apply uniformly. [`Caller::System`]
/// is the administrative local API and skips access evaluation.
#[derive(Clone)]
pub struct ContentService {
    store: Arc<dyn Store>,
    pipeline: Arc<ObserverPipeline>,
    phase: RolloutPhase,
}

impl ContentService {
    pub fn new(store: Arc<dyn Store>, phase: RolloutPhase) -> Self {
        Self {
            store,
            pipeline: Arc::new(ObserverPipeline::standard()),
            phase,
        }
    }

    pub fn store(&self) -> &Arc<dyn Store> {
        &self.store
    }

    pub fn phase(&self) -> RolloutPhase {
        self.phase
    }

    pub async fn find(&self, caller: &Caller, collection: Collection, filter: FilterData) -> Result<RecordPage, ObserverError> {
        let ctx = ObserverContext::new_read(collection, caller.clone(), self.phase, self.store.clone(), filter);
        let ctx = self.pipeline.execute(ctx).await?;
        ctx.page
            .ok_or_else(|| ObserverError::PipelineError("read produced no result".to_string()))
    }

    /// Single record visible to the caller; out-of-scope records are reported as missing
    pub async fn find_by_id(&self, caller: &Caller, collection: Collection, id: &str) -> Result<Record, ObserverError> {
        let page = self.find(caller, collection, FilterData::by_id(id)).await?;
        page.docs
            .into_iter()
            .next()
            .ok_or_else(|| ObserverError::NotFound(format!("{} {}", collection, id)))
    }

    pub async fn create(&self, caller: &Caller, collection: Collection, data: Record) -> Result<Record, ObserverError> {
        self.write(caller, Operation::Create, collection, StatefulRecord::create(data)).await
    }

    pub async fn update(
        &self,
        caller: &Caller,
        collection: Collection,
        id: &str,
        changes: Record,
    ) -> Result<Record, ObserverError> {
        self.write(caller, Operation::Update, collection, StatefulRecord::existing(id, changes)).await
    }

    /// Delete and return the record's last state
    pub async fn delete(&self, caller: &Caller, collection: Collection, id: &str) -> Result<Record, ObserverError> {
        self.write(caller, Operation::Delete, collection, StatefulRecord::existing(id, Record::new())).await
    }

    async fn write(
        &self,
        caller: &Caller,
        operation: Operation,
        collection: Collection,
        record: StatefulRecord,
    ) -> Result<Record, ObserverError> {
        let ctx = ObserverContext::new(operation, collection, caller.clone(), self.phase, self.store.clone(), vec![record]);
        let ctx = self.pipeline.execute(ctx).await?;
        ctx.result
            .and_then(|records| records.into_iter().next())
            .ok_or_else(|| ObserverError::PipelineError(format!("{:?} produced no result", operation)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use serde_json::{json, Value};

    fn record(value: Value) -> Record {
        value.as_object().cloned().unwrap()
    }

    fn service(phase: RolloutPhase) -> ContentService {
        ContentService::new(Arc::new(MemoryStore::new()), phase)
    }

    #[tokio::test]
    async fn system_writes_are_stamped() {
        let service = service(RolloutPhase::Contract);
        let website = service
            .create(&Caller::System, Collection::Websites, record(json!({ "name": "Acme", "domain": "acme.test", "slug": "acme" })))
            .await
            .unwrap();

        assert!(website["id"].as_str().is_some_and(|id| !id.is_empty()));
        assert!(website["created_at"].is_string());
        assert_eq!(website["status"], "active");
    }

    #[tokio::test]
    async fn anonymous_callers_are_unauthenticated() {
        let service = service(RolloutPhase::Contract);
        let err = service.find(&Caller::Anonymous, Collection::Pages, FilterData::default()).await.unwrap_err();
        assert_eq!(err, ObserverError::Unauthenticated);
    }

    #[tokio::test]
    async fn missing_records_are_not_found() {
        let service = service(RolloutPhase::Contract);
        let err = service.update(&Caller::System, Collection::Pages, "nope", Record::new()).await.unwrap_err();
        assert!(matches!(err, ObserverError::NotFound(_)));
        let err = service.find_by_id(&Caller::System, Collection::Pages, "nope").await.unwrap_err();
        assert!(matches!(err, ObserverError::NotFound(_)));
    }
}

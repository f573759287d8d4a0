use std::sync::Arc;
use std::time::Instant;

use crate::access::AccessDecision;
use crate::config::RolloutPhase;
use crate::database::store::{Record, RecordPage, Store};
use crate::filter::FilterData;
use crate::observer::error::ObserverError;
use crate::observer::stateful_record::StatefulRecord;
use crate::observer::traits::ObserverRing;
use crate::tenancy::Caller;
use crate::types::{Collection, Operation};

/// The main data structure that flows through the observer pipeline
pub struct ObserverContext {
    // Core request data
    pub operation: Operation,
    pub collection: Collection,
    pub caller: Caller,
    pub phase: RolloutPhase,
    pub store: Arc<dyn Store>,

    // Write operations: one entry per record
    pub records: Vec<StatefulRecord>,

    // Read operations: query filter, narrowed by ring 2
    pub filter: Option<FilterData>,

    // Set by ring 2 for non-system callers
    pub decision: Option<AccessDecision>,

    // Results after database operations (populated by Ring 5)
    pub result: Option<Vec<Record>>,
    pub page: Option<RecordPage>,

    // Performance tracking
    pub start_time: Instant,
    pub current_ring: Option<ObserverRing>,

    // Error accumulation
    pub errors: Vec<ObserverError>,
}

impl ObserverContext {
    fn base(operation: Operation, collection: Collection, caller: Caller, phase: RolloutPhase, store: Arc<dyn Store>) -> Self {
        Self {
            operation,
            collection,
            caller,
            phase,
            store,
            records: Vec::new(),
            filter: None,
            decision: None,
            result: None,
            page: None,
            start_time: Instant::now(),
            current_ring: None,
            errors: Vec::new(),
        }
    }

    /// Context for CREATE, UPDATE and DELETE
    pub fn new(
        operation: Operation,
        collection: Collection,
        caller: Caller,
        phase: RolloutPhase,
        store: Arc<dyn Store>,
        records: Vec<StatefulRecord>,
    ) -> Self {
        Self {
            records,
            ..Self::base(operation, collection, caller, phase, store)
        }
    }

    /// Context for READ operations
    pub fn new_read(
        collection: Collection,
        caller: Caller,
        phase: RolloutPhase,
        store: Arc<dyn Store>,
        filter: FilterData,
    ) -> Self {
        Self {
            filter: Some(filter),
            ..Self::base(Operation::Read, collection, caller, phase, store)
        }
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Get total execution time
    pub fn execution_time(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }
}

use async_trait::async_trait;

use crate::observer::context::ObserverContext;
use crate::observer::error::ObserverError;
use crate::types::{Collection, Operation};

/// Observer rings with semantic meaning - synchronous (0-5) and asynchronous (7)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(u8)]
pub enum ObserverRing {
    DataPreparation = 0,    // Load existing records for update/delete
    InputValidation = 1,    // System fields, membership invariants
    Security = 2,           // Access decision, scope checks, read filters
    Enrichment = 4,         // Ids, timestamps, owner stamping, defaults
    Database = 5,           // Store execution
    Audit = 7,              // Change logging (async)
}

impl ObserverRing {
    /// Check if ring executes synchronously (blocking)
    pub fn is_synchronous(&self) -> bool {
        (*self as u8) <= 6
    }

    /// Get all rings for an operation type
    pub fn for_operation(operation: Operation) -> Vec<Self> {
        use ObserverRing::*;

        match operation {
            Operation::Read => vec![Security, Database],
            Operation::Create | Operation::Update | Operation::Delete => {
                vec![DataPreparation, InputValidation, Security, Enrichment, Database, Audit]
            }
        }
    }
}

/// Base trait for all observers with metadata and applicability checks
pub trait Observer: Send + Sync {
    /// Observer name for logging and debugging
    fn name(&self) -> &'static str;

    /// Which ring this observer belongs to
    fn ring(&self) -> ObserverRing;

    /// Check if observer applies to this operation
    fn applies_to_operation(&self, op: Operation) -> bool;

    /// Check if observer applies to this collection
    fn applies_to_collection(&self, _collection: Collection) -> bool {
        true
    }

    /// Priority within ring (lower numbers execute first)
    fn priority(&self) -> u8 {
        50
    }
}

/// Rings 0-5: run in order and may modify the context
#[async_trait]
pub trait SyncObserver: Observer {
    async fn execute(&self, ctx: &mut ObserverContext) -> Result<(), ObserverError>;
}

/// Ring 7+: run concurrently after the database ring with a read-only context
#[async_trait]
pub trait AsyncObserver: Observer {
    async fn execute(&self, ctx: &ObserverContext) -> Result<(), ObserverError>;
}

pub enum ObserverBox {
    Sync(Box<dyn SyncObserver>),
    Async(Box<dyn AsyncObserver>),
}

impl ObserverBox {
    pub fn name(&self) -> &'static str {
        match self {
            ObserverBox::Sync(o) => o.name(),
            ObserverBox::Async(o) => o.name(),
        }
    }

    pub fn ring(&self) -> ObserverRing {
        match self {
            ObserverBox::Sync(o) => o.ring(),
            ObserverBox::Async(o) => o.ring(),
        }
    }

    pub fn priority(&self) -> u8 {
        match self {
            ObserverBox::Sync(o) => o.priority(),
            ObserverBox::Async(o) => o.priority(),
        }
    }

    pub fn applies_to(&self, op: Operation, collection: Collection) -> bool {
        match self {
            ObserverBox::Sync(o) => o.applies_to_operation(op) && o.applies_to_collection(collection),
            ObserverBox::Async(o) => o.applies_to_operation(op) && o.applies_to_collection(collection),
        }
    }

    pub async fn execute_sync(&self, ctx: &mut ObserverContext) -> Result<(), ObserverError> {
        match self {
            ObserverBox::Sync(o) => o.execute(ctx).await,
            ObserverBox::Async(_) => Ok(()), // Async observers don't execute in sync phase
        }
    }

    pub async fn execute_async(&self, ctx: &ObserverContext) -> Result<(), ObserverError> {
        match self {
            ObserverBox::Async(o) => o.execute(ctx).await,
            ObserverBox::Sync(_) => Ok(()), // Sync observers don't execute in async phase
        }
    }
}

//! Expand, migrate, contract.
//!
//! The schema migrations add tenancy as optional columns, the backfill
//! populates them from the existing single-tenant data, and the contract
//! migration makes them required once [`ContractReadiness`] reports nothing
//! left to migrate.

pub mod backfill;
pub mod contract;
pub mod runner;

pub use backfill::{Backfill, BackfillOptions, BackfillReport};
pub use contract::ContractReadiness;
pub use runner::{Migration, MigrationStatus, Migrator, MIGRATIONS};

use thiserror::Error;

use crate::database::DatabaseError;
use crate::observer::ObserverError;

#[derive(Debug, Error)]
pub enum MigrationError {
    #[error("AUTH_SECRET environment variable is not set")]
    MissingSecret,

    #[error("Contract phase blocked: {0}")]
    ContractPrecondition(ContractReadiness),

    #[error("Unknown migration: {0}")]
    UnknownMigration(String),

    #[error("Backfill step failed: {0}")]
    Pipeline(#[from] ObserverError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("SQL error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

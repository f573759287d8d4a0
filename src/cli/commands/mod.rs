pub mod backfill;
pub mod migrate;
pub mod token;

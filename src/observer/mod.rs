// Observer system for processing collection operations through a ring pipeline

pub mod context;
pub mod error;
pub mod implementations;
pub mod pipeline;
pub mod stateful_record;
pub mod traits;

// Re-export core types
pub use context::*;
pub use error::*;
pub use pipeline::*;
pub use stateful_record::*;
pub use traits::*;

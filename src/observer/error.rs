use thiserror::Error;

use crate::database::manager::DatabaseError;

/// Failures raised while an operation travels through the pipeline
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ObserverError {
    #[error("Authentication required")]
    Unauthenticated,

    #[error("Authorization denied: {0}")]
    AuthorizationDenied(String),

    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Pipeline execution failed: {0}")]
    PipelineError(String),
}

/// Convert from database errors
impl From<DatabaseError> for ObserverError {
    fn from(error: DatabaseError) -> Self {
        match error {
            DatabaseError::UniqueViolation { collection, field } => {
                ObserverError::ConstraintViolation(format!("{} {} must be unique", collection, field))
            }
            DatabaseError::NotFound(what) => ObserverError::NotFound(what),
            DatabaseError::InvalidQuery(e) => ObserverError::ValidationError(e.to_string()),
            other => ObserverError::DatabaseError(other.to_string()),
        }
    }
}

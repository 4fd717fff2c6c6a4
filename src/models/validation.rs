//! Model-level validation errors

use thiserror::Error;

use crate::db::DbError;

/// A field failed a catalog rule
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Errors from validated model writes
#[derive(Debug, Error)]
pub enum ModelError {
    #[error(transparent)]
    Db(#[from] DbError),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),
}

impl From<rusqlite::Error> for ModelError {
    fn from(e: rusqlite::Error) -> Self {
        ModelError::Db(DbError::Sqlite(e))
    }
}

/// Result type for validated model writes
pub type ModelResult<T> = Result<T, ModelError>;

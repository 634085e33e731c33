//! Memory store error types.

use datamod_core::StoreError;
use thiserror::Error;

/// Memory store operation errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MemDbError {
    /// Table not found
    #[error("Table '{table}' not found")]
    TableNotFound { table: String },

    /// Table already exists
    #[error("Table '{0}' already exists")]
    TableAlreadyExists(String),

    /// Column not declared for a table with a fixed column list
    #[error("Column '{column}' not found in table '{table}'")]
    ColumnNotFound { table: String, column: String },

    /// Column declared twice
    #[error("Column '{column}' declared more than once in table '{table}'")]
    DuplicateColumn { table: String, column: String },

    /// Row limit reached
    #[error("Row limit exceeded for table '{table}': limit {limit} rows")]
    RowLimitExceeded { table: String, limit: usize },

    /// Sub-select reference could not be resolved
    #[error("Invalid reference '{reference}': {reason}")]
    InvalidReference { reference: String, reason: String },

    /// last_insert_id called before any insert
    #[error("No row has been inserted yet")]
    NoInsert,
}

impl From<MemDbError> for StoreError {
    fn from(err: MemDbError) -> Self {
        match err {
            MemDbError::TableNotFound { table } => StoreError::TableNotFound { table },
            MemDbError::InvalidReference { reference, reason } => {
                StoreError::InvalidReference { reference, reason }
            }
            other => StoreError::Backend(other.to_string()),
        }
    }
}

use async_trait::async_trait;
use model::row::RowData;
use thiserror::Error;

/// Failure raised by the backing engine while executing a statement. The
/// description text ends up verbatim in the query's `message` field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ExecutionError {
    pub message: String,
}

impl ExecutionError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Column metadata and materialized rows produced by one statement.
#[derive(Debug, Clone, Default)]
pub struct Cursor {
    /// `(name, source type)` per result column, in result order.
    pub columns: Vec<(String, String)>,
    pub rows: Vec<RowData>,
}

/// The backing SQL engine, treated as an opaque capability: it executes a
/// statement and yields column metadata plus rows, or fails.
#[async_trait]
pub trait Database: Send + Sync {
    async fn execute(&self, sql: &str) -> Result<Cursor, ExecutionError>;
}

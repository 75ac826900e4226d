//! Database collaborator — schema reflection and statement execution.
//!
//! The core consumes the database through the narrow [`Database`] trait so
//! the session controller can be driven by an in-memory fake in tests.

pub mod postgres;

use crate::error::QuillError;
use async_trait::async_trait;

pub use postgres::PgDatabase;

/// A tabular query result: ordered column names plus string-rendered rows.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Option<String>>>,
}

impl TableResult {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Narrow interface to the live database.
#[async_trait]
pub trait Database: Send + Sync {
    /// Ordered column names for `schema.table`.
    ///
    /// Fails with [`QuillError::Reflection`] for an unknown table or a
    /// connectivity problem; never retried.
    async fn reflect(&self, schema: &str, table: &str) -> Result<Vec<String>, QuillError>;

    /// Execute arbitrary SQL text and materialize the result.
    async fn execute(&self, sql: &str) -> Result<TableResult, QuillError>;
}

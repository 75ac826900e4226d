//! Error taxonomy for the query specification engine.
//!
//! Every variant aborts only the input currently being processed — the
//! session itself keeps running, and persisted state is left exactly as it
//! was before the failing operation. An invalid `limit` value is not an
//! error at all: the compiler drops the field with a warning instead.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum QuillError {
    /// Schema or table is not set in the active context.
    #[error("schema and table are not set — send schema:<name>, tablename:<name> first")]
    IncompleteContext,

    /// Every requested column failed to match the reflected schema, or
    /// "all" resolved against a table with no columns.
    #[error("no columns resolved for {table} (requested '{requested}')")]
    NoColumnsResolved { table: String, requested: String },

    /// Schema reflection failed — unknown table or connectivity.
    #[error("could not reflect {table}: {message}")]
    Reflection { table: String, message: String },

    /// The database rejected a statement.
    #[error("query failed: {message}")]
    Execution { message: String },

    /// The NL-to-SQL service failed or is not configured.
    #[error("translation failed: {message}")]
    Translation { message: String },

    /// Reading or writing persisted session state failed.
    #[error("state persistence failed: {message}")]
    State { message: String },

    /// Writing the result export failed.
    #[error("export failed: {message}")]
    Export { message: String },
}

impl QuillError {
    pub fn reflection(table: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Reflection {
            table: table.into(),
            message: err.to_string(),
        }
    }

    pub fn execution(err: impl std::fmt::Display) -> Self {
        Self::Execution {
            message: err.to_string(),
        }
    }

    pub fn translation(err: impl std::fmt::Display) -> Self {
        Self::Translation {
            message: err.to_string(),
        }
    }

    pub fn state(err: impl std::fmt::Display) -> Self {
        Self::State {
            message: err.to_string(),
        }
    }

    pub fn export(err: impl std::fmt::Display) -> Self {
        Self::Export {
            message: err.to_string(),
        }
    }
}

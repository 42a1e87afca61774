//! Session error types.

use thiserror::Error;

/// Errors raised by a [`Session`](crate::session::Session).
#[derive(Debug, Error)]
pub enum SessionError {
    /// The driver refused to open a connection.
    #[error("error connecting using {connection_string}: {source:#}")]
    Connect {
        /// Connection string with the credential redacted.
        connection_string: String,
        #[source]
        source: anyhow::Error,
    },

    /// An operation needed the database after the connection was released.
    #[error("session is not connected")]
    NotConnected,

    /// A statement without a result set failed.
    #[error("statement failed: {source:#}")]
    Statement {
        sql: String,
        #[source]
        source: anyhow::Error,
    },

    /// A query returning a result set failed.
    #[error("query failed: {source:#}")]
    Query {
        sql: String,
        #[source]
        source: anyhow::Error,
    },

    /// A value was requested from a statement that dry-run mode skipped.
    #[error("dry run: no result for {sql}")]
    DryRun { sql: String },

    /// A scalar query came back without rows or columns.
    #[error("query returned no value: {sql}")]
    EmptyResult { sql: String },

    /// Explicit column types do not line up with the columns being loaded.
    #[error("{types} column types supplied for {columns} columns")]
    ColumnTypeCount { types: usize, columns: usize },

    /// Staging file could not be created, persisted, or written as CSV.
    #[error("staging file error: {0:#}")]
    Staging(#[source] anyhow::Error),

    #[error("arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),
}

/// Result type for session operations
pub type Result<T> = std::result::Result<T, SessionError>;

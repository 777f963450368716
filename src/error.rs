//! Error types for textdb
//!
//! This module defines all error types used throughout the record store.

use thiserror::Error;

/// The main error type for textdb
#[derive(Error, Debug)]
pub enum Error {
    // ========== Lookup Errors ==========
    #[error("Not found: table '{0}'")]
    TableNotFound(String),

    #[error("Not found: column '{column}' in table '{table}'")]
    ColumnNotFound { column: String, table: String },

    #[error("Not found: row with id '{id}' in table '{table}'")]
    RowNotFound { id: String, table: String },

    #[error("Not found: value '{value}' in column '{column}'")]
    ValueNotFound { value: String, column: String },

    #[error("Not found: foreign key for '{0}'")]
    ForeignKeyNotFound(String),

    #[error("Not found: database file '{0}'")]
    FileNotFound(String),

    // ========== Query Errors ==========
    #[error("Sql syntax error: expected {expected}")]
    SqlSyntax { expected: String },

    // ========== Validation Errors ==========
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Foreign key already exists: {0}")]
    DuplicateRelation(String),

    // ========== Storage Errors ==========
    #[error("Encryption error: {0}")]
    Encryption(String),

    #[error("Decryption error: {0}")]
    Decryption(String),

    #[error("Malformed database file: {0}")]
    MalformedFormat(String),

    // ========== I/O Errors ==========
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn column_not_found(column: impl Into<String>, table: impl Into<String>) -> Self {
        Error::ColumnNotFound {
            column: column.into(),
            table: table.into(),
        }
    }

    pub(crate) fn row_not_found(id: impl Into<String>, table: impl Into<String>) -> Self {
        Error::RowNotFound {
            id: id.into(),
            table: table.into(),
        }
    }

    pub(crate) fn syntax(expected: impl Into<String>) -> Self {
        Error::SqlSyntax {
            expected: expected.into(),
        }
    }

    /// Whether this error reports a missing table, column, row, value,
    /// relationship or file.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            Error::TableNotFound(_)
                | Error::ColumnNotFound { .. }
                | Error::RowNotFound { .. }
                | Error::ValueNotFound { .. }
                | Error::ForeignKeyNotFound(_)
                | Error::FileNotFound(_)
        )
    }
}

/// Result type alias for textdb operations
pub type Result<T> = std::result::Result<T, Error>;

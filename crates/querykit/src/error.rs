//! Error types for fragment building.

use thiserror::Error;

/// Errors raised while turning specs into query fragments.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum QueryError {
    /// A sort or filter spec names a field the column map does not know.
    #[error("unknown field: {0}")]
    UnknownField(String),

    #[error("invalid sort direction: {0}")]
    InvalidDirection(String),

    #[error("invalid nulls order: {0}")]
    InvalidNullsOrder(String),

    #[error("invalid nulls policy: {0}")]
    InvalidNullsPolicy(String),

    #[error("invalid match mode: {0}")]
    InvalidMatchMode(String),

    /// `set_attribute` walked into a value that is not an object.
    #[error("conflicting value at '{0}': expected an object")]
    ConflictingPath(String),
}

/// Result type alias using QueryError.
pub type QueryResult<T> = Result<T, QueryError>;

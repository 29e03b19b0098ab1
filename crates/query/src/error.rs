//! Query construction errors.
//!
//! Every variant is a deterministic input-validation failure: it is surfaced to
//! the caller with the offending key or value and never retried.

use thiserror::Error;

pub type QueryResult<T> = Result<T, QueryError>;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QueryError {
    /// A filter or sort key does not resolve against the entity schema.
    #[error("invalid field path '{key}': {reason}")]
    InvalidFieldPath { key: String, reason: String },

    /// A filter value could not be coerced to the field's declared type.
    #[error("invalid value format: {value}. Expected {expected}")]
    InvalidValueFormat { value: String, expected: String },

    /// An operator received the wrong number of values.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The operator name is not part of the supported set.
    #[error("operation not supported: {0}")]
    UnsupportedOperation(String),

    /// Page index, page size or sort parameters are out of range.
    #[error("invalid page request: {0}")]
    InvalidPageRequest(String),
}

impl QueryError {
    pub fn invalid_path(key: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidFieldPath {
            key: key.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_value(value: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::InvalidValueFormat {
            value: value.into(),
            expected: expected.into(),
        }
    }

    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument(msg.into())
    }

    pub fn invalid_page(msg: impl Into<String>) -> Self {
        Self::InvalidPageRequest(msg.into())
    }
}

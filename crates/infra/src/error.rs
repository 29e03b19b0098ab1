//! Service-level error model and its boundary mapping.

use serde_json::json;
use thiserror::Error;

use storehub_auth::{AuthError, AuthzError};
use storehub_core::DomainError;
use storehub_query::QueryError;

use crate::store::StoreError;

pub type ServiceResult<T> = Result<T, ServiceError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ServiceError {
    #[error(transparent)]
    Denied(#[from] AuthzError),

    #[error(transparent)]
    Unauthenticated(#[from] AuthError),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("{kind} not found with id: {id}")]
    NotFound { kind: &'static str, id: String },

    #[error("{kind} already exists with {field}: {value}")]
    AlreadyExists {
        kind: &'static str,
        field: &'static str,
        value: String,
    },

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("invalid identifier: {0}")]
    InvalidId(String),

    #[error("store error: {0}")]
    Store(String),
}

impl ServiceError {
    pub fn not_found(kind: &'static str, id: impl core::fmt::Display) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }

    pub fn already_exists(kind: &'static str, field: &'static str, value: impl Into<String>) -> Self {
        Self::AlreadyExists {
            kind,
            field,
            value: value.into(),
        }
    }

    /// HTTP-style status for a transport boundary.
    pub fn status_code(&self) -> u16 {
        match self {
            ServiceError::Denied(_) => 403,
            ServiceError::Unauthenticated(AuthError::Backend(_)) => 500,
            ServiceError::Unauthenticated(_) => 401,
            ServiceError::Query(_) => 400,
            ServiceError::NotFound { .. } => 404,
            ServiceError::AlreadyExists { .. } => 409,
            ServiceError::Validation(_) | ServiceError::InvalidId(_) => 400,
            ServiceError::Store(_) => 500,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ServiceError::Denied(_) => "unauthorized",
            ServiceError::Unauthenticated(_) => "unauthenticated",
            ServiceError::Query(_) => "invalid_query",
            ServiceError::NotFound { .. } => "not_found",
            ServiceError::AlreadyExists { .. } => "conflict",
            ServiceError::Validation(_) => "validation_error",
            ServiceError::InvalidId(_) => "invalid_id",
            ServiceError::Store(_) => "store_error",
        }
    }

    /// `{"error": code, "message": text}` body.
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "error": self.code(),
            "message": self.to_string(),
        })
    }
}

impl From<DomainError> for ServiceError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) => ServiceError::Validation(msg),
            DomainError::InvalidId(msg) => ServiceError::InvalidId(msg),
            DomainError::NotFound { kind, id } => ServiceError::NotFound { kind, id },
            DomainError::AlreadyExists { kind, field, value } => {
                ServiceError::AlreadyExists { kind, field, value }
            }
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation {
                entity,
                field,
                value,
            } => ServiceError::AlreadyExists {
                kind: entity,
                field,
                value,
            },
            StoreError::Backend(msg) => ServiceError::Store(msg),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundary_mapping() {
        let cases: Vec<(ServiceError, u16, &str)> = vec![
            (AuthzError::Denied.into(), 403, "unauthorized"),
            (AuthError::InvalidCredentials.into(), 401, "unauthenticated"),
            (QueryError::invalid_argument("x").into(), 400, "invalid_query"),
            (ServiceError::not_found("Product", "1"), 404, "not_found"),
            (ServiceError::already_exists("Role", "name", "ADMIN"), 409, "conflict"),
            (DomainError::validation("bad").into(), 400, "validation_error"),
            (StoreError::Backend("down".into()).into(), 500, "store_error"),
        ];
        for (err, status, code) in cases {
            assert_eq!(err.status_code(), status, "{err}");
            assert_eq!(err.code(), code, "{err}");
        }
    }

    #[test]
    fn denial_body_does_not_name_the_capability() {
        let body = ServiceError::from(AuthzError::Denied).to_json();
        assert_eq!(body["error"], "unauthorized");
        assert_eq!(body["message"], "access denied");
    }

    #[test]
    fn unique_violation_becomes_conflict() {
        let err: ServiceError = StoreError::UniqueViolation {
            entity: "Product",
            field: "name",
            value: "apple".into(),
        }
        .into();
        assert_eq!(err, ServiceError::already_exists("Product", "name", "apple"));
        assert_eq!(err.to_string(), "Product already exists with name: apple");
    }
}

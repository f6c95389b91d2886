//! Error types shared across the workspace.
//!
//! Deliberate, expected signals (`BadRequest`, `NotFound`, `Conflict`) are
//! raised by the service layer and translated 1:1 to response codes by the
//! consuming API layer. Everything else is unexpected and propagates
//! unclassified.

use thiserror::Error;

use crate::value::FieldKind;

/// Errors from field resolution, coercion, and predicate construction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("Unknown field: {name}")]
    UnknownField { name: String },

    #[error("Field {name} has no setter")]
    ReadOnlyField { name: &'static str },

    #[error("Identity of {type_name} takes {expected} value(s), got {got}")]
    IdentityArity {
        type_name: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("Cannot coerce '{value}' to {kind:?}")]
    Coerce { kind: FieldKind, value: String },

    #[error("Unknown sort field: {token}")]
    UnknownSortField { token: String },

    #[error("Invalid sort direction: {token}")]
    InvalidSortDirection { token: String },
}

/// Errors from the persistence collaborator.
///
/// `Transient` failures are candidates for the collaborator's own retry
/// policy; everything else propagates immediately.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("Transient store failure: {reason}")]
    Transient { reason: String },

    #[error("Store failure: {reason}")]
    Backend { reason: String },
}

impl StoreError {
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Transient { .. })
    }
}

/// Top-level error for service operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl ServiceError {
    pub fn bad_request() -> Self {
        ServiceError::BadRequest("Bad request".to_string())
    }

    pub fn not_found() -> Self {
        ServiceError::NotFound("Not found".to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
pub type ServiceResult<T> = Result<T, ServiceError>;

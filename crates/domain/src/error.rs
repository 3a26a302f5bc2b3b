//! Domain error types.

use catalog::{CatalogError, RequestStatus};
use common::RequestId;
use thiserror::Error;

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Malformed input, rejected before the store is touched.
    #[error("{0}")]
    Validation(String),

    /// A referenced row does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },

    /// The request was already fulfilled; nothing was debited.
    #[error("Request {0} is already fulfilled")]
    AlreadyFulfilled(RequestId),

    /// The request is in a terminal state other than `Fulfilled`.
    #[error("Request {request_id} is {status}, expected Pending")]
    InvalidState {
        request_id: RequestId,
        status: RequestStatus,
    },

    /// The inventory ledger cannot cover the debit.
    #[error("Insufficient stock for {category}: requested {requested}, available {available}")]
    InsufficientStock {
        category: String,
        requested: u32,
        available: u64,
    },

    /// A unique value is already taken.
    #[error("{0}")]
    Conflict(String),

    /// Unknown username or wrong password. The two are not distinguished.
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// Password hashing or hash parsing failed.
    #[error("Password hashing error: {0}")]
    PasswordHashing(String),

    /// Connectivity loss, deadlock or serialization failure. Safe to retry.
    #[error("Transient store error: {0}")]
    TransientStore(#[source] CatalogError),

    /// A cross-entity invariant did not hold. Indicates a bug.
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    /// Any other store failure.
    #[error("Store error: {0}")]
    Store(#[source] CatalogError),
}

impl DomainError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        DomainError::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Only transient store failures should be retried without new input.
    pub fn is_retryable(&self) -> bool {
        matches!(self, DomainError::TransientStore(_))
    }

    /// Short label used for metrics and logs.
    pub fn kind(&self) -> &'static str {
        match self {
            DomainError::Validation(_) => "validation",
            DomainError::NotFound { .. } => "not_found",
            DomainError::AlreadyFulfilled(_) => "already_fulfilled",
            DomainError::InvalidState { .. } => "invalid_state",
            DomainError::InsufficientStock { .. } => "insufficient_stock",
            DomainError::Conflict(_) => "conflict",
            DomainError::InvalidCredentials => "invalid_credentials",
            DomainError::PasswordHashing(_) => "password_hashing",
            DomainError::TransientStore(_) => "transient_store",
            DomainError::InvariantViolation(_) => "invariant_violation",
            DomainError::Store(_) => "store",
        }
    }
}

impl From<CatalogError> for DomainError {
    fn from(err: CatalogError) -> Self {
        if err.is_transient() {
            return DomainError::TransientStore(err);
        }
        match err {
            CatalogError::InsufficientStock {
                category,
                requested,
                available,
            } => DomainError::InsufficientStock {
                category,
                requested,
                available,
            },
            CatalogError::Duplicate(constraint) => {
                let message = match constraint.as_str() {
                    "staff_username_key" => "Username already exists".to_string(),
                    "staff_email_key" => "Email already exists".to_string(),
                    _ => format!("Duplicate value violates {constraint}"),
                };
                DomainError::Conflict(message)
            }
            CatalogError::MissingReference(reference) => DomainError::NotFound {
                entity: "Referenced row",
                id: reference,
            },
            CatalogError::InvalidAmount(amount) => {
                DomainError::Validation(format!("Quantity must be positive, got {amount}"))
            }
            other => DomainError::Store(other),
        }
    }
}

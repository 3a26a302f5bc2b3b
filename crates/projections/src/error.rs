//! Projection error types.

use thiserror::Error;

/// Errors that can occur while building a report.
#[derive(Debug, Error)]
pub enum ProjectionError {
    /// An error occurred in the catalog store.
    #[error("Catalog error: {0}")]
    Catalog(#[from] catalog::CatalogError),

    /// The inventory selector names neither ledger.
    #[error("Invalid inventory type: {0}")]
    InvalidInventoryType(String),

    /// A referenced row does not exist.
    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: String },
}

impl ProjectionError {
    /// Returns true if retrying the same query may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, ProjectionError::Catalog(err) if err.is_transient())
    }
}

/// Result type for projection operations.
pub type Result<T> = std::result::Result<T, ProjectionError>;

use thiserror::Error;

/// Errors that can occur when interacting with the catalog store.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// A debit asked for more than the ledger holds for a category.
    /// The ledger is left unchanged.
    #[error("Insufficient stock for {category}: requested {requested}, available {available}")]
    InsufficientStock {
        category: String,
        requested: u32,
        available: u64,
    },

    /// Ledger operations only accept strictly positive amounts.
    #[error("Ledger amount must be positive, got {0}")]
    InvalidAmount(u32),

    /// A unique constraint rejected the row.
    #[error("Duplicate value violates {0}")]
    Duplicate(String),

    /// A foreign key pointed at a row that does not exist.
    #[error("Referenced row does not exist ({0})")]
    MissingReference(String),

    /// A stored value could not be mapped back onto the model.
    #[error("Corrupt row: {0}")]
    Corrupt(String),

    /// A database error occurred.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// A database migration error occurred.
    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

impl CatalogError {
    /// Returns true for failures that may succeed if the whole operation is
    /// retried unchanged: lost connections, pool exhaustion, serialization
    /// failures, deadlocks and lock or statement timeouts.
    pub fn is_transient(&self) -> bool {
        match self {
            CatalogError::Database(err) => match err {
                sqlx::Error::Io(_)
                | sqlx::Error::PoolTimedOut
                | sqlx::Error::PoolClosed
                | sqlx::Error::WorkerCrashed => true,
                sqlx::Error::Database(db_err) => matches!(
                    db_err.code().as_deref(),
                    Some("40001" | "40P01" | "55P03" | "57014")
                ),
                _ => false,
            },
            _ => false,
        }
    }
}

/// Result type for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;

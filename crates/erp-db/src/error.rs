//! # Store and Checkout Errors
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  sqlx::Error                                                           │
//! │       │  classified: constraint kind, pool state, migration            │
//! │       ▼                                                                 │
//! │  DbError                                                               │
//! │       │                                                                 │
//! │       │        CoreError (stock, not found, validation)                │
//! │       │             │                                                   │
//! │       ▼             ▼                                                   │
//! │  CheckoutError { Store(DbError) | Rejected(CoreError) }                │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ApiError (apps/api) ← status code + JSON body                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use erp_core::{CoreError, ValidationError};
use thiserror::Error;

/// Failures of the persistence layer.
#[derive(Debug, Error)]
pub enum DbError {
    /// No row with that id.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Registering a taken username or email
    /// - Creating a second category/unit with the same name
    #[error("{field} already exists")]
    UniqueViolation { field: String },

    /// Foreign key constraint violation.
    ///
    /// ## When This Occurs
    /// - Product referencing a non-existent category or unit
    /// - Deleting a category/unit still used by products
    /// - Deleting a product that appears in a sale
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// CHECK constraint violation (negative stock, bad subtotal, ...).
    #[error("Constraint violation: {message}")]
    CheckViolation { message: String },

    /// Could not open or reach the database.
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Migration failed.
    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    /// Any other statement failure.
    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// Begin or commit failed.
    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// No pooled connection became free within the acquire timeout.
    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// `NotFound` for `entity` with `id`.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

/// Classifies sqlx errors.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → Analyze message for constraint type
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // "UNIQUE constraint failed: users.username"
                if let Some(target) = msg.strip_prefix("UNIQUE constraint failed: ") {
                    let field = target
                        .split(", ")
                        .next()
                        .and_then(|col| col.rsplit('.').next())
                        .unwrap_or("value")
                        .to_string();
                    DbError::UniqueViolation { field }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else if msg.contains("CHECK constraint failed") {
                    DbError::CheckViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Checkout Error
// =============================================================================

/// Failure of a sale request.
///
/// `Rejected` is the request's fault (validation, unknown product, stock).
/// `Store` is a persistence fault. Either way nothing was committed.
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error(transparent)]
    Rejected(#[from] CoreError),

    #[error(transparent)]
    Store(#[from] DbError),
}

impl From<sqlx::Error> for CheckoutError {
    fn from(err: sqlx::Error) -> Self {
        CheckoutError::Store(err.into())
    }
}

impl From<ValidationError> for CheckoutError {
    fn from(err: ValidationError) -> Self {
        CheckoutError::Rejected(CoreError::Validation(err))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

//! # Domain Errors
//!
//! `CoreError` is a reason to refuse a sale; `ValidationError` is malformed
//! input caught before any store access. The persistence crate wraps both
//! together with its own `DbError` in `CheckoutError`.

use thiserror::Error;

// =============================================================================
// Core Error
// =============================================================================

/// Business rule failures.
///
/// Every variant aborts the sale it occurs in; none are recovered partially.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A sale line references a product id that does not exist.
    #[error("Product not found: {0}")]
    ProductNotFound(String),

    /// Insufficient stock to complete a sale line.
    ///
    /// ## User Workflow
    /// ```text
    /// POST /api/sales { product: "Mouse", quantity: 5 }
    ///      │
    ///      ▼
    /// Guarded decrement: stock=3 < 5
    ///      │
    ///      ▼
    /// InsufficientStock { name: "Mouse", available: 3, requested: 5 }
    ///      │
    ///      ▼
    /// 400 "Insufficient stock for product: Mouse (available 3, requested 5)"
    /// ```
    #[error("Insufficient stock for product: {name} (available {available}, requested {requested})")]
    InsufficientStock {
        product_id: String,
        name: String,
        available: i64,
        requested: i64,
    },

    /// The authenticated buyer no longer exists.
    #[error("Buyer not found: {0}")]
    BuyerNotFound(String),

    /// Sale not found.
    #[error("Sale not found: {0}")]
    SaleNotFound(String),

    /// Monetary arithmetic left the representable range.
    #[error("Amount overflow while computing {context}")]
    AmountOverflow { context: String },

    /// Malformed input.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

// =============================================================================
// Validation Error
// =============================================================================

/// Rejected input, naming the offending field.
///
/// These are raised before any store access.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too short.
    #[error("{field} must be at least {min} characters")]
    TooShort { field: String, min: usize },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Value must be positive.
    #[error("{field} must be positive")]
    MustBePositive { field: String },

    /// Invalid format (e.g., invalid UUID, invalid email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// A collection that must contain entries is empty.
    #[error("{field} must contain at least one entry")]
    Empty { field: String },
}

// =============================================================================
// Result Type Alias
// =============================================================================

pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================

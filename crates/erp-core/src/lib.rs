//! # erp-core: Pure Business Logic for the ERP Backend
//!
//! This crate holds the domain model and every rule that can be expressed
//! without touching a database or the network.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        ERP Backend Architecture                         │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    apps/api (axum HTTP)                         │   │
//! │  │    /register, /login, /api/categories, /api/products, ...      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ erp-core (THIS CRATE) ★                         │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │   sale    │  │ permission│  │   │
//! │  │   │  Product  │  │   Money   │  │ SaleTally │  │ Permission│  │   │
//! │  │   │   Sale    │  │           │  │ requests  │  │    Set    │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                    erp-db (Database Layer)                      │   │
//! │  │     SQLite queries, migrations, sale transaction processor      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (Product, Sale, SaleItem, User, ...)
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`sale`] - Sale requests and the line-pricing tally
//! - [`permission`] - Named permissions and role permission sets
//! - [`error`] - Domain error types
//! - [`validation`] - Business rule validation
//!
//! ## Example Usage
//!
//! ```rust
//! use erp_core::money::Money;
//! use erp_core::sale::SaleTally;
//!
//! let mut tally = SaleTally::new();
//! tally.add_line("p-1", Money::from_cents(1000), 3).unwrap();
//! assert_eq!(tally.total().cents(), 3000);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod money;
pub mod permission;
pub mod sale;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports for Convenience
// =============================================================================

pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use permission::PermissionSet;
pub use sale::{CreateSaleRequest, SaleLineRequest, SaleTally};
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Role granted every permission (`*`). Seeded by the initial migration.
pub const ADMIN_ROLE_ID: &str = "00000000-0000-0000-0000-000000000001";

/// Role assigned to self-registered users. Seeded by the initial migration.
pub const USER_ROLE_ID: &str = "00000000-0000-0000-0000-000000000002";

/// Maximum line items allowed in a single sale request.
pub const MAX_SALE_LINES: usize = 100;

/// Maximum quantity on a single sale line.
///
/// ## Business Reason
/// Prevents accidental over-ordering (typing 100000 instead of 10).
pub const MAX_LINE_QUANTITY: i64 = 10_000;

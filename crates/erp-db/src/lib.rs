//! # erp-db: Database Layer for the ERP Backend
//!
//! This crate provides database access and the sale transaction processor.
//! It uses SQLite with sqlx for async operations.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        ERP Data Flow                                    │
//! │                                                                         │
//! │  HTTP handler (POST /api/sales)                                        │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     erp-db (THIS CRATE)                         │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │    │               │    │  (embedded)  │  │   │
//! │  │   │               │    │ ProductRepo   │    │              │  │   │
//! │  │   │ SqlitePool    │◄───│ SaleRepo      │    │ 001_initial  │  │   │
//! │  │   │               │    │ UserRepo ...  │    │              │  │   │
//! │  │   └───────▲───────┘    └───────▲───────┘    └──────────────┘  │   │
//! │  │           │                    │                               │   │
//! │  │   ┌───────┴────────────────────┴──────┐                        │   │
//! │  │   │  SaleProcessor (checkout.rs)      │  one transaction per   │   │
//! │  │   │  take stock → price → insert      │  sale, all-or-nothing  │   │
//! │  │   └───────────────────────────────────┘                        │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  SQLite database file (WAL)                                            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database and checkout error types
//! - [`repository`] - Repository implementations
//! - [`checkout`] - The sale transaction processor
//!
//! ## Usage
//!
//! ```rust,ignore
//! use erp_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("./erp.db")).await?;
//!
//! let products = db.products().list().await?;
//! let detail = db.sale_processor().create_sale(&buyer_id, &request).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod checkout;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use checkout::SaleProcessor;
pub use error::{CheckoutError, DbError, DbResult};
pub use pool::{Database, DbConfig};

// Repository re-exports for convenience
pub use repository::category::CategoryRepository;
pub use repository::product::ProductRepository;
pub use repository::role::RoleRepository;
pub use repository::sale::SaleRepository;
pub use repository::unit::UnitRepository;
pub use repository::user::UserRepository;

//! # Repository Module
//!
//! Database repository implementations for the ERP backend.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Two Ways In                                          │
//! │                                                                         │
//! │  HTTP handler                         SaleProcessor                    │
//! │       │                                    │                            │
//! │       │ db.products().get_by_id(id)        │ let mut tx = pool.begin() │
//! │       ▼                                    ▼                            │
//! │  &self methods                        associated fns taking            │
//! │  (own pooled connection,              &mut SqliteConnection            │
//! │   autocommit)                         (run inside the caller's tx)     │
//! │       │                                    │                            │
//! │       └──────────────┬─────────────────────┘                            │
//! │                      ▼                                                  │
//! │                SQLite Database                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`category::CategoryRepository`] - Category CRUD
//! - [`unit::UnitRepository`] - Unit-of-measure CRUD
//! - [`product::ProductRepository`] - Product CRUD and guarded stock take
//! - [`sale::SaleRepository`] - Sale append and detail reads
//! - [`user::UserRepository`] - Accounts
//! - [`role::RoleRepository`] - Roles and permission sets

pub mod category;
pub mod product;
pub mod role;
pub mod sale;
pub mod unit;
pub mod user;

//! # Domain Types
//!
//! Core domain types used throughout the ERP backend.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌───────────┐  ┌───────────┐       ┌─────────────────┐                │
//! │  │ Category  │  │   Unit    │◄──────│    Product      │                │
//! │  └─────▲─────┘  └───────────┘       │  price_cents    │                │
//! │        └────────────────────────────│  stock (>= 0)   │                │
//! │                                     └────────▲────────┘                │
//! │                                              │ product_id              │
//! │  ┌───────────┐  ┌───────────┐       ┌────────┴────────┐                │
//! │  │   Role    │◄─│   User    │◄──────│      Sale       │ 1 ─── n        │
//! │  │ perms set │  │ (buyer)   │       │  total_cents    │──► SaleItem    │
//! │  └───────────┘  └───────────┘       └─────────────────┘  price snapshot│
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All ids are UUID v4 strings.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;

// =============================================================================
// Category & Unit
// =============================================================================

/// A product category (Electronics, Food, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Category {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// A unit of measure (Piece, Kilogram, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Unit {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name, used in insufficient-stock messages.
    pub name: String,

    pub description: Option<String>,

    /// Current unit price in cents. Sale items copy this value.
    pub price_cents: i64,

    /// Units on hand. Never negative.
    pub stock: i64,

    pub category_id: String,

    pub unit_id: String,

    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,

    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the current price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }
}

// =============================================================================
// Roles & Users
// =============================================================================

/// A role owning a set of named permissions (see [`crate::permission`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Role {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
}

/// A user account. The password hash never leaves the server.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct User {
    pub id: String,
    pub username: String,
    pub email: String,
    /// Argon2 PHC string.
    #[serde(skip_serializing, default)]
    #[ts(skip)]
    pub password_hash: String,
    pub role_id: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// The buyer details embedded in a sale for presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct UserSummary {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role_id: String,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        UserSummary {
            id: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            role_id: user.role_id.clone(),
        }
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A committed sale. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct Sale {
    pub id: String,
    /// The buyer (authenticated user) who created the sale.
    pub user_id: String,
    /// Sum of all item subtotals.
    pub total_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Sale {
    /// Returns the total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line item in a sale.
/// Uses the snapshot pattern to freeze the unit price at time of sale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    /// Zero-based position in the client request.
    pub line_no: i64,
    pub product_id: String,
    /// Quantity sold (>= 1).
    pub quantity: i64,
    /// Unit price in cents at time of sale (frozen).
    pub price_cents: i64,
    /// price_cents × quantity.
    pub subtotal_cents: i64,
}

impl SaleItem {
    /// Returns the snapshotted unit price as Money.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    /// Returns the line subtotal as Money.
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }
}

// =============================================================================
// Presentation
// =============================================================================

/// A sale item with its product resolved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleItemDetail {
    pub item: SaleItem,
    pub product: Product,
}

/// A sale with buyer and per-item product details resolved.
///
/// This is what `POST /api/sales` and `GET /api/sales/{id}` return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleDetail {
    pub sale: Sale,
    pub buyer: UserSummary,
    pub items: Vec<SaleItemDetail>,
}

impl SaleDetail {
    /// Sum of the item subtotals. Equals `sale.total_cents` for any stored sale.
    pub fn items_total(&self) -> Money {
        self.items.iter().map(|d| d.item.subtotal()).sum()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

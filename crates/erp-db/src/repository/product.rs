//! # Product Repository
//!
//! Database operations for products.
//!
//! ## Key Operations
//! - CRUD through the pool
//! - Guarded stock take inside the caller's sale transaction
//!
//! ## Guarded Stock Take
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Stock Update Strategy                                │
//! │                                                                         │
//! │  ❌ WRONG: read, compare in Rust, write back                           │
//! │     SELECT stock ...            (two sales both read 5)                │
//! │     UPDATE ... SET stock = 2    (both write, one sale is lost)         │
//! │                                                                         │
//! │  ✅ CORRECT: compare-and-swap in one statement                         │
//! │     UPDATE products SET stock = stock - ?2                             │
//! │     WHERE id = ?1 AND stock >= ?2                                      │
//! │     RETURNING ...                                                      │
//! │                                                                         │
//! │  No row back → product missing OR not enough stock.                    │
//! │  Stock can never go below zero.                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use erp_core::Product;

/// Repository for product database operations.
///
/// ## Usage
/// ```rust,ignore
/// let repo = ProductRepository::new(pool);
/// let product = repo.get_by_id("uuid-here").await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    pool: SqlitePool,
}

impl ProductRepository {
    /// Creates a new ProductRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ProductRepository { pool }
    }

    /// Lists all products sorted by name.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        let products = sqlx::query_as::<_, Product>(
            r#"
            SELECT
                id, name, description, price_cents, stock,
                category_id, unit_id, created_at, updated_at
            FROM products
            ORDER BY name, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(products)
    }

    /// Gets a product by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - Product found
    /// * `Ok(None)` - Product not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Product>> {
        let mut conn = self.pool.acquire().await?;
        Self::get_in(&mut conn, id).await
    }

    /// Inserts a new product.
    ///
    /// ## Returns
    /// * `Err(DbError::ForeignKeyViolation)` - unknown category or unit
    pub async fn insert(&self, product: &Product) -> DbResult<Product> {
        debug!(name = %product.name, "Inserting product");

        sqlx::query(
            r#"
            INSERT INTO products (
                id, name, description, price_cents, stock,
                category_id, unit_id, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(product.stock)
        .bind(&product.category_id)
        .bind(&product.unit_id)
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(product.clone())
    }

    /// Updates every mutable field of a product and refreshes `updated_at`.
    ///
    /// Past sales keep their own price snapshot, so a price change here
    /// never alters recorded sales.
    pub async fn update(&self, product: &Product) -> DbResult<Product> {
        debug!(id = %product.id, "Updating product");

        let updated = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products SET
                name = ?2,
                description = ?3,
                price_cents = ?4,
                stock = ?5,
                category_id = ?6,
                unit_id = ?7,
                updated_at = ?8
            WHERE id = ?1
            RETURNING
                id, name, description, price_cents, stock,
                category_id, unit_id, created_at, updated_at
            "#,
        )
        .bind(&product.id)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.price_cents)
        .bind(product.stock)
        .bind(&product.category_id)
        .bind(&product.unit_id)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        updated.ok_or_else(|| DbError::not_found("Product", &product.id))
    }

    /// Deletes a product.
    ///
    /// ## Returns
    /// * `Err(DbError::ForeignKeyViolation)` - the product appears in a sale
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        debug!(id = %id, "Deleting product");

        let result = sqlx::query("DELETE FROM products WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Product", id));
        }

        Ok(())
    }

    /// Counts products (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // =========================================================================
    // In-transaction operations
    // =========================================================================

    /// Reads a product on the given connection (usually an open transaction).
    pub async fn get_in(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Product>> {
        let product = sqlx::query_as::<_, Product>(
            r#"
            SELECT
                id, name, description, price_cents, stock,
                category_id, unit_id, created_at, updated_at
            FROM products
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(conn)
        .await?;

        Ok(product)
    }

    /// Takes `quantity` units of stock if, and only if, enough is on hand.
    ///
    /// ## Returns
    /// * `Ok(Some(Product))` - the product AFTER the decrement
    /// * `Ok(None)` - product missing or stock < quantity; nothing changed
    ///
    /// Run as the first statement of a line inside the sale transaction, so
    /// SQLite grants the write lock here (waiting up to busy_timeout).
    pub async fn take_stock(
        conn: &mut SqliteConnection,
        id: &str,
        quantity: i64,
        now: DateTime<Utc>,
    ) -> DbResult<Option<Product>> {
        debug!(id = %id, quantity = quantity, "Taking stock");

        let product = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
            SET stock = stock - ?2, updated_at = ?3
            WHERE id = ?1 AND stock >= ?2
            RETURNING
                id, name, description, price_cents, stock,
                category_id, unit_id, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(quantity)
        .bind(now)
        .fetch_optional(conn)
        .await?;

        Ok(product)
    }
}

/// Generates a new product ID.
pub fn generate_product_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

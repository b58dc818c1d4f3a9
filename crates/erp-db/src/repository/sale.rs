//! # Sale Repository
//!
//! Durable append of sales and their items, plus the read side used by
//! `GET /api/sales`.
//!
//! ## Sale Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Sale Lifecycle                                    │
//! │                                                                         │
//! │  1. SaleProcessor opens a transaction and takes stock line by line     │
//! │                                                                         │
//! │  2. insert_in(&mut tx, sale, items)   ← THIS MODULE                    │
//! │     └── INSERT sales, INSERT sale_items (same transaction)             │
//! │                                                                         │
//! │  3. COMMIT                                                             │
//! │                                                                         │
//! │  There is no update or delete: a committed sale is history.            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::product::ProductRepository;
use crate::repository::user::UserRepository;
use erp_core::{Product, Sale, SaleDetail, SaleItem, SaleItemDetail};

/// Default page size of `list_details`.
pub const DEFAULT_LIST_LIMIT: u32 = 100;

/// Upper bound accepted by `list_details`.
pub const MAX_LIST_LIMIT: u32 = 500;

/// Repository for sale database operations.
#[derive(Debug, Clone)]
pub struct SaleRepository {
    pool: SqlitePool,
}

impl SaleRepository {
    /// Creates a new SaleRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SaleRepository { pool }
    }

    /// Gets a sale row by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Sale>> {
        let sale = sqlx::query_as::<_, Sale>(
            "SELECT id, user_id, total_cents, created_at FROM sales WHERE id = ?1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(sale)
    }

    /// Gets a sale with buyer and product details resolved.
    pub async fn get_detail(&self, id: &str) -> DbResult<Option<SaleDetail>> {
        match self.get_by_id(id).await? {
            Some(sale) => Ok(Some(self.resolve(sale).await?)),
            None => Ok(None),
        }
    }

    /// Lists sale details, newest first.
    ///
    /// `limit` is clamped to 1..=MAX_LIST_LIMIT.
    pub async fn list_details(&self, limit: u32) -> DbResult<Vec<SaleDetail>> {
        let limit = limit.clamp(1, MAX_LIST_LIMIT);

        let sales = sqlx::query_as::<_, Sale>(
            r#"
            SELECT id, user_id, total_cents, created_at
            FROM sales
            ORDER BY created_at DESC, id
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        let mut details = Vec::with_capacity(sales.len());
        for sale in sales {
            details.push(self.resolve(sale).await?);
        }

        Ok(details)
    }

    /// Counts sales (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sales")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn resolve(&self, sale: Sale) -> DbResult<SaleDetail> {
        let mut conn = self.pool.acquire().await?;

        let buyer = UserRepository::summary_in(&mut conn, &sale.user_id)
            .await?
            .ok_or_else(|| DbError::not_found("User", &sale.user_id))?;

        let items = Self::items_in(&mut conn, &sale.id).await?;

        let mut products: HashMap<String, Product> = HashMap::new();
        let mut resolved = Vec::with_capacity(items.len());
        for item in items {
            let product = match products.get(&item.product_id) {
                Some(product) => product.clone(),
                None => {
                    let product = ProductRepository::get_in(&mut conn, &item.product_id)
                        .await?
                        .ok_or_else(|| DbError::not_found("Product", &item.product_id))?;
                    products.insert(product.id.clone(), product.clone());
                    product
                }
            };
            resolved.push(SaleItemDetail { item, product });
        }

        Ok(SaleDetail {
            sale,
            buyer,
            items: resolved,
        })
    }

    // =========================================================================
    // In-transaction operations
    // =========================================================================

    /// Reads the items of a sale, ordered by line number.
    pub async fn items_in(conn: &mut SqliteConnection, sale_id: &str) -> DbResult<Vec<SaleItem>> {
        let items = sqlx::query_as::<_, SaleItem>(
            r#"
            SELECT
                id, sale_id, line_no, product_id,
                quantity, price_cents, subtotal_cents
            FROM sale_items
            WHERE sale_id = ?1
            ORDER BY line_no
            "#,
        )
        .bind(sale_id)
        .fetch_all(conn)
        .await?;

        Ok(items)
    }

    /// Inserts a sale and all of its items on the given connection.
    ///
    /// Meant to run inside the sale transaction; nothing is visible to
    /// other connections until the caller commits.
    pub async fn insert_in(
        conn: &mut SqliteConnection,
        sale: &Sale,
        items: &[SaleItem],
    ) -> DbResult<()> {
        debug!(id = %sale.id, items = items.len(), total_cents = sale.total_cents, "Inserting sale");

        sqlx::query(
            r#"
            INSERT INTO sales (id, user_id, total_cents, created_at)
            VALUES (?1, ?2, ?3, ?4)
            "#,
        )
        .bind(&sale.id)
        .bind(&sale.user_id)
        .bind(sale.total_cents)
        .bind(sale.created_at)
        .execute(&mut *conn)
        .await?;

        for item in items {
            sqlx::query(
                r#"
                INSERT INTO sale_items (
                    id, sale_id, line_no, product_id,
                    quantity, price_cents, subtotal_cents
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                "#,
            )
            .bind(&item.id)
            .bind(&item.sale_id)
            .bind(item.line_no)
            .bind(&item.product_id)
            .bind(item.quantity)
            .bind(item.price_cents)
            .bind(item.subtotal_cents)
            .execute(&mut *conn)
            .await?;
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::{new_category, new_product, new_unit, new_user};
    use crate::{Database, DbConfig};
    use chrono::{Duration, Utc};
    use erp_core::{Money, SaleTally};

    async fn setup() -> (Database, Product, String) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let category = db.categories().insert(&new_category("Food")).await.unwrap();
        let unit = db.units().insert(&new_unit("Piece")).await.unwrap();
        let product = db
            .products()
            .insert(&new_product("Bread", 250, 10, &category.id, &unit.id))
            .await
            .unwrap();
        let user = db.users().insert(&new_user("alice")).await.unwrap();
        (db, product, user.id)
    }

    async fn record(db: &Database, product: &Product, buyer: &str, qty: i64, minutes_ago: i64) -> Sale {
        let mut tally = SaleTally::new();
        tally
            .add_line(&product.id, Money::from_cents(product.price_cents), qty)
            .unwrap();
        let at = Utc::now() - Duration::minutes(minutes_ago);
        let (sale, items) = tally.into_records(uuid::Uuid::new_v4().to_string(), buyer, at);

        let mut conn = db.pool().acquire().await.unwrap();
        SaleRepository::insert_in(&mut conn, &sale, &items).await.unwrap();
        sale
    }

    #[tokio::test]
    async fn test_insert_and_get_detail() {
        let (db, product, buyer) = setup().await;
        let sale = record(&db, &product, &buyer, 4, 0).await;

        let detail = db.sales().get_detail(&sale.id).await.unwrap().unwrap();
        assert_eq!(detail.sale.total_cents, 1000);
        assert_eq!(detail.buyer.username, "alice");
        assert_eq!(detail.items.len(), 1);
        assert_eq!(detail.items[0].product.name, "Bread");
        assert_eq!(detail.items_total(), detail.sale.total());
    }

    #[tokio::test]
    async fn test_missing_sale() {
        let (db, _, _) = setup().await;
        assert!(db.sales().get_detail("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_newest_first_with_limit() {
        let (db, product, buyer) = setup().await;
        let old = record(&db, &product, &buyer, 1, 30).await;
        let new = record(&db, &product, &buyer, 2, 1).await;

        let all = db.sales().list_details(DEFAULT_LIST_LIMIT).await.unwrap();
        let ids: Vec<_> = all.iter().map(|d| d.sale.id.clone()).collect();
        assert_eq!(ids, vec![new.id.clone(), old.id]);

        let one = db.sales().list_details(1).await.unwrap();
        assert_eq!(one.len(), 1);
        assert_eq!(one[0].sale.id, new.id);
        assert_eq!(db.sales().count().await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_product_in_sale_cannot_be_deleted() {
        let (db, product, buyer) = setup().await;
        record(&db, &product, &buyer, 1, 0).await;

        let err = db.products().delete(&product.id).await.unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }

    #[tokio::test]
    async fn test_subtotal_check_constraint() {
        let (db, product, buyer) = setup().await;
        let sale = Sale {
            id: uuid::Uuid::new_v4().to_string(),
            user_id: buyer,
            total_cents: 999,
            created_at: Utc::now(),
        };
        let bad_item = SaleItem {
            id: uuid::Uuid::new_v4().to_string(),
            sale_id: sale.id.clone(),
            line_no: 0,
            product_id: product.id.clone(),
            quantity: 2,
            price_cents: 250,
            subtotal_cents: 999,
        };

        let mut conn = db.pool().acquire().await.unwrap();
        let err = SaleRepository::insert_in(&mut conn, &sale, &[bad_item])
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::CheckViolation { .. }));
    }
}

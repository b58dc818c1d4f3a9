//! # Sale Transaction Processor
//!
//! Turns a buyer and a list of (product, quantity) lines into a committed
//! sale, or into nothing at all.
//!
//! ## Unit of Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  create_sale(buyer_id, request)                                        │
//! │                                                                         │
//! │  validate_sale_request ── empty / qty <= 0 / bad id ──► Rejected       │
//! │       │                   (no transaction opened)                      │
//! │       ▼                                                                 │
//! │  BEGIN ─────────────────────────────────────────────────────────┐      │
//! │  │ for each line, in request order:                              │      │
//! │  │    UPDATE products SET stock = stock - q                      │      │
//! │  │    WHERE id = ? AND stock >= q RETURNING ...                  │      │
//! │  │        │                                                      │      │
//! │  │        ├── no row, product missing  ──► ProductNotFound ──┐   │      │
//! │  │        ├── no row, stock < q        ──► InsufficientStock ┤   │      │
//! │  │        ▼                                                   │   │      │
//! │  │    tally.add_line(price snapshot, q)                       │   │      │
//! │  │ buyer lookup ─────────── missing ──► BuyerNotFound ────────┤   │      │
//! │  │ INSERT sales, INSERT sale_items                            │   │      │
//! │  COMMIT ◄── only success path              tx dropped ◄───────┘   │      │
//! │       │                                    = ROLLBACK             │      │
//! │       ▼                                                           │      │
//! │  SaleDetail (sale + buyer + items with products)                  │      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency
//! The guarded UPDATE is the first statement of every line, so SQLite hands
//! this transaction the write lock immediately (a competing sale waits in the
//! busy handler) and stock can never be taken below zero. If the future is
//! dropped before commit (client gone, request timeout), the transaction is
//! dropped with it and rolls back.

use chrono::Utc;
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{info, instrument, warn};
use uuid::Uuid;

use crate::error::{CheckoutError, DbError};
use crate::repository::product::ProductRepository;
use crate::repository::sale::SaleRepository;
use crate::repository::user::UserRepository;
use erp_core::validation::validate_sale_request;
use erp_core::{
    CoreError, CreateSaleRequest, Product, SaleDetail, SaleItemDetail, SaleLineRequest, SaleTally,
};

/// Processes sale requests against the database.
#[derive(Debug, Clone)]
pub struct SaleProcessor {
    pool: SqlitePool,
}

impl SaleProcessor {
    pub fn new(pool: SqlitePool) -> Self {
        SaleProcessor { pool }
    }

    /// Creates a sale for `buyer_id`.
    ///
    /// ## Returns
    /// * `Ok(SaleDetail)` - committed sale with buyer and product details
    /// * `Err(CheckoutError::Rejected(_))` - validation, unknown product,
    ///   insufficient stock, unknown buyer; nothing was written
    /// * `Err(CheckoutError::Store(_))` - persistence fault; nothing was written
    #[instrument(skip(self, request), fields(lines = request.items.len()))]
    pub async fn create_sale(
        &self,
        buyer_id: &str,
        request: &CreateSaleRequest,
    ) -> Result<SaleDetail, CheckoutError> {
        validate_sale_request(request)?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        let mut tally = SaleTally::new();
        let mut snapshots: Vec<Product> = Vec::with_capacity(request.items.len());

        for line in &request.items {
            let product = match ProductRepository::take_stock(
                &mut tx,
                &line.product_id,
                line.quantity,
                Utc::now(),
            )
            .await?
            {
                Some(product) => product,
                None => return Err(Self::rejection(&mut tx, line).await?.into()),
            };

            tally.add_line(product.id.as_str(), product.price(), line.quantity)?;
            snapshots.push(product);
        }

        let buyer = UserRepository::summary_in(&mut tx, buyer_id)
            .await?
            .ok_or_else(|| CoreError::BuyerNotFound(buyer_id.to_string()))?;

        // Stamped once the write lock is held, so creation order matches commit order.
        let created_at = Utc::now();
        let (sale, items) = tally.into_records(Uuid::new_v4().to_string(), &buyer.id, created_at);
        SaleRepository::insert_in(&mut tx, &sale, &items).await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            sale_id = %sale.id,
            total_cents = sale.total_cents,
            items = items.len(),
            "Sale committed"
        );

        // One snapshot per line, in the same order as the items.
        let items = items
            .into_iter()
            .zip(snapshots)
            .map(|(item, product)| SaleItemDetail { item, product })
            .collect();

        Ok(SaleDetail { sale, buyer, items })
    }

    /// Explains why the guarded stock take refused a line.
    async fn rejection(
        conn: &mut SqliteConnection,
        line: &SaleLineRequest,
    ) -> Result<CoreError, DbError> {
        let err = match ProductRepository::get_in(conn, &line.product_id).await? {
            None => CoreError::ProductNotFound(line.product_id.clone()),
            Some(product) => CoreError::InsufficientStock {
                product_id: product.id,
                name: product.name,
                available: product.stock,
                requested: line.quantity,
            },
        };

        warn!(product_id = %line.product_id, error = %err, "Sale rejected");
        Ok(err)
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
    use std::path::{Path, PathBuf};
    use std::time::Duration;

    struct Fixture {
        db: Database,
        buyer: String,
        category_id: String,
        unit_id: String,
    }

    impl Fixture {
        async fn with(db: Database) -> Self {
            let category = db.categories().insert(&new_category("Electronics")).await.unwrap();
            let unit = db.units().insert(&new_unit("Piece")).await.unwrap();
            let buyer = db.users().insert(&new_user("alice")).await.unwrap();
            Fixture {
                db,
                buyer: buyer.id,
                category_id: category.id,
                unit_id: unit.id,
            }
        }

        async fn in_memory() -> Self {
            Self::with(Database::new(DbConfig::in_memory()).await.unwrap()).await
        }

        async fn product(&self, name: &str, price_cents: i64, stock: i64) -> Product {
            self.db
                .products()
                .insert(&new_product(name, price_cents, stock, &self.category_id, &self.unit_id))
                .await
                .unwrap()
        }

        async fn stock_of(&self, id: &str) -> i64 {
            self.db.products().get_by_id(id).await.unwrap().unwrap().stock
        }

        async fn sale_count(&self) -> i64 {
            self.db.sales().count().await.unwrap()
        }
    }

    fn request(lines: &[(&str, i64)]) -> CreateSaleRequest {
        CreateSaleRequest {
            items: lines
                .iter()
                .map(|(id, qty)| SaleLineRequest {
                    product_id: id.to_string(),
                    quantity: *qty,
                })
                .collect(),
        }
    }

    fn temp_db_path() -> PathBuf {
        std::env::temp_dir().join(format!("erp-checkout-{}.db", Uuid::new_v4()))
    }

    fn remove_db_files(path: &Path) {
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
        }
    }

    // -------------------------------------------------------------------------
    // Happy path
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_sale_decrements_stock_and_totals() {
        let f = Fixture::in_memory().await;
        let mouse = f.product("Mouse", 1000, 5).await;

        let detail = f
            .db
            .sale_processor()
            .create_sale(&f.buyer, &request(&[(mouse.id.as_str(), 3)]))
            .await
            .unwrap();

        assert_eq!(detail.sale.total_cents, 3000);
        assert_eq!(detail.sale.user_id, f.buyer);
        assert_eq!(detail.buyer.username, "alice");
        assert_eq!(detail.items.len(), 1);
        assert_eq!(detail.items[0].item.price_cents, 1000);
        assert_eq!(detail.items[0].item.subtotal_cents, 3000);
        assert_eq!(detail.items[0].product.name, "Mouse");
        assert_eq!(f.stock_of(&mouse.id).await, 2);

        // What was returned is what was stored.
        let stored = f.db.sales().get_detail(&detail.sale.id).await.unwrap().unwrap();
        assert_eq!(stored.sale, detail.sale);
        assert_eq!(stored.items_total(), stored.sale.total());
    }

    #[tokio::test]
    async fn test_multi_line_sale_keeps_request_order() {
        let f = Fixture::in_memory().await;
        let mouse = f.product("Mouse", 1000, 5).await;
        let cable = f.product("Cable", 250, 10).await;

        let detail = f
            .db
            .sale_processor()
            .create_sale(&f.buyer, &request(&[(cable.id.as_str(), 4), (mouse.id.as_str(), 1)]))
            .await
            .unwrap();

        assert_eq!(detail.sale.total_cents, 4 * 250 + 1000);
        let order: Vec<_> = detail.items.iter().map(|d| d.item.line_no).collect();
        assert_eq!(order, vec![0, 1]);
        assert_eq!(detail.items[0].product.id, cable.id);
        assert_eq!(f.stock_of(&cable.id).await, 6);
        assert_eq!(f.stock_of(&mouse.id).await, 4);
    }

    #[tokio::test]
    async fn test_exact_stock_can_be_sold_out() {
        let f = Fixture::in_memory().await;
        let mouse = f.product("Mouse", 1000, 3).await;

        f.db.sale_processor()
            .create_sale(&f.buyer, &request(&[(mouse.id.as_str(), 3)]))
            .await
            .unwrap();

        assert_eq!(f.stock_of(&mouse.id).await, 0);
    }

    // -------------------------------------------------------------------------
    // Rejections roll everything back
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_insufficient_stock() {
        let f = Fixture::in_memory().await;
        let mouse = f.product("Mouse", 1000, 2).await;

        let err = f
            .db
            .sale_processor()
            .create_sale(&f.buyer, &request(&[(mouse.id.as_str(), 3)]))
            .await
            .unwrap_err();

        match err {
            CheckoutError::Rejected(CoreError::InsufficientStock {
                name,
                available,
                requested,
                ..
            }) => {
                assert_eq!(name, "Mouse");
                assert_eq!(available, 2);
                assert_eq!(requested, 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert_eq!(f.stock_of(&mouse.id).await, 2);
        assert_eq!(f.sale_count().await, 0);
    }

    #[tokio::test]
    async fn test_missing_second_product_leaves_first_untouched() {
        let f = Fixture::in_memory().await;
        let mouse = f.product("Mouse", 1000, 5).await;
        let missing = Uuid::new_v4().to_string();

        let err = f
            .db
            .sale_processor()
            .create_sale(&f.buyer, &request(&[(mouse.id.as_str(), 2), (missing.as_str(), 1)]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CheckoutError::Rejected(CoreError::ProductNotFound(ref id)) if *id == missing
        ));
        assert_eq!(f.stock_of(&mouse.id).await, 5);
        assert_eq!(f.sale_count().await, 0);
    }

    #[tokio::test]
    async fn test_failure_at_last_line_rolls_back_all_lines() {
        let f = Fixture::in_memory().await;
        let a = f.product("A", 100, 5).await;
        let b = f.product("B", 200, 5).await;
        let c = f.product("C", 300, 1).await;

        let err = f
            .db
            .sale_processor()
            .create_sale(&f.buyer, &request(&[(a.id.as_str(), 1), (b.id.as_str(), 2), (c.id.as_str(), 2)]))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            CheckoutError::Rejected(CoreError::InsufficientStock { .. })
        ));
        assert_eq!(f.stock_of(&a.id).await, 5);
        assert_eq!(f.stock_of(&b.id).await, 5);
        assert_eq!(f.stock_of(&c.id).await, 1);
        assert_eq!(f.sale_count().await, 0);
    }

    #[tokio::test]
    async fn test_duplicate_lines_checked_against_live_stock() {
        let f = Fixture::in_memory().await;
        let mouse = f.product("Mouse", 1000, 5).await;

        let err = f
            .db
            .sale_processor()
            .create_sale(&f.buyer, &request(&[(mouse.id.as_str(), 3), (mouse.id.as_str(), 3)]))
            .await
            .unwrap_err();

        // The second line sees the 2 left by the first.
        assert!(matches!(
            err,
            CheckoutError::Rejected(CoreError::InsufficientStock { available: 2, requested: 3, .. })
        ));
        assert_eq!(f.stock_of(&mouse.id).await, 5);

        let detail = f
            .db
            .sale_processor()
            .create_sale(&f.buyer, &request(&[(mouse.id.as_str(), 3), (mouse.id.as_str(), 2)]))
            .await
            .unwrap();
        assert_eq!(detail.items.len(), 2);
        assert_eq!(detail.sale.total_cents, 5000);
        assert_eq!(f.stock_of(&mouse.id).await, 0);
    }

    #[tokio::test]
    async fn test_validation_happens_before_the_store() {
        let f = Fixture::in_memory().await;
        let mouse = f.product("Mouse", 1000, 5).await;
        let processor = f.db.sale_processor();

        let empty = processor.create_sale(&f.buyer, &request(&[])).await.unwrap_err();
        assert!(matches!(empty, CheckoutError::Rejected(CoreError::Validation(_))));

        let zero = processor
            .create_sale(&f.buyer, &request(&[(mouse.id.as_str(), 0)]))
            .await
            .unwrap_err();
        assert!(matches!(zero, CheckoutError::Rejected(CoreError::Validation(_))));

        let negative = processor
            .create_sale(&f.buyer, &request(&[(mouse.id.as_str(), -2)]))
            .await
            .unwrap_err();
        assert!(matches!(negative, CheckoutError::Rejected(CoreError::Validation(_))));

        assert_eq!(f.stock_of(&mouse.id).await, 5);
    }

    #[tokio::test]
    async fn test_unknown_buyer_rolls_back() {
        let f = Fixture::in_memory().await;
        let mouse = f.product("Mouse", 1000, 5).await;

        let err = f
            .db
            .sale_processor()
            .create_sale("ghost", &request(&[(mouse.id.as_str(), 1)]))
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::Rejected(CoreError::BuyerNotFound(_))));
        assert_eq!(f.stock_of(&mouse.id).await, 5);
        assert_eq!(f.sale_count().await, 0);
    }

    #[tokio::test]
    async fn test_price_change_does_not_alter_recorded_sale() {
        let f = Fixture::in_memory().await;
        let mouse = f.product("Mouse", 1000, 5).await;

        let detail = f
            .db
            .sale_processor()
            .create_sale(&f.buyer, &request(&[(mouse.id.as_str(), 2)]))
            .await
            .unwrap();

        let mut repriced = f.db.products().get_by_id(&mouse.id).await.unwrap().unwrap();
        repriced.price_cents = 9999;
        f.db.products().update(&repriced).await.unwrap();

        let stored = f.db.sales().get_detail(&detail.sale.id).await.unwrap().unwrap();
        assert_eq!(stored.sale.total_cents, 2000);
        assert_eq!(stored.items[0].item.price_cents, 1000);
        assert_eq!(stored.items[0].item.subtotal_cents, 2000);
        // The resolved product shows today's price, the item keeps its snapshot.
        assert_eq!(stored.items[0].product.price_cents, 9999);
    }

    #[tokio::test]
    async fn test_dropped_transaction_rolls_back() {
        let f = Fixture::in_memory().await;
        let mouse = f.product("Mouse", 1000, 5).await;

        {
            let mut tx = f.db.pool().begin().await.unwrap();
            let taken = ProductRepository::take_stock(&mut tx, &mouse.id, 4, Utc::now())
                .await
                .unwrap();
            assert_eq!(taken.unwrap().stock, 1);
            // tx dropped without commit
        }

        assert_eq!(f.stock_of(&mouse.id).await, 5);
    }

    #[tokio::test]
    async fn test_store_fault_after_stock_taken_rolls_back() {
        let f = Fixture::in_memory().await;
        let mouse = f.product("Mouse", 1000, 5).await;

        // Stock is decremented before the item insert fails.
        sqlx::query(
            "CREATE TRIGGER reject_sale_items BEFORE INSERT ON sale_items \
             BEGIN SELECT RAISE(ABORT, 'disk fault'); END",
        )
        .execute(f.db.pool())
        .await
        .unwrap();

        let err = f
            .db
            .sale_processor()
            .create_sale(&f.buyer, &request(&[(mouse.id.as_str(), 3)]))
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::Store(_)), "got {err:?}");
        assert_eq!(f.stock_of(&mouse.id).await, 5);
        assert_eq!(f.sale_count().await, 0);
    }

    #[tokio::test]
    async fn test_duplicate_lines_keep_their_own_snapshot() {
        let f = Fixture::in_memory().await;
        let mouse = f.product("Mouse", 1000, 5).await;

        let detail = f
            .db
            .sale_processor()
            .create_sale(&f.buyer, &request(&[(mouse.id.as_str(), 3), (mouse.id.as_str(), 2)]))
            .await
            .unwrap();

        assert_eq!(detail.items[0].item.quantity, 3);
        assert_eq!(detail.items[0].product.stock, 2);
        assert_eq!(detail.items[1].item.quantity, 2);
        assert_eq!(detail.items[1].product.stock, 0);
    }

    // -------------------------------------------------------------------------
    // Concurrency (file database, several connections)
    // -------------------------------------------------------------------------

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_sales_never_oversell() {
        let path = temp_db_path();
        let db = Database::new(DbConfig::new(&path).max_connections(4)).await.unwrap();
        let f = Fixture::with(db).await;
        let mouse = f.product("Mouse", 1000, 5).await;

        let mut handles = Vec::new();
        for _ in 0..2 {
            let processor = f.db.sale_processor();
            let buyer = f.buyer.clone();
            let req = request(&[(mouse.id.as_str(), 3)]);
            handles.push(tokio::spawn(async move {
                processor.create_sale(&buyer, &req).await
            }));
        }

        let mut ok = 0;
        let mut short = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => ok += 1,
                Err(CheckoutError::Rejected(CoreError::InsufficientStock { .. })) => short += 1,
                Err(other) => panic!("unexpected error: {other:?}"),
            }
        }

        assert_eq!((ok, short), (1, 1));
        assert_eq!(f.stock_of(&mouse.id).await, 2);
        assert_eq!(f.sale_count().await, 1);

        f.db.close().await;
        remove_db_files(&path);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_many_buyers_drain_stock_exactly() {
        let path = temp_db_path();
        let db = Database::new(DbConfig::new(&path).max_connections(4)).await.unwrap();
        let f = Fixture::with(db).await;
        let mouse = f.product("Mouse", 1000, 5).await;

        let handles: Vec<_> = (0..10)
            .map(|_| {
                let processor = f.db.sale_processor();
                let buyer = f.buyer.clone();
                let req = request(&[(mouse.id.as_str(), 1)]);
                tokio::spawn(async move { processor.create_sale(&buyer, &req).await })
            })
            .collect();

        let mut ok = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                ok += 1;
            }
        }

        assert_eq!(ok, 5);
        assert_eq!(f.stock_of(&mouse.id).await, 0);
        assert_eq!(f.sale_count().await, 5);

        f.db.close().await;
        remove_db_files(&path);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_cancelled_sale_leaves_no_trace() {
        let path = temp_db_path();
        let db = Database::new(DbConfig::new(&path).max_connections(4)).await.unwrap();
        let f = Fixture::with(db).await;
        let mouse = f.product("Mouse", 1000, 5).await;

        // Another writer holds the lock, so the sale blocks on its first UPDATE.
        let mut holder = f.db.pool().begin().await.unwrap();
        ProductRepository::take_stock(&mut holder, &mouse.id, 1, Utc::now())
            .await
            .unwrap();

        let processor = f.db.sale_processor();
        let outcome = tokio::time::timeout(
            Duration::from_millis(200),
            processor.create_sale(&f.buyer, &request(&[(mouse.id.as_str(), 2)])),
        )
        .await;
        assert!(outcome.is_err(), "sale should still be waiting for the lock");

        holder.rollback().await.unwrap();

        assert_eq!(f.stock_of(&mouse.id).await, 5);
        assert_eq!(f.sale_count().await, 0);

        f.db.close().await;
        remove_db_files(&path);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_sale_is_stamped_after_waiting_for_the_lock() {
        let path = temp_db_path();
        let db = Database::new(DbConfig::new(&path).max_connections(4)).await.unwrap();
        let f = Fixture::with(db).await;
        let mouse = f.product("Mouse", 1000, 5).await;

        let mut holder = f.db.pool().begin().await.unwrap();
        ProductRepository::take_stock(&mut holder, &mouse.id, 1, Utc::now())
            .await
            .unwrap();

        let processor = f.db.sale_processor();
        let buyer = f.buyer.clone();
        let req = request(&[(mouse.id.as_str(), 2)]);
        let pending = tokio::spawn(async move { processor.create_sale(&buyer, &req).await });

        tokio::time::sleep(Duration::from_millis(300)).await;
        let released_at = Utc::now();
        holder.commit().await.unwrap();

        let detail = pending.await.unwrap().unwrap();
        assert!(detail.sale.created_at >= released_at);
        assert_eq!(f.stock_of(&mouse.id).await, 2);

        f.db.close().await;
        remove_db_files(&path);
    }
}

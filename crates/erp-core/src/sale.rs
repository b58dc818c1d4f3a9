//! # Sale Pricing
//!
//! Request types for `POST /api/sales` and the tally that prices each line
//! while the sale processor walks the request.
//!
//! ## Where the Tally Sits
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  SaleProcessor (erp-db)                                                │
//! │                                                                         │
//! │  for each line, in request order:                                      │
//! │     take stock (guarded UPDATE ... RETURNING product)                  │
//! │          │                                                              │
//! │          ▼                                                              │
//! │     tally.add_line(product_id, product.price(), qty) ← THIS MODULE     │
//! │          │   snapshot price, subtotal = price × qty, total += subtotal │
//! │          ▼                                                              │
//! │  tally.into_records(...) → (Sale, Vec<SaleItem>) → INSERT → COMMIT     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! All arithmetic is checked. An overflow is reported as
//! [`CoreError::AmountOverflow`] and aborts the sale.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Sale, SaleItem};

// =============================================================================
// Requests
// =============================================================================

/// One requested line: a product and a quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct SaleLineRequest {
    pub product_id: String,
    pub quantity: i64,
}

/// Body of `POST /api/sales`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CreateSaleRequest {
    pub items: Vec<SaleLineRequest>,
}

// =============================================================================
// Tally
// =============================================================================

/// A line that has been priced.
#[derive(Debug, Clone, PartialEq, Eq)]
struct PricedLine {
    /// Position in the request, starting at 0.
    line_no: i64,
    product_id: String,
    /// Price snapshot taken when the line was added.
    unit_price: Money,
    quantity: i64,
    subtotal: Money,
}

/// Running tally of priced lines and the order total.
#[derive(Debug, Clone, Default)]
pub struct SaleTally {
    lines: Vec<PricedLine>,
    total: Money,
}

impl SaleTally {
    pub fn new() -> Self {
        SaleTally::default()
    }

    /// Prices one line and adds it to the total.
    ///
    /// Returns the line subtotal.
    pub fn add_line(
        &mut self,
        product_id: impl Into<String>,
        unit_price: Money,
        quantity: i64,
    ) -> CoreResult<Money> {
        let line_no = self.lines.len() as i64;

        let subtotal = unit_price
            .checked_multiply_quantity(quantity)
            .ok_or_else(|| CoreError::AmountOverflow {
                context: format!("subtotal of line {line_no}"),
            })?;

        self.total = self
            .total
            .checked_add(subtotal)
            .ok_or_else(|| CoreError::AmountOverflow {
                context: "sale total".to_string(),
            })?;

        self.lines.push(PricedLine {
            line_no,
            product_id: product_id.into(),
            unit_price,
            quantity,
            subtotal,
        });

        Ok(subtotal)
    }

    /// Sum of all line subtotals so far.
    pub fn total(&self) -> Money {
        self.total
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Builds the sale row and its item rows.
    ///
    /// Item ids are fresh UUIDs; items keep the request order.
    pub fn into_records(
        self,
        sale_id: impl Into<String>,
        buyer_id: impl Into<String>,
        now: DateTime<Utc>,
    ) -> (Sale, Vec<SaleItem>) {
        let sale = Sale {
            id: sale_id.into(),
            user_id: buyer_id.into(),
            total_cents: self.total.cents(),
            created_at: now,
        };

        let items = self
            .lines
            .into_iter()
            .map(|line| SaleItem {
                id: Uuid::new_v4().to_string(),
                sale_id: sale.id.clone(),
                line_no: line.line_no,
                product_id: line.product_id,
                quantity: line.quantity,
                price_cents: line.unit_price.cents(),
                subtotal_cents: line.subtotal.cents(),
            })
            .collect();

        (sale, items)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tally_total() {
        let mut tally = SaleTally::new();
        assert!(tally.is_empty());

        let first = tally.add_line("p-1", Money::from_cents(1000), 3).unwrap();
        let second = tally.add_line("p-2", Money::from_cents(250), 2).unwrap();

        assert_eq!(first.cents(), 3000);
        assert_eq!(second.cents(), 500);
        assert_eq!(tally.total().cents(), 3500);
        assert!(!tally.is_empty());
    }

    #[test]
    fn test_subtotal_overflow() {
        let mut tally = SaleTally::new();
        let err = tally
            .add_line("p-1", Money::from_cents(i64::MAX / 2), 3)
            .unwrap_err();
        assert!(matches!(err, CoreError::AmountOverflow { .. }));
        assert!(tally.is_empty());
    }

    #[test]
    fn test_total_overflow() {
        let mut tally = SaleTally::new();
        tally.add_line("p-1", Money::from_cents(i64::MAX - 1), 1).unwrap();
        let err = tally.add_line("p-2", Money::from_cents(5), 1).unwrap_err();
        assert!(matches!(err, CoreError::AmountOverflow { .. }));
        assert_eq!(tally.total().cents(), i64::MAX - 1);
    }

    #[test]
    fn test_into_records() {
        let mut tally = SaleTally::new();
        tally.add_line("p-1", Money::from_cents(1000), 3).unwrap();
        tally.add_line("p-1", Money::from_cents(1000), 1).unwrap();

        let now = Utc::now();
        let (sale, items) = tally.into_records("s-1", "buyer", now);

        assert_eq!(sale.total_cents, 4000);
        assert_eq!(sale.user_id, "buyer");
        assert_eq!(items.len(), 2);
        assert_ne!(items[0].id, items[1].id);
        assert_eq!(items[0].line_no, 0);
        assert_eq!(items[1].line_no, 1);
        assert!(items.iter().all(|i| i.sale_id == "s-1"));
        assert!(items
            .iter()
            .all(|i| i.subtotal_cents == i.price_cents * i.quantity));
        assert_eq!(
            items.iter().map(|i| i.subtotal_cents).sum::<i64>(),
            sale.total_cents
        );
    }

    #[test]
    fn test_request_deserializes() {
        let body = r#"{"items":[{"product_id":"p-1","quantity":3}]}"#;
        let request: CreateSaleRequest = serde_json::from_str(body).unwrap();
        assert_eq!(request.items[0].quantity, 3);
    }
}

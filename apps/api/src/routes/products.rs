//! `/api/products` CRUD.
//!
//! Price changes here never reach recorded sales; each sale item keeps its
//! own price snapshot.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use erp_core::permission::{PRODUCTS_READ, PRODUCTS_WRITE};
use erp_core::validation::{validate_name, validate_price_cents, validate_stock, validate_uuid};
use erp_core::{Product, ValidationError};
use erp_db::repository::product::generate_product_id;
use serde::Deserialize;

use super::MessageResponse;
use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// Body of `POST /api/products` and `PUT /api/products/{id}`.
#[derive(Debug, Deserialize)]
pub struct ProductRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub category_id: String,
    pub unit_id: String,
    pub price_cents: i64,
    pub stock: i64,
}

impl ProductRequest {
    fn validate(&self) -> Result<(), ValidationError> {
        validate_name("name", self.name.trim())?;
        validate_uuid("category_id", &self.category_id)?;
        validate_uuid("unit_id", &self.unit_id)?;
        validate_price_cents(self.price_cents)?;
        validate_stock(self.stock)?;
        Ok(())
    }

    /// Copies the request onto `product`, keeping its id and created_at.
    fn apply(self, product: &mut Product) {
        product.name = self.name.trim().to_string();
        product.description = self
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        product.category_id = self.category_id;
        product.unit_id = self.unit_id;
        product.price_cents = self.price_cents;
        product.stock = self.stock;
    }
}

#[tracing::instrument(skip(state, user))]
pub async fn list(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<Product>>> {
    user.require(PRODUCTS_READ)?;
    Ok(Json(state.db.products().list().await?))
}

#[tracing::instrument(skip(state, user))]
pub async fn get(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Product>> {
    user.require(PRODUCTS_READ)?;
    state
        .db
        .products()
        .get_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Product not found: {}", id)))
}

/// Unknown category or unit ids surface as a foreign key violation (400).
#[tracing::instrument(skip(state, user, payload))]
pub async fn create(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    payload: Result<Json<ProductRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Product>)> {
    user.require(PRODUCTS_WRITE)?;
    let Json(req) = payload?;
    req.validate()?;

    let now = Utc::now();
    let mut product = Product {
        id: generate_product_id(),
        name: String::new(),
        description: None,
        price_cents: 0,
        stock: 0,
        category_id: String::new(),
        unit_id: String::new(),
        created_at: now,
        updated_at: now,
    };
    req.apply(&mut product);

    let product = state.db.products().insert(&product).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

#[tracing::instrument(skip(state, user, payload))]
pub async fn update(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<ProductRequest>, JsonRejection>,
) -> ApiResult<Json<Product>> {
    user.require(PRODUCTS_WRITE)?;
    let Json(req) = payload?;
    req.validate()?;

    let mut product = state
        .db
        .products()
        .get_by_id(&id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Product not found: {}", id)))?;
    req.apply(&mut product);

    Ok(Json(state.db.products().update(&product).await?))
}

/// Products that appear in a sale cannot be deleted (400).
#[tracing::instrument(skip(state, user))]
pub async fn delete(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    user.require(PRODUCTS_WRITE)?;
    state.db.products().delete(&id).await?;
    Ok(Json(MessageResponse::new("Product deleted successfully")))
}

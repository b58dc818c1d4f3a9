//! `/api/sales`: record a sale, read sales back.
//!
//! ## POST /api/sales
//! ```text
//! { "items": [ { "product_id": "…", "quantity": 3 }, … ] }
//!      │
//!      ▼
//! AuthUser (401) ── require sales:create (403)
//!      │
//!      ▼
//! timeout(sale_timeout, SaleProcessor::create_sale(buyer, request))
//!      │              │
//!      │              └── elapsed: future dropped, transaction rolled back → 503
//!      ▼
//! 201 SaleDetail { sale, buyer, items[{ item, product }] }
//! ```

use std::sync::Arc;
use std::time::Duration;

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use erp_core::permission::{SALES_CREATE, SALES_READ};
use erp_core::{CoreError, CreateSaleRequest, SaleDetail};
use erp_db::repository::sale::DEFAULT_LIST_LIMIT;
use serde::Deserialize;
use tracing::warn;

use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListSalesQuery {
    pub limit: Option<u32>,
}

#[tracing::instrument(skip(state, user, payload), fields(buyer = %user.user_id))]
pub async fn create(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CreateSaleRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<SaleDetail>)> {
    user.require(SALES_CREATE)?;
    let Json(request) = payload?;

    let budget = Duration::from_secs(state.config.sale_timeout_secs);
    let processor = state.db.sale_processor();

    let detail = tokio::time::timeout(budget, processor.create_sale(&user.user_id, &request))
        .await
        .map_err(|_| {
            warn!(timeout_secs = budget.as_secs(), "Sale timed out and was rolled back");
            ApiError::Unavailable("Sale timed out, please retry".to_string())
        })??;

    Ok((StatusCode::CREATED, Json(detail)))
}

/// Newest first. `limit` defaults to 100 and is capped at 500.
#[tracing::instrument(skip(state, user, query))]
pub async fn list(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    query: Result<Query<ListSalesQuery>, QueryRejection>,
) -> ApiResult<Json<Vec<SaleDetail>>> {
    user.require(SALES_READ)?;
    let Query(query) = query?;

    let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT);
    Ok(Json(state.db.sales().list_details(limit).await?))
}

#[tracing::instrument(skip(state, user))]
pub async fn get(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<SaleDetail>> {
    user.require(SALES_READ)?;
    state
        .db
        .sales()
        .get_detail(&id)
        .await?
        .map(Json)
        .ok_or_else(|| CoreError::SaleNotFound(id).into())
}

//! `/api/categories` CRUD.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use erp_core::permission::{CATEGORIES_READ, CATEGORIES_WRITE};
use erp_core::Category;
use uuid::Uuid;

use super::{MessageResponse, NamedEntityRequest};
use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[tracing::instrument(skip(state, user))]
pub async fn list(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<Category>>> {
    user.require(CATEGORIES_READ)?;
    Ok(Json(state.db.categories().list().await?))
}

#[tracing::instrument(skip(state, user))]
pub async fn get(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Category>> {
    user.require(CATEGORIES_READ)?;
    state
        .db
        .categories()
        .get_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Category not found: {}", id)))
}

#[tracing::instrument(skip(state, user, payload))]
pub async fn create(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NamedEntityRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Category>)> {
    user.require(CATEGORIES_WRITE)?;
    let Json(req) = payload?;

    let now = Utc::now();
    let category = Category {
        id: Uuid::new_v4().to_string(),
        name: req.name()?,
        description: req.description(),
        created_at: now,
        updated_at: now,
    };

    let category = state.db.categories().insert(&category).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

#[tracing::instrument(skip(state, user, payload))]
pub async fn update(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<NamedEntityRequest>, JsonRejection>,
) -> ApiResult<Json<Category>> {
    user.require(CATEGORIES_WRITE)?;
    let Json(req) = payload?;

    let name = req.name()?;
    let description = req.description();
    let category = state
        .db
        .categories()
        .update(&id, &name, description.as_deref())
        .await?;

    Ok(Json(category))
}

#[tracing::instrument(skip(state, user))]
pub async fn delete(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    user.require(CATEGORIES_WRITE)?;
    state.db.categories().delete(&id).await?;
    Ok(Json(MessageResponse::new("Category deleted successfully")))
}

//! `/api/units` CRUD (units of measure).

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use erp_core::permission::{UNITS_READ, UNITS_WRITE};
use erp_core::Unit;
use uuid::Uuid;

use super::{MessageResponse, NamedEntityRequest};
use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[tracing::instrument(skip(state, user))]
pub async fn list(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
) -> ApiResult<Json<Vec<Unit>>> {
    user.require(UNITS_READ)?;
    Ok(Json(state.db.units().list().await?))
}

#[tracing::instrument(skip(state, user))]
pub async fn get(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<Unit>> {
    user.require(UNITS_READ)?;
    state
        .db
        .units()
        .get_by_id(&id)
        .await?
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(format!("Unit not found: {}", id)))
}

#[tracing::instrument(skip(state, user, payload))]
pub async fn create(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    payload: Result<Json<NamedEntityRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Unit>)> {
    user.require(UNITS_WRITE)?;
    let Json(req) = payload?;

    let now = Utc::now();
    let unit = Unit {
        id: Uuid::new_v4().to_string(),
        name: req.name()?,
        description: req.description(),
        created_at: now,
        updated_at: now,
    };

    let unit = state.db.units().insert(&unit).await?;
    Ok((StatusCode::CREATED, Json(unit)))
}

#[tracing::instrument(skip(state, user, payload))]
pub async fn update(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<NamedEntityRequest>, JsonRejection>,
) -> ApiResult<Json<Unit>> {
    user.require(UNITS_WRITE)?;
    let Json(req) = payload?;

    let name = req.name()?;
    let description = req.description();
    let unit = state
        .db
        .units()
        .update(&id, &name, description.as_deref())
        .await?;

    Ok(Json(unit))
}

#[tracing::instrument(skip(state, user))]
pub async fn delete(
    user: AuthUser,
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> ApiResult<Json<MessageResponse>> {
    user.require(UNITS_WRITE)?;
    state.db.units().delete(&id).await?;
    Ok(Json(MessageResponse::new("Unit deleted successfully")))
}

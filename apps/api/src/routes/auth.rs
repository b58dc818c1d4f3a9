//! Account registration and login.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use chrono::Utc;
use erp_core::validation::{validate_email, validate_password, validate_username};
use erp_core::{User, UserSummary, USER_ROLE_ID};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::{hash_password, verify_password};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserSummary,
}

/// `POST /register`. New accounts always get the default user role.
#[tracing::instrument(skip(state, payload))]
pub async fn register(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let Json(req) = payload?;

    let username = req.username.trim();
    let email = req.email.trim();
    validate_username(username)?;
    validate_email(email)?;
    validate_password(&req.password)?;

    let now = Utc::now();
    let user = User {
        id: Uuid::new_v4().to_string(),
        username: username.to_string(),
        email: email.to_string(),
        password_hash: hash_password(&req.password)?,
        role_id: USER_ROLE_ID.to_string(),
        created_at: now,
        updated_at: now,
    };
    let user = state.db.users().insert(&user).await?;

    info!(user_id = %user.id, username = %user.username, "User registered");

    let token = state.jwt.issue_token(&user.id, &user.role_id)?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: UserSummary::from(&user),
        }),
    ))
}

/// `POST /login`. Unknown user and wrong password look the same.
#[tracing::instrument(skip(state, payload))]
pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<AuthResponse>> {
    let Json(req) = payload?;

    let user = state
        .db
        .users()
        .get_by_username(req.username.trim())
        .await?
        .filter(|user| verify_password(&req.password, &user.password_hash))
        .ok_or_else(|| ApiError::Unauthorized("Invalid credentials".to_string()))?;

    let token = state.jwt.issue_token(&user.id, &user.role_id)?;
    Ok(Json(AuthResponse {
        token,
        user: UserSummary::from(&user),
    }))
}

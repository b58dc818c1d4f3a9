//! # erp-api: HTTP Server for the ERP Backend
//!
//! axum application exposing authentication, catalogue CRUD and the sales
//! endpoint on top of `erp-db`.
//!
//! ## Module Organization
//!
//! - [`config`] - Layered configuration (defaults, erp.toml, ERP_* env)
//! - [`auth`] - JWT, password hashing, the `AuthUser` extractor
//! - [`error`] - `ApiError` and its HTTP mapping
//! - [`routes`] - Request handlers
//! - [`seed`] - Startup seeding of the admin user and sample catalogue
//! - [`state`] - Shared application state

use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub mod auth;
pub mod config;
pub mod error;
pub mod routes;
pub mod seed;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use state::AppState;

/// Builds the application router.
pub fn create_app(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/register", post(routes::auth::register))
        .route("/login", post(routes::auth::login))
        .route(
            "/api/categories",
            get(routes::categories::list).post(routes::categories::create),
        )
        .route(
            "/api/categories/{id}",
            get(routes::categories::get)
                .put(routes::categories::update)
                .delete(routes::categories::delete),
        )
        .route(
            "/api/units",
            get(routes::units::list).post(routes::units::create),
        )
        .route(
            "/api/units/{id}",
            get(routes::units::get)
                .put(routes::units::update)
                .delete(routes::units::delete),
        )
        .route(
            "/api/products",
            get(routes::products::list).post(routes::products::create),
        )
        .route(
            "/api/products/{id}",
            get(routes::products::get)
                .put(routes::products::update)
                .delete(routes::products::delete),
        )
        .route(
            "/api/sales",
            get(routes::sales::list).post(routes::sales::create),
        )
        .route("/api/sales/{id}", get(routes::sales::get))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

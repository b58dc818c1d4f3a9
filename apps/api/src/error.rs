//! HTTP error type.
//!
//! Every failure leaving a handler becomes an `ApiError`, rendered as
//!
//! ```json
//! { "error": "Insufficient stock for product: Mouse (available 2, requested 3)", "code": "BAD_REQUEST" }
//! ```
//!
//! ## Status Mapping
//! ```text
//! ValidationError, InsufficientStock, constraint violation  → 400
//! missing/invalid token, unknown buyer, bad credentials     → 401
//! missing permission                                        → 403
//! unknown product/sale/category/unit                        → 404
//! sale timed out                                            → 503
//! store fault                                               → 500 (details logged only)
//! ```

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use erp_core::{CoreError, ValidationError};
use erp_db::{CheckoutError, DbError};
use thiserror::Error;
use tracing::error;

/// Result alias used by handlers.
pub type ApiResult<T> = Result<T, ApiError>;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unavailable(String),

    /// Store or server fault. The message is logged, never returned.
    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Unavailable(_) => "UNAVAILABLE",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let code = self.code();

        let message = match self {
            ApiError::Internal(detail) => {
                error!(%detail, "Request failed with an internal error");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        let body = Json(serde_json::json!({
            "error": message,
            "code": code,
        }));

        (status, body).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ProductNotFound(_) | CoreError::SaleNotFound(_) => {
                ApiError::NotFound(err.to_string())
            }
            CoreError::BuyerNotFound(_) => ApiError::Unauthorized(err.to_string()),
            CoreError::InsufficientStock { .. }
            | CoreError::AmountOverflow { .. }
            | CoreError::Validation(_) => ApiError::BadRequest(err.to_string()),
        }
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { .. } => ApiError::NotFound(err.to_string()),
            DbError::UniqueViolation { .. }
            | DbError::ForeignKeyViolation { .. }
            | DbError::CheckViolation { .. } => ApiError::BadRequest(err.to_string()),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::Rejected(core) => core.into(),
            // Inputs were already checked; any store failure here is a fault.
            CheckoutError::Store(db) => ApiError::Internal(db.to_string()),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_core_error_mapping() {
        let stock: ApiError = CoreError::InsufficientStock {
            product_id: "p".into(),
            name: "Mouse".into(),
            available: 2,
            requested: 3,
        }
        .into();
        assert_eq!(stock.status(), StatusCode::BAD_REQUEST);
        assert!(stock.to_string().contains("Mouse"));

        let missing: ApiError = CoreError::ProductNotFound("p".into()).into();
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);

        let buyer: ApiError = CoreError::BuyerNotFound("u".into()).into();
        assert_eq!(buyer.status(), StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_db_error_mapping() {
        let dup: ApiError = DbError::UniqueViolation {
            field: "username".into(),
        }
        .into();
        assert_eq!(dup.status(), StatusCode::BAD_REQUEST);
        assert_eq!(dup.to_string(), "username already exists");

        let fault: ApiError = DbError::ConnectionFailed("disk gone".into()).into();
        assert_eq!(fault.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(fault.code(), "INTERNAL_ERROR");
    }

    #[test]
    fn test_checkout_error_mapping() {
        let rejected: ApiError =
            CheckoutError::Rejected(CoreError::Validation(ValidationError::Empty {
                field: "items".into(),
            }))
            .into();
        assert_eq!(rejected.status(), StatusCode::BAD_REQUEST);

        let store: ApiError = CheckoutError::Store(DbError::TransactionFailed("busy".into())).into();
        assert_eq!(store.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let constraint: ApiError = CheckoutError::Store(DbError::CheckViolation {
            message: "CHECK constraint failed: quantity > 0".into(),
        })
        .into();
        assert_eq!(constraint.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_internal_body_is_generic() {
        let response = ApiError::Internal("secret detail".into()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Internal server error");
        assert_eq!(body["code"], "INTERNAL_ERROR");
    }
}

//! Application error taxonomy.
//!
//! Every handler returns `Result<T, AppError>`. Responses carry a
//! machine-readable `kind` plus a human-readable `message`; database and
//! infrastructure detail is logged server-side and never exposed to clients.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// Missing or malformed input, user-correctable.
    #[error("{0}")]
    Validation(String),

    /// Referenced resource does not exist.
    #[error("{0} not found")]
    NotFound(String),

    /// Requested quantity exceeds the product's current stock.
    #[error("insufficient stock for {product}")]
    InsufficientStock { product: String },

    /// Coupon code did not resolve to a discount.
    #[error("invalid coupon code")]
    InvalidCoupon,

    /// Anti-forgery token missing or mismatched.
    #[error("invalid session token")]
    Forbidden,

    /// Persistence constraint violation (e.g. duplicate customer email).
    #[error("{0}")]
    Conflict(String),

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("{0}")]
    Internal(String),
}

impl AppError {
    /// Stable machine-readable discriminant for clients.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::NotFound(_) => "not_found",
            Self::InsufficientStock { .. } => "insufficient_stock",
            Self::InvalidCoupon => "invalid_coupon",
            Self::Forbidden => "forbidden",
            Self::Conflict(_) => "conflict",
            Self::Database(_) | Self::Internal(_) => "internal",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::InsufficientStock { .. } | Self::InvalidCoupon => {
                StatusCode::BAD_REQUEST
            }
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if matches!(self, Self::Database(_) | Self::Internal(_)) {
            tracing::error!(error = %self, "request failed");
        }

        let message = match &self {
            Self::Database(_) | Self::Internal(_) => "internal server error".to_string(),
            other => other.to_string(),
        };

        let body = json!({ "error": { "kind": self.kind(), "message": message } });
        (self.status(), Json(body)).into_response()
    }
}

impl From<tower_sessions::session::Error> for AppError {
    fn from(err: tower_sessions::session::Error) -> Self {
        Self::Internal(format!("session store: {err}"))
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn kinds_are_stable() {
        assert_eq!(AppError::Validation("x".into()).kind(), "validation");
        assert_eq!(AppError::InvalidCoupon.kind(), "invalid_coupon");
        assert_eq!(AppError::Forbidden.kind(), "forbidden");
        assert_eq!(
            AppError::InsufficientStock { product: "Widget".into() }.kind(),
            "insufficient_stock"
        );
    }

    #[test]
    fn status_codes() {
        assert_eq!(status_of(AppError::Validation("bad".into())), StatusCode::BAD_REQUEST);
        assert_eq!(status_of(AppError::NotFound("product".into())), StatusCode::NOT_FOUND);
        assert_eq!(status_of(AppError::Forbidden), StatusCode::FORBIDDEN);
        assert_eq!(status_of(AppError::Conflict("dup".into())), StatusCode::CONFLICT);
        assert_eq!(
            status_of(AppError::Internal("boom".into())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn insufficient_stock_names_the_product() {
        let err = AppError::InsufficientStock { product: "Widget".into() };
        assert_eq!(err.to_string(), "insufficient stock for Widget");
    }
}

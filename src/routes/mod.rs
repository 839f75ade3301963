//! HTTP surface: route assembly and the session bootstrap endpoint.

pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod coupon;

use axum::{
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use tower_sessions::Session;

use crate::error::Result;
use crate::session;
use crate::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/session", get(session_token))
        .route("/api/v1/products", get(catalog::list_products))
        .route("/api/v1/products/:id", get(catalog::get_product))
        .route("/api/v1/cart", get(cart::show).post(cart::mutate))
        .route("/api/v1/coupon", post(coupon::apply))
        .route("/api/v1/checkout", post(checkout::submit))
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "healthy", "service": "shopfront"}))
}

#[derive(Debug, Serialize)]
struct SessionResponse {
    csrf_token: String,
}

/// Hand the client its session-bound anti-forgery token, minting the token
/// (and the session) on first use.
async fn session_token(session: Session) -> Result<Json<SessionResponse>> {
    let csrf_token = session::csrf_token(&session).await?;
    Ok(Json(SessionResponse { csrf_token }))
}

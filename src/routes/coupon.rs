//! Coupon handler.

use axum::{extract::State, Json};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::error::{AppError, Result};
use crate::models::Coupon;
use crate::session;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ApplyCouponRequest {
    #[serde(default)]
    pub csrf_token: String,
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct CouponResponse {
    pub code: String,
    pub discount: Decimal,
}

/// Resolve a coupon code (case-insensitive) to its flat discount and store it
/// in the session, replacing any prior discount. A failed lookup leaves a
/// previously applied discount untouched.
pub async fn apply(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<ApplyCouponRequest>,
) -> Result<Json<CouponResponse>> {
    session::verify_csrf(&session, &request.csrf_token).await?;

    let code = request.code.trim().to_uppercase();
    let coupon = sqlx::query_as::<_, Coupon>("SELECT code, discount FROM coupons WHERE code = $1")
        .bind(&code)
        .fetch_optional(&state.db)
        .await?
        .ok_or(AppError::InvalidCoupon)?;

    session::save_discount(&session, coupon.discount).await?;

    tracing::info!(code = %coupon.code, discount = %coupon.discount, "coupon applied");
    Ok(Json(CouponResponse { code: coupon.code, discount: coupon.discount }))
}

//! Checkout handler.

use axum::{extract::State, Json};
use rust_decimal::Decimal;
use serde::Serialize;
use tower_sessions::Session;
use uuid::Uuid;

use crate::checkout::{place_order, CheckoutRequest};
use crate::domain::events::{self, StoreEvent};
use crate::error::Result;
use crate::session;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub sale_id: Uuid,
    pub total: Decimal,
}

pub async fn submit(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<CheckoutRequest>,
) -> Result<Json<CheckoutResponse>> {
    session::verify_csrf(&session, &request.csrf_token).await?;

    // The cart and discount come from the session only; client-asserted
    // totals are never read.
    let cart = session::load_cart(&session).await?;
    let discount = session::load_discount(&session).await?;

    let outcome = place_order(&state.db, &cart, discount, &request).await?;

    session::clear_checkout_state(&session).await?;

    tracing::info!(
        sale_id = %outcome.sale_id,
        customer_id = %outcome.customer_id,
        total = %outcome.totals.total,
        "order placed"
    );

    if let Some(nats) = &state.nats {
        events::publish(
            nats,
            &StoreEvent::OrderPlaced {
                sale_id: outcome.sale_id,
                customer_id: outcome.customer_id,
                total: outcome.totals.total,
            },
        )
        .await;
    }

    Ok(Json(CheckoutResponse { sale_id: outcome.sale_id, total: outcome.totals.total }))
}

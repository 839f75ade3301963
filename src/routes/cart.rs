//! Cart handlers.
//!
//! One mutating endpoint carries all three actions, mirroring the client's
//! single cart form. Every stock check reads the product row as it is right
//! now; no reservation is held between here and checkout.

use axum::{extract::State, Json};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use uuid::Uuid;

use crate::domain::cart::CartLine;
use crate::domain::pricing::{self, CartTotals};
use crate::error::{AppError, Result};
use crate::models::Product;
use crate::session;
use crate::state::AppState;

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CartAction {
    Add,
    Update,
    Remove,
}

#[derive(Debug, Deserialize)]
pub struct CartActionRequest {
    #[serde(default)]
    pub csrf_token: String,
    pub action: CartAction,
    pub product_id: Uuid,
    /// Defaults to 1 for `add`; `update` treats anything below 1 as remove.
    pub quantity: Option<i64>,
    pub size: Option<String>,
    pub color: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CartResponse {
    pub lines: Vec<CartLine>,
    pub totals: CartTotals,
}

async fn cart_response(session: &Session) -> Result<Json<CartResponse>> {
    let cart = session::load_cart(session).await?;
    let discount = session::load_discount(session).await?;
    let totals = pricing::totals(&cart, discount);
    Ok(Json(CartResponse { lines: cart.lines().to_vec(), totals }))
}

pub async fn show(session: Session) -> Result<Json<CartResponse>> {
    cart_response(&session).await
}

pub async fn mutate(
    State(state): State<AppState>,
    session: Session,
    Json(request): Json<CartActionRequest>,
) -> Result<Json<CartResponse>> {
    session::verify_csrf(&session, &request.csrf_token).await?;

    let product = sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1")
        .bind(request.product_id)
        .fetch_optional(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("product".into()))?;

    let mut cart = session::load_cart(&session).await?;

    match request.action {
        CartAction::Add => {
            let quantity = requested_quantity(request.quantity.unwrap_or(1))?;
            if quantity == 0 {
                return Err(AppError::Validation("quantity must be at least 1".into()));
            }
            ensure_stock(&product, quantity)?;
            cart.add(CartLine {
                product_id: product.id,
                name: product.name.clone(),
                unit_price: product.selling_price,
                image: product.image.clone(),
                quantity,
                size: request.size.clone(),
                color: request.color.clone(),
            });
        }
        CartAction::Update => {
            let quantity = requested_quantity(request.quantity.unwrap_or(0))?;
            if quantity > 0 {
                ensure_stock(&product, quantity)?;
            }
            cart.set_quantity(product.id, &request.size, &request.color, quantity);
        }
        CartAction::Remove => {
            cart.remove(product.id, &request.size, &request.color);
        }
    }

    session::save_cart(&session, &cart).await?;
    cart_response(&session).await
}

/// Clamp negatives to zero (remove semantics) and reject absurd quantities.
fn requested_quantity(raw: i64) -> Result<u32> {
    u32::try_from(raw.max(0)).map_err(|_| AppError::Validation("quantity out of range".into()))
}

fn ensure_stock(product: &Product, quantity: u32) -> Result<()> {
    if product.stock_quantity < Decimal::from(quantity) {
        return Err(AppError::InsufficientStock { product: product.name.clone() });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(stock: Decimal) -> Product {
        Product {
            id: Uuid::new_v4(),
            name: "Widget".into(),
            buying_price: Decimal::new(5, 0),
            selling_price: Decimal::new(10, 0),
            stock_quantity: stock,
            image: None,
            category: None,
            rating: None,
            description: None,
            created_at: chrono::Utc::now(),
        }
    }

    #[test]
    fn exact_remaining_stock_is_allowed() {
        assert!(ensure_stock(&product(Decimal::new(3, 0)), 3).is_ok());
    }

    #[test]
    fn one_over_remaining_stock_is_rejected() {
        let err = ensure_stock(&product(Decimal::new(3, 0)), 4).unwrap_err();
        assert!(matches!(err, AppError::InsufficientStock { .. }));
    }

    #[test]
    fn fractional_stock_below_a_whole_unit_is_rejected() {
        assert!(ensure_stock(&product(Decimal::new(5, 1)), 1).is_err());
    }

    #[test]
    fn negative_quantity_clamps_to_remove() {
        assert_eq!(requested_quantity(-3).unwrap(), 0);
        assert_eq!(requested_quantity(4).unwrap(), 4);
    }
}

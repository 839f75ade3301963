//! Order Committer
//!
//! Turns a session-held cart into a persisted order. The whole sequence
//! (validate, resolve customer, create sale, persist lines with stock
//! decrements, record payment) runs inside one database transaction:
//! either every row lands or none does. Product rows are re-fetched
//! `FOR UPDATE` so concurrent checkouts cannot both pass validation against
//! the same stale stock value.

use chrono::Utc;
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::{PgPool, Postgres, Transaction};
use thiserror::Error;
use uuid::Uuid;
use validator::Validate;

use crate::domain::cart::Cart;
use crate::domain::pricing::{self, CartTotals};
use crate::error::AppError;
use crate::models::Product;

// =============================================================================
// Request types
// =============================================================================

// All fields default so that omitted keys surface as empty strings and fall
// to field-level validation instead of a serde rejection.

#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct BillingDetails {
    #[validate(length(min = 1))]
    pub first_name: String,
    #[validate(length(min = 1))]
    pub last_name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub mobile: String,
    #[validate(length(min = 1))]
    pub address1: String,
    pub address2: Option<String>,
    #[validate(length(min = 1))]
    pub country: String,
    #[validate(length(min = 1))]
    pub city: String,
    #[validate(length(min = 1))]
    pub state: String,
    #[validate(length(min = 1))]
    pub zip: String,
}

impl BillingDetails {
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Separate ship-to address. Contact fields are optional here; only the
/// name and address fields are required when the block is present.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
#[serde(default)]
pub struct ShippingDetails {
    #[validate(length(min = 1))]
    pub first_name: String,
    #[validate(length(min = 1))]
    pub last_name: String,
    pub email: Option<String>,
    pub mobile: Option<String>,
    #[validate(length(min = 1))]
    pub address1: String,
    pub address2: Option<String>,
    #[validate(length(min = 1))]
    pub country: String,
    #[validate(length(min = 1))]
    pub city: String,
    #[validate(length(min = 1))]
    pub state: String,
    #[validate(length(min = 1))]
    pub zip: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub csrf_token: String,
    #[serde(default)]
    pub billing: BillingDetails,
    pub shipping: Option<ShippingDetails>,
    #[serde(default)]
    pub payment_method: String,
}

// =============================================================================
// Errors
// =============================================================================

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,
    #[error("missing required billing fields: {0}")]
    MissingBillingFields(String),
    #[error("missing required shipping fields: {0}")]
    MissingShippingFields(String),
    #[error("missing payment method")]
    MissingPaymentMethod,
    #[error("product {0} no longer exists")]
    ProductNotFound(Uuid),
    #[error("insufficient stock for {0}")]
    InsufficientStock(String),
    #[error("customer email already exists")]
    CustomerConflict,
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl From<CheckoutError> for AppError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::EmptyCart
            | CheckoutError::MissingBillingFields(_)
            | CheckoutError::MissingShippingFields(_)
            | CheckoutError::MissingPaymentMethod => AppError::Validation(err.to_string()),
            CheckoutError::ProductNotFound(_) => AppError::NotFound("product".into()),
            CheckoutError::InsufficientStock(product) => {
                AppError::InsufficientStock { product }
            }
            CheckoutError::CustomerConflict => AppError::Conflict(
                "a customer with this email was created concurrently".into(),
            ),
            CheckoutError::Database(err) => AppError::Database(err),
        }
    }
}

// =============================================================================
// Validation
// =============================================================================

/// Pre-flight validation, independent of database state.
pub fn validate(cart: &Cart, request: &CheckoutRequest) -> Result<(), CheckoutError> {
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }
    if let Err(errors) = request.billing.validate() {
        return Err(CheckoutError::MissingBillingFields(field_list(&errors)));
    }
    if let Some(shipping) = &request.shipping {
        if let Err(errors) = shipping.validate() {
            return Err(CheckoutError::MissingShippingFields(field_list(&errors)));
        }
    }
    if request.payment_method.trim().is_empty() {
        return Err(CheckoutError::MissingPaymentMethod);
    }
    Ok(())
}

fn field_list(errors: &validator::ValidationErrors) -> String {
    let mut fields: Vec<&str> = errors.field_errors().keys().copied().collect();
    fields.sort_unstable();
    fields.join(", ")
}

// =============================================================================
// Commit
// =============================================================================

pub struct CheckoutOutcome {
    pub sale_id: Uuid,
    pub customer_id: Uuid,
    pub totals: CartTotals,
}

/// Commit the checkout. Totals are recomputed here from the cart and the
/// resolved discount; nothing client-asserted is trusted. Any error before
/// the commit drops the transaction and rolls every write back.
pub async fn place_order(
    db: &PgPool,
    cart: &Cart,
    discount: Decimal,
    request: &CheckoutRequest,
) -> Result<CheckoutOutcome, CheckoutError> {
    validate(cart, request)?;
    let totals = pricing::totals(cart, discount);

    let mut tx = db.begin().await?;

    let customer_id = resolve_customer(&mut tx, &request.billing).await?;

    let sale_id = Uuid::now_v7();
    sqlx::query("INSERT INTO sales (id, customer_id, total_amount, created_at) VALUES ($1, $2, $3, $4)")
        .bind(sale_id)
        .bind(customer_id)
        .bind(totals.total)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

    for line in cart.lines() {
        // Row lock: concurrent checkouts of the same product serialize here.
        let product =
            sqlx::query_as::<_, Product>("SELECT * FROM products WHERE id = $1 FOR UPDATE")
                .bind(line.product_id)
                .fetch_optional(&mut *tx)
                .await?
                .ok_or(CheckoutError::ProductNotFound(line.product_id))?;

        let quantity = Decimal::from(line.quantity);
        if product.stock_quantity < quantity {
            return Err(CheckoutError::InsufficientStock(product.name));
        }

        sqlx::query(
            "INSERT INTO sale_lines (id, sale_id, product_id, quantity, purchase_amount) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(Uuid::now_v7())
        .bind(sale_id)
        .bind(line.product_id)
        .bind(quantity)
        .bind(line.line_total())
        .execute(&mut *tx)
        .await?;

        sqlx::query("UPDATE products SET stock_quantity = stock_quantity - $2 WHERE id = $1")
            .bind(line.product_id)
            .bind(quantity)
            .execute(&mut *tx)
            .await?;
    }

    sqlx::query(
        "INSERT INTO payments (id, sale_id, customer_id, payment_method, amount) \
         VALUES ($1, $2, $3, $4, $5)",
    )
    .bind(Uuid::now_v7())
    .bind(sale_id)
    .bind(customer_id)
    .bind(&request.payment_method)
    .bind(totals.total)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(CheckoutOutcome { sale_id, customer_id, totals })
}

/// Look the customer up by billing email, creating one on first checkout.
/// A concurrent insert of the same email surfaces as a conflict, not a crash.
async fn resolve_customer(
    tx: &mut Transaction<'_, Postgres>,
    billing: &BillingDetails,
) -> Result<Uuid, CheckoutError> {
    if let Some(id) = sqlx::query_scalar::<_, Uuid>("SELECT id FROM customers WHERE email = $1")
        .bind(&billing.email)
        .fetch_optional(&mut **tx)
        .await?
    {
        return Ok(id);
    }

    let id = Uuid::now_v7();
    let inserted =
        sqlx::query("INSERT INTO customers (id, full_name, phone, email) VALUES ($1, $2, $3, $4)")
            .bind(id)
            .bind(billing.full_name())
            .bind(&billing.mobile)
            .bind(&billing.email)
            .execute(&mut **tx)
            .await;

    match inserted {
        Ok(_) => Ok(id),
        Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
            Err(CheckoutError::CustomerConflict)
        }
        Err(err) => Err(err.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cart::CartLine;

    fn billing() -> BillingDetails {
        BillingDetails {
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            email: "jane@example.com".into(),
            mobile: "0712345678".into(),
            address1: "1 Main St".into(),
            address2: None,
            country: "KE".into(),
            city: "Nairobi".into(),
            state: "Nairobi".into(),
            zip: "00100".into(),
        }
    }

    fn cart() -> Cart {
        let mut cart = Cart::default();
        cart.add(CartLine {
            product_id: Uuid::new_v4(),
            name: "Widget".into(),
            unit_price: Decimal::new(25, 0),
            image: None,
            quantity: 2,
            size: None,
            color: None,
        });
        cart
    }

    fn request() -> CheckoutRequest {
        CheckoutRequest {
            csrf_token: String::new(),
            billing: billing(),
            shipping: None,
            payment_method: "mpesa".into(),
        }
    }

    #[test]
    fn empty_cart_is_rejected() {
        assert!(matches!(
            validate(&Cart::default(), &request()),
            Err(CheckoutError::EmptyCart)
        ));
    }

    #[test]
    fn missing_billing_fields_are_named() {
        let mut req = request();
        req.billing.first_name = String::new();
        req.billing.zip = String::new();
        match validate(&cart(), &req) {
            Err(CheckoutError::MissingBillingFields(fields)) => {
                assert_eq!(fields, "first_name, zip");
            }
            other => panic!("expected MissingBillingFields, got {other:?}"),
        }
    }

    #[test]
    fn blank_email_counts_as_missing() {
        let mut req = request();
        req.billing.email = String::new();
        assert!(matches!(
            validate(&cart(), &req),
            Err(CheckoutError::MissingBillingFields(_))
        ));
    }

    #[test]
    fn shipping_block_is_optional_but_validated_when_present() {
        let mut req = request();
        req.shipping = Some(ShippingDetails {
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            address1: "2 Side St".into(),
            country: "KE".into(),
            city: "Mombasa".into(),
            state: "Coast".into(),
            zip: "80100".into(),
            ..ShippingDetails::default()
        });
        assert!(validate(&cart(), &req).is_ok());

        req.shipping.as_mut().unwrap().address1 = String::new();
        assert!(matches!(
            validate(&cart(), &req),
            Err(CheckoutError::MissingShippingFields(_))
        ));
    }

    #[test]
    fn shipping_contact_fields_are_not_required() {
        let mut req = request();
        req.shipping = Some(ShippingDetails {
            first_name: "Jane".into(),
            last_name: "Doe".into(),
            email: None,
            mobile: None,
            address1: "2 Side St".into(),
            address2: None,
            country: "KE".into(),
            city: "Mombasa".into(),
            state: "Coast".into(),
            zip: "80100".into(),
        });
        assert!(validate(&cart(), &req).is_ok());
    }

    #[test]
    fn blank_payment_method_is_rejected() {
        let mut req = request();
        req.payment_method = "  ".into();
        assert!(matches!(
            validate(&cart(), &req),
            Err(CheckoutError::MissingPaymentMethod)
        ));
    }

    #[test]
    fn valid_request_passes() {
        assert!(validate(&cart(), &request()).is_ok());
    }

    #[test]
    fn checkout_errors_map_to_the_app_taxonomy() {
        assert_eq!(AppError::from(CheckoutError::EmptyCart).kind(), "validation");
        assert_eq!(
            AppError::from(CheckoutError::InsufficientStock("Widget".into())).kind(),
            "insufficient_stock"
        );
        assert_eq!(
            AppError::from(CheckoutError::ProductNotFound(Uuid::new_v4())).kind(),
            "not_found"
        );
        assert_eq!(AppError::from(CheckoutError::CustomerConflict).kind(), "conflict");
    }
}

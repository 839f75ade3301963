//! Session-scoped checkout state.
//!
//! The cart, the applied coupon discount, and the anti-forgery token all live
//! in the caller's session. Handlers receive a per-request [`Session`] and go
//! through the accessors below; nothing here is ambient or shared across
//! sessions. The store behind the layer is swappable; the in-memory store is
//! the default deployment.

use rust_decimal::Decimal;
use tower_sessions::{Expiry, MemoryStore, Session, SessionManagerLayer};
use uuid::Uuid;

use crate::domain::cart::Cart;
use crate::error::{AppError, Result};

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "shopfront_session";

/// Session expiry on inactivity (7 days).
const SESSION_EXPIRY_SECONDS: i64 = 7 * 24 * 60 * 60;

pub mod keys {
    pub const CART: &str = "cart";
    pub const COUPON_DISCOUNT: &str = "coupon_discount";
    pub const CSRF_TOKEN: &str = "csrf_token";
}

/// Build the session layer over an in-memory store.
pub fn session_layer() -> SessionManagerLayer<MemoryStore> {
    SessionManagerLayer::new(MemoryStore::default())
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(
            tower_sessions::cookie::time::Duration::seconds(SESSION_EXPIRY_SECONDS),
        ))
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_http_only(true)
        // TLS terminates upstream; the cookie must survive plain HTTP here.
        .with_secure(false)
        .with_path("/")
}

pub async fn load_cart(session: &Session) -> Result<Cart> {
    Ok(session.get::<Cart>(keys::CART).await?.unwrap_or_default())
}

pub async fn save_cart(session: &Session, cart: &Cart) -> Result<()> {
    session.insert(keys::CART, cart).await?;
    Ok(())
}

pub async fn load_discount(session: &Session) -> Result<Decimal> {
    Ok(session
        .get::<Decimal>(keys::COUPON_DISCOUNT)
        .await?
        .unwrap_or(Decimal::ZERO))
}

pub async fn save_discount(session: &Session, discount: Decimal) -> Result<()> {
    session.insert(keys::COUPON_DISCOUNT, discount).await?;
    Ok(())
}

/// Drop the cart and any applied discount after a successful checkout.
pub async fn clear_checkout_state(session: &Session) -> Result<()> {
    session.remove::<Cart>(keys::CART).await?;
    session.remove::<Decimal>(keys::COUPON_DISCOUNT).await?;
    Ok(())
}

/// Return the session's anti-forgery token, minting one on first use.
pub async fn csrf_token(session: &Session) -> Result<String> {
    if let Some(token) = session.get::<String>(keys::CSRF_TOKEN).await? {
        return Ok(token);
    }
    let token = Uuid::new_v4().simple().to_string();
    session.insert(keys::CSRF_TOKEN, &token).await?;
    Ok(token)
}

/// Every state-mutating request must carry the session-bound token.
/// Mismatch is rejected before any business validation runs.
pub async fn verify_csrf(session: &Session, supplied: &str) -> Result<()> {
    match session.get::<String>(keys::CSRF_TOKEN).await? {
        Some(token) if token == supplied => Ok(()),
        _ => Err(AppError::Forbidden),
    }
}

//! Pricing Calculator
//!
//! Single source of truth for order totals. The cart view and the checkout
//! transaction both call [`totals`]; client-asserted amounts are never read.

use rust_decimal::Decimal;
use serde::Serialize;

use super::cart::Cart;

/// Flat shipping fee charged on any non-empty cart.
pub fn shipping_flat_fee() -> Decimal {
    Decimal::new(10, 0)
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct CartTotals {
    pub subtotal: Decimal,
    pub shipping: Decimal,
    pub discount: Decimal,
    pub total: Decimal,
}

/// Derive subtotal, shipping, and total from the cart and the resolved flat
/// discount. The discount never drives the total negative.
pub fn totals(cart: &Cart, discount: Decimal) -> CartTotals {
    let subtotal = cart.subtotal();
    let shipping = if cart.is_empty() { Decimal::ZERO } else { shipping_flat_fee() };
    let total = (subtotal + shipping - discount).max(Decimal::ZERO);
    CartTotals { subtotal, shipping, discount, total }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::cart::CartLine;
    use uuid::Uuid;

    fn cart_with_subtotal_50() -> Cart {
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

    #[test]
    fn empty_cart_has_no_shipping() {
        let t = totals(&Cart::default(), Decimal::ZERO);
        assert_eq!(t.subtotal, Decimal::ZERO);
        assert_eq!(t.shipping, Decimal::ZERO);
        assert_eq!(t.total, Decimal::ZERO);
    }

    #[test]
    fn flat_discount_comes_off_subtotal_plus_shipping() {
        // SAVE10 against subtotal 50 + shipping 10 -> 50.
        let t = totals(&cart_with_subtotal_50(), Decimal::new(10, 0));
        assert_eq!(t.subtotal, Decimal::new(50, 0));
        assert_eq!(t.shipping, Decimal::new(10, 0));
        assert_eq!(t.total, Decimal::new(50, 0));
    }

    #[test]
    fn discount_never_drives_total_negative() {
        let t = totals(&cart_with_subtotal_50(), Decimal::new(500, 0));
        assert_eq!(t.total, Decimal::ZERO);
    }
}

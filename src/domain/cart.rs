//! Cart Ledger
//!
//! Session-scoped ordered list of line items. A line's identity is the
//! composite `(product_id, size, color)`; adding an existing composite
//! increments quantity rather than duplicating the line. The cart itself
//! never touches the database; stock validation happens in the handlers
//! against the current product row, and again inside the checkout
//! transaction.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: Uuid,
    /// Name and unit price are snapshotted from the product at add time.
    pub name: String,
    pub unit_price: Decimal,
    pub image: Option<String>,
    pub quantity: u32,
    pub size: Option<String>,
    pub color: Option<String>,
}

impl CartLine {
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }

    fn matches(&self, product_id: Uuid, size: &Option<String>, color: &Option<String>) -> bool {
        self.product_id == product_id && &self.size == size && &self.color == color
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn lines(&self) -> &[CartLine] { &self.lines }
    pub fn is_empty(&self) -> bool { self.lines.is_empty() }
    pub fn line_count(&self) -> usize { self.lines.len() }

    /// Merge a line into the cart: increment the quantity of an existing
    /// `(product_id, size, color)` line, or append a new one.
    pub fn add(&mut self, line: CartLine) {
        if let Some(existing) = self
            .lines
            .iter_mut()
            .find(|l| l.matches(line.product_id, &line.size, &line.color))
        {
            existing.quantity += line.quantity;
        } else {
            self.lines.push(line);
        }
    }

    /// Overwrite the quantity of a matching line. A quantity of zero removes
    /// the line; an absent line is a no-op.
    pub fn set_quantity(
        &mut self,
        product_id: Uuid,
        size: &Option<String>,
        color: &Option<String>,
        quantity: u32,
    ) {
        if quantity == 0 {
            self.remove(product_id, size, color);
            return;
        }
        if let Some(line) = self.lines.iter_mut().find(|l| l.matches(product_id, size, color)) {
            line.quantity = quantity;
        }
    }

    /// Delete all matching lines; no-op if absent.
    pub fn remove(&mut self, product_id: Uuid, size: &Option<String>, color: &Option<String>) {
        self.lines.retain(|l| !l.matches(product_id, size, color));
    }

    pub fn clear(&mut self) {
        self.lines.clear();
    }

    pub fn subtotal(&self) -> Decimal {
        self.lines.iter().map(CartLine::line_total).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(product: Uuid, qty: u32, size: &str, color: &str) -> CartLine {
        CartLine {
            product_id: product,
            name: "Widget".into(),
            unit_price: Decimal::new(10, 0),
            image: None,
            quantity: qty,
            size: Some(size.into()),
            color: Some(color.into()),
        }
    }

    #[test]
    fn add_merges_on_composite_key() {
        let product = Uuid::new_v4();
        let mut cart = Cart::default();
        cart.add(line(product, 2, "M", "red"));
        cart.add(line(product, 3, "M", "red"));
        assert_eq!(cart.line_count(), 1);
        assert_eq!(cart.lines()[0].quantity, 5);
    }

    #[test]
    fn different_size_makes_a_distinct_line() {
        let product = Uuid::new_v4();
        let mut cart = Cart::default();
        cart.add(line(product, 2, "M", "red"));
        cart.add(line(product, 1, "L", "red"));
        assert_eq!(cart.line_count(), 2);
    }

    #[test]
    fn set_quantity_overwrites() {
        let product = Uuid::new_v4();
        let mut cart = Cart::default();
        cart.add(line(product, 2, "M", "red"));
        cart.set_quantity(product, &Some("M".into()), &Some("red".into()), 7);
        assert_eq!(cart.lines()[0].quantity, 7);
    }

    #[test]
    fn set_quantity_zero_removes() {
        let product = Uuid::new_v4();
        let mut cart = Cart::default();
        cart.add(line(product, 2, "M", "red"));
        cart.set_quantity(product, &Some("M".into()), &Some("red".into()), 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn set_quantity_on_absent_line_is_a_noop() {
        let mut cart = Cart::default();
        cart.add(line(Uuid::new_v4(), 2, "M", "red"));
        cart.set_quantity(Uuid::new_v4(), &Some("M".into()), &Some("red".into()), 9);
        assert_eq!(cart.lines()[0].quantity, 2);
    }

    #[test]
    fn remove_absent_is_a_noop() {
        let mut cart = Cart::default();
        cart.remove(Uuid::new_v4(), &None, &None);
        assert!(cart.is_empty());
    }

    #[test]
    fn subtotal_sums_line_totals() {
        let mut cart = Cart::default();
        cart.add(line(Uuid::new_v4(), 2, "M", "red"));
        cart.add(line(Uuid::new_v4(), 3, "L", "blue"));
        assert_eq!(cart.subtotal(), Decimal::new(50, 0));
    }
}

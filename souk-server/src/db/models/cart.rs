//! Shopping cart models
//!
//! Carts are keyed by identity: a logged-in user or an anonymous guest.
//! A guest id is a client-generated opaque token carried in a header, so
//! the cart survives until the guest logs in or abandons it.
//!
//! Cart entries are [`LineItem`] snapshots: name, image and unit price are
//! captured when the item is added and carried into the order unchanged.
//! Only the stock check is repeated at checkout.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::order::LineItem;

/// Who owns a cart
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CartIdentity {
    User(String),
    Guest(String),
}

impl CartIdentity {
    /// Storage key: `user:{id}` or `guest:{id}`. The prefixes keep the two
    /// namespaces from colliding in one table.
    pub fn key(&self) -> String {
        match self {
            CartIdentity::User(id) => format!("user:{}", id),
            CartIdentity::Guest(id) => format!("guest:{}", id),
        }
    }

    pub fn user_id(&self) -> Option<&str> {
        match self {
            CartIdentity::User(id) => Some(id),
            CartIdentity::Guest(_) => None,
        }
    }
}

/// A shopping cart
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cart {
    pub items: Vec<LineItem>,
    pub updated_at: DateTime<Utc>,
}

impl Cart {
    pub fn empty() -> Self {
        Self {
            items: Vec::new(),
            updated_at: Utc::now(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Quantity already in the cart for one option
    pub fn quantity_of(&self, product_id: &str, option_id: &str) -> u32 {
        self.items
            .iter()
            .find(|l| l.product_id == product_id && l.option_id == option_id)
            .map(|l| l.quantity)
            .unwrap_or(0)
    }

    /// Add a snapshot line. An existing line for the same option keeps its
    /// original snapshot and only grows in quantity.
    pub fn add(&mut self, line: LineItem) {
        if let Some(existing) = self
            .items
            .iter_mut()
            .find(|l| l.product_id == line.product_id && l.option_id == line.option_id)
        {
            existing.quantity = existing.quantity.saturating_add(line.quantity);
        } else {
            self.items.push(line);
        }
        self.updated_at = Utc::now();
    }

    /// Set a line's quantity; zero removes the line. Returns false when the
    /// line does not exist.
    pub fn set_quantity(&mut self, product_id: &str, option_id: &str, quantity: u32) -> bool {
        let pos = self
            .items
            .iter()
            .position(|l| l.product_id == product_id && l.option_id == option_id);
        let Some(pos) = pos else {
            return false;
        };
        if quantity == 0 {
            self.items.remove(pos);
        } else {
            self.items[pos].quantity = quantity;
        }
        self.updated_at = Utc::now();
        true
    }

    /// Remove a line. Returns false when the line does not exist.
    pub fn remove(&mut self, product_id: &str, option_id: &str) -> bool {
        self.set_quantity(product_id, option_id, 0)
    }

    /// Drop all lines, keeping the cart document itself
    pub fn clear(&mut self) {
        self.items.clear();
        self.updated_at = Utc::now();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(product_id: &str, option_id: &str, quantity: u32, price: f64) -> LineItem {
        LineItem {
            product_id: product_id.to_string(),
            product_name: format!("Product {}", product_id),
            option_id: option_id.to_string(),
            option_name: "Standard".to_string(),
            unit_price: price,
            quantity,
            image: None,
        }
    }

    #[test]
    fn test_identity_keys_do_not_collide() {
        let user = CartIdentity::User("abc".into());
        let guest = CartIdentity::Guest("abc".into());
        assert_ne!(user.key(), guest.key());
        assert_eq!(user.key(), "user:abc");
        assert_eq!(guest.key(), "guest:abc");
    }

    #[test]
    fn test_add_merges_and_keeps_first_snapshot() {
        let mut cart = Cart::empty();
        cart.add(line("p1", "o1", 2, 100.0));
        // Price changed in the catalog between the two adds
        cart.add(line("p1", "o1", 3, 120.0));
        cart.add(line("p1", "o2", 1, 50.0));
        assert_eq!(cart.items.len(), 2);
        assert_eq!(cart.items[0].quantity, 5);
        assert_eq!(cart.items[0].unit_price, 100.0);
        assert_eq!(cart.quantity_of("p1", "o1"), 5);
    }

    #[test]
    fn test_set_quantity_zero_removes() {
        let mut cart = Cart::empty();
        cart.add(line("p1", "o1", 2, 10.0));
        assert!(cart.set_quantity("p1", "o1", 0));
        assert!(cart.is_empty());
        assert!(!cart.set_quantity("p1", "o1", 1));
    }

    #[test]
    fn test_clear_keeps_the_cart() {
        let mut cart = Cart::empty();
        cart.add(line("p1", "o1", 2, 10.0));
        cart.clear();
        assert!(cart.is_empty());
    }
}

//! Order models
//!
//! An order is an immutable record produced by checkout: priced line items,
//! totals, payment method and shipping address. Only `status` changes after
//! creation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Order lifecycle status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Paid,
    Shipped,
    Completed,
    Canceled,
}

/// Payment method chosen at checkout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Cod,
    Card,
    Paypal,
}

/// A priced line snapshot, shared between carts and orders. Names, image
/// and unit price are frozen when the item enters the cart; later catalog
/// edits never change it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: String,
    pub product_name: String,
    pub option_id: String,
    pub option_name: String,
    /// Unit price resolved at add-to-cart time (VIP > active sale > base)
    pub unit_price: f64,
    pub quantity: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl LineItem {
    pub fn line_total(&self) -> f64 {
        self.unit_price * self.quantity as f64
    }
}

/// Order totals
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Totals {
    pub subtotal: f64,
    pub shipping: f64,
    pub grand_total: f64,
}

/// Shipping address supplied at checkout
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub full_name: String,
    pub phone: String,
    pub city: String,
    pub street: String,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Contact details for the order confirmation email. Guests supply them at
/// checkout; for logged-in users they default to the account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub name: String,
    pub email: String,
}

/// A placed order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: String,
    /// Human-facing sequential number, e.g. "ORD-17"
    pub number: String,
    /// Cart identity key of whoever placed the order
    pub owner_key: String,
    pub customer: Customer,
    pub items: Vec<LineItem>,
    pub totals: Totals,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    /// Gateway reference when the client supplies one; recorded, not
    /// processed
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<String>,
    pub shipping_address: ShippingAddress,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&OrderStatus::Pending).unwrap(),
            "\"pending\""
        );
        assert_eq!(
            serde_json::from_str::<OrderStatus>("\"shipped\"").unwrap(),
            OrderStatus::Shipped
        );
    }

    #[test]
    fn test_line_total() {
        let item = LineItem {
            product_id: "p".into(),
            product_name: "P".into(),
            option_id: "o".into(),
            option_name: "O".into(),
            unit_price: 12.5,
            quantity: 4,
            image: None,
        };
        assert_eq!(item.line_total(), 50.0);
    }
}

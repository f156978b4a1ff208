//! Product catalog models
//!
//! A product carries one or more purchasable options (size, color, ...).
//! Each option has its own price, stock quantity and image. Price
//! resolution precedence: VIP price > active sale price > base price.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Time-bounded sale on a product option
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sale {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub price: f64,
}

impl Sale {
    /// A sale is active when `now` falls inside its window. A window with
    /// start after end never activates.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.start <= self.end && self.start <= now && now <= self.end
    }
}

/// A purchasable variant of a product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductOption {
    pub id: String,
    pub name: String,
    /// Base price
    pub price: f64,
    /// Price offered to VIP customers, overrides everything else
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vip_price: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sale: Option<Sale>,
    /// Units in stock
    pub quantity: u32,
    /// Image URL shown in the catalog and on receipts
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl ProductOption {
    /// Resolve the price a customer pays right now.
    ///
    /// Precedence: VIP price (VIP customers only) > active sale > base.
    pub fn effective_price(&self, is_vip: bool, now: DateTime<Utc>) -> f64 {
        if is_vip {
            if let Some(vip) = self.vip_price {
                return vip;
            }
        }
        if let Some(sale) = &self.sale {
            if sale.is_active(now) {
                return sale.price;
            }
        }
        self.price
    }
}

/// A catalog product
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub options: Vec<ProductOption>,
    pub created_at: DateTime<Utc>,
}

impl Product {
    pub fn option(&self, option_id: &str) -> Option<&ProductOption> {
        self.options.iter().find(|o| o.id == option_id)
    }

    pub fn option_mut(&mut self, option_id: &str) -> Option<&mut ProductOption> {
        self.options.iter_mut().find(|o| o.id == option_id)
    }
}

/// Payload for creating a product
#[derive(Debug, Clone, Deserialize)]
pub struct ProductCreate {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: Option<String>,
    pub options: Vec<ProductOptionCreate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProductOptionCreate {
    pub name: String,
    pub price: f64,
    #[serde(default)]
    pub vip_price: Option<f64>,
    #[serde(default)]
    pub sale: Option<Sale>,
    pub quantity: u32,
    #[serde(default)]
    pub image: Option<String>,
}

impl ProductCreate {
    pub fn into_product(self) -> Product {
        Product {
            id: uuid::Uuid::new_v4().to_string(),
            name: self.name,
            description: self.description,
            category: self.category,
            options: self
                .options
                .into_iter()
                .map(|o| ProductOption {
                    id: uuid::Uuid::new_v4().to_string(),
                    name: o.name,
                    price: o.price,
                    vip_price: o.vip_price,
                    sale: o.sale,
                    quantity: o.quantity,
                    image: o.image,
                })
                .collect(),
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn option_with(price: f64, vip: Option<f64>, sale: Option<Sale>) -> ProductOption {
        ProductOption {
            id: "opt-1".into(),
            name: "Standard".into(),
            price,
            vip_price: vip,
            sale,
            quantity: 10,
            image: None,
        }
    }

    #[test]
    fn test_base_price_when_no_overrides() {
        let opt = option_with(100.0, None, None);
        assert_eq!(opt.effective_price(false, Utc::now()), 100.0);
        assert_eq!(opt.effective_price(true, Utc::now()), 100.0);
    }

    #[test]
    fn test_vip_price_wins_over_active_sale() {
        let now = Utc::now();
        let sale = Sale {
            start: now - Duration::hours(1),
            end: now + Duration::hours(1),
            price: 80.0,
        };
        let opt = option_with(100.0, Some(70.0), Some(sale));
        assert_eq!(opt.effective_price(true, now), 70.0);
        assert_eq!(opt.effective_price(false, now), 80.0);
    }

    #[test]
    fn test_expired_sale_falls_back_to_base() {
        let now = Utc::now();
        let sale = Sale {
            start: now - Duration::hours(3),
            end: now - Duration::hours(1),
            price: 80.0,
        };
        let opt = option_with(100.0, None, Some(sale));
        assert_eq!(opt.effective_price(false, now), 100.0);
    }

    #[test]
    fn test_inverted_sale_window_never_activates() {
        let now = Utc::now();
        let sale = Sale {
            start: now + Duration::hours(1),
            end: now - Duration::hours(1),
            price: 1.0,
        };
        let opt = option_with(100.0, None, Some(sale));
        assert_eq!(opt.effective_price(false, now), 100.0);
    }
}

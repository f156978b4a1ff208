//! Checkout: cart to order, atomically
//!
//! The whole conversion runs inside a single redb write transaction:
//!
//! 1. Load the cart for the identity
//! 2. Resolve the customer (account details, or the contact a guest supplied)
//! 3. For every line: load the product, find the option, check stock,
//!    decrement the stock
//! 4. Compute totals over the snapshot prices (captured at add-to-cart
//!    time, not re-resolved) plus shipping, taken from the request when
//!    supplied and from configuration otherwise
//! 5. Allocate the order number
//! 6. Persist the order
//! 7. Empty the cart (the cart document itself survives)
//!
//! redb admits one writer at a time, so the stock check and decrement are
//! serializable against every concurrent checkout: two buyers can never
//! both take the last unit. Any failure before `commit()` drops the
//! transaction, which aborts it, leaving stock, cart and counters untouched.
//!
//! Side effects (receipt rendering, email) happen after commit and never
//! fail the order.

use serde::Deserialize;
use thiserror::Error;

use crate::db::models::{
    CartIdentity, Customer, Order, OrderStatus, PaymentMethod, ShippingAddress, Totals,
};
use crate::db::{Store, StoreError};
use crate::utils::AppError;

/// Checkout request payload
#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutRequest {
    pub payment_method: PaymentMethod,
    pub shipping_address: ShippingAddress,
    /// Contact details; required for guests, defaults to the account for
    /// logged-in users
    #[serde(default)]
    pub customer: Option<Customer>,
    /// Shipping price for this order; falls back to the configured flat rate
    #[serde(default)]
    pub shipping_price: Option<f64>,
    /// Gateway reference, recorded as-is
    #[serde(default)]
    pub transaction_id: Option<String>,
}

/// Checkout failures
#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("Guest checkout requires customer contact details")]
    MissingContact,

    #[error("Cart is empty")]
    EmptyCart,

    #[error("Product not found: {0}")]
    ProductNotFound(String),

    #[error("Option not found: {product_id}/{option_id}")]
    OptionNotFound {
        product_id: String,
        option_id: String,
    },

    #[error("Insufficient stock for {product_name} ({option_name}): requested {requested}, available {available}")]
    InsufficientStock {
        product_name: String,
        option_name: String,
        requested: u32,
        available: u32,
    },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<CheckoutError> for AppError {
    fn from(e: CheckoutError) -> Self {
        match e {
            CheckoutError::MissingContact => AppError::Validation(e.to_string()),
            CheckoutError::EmptyCart | CheckoutError::InsufficientStock { .. } => {
                AppError::BusinessRule(e.to_string())
            }
            CheckoutError::ProductNotFound(_) | CheckoutError::OptionNotFound { .. } => {
                AppError::NotFound(e.to_string())
            }
            CheckoutError::Store(inner) => AppError::Storage(inner.to_string()),
        }
    }
}

/// Converts carts into orders under one transaction
#[derive(Clone)]
pub struct CheckoutCoordinator {
    store: Store,
    shipping_price: f64,
}

impl CheckoutCoordinator {
    pub fn new(store: Store, shipping_price: f64) -> Self {
        Self {
            store,
            shipping_price,
        }
    }

    /// Convert the identity's cart into an order.
    ///
    /// On success the order is committed, stock is decremented and the
    /// cart is emptied. On any error nothing changed.
    pub fn checkout(
        &self,
        identity: &CartIdentity,
        request: CheckoutRequest,
    ) -> Result<Order, CheckoutError> {
        let key = identity.key();
        let txn = self.store.begin_write()?;

        // 1. Load the cart
        let mut cart = self
            .store
            .get_cart_txn(&txn, &key)?
            .filter(|c| !c.is_empty())
            .ok_or(CheckoutError::EmptyCart)?;

        // 2. Resolve the customer
        let account = match identity.user_id() {
            Some(user_id) => self.store.get_user_txn(&txn, user_id)?,
            None => None,
        };
        let customer = match request.customer {
            Some(c) => c,
            None => match &account {
                Some(u) => Customer {
                    name: u.name.clone(),
                    email: u.email.clone(),
                },
                None => return Err(CheckoutError::MissingContact),
            },
        };

        // 3. Re-validate stock and decrement. Prices stay as snapshotted in
        //    the cart; only availability is checked against the catalog.
        for line in &cart.items {
            let mut product = self
                .store
                .get_product_txn(&txn, &line.product_id)?
                .ok_or_else(|| CheckoutError::ProductNotFound(line.product_id.clone()))?;

            let Some(option) = product.option_mut(&line.option_id) else {
                return Err(CheckoutError::OptionNotFound {
                    product_id: line.product_id.clone(),
                    option_id: line.option_id.clone(),
                });
            };

            if option.quantity < line.quantity {
                return Err(CheckoutError::InsufficientStock {
                    product_name: line.product_name.clone(),
                    option_name: line.option_name.clone(),
                    requested: line.quantity,
                    available: option.quantity,
                });
            }
            option.quantity -= line.quantity;

            // Write back before the next line, so two lines for the same
            // option see each other's consumption
            self.store.put_product_txn(&txn, &product)?;
        }

        // 4. Totals over the snapshot prices
        let subtotal: f64 = cart.items.iter().map(|i| i.line_total()).sum();
        let shipping = request.shipping_price.unwrap_or(self.shipping_price);
        let totals = Totals {
            subtotal,
            shipping,
            grand_total: subtotal + shipping,
        };

        // 5-7. Number, persist, empty the cart
        let number = self.store.next_order_number_txn(&txn)?;
        let order = Order {
            id: uuid::Uuid::new_v4().to_string(),
            number: format!("ORD-{}", number),
            owner_key: key.clone(),
            customer,
            items: std::mem::take(&mut cart.items),
            totals,
            status: OrderStatus::Pending,
            payment_method: request.payment_method,
            transaction_id: request.transaction_id,
            shipping_address: request.shipping_address,
            created_at: chrono::Utc::now(),
        };
        self.store.insert_order_txn(&txn, &order)?;
        cart.clear();
        self.store.put_cart_txn(&txn, &key, &cart)?;
        txn.commit().map_err(StoreError::from)?;

        tracing::info!(
            order_id = %order.id,
            number = %order.number,
            owner = %order.owner_key,
            grand_total = order.totals.grand_total,
            "Checkout committed"
        );
        Ok(order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::{Cart, LineItem, Product, ProductOption, User};
    use chrono::Utc;

    fn address() -> ShippingAddress {
        ShippingAddress {
            full_name: "Dana Levi".into(),
            phone: "050-0000000".into(),
            city: "Haifa".into(),
            street: "HaNamal 3".into(),
            notes: None,
        }
    }

    fn request() -> CheckoutRequest {
        CheckoutRequest {
            payment_method: PaymentMethod::Cod,
            shipping_address: address(),
            customer: Some(Customer {
                name: "Dana Levi".into(),
                email: "dana@example.com".into(),
            }),
            shipping_price: None,
            transaction_id: None,
        }
    }

    fn seed_product(store: &Store, id: &str, price: f64, quantity: u32) {
        let product = Product {
            id: id.to_string(),
            name: format!("Product {}", id),
            description: String::new(),
            category: None,
            options: vec![ProductOption {
                id: "opt".into(),
                name: "Standard".into(),
                price,
                vip_price: None,
                sale: None,
                quantity,
                image: None,
            }],
            created_at: Utc::now(),
        };
        store.upsert_product(&product).unwrap();
    }

    fn line(product_id: &str, price: f64, quantity: u32) -> LineItem {
        LineItem {
            product_id: product_id.to_string(),
            product_name: format!("Product {}", product_id),
            option_id: "opt".into(),
            option_name: "Standard".into(),
            unit_price: price,
            quantity,
            image: None,
        }
    }

    fn seed_cart(store: &Store, key: &str, product_id: &str, price: f64, quantity: u32) {
        let mut cart = Cart::empty();
        cart.add(line(product_id, price, quantity));
        store.put_cart(key, &cart).unwrap();
    }

    #[test]
    fn test_successful_checkout_decrements_and_empties_cart() {
        let store = Store::open_in_memory().unwrap();
        seed_product(&store, "p1", 100.0, 5);
        let identity = CartIdentity::Guest("g-1".into());
        seed_cart(&store, &identity.key(), "p1", 100.0, 3);

        let coordinator = CheckoutCoordinator::new(store.clone(), 20.0);
        let order = coordinator.checkout(&identity, request()).unwrap();

        assert_eq!(order.totals.subtotal, 300.0);
        assert_eq!(order.totals.shipping, 20.0);
        assert_eq!(order.totals.grand_total, 320.0);
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.number, "ORD-1");

        // Stock decremented
        let product = store.get_product("p1").unwrap().unwrap();
        assert_eq!(product.options[0].quantity, 2);

        // Cart emptied but the cart document survives
        let cart = store.get_cart(&identity.key()).unwrap().unwrap();
        assert!(cart.is_empty());

        // Order persisted
        assert!(store.get_order(&order.id).unwrap().is_some());
    }

    #[test]
    fn test_request_shipping_price_overrides_config() {
        let store = Store::open_in_memory().unwrap();
        seed_product(&store, "p1", 100.0, 5);
        let identity = CartIdentity::Guest("g-1".into());
        seed_cart(&store, &identity.key(), "p1", 100.0, 1);

        let coordinator = CheckoutCoordinator::new(store.clone(), 20.0);
        let mut req = request();
        req.shipping_price = Some(35.0);
        let order = coordinator.checkout(&identity, req).unwrap();

        assert_eq!(order.totals.shipping, 35.0);
        assert_eq!(order.totals.grand_total, 135.0);
    }

    #[test]
    fn test_insufficient_stock_changes_nothing() {
        let store = Store::open_in_memory().unwrap();
        seed_product(&store, "p1", 100.0, 2);
        let identity = CartIdentity::Guest("g-1".into());
        seed_cart(&store, &identity.key(), "p1", 100.0, 3);

        let coordinator = CheckoutCoordinator::new(store.clone(), 20.0);
        let err = coordinator.checkout(&identity, request()).unwrap_err();
        assert!(matches!(
            err,
            CheckoutError::InsufficientStock {
                requested: 3,
                available: 2,
                ..
            }
        ));

        // Stock untouched, cart intact, no order
        let product = store.get_product("p1").unwrap().unwrap();
        assert_eq!(product.options[0].quantity, 2);
        assert_eq!(store.get_cart(&identity.key()).unwrap().unwrap().items.len(), 1);
        assert!(store.list_orders().unwrap().is_empty());
    }

    #[test]
    fn test_partial_failure_rolls_back_earlier_decrements() {
        let store = Store::open_in_memory().unwrap();
        seed_product(&store, "p1", 50.0, 10);
        seed_product(&store, "p2", 80.0, 1);
        let identity = CartIdentity::Guest("g-1".into());
        let mut cart = Cart::empty();
        cart.add(line("p1", 50.0, 2));
        cart.add(line("p2", 80.0, 5)); // exceeds stock
        store.put_cart(&identity.key(), &cart).unwrap();

        let coordinator = CheckoutCoordinator::new(store.clone(), 20.0);
        assert!(coordinator.checkout(&identity, request()).is_err());

        // The p1 decrement from step 3 must have been rolled back
        let p1 = store.get_product("p1").unwrap().unwrap();
        assert_eq!(p1.options[0].quantity, 10);
    }

    #[test]
    fn test_empty_cart_rejected() {
        let store = Store::open_in_memory().unwrap();
        let identity = CartIdentity::Guest("g-1".into());

        let coordinator = CheckoutCoordinator::new(store, 20.0);
        assert!(matches!(
            coordinator.checkout(&identity, request()),
            Err(CheckoutError::EmptyCart)
        ));
    }

    #[test]
    fn test_guest_without_contact_rejected() {
        let store = Store::open_in_memory().unwrap();
        seed_product(&store, "p1", 100.0, 5);
        let identity = CartIdentity::Guest("g-1".into());
        seed_cart(&store, &identity.key(), "p1", 100.0, 1);

        let coordinator = CheckoutCoordinator::new(store, 20.0);
        let mut req = request();
        req.customer = None;
        assert!(matches!(
            coordinator.checkout(&identity, req),
            Err(CheckoutError::MissingContact)
        ));
    }

    #[test]
    fn test_snapshot_price_charged_despite_catalog_change() {
        let store = Store::open_in_memory().unwrap();
        seed_product(&store, "p1", 75.0, 5);
        let identity = CartIdentity::Guest("g-1".into());
        // Snapshot taken at 75
        seed_cart(&store, &identity.key(), "p1", 75.0, 2);

        // Catalog price rises before checkout
        seed_product(&store, "p1", 100.0, 5);

        let coordinator = CheckoutCoordinator::new(store.clone(), 20.0);
        let order = coordinator.checkout(&identity, request()).unwrap();
        assert_eq!(order.items[0].unit_price, 75.0);
        assert_eq!(order.totals.subtotal, 150.0);
    }

    #[test]
    fn test_logged_in_customer_defaults_to_account() {
        let store = Store::open_in_memory().unwrap();
        seed_product(&store, "p1", 40.0, 5);

        let user = User::new("Noa", "noa@example.com", "hash".into());
        store.insert_user(&user).unwrap();

        let identity = CartIdentity::User(user.id.clone());
        seed_cart(&store, &identity.key(), "p1", 40.0, 2);

        let coordinator = CheckoutCoordinator::new(store, 20.0);
        let mut req = request();
        req.customer = None; // resolved from the account
        let order = coordinator.checkout(&identity, req).unwrap();
        assert_eq!(order.customer.email, "noa@example.com");
        assert_eq!(order.customer.name, "Noa");
    }

    #[test]
    fn test_order_numbers_are_sequential() {
        let store = Store::open_in_memory().unwrap();
        seed_product(&store, "p1", 10.0, 100);
        let coordinator = CheckoutCoordinator::new(store.clone(), 5.0);

        for expected in 1..=3u64 {
            let identity = CartIdentity::Guest(format!("g-{}", expected));
            seed_cart(&store, &identity.key(), "p1", 10.0, 1);
            let order = coordinator.checkout(&identity, request()).unwrap();
            assert_eq!(order.number, format!("ORD-{}", expected));
        }
    }
}

//! Concurrent checkout against the same stock
//!
//! Several buyers race for an option with less stock than their combined
//! demand. redb's single-writer transactions must serialize them: the
//! exact number of winners commit, losers leave no trace, and stock never
//! goes negative.

use std::sync::Arc;

use souk_server::checkout::{CheckoutCoordinator, CheckoutError, CheckoutRequest};
use souk_server::db::models::{
    Cart, CartIdentity, Customer, LineItem, PaymentMethod, ProductCreate, ProductOptionCreate,
    ShippingAddress,
};
use souk_server::Store;

fn seed_product(store: &Store, quantity: u32) -> (String, String) {
    let product = ProductCreate {
        name: "قميص قطني".to_string(),
        description: String::new(),
        category: None,
        options: vec![ProductOptionCreate {
            name: "L".to_string(),
            price: 80.0,
            vip_price: None,
            sale: None,
            quantity,
            image: None,
        }],
    }
    .into_product();
    store.upsert_product(&product).unwrap();
    let option_id = product.options[0].id.clone();
    (product.id, option_id)
}

fn request_for(buyer: &str) -> CheckoutRequest {
    CheckoutRequest {
        payment_method: PaymentMethod::Cod,
        shipping_address: ShippingAddress {
            full_name: buyer.to_string(),
            phone: "050-0000000".to_string(),
            city: "Jerusalem".to_string(),
            street: "Main St 1".to_string(),
            notes: None,
        },
        customer: Some(Customer {
            name: buyer.to_string(),
            email: format!("{}@example.com", buyer),
        }),
        shipping_price: None,
        transaction_id: None,
    }
}

fn seed_cart(store: &Store, identity: &CartIdentity, product_id: &str, option_id: &str, qty: u32) {
    let mut cart = Cart::empty();
    cart.add(LineItem {
        product_id: product_id.to_string(),
        product_name: "قميص قطني".to_string(),
        option_id: option_id.to_string(),
        option_name: "L".to_string(),
        unit_price: 80.0,
        quantity: qty,
        image: None,
    });
    store.put_cart(&identity.key(), &cart).unwrap();
}

#[test]
fn racing_buyers_never_oversell() {
    const STOCK: u32 = 5;
    const BUYERS: usize = 4;
    const PER_BUYER: u32 = 2;

    let store = Store::open_in_memory().unwrap();
    let (product_id, option_id) = seed_product(&store, STOCK);

    let coordinator = Arc::new(CheckoutCoordinator::new(store.clone(), 20.0));

    for i in 0..BUYERS {
        let identity = CartIdentity::Guest(format!("buyer-{}", i));
        seed_cart(&store, &identity, &product_id, &option_id, PER_BUYER);
    }

    let handles: Vec<_> = (0..BUYERS)
        .map(|i| {
            let coordinator = Arc::clone(&coordinator);
            std::thread::spawn(move || {
                let identity = CartIdentity::Guest(format!("buyer-{}", i));
                coordinator.checkout(&identity, request_for(&format!("buyer-{}", i)))
            })
        })
        .collect();

    let mut orders = Vec::new();
    let mut rejections = 0;
    for handle in handles {
        match handle.join().unwrap() {
            Ok(order) => orders.push(order),
            Err(CheckoutError::InsufficientStock { available, .. }) => {
                assert!(available < PER_BUYER);
                rejections += 1;
            }
            Err(other) => panic!("unexpected checkout error: {}", other),
        }
    }

    // 5 units, 2 per buyer: exactly two can win
    assert_eq!(orders.len(), 2);
    assert_eq!(rejections, BUYERS - 2);

    let sold: u32 = orders.iter().map(|o| o.items[0].quantity).sum();
    let product = store.get_product(&product_id).unwrap().unwrap();
    assert_eq!(product.options[0].quantity, STOCK - sold);

    // Order numbers are unique and winner carts were emptied, not deleted
    let mut numbers: Vec<_> = orders.iter().map(|o| o.number.clone()).collect();
    numbers.sort();
    numbers.dedup();
    assert_eq!(numbers.len(), orders.len());
    for order in &orders {
        let cart = store.get_cart(&order.owner_key).unwrap().unwrap();
        assert!(cart.is_empty());
    }
}

#[test]
fn loser_cart_survives_for_retry() {
    let store = Store::open_in_memory().unwrap();
    let (product_id, option_id) = seed_product(&store, 1);
    let coordinator = CheckoutCoordinator::new(store.clone(), 20.0);

    let winner = CartIdentity::Guest("w".to_string());
    let loser = CartIdentity::Guest("l".to_string());
    for identity in [&winner, &loser] {
        seed_cart(&store, identity, &product_id, &option_id, 1);
    }

    coordinator.checkout(&winner, request_for("w")).unwrap();
    let err = coordinator.checkout(&loser, request_for("l")).unwrap_err();
    assert!(matches!(err, CheckoutError::InsufficientStock { .. }));

    // The loser can restock-wait and try again with the same cart
    let cart = store.get_cart(&loser.key()).unwrap().unwrap();
    assert_eq!(cart.items.len(), 1);
}

//! End-to-end checkout flow through the HTTP router
//!
//! Uses an in-memory store and `tower::ServiceExt::oneshot` so no socket
//! is bound. Receipt rendering runs on the background worker and is not
//! asserted here; these tests cover the request/response surface and the
//! atomicity guarantees visible through it.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

use souk_server::db::models::{ProductCreate, ProductOptionCreate, User};
use souk_server::{api, Config, ServerState, Store};

fn test_config(dir: &tempfile::TempDir) -> Config {
    let mut config = Config::with_overrides(dir.path().to_str().unwrap(), 0);
    config.shipping_price = 20.0;
    config
}

async fn test_state() -> (ServerState, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let config = test_config(&dir);
    let store = Store::open_in_memory().unwrap();
    (ServerState::with_store(config, store), dir)
}

fn app(state: &ServerState) -> Router {
    api::create_router().with_state(state.clone())
}

async fn send(router: Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, body)
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

fn guest_json_request(guest: &str, method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .header("x-guest-id", guest)
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap()
}

/// Seed one product and return (product_id, option_id)
fn seed_product(state: &ServerState, price: f64, quantity: u32) -> (String, String) {
    let product = ProductCreate {
        name: "חולצת כותנה".to_string(),
        description: "Plain cotton shirt".to_string(),
        category: Some("clothing".to_string()),
        options: vec![ProductOptionCreate {
            name: "M".to_string(),
            price,
            vip_price: None,
            sale: None,
            quantity,
            image: None,
        }],
    }
    .into_product();
    state.store.upsert_product(&product).unwrap();
    let option_id = product.options[0].id.clone();
    (product.id, option_id)
}

/// Insert an admin account directly and return a bearer token for it
fn admin_token(state: &ServerState) -> String {
    let hash = souk_server::auth::hash_password("admin-password").unwrap();
    let mut user = User::new("Admin".to_string(), "admin@souk.test".to_string(), hash);
    user.is_admin = true;
    state.store.insert_user(&user).unwrap();
    state.jwt_service.generate_token(&user).unwrap()
}

fn checkout_body() -> Value {
    json!({
        "payment_method": "cod",
        "shipping_address": {
            "full_name": "דנה לוי",
            "phone": "050-1234567",
            "city": "תל אביב",
            "street": "דיזנגוף 10"
        },
        "customer": { "name": "דנה לוי", "email": "dana@example.com" }
    })
}

#[tokio::test]
async fn guest_checkout_converts_cart_to_order() {
    let (state, _dir) = test_state().await;
    let (product_id, option_id) = seed_product(&state, 100.0, 5);

    let (status, _) = send(
        app(&state),
        guest_json_request(
            "g-1",
            "POST",
            "/api/cart/items",
            json!({ "product_id": product_id, "option_id": option_id, "quantity": 3 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        app(&state),
        guest_json_request("g-1", "POST", "/api/orders/checkout", checkout_body()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], "E0000");

    let order = &body["data"];
    assert_eq!(order["number"], "ORD-1");
    assert_eq!(order["totals"]["subtotal"], 300.0);
    assert_eq!(order["totals"]["shipping"], 20.0);
    assert_eq!(order["totals"]["grand_total"], 320.0);
    assert_eq!(order["status"], "pending");

    // Stock was decremented and the cart emptied inside the transaction;
    // the cart document itself survives
    let product = state.store.get_product(&product_id).unwrap().unwrap();
    assert_eq!(product.options[0].quantity, 2);
    let cart = state.store.get_cart("guest:g-1").unwrap().unwrap();
    assert!(cart.is_empty());
}

#[tokio::test]
async fn insufficient_stock_rejects_and_changes_nothing() {
    let (state, _dir) = test_state().await;
    let (product_id, option_id) = seed_product(&state, 50.0, 5);

    let (status, _) = send(
        app(&state),
        guest_json_request(
            "g-2",
            "POST",
            "/api/cart/items",
            json!({ "product_id": product_id, "option_id": option_id, "quantity": 3 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Stock shrinks to 2 after the item was added (admin restock)
    let token = admin_token(&state);
    let request = Request::builder()
        .method("POST")
        .uri(format!(
            "/api/products/{}/options/{}/stock",
            product_id, option_id
        ))
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::from(
            serde_json::to_vec(&json!({ "quantity": 2 })).unwrap(),
        ))
        .unwrap();
    let (status, _) = send(app(&state), request).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        app(&state),
        guest_json_request("g-2", "POST", "/api/orders/checkout", checkout_body()),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "E0005");

    // Nothing moved: stock intact, cart intact, no order exists
    let product = state.store.get_product(&product_id).unwrap().unwrap();
    assert_eq!(product.options[0].quantity, 2);
    let cart = state.store.get_cart("guest:g-2").unwrap().unwrap();
    assert_eq!(cart.items.len(), 1);
    assert!(state.store.list_orders().unwrap().is_empty());
}

#[tokio::test]
async fn add_beyond_stock_is_rejected_at_add_time() {
    let (state, _dir) = test_state().await;
    let (product_id, option_id) = seed_product(&state, 50.0, 2);

    let (status, body) = send(
        app(&state),
        guest_json_request(
            "g-7",
            "POST",
            "/api/cart/items",
            json!({ "product_id": product_id, "option_id": option_id, "quantity": 3 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "E0005");
}

#[tokio::test]
async fn empty_cart_cannot_check_out() {
    let (state, _dir) = test_state().await;

    let (status, body) = send(
        app(&state),
        guest_json_request("g-3", "POST", "/api/orders/checkout", checkout_body()),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "E0005");
}

#[tokio::test]
async fn cart_requires_some_identity() {
    let (state, _dir) = test_state().await;
    let (product_id, option_id) = seed_product(&state, 10.0, 1);

    let (status, body) = send(
        app(&state),
        json_request(
            "POST",
            "/api/cart/items",
            json!({ "product_id": product_id, "option_id": option_id, "quantity": 1 }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "E0002");
}

#[tokio::test]
async fn register_then_login_round_trip() {
    let (state, _dir) = test_state().await;

    let (status, body) = send(
        app(&state),
        json_request(
            "POST",
            "/api/auth/register",
            json!({ "name": "Maya", "email": "maya@example.com", "password": "s3cret-pass" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["token"].as_str().unwrap().len() > 20);
    assert_eq!(body["data"]["user"]["email"], "maya@example.com");

    // Same email again conflicts
    let (status, body) = send(
        app(&state),
        json_request(
            "POST",
            "/api/auth/register",
            json!({ "name": "Maya", "email": "maya@example.com", "password": "s3cret-pass" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "E0004");

    let (status, _) = send(
        app(&state),
        json_request(
            "POST",
            "/api/auth/login",
            json!({ "email": "maya@example.com", "password": "s3cret-pass" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    // Wrong password and unknown email produce the same response
    let (status, body) = send(
        app(&state),
        json_request(
            "POST",
            "/api/auth/login",
            json!({ "email": "maya@example.com", "password": "wrong" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "E0006");
}

#[tokio::test]
async fn logged_in_checkout_uses_account_contact() {
    let (state, _dir) = test_state().await;
    let (product_id, option_id) = seed_product(&state, 40.0, 10);

    let (_, body) = send(
        app(&state),
        json_request(
            "POST",
            "/api/auth/register",
            json!({ "name": "Yossi", "email": "yossi@example.com", "password": "password1" }),
        ),
    )
    .await;
    let token = body["data"]["token"].as_str().unwrap().to_string();
    let bearer = format!("Bearer {}", token);

    let request = Request::builder()
        .method("POST")
        .uri("/api/cart/items")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, &bearer)
        .body(Body::from(
            serde_json::to_vec(
                &json!({ "product_id": product_id, "option_id": option_id, "quantity": 2 }),
            )
            .unwrap(),
        ))
        .unwrap();
    let (status, _) = send(app(&state), request).await;
    assert_eq!(status, StatusCode::OK);

    // No customer block: contact comes from the account
    let request = Request::builder()
        .method("POST")
        .uri("/api/orders/checkout")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, &bearer)
        .body(Body::from(
            serde_json::to_vec(&json!({
                "payment_method": "card",
                "shipping_address": {
                    "full_name": "Yossi Cohen",
                    "phone": "052-7654321",
                    "city": "חיפה",
                    "street": "הנמל 3"
                }
            }))
            .unwrap(),
        ))
        .unwrap();
    let (status, body) = send(app(&state), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["customer"]["email"], "yossi@example.com");

    // The order shows up under /my
    let request = Request::builder()
        .method("GET")
        .uri("/api/orders/my")
        .header(header::AUTHORIZATION, &bearer)
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app(&state), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn product_writes_require_admin() {
    let (state, _dir) = test_state().await;

    let payload = json!({
        "name": "כובע",
        "options": [{ "name": "One size", "price": 30.0, "quantity": 4 }]
    });

    // Anonymous
    let (status, _) = send(
        app(&state),
        json_request("POST", "/api/products", payload.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    // Regular user
    let (_, body) = send(
        app(&state),
        json_request(
            "POST",
            "/api/auth/register",
            json!({ "name": "User", "email": "user@example.com", "password": "password1" }),
        ),
    )
    .await;
    let user_token = body["data"]["token"].as_str().unwrap().to_string();
    let request = Request::builder()
        .method("POST")
        .uri("/api/products")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {}", user_token))
        .body(Body::from(serde_json::to_vec(&payload).unwrap()))
        .unwrap();
    let (status, body) = send(app(&state), request).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "E2001");

    // Admin succeeds
    let token = admin_token(&state);
    let request = Request::builder()
        .method("POST")
        .uri("/api/products")
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::from(serde_json::to_vec(&payload).unwrap()))
        .unwrap();
    let (status, body) = send(app(&state), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["name"], "כובע");

    // And the catalog is publicly readable
    let request = Request::builder()
        .method("GET")
        .uri("/api/products")
        .body(Body::empty())
        .unwrap();
    let (status, body) = send(app(&state), request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

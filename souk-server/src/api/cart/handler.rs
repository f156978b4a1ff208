//! Cart handlers
//!
//! All endpoints work for logged-in users and guests alike through the
//! [`Identity`] extractor. Adding an item snapshots the current name,
//! image and resolved unit price (VIP > active sale > base) into the cart
//! line; the snapshot is what checkout charges. Stock is checked here as a
//! courtesy and re-validated authoritatively inside the checkout
//! transaction.

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::auth::Identity;
use crate::core::ServerState;
use crate::db::models::{Cart, LineItem};
use crate::utils::{ok, AppError, AppResponse, AppResult};

#[derive(Debug, Deserialize)]
pub struct AddItemRequest {
    pub product_id: String,
    pub option_id: String,
    pub quantity: u32,
}

#[derive(Debug, Deserialize)]
pub struct SetQuantityRequest {
    pub quantity: u32,
}

/// The cart as the client sees it. Line prices are the snapshots taken at
/// add time and are exactly what checkout will charge.
#[derive(Debug, Serialize)]
pub struct CartView {
    pub items: Vec<LineItem>,
    pub subtotal: f64,
}

impl CartView {
    fn from_cart(cart: Cart) -> Self {
        let subtotal = cart.items.iter().map(|i| i.line_total()).sum();
        Self {
            items: cart.items,
            subtotal,
        }
    }
}

/// GET /api/cart
pub async fn get_cart(
    State(state): State<ServerState>,
    identity: Identity,
) -> AppResult<Json<AppResponse<CartView>>> {
    let key = identity.cart_identity().key();
    let cart = state.store.get_cart(&key)?.unwrap_or_else(Cart::empty);
    Ok(ok(CartView::from_cart(cart)))
}

/// POST /api/cart/items
pub async fn add_item(
    State(state): State<ServerState>,
    identity: Identity,
    Json(req): Json<AddItemRequest>,
) -> AppResult<Json<AppResponse<CartView>>> {
    if req.quantity == 0 {
        return Err(AppError::Validation("Quantity must be at least 1".into()));
    }
    let product = state
        .store
        .get_product(&req.product_id)?
        .ok_or_else(|| AppError::not_found(format!("Product {}", req.product_id)))?;
    let option = product
        .option(&req.option_id)
        .ok_or_else(|| AppError::not_found(format!("Option {}", req.option_id)))?;

    let key = identity.cart_identity().key();
    let mut cart = state.store.get_cart(&key)?.unwrap_or_else(Cart::empty);

    let wanted = cart
        .quantity_of(&req.product_id, &req.option_id)
        .saturating_add(req.quantity);
    if wanted > option.quantity {
        return Err(AppError::BusinessRule(format!(
            "Insufficient stock for {} ({}): requested {}, available {}",
            product.name, option.name, wanted, option.quantity
        )));
    }

    let is_vip = identity.user().map(|u| u.is_vip).unwrap_or(false);
    cart.add(LineItem {
        product_id: product.id.clone(),
        product_name: product.name.clone(),
        option_id: option.id.clone(),
        option_name: option.name.clone(),
        unit_price: option.effective_price(is_vip, Utc::now()),
        quantity: req.quantity,
        image: option.image.clone(),
    });
    state.store.put_cart(&key, &cart)?;

    Ok(ok(CartView::from_cart(cart)))
}

/// PATCH /api/cart/items/:product_id/:option_id
pub async fn set_quantity(
    State(state): State<ServerState>,
    identity: Identity,
    Path((product_id, option_id)): Path<(String, String)>,
    Json(req): Json<SetQuantityRequest>,
) -> AppResult<Json<AppResponse<CartView>>> {
    let key = identity.cart_identity().key();
    let mut cart = state.store.get_cart(&key)?.unwrap_or_else(Cart::empty);
    if !cart.set_quantity(&product_id, &option_id, req.quantity) {
        return Err(AppError::not_found("Cart line".to_string()));
    }
    state.store.put_cart(&key, &cart)?;
    Ok(ok(CartView::from_cart(cart)))
}

/// DELETE /api/cart/items/:product_id/:option_id
pub async fn remove_item(
    State(state): State<ServerState>,
    identity: Identity,
    Path((product_id, option_id)): Path<(String, String)>,
) -> AppResult<Json<AppResponse<CartView>>> {
    let key = identity.cart_identity().key();
    let mut cart = state.store.get_cart(&key)?.unwrap_or_else(Cart::empty);
    if !cart.remove(&product_id, &option_id) {
        return Err(AppError::not_found("Cart line".to_string()));
    }
    state.store.put_cart(&key, &cart)?;
    Ok(ok(CartView::from_cart(cart)))
}

/// DELETE /api/cart - drop every line, keeping the cart
pub async fn clear(
    State(state): State<ServerState>,
    identity: Identity,
) -> AppResult<Json<AppResponse<CartView>>> {
    let key = identity.cart_identity().key();
    let mut cart = state.store.get_cart(&key)?.unwrap_or_else(Cart::empty);
    cart.clear();
    state.store.put_cart(&key, &cart)?;
    Ok(ok(CartView::from_cart(cart)))
}

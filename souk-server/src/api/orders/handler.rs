//! Order handlers

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;

use crate::auth::{CurrentUser, Identity};
use crate::checkout::CheckoutRequest;
use crate::core::ServerState;
use crate::db::models::{Order, OrderStatus};
use crate::db::StoreError;
use crate::utils::{ok, AppError, AppResponse, AppResult};

/// POST /api/orders/checkout
///
/// Converts the caller's cart into an order. The conversion itself is
/// atomic; receipt rendering and emails run on the worker afterwards and
/// never affect the response.
pub async fn checkout(
    State(state): State<ServerState>,
    identity: Identity,
    Json(request): Json<CheckoutRequest>,
) -> AppResult<Json<AppResponse<Order>>> {
    let cart_identity = identity.cart_identity();
    let order = state.checkout.checkout(&cart_identity, request)?;

    state.enqueue_receipt(order.clone());
    Ok(ok(order))
}

/// GET /api/orders/my - the caller's orders, newest first
pub async fn list_mine(
    State(state): State<ServerState>,
    identity: Identity,
) -> AppResult<Json<AppResponse<Vec<Order>>>> {
    let key = identity.cart_identity().key();
    Ok(ok(state.store.list_orders_for_owner(&key)?))
}

/// GET /api/orders/:id - owner or admin
pub async fn get_by_id(
    State(state): State<ServerState>,
    identity: Identity,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<Order>>> {
    let order = state
        .store
        .get_order(&id)?
        .ok_or_else(|| AppError::not_found(format!("Order {}", id)))?;

    let is_admin = identity.user().map(|u| u.is_admin).unwrap_or(false);
    if !is_admin && order.owner_key != identity.cart_identity().key() {
        return Err(AppError::Forbidden("Not your order".to_string()));
    }
    Ok(ok(order))
}

/// GET /api/orders - all orders (admin)
pub async fn list_all(
    State(state): State<ServerState>,
    user: CurrentUser,
) -> AppResult<Json<AppResponse<Vec<Order>>>> {
    user.require_admin()?;
    Ok(ok(state.store.list_orders()?))
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    pub status: OrderStatus,
}

/// PATCH /api/orders/:id/status (admin)
pub async fn update_status(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateStatusRequest>,
) -> AppResult<Json<AppResponse<Order>>> {
    user.require_admin()?;
    let order = match state.store.update_order_status(&id, req.status) {
        Ok(order) => order,
        Err(StoreError::OrderNotFound(id)) => {
            return Err(AppError::not_found(format!("Order {}", id)));
        }
        Err(e) => return Err(e.into()),
    };
    tracing::info!(order_id = %order.id, status = ?order.status, "Order status updated");
    Ok(ok(order))
}

//! Product handlers
//!
//! Reads are public. Writes require an admin token.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Deserialize;

use crate::auth::CurrentUser;
use crate::core::ServerState;
use crate::db::models::{Product, ProductCreate};
use crate::utils::{ok, AppError, AppResponse, AppResult};

/// GET /api/products - list the catalog
pub async fn list(State(state): State<ServerState>) -> AppResult<Json<AppResponse<Vec<Product>>>> {
    Ok(ok(state.store.list_products()?))
}

/// GET /api/products/:id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<Product>>> {
    let product = state
        .store
        .get_product(&id)?
        .ok_or_else(|| AppError::not_found(format!("Product {}", id)))?;
    Ok(ok(product))
}

/// POST /api/products - create a product (admin)
pub async fn create(
    State(state): State<ServerState>,
    user: CurrentUser,
    Json(payload): Json<ProductCreate>,
) -> AppResult<Json<AppResponse<Product>>> {
    user.require_admin()?;
    if payload.options.is_empty() {
        return Err(AppError::Validation(
            "A product needs at least one option".to_string(),
        ));
    }

    let product = payload.into_product();
    state.store.upsert_product(&product)?;
    tracing::info!(product_id = %product.id, "Product created");
    Ok(ok(product))
}

/// PUT /api/products/:id - replace a product (admin)
pub async fn update(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
    Json(mut product): Json<Product>,
) -> AppResult<Json<AppResponse<Product>>> {
    user.require_admin()?;
    if state.store.get_product(&id)?.is_none() {
        return Err(AppError::not_found(format!("Product {}", id)));
    }

    product.id = id;
    state.store.upsert_product(&product)?;
    Ok(ok(product))
}

/// DELETE /api/products/:id (admin)
pub async fn delete(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<AppResponse<()>>> {
    user.require_admin()?;
    if !state.store.delete_product(&id)? {
        return Err(AppError::not_found(format!("Product {}", id)));
    }
    Ok(ok(()))
}

#[derive(Debug, Deserialize)]
pub struct SetStockRequest {
    pub quantity: u32,
}

/// POST /api/products/:id/options/:option_id/stock - restock (admin)
pub async fn set_stock(
    State(state): State<ServerState>,
    user: CurrentUser,
    Path((id, option_id)): Path<(String, String)>,
    Json(req): Json<SetStockRequest>,
) -> AppResult<Json<AppResponse<Product>>> {
    user.require_admin()?;
    let mut product = state
        .store
        .get_product(&id)?
        .ok_or_else(|| AppError::not_found(format!("Product {}", id)))?;

    let option = product
        .option_mut(&option_id)
        .ok_or_else(|| AppError::not_found(format!("Option {}", option_id)))?;
    option.quantity = req.quantity;

    state.store.upsert_product(&product)?;
    Ok(ok(product))
}

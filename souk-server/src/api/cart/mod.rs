//! Cart API module

mod handler;

use axum::{
    routing::{delete, get, post},
    Router,
};

use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/cart", cart_routes())
}

fn cart_routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::get_cart).delete(handler::clear))
        .route("/items", post(handler::add_item))
        .route(
            "/items/{product_id}/{option_id}",
            delete(handler::remove_item).patch(handler::set_quantity),
        )
}

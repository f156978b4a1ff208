//! API route modules
//!
//! # Structure
//!
//! - [`health`] - health check
//! - [`auth`] - registration and login
//! - [`products`] - catalog management
//! - [`cart`] - shopping cart (users and guests)
//! - [`orders`] - checkout and order management

pub mod auth;
pub mod cart;
pub mod health;
pub mod orders;
pub mod products;

use axum::Router;

use crate::core::ServerState;

// Re-export common types for handlers
pub use crate::utils::{AppResponse, AppResult};

/// Assemble all resource routers
pub fn create_router() -> Router<ServerState> {
    Router::new()
        .merge(health::router())
        .merge(auth::router())
        .merge(products::router())
        .merge(cart::router())
        .merge(orders::router())
}

//! Souk Server - shop backend
//!
//! # Overview
//!
//! Core functionality:
//!
//! - **Catalog** (`db`): products with priced options, VIP and sale prices
//! - **Carts** (`api/cart`): per-user and per-guest carts
//! - **Checkout** (`checkout`): atomic cart-to-order conversion with stock
//!   validation inside a single write transaction
//! - **Receipts** (`receipt`): paginated bidi-aware PDF receipts rendered
//!   through `souk-pdf`
//! - **Notifications** (`notify`): best-effort confirmation emails
//!
//! # Module structure
//!
//! ```text
//! souk-server/src/
//! ├── core/          # config, state, server lifecycle
//! ├── auth/          # JWT, passwords, extractors
//! ├── api/           # HTTP routes and handlers
//! ├── db/            # redb storage and models
//! ├── checkout/      # the checkout transaction
//! ├── receipt/       # image fetch, PDF rendering, worker
//! ├── notify/        # SMTP notifier
//! └── utils/         # errors, logging
//! ```

pub mod api;
pub mod auth;
pub mod checkout;
pub mod core;
pub mod db;
pub mod notify;
pub mod receipt;
pub mod utils;

// Re-export common types
pub use auth::{CurrentUser, Identity, JwtService};
pub use checkout::{CheckoutCoordinator, CheckoutError, CheckoutRequest};
pub use core::{Config, Server, ServerState};
pub use db::{Store, StoreError};
pub use utils::{AppError, AppResponse, AppResult};

pub use utils::logger::{init_logger, init_logger_with_file};

/// Load .env, prepare directories and initialize logging
pub fn setup_environment() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    let config = Config::from_env();
    config.ensure_work_dir_structure()?;

    let log_level = std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into());
    let logs_dir = config.logs_dir();
    if config.is_production() {
        init_logger_with_file(Some(&log_level), logs_dir.to_str());
    } else {
        init_logger_with_file(Some(&log_level), None);
    }

    Ok(())
}

pub fn print_banner() {
    println!(
        r#"
   _____                  __
  / ___/ ____   __  __   / /__
  \__ \ / __ \ / / / /  / //_/
 ___/ // /_/ // /_/ /  / ,<
/____/ \____/ \__,_/  /_/|_|
    "#
    );
}

//! Storage layer: redb tables and data models

pub mod models;
pub mod store;

pub use store::{Store, StoreError, StoreResult};

//! redb-based storage layer
//!
//! # Tables
//!
//! | Table | Key | Value | Purpose |
//! |-------|-----|-------|---------|
//! | `users` | user_id | `User` | Accounts |
//! | `user_emails` | email (lowercase) | user_id | Login lookup + uniqueness |
//! | `products` | product_id | `Product` | Catalog (options embedded) |
//! | `carts` | identity key | `Cart` | Open carts (`user:{id}` / `guest:{id}`) |
//! | `orders` | order_id | `Order` | Placed orders |
//! | `counters` | name | `u64` | Order number sequence |
//!
//! # Concurrency
//!
//! redb allows a single write transaction at a time, so everything done
//! inside one [`WriteTransaction`] is serializable against every other
//! writer. Checkout relies on this: stock validation and decrement happen
//! in the same transaction, so two concurrent checkouts can never both
//! consume the last unit. Dropping an uncommitted transaction aborts it.

use redb::{Database, ReadableDatabase, ReadableTable, TableDefinition, WriteTransaction};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

use super::models::{Cart, Order, OrderStatus, Product, User};

const USERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("users");

/// Secondary index for login: lowercase email -> user_id
const USER_EMAILS_TABLE: TableDefinition<&str, &str> = TableDefinition::new("user_emails");

const PRODUCTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("products");

const CARTS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("carts");

const ORDERS_TABLE: TableDefinition<&str, &[u8]> = TableDefinition::new("orders");

const COUNTERS_TABLE: TableDefinition<&str, u64> = TableDefinition::new("counters");

const ORDER_COUNT_KEY: &str = "order_count";

/// Storage errors
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] redb::DatabaseError),

    #[error("Transaction error: {0}")]
    Transaction(#[from] redb::TransactionError),

    #[error("Table error: {0}")]
    Table(#[from] redb::TableError),

    #[error("Storage error: {0}")]
    Storage(#[from] redb::StorageError),

    #[error("Commit error: {0}")]
    Commit(#[from] redb::CommitError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Email already registered: {0}")]
    EmailTaken(String),

    #[error("Order not found: {0}")]
    OrderNotFound(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Shop storage backed by redb
#[derive(Clone)]
pub struct Store {
    db: Arc<Database>,
}

impl Store {
    /// Open or create the database at the given path
    ///
    /// redb commits with `Durability::Immediate` by default: once `commit()`
    /// returns the data is on disk, and the copy-on-write file is always in
    /// a consistent state even across power loss.
    pub fn open(path: impl AsRef<Path>) -> StoreResult<Self> {
        let db = Database::create(path)?;
        Self::init_tables(db)
    }

    /// Open an in-memory database (for testing)
    pub fn open_in_memory() -> StoreResult<Self> {
        let db = Database::builder().create_with_backend(redb::backends::InMemoryBackend::new())?;
        Self::init_tables(db)
    }

    fn init_tables(db: Database) -> StoreResult<Self> {
        let write_txn = db.begin_write()?;
        {
            let _ = write_txn.open_table(USERS_TABLE)?;
            let _ = write_txn.open_table(USER_EMAILS_TABLE)?;
            let _ = write_txn.open_table(PRODUCTS_TABLE)?;
            let _ = write_txn.open_table(CARTS_TABLE)?;
            let _ = write_txn.open_table(ORDERS_TABLE)?;

            let mut counters = write_txn.open_table(COUNTERS_TABLE)?;
            if counters.get(ORDER_COUNT_KEY)?.is_none() {
                counters.insert(ORDER_COUNT_KEY, 0u64)?;
            }
        }
        write_txn.commit()?;

        Ok(Self { db: Arc::new(db) })
    }

    /// Begin a write transaction
    pub fn begin_write(&self) -> StoreResult<WriteTransaction> {
        Ok(self.db.begin_write()?)
    }

    // ========== Users ==========

    /// Insert a new user. Fails with [`StoreError::EmailTaken`] when the
    /// email is already registered; the uniqueness check and the insert
    /// share one transaction.
    pub fn insert_user(&self, user: &User) -> StoreResult<()> {
        let email_key = user.email.to_lowercase();
        let txn = self.begin_write()?;
        {
            let mut emails = txn.open_table(USER_EMAILS_TABLE)?;
            if emails.get(email_key.as_str())?.is_some() {
                return Err(StoreError::EmailTaken(user.email.clone()));
            }
            emails.insert(email_key.as_str(), user.id.as_str())?;

            let mut users = txn.open_table(USERS_TABLE)?;
            let value = serde_json::to_vec(user)?;
            users.insert(user.id.as_str(), value.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    pub fn get_user(&self, user_id: &str) -> StoreResult<Option<User>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(USERS_TABLE)?;
        match table.get(user_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let read_txn = self.db.begin_read()?;
        let emails = read_txn.open_table(USER_EMAILS_TABLE)?;
        let user_id = match emails.get(email.to_lowercase().as_str())? {
            Some(id) => id.value().to_string(),
            None => return Ok(None),
        };
        let users = read_txn.open_table(USERS_TABLE)?;
        match users.get(user_id.as_str())? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    /// Fetch a user within a write transaction (checkout needs the VIP flag
    /// under the same isolation as the stock update)
    pub fn get_user_txn(&self, txn: &WriteTransaction, user_id: &str) -> StoreResult<Option<User>> {
        let table = txn.open_table(USERS_TABLE)?;
        let found = match table.get(user_id)? {
            Some(value) => Some(serde_json::from_slice(value.value())?),
            None => None,
        };
        Ok(found)
    }

    // ========== Products ==========

    pub fn upsert_product(&self, product: &Product) -> StoreResult<()> {
        let txn = self.begin_write()?;
        {
            let mut table = txn.open_table(PRODUCTS_TABLE)?;
            let value = serde_json::to_vec(product)?;
            table.insert(product.id.as_str(), value.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    pub fn get_product(&self, product_id: &str) -> StoreResult<Option<Product>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PRODUCTS_TABLE)?;
        match table.get(product_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn list_products(&self) -> StoreResult<Vec<Product>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(PRODUCTS_TABLE)?;

        let mut products = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            products.push(serde_json::from_slice(value.value())?);
        }
        Ok(products)
    }

    /// Delete a product. Returns false when it did not exist.
    pub fn delete_product(&self, product_id: &str) -> StoreResult<bool> {
        let txn = self.begin_write()?;
        let mut table = txn.open_table(PRODUCTS_TABLE)?;
        let existed = table.remove(product_id)?.is_some();
        drop(table);
        txn.commit()?;
        Ok(existed)
    }

    pub fn get_product_txn(
        &self,
        txn: &WriteTransaction,
        product_id: &str,
    ) -> StoreResult<Option<Product>> {
        let table = txn.open_table(PRODUCTS_TABLE)?;
        let found = match table.get(product_id)? {
            Some(value) => Some(serde_json::from_slice(value.value())?),
            None => None,
        };
        Ok(found)
    }

    pub fn put_product_txn(&self, txn: &WriteTransaction, product: &Product) -> StoreResult<()> {
        let mut table = txn.open_table(PRODUCTS_TABLE)?;
        let value = serde_json::to_vec(product)?;
        table.insert(product.id.as_str(), value.as_slice())?;
        Ok(())
    }

    // ========== Carts ==========

    pub fn get_cart(&self, key: &str) -> StoreResult<Option<Cart>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(CARTS_TABLE)?;
        match table.get(key)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn put_cart(&self, key: &str, cart: &Cart) -> StoreResult<()> {
        let txn = self.begin_write()?;
        {
            let mut table = txn.open_table(CARTS_TABLE)?;
            let value = serde_json::to_vec(cart)?;
            table.insert(key, value.as_slice())?;
        }
        txn.commit()?;
        Ok(())
    }

    pub fn get_cart_txn(&self, txn: &WriteTransaction, key: &str) -> StoreResult<Option<Cart>> {
        let table = txn.open_table(CARTS_TABLE)?;
        let found = match table.get(key)? {
            Some(value) => Some(serde_json::from_slice(value.value())?),
            None => None,
        };
        Ok(found)
    }

    pub fn put_cart_txn(&self, txn: &WriteTransaction, key: &str, cart: &Cart) -> StoreResult<()> {
        let mut table = txn.open_table(CARTS_TABLE)?;
        let value = serde_json::to_vec(cart)?;
        table.insert(key, value.as_slice())?;
        Ok(())
    }

    // ========== Orders ==========

    pub fn insert_order_txn(&self, txn: &WriteTransaction, order: &Order) -> StoreResult<()> {
        let mut table = txn.open_table(ORDERS_TABLE)?;
        let value = serde_json::to_vec(order)?;
        table.insert(order.id.as_str(), value.as_slice())?;
        Ok(())
    }

    pub fn get_order(&self, order_id: &str) -> StoreResult<Option<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;
        match table.get(order_id)? {
            Some(value) => Ok(Some(serde_json::from_slice(value.value())?)),
            None => Ok(None),
        }
    }

    pub fn list_orders(&self) -> StoreResult<Vec<Order>> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(ORDERS_TABLE)?;

        let mut orders: Vec<Order> = Vec::new();
        for result in table.iter()? {
            let (_key, value) = result?;
            orders.push(serde_json::from_slice(value.value())?);
        }
        orders.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(orders)
    }

    /// Orders placed by one identity, newest first
    pub fn list_orders_for_owner(&self, owner_key: &str) -> StoreResult<Vec<Order>> {
        let mut orders = self.list_orders()?;
        orders.retain(|o| o.owner_key == owner_key);
        Ok(orders)
    }

    /// Update an order's status. Read-modify-write in one transaction.
    pub fn update_order_status(&self, order_id: &str, status: OrderStatus) -> StoreResult<Order> {
        let txn = self.begin_write()?;
        let order = {
            let mut table = txn.open_table(ORDERS_TABLE)?;
            let mut order: Order = match table.get(order_id)? {
                Some(value) => serde_json::from_slice(value.value())?,
                None => return Err(StoreError::OrderNotFound(order_id.to_string())),
            };
            order.status = status;
            let value = serde_json::to_vec(&order)?;
            table.insert(order_id, value.as_slice())?;
            order
        };
        txn.commit()?;
        Ok(order)
    }

    // ========== Counters ==========

    /// Increment and return the order number (within the checkout
    /// transaction, so aborted checkouts do not burn numbers)
    pub fn next_order_number_txn(&self, txn: &WriteTransaction) -> StoreResult<u64> {
        let mut table = txn.open_table(COUNTERS_TABLE)?;
        let current = table
            .get(ORDER_COUNT_KEY)?
            .map(|guard| guard.value())
            .unwrap_or(0);
        let next = current + 1;
        table.insert(ORDER_COUNT_KEY, next)?;
        Ok(next)
    }
}

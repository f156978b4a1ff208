//! Data models

pub mod cart;
pub mod order;
pub mod product;
pub mod user;

pub use cart::{Cart, CartIdentity};
pub use order::{
    Customer, LineItem, Order, OrderStatus, PaymentMethod, ShippingAddress, Totals,
};
pub use product::{Product, ProductCreate, ProductOption, ProductOptionCreate, Sale};
pub use user::{User, UserView};

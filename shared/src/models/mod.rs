//! Shared data models
//!
//! Domain entities stored in SurrealDB and exchanged over the API.

pub mod order;
pub mod product;
pub mod user;

pub use order::{
    DeliveryInfo, Order, OrderItem, OrderStatus, PaymentMethod, StatusEntry,
};
pub use product::Product;
pub use user::{RiderStats, Role, User};

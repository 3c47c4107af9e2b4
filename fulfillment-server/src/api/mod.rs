//! API route modules
//!
//! - [`health`] - liveness check
//! - [`orders`] - customer order lifecycle
//! - [`delivery`] - rider task board and admin validation gate
//! - [`products`] - read-only product lookup
//! - [`payments`] - gateway source passthrough

pub mod delivery;
pub mod health;
pub mod orders;
pub mod payments;
pub mod products;

//! External collaborator clients
//!
//! The fulfillment flow touches two outside systems: the payment
//! gateway and the image store for delivery proofs. Both sit behind
//! traits so handlers and tests never depend on the HTTP clients.

pub mod image_store;
pub mod payment;

pub use image_store::{CloudImageStore, ImageStore};
pub use payment::{PayMongoClient, PaymentGateway, PaymentRecord, PaymentSource};

//! Delivery assignment engine and admin validation gate

pub mod engine;

pub use engine::{DeliveryEngine, DeliveryTask, ProofImage};

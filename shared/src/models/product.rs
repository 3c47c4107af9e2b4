//! Product Model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Product entity
///
/// Catalog data owned by a separate system; this backend reads it for
/// price/name snapshots and mutates only the `stock` counter, via atomic
/// increment/decrement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Product reference (String ID)
    pub product_id: String,
    pub name: String,
    pub description: Option<String>,
    /// Price in currency unit
    pub price: Decimal,
    pub category: Option<String>,
    pub image: Option<String>,
    /// On-hand units, never negative
    pub stock: i64,
    pub is_active: bool,
}

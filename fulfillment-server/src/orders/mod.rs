//! Order state machine
//!
//! Creation, checkout, cancellation and receipt confirmation, plus the
//! pricing rules that freeze an order's amounts at creation time.

pub mod manager;
pub mod pricing;

pub use manager::{OrderDraft, OrderLine, OrderPage, OrdersManager};
pub use pricing::{PricingBreakdown, price_items, to_minor_units};

//! Order Model

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Order lifecycle status
///
/// `to_pay → to_receive → in_transit → completed`, with `cancelled`
/// reachable from `to_receive` only.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    #[default]
    ToPay,
    ToReceive,
    InTransit,
    Completed,
    Cancelled,
}

impl OrderStatus {
    /// Whether a direct transition to `next` is legal
    pub fn can_transition_to(self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (ToPay, ToReceive)
                | (ToReceive, InTransit)
                | (ToReceive, Cancelled)
                | (ToReceive, Completed)
                | (InTransit, Completed)
        )
    }

    /// Terminal states accept no further transitions
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Completed | OrderStatus::Cancelled)
    }

    /// Wire/storage representation (matches the serde rename)
    pub fn as_str(self) -> &'static str {
        match self {
            OrderStatus::ToPay => "to_pay",
            OrderStatus::ToReceive => "to_receive",
            OrderStatus::InTransit => "in_transit",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Payment method selected at order creation
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cod,
    Paymongo,
    Stripe,
}

impl PaymentMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentMethod::Cod => "cod",
            PaymentMethod::Paymongo => "paymongo",
            PaymentMethod::Stripe => "stripe",
        }
    }
}

/// Order line with the product snapshot frozen at creation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderItem {
    /// Product reference (String ID)
    pub product_id: String,
    pub name: String,
    pub image: Option<String>,
    /// Unit price in currency unit, frozen at creation
    pub unit_price: Decimal,
    pub quantity: u32,
    /// unit_price * quantity
    pub subtotal: Decimal,
}

/// Delivery leg of an order
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DeliveryInfo {
    /// Assigned rider (String ID), None while unassigned
    pub rider_id: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Pickup proof image URL
    pub pickup_proof: Option<String>,
    /// Delivery proof image URL
    pub delivery_proof: Option<String>,
    pub pickup_validated: bool,
    pub delivery_validated: bool,
    pub accepted_at: Option<DateTime<Utc>>,
    pub pickup_completed_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub pickup_validated_at: Option<DateTime<Utc>>,
    pub delivery_validated_at: Option<DateTime<Utc>>,
    pub estimated_delivery: Option<DateTime<Utc>>,
}

/// Append-only audit entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusEntry {
    /// Event name (order statuses plus delivery milestones such as
    /// `rider_accepted`, `pickup_completed`, `pickup_validated`)
    pub status: String,
    /// User ID of whoever triggered the transition
    pub actor: String,
    pub timestamp: DateTime<Utc>,
}

/// Order entity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    /// Opaque app-level ID (`ORD-<millis>-<suffix>`)
    pub order_id: String,
    pub customer_id: String,
    pub items: Vec<OrderItem>,
    /// Sum of item subtotals, frozen at creation
    pub items_subtotal: Decimal,
    /// VAT amount, frozen at creation
    pub vat: Decimal,
    /// Flat shipping fee, frozen at creation
    pub shipping_fee: Decimal,
    /// items_subtotal + vat + shipping_fee
    pub total_amount: Decimal,
    pub payment_method: PaymentMethod,
    pub payment_reference: Option<String>,
    pub shipping_address: String,
    pub status: OrderStatus,
    pub delivery: DeliveryInfo,
    /// Cancellation window end, set when the order reaches `to_receive`
    pub cancellation_deadline: Option<DateTime<Utc>>,
    pub can_cancel: bool,
    pub cancellation_reason: Option<String>,
    pub cancellation_date: Option<DateTime<Utc>>,
    pub status_history: Vec<StatusEntry>,
    pub created_at: DateTime<Utc>,
}

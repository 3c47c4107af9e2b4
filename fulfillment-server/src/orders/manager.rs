//! Order lifecycle manager
//!
//! Coordinates repositories, the pricing rules and the payment gateway.
//! Stock truly leaves inventory only at checkout (or `create_paid`);
//! creation just validates availability.

use std::sync::Arc;

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::db::repository::{OrderRepository, ProductRepository};
use crate::orders::pricing::{self, to_minor_units};
use crate::services::PaymentGateway;
use shared::models::{
    DeliveryInfo, Order, OrderItem, OrderStatus, PaymentMethod, Product, StatusEntry,
};
use shared::{AppError, AppResult, ErrorCode};

/// Days until estimated delivery when checkout opens the window
const ESTIMATED_DELIVERY_DAYS: i64 = 2;
/// Days until estimated delivery for gateway-prepaid orders
const ESTIMATED_DELIVERY_DAYS_PREPAID: i64 = 1;

/// One requested line in a new order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderLine {
    pub product_id: String,
    pub quantity: u32,
}

/// Payload for creating an order
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderDraft {
    pub items: Vec<OrderLine>,
    pub payment_method: PaymentMethod,
    pub shipping_address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Paginated order listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderPage {
    pub orders: Vec<Order>,
    pub page: usize,
    pub per_page: usize,
    pub total: i64,
    pub total_pages: i64,
}

#[derive(Clone)]
pub struct OrdersManager {
    orders: OrderRepository,
    products: ProductRepository,
    gateway: Arc<dyn PaymentGateway>,
    shipping_fee: Decimal,
    cancel_window_minutes: i64,
}

fn history(status: &str, actor: &str) -> StatusEntry {
    StatusEntry {
        status: status.to_string(),
        actor: actor.to_string(),
        timestamp: Utc::now(),
    }
}

fn new_order_id() -> String {
    let millis = Utc::now().timestamp_millis();
    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("ORD-{}-{}", millis, &suffix[..6])
}

impl OrdersManager {
    pub fn new(
        db: Surreal<Db>,
        gateway: Arc<dyn PaymentGateway>,
        shipping_fee: Decimal,
        cancel_window_minutes: i64,
    ) -> Self {
        Self {
            orders: OrderRepository::new(db.clone()),
            products: ProductRepository::new(db),
            gateway,
            shipping_fee,
            cancel_window_minutes,
        }
    }

    /// Validate the requested lines against live products and build the
    /// frozen item snapshots. Does not touch stock.
    async fn snapshot_items(&self, lines: &[OrderLine]) -> AppResult<Vec<OrderItem>> {
        if lines.is_empty() {
            return Err(AppError::new(ErrorCode::OrderEmpty));
        }

        let mut items = Vec::with_capacity(lines.len());
        for line in lines {
            if line.quantity == 0 {
                return Err(AppError::validation("Quantity must be at least 1"));
            }

            let product = self
                .products
                .find_by_id(&line.product_id)
                .await
                .map_err(|e| AppError::database(e.to_string()))?
                .ok_or_else(|| {
                    AppError::with_message(
                        ErrorCode::ProductNotFound,
                        format!("Product {} not found", line.product_id),
                    )
                })?;

            if !product.is_active {
                return Err(AppError::with_message(
                    ErrorCode::ProductInactive,
                    format!("Product {} is no longer available", product.name),
                ));
            }
            if product.stock < line.quantity as i64 {
                return Err(AppError::insufficient_stock(
                    product.name,
                    product.stock,
                    line.quantity as i64,
                ));
            }

            let unit_price = product.price;
            items.push(OrderItem {
                product_id: product.product_id,
                name: product.name,
                image: product.image,
                unit_price,
                quantity: line.quantity,
                subtotal: unit_price * Decimal::from(line.quantity),
            });
        }
        Ok(items)
    }

    /// Debit stock for every item; on any short line, credit back what
    /// was already debited and report the offending product.
    async fn debit_stock(&self, items: &[OrderItem]) -> AppResult<()> {
        for (idx, item) in items.iter().enumerate() {
            let debited = self
                .products
                .try_debit_stock(&item.product_id, item.quantity)
                .await
                .map_err(|e| AppError::database(e.to_string()))?;

            if !debited {
                self.credit_stock(&items[..idx]).await;

                let available = self
                    .products
                    .find_by_id(&item.product_id)
                    .await
                    .ok()
                    .flatten()
                    .map(|p: Product| p.stock)
                    .unwrap_or(0);
                return Err(AppError::insufficient_stock(
                    item.name.clone(),
                    available,
                    item.quantity as i64,
                ));
            }
        }
        Ok(())
    }

    /// Compensating credit; failures are logged, not propagated
    async fn credit_stock(&self, items: &[OrderItem]) {
        for item in items {
            if let Err(e) = self
                .products
                .credit_stock(&item.product_id, item.quantity)
                .await
            {
                tracing::error!(
                    product_id = %item.product_id,
                    quantity = item.quantity,
                    error = %e,
                    "Failed to credit stock back"
                );
            }
        }
    }

    /// Create an order in `to_pay`. Validates products and availability,
    /// freezes snapshots and amounts; stock is untouched until checkout.
    pub async fn create(&self, customer_id: &str, draft: OrderDraft) -> AppResult<Order> {
        if draft.shipping_address.trim().is_empty() {
            return Err(AppError::validation("Shipping address is required"));
        }

        let items = self.snapshot_items(&draft.items).await?;
        let pricing = pricing::price_items(&items, self.shipping_fee);

        let order = Order {
            order_id: new_order_id(),
            customer_id: customer_id.to_string(),
            items,
            items_subtotal: pricing.items_subtotal,
            vat: pricing.vat,
            shipping_fee: pricing.shipping_fee,
            total_amount: pricing.total_amount,
            payment_method: draft.payment_method,
            payment_reference: None,
            shipping_address: draft.shipping_address,
            status: OrderStatus::ToPay,
            delivery: DeliveryInfo {
                latitude: draft.latitude,
                longitude: draft.longitude,
                ..DeliveryInfo::default()
            },
            cancellation_deadline: None,
            can_cancel: false,
            cancellation_reason: None,
            cancellation_date: None,
            status_history: vec![history("to_pay", customer_id)],
            created_at: Utc::now(),
        };

        let created = self
            .orders
            .create(order)
            .await
            .map_err(|e| AppError::database(e.to_string()))?;

        tracing::info!(order_id = %created.order_id, total = %created.total_amount, "Order created");
        Ok(created)
    }

    /// Checkout: `to_pay -> to_receive`. Re-validates and debits stock,
    /// opens the cancellation window.
    pub async fn checkout(&self, order_id: &str, actor_id: &str) -> AppResult<Order> {
        let order = self.require_order(order_id).await?;
        if order.customer_id != actor_id {
            return Err(AppError::forbidden("Not your order"));
        }
        if order.status != OrderStatus::ToPay {
            return Err(AppError::invalid_state(order.status.as_str(), "checkout"));
        }

        self.debit_stock(&order.items).await?;

        let now = Utc::now();
        let deadline = now + Duration::minutes(self.cancel_window_minutes);
        let eta = now + Duration::days(ESTIMATED_DELIVERY_DAYS);

        let updated = self
            .orders
            .mark_to_receive(order_id, deadline, eta, history("to_receive", actor_id))
            .await
            .map_err(|e| AppError::database(e.to_string()))?;

        match updated {
            Some(order) => {
                tracing::info!(order_id = %order.order_id, "Order checked out");
                Ok(order)
            }
            None => {
                // Lost a race after the stock was debited; undo it
                self.credit_stock(&order.items).await;
                tracing::error!(order_id = %order_id, "Checkout commit rejected, stock credited back");
                Err(AppError::invalid_state(order.status.as_str(), "checkout"))
            }
        }
    }

    /// Create an order directly in `to_receive` for funds already
    /// confirmed at the gateway.
    pub async fn create_paid(
        &self,
        customer_id: &str,
        draft: OrderDraft,
        payment_reference: &str,
    ) -> AppResult<Order> {
        if draft.shipping_address.trim().is_empty() {
            return Err(AppError::validation("Shipping address is required"));
        }
        if payment_reference.trim().is_empty() {
            return Err(AppError::validation("Payment reference is required"));
        }

        let items = self.snapshot_items(&draft.items).await?;
        let pricing = pricing::price_items(&items, self.shipping_fee);

        // Verify the payment before anything moves
        let source = self.gateway.get_source(payment_reference).await?;
        if !source.is_paid() {
            return Err(AppError::with_message(
                ErrorCode::PaymentNotPaid,
                format!("Payment source {} is '{}'", payment_reference, source.status),
            ));
        }

        let expected_minor = to_minor_units(pricing.total_amount);
        let diff = (source.amount_minor - expected_minor).abs();
        if diff > 1 {
            return Err(AppError::with_message(
                ErrorCode::PaymentAmountMismatch,
                "Paid amount does not match the order total",
            )
            .with_detail("expected_minor", expected_minor)
            .with_detail("paid_minor", source.amount_minor));
        }
        if diff == 1 {
            tracing::warn!(
                expected_minor,
                paid_minor = source.amount_minor,
                "Gateway amount off by one minor unit, accepting"
            );
        }

        self.debit_stock(&items).await?;

        let now = Utc::now();
        let order = Order {
            order_id: new_order_id(),
            customer_id: customer_id.to_string(),
            items: items.clone(),
            items_subtotal: pricing.items_subtotal,
            vat: pricing.vat,
            shipping_fee: pricing.shipping_fee,
            total_amount: pricing.total_amount,
            payment_method: draft.payment_method,
            payment_reference: Some(payment_reference.to_string()),
            shipping_address: draft.shipping_address,
            status: OrderStatus::ToReceive,
            delivery: DeliveryInfo {
                latitude: draft.latitude,
                longitude: draft.longitude,
                estimated_delivery: Some(now + Duration::days(ESTIMATED_DELIVERY_DAYS_PREPAID)),
                ..DeliveryInfo::default()
            },
            cancellation_deadline: Some(now + Duration::minutes(self.cancel_window_minutes)),
            can_cancel: true,
            cancellation_reason: None,
            cancellation_date: None,
            status_history: vec![history("to_receive", customer_id)],
            created_at: now,
        };

        match self.orders.create(order).await {
            Ok(created) => {
                tracing::info!(order_id = %created.order_id, "Prepaid order created");
                Ok(created)
            }
            Err(e) => {
                // Stock was already debited; undo before reporting
                self.credit_stock(&items).await;
                tracing::error!(error = %e, "Prepaid order creation failed after stock debit");
                Err(AppError::database(e.to_string()))
            }
        }
    }

    /// Cancel within the window; credits stock back
    pub async fn cancel(&self, order_id: &str, actor_id: &str, reason: &str) -> AppResult<Order> {
        if reason.trim().is_empty() {
            return Err(AppError::new(ErrorCode::CancelReasonRequired));
        }

        let order = self.require_order(order_id).await?;
        if order.customer_id != actor_id {
            return Err(AppError::forbidden("Not your order"));
        }
        if order.status != OrderStatus::ToReceive {
            return Err(AppError::invalid_state(order.status.as_str(), "cancel"));
        }

        let now = Utc::now();
        let within_window = order.can_cancel
            && order
                .cancellation_deadline
                .map(|d| now <= d)
                .unwrap_or(false);
        if !within_window {
            return Err(AppError::new(ErrorCode::CancelDeadlinePassed));
        }

        let updated = self
            .orders
            .mark_cancelled(order_id, reason, now, history("cancelled", actor_id))
            .await
            .map_err(|e| AppError::database(e.to_string()))?;

        let cancelled = updated
            .ok_or_else(|| AppError::invalid_state(order.status.as_str(), "cancel"))?;

        // The guard committed the terminal state; return the inventory
        self.credit_stock(&cancelled.items).await;

        tracing::info!(order_id = %cancelled.order_id, "Order cancelled");
        Ok(cancelled)
    }

    /// Customer confirms receipt, completing the order directly
    pub async fn confirm_receipt(&self, order_id: &str, actor_id: &str) -> AppResult<Order> {
        let order = self.require_order(order_id).await?;
        if order.customer_id != actor_id {
            return Err(AppError::forbidden("Not your order"));
        }
        match order.status {
            OrderStatus::Completed => {
                return Err(AppError::new(ErrorCode::OrderAlreadyCompleted));
            }
            OrderStatus::Cancelled => {
                return Err(AppError::invalid_state("cancelled", "confirm receipt"));
            }
            _ => {}
        }

        let updated = self
            .orders
            .mark_completed_direct(order_id, history("completed", actor_id))
            .await
            .map_err(|e| AppError::database(e.to_string()))?;

        updated.ok_or_else(|| AppError::new(ErrorCode::OrderAlreadyCompleted))
    }

    /// Fetch one order, visible to the owner, the assigned rider, or an
    /// admin. Everyone else gets `NotFound` rather than a hint that the
    /// order exists.
    pub async fn get(&self, order_id: &str, user: &crate::auth::CurrentUser) -> AppResult<Order> {
        let order = self.require_order(order_id).await?;

        let visible = user.is_admin()
            || order.customer_id == user.id
            || order.delivery.rider_id.as_deref() == Some(user.id.as_str());
        if !visible {
            return Err(AppError::with_message(
                ErrorCode::OrderNotFound,
                format!("Order {} not found", order_id),
            ));
        }
        Ok(order)
    }

    /// Customer's orders, newest first, paginated
    pub async fn list_for_customer(
        &self,
        customer_id: &str,
        status: Option<OrderStatus>,
        page: usize,
        per_page: usize,
    ) -> AppResult<OrderPage> {
        let page = page.max(1);
        let per_page = per_page.clamp(1, 100);
        let start = (page - 1) * per_page;

        let orders = self
            .orders
            .find_for_customer(customer_id, status, per_page, start)
            .await
            .map_err(|e| AppError::database(e.to_string()))?;
        let total = self
            .orders
            .count_for_customer(customer_id, status)
            .await
            .map_err(|e| AppError::database(e.to_string()))?;

        let total_pages = (total + per_page as i64 - 1) / per_page as i64;
        Ok(OrderPage {
            orders,
            page,
            per_page,
            total,
            total_pages,
        })
    }

    async fn require_order(&self, order_id: &str) -> AppResult<Order> {
        self.orders
            .find_by_id(order_id)
            .await
            .map_err(|e| AppError::database(e.to_string()))?
            .ok_or_else(|| {
                AppError::with_message(
                    ErrorCode::OrderNotFound,
                    format!("Order {} not found", order_id),
                )
            })
    }
}

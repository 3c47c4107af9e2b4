//! Delivery engine
//!
//! Rider-facing task board (list, accept, proofs) and the admin
//! validation gate that closes an order and pays the rider out.
//! Assignment and validation both ride on conditional updates in the
//! order repository; this layer maps rejected guards to domain errors.

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::db::repository::{OrderRepository, UserRepository};
use crate::orders::to_minor_units;
use crate::services::ImageStore;
use shared::models::{Order, OrderStatus, RiderStats, StatusEntry};
use shared::{AppError, AppResult, ErrorCode};

/// Hard cap on proof image size
const MAX_PROOF_BYTES: usize = 10 * 1024 * 1024;

/// An order as shown on the rider task board, annotated with the fee
/// the rider earns on completion
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryTask {
    #[serde(flatten)]
    pub order: Order,
    pub delivery_fee: Decimal,
}

/// An uploaded proof photo
#[derive(Debug, Clone)]
pub struct ProofImage {
    pub bytes: Vec<u8>,
    pub mime: String,
}

impl ProofImage {
    fn validate(&self) -> AppResult<()> {
        if self.bytes.is_empty() {
            return Err(AppError::new(ErrorCode::EmptyFile));
        }
        if self.bytes.len() > MAX_PROOF_BYTES {
            return Err(AppError::new(ErrorCode::FileTooLarge));
        }
        if !self.mime.starts_with("image/") {
            return Err(AppError::with_message(
                ErrorCode::UnsupportedFileFormat,
                format!("Expected an image, got {}", self.mime),
            ));
        }
        Ok(())
    }
}

fn history(status: &str, actor: &str) -> StatusEntry {
    StatusEntry {
        status: status.to_string(),
        actor: actor.to_string(),
        timestamp: Utc::now(),
    }
}

#[derive(Clone)]
pub struct DeliveryEngine {
    orders: OrderRepository,
    users: UserRepository,
    images: Arc<dyn ImageStore>,
    delivery_fee: Decimal,
}

impl DeliveryEngine {
    pub fn new(db: Surreal<Db>, images: Arc<dyn ImageStore>, delivery_fee: Decimal) -> Self {
        Self {
            orders: OrderRepository::new(db.clone()),
            users: UserRepository::new(db),
            images,
            delivery_fee,
        }
    }

    fn annotate(&self, orders: Vec<Order>) -> Vec<DeliveryTask> {
        orders
            .into_iter()
            .map(|order| DeliveryTask {
                order,
                delivery_fee: self.delivery_fee,
            })
            .collect()
    }

    /// Unassigned paid orders, newest first
    pub async fn list_available(&self) -> AppResult<Vec<DeliveryTask>> {
        let orders = self
            .orders
            .find_available()
            .await
            .map_err(|e| AppError::database(e.to_string()))?;
        Ok(self.annotate(orders))
    }

    /// Claim an order for a rider.
    ///
    /// The repository runs one conditional write covering both guards
    /// (order unassigned, rider free). A rejected guard comes back here
    /// as `None` and is split into the two conflict reasons.
    pub async fn accept(&self, order_id: &str, rider_id: &str) -> AppResult<DeliveryTask> {
        let accepted = self
            .orders
            .try_accept(
                order_id,
                rider_id,
                Utc::now(),
                history("rider_accepted", rider_id),
            )
            .await
            .map_err(|e| AppError::database(e.to_string()))?;

        if let Some(order) = accepted {
            tracing::info!(order_id = %order.order_id, rider_id = %rider_id, "Task accepted");
            return Ok(DeliveryTask {
                order,
                delivery_fee: self.delivery_fee,
            });
        }

        // Work out which guard said no
        if self
            .orders
            .rider_has_active_task(rider_id)
            .await
            .map_err(|e| AppError::database(e.to_string()))?
        {
            return Err(AppError::new(ErrorCode::RiderBusy));
        }

        let exists = self
            .orders
            .find_by_id(order_id)
            .await
            .map_err(|e| AppError::database(e.to_string()))?
            .is_some();
        if !exists {
            return Err(AppError::with_message(
                ErrorCode::OrderNotFound,
                format!("Order {} not found", order_id),
            ));
        }
        Err(AppError::new(ErrorCode::TaskUnavailable))
    }

    /// The rider's active and completed tasks, newest first
    pub async fn my_tasks(&self, rider_id: &str) -> AppResult<Vec<DeliveryTask>> {
        let orders = self
            .orders
            .find_rider_tasks(rider_id)
            .await
            .map_err(|e| AppError::database(e.to_string()))?;
        Ok(self.annotate(orders))
    }

    /// Upload and record the pickup proof photo
    pub async fn record_pickup_proof(
        &self,
        order_id: &str,
        rider_id: &str,
        image: ProofImage,
    ) -> AppResult<Order> {
        image.validate()?;
        self.ensure_assigned(order_id, rider_id).await?;

        let url = self
            .images
            .upload(
                image.bytes,
                &image.mime,
                "delivery_proofs",
                &format!("{}-pickup", order_id),
            )
            .await?;

        let updated = self
            .orders
            .set_pickup_proof(
                order_id,
                rider_id,
                &url,
                Utc::now(),
                history("pickup_completed", rider_id),
            )
            .await
            .map_err(|e| AppError::database(e.to_string()))?;

        match updated {
            Some(order) => Ok(order),
            None => Err(self.proof_rejection(order_id, rider_id).await),
        }
    }

    /// Upload and record the delivery proof photo
    pub async fn record_delivery_proof(
        &self,
        order_id: &str,
        rider_id: &str,
        image: ProofImage,
    ) -> AppResult<Order> {
        image.validate()?;
        self.ensure_assigned(order_id, rider_id).await?;

        let url = self
            .images
            .upload(
                image.bytes,
                &image.mime,
                "delivery_proofs",
                &format!("{}-delivery", order_id),
            )
            .await?;

        let updated = self
            .orders
            .set_delivery_proof(
                order_id,
                rider_id,
                &url,
                Utc::now(),
                history("delivery_completed", rider_id),
            )
            .await
            .map_err(|e| AppError::database(e.to_string()))?;

        match updated {
            Some(order) => Ok(order),
            None => Err(self.proof_rejection(order_id, rider_id).await),
        }
    }

    /// Check the rider holds this order in transit, before anything is
    /// sent to the image store. The conditional write re-checks the same
    /// guards, so an interleaved state change still cannot slip through.
    async fn ensure_assigned(&self, order_id: &str, rider_id: &str) -> AppResult<()> {
        let order = self
            .orders
            .find_by_id(order_id)
            .await
            .map_err(|e| AppError::database(e.to_string()))?
            .ok_or_else(|| {
                AppError::with_message(
                    ErrorCode::OrderNotFound,
                    format!("Order {} not found", order_id),
                )
            })?;

        if order.delivery.rider_id.as_deref() != Some(rider_id) {
            return Err(AppError::new(ErrorCode::TaskNotAssigned));
        }
        if order.status != OrderStatus::InTransit {
            return Err(AppError::invalid_state(order.status.as_str(), "record proof"));
        }
        Ok(())
    }

    /// Map a rejected proof write to the right error
    async fn proof_rejection(&self, order_id: &str, rider_id: &str) -> AppError {
        match self.orders.find_by_id(order_id).await {
            Ok(Some(order)) => {
                if order.delivery.rider_id.as_deref() != Some(rider_id) {
                    AppError::new(ErrorCode::TaskNotAssigned)
                } else {
                    AppError::invalid_state(order.status.as_str(), "record proof")
                }
            }
            Ok(None) => AppError::with_message(
                ErrorCode::OrderNotFound,
                format!("Order {} not found", order_id),
            ),
            Err(e) => AppError::database(e.to_string()),
        }
    }

    /// Admin validates the pickup proof
    pub async fn validate_pickup(&self, order_id: &str, admin_id: &str) -> AppResult<Order> {
        let validated = self
            .orders
            .validate_pickup(order_id, Utc::now(), history("pickup_validated", admin_id))
            .await
            .map_err(|e| AppError::database(e.to_string()))?
            .ok_or_else(|| {
                AppError::with_message(
                    ErrorCode::ProofNotValidatable,
                    "Pickup proof not found or already validated",
                )
            })?;

        self.try_complete(order_id, admin_id).await?;
        Ok(validated)
    }

    /// Admin validates the delivery proof
    pub async fn validate_delivery(&self, order_id: &str, admin_id: &str) -> AppResult<Order> {
        let validated = self
            .orders
            .validate_delivery(order_id, Utc::now(), history("delivery_validated", admin_id))
            .await
            .map_err(|e| AppError::database(e.to_string()))?
            .ok_or_else(|| {
                AppError::with_message(
                    ErrorCode::ProofNotValidatable,
                    "Delivery proof not found or already validated",
                )
            })?;

        self.try_complete(order_id, admin_id).await?;
        Ok(validated)
    }

    /// Completion join after a validation. The conditional update fires
    /// once across both validation orders, so the payout cannot double.
    async fn try_complete(&self, order_id: &str, actor_id: &str) -> AppResult<()> {
        let completed = self
            .orders
            .try_complete_validated(order_id, history("completed", actor_id))
            .await
            .map_err(|e| AppError::database(e.to_string()))?;

        if let Some(order) = completed {
            if let Some(rider_id) = &order.delivery.rider_id {
                let fee_minor = to_minor_units(self.delivery_fee);
                match self.users.credit_delivery(rider_id, fee_minor).await {
                    Ok(_) => {
                        tracing::info!(
                            order_id = %order.order_id,
                            rider_id = %rider_id,
                            fee_minor,
                            "Delivery completed, rider credited"
                        );
                    }
                    Err(e) => {
                        tracing::error!(
                            order_id = %order.order_id,
                            rider_id = %rider_id,
                            error = %e,
                            "Order completed but rider credit failed"
                        );
                    }
                }
            } else {
                tracing::info!(order_id = %order.order_id, "Order completed without assigned rider");
            }
        }
        Ok(())
    }

    /// Admin task listing with optional filters
    pub async fn list_tasks(
        &self,
        status: Option<OrderStatus>,
        assigned: Option<bool>,
    ) -> AppResult<Vec<DeliveryTask>> {
        let orders = self
            .orders
            .find_tasks(status, assigned)
            .await
            .map_err(|e| AppError::database(e.to_string()))?;
        Ok(self.annotate(orders))
    }

    /// The rider's lifetime counters
    pub async fn rider_stats(&self, rider_id: &str) -> AppResult<RiderStats> {
        let user = self
            .users
            .find_by_id(rider_id)
            .await
            .map_err(|e| AppError::database(e.to_string()))?
            .ok_or_else(|| AppError::new(ErrorCode::RiderNotFound))?;
        Ok(user.rider_stats.unwrap_or_default())
    }
}

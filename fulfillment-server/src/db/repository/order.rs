//! Order Repository
//!
//! Every status change is a single conditional UPDATE guarded on the
//! current state. An empty result set means the guard rejected the
//! write (wrong status, lost race, already validated) and the caller
//! maps that to the appropriate domain error.

use super::{BaseRepository, RepoError, RepoResult};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use shared::models::{Order, OrderStatus, StatusEntry};
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const ORDER_TABLE: &str = "order";

#[derive(Deserialize)]
struct CountRow {
    count: i64,
}

#[derive(Clone)]
pub struct OrderRepository {
    base: BaseRepository,
}

impl OrderRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Persist a freshly built order
    pub async fn create(&self, order: Order) -> RepoResult<Order> {
        let created: Option<Order> = self.base.db().create(ORDER_TABLE).content(order).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create order".to_string()))
    }

    /// Find order by its app-level id
    pub async fn find_by_id(&self, order_id: &str) -> RepoResult<Option<Order>> {
        let orders: Vec<Order> = self
            .base
            .db()
            .query("SELECT * FROM order WHERE order_id = $id")
            .bind(("id", order_id.to_string()))
            .await?
            .take(0)?;
        Ok(orders.into_iter().next())
    }

    /// Customer's orders, newest first, optional status filter
    pub async fn find_for_customer(
        &self,
        customer_id: &str,
        status: Option<OrderStatus>,
        limit: usize,
        start: usize,
    ) -> RepoResult<Vec<Order>> {
        let query = match status {
            Some(_) => {
                "SELECT * FROM order WHERE customer_id = $cid AND status = $status \
                 ORDER BY created_at DESC LIMIT $limit START $start"
            }
            None => {
                "SELECT * FROM order WHERE customer_id = $cid \
                 ORDER BY created_at DESC LIMIT $limit START $start"
            }
        };

        let mut q = self
            .base
            .db()
            .query(query)
            .bind(("cid", customer_id.to_string()))
            .bind(("limit", limit as i64))
            .bind(("start", start as i64));
        if let Some(s) = status {
            q = q.bind(("status", s.as_str().to_string()));
        }

        let orders: Vec<Order> = q.await?.take(0)?;
        Ok(orders)
    }

    /// Total order count for the customer, matching `find_for_customer`
    pub async fn count_for_customer(
        &self,
        customer_id: &str,
        status: Option<OrderStatus>,
    ) -> RepoResult<i64> {
        let query = match status {
            Some(_) => {
                "SELECT count() AS count FROM order \
                 WHERE customer_id = $cid AND status = $status GROUP ALL"
            }
            None => "SELECT count() AS count FROM order WHERE customer_id = $cid GROUP ALL",
        };

        let mut q = self
            .base
            .db()
            .query(query)
            .bind(("cid", customer_id.to_string()));
        if let Some(s) = status {
            q = q.bind(("status", s.as_str().to_string()));
        }

        let rows: Vec<CountRow> = q.await?.take(0)?;
        Ok(rows.into_iter().next().map(|r| r.count).unwrap_or(0))
    }

    /// Commit checkout: `to_pay -> to_receive`, opening the cancellation
    /// window. Returns `None` when the order was not in `to_pay`.
    pub async fn mark_to_receive(
        &self,
        order_id: &str,
        deadline: DateTime<Utc>,
        estimated_delivery: DateTime<Utc>,
        entry: StatusEntry,
    ) -> RepoResult<Option<Order>> {
        let orders: Vec<Order> = self
            .base
            .db()
            .query(
                "UPDATE order SET \
                     status = 'to_receive', \
                     can_cancel = true, \
                     cancellation_deadline = $deadline, \
                     delivery.estimated_delivery = $eta, \
                     status_history += $entry \
                 WHERE order_id = $id AND status = 'to_pay' \
                 RETURN AFTER",
            )
            .bind(("id", order_id.to_string()))
            .bind(("deadline", deadline))
            .bind(("eta", estimated_delivery))
            .bind(("entry", entry))
            .await?
            .take(0)?;
        Ok(orders.into_iter().next())
    }

    /// Cancel: only from `to_receive`. The deadline itself is checked by
    /// the caller before issuing this write.
    pub async fn mark_cancelled(
        &self,
        order_id: &str,
        reason: &str,
        cancelled_at: DateTime<Utc>,
        entry: StatusEntry,
    ) -> RepoResult<Option<Order>> {
        let orders: Vec<Order> = self
            .base
            .db()
            .query(
                "UPDATE order SET \
                     status = 'cancelled', \
                     can_cancel = false, \
                     cancellation_reason = $reason, \
                     cancellation_date = $at, \
                     status_history += $entry \
                 WHERE order_id = $id AND status = 'to_receive' \
                 RETURN AFTER",
            )
            .bind(("id", order_id.to_string()))
            .bind(("reason", reason.to_string()))
            .bind(("at", cancelled_at))
            .bind(("entry", entry))
            .await?
            .take(0)?;
        Ok(orders.into_iter().next())
    }

    /// Customer receipt confirmation: any non-terminal status -> completed
    pub async fn mark_completed_direct(
        &self,
        order_id: &str,
        entry: StatusEntry,
    ) -> RepoResult<Option<Order>> {
        let orders: Vec<Order> = self
            .base
            .db()
            .query(
                "UPDATE order SET \
                     status = 'completed', \
                     can_cancel = false, \
                     status_history += $entry \
                 WHERE order_id = $id AND status NOT IN ['completed', 'cancelled'] \
                 RETURN AFTER",
            )
            .bind(("id", order_id.to_string()))
            .bind(("entry", entry))
            .await?
            .take(0)?;
        Ok(orders.into_iter().next())
    }

    /// Orders open for rider pickup: paid, unassigned, newest first
    pub async fn find_available(&self) -> RepoResult<Vec<Order>> {
        let orders: Vec<Order> = self
            .base
            .db()
            .query(
                "SELECT * FROM order \
                 WHERE status = 'to_receive' \
                   AND (delivery.rider_id = NONE OR delivery.rider_id = NULL) \
                 ORDER BY created_at DESC",
            )
            .await?
            .take(0)?;
        Ok(orders)
    }

    /// Atomic rider assignment.
    ///
    /// A single conditional UPDATE enforces both sides of the race: the
    /// order must still be unassigned and in `to_receive`, and the rider
    /// must not already hold an `in_transit` order (checked via an inline
    /// subquery so the whole thing stays one statement). Returns `None`
    /// when either guard rejects the write.
    pub async fn try_accept(
        &self,
        order_id: &str,
        rider_id: &str,
        accepted_at: DateTime<Utc>,
        entry: StatusEntry,
    ) -> RepoResult<Option<Order>> {
        let orders: Vec<Order> = self
            .base
            .db()
            .query(
                "UPDATE order SET \
                     status = 'in_transit', \
                     can_cancel = false, \
                     delivery.rider_id = $rider, \
                     delivery.accepted_at = $at, \
                     status_history += $entry \
                 WHERE order_id = $id \
                   AND status = 'to_receive' \
                   AND (delivery.rider_id = NONE OR delivery.rider_id = NULL) \
                   AND array::len((\
                       SELECT VALUE order_id FROM order \
                       WHERE delivery.rider_id = $rider AND status = 'in_transit'\
                   )) = 0 \
                 RETURN AFTER",
            )
            .bind(("id", order_id.to_string()))
            .bind(("rider", rider_id.to_string()))
            .bind(("at", accepted_at))
            .bind(("entry", entry))
            .await?
            .take(0)?;
        Ok(orders.into_iter().next())
    }

    /// Rider's active and finished tasks, newest first
    pub async fn find_rider_tasks(&self, rider_id: &str) -> RepoResult<Vec<Order>> {
        let orders: Vec<Order> = self
            .base
            .db()
            .query(
                "SELECT * FROM order \
                 WHERE delivery.rider_id = $rider \
                   AND status IN ['in_transit', 'completed'] \
                 ORDER BY created_at DESC",
            )
            .bind(("rider", rider_id.to_string()))
            .await?
            .take(0)?;
        Ok(orders)
    }

    /// Whether the rider currently holds an in-transit order
    pub async fn rider_has_active_task(&self, rider_id: &str) -> RepoResult<bool> {
        let rows: Vec<CountRow> = self
            .base
            .db()
            .query(
                "SELECT count() AS count FROM order \
                 WHERE delivery.rider_id = $rider AND status = 'in_transit' GROUP ALL",
            )
            .bind(("rider", rider_id.to_string()))
            .await?
            .take(0)?;
        Ok(rows.into_iter().next().map(|r| r.count).unwrap_or(0) > 0)
    }

    /// Record the pickup proof URL; only the assigned rider, only in transit
    pub async fn set_pickup_proof(
        &self,
        order_id: &str,
        rider_id: &str,
        proof_url: &str,
        at: DateTime<Utc>,
        entry: StatusEntry,
    ) -> RepoResult<Option<Order>> {
        let orders: Vec<Order> = self
            .base
            .db()
            .query(
                "UPDATE order SET \
                     delivery.pickup_proof = $url, \
                     delivery.pickup_completed_at = $at, \
                     status_history += $entry \
                 WHERE order_id = $id \
                   AND delivery.rider_id = $rider \
                   AND status = 'in_transit' \
                 RETURN AFTER",
            )
            .bind(("id", order_id.to_string()))
            .bind(("rider", rider_id.to_string()))
            .bind(("url", proof_url.to_string()))
            .bind(("at", at))
            .bind(("entry", entry))
            .await?
            .take(0)?;
        Ok(orders.into_iter().next())
    }

    /// Record the delivery proof URL; only the assigned rider, only in transit
    pub async fn set_delivery_proof(
        &self,
        order_id: &str,
        rider_id: &str,
        proof_url: &str,
        at: DateTime<Utc>,
        entry: StatusEntry,
    ) -> RepoResult<Option<Order>> {
        let orders: Vec<Order> = self
            .base
            .db()
            .query(
                "UPDATE order SET \
                     delivery.delivery_proof = $url, \
                     delivery.delivered_at = $at, \
                     status_history += $entry \
                 WHERE order_id = $id \
                   AND delivery.rider_id = $rider \
                   AND status = 'in_transit' \
                 RETURN AFTER",
            )
            .bind(("id", order_id.to_string()))
            .bind(("rider", rider_id.to_string()))
            .bind(("url", proof_url.to_string()))
            .bind(("at", at))
            .bind(("entry", entry))
            .await?
            .take(0)?;
        Ok(orders.into_iter().next())
    }

    /// Admin validation of the pickup proof. Guarded on the proof being
    /// present and not yet validated, so double calls are no-ops.
    pub async fn validate_pickup(
        &self,
        order_id: &str,
        at: DateTime<Utc>,
        entry: StatusEntry,
    ) -> RepoResult<Option<Order>> {
        let orders: Vec<Order> = self
            .base
            .db()
            .query(
                "UPDATE order SET \
                     delivery.pickup_validated = true, \
                     delivery.pickup_validated_at = $at, \
                     status_history += $entry \
                 WHERE order_id = $id \
                   AND delivery.pickup_proof != NONE \
                   AND delivery.pickup_proof != NULL \
                   AND delivery.pickup_validated = false \
                 RETURN AFTER",
            )
            .bind(("id", order_id.to_string()))
            .bind(("at", at))
            .bind(("entry", entry))
            .await?
            .take(0)?;
        Ok(orders.into_iter().next())
    }

    /// Admin validation of the delivery proof
    pub async fn validate_delivery(
        &self,
        order_id: &str,
        at: DateTime<Utc>,
        entry: StatusEntry,
    ) -> RepoResult<Option<Order>> {
        let orders: Vec<Order> = self
            .base
            .db()
            .query(
                "UPDATE order SET \
                     delivery.delivery_validated = true, \
                     delivery.delivery_validated_at = $at, \
                     status_history += $entry \
                 WHERE order_id = $id \
                   AND delivery.delivery_proof != NONE \
                   AND delivery.delivery_proof != NULL \
                   AND delivery.delivery_validated = false \
                 RETURN AFTER",
            )
            .bind(("id", order_id.to_string()))
            .bind(("at", at))
            .bind(("entry", entry))
            .await?
            .take(0)?;
        Ok(orders.into_iter().next())
    }

    /// Final completion join after either validation commits.
    ///
    /// Fires only when both legs are validated and the order is not
    /// already completed; whichever validation lands second wins this
    /// update exactly once, which is what makes the rider payout
    /// idempotent.
    pub async fn try_complete_validated(
        &self,
        order_id: &str,
        entry: StatusEntry,
    ) -> RepoResult<Option<Order>> {
        let orders: Vec<Order> = self
            .base
            .db()
            .query(
                "UPDATE order SET \
                     status = 'completed', \
                     can_cancel = false, \
                     status_history += $entry \
                 WHERE order_id = $id \
                   AND delivery.pickup_validated = true \
                   AND delivery.delivery_validated = true \
                   AND status != 'completed' \
                 RETURN AFTER",
            )
            .bind(("id", order_id.to_string()))
            .bind(("entry", entry))
            .await?
            .take(0)?;
        Ok(orders.into_iter().next())
    }

    /// Admin task listing with optional status / assignment filters
    pub async fn find_tasks(
        &self,
        status: Option<OrderStatus>,
        assigned: Option<bool>,
    ) -> RepoResult<Vec<Order>> {
        let mut conditions = vec!["status != 'to_pay'".to_string()];
        if status.is_some() {
            conditions.push("status = $status".to_string());
        }
        match assigned {
            Some(true) => conditions
                .push("(delivery.rider_id != NONE AND delivery.rider_id != NULL)".to_string()),
            Some(false) => conditions
                .push("(delivery.rider_id = NONE OR delivery.rider_id = NULL)".to_string()),
            None => {}
        }

        let query = format!(
            "SELECT * FROM order WHERE {} ORDER BY created_at DESC",
            conditions.join(" AND ")
        );

        let mut q = self.base.db().query(query);
        if let Some(s) = status {
            q = q.bind(("status", s.as_str().to_string()));
        }

        let orders: Vec<Order> = q.await?.take(0)?;
        Ok(orders)
    }
}

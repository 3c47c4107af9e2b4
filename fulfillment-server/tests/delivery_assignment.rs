//! Delivery assignment, proof and validation-gate integration tests

mod common;

use std::sync::atomic::Ordering;

use common::{seed_product, seed_rider, setup};
use fulfillment_server::core::ServerState;
use fulfillment_server::delivery::ProofImage;
use fulfillment_server::orders::{OrderDraft, OrderLine};
use rust_decimal::Decimal;
use shared::ErrorCode;
use shared::models::{OrderStatus, PaymentMethod};

fn jpeg() -> ProofImage {
    ProofImage {
        bytes: vec![0xFF, 0xD8, 0xFF, 0xE0, 1, 2, 3],
        mime: "image/jpeg".to_string(),
    }
}

/// Create and check out an order so it sits on the task board
async fn paid_order(state: &ServerState, customer_id: &str) -> String {
    let order = state
        .orders
        .create(
            customer_id,
            OrderDraft {
                items: vec![OrderLine {
                    product_id: "arabica".to_string(),
                    quantity: 1,
                }],
                payment_method: PaymentMethod::Cod,
                shipping_address: "12 Roast St, Quezon City".to_string(),
                latitude: None,
                longitude: None,
            },
        )
        .await
        .unwrap();
    state
        .orders
        .checkout(&order.order_id, customer_id)
        .await
        .unwrap();
    order.order_id
}

#[tokio::test]
async fn task_board_lists_only_unassigned_paid_orders() {
    let h = setup().await;
    seed_product(&h.state, "arabica", 100, 20).await;
    seed_rider(&h.state, "RIDER-1").await;

    // One unpaid, two paid
    h.state
        .orders
        .create(
            "CUST-1",
            OrderDraft {
                items: vec![OrderLine {
                    product_id: "arabica".to_string(),
                    quantity: 1,
                }],
                payment_method: PaymentMethod::Cod,
                shipping_address: "12 Roast St".to_string(),
                latitude: None,
                longitude: None,
            },
        )
        .await
        .unwrap();
    let paid_a = paid_order(&h.state, "CUST-1").await;
    let paid_b = paid_order(&h.state, "CUST-2").await;

    let board = h.state.delivery.list_available().await.unwrap();
    let ids: Vec<_> = board.iter().map(|t| t.order.order_id.clone()).collect();
    assert_eq!(board.len(), 2);
    assert!(ids.contains(&paid_a));
    assert!(ids.contains(&paid_b));
    assert!(board.iter().all(|t| t.delivery_fee == Decimal::from(50)));

    // Accepting one removes it from the board
    h.state.delivery.accept(&paid_a, "RIDER-1").await.unwrap();
    let board = h.state.delivery.list_available().await.unwrap();
    assert_eq!(board.len(), 1);
    assert_eq!(board[0].order.order_id, paid_b);
}

#[tokio::test]
async fn concurrent_accepts_have_exactly_one_winner() {
    let h = setup().await;
    seed_product(&h.state, "arabica", 100, 20).await;
    seed_rider(&h.state, "RIDER-1").await;
    seed_rider(&h.state, "RIDER-2").await;

    let order_id = paid_order(&h.state, "CUST-1").await;

    let (a, b) = tokio::join!(
        h.state.delivery.accept(&order_id, "RIDER-1"),
        h.state.delivery.accept(&order_id, "RIDER-2"),
    );

    let outcomes = [a, b];
    let winners = outcomes.iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1, "exactly one accept must win");

    let loser = outcomes.iter().find(|r| r.is_err()).unwrap();
    assert_eq!(
        loser.as_ref().unwrap_err().code,
        ErrorCode::TaskUnavailable
    );

    let winner_task = outcomes.iter().find_map(|r| r.as_ref().ok()).unwrap();
    let order = &winner_task.order;
    assert_eq!(order.status, OrderStatus::InTransit);
    let assigned = order.delivery.rider_id.as_deref().unwrap();
    assert!(assigned == "RIDER-1" || assigned == "RIDER-2");
    assert_eq!(order.status_history.last().unwrap().status, "rider_accepted");

    // Stored state agrees with the winning response
    let stored = h
        .state
        .delivery
        .my_tasks(assigned)
        .await
        .unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].order.order_id, order_id);
}

#[tokio::test]
async fn a_busy_rider_cannot_take_a_second_task() {
    let h = setup().await;
    seed_product(&h.state, "arabica", 100, 20).await;
    seed_rider(&h.state, "RIDER-1").await;

    let first = paid_order(&h.state, "CUST-1").await;
    let second = paid_order(&h.state, "CUST-2").await;

    h.state.delivery.accept(&first, "RIDER-1").await.unwrap();
    let err = h.state.delivery.accept(&second, "RIDER-1").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::RiderBusy);

    // The second order is still up for grabs
    let board = h.state.delivery.list_available().await.unwrap();
    assert_eq!(board.len(), 1);
    assert_eq!(board[0].order.order_id, second);
}

#[tokio::test]
async fn accepting_a_missing_order_is_not_found() {
    let h = setup().await;
    seed_rider(&h.state, "RIDER-1").await;

    let err = h
        .state
        .delivery
        .accept("ORD-0-missing", "RIDER-1")
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::OrderNotFound);
}

#[tokio::test]
async fn proofs_are_rider_bound_and_validated_images() {
    let h = setup().await;
    seed_product(&h.state, "arabica", 100, 20).await;
    seed_rider(&h.state, "RIDER-1").await;
    seed_rider(&h.state, "RIDER-2").await;

    let order_id = paid_order(&h.state, "CUST-1").await;
    h.state.delivery.accept(&order_id, "RIDER-1").await.unwrap();

    // Wrong rider is turned away before anything reaches the store
    let err = h
        .state
        .delivery
        .record_pickup_proof(&order_id, "RIDER-2", jpeg())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::TaskNotAssigned);
    assert_eq!(h.images.uploads.load(Ordering::SeqCst), 0);

    // Empty upload
    let err = h
        .state
        .delivery
        .record_pickup_proof(
            &order_id,
            "RIDER-1",
            ProofImage {
                bytes: vec![],
                mime: "image/jpeg".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::EmptyFile);

    // Not an image
    let err = h
        .state
        .delivery
        .record_pickup_proof(
            &order_id,
            "RIDER-1",
            ProofImage {
                bytes: vec![1, 2, 3],
                mime: "application/pdf".to_string(),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::UnsupportedFileFormat);

    // The real thing
    let order = h
        .state
        .delivery
        .record_pickup_proof(&order_id, "RIDER-1", jpeg())
        .await
        .unwrap();
    assert!(order.delivery.pickup_proof.as_deref().unwrap().starts_with("https://images.test/"));
    assert!(order.delivery.pickup_completed_at.is_some());
    assert_eq!(order.status_history.last().unwrap().status, "pickup_completed");
    assert_eq!(h.images.uploads.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn proof_on_an_unaccepted_order_uploads_nothing() {
    let h = setup().await;
    seed_product(&h.state, "arabica", 100, 20).await;
    seed_rider(&h.state, "RIDER-1").await;

    let order_id = paid_order(&h.state, "CUST-1").await;

    // Still to_receive, no rider attached
    let err = h
        .state
        .delivery
        .record_pickup_proof(&order_id, "RIDER-1", jpeg())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::TaskNotAssigned);
    assert_eq!(h.images.uploads.load(Ordering::SeqCst), 0);

    let err = h
        .state
        .delivery
        .record_delivery_proof("ORD-0-missing", "RIDER-1", jpeg())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::OrderNotFound);
    assert_eq!(h.images.uploads.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn image_store_outage_commits_nothing() {
    let h = setup().await;
    seed_product(&h.state, "arabica", 100, 20).await;
    seed_rider(&h.state, "RIDER-1").await;

    let order_id = paid_order(&h.state, "CUST-1").await;
    h.state.delivery.accept(&order_id, "RIDER-1").await.unwrap();

    h.images.fail.store(true, Ordering::SeqCst);
    let err = h
        .state
        .delivery
        .record_pickup_proof(&order_id, "RIDER-1", jpeg())
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::UpstreamError);

    let tasks = h.state.delivery.my_tasks("RIDER-1").await.unwrap();
    assert!(tasks[0].order.delivery.pickup_proof.is_none());
    assert!(tasks[0].order.delivery.pickup_completed_at.is_none());
}

#[tokio::test]
async fn both_validations_complete_once_and_credit_once() {
    let h = setup().await;
    seed_product(&h.state, "arabica", 100, 20).await;
    seed_rider(&h.state, "RIDER-1").await;

    let order_id = paid_order(&h.state, "CUST-1").await;
    h.state.delivery.accept(&order_id, "RIDER-1").await.unwrap();
    h.state
        .delivery
        .record_pickup_proof(&order_id, "RIDER-1", jpeg())
        .await
        .unwrap();
    h.state
        .delivery
        .record_delivery_proof(&order_id, "RIDER-1", jpeg())
        .await
        .unwrap();

    // Validating one leg does not complete the order
    h.state.delivery.validate_pickup(&order_id, "ADMIN-1").await.unwrap();
    let tasks = h.state.delivery.my_tasks("RIDER-1").await.unwrap();
    assert_eq!(tasks[0].order.status, OrderStatus::InTransit);
    let stats = h.state.delivery.rider_stats("RIDER-1").await.unwrap();
    assert_eq!(stats.total_deliveries, 0);

    // Second leg completes and pays out 50.00 = 5000 centavos
    h.state.delivery.validate_delivery(&order_id, "ADMIN-1").await.unwrap();
    let tasks = h.state.delivery.my_tasks("RIDER-1").await.unwrap();
    assert_eq!(tasks[0].order.status, OrderStatus::Completed);
    assert_eq!(tasks[0].order.status_history.last().unwrap().status, "completed");

    let stats = h.state.delivery.rider_stats("RIDER-1").await.unwrap();
    assert_eq!(stats.total_deliveries, 1);
    assert_eq!(stats.lifetime_earnings, 5000);

    // Re-validation is rejected and does not double-pay
    let err = h
        .state
        .delivery
        .validate_pickup(&order_id, "ADMIN-1")
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ProofNotValidatable);
    let err = h
        .state
        .delivery
        .validate_delivery(&order_id, "ADMIN-1")
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ProofNotValidatable);

    let stats = h.state.delivery.rider_stats("RIDER-1").await.unwrap();
    assert_eq!(stats.total_deliveries, 1);
    assert_eq!(stats.lifetime_earnings, 5000);
}

#[tokio::test]
async fn validation_order_does_not_matter() {
    let h = setup().await;
    seed_product(&h.state, "arabica", 100, 20).await;
    seed_rider(&h.state, "RIDER-1").await;

    let order_id = paid_order(&h.state, "CUST-1").await;
    h.state.delivery.accept(&order_id, "RIDER-1").await.unwrap();
    h.state
        .delivery
        .record_pickup_proof(&order_id, "RIDER-1", jpeg())
        .await
        .unwrap();
    h.state
        .delivery
        .record_delivery_proof(&order_id, "RIDER-1", jpeg())
        .await
        .unwrap();

    // Delivery leg first this time
    h.state.delivery.validate_delivery(&order_id, "ADMIN-1").await.unwrap();
    h.state.delivery.validate_pickup(&order_id, "ADMIN-1").await.unwrap();

    let tasks = h.state.delivery.my_tasks("RIDER-1").await.unwrap();
    assert_eq!(tasks[0].order.status, OrderStatus::Completed);
    let stats = h.state.delivery.rider_stats("RIDER-1").await.unwrap();
    assert_eq!(stats.total_deliveries, 1);
    assert_eq!(stats.lifetime_earnings, 5000);
}

#[tokio::test]
async fn validation_requires_an_uploaded_proof() {
    let h = setup().await;
    seed_product(&h.state, "arabica", 100, 20).await;
    seed_rider(&h.state, "RIDER-1").await;

    let order_id = paid_order(&h.state, "CUST-1").await;
    h.state.delivery.accept(&order_id, "RIDER-1").await.unwrap();

    let err = h
        .state
        .delivery
        .validate_pickup(&order_id, "ADMIN-1")
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ProofNotValidatable);
}

#[tokio::test]
async fn admin_task_listing_filters() {
    let h = setup().await;
    seed_product(&h.state, "arabica", 100, 20).await;
    seed_rider(&h.state, "RIDER-1").await;

    let assigned = paid_order(&h.state, "CUST-1").await;
    let open = paid_order(&h.state, "CUST-2").await;
    h.state.delivery.accept(&assigned, "RIDER-1").await.unwrap();

    let all = h.state.delivery.list_tasks(None, None).await.unwrap();
    assert_eq!(all.len(), 2);

    let unassigned = h
        .state
        .delivery
        .list_tasks(None, Some(false))
        .await
        .unwrap();
    assert_eq!(unassigned.len(), 1);
    assert_eq!(unassigned[0].order.order_id, open);

    let in_transit = h
        .state
        .delivery
        .list_tasks(Some(OrderStatus::InTransit), None)
        .await
        .unwrap();
    assert_eq!(in_transit.len(), 1);
    assert_eq!(in_transit[0].order.order_id, assigned);
}

#[tokio::test]
async fn rider_stats_requires_a_known_rider() {
    let h = setup().await;
    let err = h.state.delivery.rider_stats("RIDER-ghost").await.unwrap_err();
    assert_eq!(err.code, ErrorCode::RiderNotFound);
}

//! Shared test fixtures: in-memory state, collaborator doubles, seeds

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use fulfillment_server::auth::{CurrentUser, JwtConfig};
use fulfillment_server::core::{Config, ServerState};
use fulfillment_server::db::DbService;
use fulfillment_server::db::repository::{ProductRepository, UserRepository};
use fulfillment_server::services::{ImageStore, PaymentGateway, PaymentRecord, PaymentSource};
use shared::models::{Product, Role, User};
use shared::{AppError, AppResult};

/// Payment gateway double backed by a source map
#[derive(Default)]
pub struct MockGateway {
    sources: Mutex<HashMap<String, PaymentSource>>,
}

impl MockGateway {
    pub async fn add_source(&self, id: &str, status: &str, amount_minor: i64) {
        self.sources.lock().await.insert(
            id.to_string(),
            PaymentSource {
                id: id.to_string(),
                status: status.to_string(),
                amount_minor,
                currency: "PHP".to_string(),
                checkout_url: None,
            },
        );
    }
}

#[async_trait]
impl PaymentGateway for MockGateway {
    async fn create_source(
        &self,
        amount_minor: i64,
        currency: &str,
        _kind: &str,
        _success_url: &str,
        _failed_url: &str,
    ) -> AppResult<PaymentSource> {
        let id = format!("src_{}", uuid::Uuid::new_v4().simple());
        let source = PaymentSource {
            id: id.clone(),
            status: "pending".to_string(),
            amount_minor,
            currency: currency.to_string(),
            checkout_url: Some("https://gateway.test/checkout".to_string()),
        };
        self.sources.lock().await.insert(id, source.clone());
        Ok(source)
    }

    async fn get_source(&self, source_id: &str) -> AppResult<PaymentSource> {
        self.sources
            .lock()
            .await
            .get(source_id)
            .cloned()
            .ok_or_else(|| AppError::upstream("paymongo", format!("Unknown source {source_id}")))
    }

    async fn create_payment(
        &self,
        amount_minor: i64,
        _currency: &str,
        source_id: &str,
        _description: &str,
    ) -> AppResult<PaymentRecord> {
        Ok(PaymentRecord {
            id: format!("pay_{source_id}"),
            status: "paid".to_string(),
            amount_minor,
        })
    }
}

/// Image store double; can be switched to fail to test upstream errors
#[derive(Default)]
pub struct MockImageStore {
    pub uploads: AtomicUsize,
    pub fail: AtomicBool,
}

#[async_trait]
impl ImageStore for MockImageStore {
    async fn upload(
        &self,
        _bytes: Vec<u8>,
        _mime: &str,
        folder: &str,
        public_id: &str,
    ) -> AppResult<String> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::upstream("image_store", "Simulated outage"));
        }
        self.uploads.fetch_add(1, Ordering::SeqCst);
        Ok(format!("https://images.test/{folder}/{public_id}.jpg"))
    }
}

pub struct TestHarness {
    pub state: ServerState,
    pub gateway: Arc<MockGateway>,
    pub images: Arc<MockImageStore>,
}

fn test_config() -> Config {
    let mut config = Config::with_overrides("/tmp/brewhaul-test", 0);
    config.jwt = JwtConfig {
        secret: "test-secret-at-least-32-characters-long!".to_string(),
        expiration_minutes: 60,
        issuer: "fulfillment-server".to_string(),
        audience: "brewhaul-clients".to_string(),
    };
    config.shipping_fee = Decimal::from(120);
    config.delivery_fee = Decimal::from(50);
    config.cancel_window_minutes = 5;
    config
}

/// Fresh in-memory state with collaborator doubles
pub async fn setup() -> TestHarness {
    let db = DbService::memory().await.expect("in-memory db");
    let gateway = Arc::new(MockGateway::default());
    let images = Arc::new(MockImageStore::default());

    let state = ServerState::with_collaborators(
        test_config(),
        db.db,
        gateway.clone(),
        images.clone(),
    );

    TestHarness {
        state,
        gateway,
        images,
    }
}

pub fn customer(id: &str) -> CurrentUser {
    CurrentUser {
        id: id.to_string(),
        username: format!("user-{id}"),
        role: Role::Customer,
    }
}

pub async fn seed_product(state: &ServerState, product_id: &str, price: i64, stock: i64) {
    let repo = ProductRepository::new(state.db.clone());
    repo.create(Product {
        product_id: product_id.to_string(),
        name: format!("{product_id} beans"),
        description: None,
        price: Decimal::from(price),
        category: Some("coffee".to_string()),
        image: None,
        stock,
        is_active: true,
    })
    .await
    .expect("seed product");
}

pub async fn seed_rider(state: &ServerState, rider_id: &str) {
    let repo = UserRepository::new(state.db.clone());
    repo.create(User {
        user_id: rider_id.to_string(),
        name: format!("rider-{rider_id}"),
        role: Role::Rider,
        rider_stats: None,
    })
    .await
    .expect("seed rider");
}

pub async fn product_stock(state: &ServerState, product_id: &str) -> i64 {
    let repo = ProductRepository::new(state.db.clone());
    repo.find_by_id(product_id)
        .await
        .expect("lookup product")
        .expect("product exists")
        .stock
}

/// Push an order's cancellation deadline into the past or future
pub async fn shift_deadline(state: &ServerState, order_id: &str, minutes_from_now: i64) {
    let deadline = chrono::Utc::now() + chrono::Duration::minutes(minutes_from_now);
    state
        .db
        .query("UPDATE order SET cancellation_deadline = $d WHERE order_id = $id")
        .bind(("d", deadline))
        .bind(("id", order_id.to_string()))
        .await
        .expect("shift deadline");
}

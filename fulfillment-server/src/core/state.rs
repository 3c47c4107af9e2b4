use std::sync::Arc;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::auth::JwtService;
use crate::core::Config;
use crate::db::DbService;
use crate::delivery::DeliveryEngine;
use crate::orders::OrdersManager;
use crate::services::{CloudImageStore, ImageStore, PayMongoClient, PaymentGateway};
use shared::AppError;

/// Server state - shared handle to every service
///
/// Cloning is shallow; all services sit behind `Arc` or are cheap
/// handles themselves.
///
/// | Field | Meaning |
/// |-------|---------|
/// | config | immutable configuration |
/// | db | embedded SurrealDB handle |
/// | jwt_service | token validation |
/// | orders | order state machine |
/// | delivery | assignment engine + validation gate |
/// | gateway | payment gateway client |
#[derive(Clone)]
pub struct ServerState {
    pub config: Config,
    pub db: Surreal<Db>,
    pub jwt_service: Arc<JwtService>,
    pub orders: OrdersManager,
    pub delivery: DeliveryEngine,
    pub gateway: Arc<dyn PaymentGateway>,
}

impl ServerState {
    /// Initialize production state: RocksDB storage plus the HTTP
    /// collaborator clients.
    pub async fn initialize(config: &Config) -> Result<Self, AppError> {
        let db_dir = config.database_dir();
        std::fs::create_dir_all(&db_dir)
            .map_err(|e| AppError::internal(format!("Failed to create work directory: {e}")))?;

        let db_path = db_dir.join("fulfillment.db");
        let db_service = DbService::new(&db_path.to_string_lossy()).await?;

        let gateway: Arc<dyn PaymentGateway> = Arc::new(PayMongoClient::new(
            config.paymongo_base_url.clone(),
            config.paymongo_secret_key.clone(),
        ));
        let images: Arc<dyn ImageStore> = Arc::new(CloudImageStore::new(
            config.image_cloud_name.clone(),
            config.image_api_key.clone(),
            config.image_api_secret.clone(),
        ));

        Ok(Self::with_collaborators(
            config.clone(),
            db_service.db,
            gateway,
            images,
        ))
    }

    /// Build state over an existing database handle and collaborator
    /// implementations. Tests use this with `Mem` storage and doubles.
    pub fn with_collaborators(
        config: Config,
        db: Surreal<Db>,
        gateway: Arc<dyn PaymentGateway>,
        images: Arc<dyn ImageStore>,
    ) -> Self {
        let jwt_service = Arc::new(JwtService::with_config(config.jwt.clone()));
        let orders = OrdersManager::new(
            db.clone(),
            gateway.clone(),
            config.shipping_fee,
            config.cancel_window_minutes,
        );
        let delivery = DeliveryEngine::new(db.clone(), images, config.delivery_fee);

        Self {
            config,
            db,
            jwt_service,
            orders,
            delivery,
            gateway,
        }
    }

    pub fn get_db(&self) -> Surreal<Db> {
        self.db.clone()
    }

    pub fn get_jwt_service(&self) -> Arc<JwtService> {
        self.jwt_service.clone()
    }
}

//! Database Module
//!
//! Embedded SurrealDB storage and repositories.

pub mod repository;

use shared::AppError;
use surrealdb::Surreal;
use surrealdb::engine::local::{Db, RocksDb};

const NAMESPACE: &str = "brewhaul";
const DATABASE: &str = "fulfillment";

/// Database service - owns the embedded SurrealDB handle
#[derive(Clone)]
pub struct DbService {
    pub db: Surreal<Db>,
}

impl DbService {
    /// Open (or create) the RocksDB-backed database at `db_path`
    pub async fn new(db_path: &str) -> Result<Self, AppError> {
        let db = Surreal::new::<RocksDb>(db_path)
            .await
            .map_err(|e| AppError::database(format!("Failed to open database: {e}")))?;

        db.use_ns(NAMESPACE)
            .use_db(DATABASE)
            .await
            .map_err(|e| AppError::database(format!("Failed to select namespace: {e}")))?;

        tracing::info!("Database connection established ({db_path})");

        Ok(Self { db })
    }

    /// In-memory database, used by integration tests
    pub async fn memory() -> Result<Self, AppError> {
        let db = Surreal::new::<surrealdb::engine::local::Mem>(())
            .await
            .map_err(|e| AppError::database(format!("Failed to open in-memory database: {e}")))?;

        db.use_ns(NAMESPACE)
            .use_db(DATABASE)
            .await
            .map_err(|e| AppError::database(format!("Failed to select namespace: {e}")))?;

        Ok(Self { db })
    }
}

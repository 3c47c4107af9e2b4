//! Product Repository

use super::{BaseRepository, RepoError, RepoResult};
use shared::models::Product;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const PRODUCT_TABLE: &str = "product";

#[derive(Clone)]
pub struct ProductRepository {
    base: BaseRepository,
}

impl ProductRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find all active products
    pub async fn find_all(&self) -> RepoResult<Vec<Product>> {
        let products: Vec<Product> = self
            .base
            .db()
            .query("SELECT * FROM product WHERE is_active = true ORDER BY name")
            .await?
            .take(0)?;
        Ok(products)
    }

    /// Find product by its app-level id
    pub async fn find_by_id(&self, product_id: &str) -> RepoResult<Option<Product>> {
        let products: Vec<Product> = self
            .base
            .db()
            .query("SELECT * FROM product WHERE product_id = $pid")
            .bind(("pid", product_id.to_string()))
            .await?
            .take(0)?;
        Ok(products.into_iter().next())
    }

    /// Create a new product
    pub async fn create(&self, product: Product) -> RepoResult<Product> {
        let created: Option<Product> = self.base.db().create(PRODUCT_TABLE).content(product).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create product".to_string()))
    }

    /// Atomically debit stock for one product line.
    ///
    /// The decrement only fires when the product is active and has at
    /// least `quantity` units on hand; returns `false` when the guard
    /// rejects the update (caller decides how to report it).
    pub async fn try_debit_stock(&self, product_id: &str, quantity: u32) -> RepoResult<bool> {
        let updated: Vec<Product> = self
            .base
            .db()
            .query(
                "UPDATE product SET stock -= $qty \
                 WHERE product_id = $pid AND is_active = true AND stock >= $qty \
                 RETURN AFTER",
            )
            .bind(("pid", product_id.to_string()))
            .bind(("qty", quantity as i64))
            .await?
            .take(0)?;
        Ok(!updated.is_empty())
    }

    /// Atomically credit stock back (cancellation, rollback)
    pub async fn credit_stock(&self, product_id: &str, quantity: u32) -> RepoResult<()> {
        let updated: Vec<Product> = self
            .base
            .db()
            .query(
                "UPDATE product SET stock += $qty \
                 WHERE product_id = $pid \
                 RETURN AFTER",
            )
            .bind(("pid", product_id.to_string()))
            .bind(("qty", quantity as i64))
            .await?
            .take(0)?;
        if updated.is_empty() {
            // Product vanished between debit and credit; surface it loudly
            return Err(RepoError::NotFound(format!("product {product_id}")));
        }
        Ok(())
    }
}

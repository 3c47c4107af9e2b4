//! User Repository

use super::{BaseRepository, RepoError, RepoResult};
use shared::models::User;
use surrealdb::Surreal;
use surrealdb::engine::local::Db;

const USER_TABLE: &str = "user";

#[derive(Clone)]
pub struct UserRepository {
    base: BaseRepository,
}

impl UserRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find user by its app-level id
    pub async fn find_by_id(&self, user_id: &str) -> RepoResult<Option<User>> {
        let users: Vec<User> = self
            .base
            .db()
            .query("SELECT * FROM user WHERE user_id = $uid")
            .bind(("uid", user_id.to_string()))
            .await?
            .take(0)?;
        Ok(users.into_iter().next())
    }

    /// Create a new user
    pub async fn create(&self, user: User) -> RepoResult<User> {
        let created: Option<User> = self.base.db().create(USER_TABLE).content(user).await?;
        created.ok_or_else(|| RepoError::Database("Failed to create user".to_string()))
    }

    /// Atomically credit a completed delivery to the rider's lifetime
    /// stats. `amount_minor` is in minor currency units (centavos).
    pub async fn credit_delivery(&self, rider_id: &str, amount_minor: i64) -> RepoResult<User> {
        let updated: Vec<User> = self
            .base
            .db()
            .query(
                "UPDATE user SET rider_stats = { \
                     lifetime_earnings: (rider_stats.lifetime_earnings ?? 0) + $amt, \
                     total_deliveries: (rider_stats.total_deliveries ?? 0) + 1 \
                 } \
                 WHERE user_id = $uid \
                 RETURN AFTER",
            )
            .bind(("uid", rider_id.to_string()))
            .bind(("amt", amount_minor))
            .await?
            .take(0)?;
        updated
            .into_iter()
            .next()
            .ok_or_else(|| RepoError::NotFound(format!("rider {rider_id}")))
    }
}

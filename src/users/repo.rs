use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use crate::auth::password::hashes_equal;
use crate::storage::{contains_pattern, map_write_error, StoreError, StoreResult};
use crate::users::repo_types::{User, UserFilter, UserPage};

/// Persistence contract for user rows.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts an active user. `Conflict` when the email is taken.
    async fn create(&self, email: &str, name: &str, hash: &str, salt: &str) -> StoreResult<User>;

    /// Numeric identifiers are ids, anything else is an email.
    async fn get_by_id_or_email(&self, identifier: &str) -> StoreResult<User>;

    async fn get_salt(&self, email: &str) -> StoreResult<String>;

    /// Returns the number of rows written; zero when the email is unknown.
    async fn set_hash_and_salt(&self, email: &str, hash: &str, salt: &str) -> StoreResult<u64>;

    async fn update(&self, user_id: i64, email: &str, name: &str, active: bool)
        -> StoreResult<User>;

    async fn list(&self, filter: &UserFilter) -> StoreResult<UserPage>;

    /// False when the user is missing or the hash differs.
    async fn check_hash(&self, email: &str, hash: &str) -> StoreResult<bool>;
}

#[derive(Clone)]
pub struct PgUserStore {
    db: PgPool,
}

impl PgUserStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, email: &str, name: &str, hash: &str, salt: &str) -> StoreResult<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, name, hash, salt, active)
            VALUES ($1, $2, $3, $4, TRUE)
            RETURNING id, email, name, active
            "#,
        )
        .bind(email)
        .bind(name)
        .bind(hash)
        .bind(salt)
        .fetch_one(&self.db)
        .await
        .map_err(map_write_error)?;
        Ok(user)
    }

    async fn get_by_id_or_email(&self, identifier: &str) -> StoreResult<User> {
        let query = match identifier.parse::<i64>() {
            Ok(id) => sqlx::query_as::<_, User>(
                r#"SELECT id, email, name, active FROM users WHERE id = $1"#,
            )
            .bind(id),
            Err(_) => sqlx::query_as::<_, User>(
                r#"SELECT id, email, name, active FROM users WHERE email = $1"#,
            )
            .bind(identifier),
        };
        query
            .fetch_optional(&self.db)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn get_salt(&self, email: &str) -> StoreResult<String> {
        sqlx::query_scalar::<_, String>(r#"SELECT salt FROM users WHERE email = $1"#)
            .bind(email)
            .fetch_optional(&self.db)
            .await?
            .ok_or(StoreError::NotFound)
    }

    async fn set_hash_and_salt(&self, email: &str, hash: &str, salt: &str) -> StoreResult<u64> {
        let result = sqlx::query(r#"UPDATE users SET hash = $1, salt = $2 WHERE email = $3"#)
            .bind(hash)
            .bind(salt)
            .bind(email)
            .execute(&self.db)
            .await?;
        debug!(rows = result.rows_affected(), "hash and salt written");
        Ok(result.rows_affected())
    }

    async fn update(
        &self,
        user_id: i64,
        email: &str,
        name: &str,
        active: bool,
    ) -> StoreResult<User> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET email = $1, name = $2, active = $3
            WHERE id = $4
            RETURNING id, email, name, active
            "#,
        )
        .bind(email)
        .bind(name)
        .bind(active)
        .bind(user_id)
        .fetch_optional(&self.db)
        .await
        .map_err(map_write_error)?
        .ok_or(StoreError::NotFound)
    }

    async fn list(&self, filter: &UserFilter) -> StoreResult<UserPage> {
        let rows = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, active
            FROM users
            WHERE ($1::text IS NULL OR email ILIKE $1)
              AND ($2::text IS NULL OR name ILIKE $2)
            ORDER BY id
            LIMIT $3 OFFSET $4
            "#,
        )
        .bind(filter.email.as_deref().map(contains_pattern))
        .bind(filter.name.as_deref().map(contains_pattern))
        .bind(filter.limit + 1)
        .bind(filter.offset)
        .fetch_all(&self.db)
        .await?;
        Ok(UserPage::from_overfetch(rows, filter.limit))
    }

    async fn check_hash(&self, email: &str, hash: &str) -> StoreResult<bool> {
        let stored = sqlx::query_scalar::<_, String>(r#"SELECT hash FROM users WHERE email = $1"#)
            .bind(email)
            .fetch_optional(&self.db)
            .await?;
        Ok(stored.is_some_and(|stored| hashes_equal(&stored, hash)))
    }
}

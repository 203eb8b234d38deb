use async_trait::async_trait;
use sqlx::PgPool;
use tracing::debug;

use crate::roles::repo_types::Role;
use crate::storage::{map_write_error, StoreError, StoreResult};

/// Persistence contract for roles and the user/role association.
#[async_trait]
pub trait RoleStore: Send + Sync {
    /// `NotFound` if the user does not exist, empty when it holds no role.
    async fn get_roles_for_user(&self, user_id: i64) -> StoreResult<Vec<Role>>;

    async fn create_role(&self, code: &str, name: &str) -> StoreResult<Role>;

    /// Idempotent: assigning a held role is a no-op.
    async fn assign_role(&self, user_id: i64, code: &str) -> StoreResult<()>;

    async fn list_roles(&self) -> StoreResult<Vec<Role>>;
}

#[derive(Clone)]
pub struct PgRoleStore {
    db: PgPool,
}

impl PgRoleStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RoleStore for PgRoleStore {
    async fn get_roles_for_user(&self, user_id: i64) -> StoreResult<Vec<Role>> {
        let mut conn = self.db.acquire().await?;

        let exists =
            sqlx::query_scalar::<_, bool>(r#"SELECT EXISTS(SELECT 1 FROM users WHERE id = $1)"#)
                .bind(user_id)
                .fetch_one(&mut *conn)
                .await?;
        if !exists {
            return Err(StoreError::NotFound);
        }

        let roles = sqlx::query_as::<_, Role>(
            r#"
            SELECT r.id, r.code, r.name
            FROM roles r
            JOIN user_roles ur ON ur.role_id = r.id
            WHERE ur.user_id = $1
            ORDER BY r.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await?;
        Ok(roles)
    }

    async fn create_role(&self, code: &str, name: &str) -> StoreResult<Role> {
        let role = sqlx::query_as::<_, Role>(
            r#"
            INSERT INTO roles (code, name)
            VALUES ($1, $2)
            RETURNING id, code, name
            "#,
        )
        .bind(code)
        .bind(name)
        .fetch_one(&self.db)
        .await
        .map_err(map_write_error)?;
        Ok(role)
    }

    async fn assign_role(&self, user_id: i64, code: &str) -> StoreResult<()> {
        let mut tx = self.db.begin().await?;

        let role_id = sqlx::query_scalar::<_, i64>(r#"SELECT id FROM roles WHERE code = $1"#)
            .bind(code)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(StoreError::NotFound)?;

        // Row lock keeps the user alive until the association is committed.
        sqlx::query_scalar::<_, i64>(r#"SELECT id FROM users WHERE id = $1 FOR SHARE"#)
            .bind(user_id)
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(StoreError::NotFound)?;

        let result = sqlx::query(
            r#"
            INSERT INTO user_roles (user_id, role_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, role_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(role_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        debug!(user_id, code, inserted = result.rows_affected(), "role assigned");
        Ok(())
    }

    async fn list_roles(&self) -> StoreResult<Vec<Role>> {
        let roles = sqlx::query_as::<_, Role>(r#"SELECT id, code, name FROM roles ORDER BY id"#)
            .fetch_all(&self.db)
            .await?;
        Ok(roles)
    }
}

//! User record store. The trait exists so the service layer can be tested
//! against an in-memory double; Postgres is the only production backend.

use crate::error::{AppError, Result};
use crate::models::User;
use async_trait::async_trait;
use sqlx::PgPool;

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new user. A duplicate email is reported as
    /// [`AppError::DuplicateEmail`], whichever layer detects it.
    async fn create(&self, email: &str, password_hash: &str, role: &str) -> Result<User>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn find_by_id(&self, user_id: i64) -> Result<Option<User>>;

    /// Update a user's display name. Returns `None` when the id does not
    /// exist.
    async fn update_name(&self, user_id: i64, name: &str) -> Result<Option<User>>;

    /// Delete a user. Returns `false` when no row matched.
    async fn delete(&self, user_id: i64) -> Result<bool>;
}

pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create(&self, email: &str, password_hash: &str, role: &str) -> Result<User> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password_hash, role)
            VALUES ($1, $2, $3)
            RETURNING id, email, password_hash, role, name, created_at, updated_at
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .bind(role)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::DuplicateEmail
            } else {
                AppError::Database(e)
            }
        })?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn find_by_id(&self, user_id: i64) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(user)
    }

    async fn update_name(&self, user_id: i64, name: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name = $1, updated_at = NOW()
            WHERE id = $2
            RETURNING id, email, password_hash, role, name, created_at, updated_at
            "#,
        )
        .bind(name)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn delete(&self, user_id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Postgres unique-constraint violation (SQLSTATE 23505).
fn is_unique_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .and_then(|db_err| db_err.code())
        .map(|code| code == "23505")
        .unwrap_or(false)
}

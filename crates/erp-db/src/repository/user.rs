//! # User Repository
//!
//! Accounts for authentication and the buyer identity of sales.

use sqlx::{SqliteConnection, SqlitePool};
use tracing::debug;

use crate::error::DbResult;
use erp_core::{User, UserSummary};

#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, role_id, created_at, updated_at
            FROM users
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Looks up a user for login.
    pub async fn get_by_username(&self, username: &str) -> DbResult<Option<User>> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, username, email, password_hash, role_id, created_at, updated_at
            FROM users
            WHERE username = ?1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    /// Inserts a new user.
    ///
    /// ## Returns
    /// * `Err(DbError::UniqueViolation)` - username or email taken
    pub async fn insert(&self, user: &User) -> DbResult<User> {
        debug!(username = %user.username, role_id = %user.role_id, "Inserting user");

        sqlx::query(
            r#"
            INSERT INTO users (id, username, email, password_hash, role_id, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
        )
        .bind(&user.id)
        .bind(&user.username)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.role_id)
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(user.clone())
    }

    pub async fn get_summary(&self, id: &str) -> DbResult<Option<UserSummary>> {
        let mut conn = self.pool.acquire().await?;
        Self::summary_in(&mut conn, id).await
    }

    /// Reads the presentation summary of a user on the given connection.
    pub async fn summary_in(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<UserSummary>> {
        let summary = sqlx::query_as::<_, UserSummary>(
            r#"
            SELECT id, username, email, role_id
            FROM users
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(conn)
        .await?;

        Ok(summary)
    }
}

use async_trait::async_trait;
use sqlx::SqlitePool;
use thiserror::Error;

pub use crate::auth::repo_types::{Account, NewAccount};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("email already registered")]
    Duplicate,

    #[error("database error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

/// Persistence contract the auth service depends on.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Insert a new account. Fails with [`StoreError::Duplicate`] when the
    /// email is already taken, even if the caller checked beforehand.
    async fn insert(&self, new: NewAccount<'_>) -> Result<Account, StoreError>;
    async fn find_by_id(&self, id: i64) -> Result<Option<Account>, StoreError>;
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;
}

#[derive(Debug, Clone)]
pub struct SqliteUserStore {
    pool: SqlitePool,
}

impl SqliteUserStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

#[async_trait]
impl UserStore for SqliteUserStore {
    async fn insert(&self, new: NewAccount<'_>) -> Result<Account, StoreError> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            INSERT INTO users (email, display_name, password_hash, created_at)
            VALUES (?, ?, ?, ?)
            RETURNING id, email, display_name, password_hash, created_at
            "#,
        )
        .bind(new.email)
        .bind(new.display_name)
        .bind(new.password_hash)
        .bind(new.created_at)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db)
                if db.is_unique_violation() || db.message().contains("UNIQUE") =>
            {
                StoreError::Duplicate
            }
            other => StoreError::Sqlx(other),
        })?;
        Ok(account)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Account>, StoreError> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            SELECT id, email, display_name, password_hash, created_at
            FROM users
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(account)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let account = sqlx::query_as::<_, Account>(
            r#"
            SELECT id, email, display_name, password_hash, created_at
            FROM users
            WHERE email = ?
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(account)
    }
}

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;
use tokio::sync::RwLock;

use crate::auth::repo_types::User;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("user already exists")]
    DuplicateEmail,
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Durable mapping from email to account state. Uniqueness is enforced on
/// `email`; a violated constraint surfaces as `StoreError::DuplicateEmail`.
#[async_trait]
pub trait UserStore: Send + Sync {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError>;
    async fn create(&self, email: &str) -> Result<User, StoreError>;
    async fn save(&self, user: &User) -> Result<(), StoreError>;
}

fn map_sqlx_err(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db)
            if matches!(db.kind(), sqlx::error::ErrorKind::UniqueViolation) =>
        {
            StoreError::DuplicateEmail
        }
        _ => StoreError::Other(err.into()),
    }
}

/// Postgres-backed user store.
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
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password_hash, is_verified,
                   verification_code, verification_code_expires_at, created_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(email)
        .fetch_optional(&self.db)
        .await
        .map_err(map_sqlx_err)?;
        Ok(user)
    }

    async fn create(&self, email: &str) -> Result<User, StoreError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, is_verified)
            VALUES ($1, FALSE)
            RETURNING id, email, password_hash, is_verified,
                      verification_code, verification_code_expires_at, created_at
            "#,
        )
        .bind(email)
        .fetch_one(&self.db)
        .await
        .map_err(map_sqlx_err)?;
        Ok(user)
    }

    async fn save(&self, user: &User) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2,
                is_verified = $3,
                verification_code = $4,
                verification_code_expires_at = $5
            WHERE id = $1
            "#,
        )
        .bind(user.id)
        .bind(&user.password_hash)
        .bind(user.is_verified)
        .bind(&user.verification_code)
        .bind(user.verification_code_expires_at)
        .execute(&self.db)
        .await
        .map_err(map_sqlx_err)?;
        Ok(())
    }
}

/// In-memory user store, keyed by email. Backs `AppState::fake()` and the
/// service tests; no persistence.
#[derive(Clone, Default)]
pub struct MemoryUserStore {
    users: Arc<RwLock<HashMap<String, User>>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let users = self.users.read().await;
        Ok(users.get(email).cloned())
    }

    async fn create(&self, email: &str) -> Result<User, StoreError> {
        let mut users = self.users.write().await;
        if users.contains_key(email) {
            return Err(StoreError::DuplicateEmail);
        }
        let user = User {
            id: uuid::Uuid::new_v4(),
            email: email.to_string(),
            password_hash: None,
            is_verified: false,
            verification_code: None,
            verification_code_expires_at: None,
            created_at: time::OffsetDateTime::now_utc(),
        };
        users.insert(email.to_string(), user.clone());
        Ok(user)
    }

    async fn save(&self, user: &User) -> Result<(), StoreError> {
        let mut users = self.users.write().await;
        users.insert(user.email.clone(), user.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_then_find_roundtrip() {
        let store = MemoryUserStore::new();
        let created = store.create("a@ex.com").await.expect("create");
        assert!(!created.is_verified);
        assert!(created.password_hash.is_none());

        let found = store
            .find_by_email("a@ex.com")
            .await
            .expect("find")
            .expect("user present");
        assert_eq!(found.id, created.id);
    }

    #[tokio::test]
    async fn create_rejects_duplicate_email() {
        let store = MemoryUserStore::new();
        store.create("a@ex.com").await.expect("first create");
        let err = store.create("a@ex.com").await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateEmail));
    }

    #[tokio::test]
    async fn save_overwrites_existing_record() {
        let store = MemoryUserStore::new();
        let mut user = store.create("a@ex.com").await.expect("create");
        user.is_verified = true;
        store.save(&user).await.expect("save");

        let found = store
            .find_by_email("a@ex.com")
            .await
            .expect("find")
            .expect("user present");
        assert!(found.is_verified);
    }
}

//! The signed-in user, persisted under a single key so it survives restarts.

use chrono::Utc;
use sqlx::SqlitePool;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::error::AppError;
use crate::models::User;

pub const USER_KEY: &str = "user";

#[derive(Clone)]
pub struct SessionStore {
    db: SqlitePool,
}

impl SessionStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    /// Unreadable stored data is discarded and reported as "no session".
    pub async fn load(&self) -> Result<Option<User>, AppError> {
        let row: Option<(String,)> = sqlx::query_as("SELECT value FROM session_store WHERE key = ?1")
            .bind(USER_KEY)
            .fetch_optional(&self.db)
            .await?;

        let Some((raw,)) = row else {
            return Ok(None);
        };

        match serde_json::from_str::<User>(&raw) {
            Ok(user) => Ok(Some(user)),
            Err(e) => {
                warn!("discarding unreadable stored session: {}", e);
                self.clear().await?;
                Ok(None)
            }
        }
    }

    pub async fn save(&self, user: &User) -> Result<(), AppError> {
        let value = serde_json::to_string(user)
            .map_err(|e| AppError::Parse(format!("Failed to encode session: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO session_store (key, value, updated_at)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(USER_KEY)
        .bind(value)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.db)
        .await?;

        Ok(())
    }

    pub async fn clear(&self) -> Result<(), AppError> {
        sqlx::query("DELETE FROM session_store WHERE key = ?1")
            .bind(USER_KEY)
            .execute(&self.db)
            .await?;
        Ok(())
    }
}

/// Holds the current user for the router. Written at sign-in, cleared at sign-out.
pub struct SessionContext {
    store: SessionStore,
    current: RwLock<Option<User>>,
}

impl SessionContext {
    pub async fn init(store: SessionStore) -> Result<Self, AppError> {
        let current = store.load().await?;
        match &current {
            Some(user) => info!(user_id = user.user_id, role = ?user.role, "restored session"),
            None => info!("no stored session"),
        }

        Ok(Self {
            store,
            current: RwLock::new(current),
        })
    }

    pub async fn current(&self) -> Option<User> {
        self.current.read().await.clone()
    }

    pub async fn sign_in(&self, user: User) -> Result<(), AppError> {
        self.store.save(&user).await?;
        *self.current.write().await = Some(user);
        Ok(())
    }

    pub async fn sign_out(&self) -> Result<(), AppError> {
        self.store.clear().await?;
        if let Some(user) = self.current.write().await.take() {
            info!(user_id = user.user_id, "signed out");
        }
        Ok(())
    }
}

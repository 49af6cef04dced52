// Database-backed SessionStore implementation
//
// Refresh sessions live in the `auth_sessions` table keyed by "RT:<login_id>".
// Expired rows read as absent; they are removed by `purge_expired`.

use async_trait::async_trait;
use chrono::Utc;
use shopverse_core::{session_key, AuthError, Result, SessionStore};
use std::time::Duration;

use crate::repositories::Database;

// ============================================================================
// PgSessionStore - refresh sessions in PostgreSQL
// ============================================================================

#[derive(Clone)]
pub struct PgSessionStore {
    db: Database,
}

impl PgSessionStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Delete expired rows, returning how many were removed
    pub async fn purge_expired(&self) -> Result<u64> {
        self.db
            .delete_expired_auth_sessions()
            .await
            .map_err(store_error)
    }
}

fn store_error(e: anyhow::Error) -> AuthError {
    tracing::error!(error = %e, "Session store query failed");
    AuthError::store(e.to_string())
}

#[async_trait]
impl SessionStore for PgSessionStore {
    async fn put(&self, principal_id: &str, refresh_token: &str, ttl: Duration) -> Result<()> {
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| AuthError::Internal(anyhow::anyhow!("Session TTL out of range: {}", e)))?;
        let expires_at = Utc::now() + ttl;

        self.db
            .upsert_auth_session(&session_key(principal_id), refresh_token, expires_at)
            .await
            .map_err(store_error)
    }

    async fn get(&self, principal_id: &str) -> Result<Option<String>> {
        let row = self
            .db
            .get_auth_session(&session_key(principal_id))
            .await
            .map_err(store_error)?;

        Ok(row.map(|r| r.refresh_token))
    }

    async fn delete(&self, principal_id: &str) -> Result<()> {
        self.db
            .delete_auth_session(&session_key(principal_id))
            .await
            .map_err(store_error)?;
        Ok(())
    }
}

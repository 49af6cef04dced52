// Repository layer for database operations

use anyhow::Result;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::models::*;

#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Create database connection from URL
    pub async fn from_url(database_url: &str) -> Result<Self> {
        let pool = PgPool::connect(database_url).await?;
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply the embedded schema migrations
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    // ============================================
    // Members
    // ============================================

    pub async fn create_member(&self, input: CreateMemberRow) -> Result<MemberRow> {
        let row = sqlx::query_as::<_, MemberRow>(
            r#"
            INSERT INTO members (login_id, name, email, phone, password_hash, roles)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING login_id, name, email, phone, password_hash, roles, created_at, updated_at
            "#,
        )
        .bind(&input.login_id)
        .bind(&input.name)
        .bind(&input.email)
        .bind(&input.phone)
        .bind(&input.password_hash)
        .bind(serde_json::to_value(&input.roles)?)
        .fetch_one(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn get_member(&self, login_id: &str) -> Result<Option<MemberRow>> {
        let row = sqlx::query_as::<_, MemberRow>(
            r#"
            SELECT login_id, name, email, phone, password_hash, roles, created_at, updated_at
            FROM members
            WHERE login_id = $1
            "#,
        )
        .bind(login_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn login_id_exists(&self, login_id: &str) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM members WHERE login_id = $1)")
                .bind(login_id)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    pub async fn email_exists(&self, email: &str) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM members WHERE email = $1)")
                .bind(email)
                .fetch_one(&self.pool)
                .await?;

        Ok(exists)
    }

    pub async fn get_member_roles(&self, login_id: &str) -> Result<Option<serde_json::Value>> {
        let roles: Option<serde_json::Value> =
            sqlx::query_scalar("SELECT roles FROM members WHERE login_id = $1")
                .bind(login_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(roles)
    }

    // ============================================
    // Refresh sessions
    // ============================================

    pub async fn upsert_auth_session(
        &self,
        session_key: &str,
        refresh_token: &str,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO auth_sessions (session_key, refresh_token, expires_at)
            VALUES ($1, $2, $3)
            ON CONFLICT (session_key)
            DO UPDATE SET refresh_token = EXCLUDED.refresh_token,
                          expires_at = EXCLUDED.expires_at,
                          created_at = NOW()
            "#,
        )
        .bind(session_key)
        .bind(refresh_token)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    pub async fn get_auth_session(&self, session_key: &str) -> Result<Option<AuthSessionRow>> {
        let row = sqlx::query_as::<_, AuthSessionRow>(
            r#"
            SELECT session_key, refresh_token, expires_at, created_at
            FROM auth_sessions
            WHERE session_key = $1 AND expires_at > NOW()
            "#,
        )
        .bind(session_key)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row)
    }

    pub async fn delete_auth_session(&self, session_key: &str) -> Result<bool> {
        let result = sqlx::query("DELETE FROM auth_sessions WHERE session_key = $1")
            .bind(session_key)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    pub async fn delete_expired_auth_sessions(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM auth_sessions WHERE expires_at <= NOW()")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

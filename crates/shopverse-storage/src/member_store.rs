// Database-backed MemberDirectory implementation
//
// Members live in the `members` table; roles are a JSONB array of role names.

use async_trait::async_trait;
use shopverse_core::{AuthError, MemberCredentials, MemberDirectory, NewMember, Result, Roles};

use crate::repositories::Database;

// ============================================================================
// PgMemberDirectory - members in PostgreSQL
// ============================================================================

#[derive(Clone)]
pub struct PgMemberDirectory {
    db: Database,
}

impl PgMemberDirectory {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

fn store_error(e: anyhow::Error) -> AuthError {
    tracing::error!(error = %e, "Member directory query failed");
    AuthError::store(e.to_string())
}

/// Unique constraint on `members.email` (see migrations/0001_auth.sql)
const EMAIL_CONSTRAINT: &str = "members_email_key";

/// Map an insert failure, turning unique violations into duplicate errors
fn create_error(e: anyhow::Error) -> AuthError {
    let violated = e
        .downcast_ref::<sqlx::Error>()
        .and_then(|err| err.as_database_error())
        .filter(|db| db.is_unique_violation())
        .map(|db| db.constraint().unwrap_or_default().to_string());

    match violated {
        Some(constraint) => duplicate_for(&constraint),
        None => store_error(e),
    }
}

fn duplicate_for(constraint: &str) -> AuthError {
    if constraint == EMAIL_CONSTRAINT {
        AuthError::DuplicateEmail
    } else {
        AuthError::DuplicateLoginId
    }
}

#[async_trait]
impl MemberDirectory for PgMemberDirectory {
    async fn find_credentials(&self, login_id: &str) -> Result<Option<MemberCredentials>> {
        let row = self.db.get_member(login_id).await.map_err(store_error)?;
        Ok(row.map(MemberCredentials::from))
    }

    async fn login_id_exists(&self, login_id: &str) -> Result<bool> {
        self.db.login_id_exists(login_id).await.map_err(store_error)
    }

    async fn email_exists(&self, email: &str) -> Result<bool> {
        self.db.email_exists(email).await.map_err(store_error)
    }

    async fn create_member(&self, member: NewMember) -> Result<MemberCredentials> {
        let row = self
            .db
            .create_member(member.into())
            .await
            .map_err(create_error)?;
        Ok(row.into())
    }

    async fn current_roles(&self, login_id: &str) -> Result<Option<Roles>> {
        let roles = self
            .db
            .get_member_roles(login_id)
            .await
            .map_err(store_error)?;

        Ok(roles.map(|value| {
            serde_json::from_value(value).unwrap_or_else(|e| {
                tracing::warn!(login_id, error = %e, "Malformed roles column");
                Roles::new()
            })
        }))
    }
}

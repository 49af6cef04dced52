// Database models (internal, may differ from the core types)

use chrono::{DateTime, Utc};
use shopverse_core::{MemberCredentials, NewMember, Roles};
use sqlx::FromRow;

// ============================================
// Members
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct MemberRow {
    pub login_id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password_hash: String,
    pub roles: sqlx::types::JsonValue,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MemberRow {
    /// Role set decoded from the JSONB column; malformed values read as no roles
    pub fn role_set(&self) -> Roles {
        serde_json::from_value(self.roles.clone()).unwrap_or_else(|e| {
            tracing::warn!(login_id = %self.login_id, error = %e, "Malformed roles column");
            Roles::new()
        })
    }
}

impl From<MemberRow> for MemberCredentials {
    fn from(row: MemberRow) -> Self {
        let roles = row.role_set();
        Self {
            login_id: row.login_id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            password_hash: row.password_hash,
            roles,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CreateMemberRow {
    pub login_id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password_hash: String,
    pub roles: Vec<String>,
}

impl From<NewMember> for CreateMemberRow {
    fn from(member: NewMember) -> Self {
        Self {
            login_id: member.login_id,
            name: member.name,
            email: member.email,
            phone: member.phone,
            password_hash: member.password_hash,
            roles: member.roles.into_iter().collect(),
        }
    }
}

// ============================================
// Refresh sessions
// ============================================

#[derive(Debug, Clone, FromRow)]
pub struct AuthSessionRow {
    pub session_key: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

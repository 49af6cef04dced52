// Collaborator traits consumed by the session core
//
// These traits let the orchestrator and the gate run against different backends:
// - In-memory implementations for dev mode and tests
// - PostgreSQL implementations for production
// Implementations report backend failures as AuthError::StoreUnavailable.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::Result;
use crate::principal::{Principal, Roles};

/// Key under which a principal's refresh session is stored
pub fn session_key(principal_id: &str) -> String {
    format!("RT:{}", principal_id)
}

// ============================================================================
// SessionStore - one live refresh token per principal
// ============================================================================

/// Key-value store holding the current refresh token of each principal
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Upsert with expiry; overwrites any existing record for the principal
    async fn put(&self, principal_id: &str, refresh_token: &str, ttl: Duration) -> Result<()>;

    /// Current refresh token, or None if absent or expired
    async fn get(&self, principal_id: &str) -> Result<Option<String>>;

    /// Remove the record; absent keys are not an error
    async fn delete(&self, principal_id: &str) -> Result<()>;
}

// ============================================================================
// CredentialVerifier - password hash check
// ============================================================================

/// Validates a plaintext secret against a stored hash
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    async fn matches(&self, plaintext: &str, stored_hash: &str) -> Result<bool>;
}

// ============================================================================
// MemberDirectory - source of truth for credentials and roles
// ============================================================================

/// Stored credential record of a member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemberCredentials {
    pub login_id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password_hash: String,
    pub roles: Roles,
}

impl MemberCredentials {
    pub fn principal(&self) -> Principal {
        Principal {
            id: self.login_id.clone(),
            roles: self.roles.clone(),
        }
    }
}

/// Input for creating a member (password already hashed)
#[derive(Debug, Clone)]
pub struct NewMember {
    pub login_id: String,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub password_hash: String,
    pub roles: Roles,
}

impl From<NewMember> for MemberCredentials {
    fn from(member: NewMember) -> Self {
        Self {
            login_id: member.login_id,
            name: member.name,
            email: member.email,
            phone: member.phone,
            password_hash: member.password_hash,
            roles: member.roles,
        }
    }
}

/// Member store as seen by the auth core
#[async_trait]
pub trait MemberDirectory: Send + Sync {
    /// Credential record (hash + current roles) for a login id
    async fn find_credentials(&self, login_id: &str) -> Result<Option<MemberCredentials>>;

    async fn login_id_exists(&self, login_id: &str) -> Result<bool>;

    async fn email_exists(&self, email: &str) -> Result<bool>;

    async fn create_member(&self, member: NewMember) -> Result<MemberCredentials>;

    /// Current role set; None if the member no longer exists
    async fn current_roles(&self, login_id: &str) -> Result<Option<Roles>> {
        Ok(self.find_credentials(login_id).await?.map(|m| m.roles))
    }
}

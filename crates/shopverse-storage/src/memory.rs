// In-memory storage implementation for dev mode
// Decision: Use parking_lot for thread-safe access
// Decision: Expired sessions read as absent and are dropped lazily; purge_expired sweeps the rest
//
// These implementations let the API run without a database for development
// and back the HTTP tests. All data is lost on restart.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use shopverse_core::{
    session_key, AuthError, Clock, CredentialVerifier, MemberCredentials, MemberDirectory,
    NewMember, Result, SessionStore, SystemClock,
};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

// ============================================
// Refresh sessions
// ============================================

#[derive(Debug, Clone)]
struct SessionEntry {
    refresh_token: String,
    expires_at: DateTime<Utc>,
}

/// In-memory session store keyed by "RT:<login_id>"
pub struct InMemorySessionStore {
    sessions: RwLock<HashMap<String, SessionEntry>>,
    clock: Arc<dyn Clock>,
}

impl Default for InMemorySessionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            clock,
        }
    }

    /// Drop every expired entry, returning how many were removed
    pub fn purge_expired(&self) -> u64 {
        let now = self.clock.now();
        let mut sessions = self.sessions.write();
        let before = sessions.len();
        sessions.retain(|_, entry| entry.expires_at > now);
        (before - sessions.len()) as u64
    }

    /// Number of stored entries, expired ones included
    pub fn len(&self) -> usize {
        self.sessions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.read().is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn put(&self, principal_id: &str, refresh_token: &str, ttl: Duration) -> Result<()> {
        let ttl = chrono::Duration::from_std(ttl)
            .map_err(|e| AuthError::Internal(anyhow::anyhow!("Session TTL out of range: {}", e)))?;
        let entry = SessionEntry {
            refresh_token: refresh_token.to_string(),
            expires_at: self.clock.now() + ttl,
        };
        self.sessions.write().insert(session_key(principal_id), entry);
        Ok(())
    }

    async fn get(&self, principal_id: &str) -> Result<Option<String>> {
        let key = session_key(principal_id);
        let now = self.clock.now();

        if let Some(entry) = self.sessions.read().get(&key) {
            if entry.expires_at > now {
                return Ok(Some(entry.refresh_token.clone()));
            }
        } else {
            return Ok(None);
        }

        // Expired: drop it unless a fresh value was written in between
        let mut sessions = self.sessions.write();
        if sessions.get(&key).is_some_and(|e| e.expires_at <= now) {
            sessions.remove(&key);
        }
        Ok(None)
    }

    async fn delete(&self, principal_id: &str) -> Result<()> {
        self.sessions.write().remove(&session_key(principal_id));
        Ok(())
    }
}

// ============================================
// Members
// ============================================

/// In-memory member directory keyed by login id
#[derive(Default)]
pub struct InMemoryMemberDirectory {
    members: RwLock<HashMap<String, MemberCredentials>>,
}

impl InMemoryMemberDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace a member's roles; returns false if the member does not exist
    pub fn set_roles<I, S>(&self, login_id: &str, roles: I) -> bool
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        match self.members.write().get_mut(login_id) {
            Some(member) => {
                member.roles = roles.into_iter().map(Into::into).collect();
                true
            }
            None => false,
        }
    }

    /// Remove a member; returns false if it did not exist
    pub fn remove(&self, login_id: &str) -> bool {
        self.members.write().remove(login_id).is_some()
    }
}

#[async_trait]
impl MemberDirectory for InMemoryMemberDirectory {
    async fn find_credentials(&self, login_id: &str) -> Result<Option<MemberCredentials>> {
        Ok(self.members.read().get(login_id).cloned())
    }

    async fn login_id_exists(&self, login_id: &str) -> Result<bool> {
        Ok(self.members.read().contains_key(login_id))
    }

    async fn email_exists(&self, email: &str) -> Result<bool> {
        Ok(self
            .members
            .read()
            .values()
            .any(|m| m.email.as_deref() == Some(email)))
    }

    async fn create_member(&self, member: NewMember) -> Result<MemberCredentials> {
        let mut members = self.members.write();
        if members.contains_key(&member.login_id) {
            return Err(AuthError::DuplicateLoginId);
        }
        if let Some(email) = &member.email {
            if members.values().any(|m| m.email.as_ref() == Some(email)) {
                return Err(AuthError::DuplicateEmail);
            }
        }
        let creds = MemberCredentials::from(member);
        members.insert(creds.login_id.clone(), creds.clone());
        Ok(creds)
    }
}

// ============================================
// Credential verification
// ============================================

/// Verifier that compares plaintext with the stored value directly.
///
/// Only for tests and fixtures where hashing cost is unwanted.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaintextVerifier;

#[async_trait]
impl CredentialVerifier for PlaintextVerifier {
    async fn matches(&self, plaintext: &str, stored_hash: &str) -> Result<bool> {
        Ok(plaintext == stored_hash)
    }
}

// Session orchestration: login, refresh and logout
// Decision: Single active refresh session per principal; a new login overwrites the old one
// Decision: Refresh tokens rotate on use (policy switch) and keep the family's absolute expiry
// Decision: Roles are always re-resolved from the MemberDirectory, never copied from a token

use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

use crate::config::SessionPolicy;
use crate::error::{AuthError, Result};
use crate::principal::Principal;
use crate::token::TokenCodec;
use crate::traits::{CredentialVerifier, MemberDirectory, SessionStore};

/// Result of a successful login
#[derive(Debug, Clone)]
pub struct LoginOutcome {
    pub access_token: String,
    /// Handed to the client out of band (HTTP-only cookie)
    pub refresh_token: String,
    pub principal: Principal,
    pub member_name: String,
    /// Lifetime of the refresh token, used for the cookie max-age
    pub refresh_ttl: Duration,
    /// True when an earlier session for this principal was overwritten
    pub replaced_previous_session: bool,
}

/// Result of a successful refresh
#[derive(Debug, Clone)]
pub struct RefreshOutcome {
    pub access_token: String,
    /// Refresh token the client must use next (new value when rotated)
    pub refresh_token: String,
    /// Remaining lifetime of `refresh_token`
    pub refresh_ttl: Duration,
    pub rotated: bool,
    pub principal: Principal,
}

/// Coordinates credential checks, token issuance and the session store.
///
/// The orchestrator is the only writer of session records.
#[derive(Clone)]
pub struct SessionOrchestrator {
    codec: Arc<TokenCodec>,
    members: Arc<dyn MemberDirectory>,
    verifier: Arc<dyn CredentialVerifier>,
    sessions: Arc<dyn SessionStore>,
    policy: SessionPolicy,
}

impl SessionOrchestrator {
    pub fn new(
        codec: Arc<TokenCodec>,
        members: Arc<dyn MemberDirectory>,
        verifier: Arc<dyn CredentialVerifier>,
        sessions: Arc<dyn SessionStore>,
        policy: SessionPolicy,
    ) -> Self {
        Self {
            codec,
            members,
            verifier,
            sessions,
            policy,
        }
    }

    pub fn codec(&self) -> &TokenCodec {
        &self.codec
    }

    pub fn policy(&self) -> SessionPolicy {
        self.policy
    }

    /// Verify credentials and open a new session, replacing any existing one
    pub async fn login(&self, login_id: &str, password: &str) -> Result<LoginOutcome> {
        let member = self
            .members
            .find_credentials(login_id)
            .await?
            .ok_or_else(|| {
                tracing::info!(login_id, "Login rejected: unknown login id");
                AuthError::PrincipalNotFound
            })?;

        if !self
            .verifier
            .matches(password, &member.password_hash)
            .await?
        {
            tracing::info!(login_id, "Login rejected: bad credentials");
            return Err(AuthError::BadCredentials);
        }

        let principal = member.principal();
        let access_token = self.codec.issue_access(&principal, self.policy.access_ttl)?;

        let session_id = Uuid::now_v7().to_string();
        let refresh_token =
            self.codec
                .issue_refresh(&principal.id, &session_id, self.policy.refresh_ttl)?;

        let replaced_previous_session = self.sessions.get(&principal.id).await?.is_some();
        self.sessions
            .put(&principal.id, &refresh_token, self.policy.refresh_ttl)
            .await?;

        if replaced_previous_session {
            tracing::info!(subject = %principal.id, "Previous session superseded by new login");
        }
        tracing::info!(subject = %principal.id, roles = ?principal.roles, "Login succeeded");

        Ok(LoginOutcome {
            access_token,
            refresh_token,
            principal,
            member_name: member.name,
            refresh_ttl: self.policy.refresh_ttl,
            replaced_previous_session,
        })
    }

    /// Mint a new access token from a refresh token
    pub async fn refresh(&self, presented: &str) -> Result<RefreshOutcome> {
        let claims = self.codec.verify_refresh(presented)?;
        let subject = claims.sub.as_str();

        let stored = self.sessions.get(subject).await?.ok_or_else(|| {
            tracing::debug!(subject, "Refresh rejected: no active session");
            AuthError::SessionMismatch
        })?;

        if stored != presented {
            if self.is_same_family(&stored, &claims.sid) {
                tracing::warn!(subject, "Refresh token reuse detected, revoking session");
                self.sessions.delete(subject).await?;
                return Err(AuthError::RefreshTokenReused);
            }
            tracing::debug!(subject, "Refresh rejected: session replaced by a newer login");
            return Err(AuthError::SessionMismatch);
        }

        let Some(roles) = self.members.current_roles(subject).await? else {
            tracing::info!(subject, "Refresh rejected: member no longer exists, closing session");
            self.sessions.delete(subject).await?;
            return Err(AuthError::InvalidToken);
        };
        let principal = Principal {
            id: subject.to_string(),
            roles,
        };

        let access_token = self.codec.issue_access(&principal, self.policy.access_ttl)?;
        let remaining = self.codec.remaining_lifetime(&claims);

        if !self.policy.rotate_refresh_tokens {
            return Ok(RefreshOutcome {
                access_token,
                refresh_token: presented.to_string(),
                refresh_ttl: remaining,
                rotated: false,
                principal,
            });
        }

        let refresh_token = self.codec.issue_refresh(subject, &claims.sid, remaining)?;
        self.sessions.put(subject, &refresh_token, remaining).await?;
        tracing::debug!(subject, "Refresh token rotated");

        Ok(RefreshOutcome {
            access_token,
            refresh_token,
            refresh_ttl: remaining,
            rotated: true,
            principal,
        })
    }

    /// Close the principal's session. Succeeds when nothing was stored.
    pub async fn logout(&self, subject: &str) -> Result<()> {
        self.sessions.delete(subject).await?;
        tracing::info!(subject, "Logged out");
        Ok(())
    }

    /// Close the session identified by a refresh token.
    ///
    /// Only deletes when the token is the currently stored one, so a stale
    /// cookie cannot end a newer session. Returns the subject when a session
    /// was closed.
    pub async fn logout_with_refresh_token(&self, presented: &str) -> Result<Option<String>> {
        let claims = match self.codec.verify_refresh(presented) {
            Ok(claims) => claims,
            Err(e) => {
                tracing::debug!(error = %e, "Logout with unusable refresh token");
                return Ok(None);
            }
        };

        match self.sessions.get(&claims.sub).await? {
            Some(stored) if stored == presented => {
                self.logout(&claims.sub).await?;
                Ok(Some(claims.sub))
            }
            _ => Ok(None),
        }
    }

    /// True when the stored token belongs to the same session family as `sid`
    fn is_same_family(&self, stored: &str, sid: &str) -> bool {
        self.codec
            .verify_refresh(stored)
            .map(|c| c.sid == sid)
            .unwrap_or(false)
    }
}

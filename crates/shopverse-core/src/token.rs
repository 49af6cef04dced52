// JWT codec for access and refresh tokens
// Decision: HS256 with one process-wide key for both token kinds
// Decision: `typ` claim decoded as a tagged variant so the kinds can never be swapped
// Decision: Expiry is checked against an injected Clock with zero leeway, after signature/issuer

use anyhow::Context;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::clock::{Clock, SystemClock};
use crate::config::JwtConfig;
use crate::error::{AuthError, Result};
use crate::principal::{Principal, Roles};

/// Generate a random identifier string (32 hex characters)
fn generate_random_id() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 16] = rng.gen();
    hex::encode(bytes)
}

/// Claims carried by an access token
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct AccessClaims {
    /// Subject (login id)
    pub sub: String,
    /// Roles at issue time. Informational only; authorization re-resolves roles.
    #[serde(default)]
    pub roles: Roles,
    /// Issuer
    pub iss: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Unique token ID
    pub jti: String,
}

/// Claims carried by a refresh token
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct RefreshClaims {
    /// Subject (login id)
    pub sub: String,
    /// Session family id, fixed at login and kept across rotations
    pub sid: String,
    /// Issuer
    pub iss: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Unique token ID
    pub jti: String,
}

/// Verified claims of either token kind
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(tag = "typ", rename_all = "lowercase")]
pub enum TokenClaims {
    Access(AccessClaims),
    Refresh(RefreshClaims),
}

impl TokenClaims {
    pub fn subject(&self) -> &str {
        match self {
            TokenClaims::Access(c) => &c.sub,
            TokenClaims::Refresh(c) => &c.sub,
        }
    }

    /// Roles embedded in the token; empty for refresh tokens
    pub fn roles(&self) -> Roles {
        match self {
            TokenClaims::Access(c) => c.roles.clone(),
            TokenClaims::Refresh(_) => Roles::new(),
        }
    }

    pub fn expires_at(&self) -> i64 {
        match self {
            TokenClaims::Access(c) => c.exp,
            TokenClaims::Refresh(c) => c.exp,
        }
    }
}

/// Signs and verifies access/refresh tokens
#[derive(Clone)]
pub struct TokenCodec {
    issuer: String,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    clock: Arc<dyn Clock>,
}

impl TokenCodec {
    pub fn new(config: &JwtConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: &JwtConfig, clock: Arc<dyn Clock>) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;
        validation.set_issuer(&[config.issuer.as_str()]);
        validation.set_required_spec_claims(&["exp", "iss", "sub"]);

        Self {
            issuer: config.issuer.clone(),
            encoding_key,
            decoding_key,
            validation,
            clock,
        }
    }

    /// Issue an access token carrying the principal's full role set
    pub fn issue_access(&self, principal: &Principal, ttl: Duration) -> Result<String> {
        let (iat, exp) = self.window(ttl)?;
        let claims = TokenClaims::Access(AccessClaims {
            sub: principal.id.clone(),
            roles: principal.roles.clone(),
            iss: self.issuer.clone(),
            iat,
            exp,
            jti: generate_random_id(),
        });

        let token = self
            .sign(&claims)
            .context("Failed to encode access token")?;
        Ok(token)
    }

    /// Issue a refresh token for a session family
    pub fn issue_refresh(
        &self,
        principal_id: &str,
        session_id: &str,
        ttl: Duration,
    ) -> Result<String> {
        let (iat, exp) = self.window(ttl)?;
        let claims = TokenClaims::Refresh(RefreshClaims {
            sub: principal_id.to_string(),
            sid: session_id.to_string(),
            iss: self.issuer.clone(),
            iat,
            exp,
            jti: generate_random_id(),
        });

        let token = self
            .sign(&claims)
            .context("Failed to encode refresh token")?;
        Ok(token)
    }

    /// Verify a token of either kind.
    ///
    /// Signature, structure and issuer failures are `InvalidToken`. Only a
    /// token that passes those checks can be reported as `ExpiredToken`.
    pub fn verify(&self, token: &str) -> Result<TokenClaims> {
        let data = decode::<TokenClaims>(token, &self.decoding_key, &self.validation).map_err(
            |e| {
                tracing::debug!(kind = ?e.kind(), "JWT validation failed");
                AuthError::InvalidToken
            },
        )?;

        if self.clock.timestamp() >= data.claims.expires_at() {
            return Err(AuthError::ExpiredToken);
        }

        Ok(data.claims)
    }

    /// Verify a token and require it to be an access token
    pub fn verify_access(&self, token: &str) -> Result<AccessClaims> {
        match self.verify(token)? {
            TokenClaims::Access(claims) => Ok(claims),
            TokenClaims::Refresh(_) => {
                tracing::debug!("Refresh token presented where an access token was expected");
                Err(AuthError::InvalidToken)
            }
        }
    }

    /// Verify a token and require it to be a refresh token
    pub fn verify_refresh(&self, token: &str) -> Result<RefreshClaims> {
        match self.verify(token)? {
            TokenClaims::Refresh(claims) => Ok(claims),
            TokenClaims::Access(_) => {
                tracing::debug!("Access token presented where a refresh token was expected");
                Err(AuthError::InvalidToken)
            }
        }
    }

    /// Subject of verified claims
    pub fn subject_of<'a>(&self, claims: &'a TokenClaims) -> &'a str {
        claims.subject()
    }

    /// Roles of verified claims (empty for refresh tokens)
    pub fn roles_of(&self, claims: &TokenClaims) -> Roles {
        claims.roles()
    }

    /// Time left before a verified refresh token expires (at least one second)
    pub fn remaining_lifetime(&self, claims: &RefreshClaims) -> Duration {
        let secs = claims.exp.saturating_sub(self.clock.timestamp()).max(1);
        Duration::from_secs(secs as u64)
    }

    fn window(&self, ttl: Duration) -> Result<(i64, i64)> {
        let iat = self.clock.timestamp();
        let ttl_secs = i64::try_from(ttl.as_secs()).context("Token lifetime out of range")?;
        let exp = iat
            .checked_add(ttl_secs)
            .context("Token expiry out of range")?;
        Ok((iat, exp))
    }

    fn sign(&self, claims: &TokenClaims) -> anyhow::Result<String> {
        Ok(encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)?)
    }
}

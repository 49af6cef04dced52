// Authentication configuration loaded from environment variables.
// Decision: AUTH_ prefix for all auth config
// Decision: Missing signing secret falls back to a random per-process secret (tokens die on restart)

use std::time::Duration;

const DEFAULT_ISSUER: &str = "shopverse";
const DEFAULT_ACCESS_TOKEN_LIFETIME: Duration = Duration::from_secs(60 * 60); // 1 hour
const DEFAULT_REFRESH_TOKEN_LIFETIME: Duration = Duration::from_secs(7 * 24 * 60 * 60); // 7 days

/// JWT configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret key for signing JWTs (shared by access and refresh tokens)
    pub secret: String,
    /// Value of the `iss` claim; tokens with another issuer are rejected
    pub issuer: String,
    /// Access token lifetime
    pub access_token_lifetime: Duration,
    /// Refresh token lifetime
    pub refresh_token_lifetime: Duration,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            issuer: DEFAULT_ISSUER.to_string(),
            access_token_lifetime: DEFAULT_ACCESS_TOKEN_LIFETIME,
            refresh_token_lifetime: DEFAULT_REFRESH_TOKEN_LIFETIME,
        }
    }
}

/// Lifetimes and rotation behaviour applied by the session orchestrator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionPolicy {
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    /// Issue a new refresh token on every successful refresh and treat
    /// presentation of a rotated-away token as theft
    pub rotate_refresh_tokens: bool,
}

impl Default for SessionPolicy {
    fn default() -> Self {
        Self {
            access_ttl: DEFAULT_ACCESS_TOKEN_LIFETIME,
            refresh_ttl: DEFAULT_REFRESH_TOKEN_LIFETIME,
            rotate_refresh_tokens: true,
        }
    }
}

/// Complete authentication configuration
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// JWT configuration
    pub jwt: JwtConfig,
    /// Rotate refresh tokens on use
    pub rotate_refresh_tokens: bool,
    /// Set the `Secure` attribute on the refresh cookie
    pub cookie_secure: bool,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt: JwtConfig::default(),
            rotate_refresh_tokens: true,
            cookie_secure: false,
        }
    }
}

impl AuthConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        let secret = std::env::var("AUTH_JWT_SECRET")
            .ok()
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| {
                tracing::warn!(
                    "AUTH_JWT_SECRET not set, generating a random secret; tokens will not survive a restart"
                );
                use rand::Rng;
                let bytes: [u8; 32] = rand::thread_rng().gen();
                hex::encode(bytes)
            });

        let issuer =
            std::env::var("AUTH_JWT_ISSUER").unwrap_or_else(|_| DEFAULT_ISSUER.to_string());

        let access_token_lifetime = env_secs("AUTH_JWT_ACCESS_TOKEN_LIFETIME")
            .unwrap_or(DEFAULT_ACCESS_TOKEN_LIFETIME);

        let refresh_token_lifetime = env_secs("AUTH_JWT_REFRESH_TOKEN_LIFETIME")
            .unwrap_or(DEFAULT_REFRESH_TOKEN_LIFETIME);

        let rotate_refresh_tokens = env_flag("AUTH_REFRESH_ROTATION").unwrap_or(true);
        let cookie_secure = env_flag("AUTH_COOKIE_SECURE").unwrap_or(false);

        Self {
            jwt: JwtConfig {
                secret,
                issuer,
                access_token_lifetime,
                refresh_token_lifetime,
            },
            rotate_refresh_tokens,
            cookie_secure,
        }
    }

    /// Session policy derived from the token lifetimes
    pub fn session_policy(&self) -> SessionPolicy {
        SessionPolicy {
            access_ttl: self.jwt.access_token_lifetime,
            refresh_ttl: self.jwt.refresh_token_lifetime,
            rotate_refresh_tokens: self.rotate_refresh_tokens,
        }
    }
}

fn env_secs(key: &str) -> Option<Duration> {
    std::env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .map(Duration::from_secs)
}

fn env_flag(key: &str) -> Option<bool> {
    std::env::var(key).ok().map(|s| parse_flag(&s))
}

fn parse_flag(s: &str) -> bool {
    s.eq_ignore_ascii_case("true") || s == "1"
}

// Authentication module
// Decision: Bearer access tokens in the Authorization header, refresh token in an HTTP-only cookie
// Decision: The gate only populates the security context; role checks belong to downstream handlers

pub mod gate;
pub mod routes;

use axum_extra::extract::cookie::{Cookie, SameSite};
use shopverse_core::{MemberDirectory, SessionOrchestrator, TokenCodec};
use std::sync::Arc;
use std::time::Duration;

pub use gate::{authenticate, CurrentPrincipal};
pub use routes::routes;

/// Name of the refresh token cookie
pub const REFRESH_COOKIE: &str = "refreshToken";

/// Refresh cookie attributes
#[derive(Debug, Clone)]
pub struct CookieSettings {
    /// Cookie path; the member routes under the API prefix
    pub path: String,
    pub secure: bool,
}

impl CookieSettings {
    pub fn new(api_prefix: &str, secure: bool) -> Self {
        Self {
            path: format!("{}/member", api_prefix.trim_end_matches('/')),
            secure,
        }
    }

    /// Build the refresh cookie carrying `token` for `max_age`
    pub fn refresh_cookie(&self, token: String, max_age: Duration) -> Cookie<'static> {
        let max_age_secs = i64::try_from(max_age.as_secs()).unwrap_or(i64::MAX);
        Cookie::build((REFRESH_COOKIE, token))
            .path(self.path.clone())
            .http_only(true)
            .secure(self.secure)
            .same_site(SameSite::Strict)
            .max_age(time::Duration::seconds(max_age_secs))
            .build()
    }

    /// Cookie used to clear the refresh cookie on the client
    pub fn removal_cookie(&self) -> Cookie<'static> {
        Cookie::build(REFRESH_COOKIE).path(self.path.clone()).build()
    }
}

/// Auth state shared by the gate and the auth routes
#[derive(Clone)]
pub struct AuthState {
    pub orchestrator: Arc<SessionOrchestrator>,
    pub codec: Arc<TokenCodec>,
    pub members: Arc<dyn MemberDirectory>,
    pub cookie: CookieSettings,
}

impl AuthState {
    pub fn new(
        orchestrator: Arc<SessionOrchestrator>,
        codec: Arc<TokenCodec>,
        members: Arc<dyn MemberDirectory>,
        cookie: CookieSettings,
    ) -> Self {
        Self {
            orchestrator,
            codec,
            members,
            cookie,
        }
    }
}

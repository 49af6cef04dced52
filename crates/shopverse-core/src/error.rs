// Error types for authentication and session flows

use thiserror::Error;

/// Result type alias for auth core operations
pub type Result<T> = std::result::Result<T, AuthError>;

/// Errors that can occur while issuing, verifying or rotating tokens
#[derive(Debug, Error)]
pub enum AuthError {
    /// Token is well-formed and correctly signed but `now >= exp`
    #[error("Token has expired")]
    ExpiredToken,

    /// Bad signature, malformed structure, wrong issuer or wrong token type
    #[error("Token is invalid")]
    InvalidToken,

    /// No credential record for the login id
    #[error("Principal not found")]
    PrincipalNotFound,

    /// Password did not match the stored hash
    #[error("Bad credentials")]
    BadCredentials,

    /// Presented refresh token is not the one currently stored for the principal
    #[error("Refresh token does not match the active session")]
    SessionMismatch,

    /// A rotated-away refresh token was presented again; the session was revoked
    #[error("Refresh token reuse detected")]
    RefreshTokenReused,

    /// A member with this login id already exists
    #[error("Login id already registered")]
    DuplicateLoginId,

    /// A member with this email already exists
    #[error("Email already registered")]
    DuplicateEmail,

    /// Session store or member directory could not be reached
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    /// Internal error (token encoding, clock overflow, ...)
    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl AuthError {
    /// Create a store unavailable error
    pub fn store(msg: impl Into<String>) -> Self {
        AuthError::StoreUnavailable(msg.into())
    }

    /// Machine-readable code exposed to API clients.
    ///
    /// `PrincipalNotFound` and `BadCredentials` share a code so responses do not
    /// reveal whether a login id exists.
    pub fn code(&self) -> &'static str {
        match self {
            AuthError::ExpiredToken => "TOKEN_EXPIRED",
            AuthError::InvalidToken => "INVALID_TOKEN",
            AuthError::PrincipalNotFound | AuthError::BadCredentials => "BAD_CREDENTIALS",
            AuthError::SessionMismatch => "SESSION_MISMATCH",
            AuthError::RefreshTokenReused => "REFRESH_TOKEN_REUSED",
            AuthError::DuplicateLoginId => "DUPLICATE_LOGIN_ID",
            AuthError::DuplicateEmail => "DUPLICATE_EMAIL",
            AuthError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            AuthError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// True for failures caused by the caller's input (401 and 409 class),
    /// false for infrastructure failures.
    pub fn is_client_error(&self) -> bool {
        !matches!(
            self,
            AuthError::StoreUnavailable(_) | AuthError::Internal(_)
        )
    }
}

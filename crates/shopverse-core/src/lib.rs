// Shopverse authentication & session core
//
// This crate holds the storage-agnostic part of member authentication:
// signing and verifying JWTs, and orchestrating refresh sessions.
//
// Key design decisions:
// - Collaborators (SessionStore, MemberDirectory, CredentialVerifier) are traits
//   injected at construction; there is no global state
// - Access and refresh tokens are distinct variants of one tagged claim set
// - Roles are always re-resolved from the MemberDirectory
// - Backends live in shopverse-storage; HTTP lives in shopverse-api

pub mod clock;
pub mod config;
pub mod error;
pub mod principal;
pub mod session;
pub mod token;
pub mod traits;

// Re-exports for convenience
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AuthConfig, JwtConfig, SessionPolicy};
pub use error::{AuthError, Result};
pub use principal::{Principal, Roles, SecurityContext};
pub use session::{LoginOutcome, RefreshOutcome, SessionOrchestrator};
pub use token::{AccessClaims, RefreshClaims, TokenClaims, TokenCodec};
pub use traits::{
    session_key, CredentialVerifier, MemberCredentials, MemberDirectory, NewMember, SessionStore,
};

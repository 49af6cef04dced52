// Authentication gate and extractors
// Decision: A missing or non-Bearer Authorization header is anonymous, not an error
// Decision: Roles come from the MemberDirectory on every request; token roles are ignored
// Decision: Token rejections stop the request with 401, role lookup failures with 503; both report the request path

use axum::{
    extract::{FromRequestParts, OriginalUri, Request, State},
    http::{header, request::Parts, HeaderMap, Uri},
    middleware::Next,
    response::Response,
};
use shopverse_core::{AuthError, Principal, SecurityContext};

use super::AuthState;
use crate::error::ApiError;

/// Bearer token from the Authorization header, if present.
///
/// Header values that are not valid strings or lack the `Bearer ` prefix are
/// treated as absent.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

/// Path as the client sent it, before any router nesting stripped a prefix
fn original_path(extensions: &axum::http::Extensions, uri: &Uri) -> String {
    extensions
        .get::<OriginalUri>()
        .map(|original| original.0.path().to_string())
        .unwrap_or_else(|| uri.path().to_string())
}

/// Verify an access token and re-resolve the subject's current roles
pub async fn resolve_principal(state: &AuthState, token: &str) -> Result<Principal, AuthError> {
    let claims = state.codec.verify_access(token)?;

    let roles = state
        .members
        .current_roles(&claims.sub)
        .await?
        .ok_or_else(|| {
            tracing::debug!(subject = %claims.sub, "Token subject no longer exists");
            AuthError::InvalidToken
        })?;

    Ok(Principal {
        id: claims.sub,
        roles,
    })
}

/// Middleware: populate the request's SecurityContext from the bearer token
pub async fn authenticate(
    State(state): State<AuthState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = bearer_token(req.headers()).map(str::to_owned);

    let context = match token {
        None => SecurityContext::Anonymous,
        Some(token) => match resolve_principal(&state, &token).await {
            Ok(principal) => SecurityContext::Authenticated(principal),
            Err(e) => {
                let path = original_path(req.extensions(), req.uri());
                tracing::debug!(error = %e, path = %path, "Request rejected by authentication gate");
                return Err(ApiError::from(e).with_path(path));
            }
        },
    };

    req.extensions_mut().insert(context);
    Ok(next.run(req).await)
}

/// Extractor for the authenticated principal.
/// Returns 401 UNAUTHORIZED when the request is anonymous.
#[derive(Debug, Clone)]
pub struct CurrentPrincipal(pub Principal);

#[axum::async_trait]
impl<S> FromRequestParts<S> for CurrentPrincipal
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<SecurityContext>() {
            Some(SecurityContext::Authenticated(principal)) => Ok(Self(principal.clone())),
            _ => Err(ApiError::unauthenticated()
                .with_path(original_path(&parts.extensions, &parts.uri))),
        }
    }
}

// Authentication HTTP routes
// Decision: Use /member/* paths for login, token reissue and logout
// Decision: Refresh token only travels in the HTTP-only cookie, never in a JSON body

use axum::{extract::State, http::HeaderMap, routing::post, Json, Router};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{gate::bearer_token, AuthState, REFRESH_COOKIE};
use crate::api::common::ApiResponse;
use crate::error::ApiError;

/// Login request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    #[schema(example = "testuser")]
    pub login_id: String,
    #[schema(example = "password123")]
    pub password: String,
}

/// Member summary returned on login
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MemberSummary {
    pub login_id: String,
    pub name: String,
}

/// Login response; the refresh token is set as a cookie
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
    pub member: MemberSummary,
}

/// Access token response
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct TokenResponse {
    pub access_token: String,
}

/// Create auth routes
pub fn routes(state: AuthState) -> Router {
    Router::new()
        .route("/member/login", post(login))
        .route("/member/reissue-access-token", post(reissue_access_token))
        .route("/member/logout", post(logout))
        .with_state(state)
}

/// POST /member/login - Login with login id and password
#[utoipa::path(
    post,
    path = "/member/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in; refresh token set as cookie", body = ApiResponse<LoginResponse>),
        (status = 400, description = "Missing login id or password", body = ApiResponse<String>),
        (status = 401, description = "Invalid login id or password", body = ApiResponse<String>),
        (status = 503, description = "Session store unavailable", body = ApiResponse<String>)
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AuthState>,
    jar: CookieJar,
    Json(req): Json<LoginRequest>,
) -> Result<(CookieJar, Json<ApiResponse<LoginResponse>>), ApiError> {
    if req.login_id.trim().is_empty() || req.password.is_empty() {
        return Err(ApiError::validation("Login id and password are required"));
    }

    let outcome = state.orchestrator.login(&req.login_id, &req.password).await?;

    let jar = jar.add(
        state
            .cookie
            .refresh_cookie(outcome.refresh_token, outcome.refresh_ttl),
    );

    Ok((
        jar,
        Json(ApiResponse::ok(
            LoginResponse {
                access_token: outcome.access_token,
                member: MemberSummary {
                    login_id: outcome.principal.id,
                    name: outcome.member_name,
                },
            },
            "Login successful",
        )),
    ))
}

/// POST /member/reissue-access-token - Mint a new access token from the refresh cookie
#[utoipa::path(
    post,
    path = "/member/reissue-access-token",
    responses(
        (status = 200, description = "New access token; refresh cookie reset", body = ApiResponse<TokenResponse>),
        (status = 401, description = "Missing, expired, invalid, superseded or reused refresh token", body = ApiResponse<String>),
        (status = 503, description = "Session store unavailable", body = ApiResponse<String>)
    ),
    tag = "auth"
)]
pub async fn reissue_access_token(
    State(state): State<AuthState>,
    jar: CookieJar,
) -> Result<(CookieJar, Json<ApiResponse<TokenResponse>>), ApiError> {
    let presented = jar
        .get(REFRESH_COOKIE)
        .map(|cookie| cookie.value().to_string())
        .filter(|value| !value.is_empty())
        .ok_or_else(ApiError::missing_refresh_token)?;

    let outcome = state.orchestrator.refresh(&presented).await?;

    let jar = jar.add(
        state
            .cookie
            .refresh_cookie(outcome.refresh_token, outcome.refresh_ttl),
    );

    Ok((
        jar,
        Json(ApiResponse::ok(
            TokenResponse {
                access_token: outcome.access_token,
            },
            "Access token reissued",
        )),
    ))
}

/// POST /member/logout - End the session and clear the refresh cookie
///
/// The subject comes from a valid bearer token when present, otherwise from
/// the refresh cookie. Unusable credentials are not an error.
#[utoipa::path(
    post,
    path = "/member/logout",
    responses(
        (status = 200, description = "Logged out; refresh cookie cleared", body = ApiResponse<String>),
        (status = 503, description = "Session store unavailable", body = ApiResponse<String>)
    ),
    tag = "auth"
)]
pub async fn logout(
    State(state): State<AuthState>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Result<(CookieJar, Json<ApiResponse<()>>), ApiError> {
    let subject = bearer_token(&headers).and_then(|token| {
        state
            .codec
            .verify_access(token)
            .map(|claims| claims.sub)
            .map_err(|e| tracing::debug!(error = %e, "Ignoring unusable bearer token on logout"))
            .ok()
    });

    match subject {
        Some(subject) => state.orchestrator.logout(&subject).await?,
        None => {
            if let Some(cookie) = jar.get(REFRESH_COOKIE) {
                state
                    .orchestrator
                    .logout_with_refresh_token(cookie.value())
                    .await?;
            }
        }
    }

    let jar = jar.remove(state.cookie.removal_cookie());
    Ok((jar, Json(ApiResponse::message("Logged out"))))
}

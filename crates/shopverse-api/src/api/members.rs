// Member API routes
// Decision: Signup and duplicate checks are public; the profile only requires an authenticated member
// Decision: New members always start with ROLE_USER

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use shopverse_core::{AuthError, MemberDirectory, NewMember, Roles};
use shopverse_storage::hash_password;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};

use super::common::ApiResponse;
use super::validation::{
    validate_email, validate_login_id, validate_name, validate_password, validate_phone,
};
use crate::auth::CurrentPrincipal;
use crate::error::ApiError;

/// Role granted to every new member
pub const DEFAULT_MEMBER_ROLE: &str = "ROLE_USER";

/// App state for member routes
#[derive(Clone)]
pub struct MembersState {
    pub members: Arc<dyn MemberDirectory>,
}

impl MembersState {
    pub fn new(members: Arc<dyn MemberDirectory>) -> Self {
        Self { members }
    }
}

/// Signup request
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    #[schema(example = "testuser")]
    pub login_id: String,
    #[schema(example = "password123")]
    pub password: String,
    #[schema(example = "Test Member")]
    pub name: String,
    #[schema(example = "user@example.com")]
    #[serde(default)]
    pub email: Option<String>,
    #[schema(example = "010-1234-5678")]
    #[serde(default)]
    pub phone: Option<String>,
}

/// Query for the login id duplicate check
#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct LoginIdQuery {
    pub login_id: String,
}

/// Query for the email duplicate check
#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct EmailQuery {
    pub email: String,
}

/// Profile of the authenticated member
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MemberProfile {
    pub login_id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Current roles, resolved on this request
    pub roles: Vec<String>,
}

/// Routes reachable without a bearer token
pub fn public_routes(state: MembersState) -> Router {
    Router::new()
        .route("/member/signup", post(signup))
        .route("/member/check-login-id", get(check_login_id))
        .route("/member/check-email", get(check_email))
        .with_state(state)
}

/// Routes that read the security context populated by the gate
pub fn protected_routes(state: MembersState) -> Router {
    Router::new()
        .route("/member/profile", get(get_profile))
        .with_state(state)
}

/// Blank optional fields are treated as absent
fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// POST /member/signup - Register a new member
#[utoipa::path(
    post,
    path = "/member/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Member created", body = ApiResponse<String>),
        (status = 400, description = "Invalid input", body = ApiResponse<String>),
        (status = 409, description = "Login id or email already registered", body = ApiResponse<String>),
        (status = 503, description = "Member store unavailable", body = ApiResponse<String>)
    ),
    tag = "members"
)]
pub async fn signup(
    State(state): State<MembersState>,
    Json(req): Json<SignupRequest>,
) -> Result<(StatusCode, Json<ApiResponse<()>>), ApiError> {
    let email = non_blank(req.email);
    let phone = non_blank(req.phone);

    validate_login_id(&req.login_id)?;
    validate_password(&req.password)?;
    validate_name(&req.name)?;
    if let Some(email) = &email {
        validate_email(email)?;
    }
    if let Some(phone) = &phone {
        validate_phone(phone)?;
    }

    if state.members.login_id_exists(&req.login_id).await? {
        return Err(AuthError::DuplicateLoginId.into());
    }
    if let Some(email) = &email {
        if state.members.email_exists(email).await? {
            return Err(AuthError::DuplicateEmail.into());
        }
    }

    let password = req.password;
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| {
            tracing::error!("Password hashing task failed: {}", e);
            ApiError::internal()
        })?
        .map_err(|e| {
            tracing::error!("Password hashing error: {}", e);
            ApiError::internal()
        })?;

    let member = state
        .members
        .create_member(NewMember {
            login_id: req.login_id,
            name: req.name.trim().to_string(),
            email,
            phone,
            password_hash,
            roles: Roles::from([DEFAULT_MEMBER_ROLE.to_string()]),
        })
        .await?;

    tracing::info!(login_id = %member.login_id, "Member registered");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::with_status(None, "Signup completed", 201)),
    ))
}

/// GET /member/check-login-id - Whether a login id is already registered
#[utoipa::path(
    get,
    path = "/member/check-login-id",
    params(LoginIdQuery),
    responses(
        (status = 200, description = "`data` is \"true\" when the login id is taken", body = ApiResponse<String>)
    ),
    tag = "members"
)]
pub async fn check_login_id(
    State(state): State<MembersState>,
    Query(query): Query<LoginIdQuery>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    let exists = state.members.login_id_exists(&query.login_id).await?;
    Ok(Json(ApiResponse::ok(exists.to_string(), "Login id checked")))
}

/// GET /member/check-email - Whether an email is already registered
#[utoipa::path(
    get,
    path = "/member/check-email",
    params(EmailQuery),
    responses(
        (status = 200, description = "`data` is \"true\" when the email is taken", body = ApiResponse<String>)
    ),
    tag = "members"
)]
pub async fn check_email(
    State(state): State<MembersState>,
    Query(query): Query<EmailQuery>,
) -> Result<Json<ApiResponse<String>>, ApiError> {
    let exists = state.members.email_exists(&query.email).await?;
    Ok(Json(ApiResponse::ok(exists.to_string(), "Email checked")))
}

/// GET /member/profile - Profile of the authenticated member
#[utoipa::path(
    get,
    path = "/member/profile",
    responses(
        (status = 200, description = "Member profile", body = ApiResponse<MemberProfile>),
        (status = 401, description = "Missing, expired or invalid access token", body = ApiResponse<String>),
        (status = 503, description = "Member store unavailable", body = ApiResponse<String>)
    ),
    security(("bearer_auth" = [])),
    tag = "members"
)]
pub async fn get_profile(
    State(state): State<MembersState>,
    CurrentPrincipal(principal): CurrentPrincipal,
) -> Result<Json<ApiResponse<MemberProfile>>, ApiError> {
    let member = state
        .members
        .find_credentials(&principal.id)
        .await?
        .ok_or_else(|| ApiError::not_found("Member not found"))?;

    Ok(Json(ApiResponse::ok(
        MemberProfile {
            login_id: member.login_id,
            name: member.name,
            email: member.email,
            phone: member.phone,
            roles: principal.roles.into_iter().collect(),
        },
        "Profile loaded",
    )))
}

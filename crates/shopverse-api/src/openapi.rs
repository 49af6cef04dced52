// OpenAPI specification generation
//
// Served by the API binary at /api-doc/openapi.json with Swagger UI at /swagger-ui.

use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::api::{self, ApiResponse};
use crate::auth;

/// Registers the bearer token scheme referenced by protected paths
struct BearerAuth;

impl Modify for BearerAuth {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

/// OpenAPI documentation for the Shopverse auth API
#[derive(OpenApi)]
#[openapi(
    paths(
        auth::routes::login,
        auth::routes::reissue_access_token,
        auth::routes::logout,
        api::members::signup,
        api::members::check_login_id,
        api::members::check_email,
        api::members::get_profile,
    ),
    components(
        schemas(
            auth::routes::LoginRequest,
            auth::routes::LoginResponse,
            auth::routes::MemberSummary,
            auth::routes::TokenResponse,
            api::members::SignupRequest,
            api::members::MemberProfile,
            ApiResponse<auth::routes::LoginResponse>,
            ApiResponse<auth::routes::TokenResponse>,
            ApiResponse<api::members::MemberProfile>,
            ApiResponse<String>,
        )
    ),
    modifiers(&BearerAuth),
    tags(
        (name = "auth", description = "Login, access token reissue and logout"),
        (name = "members", description = "Member signup and profile endpoints")
    ),
    info(
        title = "Shopverse Auth API",
        version = "0.1.0",
        description = "Member authentication and session management for Shopverse",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    )
)]
pub struct ApiDoc;

// Shopverse API Library
// Decision: Router assembly lives in the library so integration tests drive the same app as the binary
// Decision: The authentication gate wraps only routes that read the security context

// API routes and types (shared for OpenAPI generation)
pub mod api;

// Authentication gate and auth routes
pub mod auth;

// HTTP error mapping
pub mod error;

// OpenAPI spec generation
pub mod openapi;

use axum::{extract::State, middleware, routing::get, Json, Router};
use serde::{Deserialize, Serialize};
use shopverse_core::{
    CredentialVerifier, MemberDirectory, SessionOrchestrator, SessionPolicy, SessionStore,
    TokenCodec,
};
use std::sync::Arc;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::api::members::MembersState;
use crate::auth::{AuthState, CookieSettings};

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub storage: String,
}

/// State for health endpoint
#[derive(Clone)]
struct HealthState {
    storage: &'static str,
}

async fn health(State(state): State<HealthState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        storage: state.storage.to_string(),
    })
}

/// Wire the core services together over the given collaborators
pub fn build_auth_state(
    codec: Arc<TokenCodec>,
    policy: SessionPolicy,
    sessions: Arc<dyn SessionStore>,
    members: Arc<dyn MemberDirectory>,
    verifier: Arc<dyn CredentialVerifier>,
    cookie: CookieSettings,
) -> AuthState {
    let orchestrator = Arc::new(SessionOrchestrator::new(
        codec.clone(),
        members.clone(),
        verifier,
        sessions,
        policy,
    ));
    AuthState::new(orchestrator, codec, members, cookie)
}

/// Build the full application router (without CORS and tracing layers)
pub fn build_router(auth: AuthState, storage: &'static str, api_prefix: &str) -> Router {
    let members_state = MembersState::new(auth.members.clone());

    let protected = api::members::protected_routes(members_state.clone()).route_layer(
        middleware::from_fn_with_state(auth.clone(), auth::authenticate),
    );

    let api_routes = Router::new()
        .merge(auth::routes(auth))
        .merge(api::members::public_routes(members_state))
        .merge(protected);

    // Health and docs are not prefixed
    Router::new()
        .route("/health", get(health).with_state(HealthState { storage }))
        .merge(build_router_with_prefix(api_routes, api_prefix))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", openapi::ApiDoc::openapi()))
}

/// Build router with optional API prefix
pub fn build_router_with_prefix<S: Clone + Send + Sync + 'static>(
    api_routes: Router<S>,
    api_prefix: &str,
) -> Router<S> {
    if api_prefix.is_empty() {
        api_routes
    } else {
        Router::new().nest(api_prefix, api_routes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    fn test_routes() -> Router {
        Router::new().route("/member/test", get(|| async { "ok" }))
    }

    #[tokio::test]
    async fn test_api_prefix_empty() {
        let app = build_router_with_prefix(test_routes(), "");

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/member/test")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), 200);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"ok");
    }

    #[tokio::test]
    async fn test_api_prefix_set() {
        let app = build_router_with_prefix(test_routes(), "/api");

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .uri("/api/member/test")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), 200);

        // Route should NOT work without prefix
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/member/test")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), 404);
    }
}

// HTTP flows for login, token reissue, logout and the authentication gate
//
// Run with: cargo test -p shopverse-api --test auth_flow_test
//
// Uses in-memory stores, a plaintext verifier and a manual clock so expiry
// can be driven without sleeping.

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::Utc;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use shopverse_api::{auth::CookieSettings, build_auth_state, build_router};
use shopverse_core::{
    AuthError, CredentialVerifier, JwtConfig, ManualClock, MemberCredentials, MemberDirectory,
    NewMember, Roles, SessionPolicy, TokenCodec,
};
use shopverse_storage::{
    Argon2Verifier, InMemoryMemberDirectory, InMemorySessionStore, PlaintextVerifier,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;

const ACCESS_TTL_SECS: u64 = 3600;
const REFRESH_TTL_SECS: u64 = 7 * 24 * 3600;

struct TestApp {
    router: Router,
    members: Arc<InMemoryMemberDirectory>,
    clock: Arc<ManualClock>,
}

struct TestResponse {
    status: StatusCode,
    set_cookie: Option<String>,
    body: Value,
}

impl TestResponse {
    /// Value of the refresh cookie set by this response
    fn refresh_cookie(&self) -> Option<String> {
        let set_cookie = self.set_cookie.as_deref()?;
        let pair = set_cookie.split(';').next()?;
        pair.strip_prefix("refreshToken=").map(str::to_string)
    }

    fn error_code(&self) -> &str {
        self.body["error"].as_str().unwrap_or_default()
    }
}

fn build_app(rotate: bool, api_prefix: &str, verifier: Arc<dyn CredentialVerifier>) -> TestApp {
    let members = Arc::new(InMemoryMemberDirectory::new());
    build_app_with_directory(rotate, api_prefix, verifier, members.clone(), members)
}

fn build_app_with_directory(
    rotate: bool,
    api_prefix: &str,
    verifier: Arc<dyn CredentialVerifier>,
    members: Arc<InMemoryMemberDirectory>,
    directory: Arc<dyn MemberDirectory>,
) -> TestApp {
    let clock = Arc::new(ManualClock::new(Utc::now()));
    let codec = Arc::new(TokenCodec::with_clock(
        &JwtConfig {
            secret: "auth-flow-test-secret".to_string(),
            ..Default::default()
        },
        clock.clone(),
    ));
    let policy = SessionPolicy {
        access_ttl: Duration::from_secs(ACCESS_TTL_SECS),
        refresh_ttl: Duration::from_secs(REFRESH_TTL_SECS),
        rotate_refresh_tokens: rotate,
    };
    let sessions = Arc::new(InMemorySessionStore::with_clock(clock.clone()));

    let auth = build_auth_state(
        codec,
        policy,
        sessions,
        directory,
        verifier,
        CookieSettings::new(api_prefix, false),
    );

    TestApp {
        router: build_router(auth, "memory", api_prefix),
        members,
        clock,
    }
}

/// Member directory whose lookups can be switched to fail like an unreachable store
struct UnreliableDirectory {
    inner: Arc<InMemoryMemberDirectory>,
    down: AtomicBool,
}

impl UnreliableDirectory {
    fn check(&self) -> shopverse_core::Result<()> {
        if self.down.load(Ordering::SeqCst) {
            return Err(AuthError::store("connection refused"));
        }
        Ok(())
    }
}

#[axum::async_trait]
impl MemberDirectory for UnreliableDirectory {
    async fn find_credentials(
        &self,
        login_id: &str,
    ) -> shopverse_core::Result<Option<MemberCredentials>> {
        self.check()?;
        self.inner.find_credentials(login_id).await
    }

    async fn login_id_exists(&self, login_id: &str) -> shopverse_core::Result<bool> {
        self.check()?;
        self.inner.login_id_exists(login_id).await
    }

    async fn email_exists(&self, email: &str) -> shopverse_core::Result<bool> {
        self.check()?;
        self.inner.email_exists(email).await
    }

    async fn create_member(&self, member: NewMember) -> shopverse_core::Result<MemberCredentials> {
        self.check()?;
        self.inner.create_member(member).await
    }
}

fn plaintext_app(rotate: bool) -> TestApp {
    build_app(rotate, "", Arc::new(PlaintextVerifier))
}

impl TestApp {
    async fn add_member(&self, login_id: &str, password: &str) {
        self.members
            .create_member(NewMember {
                login_id: login_id.to_string(),
                name: format!("{} name", login_id),
                email: None,
                phone: None,
                password_hash: password.to_string(),
                roles: Roles::from(["ROLE_USER".to_string()]),
            })
            .await
            .unwrap();
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let set_cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        TestResponse {
            status,
            set_cookie,
            body,
        }
    }

    async fn login(&self, login_id: &str, password: &str) -> TestResponse {
        self.send(
            Request::builder()
                .method("POST")
                .uri("/member/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({ "loginId": login_id, "password": password }).to_string(),
                ))
                .unwrap(),
        )
        .await
    }

    async fn reissue(&self, cookie: Option<&str>) -> TestResponse {
        let mut builder = Request::builder()
            .method("POST")
            .uri("/member/reissue-access-token");
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, format!("refreshToken={}", cookie));
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    async fn logout(&self, access_token: Option<&str>, cookie: Option<&str>) -> TestResponse {
        let mut builder = Request::builder().method("POST").uri("/member/logout");
        if let Some(token) = access_token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, format!("refreshToken={}", cookie));
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }

    async fn profile(&self, access_token: Option<&str>) -> TestResponse {
        let mut builder = Request::builder().uri("/member/profile");
        if let Some(token) = access_token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        self.send(builder.body(Body::empty()).unwrap()).await
    }
}

fn access_token_of(response: &TestResponse) -> String {
    response.body["data"]["accessToken"]
        .as_str()
        .unwrap()
        .to_string()
}

// ============================================
// Login
// ============================================

#[tokio::test]
async fn test_login_sets_refresh_cookie_and_returns_access_token() {
    let app = plaintext_app(true);
    app.add_member("alice", "password123").await;

    let response = app.login("alice", "password123").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["success"], true);
    assert_eq!(response.body["data"]["member"]["loginId"], "alice");
    assert_eq!(response.body["data"]["member"]["name"], "alice name");
    assert!(!access_token_of(&response).is_empty());

    let set_cookie = response.set_cookie.clone().unwrap();
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Strict"));
    assert!(set_cookie.contains("Path=/member"));
    assert!(set_cookie.contains(&format!("Max-Age={}", REFRESH_TTL_SECS)));
    assert!(response.refresh_cookie().is_some());
}

#[tokio::test]
async fn test_login_failures_share_one_error() {
    let app = plaintext_app(true);
    app.add_member("alice", "password123").await;

    let unknown = app.login("nobody", "password123").await;
    let wrong = app.login("alice", "wrong-password").await;

    assert_eq!(unknown.status, StatusCode::UNAUTHORIZED);
    assert_eq!(wrong.status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown.error_code(), "BAD_CREDENTIALS");
    assert_eq!(wrong.error_code(), "BAD_CREDENTIALS");
    assert_eq!(unknown.body["message"], wrong.body["message"]);
    assert!(unknown.set_cookie.is_none());
}

#[tokio::test]
async fn test_login_requires_both_fields() {
    let app = plaintext_app(true);

    let response = app.login("  ", "password123").await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), "VALIDATION_ERROR");
}

// ============================================
// Reissue and logout
// ============================================

#[tokio::test]
async fn test_reissue_without_rotation_keeps_cookie_until_logout() {
    let app = plaintext_app(false);
    app.add_member("alice", "password123").await;

    let login = app.login("alice", "password123").await;
    let cookie = login.refresh_cookie().unwrap();
    app.clock.advance_secs(60);

    let first = app.reissue(Some(&cookie)).await;
    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(first.refresh_cookie().as_deref(), Some(cookie.as_str()));
    let access_token = access_token_of(&first);
    assert_ne!(access_token, access_token_of(&login));

    // Same cookie keeps working
    let second = app.reissue(Some(&cookie)).await;
    assert_eq!(second.status, StatusCode::OK);

    let logout = app.logout(Some(&access_token), Some(&cookie)).await;
    assert_eq!(logout.status, StatusCode::OK);
    assert!(logout.set_cookie.unwrap().contains("Max-Age=0"));

    let after = app.reissue(Some(&cookie)).await;
    assert_eq!(after.status, StatusCode::UNAUTHORIZED);
    assert_eq!(after.error_code(), "SESSION_MISMATCH");
}

#[tokio::test]
async fn test_rotated_cookie_reuse_revokes_session() {
    let app = plaintext_app(true);
    app.add_member("alice", "password123").await;

    let login = app.login("alice", "password123").await;
    let original = login.refresh_cookie().unwrap();
    app.clock.advance_secs(60);

    let rotated = app.reissue(Some(&original)).await;
    assert_eq!(rotated.status, StatusCode::OK);
    let current = rotated.refresh_cookie().unwrap();
    assert_ne!(current, original);
    // Remaining family lifetime, not a fresh seven days
    assert!(rotated
        .set_cookie
        .as_deref()
        .unwrap()
        .contains(&format!("Max-Age={}", REFRESH_TTL_SECS - 60)));

    let replayed = app.reissue(Some(&original)).await;
    assert_eq!(replayed.status, StatusCode::UNAUTHORIZED);
    assert_eq!(replayed.error_code(), "REFRESH_TOKEN_REUSED");

    // The whole session is gone, including the latest token
    let after = app.reissue(Some(&current)).await;
    assert_eq!(after.status, StatusCode::UNAUTHORIZED);
    assert_eq!(after.error_code(), "SESSION_MISMATCH");
}

#[tokio::test]
async fn test_second_login_supersedes_first_session() {
    let app = plaintext_app(true);
    app.add_member("alice", "password123").await;

    let first = app.login("alice", "password123").await.refresh_cookie().unwrap();
    app.clock.advance_secs(1);
    let second = app.login("alice", "password123").await.refresh_cookie().unwrap();

    let stale = app.reissue(Some(&first)).await;
    assert_eq!(stale.status, StatusCode::UNAUTHORIZED);
    assert_eq!(stale.error_code(), "SESSION_MISMATCH");

    let fresh = app.reissue(Some(&second)).await;
    assert_eq!(fresh.status, StatusCode::OK);
}

#[tokio::test]
async fn test_reissue_without_cookie() {
    let app = plaintext_app(true);

    let response = app.reissue(None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.error_code(), "MISSING_REFRESH_TOKEN");
}

#[tokio::test]
async fn test_reissue_with_expired_refresh_cookie() {
    let app = plaintext_app(true);
    app.add_member("alice", "password123").await;

    let cookie = app.login("alice", "password123").await.refresh_cookie().unwrap();
    app.clock.advance_secs(REFRESH_TTL_SECS as i64 + 1);

    let response = app.reissue(Some(&cookie)).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.error_code(), "TOKEN_EXPIRED");
}

#[tokio::test]
async fn test_reissue_after_member_removed() {
    let app = plaintext_app(true);
    app.add_member("alice", "password123").await;

    let cookie = app.login("alice", "password123").await.refresh_cookie().unwrap();
    assert!(app.members.remove("alice"));

    let response = app.reissue(Some(&cookie)).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.error_code(), "INVALID_TOKEN");
    assert_ne!(response.body["message"], "Invalid login id or password");
}

#[tokio::test]
async fn test_logout_with_cookie_only() {
    let app = plaintext_app(true);
    app.add_member("alice", "password123").await;

    let cookie = app.login("alice", "password123").await.refresh_cookie().unwrap();

    let logout = app.logout(None, Some(&cookie)).await;
    assert_eq!(logout.status, StatusCode::OK);

    let after = app.reissue(Some(&cookie)).await;
    assert_eq!(after.error_code(), "SESSION_MISMATCH");
}

#[tokio::test]
async fn test_logout_without_credentials_succeeds() {
    let app = plaintext_app(true);

    let logout = app.logout(Some("not-a-token"), None).await;
    assert_eq!(logout.status, StatusCode::OK);
    assert_eq!(logout.body["success"], true);
}

// ============================================
// Authentication gate
// ============================================

#[tokio::test]
async fn test_profile_with_valid_token() {
    let app = plaintext_app(true);
    app.add_member("alice", "password123").await;
    let token = access_token_of(&app.login("alice", "password123").await);

    let response = app.profile(Some(&token)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["loginId"], "alice");
    assert_eq!(response.body["data"]["roles"], json!(["ROLE_USER"]));
}

#[tokio::test]
async fn test_profile_without_token_is_unauthorized() {
    let app = plaintext_app(true);

    let response = app.profile(None).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.error_code(), "UNAUTHORIZED");
    assert_eq!(response.body["details"]["path"], "/member/profile");
}

#[tokio::test]
async fn test_profile_with_invalid_token() {
    let app = plaintext_app(true);

    let response = app.profile(Some("garbage.token.value")).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.error_code(), "INVALID_TOKEN");
    assert_eq!(response.body["details"]["path"], "/member/profile");
}

#[tokio::test]
async fn test_profile_with_expired_token() {
    let app = plaintext_app(true);
    app.add_member("alice", "password123").await;
    let token = access_token_of(&app.login("alice", "password123").await);

    app.clock.advance_secs(ACCESS_TTL_SECS as i64 + 1);

    let response = app.profile(Some(&token)).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.error_code(), "TOKEN_EXPIRED");
    assert_eq!(response.body["details"]["path"], "/member/profile");
}

#[tokio::test]
async fn test_refresh_token_is_not_an_access_token() {
    let app = plaintext_app(true);
    app.add_member("alice", "password123").await;
    let cookie = app.login("alice", "password123").await.refresh_cookie().unwrap();

    let response = app.profile(Some(&cookie)).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.error_code(), "INVALID_TOKEN");
}

#[tokio::test]
async fn test_roles_are_resolved_per_request() {
    let app = plaintext_app(true);
    app.add_member("alice", "password123").await;
    let token = access_token_of(&app.login("alice", "password123").await);

    assert!(app.members.set_roles("alice", Vec::<String>::new()));

    // Token still names ROLE_USER, but the directory no longer grants it
    let response = app.profile(Some(&token)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["roles"], json!([]));

    assert!(app.members.set_roles("alice", ["ROLE_ADMIN"]));
    let response = app.profile(Some(&token)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["roles"], json!(["ROLE_ADMIN"]));
}

#[tokio::test]
async fn test_profile_only_requires_authentication() {
    let app = plaintext_app(true);
    app.add_member("seller", "password123").await;
    assert!(app.members.set_roles("seller", ["ROLE_SELLER"]));
    let token = access_token_of(&app.login("seller", "password123").await);

    let response = app.profile(Some(&token)).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"]["loginId"], "seller");
    assert_eq!(response.body["data"]["roles"], json!(["ROLE_SELLER"]));
}

#[tokio::test]
async fn test_role_lookup_failure_is_service_unavailable() {
    let members = Arc::new(InMemoryMemberDirectory::new());
    let directory = Arc::new(UnreliableDirectory {
        inner: members.clone(),
        down: AtomicBool::new(false),
    });
    let app = build_app_with_directory(
        true,
        "",
        Arc::new(PlaintextVerifier),
        members,
        directory.clone(),
    );
    app.add_member("alice", "password123").await;
    let token = access_token_of(&app.login("alice", "password123").await);

    directory.down.store(true, Ordering::SeqCst);

    let response = app.profile(Some(&token)).await;
    assert_eq!(response.status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.error_code(), "STORE_UNAVAILABLE");
    assert_eq!(response.body["details"]["path"], "/member/profile");
    // Backend detail stays in the logs
    assert!(!response.body["message"]
        .as_str()
        .unwrap()
        .contains("connection refused"));

    directory.down.store(false, Ordering::SeqCst);
    let response = app.profile(Some(&token)).await;
    assert_eq!(response.status, StatusCode::OK);
}

#[tokio::test]
async fn test_removed_member_token_is_invalid() {
    let app = plaintext_app(true);
    app.add_member("alice", "password123").await;
    let token = access_token_of(&app.login("alice", "password123").await);

    assert!(app.members.remove("alice"));

    let response = app.profile(Some(&token)).await;
    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert_eq!(response.error_code(), "INVALID_TOKEN");
}

#[tokio::test]
async fn test_public_routes_ignore_missing_token() {
    let app = plaintext_app(true);

    let response = app
        .send(
            Request::builder()
                .uri("/member/check-login-id?loginId=alice")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["data"], "false");
}

// ============================================
// Members
// ============================================

fn signup_request(body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/member/signup")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

#[tokio::test]
async fn test_signup_then_duplicate_checks() {
    let app = plaintext_app(true);
    let body = json!({
        "loginId": "bob",
        "password": "password123",
        "name": "Bob",
        "email": "bob@example.com",
        "phone": "010-1234-5678"
    });

    let created = app.send(signup_request(body.clone())).await;
    assert_eq!(created.status, StatusCode::CREATED);
    assert_eq!(created.body["status"], 201);

    let duplicate = app.send(signup_request(body)).await;
    assert_eq!(duplicate.status, StatusCode::CONFLICT);
    assert_eq!(duplicate.error_code(), "DUPLICATE_LOGIN_ID");

    let same_email = app
        .send(signup_request(json!({
            "loginId": "bobby",
            "password": "password123",
            "name": "Bobby",
            "email": "bob@example.com"
        })))
        .await;
    assert_eq!(same_email.status, StatusCode::CONFLICT);
    assert_eq!(same_email.error_code(), "DUPLICATE_EMAIL");

    let login_taken = app
        .send(
            Request::builder()
                .uri("/member/check-login-id?loginId=bob")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(login_taken.body["data"], "true");

    let email_taken = app
        .send(
            Request::builder()
                .uri("/member/check-email?email=bob@example.com")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(email_taken.body["data"], "true");
}

#[tokio::test]
async fn test_signup_rejects_invalid_input() {
    let app = plaintext_app(true);

    let response = app
        .send(signup_request(json!({
            "loginId": "bob",
            "password": "short",
            "name": "Bob"
        })))
        .await;
    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.error_code(), "VALIDATION_ERROR");
    assert!(!app.members.login_id_exists("bob").await.unwrap());
}

#[tokio::test]
async fn test_signup_then_login_with_argon2() {
    let app = build_app(true, "", Arc::new(Argon2Verifier));

    let created = app
        .send(signup_request(json!({
            "loginId": "carol",
            "password": "password123",
            "name": "Carol"
        })))
        .await;
    assert_eq!(created.status, StatusCode::CREATED);

    let stored = app.members.find_credentials("carol").await.unwrap().unwrap();
    assert!(stored.password_hash.starts_with("$argon2"));
    assert_eq!(stored.roles, Roles::from(["ROLE_USER".to_string()]));

    let ok = app.login("carol", "password123").await;
    assert_eq!(ok.status, StatusCode::OK);

    let wrong = app.login("carol", "password124").await;
    assert_eq!(wrong.error_code(), "BAD_CREDENTIALS");
}

// ============================================
// Router
// ============================================

#[tokio::test]
async fn test_health() {
    let app = plaintext_app(true);

    let response = app
        .send(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["status"], "ok");
    assert_eq!(response.body["storage"], "memory");
}

#[tokio::test]
async fn test_api_prefix_applies_to_routes_and_cookie_path() {
    let app = build_app(true, "/api", Arc::new(PlaintextVerifier));
    app.add_member("alice", "password123").await;

    let response = app
        .send(
            Request::builder()
                .method("POST")
                .uri("/api/member/login")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(
                    json!({ "loginId": "alice", "password": "password123" }).to_string(),
                ))
                .unwrap(),
        )
        .await;
    assert_eq!(response.status, StatusCode::OK);
    assert!(response.set_cookie.unwrap().contains("Path=/api/member"));

    let unprefixed = app.profile(None).await;
    assert_eq!(unprefixed.status, StatusCode::NOT_FOUND);

    let prefixed = app
        .send(
            Request::builder()
                .uri("/api/member/profile")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(prefixed.status, StatusCode::UNAUTHORIZED);
    assert_eq!(prefixed.body["details"]["path"], "/api/member/profile");
}

// Shopverse API server
// Decision: PostgreSQL when DATABASE_URL is set, in-memory storage otherwise (dev mode)
// Decision: Expired sessions are swept periodically; reads already ignore them

use anyhow::{Context, Result};
use axum::http::{header, HeaderValue, Method};
use shopverse_api::{auth::CookieSettings, build_auth_state, build_router};
use shopverse_core::{AuthConfig, MemberDirectory, NewMember, Roles, TokenCodec};
use shopverse_storage::{hash_password, Argon2Verifier, StorageBackend};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const SESSION_PURGE_INTERVAL: Duration = Duration::from_secs(5 * 60);

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env before anything reads the environment (RUST_LOG included)
    let dotenv_path = dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "shopverse_api=debug,shopverse_core=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("shopverse-api starting...");
    if let Some(path) = dotenv_path {
        tracing::info!("Loaded .env from {:?}", path);
    }

    // Initialize storage
    let storage = match std::env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()) {
        Some(database_url) => {
            let backend = StorageBackend::postgres(&database_url)
                .await
                .context("Failed to connect to database")?;
            tracing::info!("Connected to database");
            backend
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory storage (data is lost on restart)");
            StorageBackend::in_memory()
        }
    };

    seed_member(storage.members().as_ref()).await?;

    // Load authentication configuration
    let auth_config = AuthConfig::from_env();
    let policy = auth_config.session_policy();
    tracing::info!(
        issuer = %auth_config.jwt.issuer,
        access_ttl_secs = policy.access_ttl.as_secs(),
        refresh_ttl_secs = policy.refresh_ttl.as_secs(),
        rotate_refresh_tokens = policy.rotate_refresh_tokens,
        cookie_secure = auth_config.cookie_secure,
        "Authentication configured"
    );

    // Load API prefix from environment (default: empty)
    // Example: API_PREFIX="/api" results in routes like /api/member/login
    let api_prefix = std::env::var("API_PREFIX").unwrap_or_default();
    if !api_prefix.is_empty() {
        tracing::info!(prefix = %api_prefix, "API prefix configured");
    }

    let auth_state = build_auth_state(
        Arc::new(TokenCodec::new(&auth_config.jwt)),
        policy,
        storage.sessions(),
        storage.members(),
        Arc::new(Argon2Verifier),
        CookieSettings::new(&api_prefix, auth_config.cookie_secure),
    );

    // Load CORS allowed origins from environment (optional)
    // Example: CORS_ALLOWED_ORIGINS="https://shop.example.com,https://admin.example.com"
    let cors_origins: Vec<HeaderValue> = std::env::var("CORS_ALLOWED_ORIGINS")
        .ok()
        .filter(|s| !s.is_empty())
        .map(|s| s.split(',').filter_map(|s| s.trim().parse().ok()).collect())
        .unwrap_or_default();

    if cors_origins.is_empty() {
        tracing::info!("CORS not configured (same-origin requests only)");
    } else {
        tracing::info!(origins = ?cors_origins, "CORS origins configured");
    }

    let app = build_router(auth_state, storage.name(), &api_prefix);

    // Add CORS layer only if origins are configured
    let app = if !cors_origins.is_empty() {
        app.layer(
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(cors_origins))
                .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
                .allow_headers([
                    header::CONTENT_TYPE,
                    header::AUTHORIZATION,
                    header::ACCEPT,
                    header::ORIGIN,
                ])
                .allow_credentials(true),
        )
    } else {
        app
    };

    // Add tracing
    let app = app.layer(TraceLayer::new_for_http());

    // Sweep expired refresh sessions
    let purge_storage = storage.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_PURGE_INTERVAL);
        loop {
            interval.tick().await;
            match purge_storage.purge_expired_sessions().await {
                Ok(0) => {}
                Ok(removed) => tracing::debug!(removed, "Purged expired sessions"),
                Err(e) => tracing::error!("Session purge failed: {}", e),
            }
        }
    });

    // Start HTTP server
    let addr = std::env::var("HTTP_ADDR").unwrap_or_else(|_| "0.0.0.0:8080".to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .context("Failed to bind to address")?;
    tracing::info!("HTTP server listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

/// Create the member named by SEED_MEMBER_LOGIN_ID / SEED_MEMBER_PASSWORD if absent
async fn seed_member(members: &dyn MemberDirectory) -> Result<()> {
    let (Some(login_id), Some(password)) = (
        std::env::var("SEED_MEMBER_LOGIN_ID").ok().filter(|s| !s.is_empty()),
        std::env::var("SEED_MEMBER_PASSWORD").ok().filter(|s| !s.is_empty()),
    ) else {
        return Ok(());
    };

    if members.login_id_exists(&login_id).await? {
        tracing::debug!(login_id = %login_id, "Seed member already exists");
        return Ok(());
    }

    members
        .create_member(NewMember {
            login_id: login_id.clone(),
            name: login_id.clone(),
            email: None,
            phone: None,
            password_hash: hash_password(&password)?,
            roles: Roles::from(["ROLE_USER".to_string()]),
        })
        .await?;
    tracing::info!(login_id = %login_id, "Seed member created");

    Ok(())
}

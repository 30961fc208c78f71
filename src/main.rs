//! Authd - User Authentication & Authorization Backend
//! Mission: Password login, JWT issuance, refresh rotation, RBAC

use std::{env, net::SocketAddr, sync::Arc, time::Duration};

use anyhow::{Context, Result};
use chrono::Utc;
use tokio::{net::TcpListener, time::interval};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use authd_backend::{
    auth::{
        models::NewUser, password::BcryptHasher, AuthService, AuthState, JwtCodec,
        RefreshRegistry, SqliteUserStore,
    },
    config::Config,
    routes,
};

/// How often expired blacklist entries are swept out.
const REGISTRY_PURGE_INTERVAL_SECS: u64 = 600;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = Config::from_env();
    info!("🚀 Authd starting");

    let store = Arc::new(SqliteUserStore::new(&config.database_path)?);
    let hasher = Arc::new(BcryptHasher::new());
    let codec = Arc::new(JwtCodec::new(
        config.jwt.access_secret.clone(),
        config.jwt.access_ttl_hours,
        config.jwt.refresh_secret.clone(),
        config.jwt.refresh_ttl_hours,
    ));
    let registry = Arc::new(RefreshRegistry::new());
    let service = Arc::new(AuthService::new(
        store,
        hasher,
        codec.clone(),
        registry.clone(),
    ));

    info!("🔐 User store initialized at: {}", config.database_path);

    ensure_default_admin(&service)?;

    // Sweep consumed refresh tokens whose natural expiry has passed, so the
    // blacklist stays bounded by the refresh TTL.
    {
        let registry = registry.clone();
        tokio::spawn(async move {
            let mut ticker = interval(Duration::from_secs(REGISTRY_PURGE_INTERVAL_SECS));
            loop {
                ticker.tick().await;
                let removed = registry.purge_expired(Utc::now().timestamp());
                if removed > 0 {
                    info!("🧹 Purged {} expired refresh-token entries", removed);
                }
            }
        });
    }

    let state = AuthState { service, codec };
    let app = routes::router(state);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    info!("🎯 API server listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("Server error")?;

    Ok(())
}

/// Create an initial admin account when none exists, so the admin routes are
/// reachable on a fresh database. Self-registration only ever grants the
/// plain user role.
fn ensure_default_admin(service: &AuthService) -> Result<()> {
    let has_admin = service
        .list()?
        .iter()
        .any(|u| u.roles.iter().any(|r| r == "admin"));
    if has_admin {
        return Ok(());
    }

    let email = env::var("ADMIN_EMAIL").unwrap_or_else(|_| "admin@localhost".to_string());
    let password = env::var("ADMIN_PASSWORD").unwrap_or_else(|_| "admin123".to_string());

    service.register(NewUser {
        email: email.clone(),
        password,
        name: "Administrator".to_string(),
        roles: vec!["admin".to_string(), "user".to_string()],
    })?;

    info!("🔐 Default admin user created (email: {})", email);
    warn!("⚠️  CHANGE DEFAULT PASSWORD IN PRODUCTION!");
    Ok(())
}

/// Initialize tracing with env-filter overrides
fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "authd_backend=debug,authd=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

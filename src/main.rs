//! Academia Backend - Student Management API
//! Mission: Register alunos, record pagamentos, surface delinquency

use academia_backend::{
    app::build_router,
    auth::{jwt::DEFAULT_TTL_MINUTES, AuthState, CredentialStore, JwtAuth},
    db,
    students::StudentStore,
};
use anyhow::{Context, Result};
use dotenv::dotenv;
use std::path::{Path, PathBuf};
use std::{env, sync::Arc};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    load_env();
    init_tracing();

    info!("🎓 Academia backend starting");

    let db_path = resolve_data_path(env::var("DATABASE_PATH").ok(), "academia.db");
    let jwt_secret = env::var("JWT_SECRET")
        .unwrap_or_else(|_| "dev-secret-change-in-production-minimum-32-characters".to_string());
    let ttl_minutes = env::var("TOKEN_TTL_MINUTES")
        .ok()
        .and_then(|v| v.parse::<i64>().ok())
        .filter(|&v| v > 0)
        .unwrap_or(DEFAULT_TTL_MINUTES);

    let db = db::open(&db_path)?;
    let users = Arc::new(CredentialStore::new(db.clone())?);
    let students = Arc::new(StudentStore::new(db)?);
    let tokens = Arc::new(JwtAuth::new(jwt_secret, ttl_minutes));

    info!("📊 Database initialized at: {}", db_path);

    let auth_state = AuthState { users, tokens };
    let app = build_router(auth_state, students);

    let addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string());
    let listener = TcpListener::bind(&addr).await?;
    info!("🎯 API server listening on {}", addr);

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "academia_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn resolve_data_path(env_value: Option<String>, default_filename: &str) -> String {
    // Anchor relative paths to the crate directory, not the caller's cwd.
    let base = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    let Some(raw) = env_value.filter(|v| !v.trim().is_empty()) else {
        return base.join(default_filename).to_string_lossy().to_string();
    };

    let p = PathBuf::from(raw);
    if p.is_absolute() {
        return p.to_string_lossy().to_string();
    }

    base.join(p).to_string_lossy().to_string()
}

fn load_env() {
    // Standard dotenv search (cwd + parents), then the crate directory.
    let _ = dotenv();

    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    let candidate = manifest_dir.join(".env");
    if candidate.exists() {
        let _ = dotenv::from_path(&candidate);
    }
}

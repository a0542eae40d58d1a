#![feature(int_roundings)]

use anyhow::Result;
use axum::Router;
use sqlx::sqlite::SqlitePoolOptions;
use std::{fs, io::ErrorKind, path::Path, sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod config;
mod errors;
mod extract;
mod gateway;
mod handlers;
mod models;
mod routes;
mod services;
mod state;
mod stores;

use services::{auth_service::AuthService, tokens::TokenService, upload_service::UploadService};
use state::AppState;
use stores::{
    sessions::{SessionStore, SqliteSessionStore},
    upload_records::SqliteUploadRecordStore,
    users::SqliteUserStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- Parse config + migrate flag ---
    let (cfg, migrate) = config::AppConfig::from_env_and_args()?;

    tracing::info!(
        host = %cfg.host,
        port = cfg.port,
        region = %cfg.aws_region,
        "Starting upload-gateway"
    );

    // --- Initialize SQLite connection ---
    let db_url = &cfg.database_url;

    // Extract the local file path SQLx will use
    let db_path = db_url
        .trim_start_matches("sqlite://")
        .trim_start_matches("file:");
    tracing::debug!("Interpreted SQLite path => {}", db_path);

    // Create parent directory if needed
    if let Some(parent) = Path::new(db_path).parent() {
        if !parent.exists() {
            fs::create_dir_all(parent)?;
            tracing::info!("Created missing directory {:?}", parent);
        }
    }

    // SQLx will not create the file itself without this.
    match fs::OpenOptions::new().create(true).write(true).open(db_path) {
        Ok(_) => tracing::debug!("Database file can be created/opened successfully."),
        Err(e) => tracing::warn!("Failed to open database file manually: {}", e),
    }

    let db: Arc<sqlx::Pool<sqlx::Sqlite>> = Arc::new(
        SqlitePoolOptions::new()
            .max_connections(5)
            .connect(db_url)
            .await?,
    );

    // --- Handle migration mode ---
    if migrate {
        run_migrations(&db).await?;
        tracing::info!("Database migration complete.");
        return Ok(()); // exit after migration
    }

    // --- Initialize core services ---
    let s3 = Arc::new(gateway::object_store::S3Gateway::new(&cfg.aws_region).await);

    let uploads = Arc::new(UploadService::new(
        s3,
        Arc::new(SqliteUploadRecordStore::new(db.clone())),
        cfg.aws_region.clone(),
        Duration::from_secs(cfg.presign_expiry_secs),
    ));

    let session_store = Arc::new(SqliteSessionStore::new(db.clone()));

    // Sweep sessions that expired while the service was down.
    let swept = session_store.delete_expired().await?;
    if swept > 0 {
        tracing::info!(swept, "removed expired sessions");
    }

    let tokens = TokenService::new(
        &cfg.jwt_secret,
        cfg.access_token_ttl_secs,
        cfg.refresh_token_ttl_secs,
    );
    let auth = Arc::new(AuthService::new(
        Arc::new(SqliteUserStore::new(db.clone())),
        session_store,
        tokens,
        cfg.argon2,
    ));

    let state = AppState {
        uploads,
        auth,
        db: db.clone(),
    };

    // --- Build router ---
    let app: Router = routes::routes::routes().with_state(state);

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}

/// Run SQLite migrations manually from the SQL file on disk.
async fn run_migrations(db: &Arc<sqlx::Pool<sqlx::Sqlite>>) -> Result<()> {
    let path = "migrations/0001_init.sql";

    if !Path::new(path).exists() {
        anyhow::bail!("Migration file not found: {}", path);
    }

    let sql = fs::read_to_string(path)?;
    let statements = sql
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>();

    tracing::info!("Running {} migration statements...", statements.len());

    for stmt in statements {
        tracing::debug!("Executing migration SQL: {}", stmt);
        sqlx::query(stmt).execute(&**db).await?;
    }

    Ok(())
}

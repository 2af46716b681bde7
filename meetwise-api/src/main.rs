//! meetwise-api - MeetWise REST backend
//!
//! Serves action items, meetings, briefing dossiers and sparring sessions
//! from the SQLite database in the root folder.

use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use meetwise_api::{build_router, AppState, DEFAULT_MAX_BODY_BYTES};
use meetwise_common::api::auth::load_shared_secret;
use meetwise_common::config::{CompiledDefaults, RootFolderInitializer, RootFolderResolver, TomlConfig};
use meetwise_common::db::{get_setting_i64, init_database};
use tracing::{info, warn};

#[derive(Debug, Parser)]
#[command(name = "meetwise-api", version, about = "MeetWise REST backend")]
struct Args {
    /// Root folder holding meetwise.db
    #[arg(long, env = "MEETWISE_ROOT_FOLDER")]
    root_folder: Option<PathBuf>,

    /// Address to bind
    #[arg(long, env = "MEETWISE_HOST")]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long, env = "MEETWISE_PORT")]
    port: Option<u16>,

    /// Bearer token shared secret (0 disables authentication)
    #[arg(long, env = "MEETWISE_SHARED_SECRET")]
    shared_secret: Option<i64>,

    /// Identity webhook signing secret
    #[arg(long, env = "MEETWISE_WEBHOOK_SECRET", hide_env_values = true)]
    webhook_secret: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let toml = TomlConfig::load_or_default();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                tracing_subscriber::EnvFilter::new(format!(
                    "meetwise_api={},tower_http=info",
                    toml.logging.level
                ))
            }),
        )
        .init();

    info!(
        "Starting MeetWise API (meetwise-api) v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );

    let root_folder = RootFolderResolver::new("meetwise-api")
        .with_cli_arg(args.root_folder)
        .with_toml(toml.clone())
        .resolve();

    let initializer = RootFolderInitializer::new(root_folder);
    initializer.ensure_directory_exists()?;

    let db_path = initializer.database_path();
    info!("Database path: {}", db_path.display());

    let pool = init_database(&db_path)
        .await
        .with_context(|| format!("Failed to open database {}", db_path.display()))?;

    let shared_secret = match args.shared_secret.or(toml.auth_shared_secret) {
        Some(secret) => secret,
        None => load_shared_secret(&pool)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to load shared secret: {}", e))?,
    };
    if shared_secret == 0 {
        warn!("API authentication disabled (shared_secret = 0)");
    } else {
        info!("Loaded shared secret for API authentication");
    }

    let webhook_secret = args.webhook_secret.or(toml.webhook_secret.clone());
    if webhook_secret.is_none() {
        warn!("No webhook secret configured; identity webhooks will be rejected");
    }

    let max_body = get_setting_i64(&pool, "http_max_body_size_bytes", DEFAULT_MAX_BODY_BYTES as i64)
        .await?;
    let max_body = usize::try_from(max_body).unwrap_or(DEFAULT_MAX_BODY_BYTES);

    let state = AppState::new(pool, shared_secret)
        .with_webhook_secret(webhook_secret)
        .with_max_body_bytes(max_body);
    let app = build_router(state);

    let defaults = CompiledDefaults::for_current_platform();
    let host = args.host.or(toml.host).unwrap_or(defaults.host);
    let port = args.port.or(toml.port).unwrap_or(defaults.port);
    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .with_context(|| format!("Invalid listen address {}:{}", host, port))?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("meetwise-api listening on http://{}", addr);
    info!("Health check: http://{}/health", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

use anyhow::Context;
use clap::Parser;
use std::{sync::Arc, time::Duration};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use media_api::{
    app::{app, spawn_cache_janitor, AppState},
    config::AppConfig,
    database::{postgres, PgMediaRepository, PgUserRepository},
};

#[derive(Parser)]
#[command(name = "media-api")]
#[command(about = "Users and medias REST API")]
#[command(version)]
struct Args {
    #[arg(long, help = "Listen port (overrides API_PORT)")]
    port: Option<u16>,

    #[arg(long, help = "Use the in-memory store even when DATABASE_URL is set")]
    memory: bool,

    #[arg(long, env = "ADMIN_USERNAME", help = "Bootstrap administrator username")]
    admin_username: Option<String>,

    #[arg(long, env = "ADMIN_EMAIL", help = "Bootstrap administrator email")]
    admin_email: Option<String>,

    #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true, help = "Bootstrap administrator password")]
    admin_password: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let args = Args::parse();
    let mut config = AppConfig::from_env();
    if let Some(port) = args.port {
        config.api.port = port;
    }
    info!("Starting Media API in {:?} mode", config.environment);

    let state = build_state(config, args.memory).await?;

    if let (Some(username), Some(email), Some(password)) =
        (&args.admin_username, &args.admin_email, &args.admin_password)
    {
        if state.users.ensure_admin(username, email, password).await? {
            info!("Created bootstrap administrator '{}'", username);
        }
    }

    if state.cache.is_active() {
        let every = Duration::from_secs(state.config.cache.ttl_secs.max(1));
        spawn_cache_janitor(state.cache.clone(), every);
    }

    let bind_addr = format!("0.0.0.0:{}", state.config.api.port);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;
    info!(
        "Media API listening on http://{}{}",
        bind_addr, state.config.api.base_path
    );

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("Server shut down");
    Ok(())
}

async fn build_state(config: AppConfig, memory: bool) -> anyhow::Result<AppState> {
    if memory || config.database.url.is_none() {
        if !memory {
            warn!("DATABASE_URL is not set, using the in-memory store");
        }
        return AppState::in_memory(config).context("invalid security configuration");
    }

    let pool = postgres::connect(&config.database)
        .await
        .context("failed to connect to Postgres")?;
    AppState::new(
        config,
        Arc::new(PgUserRepository::new(pool.clone())),
        Arc::new(PgMediaRepository::new(pool)),
    )
    .context("invalid security configuration")
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
    }
}

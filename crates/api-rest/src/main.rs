//! Standalone REST API server binary.
//!
//! ## Purpose
//! Runs the REST API server on its own.
//!
//! ## Intended use
//! This binary is useful for development and debugging. The workspace's main
//! `medibook-run` binary is the deployment entry point; both serve the same
//! router.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::AppState;
use medibook_core::config::{
    CoreConfig, DEFAULT_ACCESS_TTL_SECS, DEFAULT_DATABASE_URL, DEFAULT_REFRESH_TTL_SECS,
};
use medibook_core::db;

/// Main entry point for the standalone medibook REST API server.
///
/// # Environment Variables
/// - `MEDIBOOK_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `MEDIBOOK_DATABASE_URL`: SQLite database URL (default: "sqlite://medibook.db")
/// - `MEDIBOOK_TOKEN_SECRET`: HS256 signing secret for bearer tokens
/// - `MEDIBOOK_ACCESS_TTL_SECS` / `MEDIBOOK_REFRESH_TTL_SECS`: token lifetimes
///
/// # Errors
/// Returns an error if:
/// - the logging/tracing configuration cannot be initialised,
/// - the database cannot be opened or the schema cannot be applied, or
/// - the server address cannot be bound.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("api_rest=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("MEDIBOOK_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());
    let cfg = Arc::new(config_from_env()?);

    tracing::info!("-- Starting medibook REST API on {}", addr);

    let pool = db::connect(cfg.database_url()).await?;
    db::init_schema(&pool).await?;

    let app = api_rest::router(AppState::new(cfg, pool));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn config_from_env() -> anyhow::Result<CoreConfig> {
    let database_url =
        std::env::var("MEDIBOOK_DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.into());

    let token_secret = std::env::var("MEDIBOOK_TOKEN_SECRET").unwrap_or_else(|_| {
        tracing::warn!("MEDIBOOK_TOKEN_SECRET not set; using an insecure development secret");
        "medibook-dev-secret".into()
    });

    let access_ttl = env_secs("MEDIBOOK_ACCESS_TTL_SECS", DEFAULT_ACCESS_TTL_SECS)?;
    let refresh_ttl = env_secs("MEDIBOOK_REFRESH_TTL_SECS", DEFAULT_REFRESH_TTL_SECS)?;

    Ok(CoreConfig::new(database_url, token_secret, access_ttl, refresh_ttl)?)
}

fn env_secs(name: &str, default: i64) -> anyhow::Result<i64> {
    match std::env::var(name) {
        Ok(value) => Ok(value
            .parse()
            .map_err(|_| anyhow::anyhow!("{name} must be an integer number of seconds"))?),
        Err(_) => Ok(default),
    }
}

//! Main entry point for the medibook appointment-booking backend.
//!
//! Resolves configuration from the environment once, opens the database pool,
//! applies the schema, and serves the REST API.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use api_rest::AppState;
use medibook_core::config::{
    CoreConfig, DEFAULT_ACCESS_TTL_SECS, DEFAULT_DATABASE_URL, DEFAULT_REFRESH_TTL_SECS,
};
use medibook_core::db;

/// Starts the medibook REST server.
///
/// # Environment Variables
/// - `MEDIBOOK_REST_ADDR`: Server address (default: "0.0.0.0:3000")
/// - `MEDIBOOK_DATABASE_URL`: SQLite database URL (default: "sqlite://medibook.db")
/// - `MEDIBOOK_TOKEN_SECRET`: HS256 signing secret for bearer tokens
/// - `MEDIBOOK_ACCESS_TTL_SECS` / `MEDIBOOK_REFRESH_TTL_SECS`: token lifetimes
///
/// # Returns
/// * `Ok(())` - If the server starts and runs successfully
/// * `Err(anyhow::Error)` - If startup or runtime fails
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("medibook=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let addr = std::env::var("MEDIBOOK_REST_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".into());

    let database_url =
        std::env::var("MEDIBOOK_DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.into());
    let token_secret = std::env::var("MEDIBOOK_TOKEN_SECRET").unwrap_or_else(|_| {
        tracing::warn!("MEDIBOOK_TOKEN_SECRET not set; using an insecure development secret");
        "medibook-dev-secret".into()
    });
    let access_ttl = secs_from_env("MEDIBOOK_ACCESS_TTL_SECS", DEFAULT_ACCESS_TTL_SECS)?;
    let refresh_ttl = secs_from_env("MEDIBOOK_REFRESH_TTL_SECS", DEFAULT_REFRESH_TTL_SECS)?;

    let cfg = Arc::new(CoreConfig::new(
        database_url,
        token_secret,
        access_ttl,
        refresh_ttl,
    )?);

    tracing::info!("++ Starting medibook on {}", addr);
    tracing::info!("++ Database at {}", cfg.database_url());

    let pool = db::connect(cfg.database_url()).await?;
    db::init_schema(&pool).await?;

    let app = api_rest::router(AppState::new(cfg, pool));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

fn secs_from_env(name: &str, default: i64) -> anyhow::Result<i64> {
    match std::env::var(name) {
        Ok(value) => Ok(value
            .parse()
            .map_err(|_| anyhow::anyhow!("{name} must be an integer number of seconds"))?),
        Err(_) => Ok(default),
    }
}

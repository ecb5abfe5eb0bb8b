//! Student Records server

use anyhow::Result;
use std::path::Path;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use student_records::{
    api::{self, AppState},
    config::Config,
    db,
};

const MIGRATION_RETRY_INTERVAL: Duration = Duration::from_secs(10);

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "student_records=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Student Records...");

    // Load configuration
    let config = Config::load_with_env(Path::new("config.yml"))?;
    tracing::info!("Configuration loaded");

    if config.session.uses_default_secret() {
        tracing::warn!("Using the built-in session secret; set RECORDS_SESSION_SECRET in production");
    }

    // Initialize database. A failed connection is not fatal: requests fail
    // individually and /health reports the outage.
    let pool = match db::create_pool(&config.database).await {
        Ok(pool) => {
            tracing::info!("Database connected: {:?}", config.database.driver);
            pool
        }
        Err(e) => {
            tracing::error!("Database connection failed: {:#}", e);
            db::create_lazy_pool(&config.database)?
        }
    };

    // Run migrations, retrying in the background until the store is back
    match db::migrations::run_migrations(&pool).await {
        Ok(applied) => tracing::info!(applied, "Database migrations completed"),
        Err(e) => {
            tracing::error!("Database migrations failed: {:#}", e);
            tokio::spawn(db::migrations::run_until_applied(
                pool.clone(),
                MIGRATION_RETRY_INTERVAL,
            ));
        }
    }

    // Build application state and router
    let state = AppState::new(pool, &config)?;
    let app = api::build_router(state, &config.server.cors_origin);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

//! # Gatehouse API Server
//!
//! HTTP server for account registration and login with two admission
//! mechanisms: a signed identity token carried in a cookie and a
//! server-side session row referenced by a second cookie.
//!
//! ## Usage
//!
//! ```bash
//! cargo run -p gatehouse-api
//! ```

use anyhow::Context;
use gatehouse_api::{
    app::{build_router, AppState},
    config::Config,
};
use gatehouse_shared::{
    db::{migrations, pool},
    models::session::Session,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gatehouse_api=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Gatehouse v{} starting", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    let bind_address = config.bind_address();

    let db = pool::create_pool(pool::DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: config.database.max_connections,
        ..Default::default()
    })
    .await
    .context("failed to connect to the database")?;

    migrations::run_migrations(&db)
        .await
        .context("failed to run database migrations")?;

    let purged = Session::purge_expired(&db).await?;
    if purged > 0 {
        tracing::info!(purged, "cleared expired sessions");
    }

    let state = AppState::new(db.clone(), config);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("failed to bind {bind_address}"))?;
    tracing::info!("listening on http://{}", listener.local_addr()?);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    pool::close_pool(db).await;
    tracing::info!("shutdown complete");

    Ok(())
}

/// Resolves when the process receives a shutdown signal.
async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}

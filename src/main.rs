use anyhow::Context;
use dotenvy::dotenv;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

use helpdesk_server::api_router::configure_api_routes;
use helpdesk_server::config::AppConfig;
use helpdesk_server::shared::db::{create_pool, init_schema};
use helpdesk_server::shared::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env()?;
    let pool = create_pool(&config.database_url).context("failed to create database pool")?;
    {
        let mut conn = pool
            .get()
            .context("database connection failed at startup")?;
        init_schema(&mut conn).context("schema bootstrap failed")?;
    }

    let addr = config.bind_addr();
    let state = Arc::new(AppState { config, conn: pool });

    let app = configure_api_routes()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    info!("helpdesk server listening on {addr}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app).await?;
    Ok(())
}

//! Server binary: reads settings from the environment, prepares the database (or falls back to the
//! in-memory gateway when DATABASE_URL is unset) and serves the API.

use blog_api::{app, apply_migrations, connect, ensure_database_exists, AppState, BlogModel, Gateway, MemoryGateway, PgGateway, Settings};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("blog_api=info,tower_http=info")),
        )
        .init();

    let settings = Settings::from_env()?;
    let model = BlogModel::new(&settings.schema);

    let gateway: Arc<dyn Gateway> = match &settings.database_url {
        Some(url) => {
            ensure_database_exists(url).await?;
            let pool = connect(url, &settings).await?;
            apply_migrations(&pool, &model).await?;
            Arc::new(PgGateway::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, using in-memory storage");
            Arc::new(MemoryGateway::new(model.clone()))
        }
    };

    let state = AppState::new(gateway, model);
    let router = app(state, settings.max_body_bytes);

    let listener = TcpListener::bind(settings.bind_addr).await?;
    tracing::info!("listening on {}", listener.local_addr()?);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

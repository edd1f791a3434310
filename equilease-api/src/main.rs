use std::net::SocketAddr;
use std::sync::Arc;
use anyhow::Context;
use equilease_api::{app, AppState};
use equilease_store::{app_config::Config, DbClient, InMemoryCatalog, StoreCatalogRepository};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "equilease_api=debug,equilease_variants=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::load().context("Failed to load config")?;
    tracing::info!("Starting Equilease API on port {}", config.server.port);

    let app_state = match &config.database.url {
        Some(url) => {
            let db = DbClient::new(url.expose(), &config.database)
                .await
                .context("Failed to connect to Postgres")?;
            if config.database.run_migrations {
                db.migrate().await.context("Failed to run migrations")?;
            }

            let repo = Arc::new(StoreCatalogRepository::new(db.pool.clone()));
            AppState::new(
                repo.clone(),
                repo.clone(),
                repo,
                &config.generation,
                config.storage.default_bucket.clone(),
            )
        }
        None => {
            tracing::warn!("No database.url configured, using the in-memory catalog");
            let catalog = Arc::new(InMemoryCatalog::new());
            catalog.add_bucket(config.storage.default_bucket.clone()).await;
            AppState::new(
                catalog.clone(),
                catalog.clone(),
                catalog,
                &config.generation,
                config.storage.default_bucket.clone(),
            )
        }
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}

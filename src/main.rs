use std::sync::Arc;

use recsim::{
    config::Config,
    routes::{create_router, AppState, PipelineSettings},
    services::providers::{HttpRecommender, TypesenseBackend},
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "recsim=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let search = TypesenseBackend::new(
        config.search_url.clone(),
        config.search_api_key.clone(),
        config.search_collection.clone(),
        config.search_connect_timeout(),
    )?;
    let recommender = HttpRecommender::new(config.recommender_url.clone());

    tracing::info!(
        search_url = %config.search_url,
        collection = %config.search_collection,
        recommender_url = %config.recommender_url,
        "Backends configured"
    );

    let state = AppState::new(
        Arc::new(search),
        Arc::new(recommender),
        PipelineSettings::from(&config),
    );
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
    tracing::info!(addr = %config.bind_addr(), "Recommendation simulator listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}

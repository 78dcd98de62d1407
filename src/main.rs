use axum::routing::{get, post};
use axum::Router;
use tracing_subscriber::EnvFilter;

use oss_recommender::api;
use oss_recommender::config::Config;
use oss_recommender::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env();
    tracing::info!("Data directory: {}", config.data_dir.display());
    tracing::info!(
        "Embedding provider: {} ({})",
        config.llm.provider,
        config.llm.base_url
    );

    let state = AppState::new(config.clone())?;
    tracing::info!("Candidate store holds {} repositories", state.store.entry_count());

    let app = Router::new()
        .route("/api/recommendations", post(api::recommend::recommend))
        .route(
            "/api/recommendations/topics",
            post(api::recommend::recommend_by_topics),
        )
        .route("/api/ingest", post(api::ingest::start_ingest))
        .route("/api/history/{username}", get(api::history::user_history))
        .route("/api/status", get(api::ingest::status))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!("Server listening on {}", config.bind_addr);

    axum::serve(listener, app).await?;
    Ok(())
}

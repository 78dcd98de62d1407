use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;

use crate::github::crawl::{crawl_corpus, CrawlSummary};
use crate::github::GithubClient;
use crate::models::IngestRequest;
use crate::state::AppState;

#[derive(Serialize)]
pub struct IngestAccepted {
    pub facets: usize,
}

#[derive(Serialize)]
pub struct StatusResponse {
    pub candidates: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_ingest: Option<CrawlSummary>,
}

/// POST /api/ingest - Crawl the requested facets into the candidate store
/// in a background task. One ingestion at a time; a second request while
/// one is running gets 409.
pub async fn start_ingest(
    State(state): State<AppState>,
    Json(req): Json<IngestRequest>,
) -> Result<(StatusCode, Json<IngestAccepted>), (StatusCode, String)> {
    let token = state.config.github_token.clone().ok_or((
        StatusCode::BAD_REQUEST,
        "GITHUB_TOKEN is not configured".to_string(),
    ))?;

    if req.languages.is_empty() && req.topics.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "At least one language or topic facet is required".to_string(),
        ));
    }

    let permit = state.ingest_gate.clone().try_acquire_owned().map_err(|_| {
        (
            StatusCode::CONFLICT,
            "Ingestion is already running".to_string(),
        )
    })?;

    let facets = req.languages.len() + req.topics.len();
    let state_clone = state.clone();
    tokio::spawn(async move {
        let _permit = permit;
        let gh = GithubClient::new(state_clone.http_client.clone(), token);
        match crawl_corpus(
            &gh,
            &state_clone.store,
            &state_clone.embedder,
            &req,
            &state_clone.config.crawl,
        )
        .await
        {
            Ok(summary) => {
                tracing::info!(
                    "Ingestion complete: {} discovered, {} upserted",
                    summary.discovered,
                    summary.upserted
                );
                *state_clone.last_ingest.write() = Some(summary);
            }
            Err(e) => {
                tracing::error!("Corpus ingestion failed: {e:#}");
            }
        }
    });

    Ok((StatusCode::ACCEPTED, Json(IngestAccepted { facets })))
}

/// GET /api/status - Candidate count and last ingestion outcome.
pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(StatusResponse {
        candidates: state.store.entry_count(),
        last_ingest: state.last_ingest.read().clone(),
    })
}

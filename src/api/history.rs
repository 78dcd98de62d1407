use axum::extract::{Path, State};
use axum::Json;

use crate::history::{HistorySink, RecommendationBatch};
use crate::state::AppState;

/// GET /api/history/{username} - Previously produced recommendation batches.
pub async fn user_history(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Json<Vec<RecommendationBatch>> {
    Json(state.history.for_user(&username))
}

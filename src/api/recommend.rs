use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;

use crate::error::RecommendError;
use crate::github::{profile::build_profile, GithubClient};
use crate::history::HistorySink;
use crate::models::{
    LanguageTopics, RecommendationRequest, RecommendationResponse, RecommendationResult,
    TopicRecommendationRequest,
};
use crate::recommend::ranking;
use crate::recommend::{RecommendSignal, Recommender};
use crate::state::AppState;

/// POST /api/recommendations - Profile-driven recommendation pipeline:
///   1. Build the user's profile from their GitHub repositories
///   2. Run the preferences path against the candidate store
///   3. Fall back to topics when the primary path comes up short
///   4. Rank, persist to history, respond
pub async fn recommend(
    State(state): State<AppState>,
    Json(req): Json<RecommendationRequest>,
) -> Result<Json<RecommendationResponse>, (StatusCode, String)> {
    let username = req.username.trim().to_string();
    if username.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "Username is required".to_string()));
    }
    if req.access_token.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Access token is required".to_string(),
        ));
    }

    let gh = GithubClient::new(state.http_client.clone(), req.access_token.clone());
    let profile = build_profile(
        &gh,
        &state.config,
        &username,
        &req.extra_languages,
        &req.extra_topics,
    )
    .await
    .map_err(|e| {
        (
            StatusCode::BAD_GATEWAY,
            format!("Failed to fetch GitHub profile: {e:#}"),
        )
    })?;

    tracing::info!(
        "Profile for {username}: {} projects, languages {:?}, topics {:?}",
        profile.projects.len(),
        profile.languages,
        profile.topics
    );

    let recommender = Recommender::new(
        state.store.clone(),
        state.embedder.clone(),
        state.config.max_concurrent_embeds,
    );

    let language_topics = LanguageTopics {
        languages: profile.languages.clone(),
        topics: profile.topics.clone(),
    };
    let signal = RecommendSignal::resolve(
        Some(profile.projects.clone()),
        Some(language_topics),
        None,
    );

    let mut results = recommender
        .recommend(signal, state.config.max_recommendations)
        .await
        .map_err(|e| {
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Recommendation failed: {e:#}"),
            )
        })?;

    // Thin primary results: widen the net with the topic fallback
    if results.len() < state.config.min_primary_results {
        match recommender
            .topic_fallback(
                &profile.languages,
                &profile.extra_topics,
                state.config.max_recommendations,
            )
            .await
        {
            Ok(more) => results.extend(more),
            Err(RecommendError::NoSignal) => {
                tracing::info!("No topic signal for {username}, keeping primary results");
            }
            Err(e) => {
                tracing::warn!("Topic fallback failed for {username}: {e:#}");
            }
        }
    }

    let ranked = rank_and_cap(
        results,
        &profile.languages,
        &profile.topics,
        state.config.max_recommendations,
    );

    let recommendation_id = match state.history.append(&username, &ranked, "profile") {
        Ok(id) => Some(id),
        Err(e) => {
            // The computed recommendations are still returned
            tracing::error!("Failed to persist history for {username}: {e:#}");
            None
        }
    };

    let message = ranked
        .is_empty()
        .then(|| "No recommendations found for your profile".to_string());

    Ok(Json(RecommendationResponse {
        recommendations: ranked,
        recommendation_id,
        message,
    }))
}

/// Rank the merged result set and cap it at the configured maximum. The
/// primary and fallback paths each honor the cap on their own, but their
/// union can exceed it.
fn rank_and_cap(
    results: Vec<RecommendationResult>,
    languages: &[String],
    topics: &[String],
    max_recommendations: usize,
) -> Vec<RecommendationResult> {
    let mut ranked = ranking::rank(results, languages, topics);
    ranked.truncate(max_recommendations);
    ranked
}

/// POST /api/recommendations/topics - Topic-only recommendations for users
/// without project history. The one user-facing validation error: both
/// lists empty.
pub async fn recommend_by_topics(
    State(state): State<AppState>,
    Json(req): Json<TopicRecommendationRequest>,
) -> Result<Json<RecommendationResponse>, (StatusCode, String)> {
    let recommender = Recommender::new(
        state.store.clone(),
        state.embedder.clone(),
        state.config.max_concurrent_embeds,
    );

    let results = recommender
        .topic_fallback(&req.languages, &req.topics, state.config.max_recommendations)
        .await
        .map_err(|e| match e {
            RecommendError::NoSignal => (StatusCode::BAD_REQUEST, e.to_string()),
            other => (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Recommendation failed: {other:#}"),
            ),
        })?;

    let ranked = rank_and_cap(
        results,
        &req.languages,
        &req.topics,
        state.config.max_recommendations,
    );

    let recommendation_id = req.username.as_deref().and_then(|username| {
        match state.history.append(username, &ranked, "topics") {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::error!("Failed to persist history for {username}: {e:#}");
                None
            }
        }
    });

    let message = ranked
        .is_empty()
        .then(|| "No recommendations found for the given topics".to_string());

    Ok(Json(RecommendationResponse {
        recommendations: ranked,
        recommendation_id,
        message,
    }))
}

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::error::AppResult;
use crate::middleware::request_id::RequestId;
use crate::models::{StatsSnapshot, TrackId, UserId};

use super::AppState;

// Request/Response types

#[derive(Debug, Deserialize)]
pub struct RecommendationQuery {
    pub user_id: UserId,
    pub k: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub recs: Vec<TrackId>,
}

// Handlers

/// Health check endpoint
pub async fn health_check() -> (StatusCode, Json<Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

/// Blended offline and online recommendations
pub async fn recommendations(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Query(query): Query<RecommendationQuery>,
) -> AppResult<Json<RecommendationResponse>> {
    let k = state.limits.resolve_k(query.k)?;

    tracing::info!(
        request_id = %request_id,
        user_id = %query.user_id,
        k,
        "Processing recommendations request"
    );

    let recs = state.engine.recommend(query.user_id, k);
    Ok(Json(RecommendationResponse { recs }))
}

/// Offline recommendations only
pub async fn recommendations_offline(
    State(state): State<AppState>,
    Query(query): Query<RecommendationQuery>,
) -> AppResult<Json<RecommendationResponse>> {
    let k = state.limits.resolve_k(query.k)?;
    let recs = state.engine.offline(query.user_id, k);
    Ok(Json(RecommendationResponse { recs }))
}

/// Online recommendations only
pub async fn recommendations_online(
    State(state): State<AppState>,
    Query(query): Query<RecommendationQuery>,
) -> AppResult<Json<RecommendationResponse>> {
    let k = state.limits.resolve_k(query.k)?;
    let recs = state.engine.online(query.user_id, k);
    Ok(Json(RecommendationResponse { recs }))
}

/// Current offline resolution counters
pub async fn stats(State(state): State<AppState>) -> Json<StatsSnapshot> {
    state.recommendations.log_stats();
    Json(state.recommendations.report_stats())
}

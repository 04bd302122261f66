use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use std::str::FromStr;
use std::sync::Arc;

use crate::{
    models::leaderboard::{LeaderboardQuery, LeaderboardResponse, SortKey},
    services::{leaderboard_service::LeaderboardService, AppState},
};

/// GET /api/v1/leaderboard - Ranked quiz attempts
pub async fn get_leaderboard(
    State(state): State<Arc<AppState>>,
    Query(query): Query<LeaderboardQuery>,
) -> Result<Json<LeaderboardResponse>, (StatusCode, String)> {
    let sort_by = match &query.sort_by {
        Some(raw) => SortKey::from_str(raw).map_err(|e| (StatusCode::BAD_REQUEST, e))?,
        None => SortKey::default(),
    };

    let service = LeaderboardService::new(
        state.mongo.clone(),
        state.config.leaderboard.reference_time_seconds,
    );

    match service
        .leaderboard(query.subject.as_deref(), query.subtopic.as_deref(), sort_by)
        .await
    {
        Ok(entries) => Ok(Json(LeaderboardResponse { sort_by, entries })),
        Err(e) => {
            tracing::error!("Leaderboard query failed: {}", e);
            Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

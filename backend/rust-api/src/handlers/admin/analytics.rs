use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use super::ApiError;
use crate::services::{
    analytics_service::{AnalyticsOverview, AnalyticsService},
    AppState,
};

/// GET /admin/analytics/overview
pub async fn analytics_overview(
    State(state): State<Arc<AppState>>,
) -> Result<Json<AnalyticsOverview>, ApiError> {
    let service = AnalyticsService::new(
        state.mongo.clone(),
        state.config.leaderboard.reference_time_seconds,
    );
    let overview = service.overview().await?;
    Ok(Json(overview))
}

/// GET /admin/analytics/export - XLSX download
pub async fn export_analytics(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let service = AnalyticsService::new(
        state.mongo.clone(),
        state.config.leaderboard.reference_time_seconds,
    );
    let bytes = service.export_xlsx().await?;

    Ok((
        StatusCode::OK,
        [
            (
                header::CONTENT_TYPE,
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet".to_string(),
            ),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"analytics.xlsx\"".to_string(),
            ),
        ],
        bytes,
    ))
}

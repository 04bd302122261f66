use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use std::sync::Arc;
use validator::Validate;

use crate::{
    extractors::AppJson,
    middlewares::auth::{JwtClaims, JwtService},
    models::notification::{CreateScheduledTestRequest, ScheduledTestResponse},
    services::{
        auth_service::AuthService, notification_service::NotificationService, AppState,
    },
};

/// POST /api/v1/scheduled-tests - Plan a test with an email reminder
pub async fn create_scheduled_test(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    AppJson(req): AppJson<CreateScheduledTestRequest>,
) -> Result<(StatusCode, Json<ScheduledTestResponse>), (StatusCode, String)> {
    if let Err(e) = req.validate() {
        return Err((StatusCode::BAD_REQUEST, format!("Validation error: {}", e)));
    }

    let jwt_service = JwtService::new(&state.config.jwt_secret);
    let auth_service = AuthService::new(state.mongo.clone(), state.redis.clone(), jwt_service);
    let user = auth_service
        .get_user_by_id(&claims.sub)
        .await
        .map_err(|e| (StatusCode::UNAUTHORIZED, e.to_string()))?;

    let service = NotificationService::new(state.mongo.clone());
    match service.schedule_test(&claims.sub, &user.name, req).await {
        Ok(response) => Ok((StatusCode::CREATED, Json(response))),
        Err(e) => Err((StatusCode::BAD_REQUEST, e.to_string())),
    }
}

/// GET /api/v1/scheduled-tests - Scheduled tests for the current user
pub async fn list_scheduled_tests(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
) -> Result<Json<Vec<ScheduledTestResponse>>, (StatusCode, String)> {
    let service = NotificationService::new(state.mongo.clone());

    match service.list_for_user(&claims.sub).await {
        Ok(tests) => Ok(Json(tests)),
        Err(e) => {
            tracing::error!("Scheduled tests query failed: {}", e);
            Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

/// POST /api/v1/scheduled-tests/{id}/cancel - Cancel a pending reminder
pub async fn cancel_scheduled_test(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    Path(schedule_id): Path<String>,
) -> Result<StatusCode, (StatusCode, String)> {
    let service = NotificationService::new(state.mongo.clone());

    match service.cancel(&claims.sub, &schedule_id).await {
        Ok(()) => Ok(StatusCode::NO_CONTENT),
        Err(e) => Err((StatusCode::NOT_FOUND, e.to_string())),
    }
}

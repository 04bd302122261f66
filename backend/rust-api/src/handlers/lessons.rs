use axum::{extract::State, http::StatusCode, Extension, Json};
use std::sync::Arc;
use validator::Validate;

use crate::{
    extractors::AppJson,
    middlewares::auth::JwtClaims,
    models::lesson::{GenerateLessonRequest, LessonResponse},
    services::{study_service::StudyService, AppState},
};

/// POST /api/v1/lessons - Generate a study lesson
pub async fn generate_lesson(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    AppJson(req): AppJson<GenerateLessonRequest>,
) -> Result<(StatusCode, Json<LessonResponse>), (StatusCode, String)> {
    if let Err(e) = req.validate() {
        return Err((StatusCode::BAD_REQUEST, format!("Validation error: {}", e)));
    }

    let service = StudyService::new(state.mongo.clone(), state.config.generator_api_url.clone());

    match service.generate_lesson(&claims.sub, req).await {
        Ok(response) => Ok((StatusCode::CREATED, Json(response))),
        Err(e) => {
            tracing::error!("Lesson generation failed: {}", e);
            Err((StatusCode::BAD_GATEWAY, e.to_string()))
        }
    }
}

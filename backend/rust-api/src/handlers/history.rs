use axum::{
    extract::{Query, State},
    http::StatusCode,
    Extension, Json,
};
use std::sync::Arc;

use crate::{
    middlewares::auth::JwtClaims,
    models::lesson::LessonResponse,
    models::quiz::{HistoryQuery, QuizAttemptView},
    services::{quiz_service::QuizService, study_service::StudyService, AppState},
};

/// GET /api/v1/history/quizzes - Quiz attempts for the current user
pub async fn quiz_history(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<QuizAttemptView>>, (StatusCode, String)> {
    let service = QuizService::new(
        state.mongo.clone(),
        state.redis.clone(),
        state.config.generator_api_url.clone(),
    );

    match service.quiz_history(&claims.sub, &query).await {
        Ok(attempts) => Ok(Json(
            attempts.into_iter().map(QuizAttemptView::from).collect(),
        )),
        Err(e) => {
            tracing::error!("Quiz history query failed: {}", e);
            Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

/// GET /api/v1/history/lessons - Lessons for the current user
pub async fn lesson_history(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    Query(query): Query<HistoryQuery>,
) -> Result<Json<Vec<LessonResponse>>, (StatusCode, String)> {
    let service = StudyService::new(state.mongo.clone(), state.config.generator_api_url.clone());

    match service.lesson_history(&claims.sub, &query).await {
        Ok(lessons) => Ok(Json(
            lessons.into_iter().map(LessonResponse::from).collect(),
        )),
        Err(e) => {
            tracing::error!("Lesson history query failed: {}", e);
            Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

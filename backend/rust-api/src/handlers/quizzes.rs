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
    models::quiz::{GenerateQuizRequest, QuizResponse, SubmitQuizRequest, SubmitQuizResponse},
    services::{auth_service::AuthService, quiz_service::QuizService, AppState},
};

fn quiz_service(state: &AppState) -> QuizService {
    QuizService::new(
        state.mongo.clone(),
        state.redis.clone(),
        state.config.generator_api_url.clone(),
    )
}

/// POST /api/v1/quizzes - Generate a new quiz
pub async fn generate_quiz(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    AppJson(req): AppJson<GenerateQuizRequest>,
) -> Result<(StatusCode, Json<QuizResponse>), (StatusCode, String)> {
    if let Err(e) = req.validate() {
        return Err((StatusCode::BAD_REQUEST, format!("Validation error: {}", e)));
    }

    match quiz_service(&state).generate_quiz(&claims.sub, req).await {
        Ok(response) => Ok((StatusCode::CREATED, Json(response))),
        Err(e) => {
            tracing::error!("Quiz generation failed: {}", e);
            Err((StatusCode::BAD_GATEWAY, e.to_string()))
        }
    }
}

/// POST /api/v1/quizzes/{id}/submit - Grade and record a quiz
pub async fn submit_quiz(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    Path(quiz_id): Path<String>,
    AppJson(req): AppJson<SubmitQuizRequest>,
) -> Result<Json<SubmitQuizResponse>, (StatusCode, String)> {
    if let Err(e) = req.validate() {
        return Err((StatusCode::BAD_REQUEST, format!("Validation error: {}", e)));
    }

    // Attempt records carry the display name for leaderboard views
    let jwt_service = JwtService::new(&state.config.jwt_secret);
    let auth_service = AuthService::new(state.mongo.clone(), state.redis.clone(), jwt_service);
    let user = auth_service
        .get_user_by_id(&claims.sub)
        .await
        .map_err(|e| (StatusCode::UNAUTHORIZED, e.to_string()))?;

    match quiz_service(&state)
        .submit_quiz(&claims.sub, &user.name, &quiz_id, req)
        .await
    {
        Ok(response) => Ok(Json(response)),
        Err(e) => {
            tracing::warn!("Quiz submission failed: {}", e);
            Err((StatusCode::BAD_REQUEST, e.to_string()))
        }
    }
}

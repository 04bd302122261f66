use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Extension,
};
use std::sync::Arc;

use crate::{
    middlewares::auth::JwtClaims,
    services::{
        certificate_service::CertificateService, quiz_service::QuizService, AppState,
    },
};

/// GET /api/v1/certificates/{attempt_id} - PDF certificate for a
/// qualifying attempt
pub async fn download_certificate(
    State(state): State<Arc<AppState>>,
    Extension(claims): Extension<JwtClaims>,
    Path(attempt_id): Path<String>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let quiz_service = QuizService::new(
        state.mongo.clone(),
        state.redis.clone(),
        state.config.generator_api_url.clone(),
    );

    let attempt = quiz_service
        .get_attempt(&attempt_id)
        .await
        .map_err(|e| (StatusCode::NOT_FOUND, e.to_string()))?;

    // Children can only download their own certificates
    if attempt.user_id != claims.sub && claims.role != "admin" {
        return Err((
            StatusCode::FORBIDDEN,
            "Certificate belongs to another user".to_string(),
        ));
    }

    let service = CertificateService::new(state.config.certificate.min_score);
    let pdf = service
        .render_for_attempt(&attempt)
        .map_err(|e| (StatusCode::FORBIDDEN, e.to_string()))?;

    tracing::info!("Certificate rendered for attempt: {}", attempt_id);

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"certificate-{}.pdf\"", attempt_id),
            ),
        ],
        pdf,
    ))
}

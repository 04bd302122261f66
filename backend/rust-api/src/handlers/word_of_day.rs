use axum::{extract::State, http::StatusCode, Json};
use std::sync::Arc;

use crate::{
    metrics::WORD_OF_DAY_REQUESTS_TOTAL,
    models::vocabulary::WordOfDay,
    services::{word_of_day_service::WordOfDayService, AppState},
};

/// GET /api/v1/word-of-day - Today's vocabulary word
pub async fn get_word_of_day(
    State(state): State<Arc<AppState>>,
) -> Result<Json<WordOfDay>, (StatusCode, String)> {
    let service = WordOfDayService::new(state.mongo.clone(), state.redis.clone());

    match service.today().await {
        Ok(word) => {
            WORD_OF_DAY_REQUESTS_TOTAL
                .with_label_values(&["success"])
                .inc();
            Ok(Json(word))
        }
        Err(e) => {
            WORD_OF_DAY_REQUESTS_TOTAL
                .with_label_values(&["error"])
                .inc();
            tracing::error!("Word of day lookup failed: {}", e);
            Err((StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
        }
    }
}

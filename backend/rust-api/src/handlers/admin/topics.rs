use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use std::sync::Arc;
use validator::Validate;

use super::ApiError;
use crate::{
    extractors::AppJson,
    models::topic::{
        CreateSubtopicRequest, CreateTopicRequest, Subtopic, Topic, TopicSummary,
        UpdateTopicRequest,
    },
    services::{topic_service::TopicService, AppState},
};

#[derive(Debug, Deserialize)]
pub struct ListTopicsQuery {
    #[serde(default)]
    pub include_archived: bool,
}

/// GET /admin/topics
pub async fn list_topics(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListTopicsQuery>,
) -> Result<Json<Vec<TopicSummary>>, ApiError> {
    let service = TopicService::new(state.mongo.clone());
    let topics = service.list_topics(query.include_archived).await?;
    Ok(Json(topics))
}

/// POST /admin/topics
pub async fn create_topic(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<CreateTopicRequest>,
) -> Result<(StatusCode, Json<Topic>), ApiError> {
    req.validate()
        .map_err(|e| ApiError::bad_request(format!("Validation error: {}", e)))?;

    let service = TopicService::new(state.mongo.clone());
    let topic = service.create_topic(req).await?;
    Ok((StatusCode::CREATED, Json(topic)))
}

/// PATCH /admin/topics/{id}
pub async fn update_topic(
    State(state): State<Arc<AppState>>,
    Path(topic_id): Path<String>,
    AppJson(req): AppJson<UpdateTopicRequest>,
) -> Result<Json<Topic>, ApiError> {
    req.validate()
        .map_err(|e| ApiError::bad_request(format!("Validation error: {}", e)))?;

    let service = TopicService::new(state.mongo.clone());
    let topic = service
        .update_topic(&topic_id, req)
        .await
        .map_err(|e| ApiError::not_found(e.to_string()))?;
    Ok(Json(topic))
}

/// DELETE /admin/topics/{id} - Soft archive
pub async fn archive_topic(
    State(state): State<Arc<AppState>>,
    Path(topic_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let service = TopicService::new(state.mongo.clone());
    service
        .archive_topic(&topic_id)
        .await
        .map_err(|e| ApiError::not_found(e.to_string()))?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /admin/topics/{id}/subtopics
pub async fn create_subtopic(
    State(state): State<Arc<AppState>>,
    Path(topic_id): Path<String>,
    AppJson(req): AppJson<CreateSubtopicRequest>,
) -> Result<(StatusCode, Json<Subtopic>), ApiError> {
    req.validate()
        .map_err(|e| ApiError::bad_request(format!("Validation error: {}", e)))?;

    let service = TopicService::new(state.mongo.clone());
    let subtopic = service.create_subtopic(&topic_id, req).await?;
    Ok((StatusCode::CREATED, Json(subtopic)))
}

/// DELETE /admin/subtopics/{id} - Soft archive
pub async fn archive_subtopic(
    State(state): State<Arc<AppState>>,
    Path(subtopic_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let service = TopicService::new(state.mongo.clone());
    service
        .archive_subtopic(&subtopic_id)
        .await
        .map_err(|e| ApiError::not_found(e.to_string()))?;
    Ok(StatusCode::NO_CONTENT)
}

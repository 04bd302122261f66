use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use std::sync::Arc;

use super::ApiError;
use crate::{
    extractors::AppJson,
    models::user::{ListUsersQuery, UpdateUserRequest, UserProfile},
    services::{user_admin_service::UserAdminService, AppState},
};

/// GET /admin/users
pub async fn list_users(
    State(state): State<Arc<AppState>>,
    Query(query): Query<ListUsersQuery>,
) -> Result<Json<Vec<UserProfile>>, ApiError> {
    let service = UserAdminService::new(state.mongo.clone());
    let users = service.list_users(query).await?;
    Ok(Json(users))
}

/// PATCH /admin/users/{id}
pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
    AppJson(req): AppJson<UpdateUserRequest>,
) -> Result<Json<UserProfile>, ApiError> {
    let service = UserAdminService::new(state.mongo.clone());
    let user = service
        .update_user(&user_id, req)
        .await
        .map_err(|e| ApiError::not_found(e.to_string()))?;
    Ok(Json(user))
}

/// POST /admin/users/{id}/block
pub async fn block_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let service = UserAdminService::new(state.mongo.clone());
    service
        .set_blocked(&user_id, true)
        .await
        .map_err(|e| ApiError::not_found(e.to_string()))?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /admin/users/{id}/unblock
pub async fn unblock_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let service = UserAdminService::new(state.mongo.clone());
    service
        .set_blocked(&user_id, false)
        .await
        .map_err(|e| ApiError::not_found(e.to_string()))?;
    Ok(StatusCode::NO_CONTENT)
}

//! Notification API handlers

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
};
use common::model::notification::Notification;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use view_cache::CacheKey;

use crate::api::response::{ApiListResponse, ApiResponse};
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::AppState;

/// Cache collection for notification listings
const NOTIFICATIONS: &str = "notifications";

/// Listing query parameters
#[derive(Debug, Deserialize, ToSchema)]
pub struct NotificationsQuery {
    /// Maximum number of rows to return
    pub limit: Option<usize>,
}

/// List the authenticated user's notifications, newest first
#[utoipa::path(
    get,
    path = "/api/v1/notifications",
    params(
        ("limit" = Option<usize>, Query, description = "Maximum rows to return")
    ),
    responses(
        (status = 200, description = "Notifications retrieved successfully"),
        (status = 401, description = "Not authenticated"),
        (status = 500, description = "Internal server error")
    ),
    tag = "notifications"
)]
pub async fn list_notifications(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<NotificationsQuery>,
) -> Result<ApiListResponse<Notification>, ApiError> {
    let limit = query
        .limit
        .unwrap_or(platform_service::service::DEFAULT_NOTIFICATION_LIMIT);
    let key = CacheKey::entry(NOTIFICATIONS, format!("{}/{}", user.user_id, limit));
    let notifications = state
        .cache
        .get_or_load(key, || async {
            state
                .platform_service
                .list_notifications(user.user_id, limit)
                .await
        })
        .await
        .map_err(ApiError::Common)?;

    Ok(ApiListResponse::new((*notifications).clone()))
}

/// Mark a notification read
#[utoipa::path(
    post,
    path = "/api/v1/notifications/{id}/read",
    params(
        ("id" = Uuid, Path, description = "Notification ID")
    ),
    responses(
        (status = 200, description = "Notification marked read"),
        (status = 404, description = "Notification not found"),
        (status = 401, description = "Not authenticated"),
        (status = 500, description = "Internal server error")
    ),
    tag = "notifications"
)]
pub async fn mark_read(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<Notification>, ApiError> {
    let notification = state
        .platform_service
        .mark_notification_read(user.user_id, id)
        .await
        .map_err(ApiError::Common)?;

    state
        .cache
        .invalidate_prefix(NOTIFICATIONS, &user.user_id.to_string())
        .await;

    Ok(ApiResponse::new(notification))
}

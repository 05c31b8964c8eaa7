//! Copytrader API handlers

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, Utc};
use common::decimal::{Amount, Percent};
use common::model::copytrader::{Copytrader, CopytraderSettings, NotifyChannel};
use copytrader_service::{NewCopytrader, SettingsUpdate, UpdateCopytrader};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use view_cache::CacheKey;

use crate::api::response::{ApiListResponse, ApiResponse};
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::AppState;

/// Cache collection for copytrader listings
const COPYTRADERS: &str = "copytraders";
/// Cache collection for per-copytrader settings
const COPYTRADER_SETTINGS: &str = "copytrader_settings";

/// Settings cache entries carry the owner so a warm cache never serves one
/// user's settings to another
fn settings_key(user_id: Uuid, copytrader_id: Uuid) -> CacheKey {
    CacheKey::entry(COPYTRADER_SETTINGS, format!("{}/{}", user_id, copytrader_id))
}

/// Create copytrader request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCopytraderRequest {
    /// Display name
    pub display_name: String,
    /// Contact email
    pub email: String,
    /// Contact phone
    pub phone: Option<String>,
    /// Free-text description
    pub description: Option<String>,
}

impl From<CreateCopytraderRequest> for NewCopytrader {
    fn from(request: CreateCopytraderRequest) -> Self {
        Self {
            display_name: request.display_name,
            email: request.email,
            phone: request.phone,
            description: request.description,
        }
    }
}

/// Update copytrader request
#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCopytraderRequest {
    /// Display name
    pub display_name: String,
    /// Contact email
    pub email: String,
    /// Contact phone
    pub phone: Option<String>,
    /// Whether the profile is active
    pub is_active: bool,
    /// Free-text description
    pub description: Option<String>,
}

impl From<UpdateCopytraderRequest> for UpdateCopytrader {
    fn from(request: UpdateCopytraderRequest) -> Self {
        Self {
            display_name: request.display_name,
            email: request.email,
            phone: request.phone,
            is_active: request.is_active,
            description: request.description,
        }
    }
}

/// Copytrader settings request
#[derive(Debug, Deserialize, ToSchema)]
pub struct SettingsRequest {
    /// Profit share in percent
    pub profit_share_pct: Percent,
    /// Allocated budget
    pub budget: Amount,
    /// Wallet address for payouts
    pub payout_wallet: String,
    /// Preferred notification channel
    pub notify_channel: NotifyChannel,
    /// Subscription end date, if any
    pub subscription_until: Option<DateTime<Utc>>,
}

impl From<SettingsRequest> for SettingsUpdate {
    fn from(request: SettingsRequest) -> Self {
        Self {
            profit_share_pct: request.profit_share_pct,
            budget: request.budget,
            payout_wallet: request.payout_wallet,
            notify_channel: request.notify_channel,
            subscription_until: request.subscription_until,
        }
    }
}

/// Set credentials request
#[derive(Debug, Deserialize, ToSchema)]
pub struct SetCredentialsRequest {
    /// New password
    pub password: String,
}

/// Create a copytrader profile
#[utoipa::path(
    post,
    path = "/api/v1/copytraders",
    request_body = CreateCopytraderRequest,
    responses(
        (status = 200, description = "Copytrader created"),
        (status = 400, description = "Invalid profile"),
        (status = 401, description = "Not authenticated"),
        (status = 500, description = "Internal server error")
    ),
    tag = "copytraders"
)]
pub async fn create_copytrader(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(request): Json<CreateCopytraderRequest>,
) -> Result<ApiResponse<Copytrader>, ApiError> {
    let copytrader = state
        .copytrader_service
        .create_copytrader(user.user_id, request.into())
        .await
        .map_err(ApiError::Common)?;

    state
        .cache
        .invalidate(&CacheKey::entry(COPYTRADERS, user.user_id))
        .await;

    Ok(ApiResponse::new(copytrader))
}

/// List the authenticated user's copytrader profiles
#[utoipa::path(
    get,
    path = "/api/v1/copytraders",
    responses(
        (status = 200, description = "Copytraders retrieved successfully"),
        (status = 401, description = "Not authenticated"),
        (status = 500, description = "Internal server error")
    ),
    tag = "copytraders"
)]
pub async fn list_copytraders(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<ApiListResponse<Copytrader>, ApiError> {
    let key = CacheKey::entry(COPYTRADERS, user.user_id);
    let copytraders = state
        .cache
        .get_or_load(key, || async {
            state.copytrader_service.list_copytraders(user.user_id).await
        })
        .await
        .map_err(ApiError::Common)?;

    Ok(ApiListResponse::new((*copytraders).clone()))
}

/// Get a copytrader profile
#[utoipa::path(
    get,
    path = "/api/v1/copytraders/{id}",
    params(
        ("id" = Uuid, Path, description = "Copytrader ID")
    ),
    responses(
        (status = 200, description = "Copytrader retrieved successfully"),
        (status = 404, description = "Copytrader not found"),
        (status = 401, description = "Not authenticated"),
        (status = 500, description = "Internal server error")
    ),
    tag = "copytraders"
)]
pub async fn get_copytrader(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<Copytrader>, ApiError> {
    let copytrader = state
        .copytrader_service
        .get_copytrader(user.user_id, id)
        .await
        .map_err(ApiError::Common)?
        .ok_or_else(|| ApiError::NotFound(format!("Copytrader not found: {}", id)))?;

    Ok(ApiResponse::new(copytrader))
}

/// Update a copytrader profile
#[utoipa::path(
    put,
    path = "/api/v1/copytraders/{id}",
    params(
        ("id" = Uuid, Path, description = "Copytrader ID")
    ),
    request_body = UpdateCopytraderRequest,
    responses(
        (status = 200, description = "Copytrader updated"),
        (status = 400, description = "Invalid profile"),
        (status = 404, description = "Copytrader not found"),
        (status = 401, description = "Not authenticated"),
        (status = 500, description = "Internal server error")
    ),
    tag = "copytraders"
)]
pub async fn update_copytrader(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateCopytraderRequest>,
) -> Result<ApiResponse<Copytrader>, ApiError> {
    let copytrader = state
        .copytrader_service
        .update_copytrader(user.user_id, id, request.into())
        .await
        .map_err(ApiError::Common)?;

    state
        .cache
        .invalidate(&CacheKey::entry(COPYTRADERS, user.user_id))
        .await;

    Ok(ApiResponse::new(copytrader))
}

/// Delete a copytrader profile (and its settings row)
#[utoipa::path(
    delete,
    path = "/api/v1/copytraders/{id}",
    params(
        ("id" = Uuid, Path, description = "Copytrader ID")
    ),
    responses(
        (status = 200, description = "Copytrader deleted"),
        (status = 404, description = "Copytrader not found"),
        (status = 401, description = "Not authenticated"),
        (status = 500, description = "Internal server error")
    ),
    tag = "copytraders"
)]
pub async fn delete_copytrader(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<serde_json::Value>, ApiError> {
    state
        .copytrader_service
        .delete_copytrader(user.user_id, id)
        .await
        .map_err(ApiError::Common)?;

    state
        .cache
        .invalidate(&CacheKey::entry(COPYTRADERS, user.user_id))
        .await;
    state
        .cache
        .invalidate(&settings_key(user.user_id, id))
        .await;

    Ok(ApiResponse::new(serde_json::json!({ "deleted": true })))
}

/// Create or update a copytrader's settings
///
/// One settings row per copytrader; resubmitting replaces the stored values.
#[utoipa::path(
    put,
    path = "/api/v1/copytraders/{id}/settings",
    params(
        ("id" = Uuid, Path, description = "Copytrader ID")
    ),
    request_body = SettingsRequest,
    responses(
        (status = 200, description = "Settings stored"),
        (status = 400, description = "Invalid settings"),
        (status = 404, description = "Copytrader not found"),
        (status = 401, description = "Not authenticated"),
        (status = 500, description = "Internal server error")
    ),
    tag = "copytraders"
)]
pub async fn upsert_settings(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(request): Json<SettingsRequest>,
) -> Result<ApiResponse<CopytraderSettings>, ApiError> {
    let settings = state
        .copytrader_service
        .upsert_settings(user.user_id, id, request.into())
        .await
        .map_err(ApiError::Common)?;

    state
        .cache
        .invalidate(&settings_key(user.user_id, id))
        .await;

    Ok(ApiResponse::new(settings))
}

/// Get a copytrader's settings (defaults when never stored)
#[utoipa::path(
    get,
    path = "/api/v1/copytraders/{id}/settings",
    params(
        ("id" = Uuid, Path, description = "Copytrader ID")
    ),
    responses(
        (status = 200, description = "Settings retrieved successfully"),
        (status = 404, description = "Copytrader not found"),
        (status = 401, description = "Not authenticated"),
        (status = 500, description = "Internal server error")
    ),
    tag = "copytraders"
)]
pub async fn get_settings(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<CopytraderSettings>, ApiError> {
    let key = settings_key(user.user_id, id);
    let settings = state
        .cache
        .get_or_load(key, || async {
            state.copytrader_service.get_settings(user.user_id, id).await
        })
        .await
        .map_err(ApiError::Common)?;

    Ok(ApiResponse::new((*settings).clone()))
}

/// Set a copytrader's login password
#[utoipa::path(
    post,
    path = "/api/v1/copytraders/{id}/credentials",
    params(
        ("id" = Uuid, Path, description = "Copytrader ID")
    ),
    request_body = SetCredentialsRequest,
    responses(
        (status = 200, description = "Credentials stored"),
        (status = 400, description = "Password too short"),
        (status = 404, description = "Copytrader not found"),
        (status = 401, description = "Not authenticated"),
        (status = 500, description = "Internal server error")
    ),
    tag = "copytraders"
)]
pub async fn set_credentials(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(request): Json<SetCredentialsRequest>,
) -> Result<ApiResponse<serde_json::Value>, ApiError> {
    state
        .copytrader_service
        .set_credentials(user.user_id, id, &request.password)
        .await
        .map_err(ApiError::Common)?;

    Ok(ApiResponse::new(serde_json::json!({ "credentials_set": true })))
}

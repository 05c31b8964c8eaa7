//! Bot API handlers
//!
//! Trading bots get full CRUD plus start/stop/status; contract bots share
//! the same lifecycle routes but expose no status endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    Json,
};
use common::decimal::Percent;
use common::model::bot::{Bot, BotKind, BotSnapshot};
use common::model::notification::NotificationKind;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use view_cache::CacheKey;

use crate::api::response::{ApiListResponse, ApiResponse};
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::AppState;

/// Cache collection for trading bot listings
const BOTS: &str = "bots";
/// Cache collection for contract bot listings
const CONTRACT_BOTS: &str = "contract_bots";
/// Cache collection for notification listings
const NOTIFICATIONS: &str = "notifications";

/// Create bot request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateBotRequest {
    /// Display name
    pub name: String,
    /// Trading pair symbol
    pub pair: String,
    /// Risk level (1..=10)
    pub risk_level: i16,
    /// Maximum tolerated drawdown in percent
    pub max_drawdown_pct: Percent,
    /// Profit target in percent
    pub profit_target_pct: Percent,
}

/// Lifecycle operation result
#[derive(Debug, Serialize, ToSchema)]
pub struct LifecycleResponse {
    /// Human-readable outcome message
    pub message: String,
}

impl CreateBotRequest {
    fn into_new_bot(self, kind: BotKind) -> bot_service::NewBot {
        bot_service::NewBot {
            name: self.name,
            pair: self.pair,
            kind,
            risk_level: self.risk_level,
            max_drawdown_pct: self.max_drawdown_pct,
            profit_target_pct: self.profit_target_pct,
        }
    }
}

fn collection_for(kind: BotKind) -> &'static str {
    match kind {
        BotKind::Trading => BOTS,
        BotKind::Contract => CONTRACT_BOTS,
    }
}

async fn create_bot_of_kind(
    state: Arc<AppState>,
    user: AuthUser,
    request: CreateBotRequest,
    kind: BotKind,
) -> Result<ApiResponse<Bot>, ApiError> {
    let bot = state
        .bot_service
        .create_bot(user.user_id, request.into_new_bot(kind))
        .await
        .map_err(ApiError::Common)?;

    state
        .cache
        .invalidate(&CacheKey::entry(collection_for(kind), user.user_id))
        .await;

    Ok(ApiResponse::new(bot))
}

async fn list_bots_of_kind(
    state: Arc<AppState>,
    user: AuthUser,
    kind: BotKind,
) -> Result<ApiListResponse<Bot>, ApiError> {
    let key = CacheKey::entry(collection_for(kind), user.user_id);
    let bots = state
        .cache
        .get_or_load(key, || async {
            state.bot_service.list_bots(user.user_id, Some(kind)).await
        })
        .await
        .map_err(ApiError::Common)?;

    Ok(ApiListResponse::new((*bots).clone()))
}

/// Create a trading bot
#[utoipa::path(
    post,
    path = "/api/v1/bots",
    request_body = CreateBotRequest,
    responses(
        (status = 200, description = "Bot successfully created"),
        (status = 400, description = "Invalid bot parameters"),
        (status = 401, description = "Not authenticated"),
        (status = 500, description = "Internal server error")
    ),
    tag = "bots"
)]
pub async fn create_bot(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(request): Json<CreateBotRequest>,
) -> Result<ApiResponse<Bot>, ApiError> {
    create_bot_of_kind(state, user, request, BotKind::Trading).await
}

/// List the authenticated user's trading bots
#[utoipa::path(
    get,
    path = "/api/v1/bots",
    responses(
        (status = 200, description = "Bots retrieved successfully"),
        (status = 401, description = "Not authenticated"),
        (status = 500, description = "Internal server error")
    ),
    tag = "bots"
)]
pub async fn list_bots(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<ApiListResponse<Bot>, ApiError> {
    list_bots_of_kind(state, user, BotKind::Trading).await
}

/// Create a contract bot
#[utoipa::path(
    post,
    path = "/api/v1/contract-bots",
    request_body = CreateBotRequest,
    responses(
        (status = 200, description = "Bot successfully created"),
        (status = 400, description = "Invalid bot parameters"),
        (status = 401, description = "Not authenticated"),
        (status = 500, description = "Internal server error")
    ),
    tag = "bots"
)]
pub async fn create_contract_bot(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(request): Json<CreateBotRequest>,
) -> Result<ApiResponse<Bot>, ApiError> {
    create_bot_of_kind(state, user, request, BotKind::Contract).await
}

/// List the authenticated user's contract bots
#[utoipa::path(
    get,
    path = "/api/v1/contract-bots",
    responses(
        (status = 200, description = "Bots retrieved successfully"),
        (status = 401, description = "Not authenticated"),
        (status = 500, description = "Internal server error")
    ),
    tag = "bots"
)]
pub async fn list_contract_bots(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<ApiListResponse<Bot>, ApiError> {
    list_bots_of_kind(state, user, BotKind::Contract).await
}

/// Get a bot by ID
#[utoipa::path(
    get,
    path = "/api/v1/bots/{id}",
    params(
        ("id" = Uuid, Path, description = "Bot ID")
    ),
    responses(
        (status = 200, description = "Bot retrieved successfully"),
        (status = 404, description = "Bot not found"),
        (status = 401, description = "Not authenticated"),
        (status = 500, description = "Internal server error")
    ),
    tag = "bots"
)]
pub async fn get_bot(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<Bot>, ApiError> {
    let bot = state
        .bot_service
        .get_bot(user.user_id, id)
        .await
        .map_err(ApiError::Common)?
        .ok_or_else(|| ApiError::NotFound(format!("Bot not found: {}", id)))?;

    Ok(ApiResponse::new(bot))
}

/// Delete a bot
#[utoipa::path(
    delete,
    path = "/api/v1/bots/{id}",
    params(
        ("id" = Uuid, Path, description = "Bot ID")
    ),
    responses(
        (status = 200, description = "Bot deleted"),
        (status = 404, description = "Bot not found"),
        (status = 401, description = "Not authenticated"),
        (status = 500, description = "Internal server error")
    ),
    tag = "bots"
)]
pub async fn delete_bot(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<serde_json::Value>, ApiError> {
    // Look up the kind first so the right listing gets invalidated
    let bot = state
        .bot_service
        .get_bot(user.user_id, id)
        .await
        .map_err(ApiError::Common)?
        .ok_or_else(|| ApiError::NotFound(format!("Bot not found: {}", id)))?;

    state
        .bot_service
        .delete_bot(user.user_id, id)
        .await
        .map_err(ApiError::Common)?;

    state
        .cache
        .invalidate(&CacheKey::entry(collection_for(bot.kind), user.user_id))
        .await;

    Ok(ApiResponse::new(serde_json::json!({ "deleted": true })))
}

/// Start a bot
#[utoipa::path(
    post,
    path = "/api/v1/bots/{id}/start",
    params(
        ("id" = Uuid, Path, description = "Bot ID")
    ),
    responses(
        (status = 200, description = "Bot started"),
        (status = 404, description = "Bot not found"),
        (status = 401, description = "Not authenticated"),
        (status = 500, description = "Internal server error")
    ),
    tag = "bots"
)]
pub async fn start_bot(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<LifecycleResponse>, ApiError> {
    let message = state
        .bot_service
        .start(user.user_id, id)
        .await
        .map_err(ApiError::Common)?;

    finish_lifecycle(&state, &user, id, "Bot started", &message).await?;
    Ok(ApiResponse::new(LifecycleResponse { message }))
}

/// Stop a bot
#[utoipa::path(
    post,
    path = "/api/v1/bots/{id}/stop",
    params(
        ("id" = Uuid, Path, description = "Bot ID")
    ),
    responses(
        (status = 200, description = "Bot stopped"),
        (status = 404, description = "Bot not found"),
        (status = 401, description = "Not authenticated"),
        (status = 500, description = "Internal server error")
    ),
    tag = "bots"
)]
pub async fn stop_bot(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<LifecycleResponse>, ApiError> {
    let message = state
        .bot_service
        .stop(user.user_id, id)
        .await
        .map_err(ApiError::Common)?;

    finish_lifecycle(&state, &user, id, "Bot stopped", &message).await?;
    Ok(ApiResponse::new(LifecycleResponse { message }))
}

/// Record the lifecycle notification and drop the affected cached views
async fn finish_lifecycle(
    state: &Arc<AppState>,
    user: &AuthUser,
    bot_id: Uuid,
    title: &str,
    message: &str,
) -> Result<(), ApiError> {
    state
        .platform_service
        .notify(user.user_id, title, message, NotificationKind::Bot)
        .await
        .map_err(ApiError::Common)?;

    let kind = state
        .bot_service
        .get_bot(user.user_id, bot_id)
        .await
        .map_err(ApiError::Common)?
        .map(|b| b.kind)
        .unwrap_or(BotKind::Trading);

    state
        .cache
        .invalidate(&CacheKey::entry(collection_for(kind), user.user_id))
        .await;
    state
        .cache
        .invalidate_prefix(NOTIFICATIONS, &user.user_id.to_string())
        .await;

    Ok(())
}

/// Get a trading bot's status snapshot
#[utoipa::path(
    get,
    path = "/api/v1/bots/{id}/status",
    params(
        ("id" = Uuid, Path, description = "Bot ID")
    ),
    responses(
        (status = 200, description = "Status snapshot retrieved"),
        (status = 400, description = "Status is not supported for contract bots"),
        (status = 404, description = "Bot not found"),
        (status = 401, description = "Not authenticated"),
        (status = 500, description = "Internal server error")
    ),
    tag = "bots"
)]
pub async fn bot_status(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> Result<ApiResponse<BotSnapshot>, ApiError> {
    let snapshot = state
        .bot_service
        .status(user.user_id, id)
        .await
        .map_err(ApiError::Common)?;

    Ok(ApiResponse::new(snapshot))
}

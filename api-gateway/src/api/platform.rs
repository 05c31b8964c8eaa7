//! Platform state and market clock API handlers

use std::sync::Arc;

use axum::{extract::State, Json};
use common::model::platform::{MarketSession, PlatformState};
use platform_service::MarketCountdown;
use serde::Deserialize;
use utoipa::ToSchema;
use view_cache::CacheKey;

use crate::api::response::ApiResponse;
use crate::auth::{AdminUser, AuthUser};
use crate::error::ApiError;
use crate::AppState;

/// Cache collection for the platform state row
const PLATFORM: &str = "platform";

/// Halt/resume request
#[derive(Debug, Deserialize, ToSchema)]
pub struct SetPlatformStateRequest {
    /// Whether trading is halted platform-wide
    pub trading_halted: bool,
    /// Optional human-readable reason
    pub reason: Option<String>,
}

/// Market session request
#[derive(Debug, Deserialize, ToSchema)]
pub struct SetMarketSessionRequest {
    /// Weekday the market opens (0 = Monday)
    pub open_weekday: u8,
    /// Hour of day the market opens (0..=23)
    pub open_hour: u8,
    /// Weekday the market closes (0 = Monday)
    pub close_weekday: u8,
    /// Hour of day the market closes (0..=23)
    pub close_hour: u8,
}

/// Current platform-wide trading state
#[utoipa::path(
    get,
    path = "/api/v1/platform/state",
    responses(
        (status = 200, description = "State retrieved successfully"),
        (status = 401, description = "Not authenticated"),
        (status = 500, description = "Internal server error")
    ),
    tag = "platform"
)]
pub async fn get_platform_state(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
) -> Result<ApiResponse<PlatformState>, ApiError> {
    let key = CacheKey::collection(PLATFORM);
    let platform_state = state
        .cache
        .get_or_load(key, || async { state.platform_service.platform_state().await })
        .await
        .map_err(ApiError::Common)?;

    Ok(ApiResponse::new((*platform_state).clone()))
}

/// Halt or resume trading platform-wide (admin only)
#[utoipa::path(
    put,
    path = "/api/v1/platform/state",
    request_body = SetPlatformStateRequest,
    responses(
        (status = 200, description = "State updated"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Admin role required"),
        (status = 500, description = "Internal server error")
    ),
    tag = "platform"
)]
pub async fn set_platform_state(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Json(request): Json<SetPlatformStateRequest>,
) -> Result<ApiResponse<PlatformState>, ApiError> {
    let updated = state
        .platform_service
        .set_trading_halted(request.trading_halted, request.reason)
        .await
        .map_err(ApiError::Common)?;

    state.cache.invalidate_collection(PLATFORM).await;

    Ok(ApiResponse::new(updated))
}

/// Market clock: open/closed plus seconds to the next transition
#[utoipa::path(
    get,
    path = "/api/v1/market/clock",
    responses(
        (status = 200, description = "Clock retrieved successfully"),
        (status = 401, description = "Not authenticated"),
        (status = 500, description = "Internal server error")
    ),
    tag = "platform"
)]
pub async fn market_clock(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
) -> Result<ApiResponse<MarketCountdown>, ApiError> {
    let countdown = state
        .platform_service
        .market_countdown()
        .await
        .map_err(ApiError::Common)?;

    Ok(ApiResponse::new(countdown))
}

/// Current market session window
#[utoipa::path(
    get,
    path = "/api/v1/market/session",
    responses(
        (status = 200, description = "Session window retrieved successfully"),
        (status = 401, description = "Not authenticated"),
        (status = 500, description = "Internal server error")
    ),
    tag = "platform"
)]
pub async fn get_market_session(
    State(state): State<Arc<AppState>>,
    _user: AuthUser,
) -> Result<ApiResponse<MarketSession>, ApiError> {
    let session = state
        .platform_service
        .market_session()
        .await
        .map_err(ApiError::Common)?;

    Ok(ApiResponse::new(session))
}

/// Replace the market session window (admin only)
#[utoipa::path(
    put,
    path = "/api/v1/market/session",
    request_body = SetMarketSessionRequest,
    responses(
        (status = 200, description = "Session window updated"),
        (status = 400, description = "Invalid session window"),
        (status = 401, description = "Not authenticated"),
        (status = 403, description = "Admin role required"),
        (status = 500, description = "Internal server error")
    ),
    tag = "platform"
)]
pub async fn set_market_session(
    State(state): State<Arc<AppState>>,
    _admin: AdminUser,
    Json(request): Json<SetMarketSessionRequest>,
) -> Result<ApiResponse<MarketSession>, ApiError> {
    let session = MarketSession {
        open_weekday: request.open_weekday,
        open_hour: request.open_hour,
        close_weekday: request.close_weekday,
        close_hour: request.close_hour,
    };

    let stored = state
        .platform_service
        .set_market_session(session)
        .await
        .map_err(ApiError::Common)?;

    Ok(ApiResponse::new(stored))
}

//! Authentication API handlers
//!
//! Two login strategies issue the same bearer session: the managed admin API
//! key and the copytrader stored-hash login.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header, HeaderMap},
    Json,
};
use chrono::{DateTime, Utc};
use common::model::session::Role;
use serde::{Deserialize, Serialize};
use tracing::info;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::api::response::ApiResponse;
use crate::error::ApiError;
use crate::AppState;

/// Copytrader login request
#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    /// Registered email
    pub email: String,
    /// Password
    pub password: String,
}

/// Admin login request
#[derive(Debug, Deserialize, ToSchema)]
pub struct AdminLoginRequest {
    /// Managed API key
    pub api_key: String,
}

/// Issued session details
#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    /// Bearer token to present on subsequent requests
    pub token: Uuid,
    /// Role the session was issued for
    pub role: Role,
    /// Expiry timestamp
    pub expires_at: DateTime<Utc>,
}

/// Log in as a copytrader with email and password
#[utoipa::path(
    post,
    path = "/api/v1/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session issued"),
        (status = 401, description = "Unknown email or password"),
        (status = 500, description = "Internal server error")
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<LoginRequest>,
) -> Result<ApiResponse<SessionResponse>, ApiError> {
    let copytrader = state
        .copytrader_service
        .verify_credentials(&request.email, &request.password)
        .await
        .map_err(ApiError::Common)?;

    let session = state.sessions.issue(
        copytrader.id,
        Role::Copytrader,
        Some(copytrader.email.clone()),
    );

    info!("Issued copytrader session for {}", copytrader.id);

    Ok(ApiResponse::new(SessionResponse {
        token: session.token,
        role: session.role,
        expires_at: session.expires_at,
    }))
}

/// Log in as the platform admin with the managed API key
#[utoipa::path(
    post,
    path = "/api/v1/auth/admin",
    request_body = AdminLoginRequest,
    responses(
        (status = 200, description = "Session issued"),
        (status = 401, description = "Invalid API key"),
        (status = 500, description = "Admin login not configured")
    ),
    tag = "auth"
)]
pub async fn admin_login(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AdminLoginRequest>,
) -> Result<ApiResponse<SessionResponse>, ApiError> {
    let expected = state
        .config
        .admin_api_key
        .as_deref()
        .ok_or_else(|| ApiError::Internal("Admin login is not configured".to_string()))?;

    if request.api_key != expected {
        return Err(ApiError::Unauthorized("Invalid API key".to_string()));
    }

    let session = state.sessions.issue(
        state.config.admin_user_id,
        Role::Admin,
        state.config.admin_email.clone(),
    );

    info!("Issued admin session");

    Ok(ApiResponse::new(SessionResponse {
        token: session.token,
        role: session.role,
        expires_at: session.expires_at,
    }))
}

/// Revoke the presented session
#[utoipa::path(
    post,
    path = "/api/v1/auth/logout",
    responses(
        (status = 200, description = "Session revoked"),
        (status = 401, description = "No valid session presented")
    ),
    tag = "auth"
)]
pub async fn logout(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<ApiResponse<serde_json::Value>, ApiError> {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .and_then(|v| v.parse::<Uuid>().ok())
        .ok_or_else(|| ApiError::Unauthorized("Missing bearer token".to_string()))?;

    if !state.sessions.revoke(token) {
        return Err(ApiError::Unauthorized("Unknown session".to_string()));
    }

    Ok(ApiResponse::new(serde_json::json!({ "logged_out": true })))
}

//! Deposit and withdrawal API handlers
//!
//! Creation inserts a pending row, records a notification, invalidates the
//! cached listings, and emails a receipt to the authenticated user's
//! registered address. The receipt is best-effort: the transfer is already
//! persisted, so a mail failure logs a warning instead of failing the call.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    Json,
};
use common::decimal::Amount;
use common::model::notification::NotificationKind;
use common::model::transfer::{Transfer, TransferDirection};
use ledger_service::NewTransfer;
use serde::Deserialize;
use tracing::warn;
use utoipa::ToSchema;
use view_cache::CacheKey;

use crate::api::response::{ApiListResponse, ApiResponse};
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::AppState;

/// Cache collection for deposit listings
const DEPOSITS: &str = "deposits";
/// Cache collection for withdrawal listings
const WITHDRAWALS: &str = "withdrawals";
/// Cache collection for the merged recent-transfer view
const TRANSFERS: &str = "transfers";
/// Cache collection for notification listings
const NOTIFICATIONS: &str = "notifications";

/// Create transfer request
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateTransferRequest {
    /// Transfer amount
    pub amount: Amount,
    /// Currency code (e.g., "USDT")
    pub currency: String,
    /// Destination or source wallet address
    pub wallet_address: String,
}

impl From<CreateTransferRequest> for NewTransfer {
    fn from(request: CreateTransferRequest) -> Self {
        Self {
            amount: request.amount,
            currency: request.currency,
            wallet_address: request.wallet_address,
        }
    }
}

/// Listing query parameters
#[derive(Debug, Deserialize, ToSchema)]
pub struct ListQuery {
    /// Maximum number of rows to return
    pub limit: Option<usize>,
}

async fn create_transfer(
    state: Arc<AppState>,
    user: AuthUser,
    direction: TransferDirection,
    request: CreateTransferRequest,
) -> Result<ApiResponse<Transfer>, ApiError> {
    let service = &state.ledger_service;
    let transfer = match direction {
        TransferDirection::Deposit => service.create_deposit(user.user_id, request.into()).await,
        TransferDirection::Withdrawal => {
            service.create_withdrawal(user.user_id, request.into()).await
        }
    }
    .map_err(ApiError::Common)?;

    state
        .platform_service
        .notify(
            user.user_id,
            match direction {
                TransferDirection::Deposit => "Deposit submitted",
                TransferDirection::Withdrawal => "Withdrawal submitted",
            },
            format!(
                "{} of {} {} is pending review",
                transfer.direction.as_str(),
                transfer.amount,
                transfer.currency
            ),
            NotificationKind::Transfer,
        )
        .await
        .map_err(ApiError::Common)?;

    // List keys carry the requested limit, so drop every variant by prefix
    let owner = user.user_id.to_string();
    let collection = match direction {
        TransferDirection::Deposit => DEPOSITS,
        TransferDirection::Withdrawal => WITHDRAWALS,
    };
    state.cache.invalidate_prefix(collection, &owner).await;
    state.cache.invalidate_prefix(TRANSFERS, &owner).await;
    state.cache.invalidate_prefix(NOTIFICATIONS, &owner).await;

    // Receipt goes to the user's registered address, not a fixed operator
    match &user.email {
        Some(email) => {
            if let Err(e) = state.mailer.send_transfer_receipt(email, &transfer).await {
                warn!("Failed to send receipt for transfer {}: {}", transfer.id, e);
            }
        }
        None => warn!(
            "No registered email for user {}, skipping receipt",
            user.user_id
        ),
    }

    Ok(ApiResponse::new(transfer))
}

/// Submit a deposit
#[utoipa::path(
    post,
    path = "/api/v1/deposits",
    request_body = CreateTransferRequest,
    responses(
        (status = 200, description = "Deposit submitted"),
        (status = 400, description = "Invalid transfer"),
        (status = 401, description = "Not authenticated"),
        (status = 500, description = "Internal server error")
    ),
    tag = "transfers"
)]
pub async fn create_deposit(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(request): Json<CreateTransferRequest>,
) -> Result<ApiResponse<Transfer>, ApiError> {
    create_transfer(state, user, TransferDirection::Deposit, request).await
}

/// Submit a withdrawal
#[utoipa::path(
    post,
    path = "/api/v1/withdrawals",
    request_body = CreateTransferRequest,
    responses(
        (status = 200, description = "Withdrawal submitted"),
        (status = 400, description = "Invalid transfer"),
        (status = 401, description = "Not authenticated"),
        (status = 500, description = "Internal server error")
    ),
    tag = "transfers"
)]
pub async fn create_withdrawal(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(request): Json<CreateTransferRequest>,
) -> Result<ApiResponse<Transfer>, ApiError> {
    create_transfer(state, user, TransferDirection::Withdrawal, request).await
}

/// List the authenticated user's deposits
#[utoipa::path(
    get,
    path = "/api/v1/deposits",
    params(
        ("limit" = Option<usize>, Query, description = "Maximum rows to return")
    ),
    responses(
        (status = 200, description = "Deposits retrieved successfully"),
        (status = 401, description = "Not authenticated"),
        (status = 500, description = "Internal server error")
    ),
    tag = "transfers"
)]
pub async fn list_deposits(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<ApiListResponse<Transfer>, ApiError> {
    let limit = query.limit.unwrap_or(ledger_service::service::DEFAULT_LIST_LIMIT);
    let key = CacheKey::entry(DEPOSITS, format!("{}/{}", user.user_id, limit));
    let transfers = state
        .cache
        .get_or_load(key, || async {
            state.ledger_service.list_deposits(user.user_id, limit).await
        })
        .await
        .map_err(ApiError::Common)?;

    Ok(ApiListResponse::new((*transfers).clone()))
}

/// List the authenticated user's withdrawals
#[utoipa::path(
    get,
    path = "/api/v1/withdrawals",
    params(
        ("limit" = Option<usize>, Query, description = "Maximum rows to return")
    ),
    responses(
        (status = 200, description = "Withdrawals retrieved successfully"),
        (status = 401, description = "Not authenticated"),
        (status = 500, description = "Internal server error")
    ),
    tag = "transfers"
)]
pub async fn list_withdrawals(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<ApiListResponse<Transfer>, ApiError> {
    let limit = query.limit.unwrap_or(ledger_service::service::DEFAULT_LIST_LIMIT);
    let key = CacheKey::entry(WITHDRAWALS, format!("{}/{}", user.user_id, limit));
    let transfers = state
        .cache
        .get_or_load(key, || async {
            state
                .ledger_service
                .list_withdrawals(user.user_id, limit)
                .await
        })
        .await
        .map_err(ApiError::Common)?;

    Ok(ApiListResponse::new((*transfers).clone()))
}

/// Most recent transfers across both directions
#[utoipa::path(
    get,
    path = "/api/v1/transfers/recent",
    params(
        ("limit" = Option<usize>, Query, description = "Maximum rows to return")
    ),
    responses(
        (status = 200, description = "Transfers retrieved successfully"),
        (status = 401, description = "Not authenticated"),
        (status = 500, description = "Internal server error")
    ),
    tag = "transfers"
)]
pub async fn recent_transfers(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Query(query): Query<ListQuery>,
) -> Result<ApiListResponse<Transfer>, ApiError> {
    let limit = query.limit.unwrap_or(ledger_service::service::DEFAULT_LIST_LIMIT);
    let key = CacheKey::entry(TRANSFERS, format!("{}/{}", user.user_id, limit));
    let transfers = state
        .cache
        .get_or_load(key, || async {
            state
                .ledger_service
                .recent_transfers(user.user_id, limit)
                .await
        })
        .await
        .map_err(ApiError::Common)?;

    Ok(ApiListResponse::new((*transfers).clone()))
}

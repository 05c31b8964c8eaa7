//! System funds API handlers

use std::sync::Arc;

use axum::extract::State;
use common::model::funds::SystemFunds;
use view_cache::CacheKey;

use crate::api::response::ApiResponse;
use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::AppState;

/// Cache collection for fund balances
const FUNDS: &str = "funds";

/// Get the authenticated user's balance figures
///
/// Users with no stored balance row see zeros. Read-only: balances are
/// mutated only by out-of-band backend processes.
#[utoipa::path(
    get,
    path = "/api/v1/funds",
    responses(
        (status = 200, description = "Balances retrieved successfully"),
        (status = 401, description = "Not authenticated"),
        (status = 500, description = "Internal server error")
    ),
    tag = "funds"
)]
pub async fn get_funds(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<ApiResponse<SystemFunds>, ApiError> {
    let key = CacheKey::entry(FUNDS, user.user_id);
    let funds = state
        .cache
        .get_or_load(key, || async {
            state.ledger_service.get_funds(user.user_id).await
        })
        .await
        .map_err(ApiError::Common)?;

    Ok(ApiResponse::new((*funds).clone()))
}

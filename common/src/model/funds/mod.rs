//! System funds model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Amount;
#[cfg(feature = "utoipa")]
use crate::utoipa::ToSchema;

/// Per-user aggregate balance figures
///
/// Read-only through the API; mutated only by out-of-band backend processes
/// (and by test fixtures).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct SystemFunds {
    /// Owning user ID
    pub user_id: Uuid,
    /// Main system fund balance
    pub system_fund: Amount,
    /// Contract fund balance
    pub contract_fund: Amount,
    /// Accumulated trading profit
    pub accumulated_profit: Amount,
    /// Funds available for withdrawal
    pub withdrawable: Amount,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl SystemFunds {
    /// Zero balances for a user with no stored row
    pub fn zeroed(user_id: Uuid) -> Self {
        Self {
            user_id,
            system_fund: Amount::ZERO,
            contract_fund: Amount::ZERO,
            accumulated_profit: Amount::ZERO,
            withdrawable: Amount::ZERO,
            updated_at: Utc::now(),
        }
    }
}

//! Deposit and withdrawal models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::Amount;
use crate::error::{Error, Result};
#[cfg(feature = "utoipa")]
use crate::utoipa::ToSchema;

/// Direction of a funds transfer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub enum TransferDirection {
    Deposit,
    Withdrawal,
}

impl TransferDirection {
    /// Storage discriminant
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferDirection::Deposit => "deposit",
            TransferDirection::Withdrawal => "withdrawal",
        }
    }

    /// Parse a storage discriminant
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "deposit" => Ok(TransferDirection::Deposit),
            "withdrawal" => Ok(TransferDirection::Withdrawal),
            other => Err(Error::ValidationError(format!(
                "Unknown transfer direction: {}",
                other
            ))),
        }
    }
}

/// Transfer processing status
///
/// The API only ever creates Pending rows; later transitions happen
/// out-of-band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub enum TransferStatus {
    Pending,
    Confirmed,
    Rejected,
}

impl TransferStatus {
    /// Storage discriminant
    pub fn as_str(&self) -> &'static str {
        match self {
            TransferStatus::Pending => "pending",
            TransferStatus::Confirmed => "confirmed",
            TransferStatus::Rejected => "rejected",
        }
    }

    /// Parse a storage discriminant
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(TransferStatus::Pending),
            "confirmed" => Ok(TransferStatus::Confirmed),
            "rejected" => Ok(TransferStatus::Rejected),
            other => Err(Error::ValidationError(format!(
                "Unknown transfer status: {}",
                other
            ))),
        }
    }
}

/// A deposit or withdrawal row
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct Transfer {
    /// Unique transfer ID
    pub id: Uuid,
    /// Owning user ID
    pub user_id: Uuid,
    /// Deposit or withdrawal
    pub direction: TransferDirection,
    /// Transfer amount
    pub amount: Amount,
    /// Currency code (e.g., "USDT")
    pub currency: String,
    /// Destination or source wallet address
    pub wallet_address: String,
    /// Processing status
    pub status: TransferStatus,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Transfer {
    /// Create a new pending transfer
    pub fn new(
        user_id: Uuid,
        direction: TransferDirection,
        amount: Amount,
        currency: String,
        wallet_address: String,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            direction,
            amount,
            currency,
            wallet_address,
            status: TransferStatus::Pending,
            created_at: Utc::now(),
        }
    }
}

//! Copytrader models and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::{Amount, Percent};
use crate::error::{Error, Result};
#[cfg(feature = "utoipa")]
use crate::utoipa::ToSchema;

/// Copytrader profile
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct Copytrader {
    /// Unique copytrader ID
    pub id: Uuid,
    /// Owning user ID
    pub user_id: Uuid,
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
    /// PBKDF2-SHA256 password hash, hex-encoded (absent until credentials are set)
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Copytrader {
    /// Create a new active profile without credentials
    pub fn new(user_id: Uuid, display_name: String, email: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            display_name,
            email,
            phone: None,
            is_active: true,
            description: None,
            password_hash: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Channel used to notify a copytrader
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub enum NotifyChannel {
    Email,
    Sms,
    None,
}

impl NotifyChannel {
    /// Storage discriminant
    pub fn as_str(&self) -> &'static str {
        match self {
            NotifyChannel::Email => "email",
            NotifyChannel::Sms => "sms",
            NotifyChannel::None => "none",
        }
    }

    /// Parse a storage discriminant
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "email" => Ok(NotifyChannel::Email),
            "sms" => Ok(NotifyChannel::Sms),
            "none" => Ok(NotifyChannel::None),
            other => Err(Error::ValidationError(format!(
                "Unknown notify channel: {}",
                other
            ))),
        }
    }
}

/// Per-copytrader settings, one row per copytrader (upsert keyed by `copytrader_id`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct CopytraderSettings {
    /// Copytrader the settings belong to
    pub copytrader_id: Uuid,
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
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl CopytraderSettings {
    /// Default settings for a copytrader with no stored row
    pub fn defaults(copytrader_id: Uuid) -> Self {
        Self {
            copytrader_id,
            profit_share_pct: Percent::ZERO,
            budget: Amount::ZERO,
            payout_wallet: String::new(),
            notify_channel: NotifyChannel::Email,
            subscription_until: None,
            updated_at: Utc::now(),
        }
    }
}

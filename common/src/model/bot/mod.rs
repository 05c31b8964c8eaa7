//! Bot models and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::decimal::{Amount, Percent};
use crate::error::{Error, Result};
#[cfg(feature = "utoipa")]
use crate::utoipa::ToSchema;

/// Bot flavor: plain trading bot or contract-arbitrage bot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub enum BotKind {
    /// Standard trading bot, supports start/stop/status
    Trading,
    /// Contract-arbitrage bot, supports only start/stop
    Contract,
}

impl BotKind {
    /// Storage discriminant
    pub fn as_str(&self) -> &'static str {
        match self {
            BotKind::Trading => "trading",
            BotKind::Contract => "contract",
        }
    }

    /// Parse a storage discriminant
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "trading" => Ok(BotKind::Trading),
            "contract" => Ok(BotKind::Contract),
            other => Err(Error::ValidationError(format!("Unknown bot kind: {}", other))),
        }
    }
}

/// Bot lifecycle status
///
/// State and failure reason are mutually exclusive by construction: a bot is
/// either stopped, running, or failed with a reason. There is no orthogonal
/// error column that can disagree with the status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub enum BotStatus {
    /// Bot is idle; the default for newly created bots
    Stopped,
    /// Bot is marked active
    Running,
    /// Bot halted with a failure reason
    Failed {
        /// Human-readable failure description
        reason: String,
    },
}

impl BotStatus {
    /// Storage discriminant for the status column
    pub fn as_str(&self) -> &'static str {
        match self {
            BotStatus::Stopped => "stopped",
            BotStatus::Running => "running",
            BotStatus::Failed { .. } => "failed",
        }
    }

    /// Failure reason, if any
    pub fn reason(&self) -> Option<&str> {
        match self {
            BotStatus::Failed { reason } => Some(reason),
            _ => None,
        }
    }

    /// Whether the bot is currently marked active
    pub fn is_running(&self) -> bool {
        matches!(self, BotStatus::Running)
    }

    /// Rebuild a status from its storage columns
    pub fn from_columns(status: &str, reason: Option<String>) -> Result<Self> {
        match status {
            "stopped" => Ok(BotStatus::Stopped),
            "running" => Ok(BotStatus::Running),
            "failed" => Ok(BotStatus::Failed {
                reason: reason.unwrap_or_else(|| "unknown failure".to_string()),
            }),
            other => Err(Error::Internal(format!("Unknown bot status: {}", other))),
        }
    }
}

/// Bot model
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct Bot {
    /// Unique bot ID
    pub id: Uuid,
    /// Owning user ID
    pub user_id: Uuid,
    /// Display name
    pub name: String,
    /// Trading pair symbol (e.g., "EUR/USD")
    pub pair: String,
    /// Bot flavor
    pub kind: BotKind,
    /// Current lifecycle status
    pub status: BotStatus,
    /// Risk level (1..=10)
    pub risk_level: i16,
    /// Maximum tolerated drawdown in percent
    pub max_drawdown_pct: Percent,
    /// Profit target in percent
    pub profit_target_pct: Percent,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Bot {
    /// Create a new bot in the default Stopped state
    pub fn new(
        user_id: Uuid,
        name: String,
        pair: String,
        kind: BotKind,
        risk_level: i16,
        max_drawdown_pct: Percent,
        profit_target_pct: Percent,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            user_id,
            name,
            pair,
            kind,
            status: BotStatus::Stopped,
            risk_level,
            max_drawdown_pct,
            profit_target_pct,
            created_at: now,
            updated_at: now,
        }
    }
}

/// One simulated trade attributed to a bot
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct BotTrade {
    /// Unique trade ID
    pub id: Uuid,
    /// Bot that produced the trade
    pub bot_id: Uuid,
    /// Pair traded
    pub pair: String,
    /// Trade amount
    pub amount: Amount,
    /// Realized profit (negative for a loss)
    pub profit: Amount,
    /// Execution timestamp
    pub executed_at: DateTime<Utc>,
}

/// Aggregate performance metrics derived from a bot's trades
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct BotMetrics {
    /// Total number of recorded trades
    pub total_trades: u64,
    /// Share of profitable trades in percent
    pub win_rate_pct: Percent,
    /// Net profit over all recorded trades
    pub profit: Amount,
}

impl BotMetrics {
    /// Derive metrics from a trade list
    pub fn from_trades(trades: &[BotTrade]) -> Self {
        let total_trades = trades.len() as u64;
        let winners = trades.iter().filter(|t| t.profit > Amount::ZERO).count() as u64;
        let profit: Amount = trades.iter().map(|t| t.profit).sum();
        let win_rate_pct = if total_trades > 0 {
            Percent::from(winners * 100) / Percent::from(total_trades)
        } else {
            Percent::ZERO
        };

        Self {
            total_trades,
            win_rate_pct,
            profit,
        }
    }
}

/// Snapshot returned by the bot status operation
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct BotSnapshot {
    /// Current lifecycle status
    pub status: BotStatus,
    /// Aggregate performance metrics
    pub performance_metrics: BotMetrics,
    /// Most recent trades, newest first
    pub recent_trades: Vec<BotTrade>,
}

//! Bot service implementation
//!
//! Translates a user's lifecycle intent (start/stop) into a single
//! owner-scoped status update. No retry, no backoff, no idempotency key:
//! a duplicate call re-applies the same status write, which is idempotent
//! by construction.

use std::sync::Arc;

use common::decimal::Percent;
use common::error::{Error, ErrorExt, Result};
use common::model::bot::{Bot, BotKind, BotMetrics, BotSnapshot, BotStatus, BotTrade};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::repository::{BotRepository, InMemoryBotRepository, PostgresBotRepository};

/// How many trades the status snapshot includes
const SNAPSHOT_TRADES: usize = 20;

/// Bot service for managing bot rows and their lifecycle
pub struct BotService {
    /// Repository for bot data
    repo: Arc<dyn BotRepository>,
}

/// Repository Type
pub enum RepositoryType {
    /// In-memory repository
    InMemory,
    /// PostgreSQL repository
    Postgres(Option<String>),
}

/// Parameters for creating a bot
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBot {
    /// Display name
    pub name: String,
    /// Trading pair symbol
    pub pair: String,
    /// Bot flavor
    pub kind: BotKind,
    /// Risk level (1..=10)
    pub risk_level: i16,
    /// Maximum tolerated drawdown in percent
    pub max_drawdown_pct: Percent,
    /// Profit target in percent
    pub profit_target_pct: Percent,
}

impl NewBot {
    fn validate(&self) -> Result<()> {
        if self.name.trim().is_empty() {
            return Err(Error::ValidationError("Bot name must not be empty".to_string()));
        }
        if self.name.len() > 64 {
            return Err(Error::ValidationError(
                "Bot name must be at most 64 characters".to_string(),
            ));
        }
        if self.pair.trim().is_empty() {
            return Err(Error::ValidationError("Trading pair must not be empty".to_string()));
        }
        if !(1..=10).contains(&self.risk_level) {
            return Err(Error::ValidationError(
                "Risk level must be between 1 and 10".to_string(),
            ));
        }
        if self.max_drawdown_pct < Percent::ZERO || self.profit_target_pct < Percent::ZERO {
            return Err(Error::ValidationError(
                "Percentages must not be negative".to_string(),
            ));
        }
        Ok(())
    }
}

impl BotService {
    /// Create a new bot service backed by an in-memory repository
    pub fn new() -> Self {
        Self {
            repo: Arc::new(InMemoryBotRepository::new()),
        }
    }

    /// Create a new bot service with a specific repository type
    pub async fn with_repository(repo_type: RepositoryType) -> Result<Self> {
        let repo: Arc<dyn BotRepository> = match repo_type {
            RepositoryType::InMemory => Arc::new(InMemoryBotRepository::new()),
            RepositoryType::Postgres(database_url) => {
                Arc::new(PostgresBotRepository::new(database_url).await?)
            }
        };

        Ok(Self { repo })
    }

    /// Create a new bot service with a configuration
    pub async fn with_config(config: &crate::config::BotServiceConfig) -> Result<Self> {
        let repo: Arc<dyn BotRepository> = Arc::new(PostgresBotRepository::with_config(config).await?);

        Ok(Self { repo })
    }

    /// Create a new bot in the default Stopped state
    pub async fn create_bot(&self, user_id: Uuid, new_bot: NewBot) -> Result<Bot> {
        new_bot.validate()?;

        info!("Creating {} bot '{}' for user {}", new_bot.kind.as_str(), new_bot.name, user_id);

        let bot = Bot::new(
            user_id,
            new_bot.name,
            new_bot.pair,
            new_bot.kind,
            new_bot.risk_level,
            new_bot.max_drawdown_pct,
            new_bot.profit_target_pct,
        );

        self.repo.create_bot(bot).await
    }

    /// Get a bot by owner and ID
    pub async fn get_bot(&self, user_id: Uuid, id: Uuid) -> Result<Option<Bot>> {
        self.repo.get_bot(user_id, id).await
    }

    /// List an owner's bots, optionally filtered by kind
    pub async fn list_bots(&self, user_id: Uuid, kind: Option<BotKind>) -> Result<Vec<Bot>> {
        self.repo.list_bots(user_id, kind).await
    }

    /// Delete a bot
    pub async fn delete_bot(&self, user_id: Uuid, id: Uuid) -> Result<()> {
        let removed = self
            .repo
            .delete_bot(user_id, id)
            .await
            .with_context(|| format!("Failed to delete bot {}", id))?;

        if !removed {
            return Err(Error::BotNotFound(id.to_string()));
        }

        info!("Deleted bot {} for user {}", id, user_id);
        Ok(())
    }

    /// Start a bot
    ///
    /// Starting from Failed clears the failure reason. Starting a running
    /// bot is a no-op success.
    pub async fn start(&self, user_id: Uuid, id: Uuid) -> Result<String> {
        let bot = self
            .repo
            .get_bot(user_id, id)
            .await?
            .ok_or_else(|| Error::BotNotFound(id.to_string()))?;

        if bot.status.is_running() {
            return Ok(format!("Bot '{}' is already running", bot.name));
        }

        let updated = self
            .repo
            .set_status(user_id, id, &BotStatus::Running)
            .await?
            .ok_or_else(|| Error::BotNotFound(id.to_string()))?;

        info!("Started bot {} ('{}')", updated.id, updated.name);
        Ok(format!("Bot '{}' started successfully", updated.name))
    }

    /// Stop a bot
    ///
    /// Stopping a stopped bot is a no-op success; calling stop twice leaves
    /// the status at Stopped and produces no duplicate error.
    pub async fn stop(&self, user_id: Uuid, id: Uuid) -> Result<String> {
        let bot = self
            .repo
            .get_bot(user_id, id)
            .await?
            .ok_or_else(|| Error::BotNotFound(id.to_string()))?;

        if bot.status == BotStatus::Stopped {
            return Ok(format!("Bot '{}' is already stopped", bot.name));
        }

        let updated = self
            .repo
            .set_status(user_id, id, &BotStatus::Stopped)
            .await?
            .ok_or_else(|| Error::BotNotFound(id.to_string()))?;

        info!("Stopped bot {} ('{}')", updated.id, updated.name);
        Ok(format!("Bot '{}' stopped successfully", updated.name))
    }

    /// Move a bot to the Failed state with a reason
    pub async fn record_failure(&self, user_id: Uuid, id: Uuid, reason: String) -> Result<Bot> {
        let status = BotStatus::Failed { reason };
        self.repo
            .set_status(user_id, id, &status)
            .await?
            .ok_or_else(|| Error::BotNotFound(id.to_string()))
    }

    /// Current status plus performance snapshot
    ///
    /// Only trading bots support this; contract bots expose start/stop only.
    pub async fn status(&self, user_id: Uuid, id: Uuid) -> Result<BotSnapshot> {
        let bot = self
            .repo
            .get_bot(user_id, id)
            .await?
            .ok_or_else(|| Error::BotNotFound(id.to_string()))?;

        if bot.kind != BotKind::Trading {
            return Err(Error::ValidationError(
                "Status is not supported for contract bots".to_string(),
            ));
        }

        let recent_trades = self.repo.recent_trades(id, SNAPSHOT_TRADES).await?;
        let performance_metrics = BotMetrics::from_trades(&recent_trades);

        Ok(BotSnapshot {
            status: bot.status,
            performance_metrics,
            recent_trades,
        })
    }

    /// Record a simulated trade for a bot (fixtures and out-of-band writers)
    pub async fn record_trade(&self, user_id: Uuid, trade: BotTrade) -> Result<BotTrade> {
        // The trade must target a bot the caller owns
        let _bot = self
            .repo
            .get_bot(user_id, trade.bot_id)
            .await?
            .ok_or_else(|| Error::BotNotFound(trade.bot_id.to_string()))?;

        self.repo.record_trade(trade).await
    }
}

impl Default for BotService {
    fn default() -> Self {
        Self::new()
    }
}

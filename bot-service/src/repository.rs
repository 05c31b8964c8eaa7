//! Repository for bot data

use async_trait::async_trait;
use chrono::Utc;
use common::db::{InMemoryTransactionManager, PgTransactionManager};
use common::decimal::{Amount, Percent};
use common::error::{Error, Result};
use common::model::bot::{Bot, BotKind, BotStatus, BotTrade};
use common::{DBTransaction, TransactionManager};
use dashmap::DashMap;
use sqlx::{postgres::PgPoolOptions, PgPool, Row};
use tracing::{debug, info};
use uuid::Uuid;

/// Bot repository trait defining the interface for bot data storage
///
/// Every accessor is scoped by the owning user; a row owned by someone else
/// is indistinguishable from a missing row.
#[async_trait]
pub trait BotRepository: Send + Sync {
    /// Get the transaction manager
    fn transaction_manager(&self) -> &dyn TransactionManager;

    /// Insert a new bot row
    async fn create_bot(&self, bot: Bot) -> Result<Bot>;

    /// Get a bot by owner and ID
    async fn get_bot(&self, user_id: Uuid, id: Uuid) -> Result<Option<Bot>>;

    /// List an owner's bots, optionally filtered by kind, newest first
    async fn list_bots(&self, user_id: Uuid, kind: Option<BotKind>) -> Result<Vec<Bot>>;

    /// Set a bot's status; returns the updated row, or None if not found
    async fn set_status(&self, user_id: Uuid, id: Uuid, status: &BotStatus) -> Result<Option<Bot>>;

    /// Delete a bot; returns whether a row was removed
    async fn delete_bot(&self, user_id: Uuid, id: Uuid) -> Result<bool>;

    /// Record a simulated trade for a bot
    async fn record_trade(&self, trade: BotTrade) -> Result<BotTrade>;

    /// Most recent trades for a bot, newest first
    async fn recent_trades(&self, bot_id: Uuid, limit: usize) -> Result<Vec<BotTrade>>;

    /// Begin a database transaction
    async fn begin_transaction(&self) -> Result<DBTransaction> {
        self.transaction_manager().begin_transaction().await
    }
}

/// In-memory repository for bot data
pub struct InMemoryBotRepository {
    /// Bots by ID
    pub bots: DashMap<Uuid, Bot>,
    /// Trades by bot ID
    pub trades: DashMap<Uuid, Vec<BotTrade>>,
    /// Transaction manager
    transaction_manager: InMemoryTransactionManager,
}

impl InMemoryBotRepository {
    /// Create a new in-memory bot repository
    pub fn new() -> Self {
        Self {
            bots: DashMap::new(),
            trades: DashMap::new(),
            transaction_manager: InMemoryTransactionManager::new(),
        }
    }
}

impl Default for InMemoryBotRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl BotRepository for InMemoryBotRepository {
    fn transaction_manager(&self) -> &dyn TransactionManager {
        &self.transaction_manager
    }

    async fn create_bot(&self, bot: Bot) -> Result<Bot> {
        self.bots.insert(bot.id, bot.clone());
        Ok(bot)
    }

    async fn get_bot(&self, user_id: Uuid, id: Uuid) -> Result<Option<Bot>> {
        Ok(self
            .bots
            .get(&id)
            .filter(|b| b.user_id == user_id)
            .map(|b| b.clone()))
    }

    async fn list_bots(&self, user_id: Uuid, kind: Option<BotKind>) -> Result<Vec<Bot>> {
        let mut bots: Vec<Bot> = self
            .bots
            .iter()
            .filter(|b| b.user_id == user_id && kind.map_or(true, |k| b.kind == k))
            .map(|b| b.clone())
            .collect();

        bots.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(bots)
    }

    async fn set_status(&self, user_id: Uuid, id: Uuid, status: &BotStatus) -> Result<Option<Bot>> {
        match self.bots.get_mut(&id) {
            Some(mut entry) if entry.user_id == user_id => {
                entry.status = status.clone();
                entry.updated_at = Utc::now();
                Ok(Some(entry.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn delete_bot(&self, user_id: Uuid, id: Uuid) -> Result<bool> {
        let owned = self
            .bots
            .get(&id)
            .map(|b| b.user_id == user_id)
            .unwrap_or(false);

        if !owned {
            return Ok(false);
        }

        self.bots.remove(&id);
        self.trades.remove(&id);
        Ok(true)
    }

    async fn record_trade(&self, trade: BotTrade) -> Result<BotTrade> {
        self.trades
            .entry(trade.bot_id)
            .or_default()
            .push(trade.clone());
        Ok(trade)
    }

    async fn recent_trades(&self, bot_id: Uuid, limit: usize) -> Result<Vec<BotTrade>> {
        Ok(self
            .trades
            .get(&bot_id)
            .map(|trades| {
                let mut result = trades.clone();
                result.sort_by(|a, b| b.executed_at.cmp(&a.executed_at)); // Newest first
                result.truncate(limit);
                result
            })
            .unwrap_or_default())
    }
}

/// PostgreSQL repository for bot data
pub struct PostgresBotRepository {
    /// Database connection pool
    pool: PgPool,
    /// Transaction manager
    transaction_manager: PgTransactionManager,
}

impl PostgresBotRepository {
    /// Create a new PostgreSQL bot repository
    pub async fn new(database_url: Option<String>) -> Result<Self> {
        let url = match database_url {
            Some(url) => url,
            None => std::env::var("DATABASE_URL")
                .map_err(|_| Error::ConfigurationError("DATABASE_URL must be set".to_string()))?,
        };

        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(&url)
            .await
            .map_err(Error::Database)?;

        info!("Connected to PostgreSQL database");

        Ok(Self {
            transaction_manager: PgTransactionManager::new(pool.clone()),
            pool,
        })
    }

    /// Create a new PostgreSQL bot repository with configuration
    pub async fn with_config(config: &crate::config::BotServiceConfig) -> Result<Self> {
        info!(
            "Connecting to PostgreSQL database with pool size: {}",
            config.db_pool_size
        );

        let pool = PgPoolOptions::new()
            .max_connections(config.db_pool_size)
            .connect(&config.database_url)
            .await
            .map_err(Error::Database)?;

        Ok(Self {
            transaction_manager: PgTransactionManager::new(pool.clone()),
            pool,
        })
    }

    /// Convert a bots row to a Bot
    fn bot_from_row(row: &sqlx::postgres::PgRow) -> Result<Bot> {
        let kind_str: String = row.get("kind");
        let status_str: String = row.get("status");
        let status_reason: Option<String> = row.get("status_reason");
        let max_drawdown_str: String = row.get("max_drawdown_pct");
        let profit_target_str: String = row.get("profit_target_pct");

        let max_drawdown_pct = max_drawdown_str
            .parse::<Percent>()
            .map_err(|e| Error::Internal(format!("Invalid max drawdown format: {}", e)))?;
        let profit_target_pct = profit_target_str
            .parse::<Percent>()
            .map_err(|e| Error::Internal(format!("Invalid profit target format: {}", e)))?;

        Ok(Bot {
            id: row.get("id"),
            user_id: row.get("user_id"),
            name: row.get("name"),
            pair: row.get("pair"),
            kind: BotKind::parse(&kind_str)?,
            status: BotStatus::from_columns(&status_str, status_reason)?,
            risk_level: row.get("risk_level"),
            max_drawdown_pct,
            profit_target_pct,
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        })
    }

    /// Convert a bot_trades row to a BotTrade
    fn trade_from_row(row: &sqlx::postgres::PgRow) -> Result<BotTrade> {
        let amount_str: String = row.get("amount");
        let profit_str: String = row.get("profit");

        let amount = amount_str
            .parse::<Amount>()
            .map_err(|e| Error::Internal(format!("Invalid trade amount format: {}", e)))?;
        let profit = profit_str
            .parse::<Amount>()
            .map_err(|e| Error::Internal(format!("Invalid trade profit format: {}", e)))?;

        Ok(BotTrade {
            id: row.get("id"),
            bot_id: row.get("bot_id"),
            pair: row.get("pair"),
            amount,
            profit,
            executed_at: row.get("executed_at"),
        })
    }
}

#[async_trait]
impl BotRepository for PostgresBotRepository {
    fn transaction_manager(&self) -> &dyn TransactionManager {
        &self.transaction_manager
    }

    async fn create_bot(&self, bot: Bot) -> Result<Bot> {
        debug!("Creating bot {} for user {}", bot.id, bot.user_id);

        sqlx::query(
            "INSERT INTO bots (id, user_id, name, pair, kind, status, status_reason,
                               risk_level, max_drawdown_pct, profit_target_pct,
                               created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(bot.id)
        .bind(bot.user_id)
        .bind(&bot.name)
        .bind(&bot.pair)
        .bind(bot.kind.as_str())
        .bind(bot.status.as_str())
        .bind(bot.status.reason())
        .bind(bot.risk_level)
        .bind(bot.max_drawdown_pct.to_string())
        .bind(bot.profit_target_pct.to_string())
        .bind(bot.created_at)
        .bind(bot.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(bot)
    }

    async fn get_bot(&self, user_id: Uuid, id: Uuid) -> Result<Option<Bot>> {
        debug!("Getting bot {} for user {}", id, user_id);

        let row = sqlx::query(
            "SELECT id, user_id, name, pair, kind, status, status_reason,
                    risk_level, max_drawdown_pct, profit_target_pct, created_at, updated_at
             FROM bots
             WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(Self::bot_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_bots(&self, user_id: Uuid, kind: Option<BotKind>) -> Result<Vec<Bot>> {
        debug!("Listing bots for user {}", user_id);

        let rows = match kind {
            Some(kind) => {
                sqlx::query(
                    "SELECT id, user_id, name, pair, kind, status, status_reason,
                            risk_level, max_drawdown_pct, profit_target_pct, created_at, updated_at
                     FROM bots
                     WHERE user_id = $1 AND kind = $2
                     ORDER BY created_at DESC",
                )
                .bind(user_id)
                .bind(kind.as_str())
                .fetch_all(&self.pool)
                .await?
            }
            None => {
                sqlx::query(
                    "SELECT id, user_id, name, pair, kind, status, status_reason,
                            risk_level, max_drawdown_pct, profit_target_pct, created_at, updated_at
                     FROM bots
                     WHERE user_id = $1
                     ORDER BY created_at DESC",
                )
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?
            }
        };

        let mut bots = Vec::with_capacity(rows.len());
        for row in rows {
            bots.push(Self::bot_from_row(&row)?);
        }

        Ok(bots)
    }

    async fn set_status(&self, user_id: Uuid, id: Uuid, status: &BotStatus) -> Result<Option<Bot>> {
        debug!("Setting bot {} status to {}", id, status.as_str());

        // Last-write-wins column update, scoped by owner
        let row = sqlx::query(
            "UPDATE bots
             SET status = $3, status_reason = $4, updated_at = NOW()
             WHERE id = $1 AND user_id = $2
             RETURNING id, user_id, name, pair, kind, status, status_reason,
                       risk_level, max_drawdown_pct, profit_target_pct, created_at, updated_at",
        )
        .bind(id)
        .bind(user_id)
        .bind(status.as_str())
        .bind(status.reason())
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(Self::bot_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn delete_bot(&self, user_id: Uuid, id: Uuid) -> Result<bool> {
        debug!("Deleting bot {} for user {}", id, user_id);

        let result = sqlx::query("DELETE FROM bots WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn record_trade(&self, trade: BotTrade) -> Result<BotTrade> {
        sqlx::query(
            "INSERT INTO bot_trades (id, bot_id, pair, amount, profit, executed_at)
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(trade.id)
        .bind(trade.bot_id)
        .bind(&trade.pair)
        .bind(trade.amount.to_string())
        .bind(trade.profit.to_string())
        .bind(trade.executed_at)
        .execute(&self.pool)
        .await?;

        Ok(trade)
    }

    async fn recent_trades(&self, bot_id: Uuid, limit: usize) -> Result<Vec<BotTrade>> {
        let rows = sqlx::query(
            "SELECT id, bot_id, pair, amount, profit, executed_at
             FROM bot_trades
             WHERE bot_id = $1
             ORDER BY executed_at DESC
             LIMIT $2",
        )
        .bind(bot_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        let mut trades = Vec::with_capacity(rows.len());
        for row in rows {
            trades.push(Self::trade_from_row(&row)?);
        }

        Ok(trades)
    }
}

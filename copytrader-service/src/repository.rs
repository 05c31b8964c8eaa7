//! Repository for copytrader data

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use common::db::{InMemoryTransactionManager, PgTransactionManager};
use common::decimal::{Amount, Percent};
use common::error::{Error, Result};
use common::model::copytrader::{Copytrader, CopytraderSettings, NotifyChannel};
use common::{DBTransaction, TransactionManager};
use dashmap::DashMap;
use sqlx::{postgres::PgPoolOptions, PgPool, Row};
use tracing::{debug, info};
use uuid::Uuid;

/// Copytrader repository trait defining the interface for profile storage
#[async_trait]
pub trait CopytraderRepository: Send + Sync {
    /// Get the transaction manager
    fn transaction_manager(&self) -> &dyn TransactionManager;

    /// Insert a new copytrader profile
    async fn create_copytrader(&self, copytrader: Copytrader) -> Result<Copytrader>;

    /// Get a profile by owner and ID
    async fn get_copytrader(&self, user_id: Uuid, id: Uuid) -> Result<Option<Copytrader>>;

    /// Find a profile by contact email, regardless of owner (login path)
    async fn find_by_email(&self, email: &str) -> Result<Option<Copytrader>>;

    /// List an owner's profiles, newest first
    async fn list_copytraders(&self, user_id: Uuid) -> Result<Vec<Copytrader>>;

    /// Replace a profile's mutable fields; returns the updated row if found
    async fn update_copytrader(&self, copytrader: Copytrader) -> Result<Option<Copytrader>>;

    /// Delete a profile (and its settings row); returns whether a row was removed
    async fn delete_copytrader(&self, user_id: Uuid, id: Uuid) -> Result<bool>;

    /// Create or update the settings row keyed by copytrader ID
    async fn upsert_settings(&self, settings: CopytraderSettings) -> Result<CopytraderSettings>;

    /// Get the settings row for a copytrader, if one exists
    async fn get_settings(&self, copytrader_id: Uuid) -> Result<Option<CopytraderSettings>>;

    /// Begin a database transaction
    async fn begin_transaction(&self) -> Result<DBTransaction> {
        self.transaction_manager().begin_transaction().await
    }
}

/// In-memory repository for copytrader data
pub struct InMemoryCopytraderRepository {
    /// Profiles by ID
    pub copytraders: DashMap<Uuid, Copytrader>,
    /// Settings by copytrader ID
    pub settings: DashMap<Uuid, CopytraderSettings>,
    /// Transaction manager
    transaction_manager: InMemoryTransactionManager,
}

impl InMemoryCopytraderRepository {
    /// Create a new in-memory copytrader repository
    pub fn new() -> Self {
        Self {
            copytraders: DashMap::new(),
            settings: DashMap::new(),
            transaction_manager: InMemoryTransactionManager::new(),
        }
    }
}

impl Default for InMemoryCopytraderRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CopytraderRepository for InMemoryCopytraderRepository {
    fn transaction_manager(&self) -> &dyn TransactionManager {
        &self.transaction_manager
    }

    async fn create_copytrader(&self, copytrader: Copytrader) -> Result<Copytrader> {
        self.copytraders.insert(copytrader.id, copytrader.clone());
        Ok(copytrader)
    }

    async fn get_copytrader(&self, user_id: Uuid, id: Uuid) -> Result<Option<Copytrader>> {
        Ok(self
            .copytraders
            .get(&id)
            .filter(|c| c.user_id == user_id)
            .map(|c| c.clone()))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Copytrader>> {
        Ok(self
            .copytraders
            .iter()
            .find(|c| c.email == email)
            .map(|c| c.clone()))
    }

    async fn list_copytraders(&self, user_id: Uuid) -> Result<Vec<Copytrader>> {
        let mut profiles: Vec<Copytrader> = self
            .copytraders
            .iter()
            .filter(|c| c.user_id == user_id)
            .map(|c| c.clone())
            .collect();

        profiles.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(profiles)
    }

    async fn update_copytrader(&self, copytrader: Copytrader) -> Result<Option<Copytrader>> {
        match self.copytraders.get_mut(&copytrader.id) {
            Some(mut entry) if entry.user_id == copytrader.user_id => {
                *entry = copytrader.clone();
                Ok(Some(copytrader))
            }
            _ => Ok(None),
        }
    }

    async fn delete_copytrader(&self, user_id: Uuid, id: Uuid) -> Result<bool> {
        let owned = self
            .copytraders
            .get(&id)
            .map(|c| c.user_id == user_id)
            .unwrap_or(false);

        if !owned {
            return Ok(false);
        }

        self.copytraders.remove(&id);
        self.settings.remove(&id);
        Ok(true)
    }

    async fn upsert_settings(&self, settings: CopytraderSettings) -> Result<CopytraderSettings> {
        self.settings.insert(settings.copytrader_id, settings.clone());
        Ok(settings)
    }

    async fn get_settings(&self, copytrader_id: Uuid) -> Result<Option<CopytraderSettings>> {
        Ok(self.settings.get(&copytrader_id).map(|s| s.clone()))
    }
}

/// PostgreSQL repository for copytrader data
pub struct PostgresCopytraderRepository {
    /// Database connection pool
    pool: PgPool,
    /// Transaction manager
    transaction_manager: PgTransactionManager,
}

impl PostgresCopytraderRepository {
    /// Create a new PostgreSQL copytrader repository
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

    /// Create a new PostgreSQL copytrader repository with configuration
    pub async fn with_config(config: &crate::config::CopytraderServiceConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.db_pool_size)
            .connect(&config.database_url)
            .await
            .map_err(Error::Database)?;

        info!("Connected to PostgreSQL database");

        Ok(Self {
            transaction_manager: PgTransactionManager::new(pool.clone()),
            pool,
        })
    }

    /// Convert a copytraders row to a Copytrader
    fn copytrader_from_row(row: &sqlx::postgres::PgRow) -> Copytrader {
        Copytrader {
            id: row.get("id"),
            user_id: row.get("user_id"),
            display_name: row.get("display_name"),
            email: row.get("email"),
            phone: row.get("phone"),
            is_active: row.get("is_active"),
            description: row.get("description"),
            password_hash: row.get("password_hash"),
            created_at: row.get("created_at"),
            updated_at: row.get("updated_at"),
        }
    }

    /// Convert a copytrader_settings row to CopytraderSettings
    fn settings_from_row(row: &sqlx::postgres::PgRow) -> Result<CopytraderSettings> {
        let profit_share_str: String = row.get("profit_share_pct");
        let budget_str: String = row.get("budget");
        let channel_str: String = row.get("notify_channel");
        let subscription_until: Option<DateTime<Utc>> = row.get("subscription_until");

        let profit_share_pct = profit_share_str
            .parse::<Percent>()
            .map_err(|e| Error::Internal(format!("Invalid profit share format: {}", e)))?;
        let budget = budget_str
            .parse::<Amount>()
            .map_err(|e| Error::Internal(format!("Invalid budget format: {}", e)))?;

        Ok(CopytraderSettings {
            copytrader_id: row.get("copytrader_id"),
            profit_share_pct,
            budget,
            payout_wallet: row.get("payout_wallet"),
            notify_channel: NotifyChannel::parse(&channel_str)?,
            subscription_until,
            updated_at: row.get("updated_at"),
        })
    }
}

#[async_trait]
impl CopytraderRepository for PostgresCopytraderRepository {
    fn transaction_manager(&self) -> &dyn TransactionManager {
        &self.transaction_manager
    }

    async fn create_copytrader(&self, copytrader: Copytrader) -> Result<Copytrader> {
        debug!("Creating copytrader {} for user {}", copytrader.id, copytrader.user_id);

        sqlx::query(
            "INSERT INTO copytraders (id, user_id, display_name, email, phone, is_active,
                                      description, password_hash, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(copytrader.id)
        .bind(copytrader.user_id)
        .bind(&copytrader.display_name)
        .bind(&copytrader.email)
        .bind(&copytrader.phone)
        .bind(copytrader.is_active)
        .bind(&copytrader.description)
        .bind(&copytrader.password_hash)
        .bind(copytrader.created_at)
        .bind(copytrader.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(copytrader)
    }

    async fn get_copytrader(&self, user_id: Uuid, id: Uuid) -> Result<Option<Copytrader>> {
        let row = sqlx::query(
            "SELECT id, user_id, display_name, email, phone, is_active, description,
                    password_hash, created_at, updated_at
             FROM copytraders
             WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| Self::copytrader_from_row(&row)))
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<Copytrader>> {
        let row = sqlx::query(
            "SELECT id, user_id, display_name, email, phone, is_active, description,
                    password_hash, created_at, updated_at
             FROM copytraders
             WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| Self::copytrader_from_row(&row)))
    }

    async fn list_copytraders(&self, user_id: Uuid) -> Result<Vec<Copytrader>> {
        debug!("Listing copytraders for user {}", user_id);

        let rows = sqlx::query(
            "SELECT id, user_id, display_name, email, phone, is_active, description,
                    password_hash, created_at, updated_at
             FROM copytraders
             WHERE user_id = $1
             ORDER BY created_at DESC",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.iter().map(Self::copytrader_from_row).collect())
    }

    async fn update_copytrader(&self, copytrader: Copytrader) -> Result<Option<Copytrader>> {
        let row = sqlx::query(
            "UPDATE copytraders
             SET display_name = $3, email = $4, phone = $5, is_active = $6,
                 description = $7, password_hash = $8, updated_at = NOW()
             WHERE id = $1 AND user_id = $2
             RETURNING id, user_id, display_name, email, phone, is_active, description,
                       password_hash, created_at, updated_at",
        )
        .bind(copytrader.id)
        .bind(copytrader.user_id)
        .bind(&copytrader.display_name)
        .bind(&copytrader.email)
        .bind(&copytrader.phone)
        .bind(copytrader.is_active)
        .bind(&copytrader.description)
        .bind(&copytrader.password_hash)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| Self::copytrader_from_row(&row)))
    }

    async fn delete_copytrader(&self, user_id: Uuid, id: Uuid) -> Result<bool> {
        debug!("Deleting copytrader {} for user {}", id, user_id);

        let result = sqlx::query("DELETE FROM copytraders WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        // Settings rows cascade via the foreign key
        Ok(result.rows_affected() > 0)
    }

    async fn upsert_settings(&self, settings: CopytraderSettings) -> Result<CopytraderSettings> {
        debug!("Upserting settings for copytrader {}", settings.copytrader_id);

        let result = sqlx::query(
            "INSERT INTO copytrader_settings
                 (copytrader_id, profit_share_pct, budget, payout_wallet,
                  notify_channel, subscription_until, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, NOW())
             ON CONFLICT (copytrader_id)
             DO UPDATE SET
                 profit_share_pct = $2,
                 budget = $3,
                 payout_wallet = $4,
                 notify_channel = $5,
                 subscription_until = $6,
                 updated_at = NOW()",
        )
        .bind(settings.copytrader_id)
        .bind(settings.profit_share_pct.to_string())
        .bind(settings.budget.to_string())
        .bind(&settings.payout_wallet)
        .bind(settings.notify_channel.as_str())
        .bind(settings.subscription_until)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::Internal(format!(
                "Failed to upsert settings for copytrader: {}",
                settings.copytrader_id
            )));
        }

        Ok(settings)
    }

    async fn get_settings(&self, copytrader_id: Uuid) -> Result<Option<CopytraderSettings>> {
        let row = sqlx::query(
            "SELECT copytrader_id, profit_share_pct, budget, payout_wallet,
                    notify_channel, subscription_until, updated_at
             FROM copytrader_settings
             WHERE copytrader_id = $1",
        )
        .bind(copytrader_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(Self::settings_from_row(&row)?)),
            None => Ok(None),
        }
    }
}

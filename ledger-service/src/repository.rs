//! Repository for transfer and balance data

use async_trait::async_trait;
use common::db::{InMemoryTransactionManager, PgTransactionManager};
use common::decimal::Amount;
use common::error::{Error, Result};
use common::model::funds::SystemFunds;
use common::model::transfer::{Transfer, TransferDirection, TransferStatus};
use common::{DBTransaction, TransactionManager};
use dashmap::DashMap;
use sqlx::{postgres::PgPoolOptions, PgPool, Row};
use tracing::{debug, info};
use uuid::Uuid;

/// Ledger repository trait defining the interface for transfer and balance storage
///
/// Every accessor is scoped by the owning user.
#[async_trait]
pub trait LedgerRepository: Send + Sync {
    /// Get the transaction manager
    fn transaction_manager(&self) -> &dyn TransactionManager;

    /// Insert a new transfer row
    async fn create_transfer(&self, transfer: Transfer) -> Result<Transfer>;

    /// Get a transfer by owner and ID
    async fn get_transfer(&self, user_id: Uuid, id: Uuid) -> Result<Option<Transfer>>;

    /// A user's transfers in one direction, newest first
    async fn list_transfers(
        &self,
        user_id: Uuid,
        direction: TransferDirection,
        limit: usize,
    ) -> Result<Vec<Transfer>>;

    /// A user's balance row, or None if no row exists yet
    async fn get_funds(&self, user_id: Uuid) -> Result<Option<SystemFunds>>;

    /// Insert or replace a user's balance row
    async fn put_funds(&self, funds: SystemFunds) -> Result<SystemFunds>;

    /// Begin a database transaction
    async fn begin_transaction(&self) -> Result<DBTransaction> {
        self.transaction_manager().begin_transaction().await
    }
}

/// In-memory repository for transfer and balance data
pub struct InMemoryLedgerRepository {
    /// Transfers by ID
    pub transfers: DashMap<Uuid, Transfer>,
    /// Balances by user ID
    pub funds: DashMap<Uuid, SystemFunds>,
    /// Transaction manager
    transaction_manager: InMemoryTransactionManager,
}

impl InMemoryLedgerRepository {
    /// Create a new in-memory ledger repository
    pub fn new() -> Self {
        Self {
            transfers: DashMap::new(),
            funds: DashMap::new(),
            transaction_manager: InMemoryTransactionManager::new(),
        }
    }
}

impl Default for InMemoryLedgerRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LedgerRepository for InMemoryLedgerRepository {
    fn transaction_manager(&self) -> &dyn TransactionManager {
        &self.transaction_manager
    }

    async fn create_transfer(&self, transfer: Transfer) -> Result<Transfer> {
        self.transfers.insert(transfer.id, transfer.clone());
        Ok(transfer)
    }

    async fn get_transfer(&self, user_id: Uuid, id: Uuid) -> Result<Option<Transfer>> {
        Ok(self
            .transfers
            .get(&id)
            .filter(|t| t.user_id == user_id)
            .map(|t| t.clone()))
    }

    async fn list_transfers(
        &self,
        user_id: Uuid,
        direction: TransferDirection,
        limit: usize,
    ) -> Result<Vec<Transfer>> {
        let mut transfers: Vec<Transfer> = self
            .transfers
            .iter()
            .filter(|t| t.user_id == user_id && t.direction == direction)
            .map(|t| t.clone())
            .collect();

        transfers.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        transfers.truncate(limit);
        Ok(transfers)
    }

    async fn get_funds(&self, user_id: Uuid) -> Result<Option<SystemFunds>> {
        Ok(self.funds.get(&user_id).map(|f| f.clone()))
    }

    async fn put_funds(&self, funds: SystemFunds) -> Result<SystemFunds> {
        self.funds.insert(funds.user_id, funds.clone());
        Ok(funds)
    }
}

/// PostgreSQL repository for transfer and balance data
pub struct PostgresLedgerRepository {
    /// Database connection pool
    pool: PgPool,
    /// Transaction manager
    transaction_manager: PgTransactionManager,
}

impl PostgresLedgerRepository {
    /// Create a new PostgreSQL ledger repository
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

    /// Create a new PostgreSQL ledger repository with configuration
    pub async fn with_config(config: &crate::config::LedgerServiceConfig) -> Result<Self> {
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

    /// Convert a transfers row to a Transfer
    fn transfer_from_row(row: &sqlx::postgres::PgRow) -> Result<Transfer> {
        let direction_str: String = row.get("direction");
        let status_str: String = row.get("status");
        let amount_str: String = row.get("amount");

        let amount = amount_str
            .parse::<Amount>()
            .map_err(|e| Error::Internal(format!("Invalid transfer amount format: {}", e)))?;

        Ok(Transfer {
            id: row.get("id"),
            user_id: row.get("user_id"),
            direction: TransferDirection::parse(&direction_str)?,
            amount,
            currency: row.get("currency"),
            wallet_address: row.get("wallet_address"),
            status: TransferStatus::parse(&status_str)?,
            created_at: row.get("created_at"),
        })
    }

    /// Convert a system_funds row to a SystemFunds
    fn funds_from_row(row: &sqlx::postgres::PgRow) -> Result<SystemFunds> {
        let system_fund_str: String = row.get("system_fund");
        let contract_fund_str: String = row.get("contract_fund");
        let accumulated_profit_str: String = row.get("accumulated_profit");
        let withdrawable_str: String = row.get("withdrawable");

        let parse = |s: &str, field: &str| -> Result<Amount> {
            s.parse::<Amount>()
                .map_err(|e| Error::Internal(format!("Invalid {} format: {}", field, e)))
        };

        Ok(SystemFunds {
            user_id: row.get("user_id"),
            system_fund: parse(&system_fund_str, "system fund")?,
            contract_fund: parse(&contract_fund_str, "contract fund")?,
            accumulated_profit: parse(&accumulated_profit_str, "accumulated profit")?,
            withdrawable: parse(&withdrawable_str, "withdrawable")?,
            updated_at: row.get("updated_at"),
        })
    }
}

#[async_trait]
impl LedgerRepository for PostgresLedgerRepository {
    fn transaction_manager(&self) -> &dyn TransactionManager {
        &self.transaction_manager
    }

    async fn create_transfer(&self, transfer: Transfer) -> Result<Transfer> {
        debug!(
            "Creating {} {} for user {}",
            transfer.direction.as_str(),
            transfer.id,
            transfer.user_id
        );

        sqlx::query(
            "INSERT INTO transfers (id, user_id, direction, amount, currency,
                                    wallet_address, status, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(transfer.id)
        .bind(transfer.user_id)
        .bind(transfer.direction.as_str())
        .bind(transfer.amount.to_string())
        .bind(&transfer.currency)
        .bind(&transfer.wallet_address)
        .bind(transfer.status.as_str())
        .bind(transfer.created_at)
        .execute(&self.pool)
        .await?;

        Ok(transfer)
    }

    async fn get_transfer(&self, user_id: Uuid, id: Uuid) -> Result<Option<Transfer>> {
        let row = sqlx::query(
            "SELECT id, user_id, direction, amount, currency, wallet_address, status, created_at
             FROM transfers
             WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(Self::transfer_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn list_transfers(
        &self,
        user_id: Uuid,
        direction: TransferDirection,
        limit: usize,
    ) -> Result<Vec<Transfer>> {
        debug!(
            "Listing {}s for user {}",
            direction.as_str(),
            user_id
        );

        let rows = sqlx::query(
            "SELECT id, user_id, direction, amount, currency, wallet_address, status, created_at
             FROM transfers
             WHERE user_id = $1 AND direction = $2
             ORDER BY created_at DESC
             LIMIT $3",
        )
        .bind(user_id)
        .bind(direction.as_str())
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        let mut transfers = Vec::with_capacity(rows.len());
        for row in rows {
            transfers.push(Self::transfer_from_row(&row)?);
        }

        Ok(transfers)
    }

    async fn get_funds(&self, user_id: Uuid) -> Result<Option<SystemFunds>> {
        let row = sqlx::query(
            "SELECT user_id, system_fund, contract_fund, accumulated_profit,
                    withdrawable, updated_at
             FROM system_funds
             WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(Self::funds_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn put_funds(&self, funds: SystemFunds) -> Result<SystemFunds> {
        sqlx::query(
            "INSERT INTO system_funds (user_id, system_fund, contract_fund,
                                       accumulated_profit, withdrawable, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6)
             ON CONFLICT (user_id) DO UPDATE
             SET system_fund = EXCLUDED.system_fund,
                 contract_fund = EXCLUDED.contract_fund,
                 accumulated_profit = EXCLUDED.accumulated_profit,
                 withdrawable = EXCLUDED.withdrawable,
                 updated_at = EXCLUDED.updated_at",
        )
        .bind(funds.user_id)
        .bind(funds.system_fund.to_string())
        .bind(funds.contract_fund.to_string())
        .bind(funds.accumulated_profit.to_string())
        .bind(funds.withdrawable.to_string())
        .bind(funds.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(funds)
    }
}

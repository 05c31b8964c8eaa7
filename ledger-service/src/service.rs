//! Ledger service implementation

use std::sync::Arc;

use common::decimal::Amount;
use common::error::{Error, Result};
use common::model::funds::SystemFunds;
use common::model::transfer::{Transfer, TransferDirection};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::repository::{
    InMemoryLedgerRepository, LedgerRepository, PostgresLedgerRepository,
};

/// Default number of rows returned by transfer listings
pub const DEFAULT_LIST_LIMIT: usize = 50;

/// Ledger service for deposits, withdrawals, and balances
pub struct LedgerService {
    /// Repository for ledger data
    repo: Arc<dyn LedgerRepository>,
}

/// Repository Type
pub enum RepositoryType {
    /// In-memory repository
    InMemory,
    /// PostgreSQL repository
    Postgres(Option<String>),
}

/// Parameters for submitting a deposit or withdrawal
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewTransfer {
    /// Transfer amount
    pub amount: Amount,
    /// Currency code (e.g., "USDT")
    pub currency: String,
    /// Destination or source wallet address
    pub wallet_address: String,
}

impl NewTransfer {
    fn validate(&self) -> Result<()> {
        if self.amount <= Amount::ZERO {
            return Err(Error::ValidationError(
                "Transfer amount must be positive".to_string(),
            ));
        }
        if self.wallet_address.trim().is_empty() {
            return Err(Error::ValidationError(
                "Wallet address must not be empty".to_string(),
            ));
        }
        let currency_len = self.currency.trim().len();
        if !(3..=8).contains(&currency_len) {
            return Err(Error::ValidationError(format!(
                "Invalid currency code: {}",
                self.currency
            )));
        }
        Ok(())
    }
}

impl LedgerService {
    /// Create a new ledger service backed by an in-memory repository
    pub fn new() -> Self {
        Self {
            repo: Arc::new(InMemoryLedgerRepository::new()),
        }
    }

    /// Create a new ledger service with a specific repository type
    pub async fn with_repository(repo_type: RepositoryType) -> Result<Self> {
        let repo: Arc<dyn LedgerRepository> = match repo_type {
            RepositoryType::InMemory => Arc::new(InMemoryLedgerRepository::new()),
            RepositoryType::Postgres(database_url) => {
                Arc::new(PostgresLedgerRepository::new(database_url).await?)
            }
        };

        Ok(Self { repo })
    }

    /// Create a new ledger service with a configuration
    pub async fn with_config(config: &crate::config::LedgerServiceConfig) -> Result<Self> {
        let repo: Arc<dyn LedgerRepository> =
            Arc::new(PostgresLedgerRepository::with_config(config).await?);

        Ok(Self { repo })
    }

    /// Submit a deposit request; the row starts out pending
    pub async fn create_deposit(&self, user_id: Uuid, new: NewTransfer) -> Result<Transfer> {
        self.create_transfer(user_id, TransferDirection::Deposit, new)
            .await
    }

    /// Submit a withdrawal request; the row starts out pending
    pub async fn create_withdrawal(&self, user_id: Uuid, new: NewTransfer) -> Result<Transfer> {
        self.create_transfer(user_id, TransferDirection::Withdrawal, new)
            .await
    }

    async fn create_transfer(
        &self,
        user_id: Uuid,
        direction: TransferDirection,
        new: NewTransfer,
    ) -> Result<Transfer> {
        new.validate()?;

        info!(
            "Creating {} of {} {} for user {}",
            direction.as_str(),
            new.amount,
            new.currency,
            user_id
        );

        let transfer = Transfer::new(
            user_id,
            direction,
            new.amount,
            new.currency.trim().to_uppercase(),
            new.wallet_address,
        );

        self.repo.create_transfer(transfer).await
    }

    /// Get a transfer by owner and ID
    pub async fn get_transfer(&self, user_id: Uuid, id: Uuid) -> Result<Option<Transfer>> {
        self.repo.get_transfer(user_id, id).await
    }

    /// A user's deposits, newest first
    pub async fn list_deposits(&self, user_id: Uuid, limit: usize) -> Result<Vec<Transfer>> {
        self.repo
            .list_transfers(user_id, TransferDirection::Deposit, limit)
            .await
    }

    /// A user's withdrawals, newest first
    pub async fn list_withdrawals(&self, user_id: Uuid, limit: usize) -> Result<Vec<Transfer>> {
        self.repo
            .list_transfers(user_id, TransferDirection::Withdrawal, limit)
            .await
    }

    /// A user's most recent transfers across both directions, newest first
    pub async fn recent_transfers(&self, user_id: Uuid, limit: usize) -> Result<Vec<Transfer>> {
        let (deposits, withdrawals) = tokio::join!(
            self.repo
                .list_transfers(user_id, TransferDirection::Deposit, limit),
            self.repo
                .list_transfers(user_id, TransferDirection::Withdrawal, limit),
        );

        let mut merged = deposits?;
        merged.extend(withdrawals?);
        merged.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        merged.truncate(limit);

        Ok(merged)
    }

    /// A user's balance figures; the first read stores a zeroed row so
    /// balance updates always target an existing row
    pub async fn get_funds(&self, user_id: Uuid) -> Result<SystemFunds> {
        match self.repo.get_funds(user_id).await? {
            Some(funds) => Ok(funds),
            None => self.repo.put_funds(SystemFunds::zeroed(user_id)).await,
        }
    }

    /// Replace a user's balance row (backend processes and test fixtures only)
    pub async fn put_funds(&self, funds: SystemFunds) -> Result<SystemFunds> {
        self.repo.put_funds(funds).await
    }
}

impl Default for LedgerService {
    fn default() -> Self {
        Self::new()
    }
}

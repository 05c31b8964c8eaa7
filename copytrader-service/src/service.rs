//! Copytrader service implementation

use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::decimal::{Amount, Percent};
use common::error::{Error, ErrorExt, Result};
use common::model::copytrader::{Copytrader, CopytraderSettings, NotifyChannel};
use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use crate::auth::{hash_password, verify_password};
use crate::repository::{
    CopytraderRepository, InMemoryCopytraderRepository, PostgresCopytraderRepository,
};

/// Copytrader service for managing followed-trader profiles
pub struct CopytraderService {
    /// Repository for copytrader data
    repo: Arc<dyn CopytraderRepository>,
}

/// Repository Type
pub enum RepositoryType {
    /// In-memory repository
    InMemory,
    /// PostgreSQL repository
    Postgres(Option<String>),
}

/// Parameters for creating a copytrader profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewCopytrader {
    /// Display name
    pub display_name: String,
    /// Contact email
    pub email: String,
    /// Contact phone
    pub phone: Option<String>,
    /// Free-text description
    pub description: Option<String>,
}

/// Mutable profile fields for an update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateCopytrader {
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
}

/// Settings payload for the upsert operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsUpdate {
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
}

fn validate_profile(display_name: &str, email: &str) -> Result<()> {
    if display_name.trim().is_empty() {
        return Err(Error::ValidationError("Display name must not be empty".to_string()));
    }
    if display_name.len() > 64 {
        return Err(Error::ValidationError(
            "Display name must be at most 64 characters".to_string(),
        ));
    }
    if !email.contains('@') {
        return Err(Error::ValidationError(format!("Invalid email address: {}", email)));
    }
    Ok(())
}

impl SettingsUpdate {
    fn validate(&self) -> Result<()> {
        if self.profit_share_pct < Percent::ZERO || self.profit_share_pct > Percent::from(100) {
            return Err(Error::ValidationError(
                "Profit share must be between 0 and 100 percent".to_string(),
            ));
        }
        if self.budget < Amount::ZERO {
            return Err(Error::ValidationError("Budget must not be negative".to_string()));
        }
        if self.payout_wallet.trim().is_empty() {
            return Err(Error::ValidationError(
                "Payout wallet must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

impl CopytraderService {
    /// Create a new copytrader service backed by an in-memory repository
    pub fn new() -> Self {
        Self {
            repo: Arc::new(InMemoryCopytraderRepository::new()),
        }
    }

    /// Create a new copytrader service with a specific repository type
    pub async fn with_repository(repo_type: RepositoryType) -> Result<Self> {
        let repo: Arc<dyn CopytraderRepository> = match repo_type {
            RepositoryType::InMemory => Arc::new(InMemoryCopytraderRepository::new()),
            RepositoryType::Postgres(database_url) => {
                Arc::new(PostgresCopytraderRepository::new(database_url).await?)
            }
        };

        Ok(Self { repo })
    }

    /// Create a new copytrader service with a configuration
    pub async fn with_config(config: &crate::config::CopytraderServiceConfig) -> Result<Self> {
        let repo: Arc<dyn CopytraderRepository> =
            Arc::new(PostgresCopytraderRepository::with_config(config).await?);

        Ok(Self { repo })
    }

    /// Create a new copytrader profile
    pub async fn create_copytrader(&self, user_id: Uuid, new: NewCopytrader) -> Result<Copytrader> {
        validate_profile(&new.display_name, &new.email)?;

        info!("Creating copytrader '{}' for user {}", new.display_name, user_id);

        let mut copytrader = Copytrader::new(user_id, new.display_name, new.email);
        copytrader.phone = new.phone;
        copytrader.description = new.description;

        self.repo.create_copytrader(copytrader).await
    }

    /// Get a profile by owner and ID
    pub async fn get_copytrader(&self, user_id: Uuid, id: Uuid) -> Result<Option<Copytrader>> {
        self.repo.get_copytrader(user_id, id).await
    }

    /// List an owner's profiles, newest first
    pub async fn list_copytraders(&self, user_id: Uuid) -> Result<Vec<Copytrader>> {
        self.repo.list_copytraders(user_id).await
    }

    /// Update a profile's mutable fields
    pub async fn update_copytrader(
        &self,
        user_id: Uuid,
        id: Uuid,
        update: UpdateCopytrader,
    ) -> Result<Copytrader> {
        validate_profile(&update.display_name, &update.email)?;

        let mut copytrader = self
            .repo
            .get_copytrader(user_id, id)
            .await?
            .ok_or_else(|| Error::CopytraderNotFound(id.to_string()))?;

        copytrader.display_name = update.display_name;
        copytrader.email = update.email;
        copytrader.phone = update.phone;
        copytrader.is_active = update.is_active;
        copytrader.description = update.description;
        copytrader.updated_at = Utc::now();

        self.repo
            .update_copytrader(copytrader)
            .await?
            .ok_or_else(|| Error::CopytraderNotFound(id.to_string()))
    }

    /// Delete a profile and its settings row
    pub async fn delete_copytrader(&self, user_id: Uuid, id: Uuid) -> Result<()> {
        let removed = self
            .repo
            .delete_copytrader(user_id, id)
            .await
            .with_context(|| format!("Failed to delete copytrader {}", id))?;

        if !removed {
            return Err(Error::CopytraderNotFound(id.to_string()));
        }

        info!("Deleted copytrader {} for user {}", id, user_id);
        Ok(())
    }

    /// Create or update the settings row keyed by copytrader ID
    ///
    /// Resubmitting updates the same row rather than creating a duplicate.
    pub async fn upsert_settings(
        &self,
        user_id: Uuid,
        copytrader_id: Uuid,
        update: SettingsUpdate,
    ) -> Result<CopytraderSettings> {
        update.validate()?;

        // Ownership check before touching the settings table
        let _copytrader = self
            .repo
            .get_copytrader(user_id, copytrader_id)
            .await?
            .ok_or_else(|| Error::CopytraderNotFound(copytrader_id.to_string()))?;

        let settings = CopytraderSettings {
            copytrader_id,
            profit_share_pct: update.profit_share_pct,
            budget: update.budget,
            payout_wallet: update.payout_wallet,
            notify_channel: update.notify_channel,
            subscription_until: update.subscription_until,
            updated_at: Utc::now(),
        };

        self.repo
            .upsert_settings(settings)
            .await
            .with_context(|| format!("Failed to upsert settings for copytrader {}", copytrader_id))
    }

    /// Settings for a copytrader, falling back to defaults when no row exists
    pub async fn get_settings(
        &self,
        user_id: Uuid,
        copytrader_id: Uuid,
    ) -> Result<CopytraderSettings> {
        let _copytrader = self
            .repo
            .get_copytrader(user_id, copytrader_id)
            .await?
            .ok_or_else(|| Error::CopytraderNotFound(copytrader_id.to_string()))?;

        Ok(self
            .repo
            .get_settings(copytrader_id)
            .await?
            .unwrap_or_else(|| CopytraderSettings::defaults(copytrader_id)))
    }

    /// Set a copytrader's login password (stored as a PBKDF2 hash)
    pub async fn set_credentials(
        &self,
        user_id: Uuid,
        copytrader_id: Uuid,
        password: &str,
    ) -> Result<()> {
        if password.len() < 8 {
            return Err(Error::ValidationError(
                "Password must be at least 8 characters".to_string(),
            ));
        }

        let mut copytrader = self
            .repo
            .get_copytrader(user_id, copytrader_id)
            .await?
            .ok_or_else(|| Error::CopytraderNotFound(copytrader_id.to_string()))?;

        copytrader.password_hash = Some(hash_password(password));
        copytrader.updated_at = Utc::now();

        self.repo
            .update_copytrader(copytrader)
            .await?
            .ok_or_else(|| Error::CopytraderNotFound(copytrader_id.to_string()))?;

        info!("Updated credentials for copytrader {}", copytrader_id);
        Ok(())
    }

    /// Verify a copytrader login against the stored hash
    ///
    /// The profile must be active and have credentials set.
    pub async fn verify_credentials(&self, email: &str, password: &str) -> Result<Copytrader> {
        let copytrader = self
            .repo
            .find_by_email(email)
            .await?
            .ok_or_else(|| Error::AuthenticationError("Unknown email or password".to_string()))?;

        if !copytrader.is_active {
            return Err(Error::AuthenticationError("Profile is inactive".to_string()));
        }

        let stored = copytrader
            .password_hash
            .as_deref()
            .ok_or_else(|| Error::AuthenticationError("No credentials set".to_string()))?;

        if !verify_password(password, stored) {
            return Err(Error::AuthenticationError("Unknown email or password".to_string()));
        }

        Ok(copytrader)
    }
}

impl Default for CopytraderService {
    fn default() -> Self {
        Self::new()
    }
}

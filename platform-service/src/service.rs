//! Platform service implementation

use std::sync::Arc;

use chrono::Utc;
use common::error::{Error, Result};
use common::model::notification::{Notification, NotificationKind};
use common::model::platform::{MarketSession, PlatformState};
use tracing::info;
use uuid::Uuid;

use crate::clock::{market_countdown, MarketCountdown};
use crate::repository::{
    InMemoryPlatformRepository, PlatformRepository, PostgresPlatformRepository,
};

/// Default number of notifications returned by a listing
pub const DEFAULT_NOTIFICATION_LIMIT: usize = 100;

/// Platform service for notifications and platform-wide state
pub struct PlatformService {
    /// Repository for platform data
    repo: Arc<dyn PlatformRepository>,
}

/// Repository Type
pub enum RepositoryType {
    /// In-memory repository
    InMemory,
    /// PostgreSQL repository
    Postgres(Option<String>),
}

impl PlatformService {
    /// Create a new platform service backed by an in-memory repository
    pub fn new() -> Self {
        Self {
            repo: Arc::new(InMemoryPlatformRepository::new()),
        }
    }

    /// Create a new platform service with a specific repository type
    pub async fn with_repository(repo_type: RepositoryType) -> Result<Self> {
        let repo: Arc<dyn PlatformRepository> = match repo_type {
            RepositoryType::InMemory => Arc::new(InMemoryPlatformRepository::new()),
            RepositoryType::Postgres(database_url) => {
                Arc::new(PostgresPlatformRepository::new(database_url).await?)
            }
        };

        Ok(Self { repo })
    }

    /// Create a new platform service with a configuration
    pub async fn with_config(config: &crate::config::PlatformServiceConfig) -> Result<Self> {
        let repo: Arc<dyn PlatformRepository> =
            Arc::new(PostgresPlatformRepository::with_config(config).await?);

        Ok(Self { repo })
    }

    /// Record a notification for a user
    pub async fn notify(
        &self,
        user_id: Uuid,
        title: impl Into<String>,
        message: impl Into<String>,
        kind: NotificationKind,
    ) -> Result<Notification> {
        let notification = Notification::new(user_id, title.into(), message.into(), kind);
        self.repo.create_notification(notification).await
    }

    /// A user's notifications, newest first
    pub async fn list_notifications(
        &self,
        user_id: Uuid,
        limit: usize,
    ) -> Result<Vec<Notification>> {
        self.repo.list_notifications(user_id, limit).await
    }

    /// Mark one of the user's notifications read
    pub async fn mark_notification_read(&self, user_id: Uuid, id: Uuid) -> Result<Notification> {
        self.repo
            .mark_notification_read(user_id, id)
            .await?
            .ok_or_else(|| Error::NotificationNotFound(id.to_string()))
    }

    /// Current platform state; the first read stores the trading-enabled
    /// default so later reads and writes see one persistent row
    pub async fn platform_state(&self) -> Result<PlatformState> {
        match self.repo.get_platform_state().await? {
            Some(state) => Ok(state),
            None => self.repo.put_platform_state(PlatformState::default()).await,
        }
    }

    /// Halt or resume trading platform-wide
    pub async fn set_trading_halted(
        &self,
        halted: bool,
        reason: Option<String>,
    ) -> Result<PlatformState> {
        let state = PlatformState {
            trading_halted: halted,
            reason,
            updated_at: Utc::now(),
        };

        info!(
            "Trading {} platform-wide",
            if halted { "halted" } else { "resumed" }
        );

        self.repo.put_platform_state(state).await
    }

    /// Current market session window; the first read stores the default
    /// Mon 00:00 - Fri 22:00 UTC window
    pub async fn market_session(&self) -> Result<MarketSession> {
        match self.repo.get_market_session().await? {
            Some(session) => Ok(session),
            None => self.repo.put_market_session(MarketSession::default()).await,
        }
    }

    /// Replace the market session window
    pub async fn set_market_session(&self, session: MarketSession) -> Result<MarketSession> {
        if session.open_weekday > 6 || session.close_weekday > 6 {
            return Err(Error::ValidationError(
                "Weekday must be between 0 (Monday) and 6 (Sunday)".to_string(),
            ));
        }
        if session.open_hour > 23 || session.close_hour > 23 {
            return Err(Error::ValidationError(
                "Hour must be between 0 and 23".to_string(),
            ));
        }
        if session.open_offset_hours() == session.close_offset_hours() {
            return Err(Error::ValidationError(
                "Market open and close must differ".to_string(),
            ));
        }

        self.repo.put_market_session(session).await
    }

    /// Open/closed state and seconds until the next transition
    pub async fn market_countdown(&self) -> Result<MarketCountdown> {
        let session = self.market_session().await?;
        Ok(market_countdown(&session, Utc::now()))
    }
}

impl Default for PlatformService {
    fn default() -> Self {
        Self::new()
    }
}

//! Repository for notifications and platform-wide rows

use std::sync::Mutex;

use async_trait::async_trait;
use common::db::{InMemoryTransactionManager, PgTransactionManager};
use common::error::{Error, Result};
use common::model::notification::{Notification, NotificationKind};
use common::model::platform::{MarketSession, PlatformState};
use common::{DBTransaction, TransactionManager};
use dashmap::DashMap;
use sqlx::{postgres::PgPoolOptions, PgPool, Row};
use tracing::{debug, info};
use uuid::Uuid;

/// Platform repository trait for notifications and singleton platform rows
#[async_trait]
pub trait PlatformRepository: Send + Sync {
    /// Get the transaction manager
    fn transaction_manager(&self) -> &dyn TransactionManager;

    /// Insert a notification row
    async fn create_notification(&self, notification: Notification) -> Result<Notification>;

    /// A user's notifications, newest first
    async fn list_notifications(&self, user_id: Uuid, limit: usize) -> Result<Vec<Notification>>;

    /// Mark a notification read; returns the updated row, or None if not found
    async fn mark_notification_read(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Notification>>;

    /// The stored platform state row, or None if never written
    async fn get_platform_state(&self) -> Result<Option<PlatformState>>;

    /// Replace the platform state row
    async fn put_platform_state(&self, state: PlatformState) -> Result<PlatformState>;

    /// The stored market session row, or None if never written
    async fn get_market_session(&self) -> Result<Option<MarketSession>>;

    /// Replace the market session row
    async fn put_market_session(&self, session: MarketSession) -> Result<MarketSession>;

    /// Begin a database transaction
    async fn begin_transaction(&self) -> Result<DBTransaction> {
        self.transaction_manager().begin_transaction().await
    }
}

/// In-memory repository for platform data
pub struct InMemoryPlatformRepository {
    /// Notifications by ID
    pub notifications: DashMap<Uuid, Notification>,
    /// Platform state row
    pub platform_state: Mutex<Option<PlatformState>>,
    /// Market session row
    pub market_session: Mutex<Option<MarketSession>>,
    /// Transaction manager
    transaction_manager: InMemoryTransactionManager,
}

impl InMemoryPlatformRepository {
    /// Create a new in-memory platform repository
    pub fn new() -> Self {
        Self {
            notifications: DashMap::new(),
            platform_state: Mutex::new(None),
            market_session: Mutex::new(None),
            transaction_manager: InMemoryTransactionManager::new(),
        }
    }
}

impl Default for InMemoryPlatformRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PlatformRepository for InMemoryPlatformRepository {
    fn transaction_manager(&self) -> &dyn TransactionManager {
        &self.transaction_manager
    }

    async fn create_notification(&self, notification: Notification) -> Result<Notification> {
        self.notifications
            .insert(notification.id, notification.clone());
        Ok(notification)
    }

    async fn list_notifications(&self, user_id: Uuid, limit: usize) -> Result<Vec<Notification>> {
        let mut notifications: Vec<Notification> = self
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id)
            .map(|n| n.clone())
            .collect();

        notifications.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        notifications.truncate(limit);
        Ok(notifications)
    }

    async fn mark_notification_read(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Notification>> {
        match self.notifications.get_mut(&id) {
            Some(mut entry) if entry.user_id == user_id => {
                entry.read = true;
                Ok(Some(entry.clone()))
            }
            _ => Ok(None),
        }
    }

    async fn get_platform_state(&self) -> Result<Option<PlatformState>> {
        Ok(self
            .platform_state
            .lock()
            .map_err(|_| Error::Internal("Platform state lock poisoned".to_string()))?
            .clone())
    }

    async fn put_platform_state(&self, state: PlatformState) -> Result<PlatformState> {
        *self
            .platform_state
            .lock()
            .map_err(|_| Error::Internal("Platform state lock poisoned".to_string()))? =
            Some(state.clone());
        Ok(state)
    }

    async fn get_market_session(&self) -> Result<Option<MarketSession>> {
        Ok(*self
            .market_session
            .lock()
            .map_err(|_| Error::Internal("Market session lock poisoned".to_string()))?)
    }

    async fn put_market_session(&self, session: MarketSession) -> Result<MarketSession> {
        *self
            .market_session
            .lock()
            .map_err(|_| Error::Internal("Market session lock poisoned".to_string()))? =
            Some(session);
        Ok(session)
    }
}

/// PostgreSQL repository for platform data
///
/// `platform_state` and `market_session` are single-row tables keyed by a
/// constant boolean primary key.
pub struct PostgresPlatformRepository {
    /// Database connection pool
    pool: PgPool,
    /// Transaction manager
    transaction_manager: PgTransactionManager,
}

impl PostgresPlatformRepository {
    /// Create a new PostgreSQL platform repository
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

    /// Create a new PostgreSQL platform repository with configuration
    pub async fn with_config(config: &crate::config::PlatformServiceConfig) -> Result<Self> {
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

    /// Convert a notifications row to a Notification
    fn notification_from_row(row: &sqlx::postgres::PgRow) -> Result<Notification> {
        let kind_str: String = row.get("kind");

        Ok(Notification {
            id: row.get("id"),
            user_id: row.get("user_id"),
            title: row.get("title"),
            message: row.get("message"),
            kind: NotificationKind::parse(&kind_str)?,
            read: row.get("read"),
            created_at: row.get("created_at"),
        })
    }
}

#[async_trait]
impl PlatformRepository for PostgresPlatformRepository {
    fn transaction_manager(&self) -> &dyn TransactionManager {
        &self.transaction_manager
    }

    async fn create_notification(&self, notification: Notification) -> Result<Notification> {
        debug!(
            "Creating {} notification for user {}",
            notification.kind.as_str(),
            notification.user_id
        );

        sqlx::query(
            "INSERT INTO notifications (id, user_id, title, message, kind, read, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)",
        )
        .bind(notification.id)
        .bind(notification.user_id)
        .bind(&notification.title)
        .bind(&notification.message)
        .bind(notification.kind.as_str())
        .bind(notification.read)
        .bind(notification.created_at)
        .execute(&self.pool)
        .await?;

        Ok(notification)
    }

    async fn list_notifications(&self, user_id: Uuid, limit: usize) -> Result<Vec<Notification>> {
        let rows = sqlx::query(
            "SELECT id, user_id, title, message, kind, read, created_at
             FROM notifications
             WHERE user_id = $1
             ORDER BY created_at DESC
             LIMIT $2",
        )
        .bind(user_id)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        let mut notifications = Vec::with_capacity(rows.len());
        for row in rows {
            notifications.push(Self::notification_from_row(&row)?);
        }

        Ok(notifications)
    }

    async fn mark_notification_read(
        &self,
        user_id: Uuid,
        id: Uuid,
    ) -> Result<Option<Notification>> {
        let row = sqlx::query(
            "UPDATE notifications
             SET read = TRUE
             WHERE id = $1 AND user_id = $2
             RETURNING id, user_id, title, message, kind, read, created_at",
        )
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => Ok(Some(Self::notification_from_row(&row)?)),
            None => Ok(None),
        }
    }

    async fn get_platform_state(&self) -> Result<Option<PlatformState>> {
        let row = sqlx::query(
            "SELECT trading_halted, reason, updated_at FROM platform_state WHERE singleton = TRUE",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| PlatformState {
            trading_halted: row.get("trading_halted"),
            reason: row.get("reason"),
            updated_at: row.get("updated_at"),
        }))
    }

    async fn put_platform_state(&self, state: PlatformState) -> Result<PlatformState> {
        sqlx::query(
            "INSERT INTO platform_state (singleton, trading_halted, reason, updated_at)
             VALUES (TRUE, $1, $2, $3)
             ON CONFLICT (singleton) DO UPDATE
             SET trading_halted = EXCLUDED.trading_halted,
                 reason = EXCLUDED.reason,
                 updated_at = EXCLUDED.updated_at",
        )
        .bind(state.trading_halted)
        .bind(&state.reason)
        .bind(state.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(state)
    }

    async fn get_market_session(&self) -> Result<Option<MarketSession>> {
        let row = sqlx::query(
            "SELECT open_weekday, open_hour, close_weekday, close_hour
             FROM market_session
             WHERE singleton = TRUE",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| MarketSession {
            open_weekday: row.get::<i16, _>("open_weekday") as u8,
            open_hour: row.get::<i16, _>("open_hour") as u8,
            close_weekday: row.get::<i16, _>("close_weekday") as u8,
            close_hour: row.get::<i16, _>("close_hour") as u8,
        }))
    }

    async fn put_market_session(&self, session: MarketSession) -> Result<MarketSession> {
        sqlx::query(
            "INSERT INTO market_session (singleton, open_weekday, open_hour,
                                         close_weekday, close_hour)
             VALUES (TRUE, $1, $2, $3, $4)
             ON CONFLICT (singleton) DO UPDATE
             SET open_weekday = EXCLUDED.open_weekday,
                 open_hour = EXCLUDED.open_hour,
                 close_weekday = EXCLUDED.close_weekday,
                 close_hour = EXCLUDED.close_hour",
        )
        .bind(session.open_weekday as i16)
        .bind(session.open_hour as i16)
        .bind(session.close_weekday as i16)
        .bind(session.close_hour as i16)
        .execute(&self.pool)
        .await?;

        Ok(session)
    }
}

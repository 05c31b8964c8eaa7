//! User notification model

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
#[cfg(feature = "utoipa")]
use crate::utoipa::ToSchema;

/// Notification category tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub enum NotificationKind {
    /// Bot lifecycle events (started, stopped, failed)
    Bot,
    /// Deposit/withdrawal events
    Transfer,
    /// Platform-wide announcements
    System,
}

impl NotificationKind {
    /// Storage discriminant
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationKind::Bot => "bot",
            NotificationKind::Transfer => "transfer",
            NotificationKind::System => "system",
        }
    }

    /// Parse a storage discriminant
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "bot" => Ok(NotificationKind::Bot),
            "transfer" => Ok(NotificationKind::Transfer),
            "system" => Ok(NotificationKind::System),
            other => Err(Error::ValidationError(format!(
                "Unknown notification kind: {}",
                other
            ))),
        }
    }
}

/// Notification row, inserted as a side effect of lifecycle actions
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct Notification {
    /// Unique notification ID
    pub id: Uuid,
    /// Owning user ID
    pub user_id: Uuid,
    /// Short title
    pub title: String,
    /// Message body
    pub message: String,
    /// Category tag
    pub kind: NotificationKind,
    /// Whether the user has read the notification
    pub read: bool,
    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Notification {
    /// Create a new unread notification
    pub fn new(user_id: Uuid, title: String, message: String, kind: NotificationKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            title,
            message,
            kind,
            read: false,
            created_at: Utc::now(),
        }
    }
}

//! Authenticated session model

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
#[cfg(feature = "utoipa")]
use crate::utoipa::ToSchema;

/// User role attached to a session
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub enum Role {
    /// Platform administrator, authenticated via managed sessions
    Admin,
    /// Copytrader, authenticated via stored-hash login
    Copytrader,
}

impl Role {
    /// Storage discriminant
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Copytrader => "copytrader",
        }
    }

    /// Parse a storage discriminant
    pub fn parse(s: &str) -> Result<Self> {
        match s {
            "admin" => Ok(Role::Admin),
            "copytrader" => Ok(Role::Copytrader),
            other => Err(Error::ValidationError(format!("Unknown role: {}", other))),
        }
    }
}

/// Bearer session
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct Session {
    /// Bearer token presented by the client
    pub token: Uuid,
    /// Authenticated user
    pub user_id: Uuid,
    /// Role the session was issued for
    pub role: Role,
    /// Expiry timestamp
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Issue a fresh session valid for `ttl_hours`
    pub fn issue(user_id: Uuid, role: Role, ttl_hours: i64) -> Self {
        Self {
            token: Uuid::new_v4(),
            user_id,
            role,
            expires_at: Utc::now() + Duration::hours(ttl_hours),
        }
    }

    /// Whether the session has expired
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

//! Platform-wide state and market session configuration

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[cfg(feature = "utoipa")]
use crate::utoipa::ToSchema;

/// Platform-wide trading state
///
/// A single server-persisted row, fetched once by the gateway and cached.
/// Replaces the process-wide mutable "algorithm compromised" flag of earlier
/// iterations.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct PlatformState {
    /// Whether trading operations are halted platform-wide
    pub trading_halted: bool,
    /// Optional human-readable reason for the halt
    pub reason: Option<String>,
    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Default for PlatformState {
    fn default() -> Self {
        Self {
            trading_halted: false,
            reason: None,
            updated_at: Utc::now(),
        }
    }
}

/// Market session configuration
///
/// Four integers describing the weekly open/close window, all in UTC.
/// Weekdays are counted from Monday (0 = Monday .. 6 = Sunday), matching
/// `chrono::Weekday::num_days_from_monday`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct MarketSession {
    /// Weekday the market opens (0 = Monday)
    pub open_weekday: u8,
    /// Hour of day the market opens (0..=23)
    pub open_hour: u8,
    /// Weekday the market closes (0 = Monday)
    pub close_weekday: u8,
    /// Hour of day the market closes (0..=23)
    pub close_hour: u8,
}

impl MarketSession {
    /// Hours since Monday 00:00 at which the market opens
    pub fn open_offset_hours(&self) -> i64 {
        self.open_weekday as i64 * 24 + self.open_hour as i64
    }

    /// Hours since Monday 00:00 at which the market closes
    pub fn close_offset_hours(&self) -> i64 {
        self.close_weekday as i64 * 24 + self.close_hour as i64
    }
}

impl Default for MarketSession {
    /// Forex-style default: open Monday 00:00, close Friday 22:00 UTC
    fn default() -> Self {
        Self {
            open_weekday: 0,
            open_hour: 0,
            close_weekday: 4,
            close_hour: 22,
        }
    }
}

//! Market open/close countdown
//!
//! Pure calendar arithmetic over the configured weekly session window.
//! All times are UTC; weekdays count from Monday to match
//! `chrono::Weekday::num_days_from_monday`.

use chrono::{DateTime, Datelike, Timelike, Utc};
use common::model::platform::MarketSession;
use serde::{Deserialize, Serialize};

#[cfg(feature = "utoipa")]
use utoipa::ToSchema;

const WEEK_SECONDS: i64 = 7 * 24 * 3600;

/// Result of a market countdown query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "utoipa", derive(ToSchema))]
pub struct MarketCountdown {
    /// Whether the market is currently open
    pub is_open: bool,
    /// Seconds until the next transition (close if open, open if closed)
    pub seconds_remaining: i64,
}

/// Compute open/closed state and seconds until the next transition
///
/// The window may wrap the week boundary; offsets are reduced modulo one
/// week so a session closing after Sunday midnight still counts down
/// correctly.
pub fn market_countdown(session: &MarketSession, now: DateTime<Utc>) -> MarketCountdown {
    let now_offset = now.weekday().num_days_from_monday() as i64 * 24 * 3600
        + now.hour() as i64 * 3600
        + now.minute() as i64 * 60
        + now.second() as i64;

    let open_offset = session.open_offset_hours() * 3600;
    let close_offset = session.close_offset_hours() * 3600;

    let since_open = (now_offset - open_offset).rem_euclid(WEEK_SECONDS);
    let window = (close_offset - open_offset).rem_euclid(WEEK_SECONDS);

    if since_open < window {
        MarketCountdown {
            is_open: true,
            seconds_remaining: (close_offset - now_offset).rem_euclid(WEEK_SECONDS),
        }
    } else {
        MarketCountdown {
            is_open: false,
            seconds_remaining: (open_offset - now_offset).rem_euclid(WEEK_SECONDS),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(year: i32, month: u32, day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, month, day, hour, minute, 0).unwrap()
    }

    #[test]
    fn midweek_is_open_with_hours_to_close() {
        // Wednesday 10:00 UTC
        let now = at(2024, 1, 10, 10, 0);
        let countdown = market_countdown(&MarketSession::default(), now);

        assert!(countdown.is_open);
        assert_eq!(countdown.seconds_remaining, 60 * 3600);
    }

    #[test]
    fn weekend_is_closed_with_hours_to_open() {
        // Saturday 12:00 UTC
        let now = at(2024, 1, 13, 12, 0);
        let countdown = market_countdown(&MarketSession::default(), now);

        assert!(!countdown.is_open);
        assert_eq!(countdown.seconds_remaining, 36 * 3600);
    }

    #[test]
    fn boundary_instants() {
        let session = MarketSession::default();

        // Monday 00:00 is the first open second
        let open_instant = at(2024, 1, 8, 0, 0);
        assert!(market_countdown(&session, open_instant).is_open);

        // Friday 22:00 is the first closed second
        let close_instant = at(2024, 1, 12, 22, 0);
        let countdown = market_countdown(&session, close_instant);
        assert!(!countdown.is_open);
        assert_eq!(countdown.seconds_remaining, (24 + 24 + 2) * 3600);
    }

    #[test]
    fn minutes_count_toward_the_transition() {
        // Friday 21:30 UTC, half an hour before close
        let now = at(2024, 1, 12, 21, 30);
        let countdown = market_countdown(&MarketSession::default(), now);

        assert!(countdown.is_open);
        assert_eq!(countdown.seconds_remaining, 30 * 60);
    }

    #[test]
    fn session_wrapping_the_week_boundary() {
        // Open Friday 20:00, close Monday 06:00
        let session = MarketSession {
            open_weekday: 4,
            open_hour: 20,
            close_weekday: 0,
            close_hour: 6,
        };

        // Sunday 12:00 falls inside the wrapped window
        let sunday = at(2024, 1, 14, 12, 0);
        let countdown = market_countdown(&session, sunday);
        assert!(countdown.is_open);
        assert_eq!(countdown.seconds_remaining, 18 * 3600);

        // Tuesday 12:00 is outside it
        let tuesday = at(2024, 1, 9, 12, 0);
        let countdown = market_countdown(&session, tuesday);
        assert!(!countdown.is_open);
        assert_eq!(countdown.seconds_remaining, (3 * 24 + 8) * 3600);
    }
}

//! Decimal type utilities for monetary amounts

use rust_decimal::Decimal;
pub use rust_decimal_macros::dec;

/// Monetary amount with high precision
pub type Amount = Decimal;

/// Percentage value (0..=100 unless stated otherwise)
pub type Percent = Decimal;

/// Precision helpers for common operations
pub mod precision {
    use super::*;

    /// Default amount precision (8 decimal places)
    pub const AMOUNT_PRECISION: u32 = 8;

    /// Default percentage precision (2 decimal places)
    pub const PERCENT_PRECISION: u32 = 2;

    /// Round an amount to standard precision
    pub fn round_amount(amount: Amount) -> Amount {
        amount.round_dp(AMOUNT_PRECISION)
    }

    /// Round a percentage to standard precision
    pub fn round_percent(pct: Percent) -> Percent {
        pct.round_dp(PERCENT_PRECISION)
    }
}

//! Protocol constants. All monetary values in base units (1 CRC = 10^18 units).

use crate::types::{Amount, Timestamp};

/// Denominator for fixed-point rates. A demurrage rate of `RATE_PRECISION`
/// would mean 100% decay per second.
pub const RATE_PRECISION: u128 = 1_000_000_000_000_000_000;

/// Default issuance per second per account (150 CRC per day at 18 decimals).
pub const DEFAULT_ISSUANCE_RATE: Amount = 1_736_111_111_111_111;

/// Default demurrage: none.
pub const DEFAULT_DEMURRAGE_RATE: u128 = 0;

/// Default decimal precision of every personal currency.
pub const DEFAULT_DECIMALS: u8 = 18;

/// Default currency symbol shared by every personal currency.
pub const DEFAULT_SYMBOL: &str = "CRC";

/// Default issuance epoch: one hour.
pub const DEFAULT_EPOCH_LENGTH: Timestamp = 3_600;

/// Default one-time mint credited at signup.
pub const DEFAULT_INITIAL_PAYOUT: Amount = 100;

/// Seconds in one day. Used when expressing rates per day.
pub const SECS_PER_DAY: Timestamp = 86_400;

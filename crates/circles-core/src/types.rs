//! Core hub types: configuration, balances, call context.
//!
//! All monetary values are in base units; all timestamps are seconds from
//! the execution environment's monotonic clock.

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::constants::{
    DEFAULT_DECIMALS, DEFAULT_DEMURRAGE_RATE, DEFAULT_EPOCH_LENGTH, DEFAULT_INITIAL_PAYOUT,
    DEFAULT_ISSUANCE_RATE, DEFAULT_SYMBOL, RATE_PRECISION,
};
use crate::error::ConfigError;

/// Currency amount in base units.
pub type Amount = u128;

/// Seconds from the environment's monotonic clock.
pub type Timestamp = u64;

/// Hub-wide parameters, fixed once at hub construction.
///
/// Every ledger created by the hub copies the fields it needs; nothing
/// mutates them afterwards.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct HubConfig {
    /// Account that constructed the hub.
    pub system_owner: Address,
    /// Base units minted per second to a ledger's owner.
    pub issuance_rate: Amount,
    /// Fractional decay per second, denominated in [`RATE_PRECISION`].
    pub demurrage_rate: u128,
    /// Decimal precision of every personal currency.
    pub decimals: u8,
    /// Symbol shared by every personal currency.
    pub symbol: String,
    /// Maximum accrual window realised in one settlement, in seconds.
    pub epoch_length: Timestamp,
    /// One-time mint credited to the owner at signup.
    pub initial_payout: Amount,
}

impl HubConfig {
    /// Default parameters owned by `system_owner`.
    pub fn with_owner(system_owner: Address) -> Self {
        Self {
            system_owner,
            issuance_rate: DEFAULT_ISSUANCE_RATE,
            demurrage_rate: DEFAULT_DEMURRAGE_RATE,
            decimals: DEFAULT_DECIMALS,
            symbol: DEFAULT_SYMBOL.to_string(),
            epoch_length: DEFAULT_EPOCH_LENGTH,
            initial_payout: DEFAULT_INITIAL_PAYOUT,
        }
    }

    /// Check the parameters for values that would break ledger invariants.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::ZeroSystemOwner`] if `system_owner` is the null account
    /// - [`ConfigError::DemurrageTooHigh`] if `demurrage_rate >= RATE_PRECISION`
    /// - [`ConfigError::ZeroEpochLength`] if `epoch_length == 0`
    /// - [`ConfigError::EmptySymbol`] if `symbol` is empty
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.system_owner.is_zero() {
            return Err(ConfigError::ZeroSystemOwner);
        }
        if self.demurrage_rate >= RATE_PRECISION {
            return Err(ConfigError::DemurrageTooHigh {
                rate: self.demurrage_rate,
                max: RATE_PRECISION,
            });
        }
        if self.epoch_length == 0 {
            return Err(ConfigError::ZeroEpochLength);
        }
        if self.symbol.trim().is_empty() {
            return Err(ConfigError::EmptySymbol);
        }
        Ok(())
    }

    /// The time-dependent parameters each ledger settles with.
    pub fn settlement_params(&self) -> SettlementParams {
        SettlementParams {
            issuance_rate: self.issuance_rate,
            demurrage_rate: self.demurrage_rate,
            epoch_length: self.epoch_length,
        }
    }
}

/// Parameters of the lazy settlement step.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct SettlementParams {
    /// Base units accrued per second by the ledger owner.
    pub issuance_rate: Amount,
    /// Fractional decay per second in [`RATE_PRECISION`] units.
    pub demurrage_rate: u128,
    /// Accrual cap window in seconds.
    pub epoch_length: Timestamp,
}

/// A stored balance and the instant it was last brought up to date.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct BalanceEntry {
    /// Balance as of `last_settled`.
    pub raw: Amount,
    /// Timestamp of the last settlement.
    pub last_settled: Timestamp,
}

impl BalanceEntry {
    /// A fresh entry holding `raw` as of `at`.
    pub fn new(raw: Amount, at: Timestamp) -> Self {
        Self {
            raw,
            last_settled: at,
        }
    }
}

/// The implicit inputs of every call: who is calling and when.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct CallContext {
    /// The account issuing the call.
    pub caller: Address,
    /// Environment timestamp at which the call executes.
    pub timestamp: Timestamp,
}

impl CallContext {
    pub fn new(caller: Address, timestamp: Timestamp) -> Self {
        Self { caller, timestamp }
    }
}

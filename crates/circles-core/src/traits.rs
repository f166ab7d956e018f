//! Trait interfaces for the Circles hub.
//!
//! These traits define the contracts between crates:
//! - [`SettlementCalculator`] — demurrage and issuance math (circles-decay implements)
//! - [`Clock`] — monotonic timestamp source of the execution environment

use crate::error::SettlementError;
use crate::types::{Amount, BalanceEntry, SettlementParams, Timestamp};

/// Pure computation of lazily settled balances.
///
/// All math is integer-only with fixed-point rates denominated in
/// [`RATE_PRECISION`](crate::constants::RATE_PRECISION). Implemented by the
/// settlement engine (circles-decay).
pub trait SettlementCalculator: Send + Sync {
    /// Fraction of a balance that survives `elapsed` seconds of demurrage,
    /// in `RATE_PRECISION` units. Never exceeds `RATE_PRECISION`.
    fn retention(&self, demurrage_rate: u128, elapsed: Timestamp) -> Result<u128, SettlementError>;

    /// Amount of `raw` that decays away over `elapsed` seconds.
    fn compute_decay(
        &self,
        raw: Amount,
        demurrage_rate: u128,
        elapsed: Timestamp,
    ) -> Result<Amount, SettlementError>;

    /// Post-decay value of `raw` after `elapsed` seconds.
    ///
    /// Default implementation: `raw - compute_decay(...)`.
    fn decayed_value(
        &self,
        raw: Amount,
        demurrage_rate: u128,
        elapsed: Timestamp,
    ) -> Result<Amount, SettlementError> {
        let decay = self.compute_decay(raw, demurrage_rate, elapsed)?;
        raw.checked_sub(decay)
            .ok_or(SettlementError::ArithmeticOverflow)
    }

    /// Issuance realised for `elapsed` seconds, capped at one epoch.
    fn accrued_issuance(
        &self,
        params: &SettlementParams,
        elapsed: Timestamp,
    ) -> Result<Amount, SettlementError>;

    /// Bring `entry` up to `now`: decay the stored balance, then credit any
    /// issuance if `accrues_issuance` is set.
    ///
    /// A `now` earlier than `entry.last_settled` counts as zero elapsed time
    /// and leaves `last_settled` unchanged.
    fn settle(
        &self,
        entry: BalanceEntry,
        now: Timestamp,
        params: &SettlementParams,
        accrues_issuance: bool,
    ) -> Result<BalanceEntry, SettlementError> {
        let elapsed = now.saturating_sub(entry.last_settled);
        if elapsed == 0 {
            return Ok(entry);
        }
        let decayed = self.decayed_value(entry.raw, params.demurrage_rate, elapsed)?;
        let accrued = if accrues_issuance {
            self.accrued_issuance(params, elapsed)?
        } else {
            0
        };
        let raw = decayed
            .checked_add(accrued)
            .ok_or(SettlementError::ArithmeticOverflow)?;
        Ok(BalanceEntry {
            raw,
            last_settled: now,
        })
    }
}

/// Monotonic timestamp source.
pub trait Clock: Send + Sync {
    /// Current time in seconds. Successive calls never decrease.
    fn now(&self) -> Timestamp;
}

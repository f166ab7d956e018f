//! Settlement engine implementing the [`SettlementCalculator`] trait.
//!
//! Provides compound per-second demurrage using binary exponentiation and
//! epoch-capped linear issuance. All arithmetic is integer-only with u128
//! intermediates and checked operations.

use circles_core::constants::RATE_PRECISION;
use circles_core::error::SettlementError;
use circles_core::traits::SettlementCalculator;
use circles_core::types::{Amount, BalanceEntry, SettlementParams, Timestamp};

/// The production settlement calculator.
///
/// Implements [`SettlementCalculator`] with:
/// - Compound decay via binary exponentiation of the per-second retention
/// - Issuance capped at one `epoch_length` window per settlement
#[derive(Debug, Clone, Copy, Default)]
pub struct SettlementEngine;

impl SettlementEngine {
    /// Create a new SettlementEngine.
    pub fn new() -> Self {
        Self
    }
}

/// Settle `entry` to `now` with the production engine.
///
/// Free-function form used by the ledger; see
/// [`SettlementCalculator::settle`] for the semantics.
pub fn settle(
    entry: BalanceEntry,
    now: Timestamp,
    params: &SettlementParams,
    accrues_issuance: bool,
) -> Result<BalanceEntry, SettlementError> {
    SettlementEngine.settle(entry, now, params, accrues_issuance)
}

/// Fixed-point exponentiation: computes `(base/precision)^exp` in fixed-point.
///
/// Uses binary exponentiation for O(log n) multiplications. Each step rounds
/// down, so for `base <= precision` the result never exceeds `precision`.
fn fixed_pow(base: u128, exp: u64, precision: u128) -> Result<u128, SettlementError> {
    if exp == 0 {
        return Ok(precision);
    }

    let mut result: u128 = precision;
    let mut b: u128 = base;
    let mut e = exp;

    while e > 0 {
        if e & 1 == 1 {
            result = result
                .checked_mul(b)
                .ok_or(SettlementError::ArithmeticOverflow)?
                / precision;
        }
        e >>= 1;
        if e > 0 {
            b = b
                .checked_mul(b)
                .ok_or(SettlementError::ArithmeticOverflow)?
                / precision;
        }
        // Once the product hits zero it stays there.
        if result == 0 {
            break;
        }
    }

    Ok(result)
}

/// `floor(value * factor / precision)` for `factor <= precision` without a
/// 256-bit intermediate.
fn mul_fraction(value: Amount, factor: u128, precision: u128) -> Result<Amount, SettlementError> {
    let whole = (value / precision)
        .checked_mul(factor)
        .ok_or(SettlementError::ArithmeticOverflow)?;
    let part = (value % precision)
        .checked_mul(factor)
        .ok_or(SettlementError::ArithmeticOverflow)?
        / precision;
    whole
        .checked_add(part)
        .ok_or(SettlementError::ArithmeticOverflow)
}

impl SettlementCalculator for SettlementEngine {
    fn retention(&self, demurrage_rate: u128, elapsed: Timestamp) -> Result<u128, SettlementError> {
        if demurrage_rate == 0 || elapsed == 0 {
            return Ok(RATE_PRECISION);
        }
        if demurrage_rate >= RATE_PRECISION {
            return Ok(0);
        }
        fixed_pow(RATE_PRECISION - demurrage_rate, elapsed, RATE_PRECISION)
    }

    fn compute_decay(
        &self,
        raw: Amount,
        demurrage_rate: u128,
        elapsed: Timestamp,
    ) -> Result<Amount, SettlementError> {
        if raw == 0 || elapsed == 0 || demurrage_rate == 0 {
            return Ok(0);
        }

        let retention = self.retention(demurrage_rate, elapsed)?;
        let effective = mul_fraction(raw, retention, RATE_PRECISION)?;

        // Invariant: decay = raw - effective, and effective <= raw
        Ok(raw.saturating_sub(effective))
    }

    fn accrued_issuance(
        &self,
        params: &SettlementParams,
        elapsed: Timestamp,
    ) -> Result<Amount, SettlementError> {
        let window = elapsed.min(params.epoch_length) as u128;
        params
            .issuance_rate
            .checked_mul(window)
            .ok_or(SettlementError::ArithmeticOverflow)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use circles_core::constants::{DEFAULT_EPOCH_LENGTH, DEFAULT_ISSUANCE_RATE, SECS_PER_DAY};
    use proptest::prelude::*;

    const COIN: Amount = 1_000_000_000_000_000_000;

    /// Roughly 1% per day, expressed per second.
    const ONE_PCT_DAILY: u128 = RATE_PRECISION / 100 / SECS_PER_DAY as u128;

    fn engine() -> SettlementEngine {
        SettlementEngine::new()
    }

    fn params(issuance: Amount, demurrage: u128, epoch: Timestamp) -> SettlementParams {
        SettlementParams {
            issuance_rate: issuance,
            demurrage_rate: demurrage,
            epoch_length: epoch,
        }
    }

    // --- fixed_pow ---

    #[test]
    fn fixed_pow_zero_exponent() {
        assert_eq!(
            fixed_pow(RATE_PRECISION / 2, 0, RATE_PRECISION).unwrap(),
            RATE_PRECISION
        );
    }

    #[test]
    fn fixed_pow_one_exponent() {
        let base = RATE_PRECISION * 85 / 100;
        assert_eq!(fixed_pow(base, 1, RATE_PRECISION).unwrap(), base);
    }

    #[test]
    fn fixed_pow_squares_correctly() {
        // 0.8^2 = 0.64
        let result = fixed_pow(RATE_PRECISION * 8 / 10, 2, RATE_PRECISION).unwrap();
        assert_eq!(result, RATE_PRECISION * 64 / 100);
    }

    #[test]
    fn fixed_pow_cubes_correctly() {
        // 0.9^3 = 0.729
        let result = fixed_pow(RATE_PRECISION * 9 / 10, 3, RATE_PRECISION).unwrap();
        assert_eq!(result, RATE_PRECISION * 729 / 1000);
    }

    #[test]
    fn fixed_pow_large_exponent() {
        // 0.9999^10000 ≈ e^(-1) ≈ 0.3679
        let base = RATE_PRECISION - RATE_PRECISION / 10_000;
        let result = fixed_pow(base, 10_000, RATE_PRECISION).unwrap();
        assert!(
            result > RATE_PRECISION * 36 / 100 && result < RATE_PRECISION * 38 / 100,
            "0.9999^10000 = {result}"
        );
    }

    #[test]
    fn fixed_pow_full_precision() {
        let result = fixed_pow(RATE_PRECISION, 1_000_000, RATE_PRECISION).unwrap();
        assert_eq!(result, RATE_PRECISION);
    }

    #[test]
    fn fixed_pow_zero_base() {
        assert_eq!(fixed_pow(0, 100, RATE_PRECISION).unwrap(), 0);
    }

    // --- mul_fraction ---

    #[test]
    fn mul_fraction_matches_naive_for_small_values() {
        let v: Amount = 123_456_789;
        let f = RATE_PRECISION / 3;
        assert_eq!(
            mul_fraction(v, f, RATE_PRECISION).unwrap(),
            v * f / RATE_PRECISION
        );
    }

    #[test]
    fn mul_fraction_handles_huge_values() {
        let v = Amount::MAX;
        assert_eq!(mul_fraction(v, RATE_PRECISION, RATE_PRECISION).unwrap(), v);
        assert_eq!(mul_fraction(v, 0, RATE_PRECISION).unwrap(), 0);
        assert!(mul_fraction(v, RATE_PRECISION / 2, RATE_PRECISION).unwrap() < v);
    }

    // --- retention / compute_decay ---

    #[test]
    fn zero_demurrage_retains_everything() {
        let e = engine();
        assert_eq!(e.retention(0, 1_000_000).unwrap(), RATE_PRECISION);
        assert_eq!(e.compute_decay(100 * COIN, 0, 1_000_000).unwrap(), 0);
    }

    #[test]
    fn decay_zero_elapsed() {
        assert_eq!(engine().compute_decay(100 * COIN, ONE_PCT_DAILY, 0).unwrap(), 0);
    }

    #[test]
    fn decay_zero_value() {
        assert_eq!(engine().compute_decay(0, ONE_PCT_DAILY, 1_000).unwrap(), 0);
    }

    #[test]
    fn decay_increases_with_time() {
        let e = engine();
        let v = 100 * COIN;
        let d1 = e.compute_decay(v, ONE_PCT_DAILY, 60).unwrap();
        let d2 = e.compute_decay(v, ONE_PCT_DAILY, 3_600).unwrap();
        let d3 = e.compute_decay(v, ONE_PCT_DAILY, SECS_PER_DAY).unwrap();
        assert!(d1 < d2, "{d1} < {d2}");
        assert!(d2 < d3, "{d2} < {d3}");
    }

    #[test]
    fn one_day_at_one_percent_daily() {
        let e = engine();
        let v = 100 * COIN;
        let decay = e.compute_decay(v, ONE_PCT_DAILY, SECS_PER_DAY).unwrap();
        // Continuous compounding of 1%/day gives slightly under 1 COIN.
        assert!(decay > COIN * 99 / 100 && decay < COIN, "decay = {decay}");
    }

    #[test]
    fn decay_never_exceeds_raw() {
        let e = engine();
        let v = 100 * COIN;
        let rate = RATE_PRECISION / 2;
        assert_eq!(e.compute_decay(v, rate, 10_000).unwrap(), v);
    }

    #[test]
    fn decayed_plus_decay_equals_raw() {
        let e = engine();
        let v = 1_000 * COIN;
        let decay = e.compute_decay(v, ONE_PCT_DAILY, 12_345).unwrap();
        let kept = e.decayed_value(v, ONE_PCT_DAILY, 12_345).unwrap();
        assert_eq!(decay + kept, v);
    }

    // --- accrued_issuance ---

    #[test]
    fn issuance_is_linear_within_epoch() {
        let e = engine();
        let p = params(DEFAULT_ISSUANCE_RATE, 0, DEFAULT_EPOCH_LENGTH);
        assert_eq!(e.accrued_issuance(&p, 0).unwrap(), 0);
        assert_eq!(e.accrued_issuance(&p, 10).unwrap(), 10 * DEFAULT_ISSUANCE_RATE);
    }

    #[test]
    fn issuance_capped_at_one_epoch() {
        let e = engine();
        let p = params(5, 0, 100);
        assert_eq!(e.accrued_issuance(&p, 100).unwrap(), 500);
        assert_eq!(e.accrued_issuance(&p, 10_000).unwrap(), 500);
    }

    #[test]
    fn issuance_overflow_reported() {
        let e = engine();
        let p = params(Amount::MAX, 0, 100);
        assert_eq!(
            e.accrued_issuance(&p, 2),
            Err(SettlementError::ArithmeticOverflow)
        );
    }

    // --- settle ---

    #[test]
    fn settle_moves_timestamp_and_decays() {
        let p = params(0, ONE_PCT_DAILY, DEFAULT_EPOCH_LENGTH);
        let entry = BalanceEntry::new(100 * COIN, 1_000);
        let settled = settle(entry, 1_000 + SECS_PER_DAY, &p, false).unwrap();
        assert_eq!(settled.last_settled, 1_000 + SECS_PER_DAY);
        assert!(settled.raw < entry.raw);
    }

    #[test]
    fn settle_owner_accrues_after_decay() {
        let p = params(10, ONE_PCT_DAILY, 50);
        let entry = BalanceEntry::new(0, 0);
        let settled = settle(entry, 1_000, &p, true).unwrap();
        assert_eq!(settled.raw, 500);
    }

    #[test]
    fn settle_is_identity_at_same_instant() {
        let p = params(10, ONE_PCT_DAILY, 50);
        let entry = BalanceEntry::new(77, 9);
        assert_eq!(settle(entry, 9, &p, true).unwrap(), entry);
    }

    #[test]
    fn engine_is_object_safe() {
        let e = engine();
        let dyn_e: &dyn SettlementCalculator = &e;
        assert_eq!(dyn_e.retention(0, 10).unwrap(), RATE_PRECISION);
    }

    // --- proptest ---

    proptest! {
        #[test]
        fn decay_never_increases_balance(
            raw in 0u128..=(1u128 << 100),
            rate in 0u128..RATE_PRECISION,
            elapsed in 0u64..=10_000_000,
        ) {
            let kept = engine().decayed_value(raw, rate, elapsed).unwrap();
            prop_assert!(kept <= raw, "kept {} > raw {}", kept, raw);
        }

        #[test]
        fn retention_monotonic_in_time(
            rate in 1_000_000_000u128..1_000_000_000_000u128,
            a in 0u64..=1_000_000,
            b in 0u64..=1_000_000,
        ) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let e = engine();
            prop_assert!(e.retention(rate, lo).unwrap() >= e.retention(rate, hi).unwrap());
        }

        #[test]
        fn issuance_bounded_by_epoch(
            rate in 0u128..=DEFAULT_ISSUANCE_RATE * 1_000,
            epoch in 1u64..=100_000,
            elapsed in 0u64..=10_000_000,
        ) {
            let p = params(rate, 0, epoch);
            let accrued = engine().accrued_issuance(&p, elapsed).unwrap();
            prop_assert!(accrued <= rate * epoch as u128);
        }

        #[test]
        fn non_owner_settlement_never_grows(
            raw in 0u128..=(1u128 << 100),
            rate in 0u128..RATE_PRECISION,
            start in 0u64..=1_000_000,
            elapsed in 0u64..=1_000_000,
        ) {
            let p = params(DEFAULT_ISSUANCE_RATE, rate, DEFAULT_EPOCH_LENGTH);
            let settled = settle(BalanceEntry::new(raw, start), start + elapsed, &p, false).unwrap();
            prop_assert!(settled.raw <= raw);
        }

        #[test]
        fn settle_deterministic(
            raw in 0u128..=(1u128 << 90),
            rate in 0u128..(RATE_PRECISION / 100),
            elapsed in 0u64..=100_000,
        ) {
            let p = params(DEFAULT_ISSUANCE_RATE, rate, DEFAULT_EPOCH_LENGTH);
            let entry = BalanceEntry::new(raw, 0);
            prop_assert_eq!(settle(entry, elapsed, &p, true), settle(entry, elapsed, &p, true));
        }
    }
}

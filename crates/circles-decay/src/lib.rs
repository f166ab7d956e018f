//! # circles-decay — Lazy demurrage and issuance settlement.
//!
//! All calculations use integer arithmetic only for determinism.
//!
//! Balances are never touched by a background process. Instead every access
//! settles the stored balance up to the current timestamp:
//! - **Compound demurrage**: `raw * (1 - rate)^elapsed` using fixed-point
//!   binary exponentiation, rounded down, so decay alone can never increase
//!   a balance.
//! - **Capped issuance**: the ledger owner accrues `issuance_rate` per second,
//!   but at most one epoch's worth per settlement. Anything beyond is forfeited.

pub mod engine;

pub use engine::{settle, SettlementEngine};

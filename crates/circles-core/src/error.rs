//! Error types for the Circles hub.
use thiserror::Error;

use crate::address::Address;
use crate::types::Amount;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    #[error("invalid length: {0} hex characters")] InvalidLength(usize),
    #[error("invalid hex: {0}")] InvalidHex(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SettlementError {
    #[error("arithmetic overflow")] ArithmeticOverflow,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("system owner must not be the zero address")] ZeroSystemOwner,
    #[error("demurrage rate {rate} must be below {max}")] DemurrageTooHigh { rate: u128, max: u128 },
    #[error("epoch length must be positive")] ZeroEpochLength,
    #[error("symbol must not be empty")] EmptySymbol,
    #[error("token name must not be empty")] EmptyTokenName,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("zero address")] ZeroAddress,
    #[error("insufficient balance: have {have}, need {need}")] InsufficientBalance { have: Amount, need: Amount },
    #[error("insufficient allowance: have {have}, need {need}")] InsufficientAllowance { have: Amount, need: Amount },
    #[error("already registered: {0}")] AlreadyRegistered(Address),
    #[error("unauthorized: {0}")] Unauthorized(Address),
    #[error("unknown token: {0}")] UnknownToken(Address),
    #[error("allowance overflow")] AllowanceOverflow,
    #[error("supply overflow")] SupplyOverflow,
    #[error("settlement: {0}")] Settlement(#[from] SettlementError),
    #[error("config: {0}")] Config(#[from] ConfigError),
}

#[derive(Error, Debug)]
pub enum CirclesError {
    #[error(transparent)] Ledger(#[from] LedgerError),
    #[error(transparent)] Settlement(#[from] SettlementError),
    #[error(transparent)] Config(#[from] ConfigError),
    #[error(transparent)] Address(#[from] AddressError),
    #[error("snapshot: {0}")] Snapshot(String),
}

//! # circles-ledger
//!
//! The accounting engine of the Circles hub:
//! - [`TokenLedger`] — one participant's personal currency
//! - [`Hub`] — registry and factory creating one ledger per participant
//! - [`Executor`] — the serialized, all-or-nothing execution environment

pub mod executor;
pub mod hub;
pub mod token;

pub use executor::Executor;
pub use hub::Hub;
pub use token::TokenLedger;

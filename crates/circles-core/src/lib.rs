//! # circles-core
//! Foundation types and traits for the Circles hub.

pub mod address;
pub mod clock;
pub mod constants;
pub mod error;
pub mod event;
pub mod traits;
pub mod types;

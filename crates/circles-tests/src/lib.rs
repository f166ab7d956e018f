//! Integration test suite for the Circles hub.
//!
//! Exercises the hub, ledgers and executor together through their public
//! API, including abuse cases and value-conservation properties.

pub mod helpers;

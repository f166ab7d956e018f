//! Serialized, atomic execution environment for hub calls.
//!
//! The [`Executor`] plays the part of the ledger substrate: it runs one
//! mutating call at a time behind a mutex, stamps it with the clock's
//! timestamp, and restores the pre-call state if the call fails. Multi-step
//! closures passed to [`Executor::transact`] therefore commit all of their
//! effects or none.
//!
//! Snapshots of the whole hub can be persisted as JSON with
//! [`Executor::save`] and restored with [`Executor::load`].

use std::fmt::Display;
use std::fs;
use std::path::Path;

use parking_lot::Mutex;
use tracing::{debug, warn};

use circles_core::address::Address;
use circles_core::clock::SystemClock;
use circles_core::error::{CirclesError, LedgerError};
use circles_core::event::Receipt;
use circles_core::traits::Clock;
use circles_core::types::{CallContext, Timestamp};

use crate::hub::Hub;
use crate::token::TokenLedger;

/// Runs hub calls one at a time with rollback on failure.
pub struct Executor<C: Clock = SystemClock> {
    hub: Mutex<Hub>,
    clock: C,
}

impl<C: Clock> Executor<C> {
    pub fn new(hub: Hub, clock: C) -> Self {
        Self {
            hub: Mutex::new(hub),
            clock,
        }
    }

    /// Current environment timestamp.
    pub fn now(&self) -> Timestamp {
        self.clock.now()
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Run `f` as a single transaction issued by `caller`.
    ///
    /// `f` sees a consistent hub and a [`CallContext`] stamped with the
    /// current time. If it returns `Err`, every change it made is discarded.
    pub fn transact<T, E, F>(&self, caller: Address, f: F) -> Result<T, E>
    where
        E: Display,
        F: FnOnce(&mut Hub, &CallContext) -> Result<T, E>,
    {
        let mut hub = self.hub.lock();
        let ctx = CallContext::new(caller, self.clock.now());
        let checkpoint = hub.clone();

        match f(&mut hub, &ctx) {
            Ok(value) => Ok(value),
            Err(e) => {
                *hub = checkpoint;
                warn!(%caller, timestamp = ctx.timestamp, "transaction reverted: {e}");
                Err(e)
            }
        }
    }

    /// Run `f` against the ledger `token` as a single transaction.
    ///
    /// Only that ledger is checkpointed; `f` cannot reach any other state.
    pub fn call_token<T, F>(&self, caller: Address, token: Address, f: F) -> Result<T, LedgerError>
    where
        F: FnOnce(&mut TokenLedger, &CallContext) -> Result<T, LedgerError>,
    {
        let mut hub = self.hub.lock();
        let ctx = CallContext::new(caller, self.clock.now());
        let ledger = match hub.token_mut(&token) {
            Ok(ledger) => ledger,
            Err(e) => {
                warn!(%caller, timestamp = ctx.timestamp, "transaction reverted: {e}");
                return Err(e);
            }
        };
        let checkpoint = ledger.clone();

        match f(&mut *ledger, &ctx) {
            Ok(value) => Ok(value),
            Err(e) => {
                *ledger = checkpoint;
                warn!(%caller, %token, timestamp = ctx.timestamp, "transaction reverted: {e}");
                Err(e)
            }
        }
    }

    /// Sign `caller` up with a personal currency called `name`.
    pub fn signup(&self, caller: Address, name: &str) -> Result<Receipt<Address>, LedgerError> {
        self.transact(caller, |hub, ctx| hub.signup(ctx, name))
    }

    /// Read-only access at the current timestamp.
    pub fn view<T>(&self, f: impl FnOnce(&Hub, Timestamp) -> T) -> T {
        let hub = self.hub.lock();
        f(&hub, self.clock.now())
    }

    /// A copy of the current hub state.
    pub fn snapshot(&self) -> Hub {
        self.hub.lock().clone()
    }

    /// Consume the executor, returning the hub.
    pub fn into_hub(self) -> Hub {
        self.hub.into_inner()
    }

    /// Write the hub state to `path` as JSON.
    pub fn save(&self, path: &Path) -> Result<(), CirclesError> {
        let json = {
            let hub = self.hub.lock();
            serde_json::to_string_pretty(&*hub).map_err(|e| CirclesError::Snapshot(e.to_string()))?
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| CirclesError::Snapshot(e.to_string()))?;
        }
        fs::write(path, json).map_err(|e| CirclesError::Snapshot(e.to_string()))?;
        debug!(path = %path.display(), "hub snapshot saved");
        Ok(())
    }

    /// Restore a hub saved with [`save`](Self::save).
    ///
    /// The stored configuration is re-validated.
    pub fn load(path: &Path, clock: C) -> Result<Self, CirclesError> {
        let json = fs::read_to_string(path).map_err(|e| CirclesError::Snapshot(e.to_string()))?;
        let hub: Hub =
            serde_json::from_str(&json).map_err(|e| CirclesError::Snapshot(e.to_string()))?;
        hub.config().validate()?;
        debug!(path = %path.display(), signups = hub.signup_count(), "hub snapshot loaded");
        Ok(Self::new(hub, clock))
    }
}

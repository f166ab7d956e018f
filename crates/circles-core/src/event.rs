//! Notifications emitted by hub and ledger operations.
//!
//! Every mutating call returns a [`Receipt`] carrying its result and the
//! events it emitted, in emission order. Observers may depend on that order:
//! `transfer_from` always yields `Transfer` before `Approval`.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::address::Address;
use crate::types::Amount;

/// An observable notification.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum Event {
    /// Value moved between accounts of ledger `token`. `from == ZERO` is a mint.
    Transfer {
        token: Address,
        from: Address,
        to: Address,
        value: Amount,
    },
    /// Standing authorization of `spender` over `owner`'s balance set to `value`.
    Approval {
        token: Address,
        owner: Address,
        spender: Address,
        value: Amount,
    },
    /// `account` signed up and received the ledger `token`.
    Signup { account: Address, token: Address },
}

impl Event {
    /// Short event name, as observers index it.
    pub fn name(&self) -> &'static str {
        match self {
            Event::Transfer { .. } => "Transfer",
            Event::Approval { .. } => "Approval",
            Event::Signup { .. } => "Signup",
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::Transfer {
                token,
                from,
                to,
                value,
            } => write!(f, "Transfer(token={token}, from={from}, to={to}, value={value})"),
            Event::Approval {
                token,
                owner,
                spender,
                value,
            } => write!(
                f,
                "Approval(token={token}, owner={owner}, spender={spender}, value={value})"
            ),
            Event::Signup { account, token } => {
                write!(f, "Signup(account={account}, token={token})")
            }
        }
    }
}

/// Outcome of a successful mutating call.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Receipt<T> {
    /// Return value of the call.
    pub value: T,
    /// Events emitted, in order.
    pub events: Vec<Event>,
}

impl<T> Receipt<T> {
    pub fn new(value: T, events: Vec<Event>) -> Self {
        Self { value, events }
    }

    /// Transform the return value, keeping the events.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Receipt<U> {
        Receipt {
            value: f(self.value),
            events: self.events,
        }
    }

    /// Names of the emitted events, in order.
    pub fn event_names(&self) -> Vec<&'static str> {
        self.events.iter().map(Event::name).collect()
    }
}

//! Shared test helpers for integration tests.

use circles_core::address::Address;
use circles_core::clock::ManualClock;
use circles_core::constants::{
    DEFAULT_DECIMALS, DEFAULT_DEMURRAGE_RATE, DEFAULT_EPOCH_LENGTH, DEFAULT_ISSUANCE_RATE,
};
use circles_core::event::Event;
use circles_core::types::{Amount, HubConfig};
use circles_ledger::{Executor, Hub};

/// Start time of every test environment.
pub const GENESIS_TS: u64 = 1_700_000_000;

/// Deterministic address from a seed byte.
pub fn addr(seed: u8) -> Address {
    Address([seed; 20])
}

pub fn system_owner() -> Address {
    addr(0x5E)
}

pub fn owner() -> Address {
    addr(0x01)
}

pub fn recipient() -> Address {
    addr(0x02)
}

pub fn another_account() -> Address {
    addr(0x03)
}

/// The canonical hub parameters: CRC, 18 decimals, hourly epoch, payout 100.
pub fn hub_config() -> HubConfig {
    HubConfig {
        system_owner: system_owner(),
        issuance_rate: DEFAULT_ISSUANCE_RATE,
        demurrage_rate: DEFAULT_DEMURRAGE_RATE,
        decimals: DEFAULT_DECIMALS,
        symbol: "CRC".to_string(),
        epoch_length: DEFAULT_EPOCH_LENGTH,
        initial_payout: 100,
    }
}

/// A hub behind a frozen clock, with `owner()` signed up as "MyCoin".
pub struct TestEnv {
    pub exec: Executor<ManualClock>,
    pub token: Address,
}

impl TestEnv {
    pub fn new() -> Self {
        Self::with_config(hub_config())
    }

    pub fn with_config(config: HubConfig) -> Self {
        let hub = Hub::new(config).expect("valid test config");
        let exec = Executor::new(hub, ManualClock::new(GENESIS_TS));
        let token = exec.signup(owner(), "MyCoin").expect("first signup").value;
        Self { exec, token }
    }

    pub fn balance_of(&self, account: Address) -> Amount {
        self.exec.view(|hub, now| {
            hub.token(&self.token)
                .and_then(|t| t.balance_of(&account, now))
                .expect("balance query")
        })
    }

    pub fn total_supply(&self) -> Amount {
        self.exec.view(|hub, now| {
            hub.token(&self.token)
                .and_then(|t| t.total_supply(now))
                .expect("supply query")
        })
    }

    pub fn allowance(&self, owner: Address, spender: Address) -> Amount {
        self.exec
            .view(|hub, _| hub.token(&self.token).map(|t| t.allowance(&owner, &spender)))
            .expect("allowance query")
    }

    /// Sum of every holder's settled balance.
    pub fn sum_of_balances(&self) -> Amount {
        self.exec.view(|hub, now| {
            let t = hub.token(&self.token).expect("token");
            t.holders()
                .map(|a| t.balance_of(a, now).expect("balance"))
                .sum()
        })
    }
}

impl Default for TestEnv {
    fn default() -> Self {
        Self::new()
    }
}

/// Build the expected Transfer event on `token`.
pub fn transfer_event(token: Address, from: Address, to: Address, value: Amount) -> Event {
    Event::Transfer {
        token,
        from,
        to,
        value,
    }
}

/// Build the expected Approval event on `token`.
pub fn approval_event(token: Address, owner: Address, spender: Address, value: Amount) -> Event {
    Event::Approval {
        token,
        owner,
        spender,
        value,
    }
}

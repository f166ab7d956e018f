//! Hub registry: parameter store and personal-currency factory.
//!
//! The [`Hub`] holds the immutable [`HubConfig`], maps every signed-up
//! account to exactly one [`TokenLedger`], and owns those ledgers. It is the
//! only place ledgers are created, and the only way a ledger's initial
//! payout is minted.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::info;

use circles_core::address::Address;
use circles_core::error::{ConfigError, LedgerError};
use circles_core::event::{Event, Receipt};
use circles_core::types::{CallContext, HubConfig};

use crate::token::TokenLedger;

/// The central registry and factory.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Hub {
    config: HubConfig,
    /// Signed-up account → ledger handle. Insertion-only.
    registry: BTreeMap<Address, Address>,
    /// Ledger handle → ledger.
    tokens: BTreeMap<Address, TokenLedger>,
}

impl Hub {
    /// Construct a hub with fixed parameters.
    ///
    /// # Errors
    ///
    /// Any [`ConfigError`] from [`HubConfig::validate`].
    pub fn new(config: HubConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        info!(
            system_owner = %config.system_owner,
            symbol = %config.symbol,
            issuance_rate = config.issuance_rate,
            demurrage_rate = config.demurrage_rate,
            epoch_length = config.epoch_length,
            initial_payout = config.initial_payout,
            "hub created"
        );
        Ok(Self {
            config,
            registry: BTreeMap::new(),
            tokens: BTreeMap::new(),
        })
    }

    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    /// Number of accounts that have signed up.
    pub fn signup_count(&self) -> usize {
        self.registry.len()
    }

    /// Ledger handle of `account`, if it has signed up.
    pub fn token_of(&self, account: &Address) -> Option<Address> {
        self.registry.get(account).copied()
    }

    /// Look up a ledger by handle.
    pub fn token(&self, handle: &Address) -> Result<&TokenLedger, LedgerError> {
        self.tokens
            .get(handle)
            .ok_or(LedgerError::UnknownToken(*handle))
    }

    /// Look up a ledger by handle for a mutating call.
    pub fn token_mut(&mut self, handle: &Address) -> Result<&mut TokenLedger, LedgerError> {
        self.tokens
            .get_mut(handle)
            .ok_or(LedgerError::UnknownToken(*handle))
    }

    /// All ledgers, ordered by handle.
    pub fn tokens(&self) -> impl Iterator<Item = &TokenLedger> {
        self.tokens.values()
    }

    /// Create the caller's personal currency and credit the initial payout.
    ///
    /// The payout is minted into a detached ledger; the registry and ledger
    /// map are only written once that succeeds.
    ///
    /// Emits `Signup(account, token)` then the mint `Transfer(ZERO, account, payout)`.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::AlreadyRegistered`] if the caller already has a ledger
    /// - [`LedgerError::ZeroAddress`] if the caller is the null account
    /// - [`LedgerError::Config`] with [`ConfigError::EmptyTokenName`] for a blank name
    pub fn signup(&mut self, ctx: &CallContext, name: &str) -> Result<Receipt<Address>, LedgerError> {
        let account = ctx.caller;
        if account.is_zero() {
            return Err(LedgerError::ZeroAddress);
        }
        if name.trim().is_empty() {
            return Err(ConfigError::EmptyTokenName.into());
        }
        if self.registry.contains_key(&account) {
            return Err(LedgerError::AlreadyRegistered(account));
        }

        let handle = Address::derive_token(&account);
        let mut ledger = TokenLedger::new(handle, account, name.to_string(), &self.config);
        let minted = ledger.mint(account, self.config.initial_payout, ctx.timestamp)?;

        self.registry.insert(account, handle);
        self.tokens.insert(handle, ledger);

        info!(%account, token = %handle, name, "signup");
        Ok(Receipt::new(
            handle,
            vec![
                Event::Signup {
                    account,
                    token: handle,
                },
                minted,
            ],
        ))
    }
}

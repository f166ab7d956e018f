//! Per-account personal-currency ledger.
//!
//! A [`TokenLedger`] owns one participant's currency: balances, allowances,
//! and the settlement parameters copied from the hub at creation. Balances
//! are settled lazily: every operation first brings the touched accounts up
//! to the call timestamp (demurrage, plus issuance for the owner) and only
//! then applies its delta.
//!
//! Every mutating operation validates everything before writing anything,
//! so a failed call leaves the ledger exactly as it was.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use circles_core::address::Address;
use circles_core::error::LedgerError;
use circles_core::event::{Event, Receipt};
use circles_core::types::{Amount, BalanceEntry, CallContext, HubConfig, SettlementParams, Timestamp};
use circles_decay::settle;

/// Settled balance writes produced by a planned transfer.
///
/// One entry for a self-transfer, two otherwise. Applied only after every
/// check of the enclosing operation has passed.
struct BalanceWrites(Vec<(Address, BalanceEntry)>);

/// A personal-currency ledger bound to its owner.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct TokenLedger {
    address: Address,
    owner: Address,
    name: String,
    symbol: String,
    decimals: u8,
    params: SettlementParams,
    balances: BTreeMap<Address, BalanceEntry>,
    allowances: BTreeMap<Address, BTreeMap<Address, Amount>>,
}

impl TokenLedger {
    /// Create an empty ledger. Only the hub creates ledgers; the initial
    /// payout is credited separately through [`mint`](Self::mint).
    pub(crate) fn new(address: Address, owner: Address, name: String, config: &HubConfig) -> Self {
        Self {
            address,
            owner,
            name,
            symbol: config.symbol.clone(),
            decimals: config.decimals,
            params: config.settlement_params(),
            balances: BTreeMap::new(),
            allowances: BTreeMap::new(),
        }
    }

    /// Handle under which the hub registered this ledger.
    pub fn address(&self) -> Address {
        self.address
    }

    /// The participant whose currency this is.
    pub fn owner(&self) -> Address {
        self.owner
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    pub fn decimals(&self) -> u8 {
        self.decimals
    }

    pub fn params(&self) -> &SettlementParams {
        &self.params
    }

    /// Accounts that have a stored balance entry.
    pub fn holders(&self) -> impl Iterator<Item = &Address> {
        self.balances.keys()
    }

    /// The entry of `account` brought up to `now`, without storing it.
    ///
    /// Accounts with no entry hold zero as of `now`.
    pub fn settled_entry(&self, account: &Address, now: Timestamp) -> Result<BalanceEntry, LedgerError> {
        let stored = self
            .balances
            .get(account)
            .copied()
            .unwrap_or_else(|| BalanceEntry::new(0, now));
        Ok(settle(stored, now, &self.params, *account == self.owner)?)
    }

    /// Settled balance of `account` as of `now`.
    pub fn balance_of(&self, account: &Address, now: Timestamp) -> Result<Amount, LedgerError> {
        Ok(self.settled_entry(account, now)?.raw)
    }

    /// Sum of every holder's settled balance as of `now`.
    ///
    /// Derived on every call so unsettled decay and accrual are always
    /// reflected.
    pub fn total_supply(&self, now: Timestamp) -> Result<Amount, LedgerError> {
        self.balances.keys().try_fold(0u128, |acc, account| {
            let balance = self.balance_of(account, now)?;
            acc.checked_add(balance).ok_or(LedgerError::SupplyOverflow)
        })
    }

    /// Current standing authorization of `spender` over `owner`'s balance.
    pub fn allowance(&self, owner: &Address, spender: &Address) -> Amount {
        self.allowances
            .get(owner)
            .and_then(|m| m.get(spender))
            .copied()
            .unwrap_or(0)
    }

    /// Move `value` from the caller to `to`.
    ///
    /// # Errors
    ///
    /// - [`LedgerError::ZeroAddress`] if `to` (or the caller) is the null account
    /// - [`LedgerError::InsufficientBalance`] if the caller's settled balance is below `value`
    pub fn transfer(
        &mut self,
        ctx: &CallContext,
        to: Address,
        value: Amount,
    ) -> Result<Receipt<bool>, LedgerError> {
        let from = ctx.caller;
        if to.is_zero() || from.is_zero() {
            return Err(LedgerError::ZeroAddress);
        }

        let from_entry = self.checked_debit_source(&from, value, ctx.timestamp)?;
        let writes = self.plan_move(from, from_entry, to, value, ctx.timestamp)?;
        self.apply(writes);

        debug!(token = %self.address, %from, %to, value, "transfer");
        Ok(Receipt::new(true, vec![self.transfer_event(from, to, value)]))
    }

    /// Set the caller's allowance for `spender` to exactly `value`.
    ///
    /// Balance-independent: an approval may exceed what the caller holds.
    pub fn approve(
        &mut self,
        ctx: &CallContext,
        spender: Address,
        value: Amount,
    ) -> Result<Receipt<bool>, LedgerError> {
        let owner = ctx.caller;
        if spender.is_zero() || owner.is_zero() {
            return Err(LedgerError::ZeroAddress);
        }

        self.set_allowance(owner, spender, value);

        debug!(token = %self.address, %owner, %spender, value, "approve");
        Ok(Receipt::new(true, vec![self.approval_event(owner, spender, value)]))
    }

    /// Move `value` from `from` to `to` on behalf of `from`, spending the
    /// caller's allowance.
    ///
    /// Emits `Transfer` followed by `Approval` carrying the remaining allowance.
    ///
    /// # Errors
    ///
    /// Checked in this order:
    /// - [`LedgerError::InsufficientAllowance`] if the caller's allowance is below `value`
    /// - [`LedgerError::InsufficientBalance`] if `from`'s settled balance is below `value`
    /// - [`LedgerError::ZeroAddress`] if `from` or `to` is the null account
    pub fn transfer_from(
        &mut self,
        ctx: &CallContext,
        from: Address,
        to: Address,
        value: Amount,
    ) -> Result<Receipt<bool>, LedgerError> {
        let spender = ctx.caller;
        let current = self.allowance(&from, &spender);
        if current < value {
            return Err(LedgerError::InsufficientAllowance {
                have: current,
                need: value,
            });
        }

        let from_entry = self.checked_debit_source(&from, value, ctx.timestamp)?;
        if from.is_zero() || to.is_zero() {
            return Err(LedgerError::ZeroAddress);
        }
        let writes = self.plan_move(from, from_entry, to, value, ctx.timestamp)?;

        let remaining = current - value;
        self.apply(writes);
        self.set_allowance(from, spender, remaining);

        debug!(token = %self.address, %spender, %from, %to, value, remaining, "transfer_from");
        Ok(Receipt::new(
            true,
            vec![
                self.transfer_event(from, to, value),
                self.approval_event(from, spender, remaining),
            ],
        ))
    }

    /// Reduce the caller's allowance for `spender` by `subtracted`.
    ///
    /// No clamping: subtracting more than the current allowance fails the
    /// whole call.
    pub fn decrease_allowance(
        &mut self,
        ctx: &CallContext,
        spender: Address,
        subtracted: Amount,
    ) -> Result<Receipt<bool>, LedgerError> {
        let owner = ctx.caller;
        if spender.is_zero() || owner.is_zero() {
            return Err(LedgerError::ZeroAddress);
        }

        let current = self.allowance(&owner, &spender);
        let updated = current
            .checked_sub(subtracted)
            .ok_or(LedgerError::InsufficientAllowance {
                have: current,
                need: subtracted,
            })?;
        self.set_allowance(owner, spender, updated);

        debug!(token = %self.address, %owner, %spender, subtracted, updated, "decrease_allowance");
        Ok(Receipt::new(true, vec![self.approval_event(owner, spender, updated)]))
    }

    /// Raise the caller's allowance for `spender` by `added`.
    pub fn increase_allowance(
        &mut self,
        ctx: &CallContext,
        spender: Address,
        added: Amount,
    ) -> Result<Receipt<bool>, LedgerError> {
        let owner = ctx.caller;
        if spender.is_zero() || owner.is_zero() {
            return Err(LedgerError::ZeroAddress);
        }

        let updated = self
            .allowance(&owner, &spender)
            .checked_add(added)
            .ok_or(LedgerError::AllowanceOverflow)?;
        self.set_allowance(owner, spender, updated);

        debug!(token = %self.address, %owner, %spender, added, updated, "increase_allowance");
        Ok(Receipt::new(true, vec![self.approval_event(owner, spender, updated)]))
    }

    /// Create `value` new units for `to`. Emits `Transfer` from the null account.
    ///
    /// Only reachable through hub signup.
    pub(crate) fn mint(&mut self, to: Address, value: Amount, now: Timestamp) -> Result<Event, LedgerError> {
        if to.is_zero() {
            return Err(LedgerError::ZeroAddress);
        }

        let supply = self.total_supply(now)?;
        supply.checked_add(value).ok_or(LedgerError::SupplyOverflow)?;

        let entry = self.settled_entry(&to, now)?;
        let credited = BalanceEntry {
            raw: entry.raw.checked_add(value).ok_or(LedgerError::SupplyOverflow)?,
            ..entry
        };
        self.store(to, credited);

        debug!(token = %self.address, %to, value, "mint");
        Ok(self.transfer_event(Address::ZERO, to, value))
    }

    /// Settle `from` and check it can cover `value`.
    fn checked_debit_source(
        &self,
        from: &Address,
        value: Amount,
        now: Timestamp,
    ) -> Result<BalanceEntry, LedgerError> {
        let entry = self.settled_entry(from, now)?;
        if entry.raw < value {
            return Err(LedgerError::InsufficientBalance {
                have: entry.raw,
                need: value,
            });
        }
        Ok(entry)
    }

    /// Compute the settled entries of a move without writing them.
    ///
    /// `from_entry` must already be settled to `now` and cover `value`.
    fn plan_move(
        &self,
        from: Address,
        from_entry: BalanceEntry,
        to: Address,
        value: Amount,
        now: Timestamp,
    ) -> Result<BalanceWrites, LedgerError> {
        if from == to {
            return Ok(BalanceWrites(vec![(from, from_entry)]));
        }

        let to_entry = self.settled_entry(&to, now)?;
        let debited = BalanceEntry {
            raw: from_entry.raw - value,
            ..from_entry
        };
        let credited = BalanceEntry {
            raw: to_entry
                .raw
                .checked_add(value)
                .ok_or(LedgerError::SupplyOverflow)?,
            ..to_entry
        };
        Ok(BalanceWrites(vec![(from, debited), (to, credited)]))
    }

    fn apply(&mut self, writes: BalanceWrites) {
        for (account, entry) in writes.0 {
            self.store(account, entry);
        }
    }

    /// Write a settled entry. Empty non-owner entries are dropped; the owner
    /// keeps its entry so its issuance clock survives.
    fn store(&mut self, account: Address, entry: BalanceEntry) {
        if entry.raw == 0 && account != self.owner {
            self.balances.remove(&account);
        } else {
            self.balances.insert(account, entry);
        }
    }

    fn set_allowance(&mut self, owner: Address, spender: Address, value: Amount) {
        if value == 0 {
            if let Some(m) = self.allowances.get_mut(&owner) {
                m.remove(&spender);
                if m.is_empty() {
                    self.allowances.remove(&owner);
                }
            }
        } else {
            self.allowances.entry(owner).or_default().insert(spender, value);
        }
    }

    fn transfer_event(&self, from: Address, to: Address, value: Amount) -> Event {
        Event::Transfer {
            token: self.address,
            from,
            to,
            value,
        }
    }

    fn approval_event(&self, owner: Address, spender: Address, value: Amount) -> Event {
        Event::Approval {
            token: self.address,
            owner,
            spender,
            value,
        }
    }
}

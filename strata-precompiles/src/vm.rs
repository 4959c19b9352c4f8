//! VM-side bookkeeping: the account cache a call's journal keeps in sync and
//! the address-keyed precompile set a host routes calls through.

use std::collections::BTreeMap;
use std::sync::Arc;

use strata_ledger::bank::BankKeeper;
use strata_ledger::context::Context;
use strata_types::primitives::{address_to_hex, Address, Amount};
use tracing::debug;

use crate::dispatch::{Log, Precompile, PrecompileOutput};
use crate::error::PrecompileError;
use crate::journal::BalanceOp;

/// The VM's cached view of native-currency balances plus the logs emitted
/// so far.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VmState {
    balances: BTreeMap<Address, Amount>,
    logs: Vec<Log>,
}

impl VmState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the cache with the ledger's current balances of `denom`.
    pub fn load(
        bank: &dyn BankKeeper,
        ctx: &mut Context,
        denom: &str,
        accounts: &[Address],
    ) -> Result<Self, PrecompileError> {
        let mut state = Self::new();
        for account in accounts {
            let balance = bank.balance(ctx, account, denom)?;
            state.balances.insert(*account, balance);
        }
        Ok(state)
    }

    pub fn balance(&self, account: &Address) -> Amount {
        self.balances.get(account).copied().unwrap_or(0)
    }

    pub fn set_balance(&mut self, account: Address, amount: Amount) {
        self.balances.insert(account, amount);
    }

    pub fn logs(&self) -> &[Log] {
        &self.logs
    }

    /// Apply a successful call's balance changes and append its logs.
    ///
    /// All entries are checked before any is applied; a change that would
    /// take a balance below zero or past `u128::MAX` leaves the state as it
    /// was.
    pub fn apply(&mut self, output: &PrecompileOutput) -> Result<(), PrecompileError> {
        let mut staged: BTreeMap<Address, Amount> = BTreeMap::new();
        for entry in &output.balance_changes {
            let current = staged
                .get(&entry.address)
                .copied()
                .unwrap_or_else(|| self.balance(&entry.address));
            let next = match entry.op {
                BalanceOp::Add => current.checked_add(entry.amount),
                BalanceOp::Sub => current.checked_sub(entry.amount),
            }
            .ok_or_else(|| PrecompileError::InvalidInput {
                reason: format!(
                    "balance change of {} on {} out of range",
                    entry.signed_amount(),
                    address_to_hex(&entry.address)
                ),
            })?;
            staged.insert(entry.address, next);
        }
        debug!(
            accounts = staged.len(),
            logs = output.logs.len(),
            "vm state updated"
        );
        self.balances.extend(staged);
        self.logs.extend(output.logs.iter().cloned());
        Ok(())
    }
}

/// Precompiles keyed by the address they answer at.
#[derive(Default, Clone)]
pub struct PrecompileSet {
    by_address: BTreeMap<Address, Arc<dyn Precompile>>,
}

impl PrecompileSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `precompile`. An address can host only one precompile.
    pub fn register(&mut self, precompile: Arc<dyn Precompile>) -> Result<(), PrecompileError> {
        let address = precompile.address();
        if self.by_address.contains_key(&address) {
            return Err(PrecompileError::InvalidInput {
                reason: format!(
                    "precompile already registered at {}",
                    address_to_hex(&address)
                ),
            });
        }
        self.by_address.insert(address, precompile);
        Ok(())
    }

    pub fn get(&self, address: &Address) -> Option<&Arc<dyn Precompile>> {
        self.by_address.get(address)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Precompile>> {
        self.by_address.values()
    }

    pub fn len(&self) -> usize {
        self.by_address.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_address.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::journal::BalanceChangeEntry;

    fn output(entries: Vec<BalanceChangeEntry>) -> PrecompileOutput {
        PrecompileOutput {
            data: vec![],
            logs: vec![Log {
                address: [9u8; 20],
                topics: vec![],
                data: vec![],
            }],
            balance_changes: entries,
            gas_used: 0,
        }
    }

    #[test]
    fn test_apply_moves_balances() {
        let mut state = VmState::new();
        state.set_balance([1u8; 20], 100);
        state
            .apply(&output(vec![
                BalanceChangeEntry::new([1u8; 20], 40, BalanceOp::Sub),
                BalanceChangeEntry::new([2u8; 20], 40, BalanceOp::Add),
            ]))
            .unwrap();
        assert_eq!(state.balance(&[1u8; 20]), 60);
        assert_eq!(state.balance(&[2u8; 20]), 40);
        assert_eq!(state.logs().len(), 1);
    }

    #[test]
    fn test_apply_is_atomic() {
        let mut state = VmState::new();
        state.set_balance([1u8; 20], 10);
        let before = state.clone();
        let result = state.apply(&output(vec![
            BalanceChangeEntry::new([2u8; 20], 5, BalanceOp::Add),
            BalanceChangeEntry::new([1u8; 20], 11, BalanceOp::Sub),
        ]));
        assert!(result.is_err());
        assert_eq!(state, before);
    }
}

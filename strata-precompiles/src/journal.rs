use serde::Serialize;
use strata_types::primitives::{Address, Amount};

/// Direction of a balance change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BalanceOp {
    Add,
    Sub,
}

/// A change to a VM-visible native-currency balance made outside the VM's
/// own value-transfer path.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BalanceChangeEntry {
    #[serde(with = "strata_types::primitives::serde_address")]
    pub address: Address,
    #[serde(with = "strata_types::primitives::serde_amount")]
    pub amount: Amount,
    pub op: BalanceOp,
}

impl BalanceChangeEntry {
    pub fn new(address: Address, amount: Amount, op: BalanceOp) -> Self {
        Self {
            address,
            amount,
            op,
        }
    }

    pub fn signed_amount(&self) -> i128 {
        let amount = i128::try_from(self.amount).unwrap_or(i128::MAX);
        match self.op {
            BalanceOp::Add => amount,
            BalanceOp::Sub => -amount,
        }
    }
}

/// Collects balance changes for one call. Only movements of the VM's native
/// denom are recorded; everything else is invisible to the VM account cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceChangeJournal {
    evm_denom: String,
    entries: Vec<BalanceChangeEntry>,
}

impl BalanceChangeJournal {
    pub fn new(evm_denom: impl Into<String>) -> Self {
        Self {
            evm_denom: evm_denom.into(),
            entries: Vec::new(),
        }
    }

    pub fn tracks(&self, denom: &str) -> bool {
        self.evm_denom == denom
    }

    pub fn credit(&mut self, denom: &str, address: Address, amount: Amount) {
        if self.tracks(denom) {
            self.entries
                .push(BalanceChangeEntry::new(address, amount, BalanceOp::Add));
        }
    }

    pub fn debit(&mut self, denom: &str, address: Address, amount: Amount) {
        if self.tracks(denom) {
            self.entries
                .push(BalanceChangeEntry::new(address, amount, BalanceOp::Sub));
        }
    }

    /// Record a move between two accounts as a debit/credit pair.
    pub fn transfer(&mut self, denom: &str, from: Address, to: Address, amount: Amount) {
        self.debit(denom, from, amount);
        self.credit(denom, to, amount);
    }

    /// Sum of signed entries.
    pub fn net(&self) -> i128 {
        self.entries.iter().map(|e| e.signed_amount()).sum()
    }

    pub fn entries(&self) -> &[BalanceChangeEntry] {
        &self.entries
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_entries(self) -> Vec<BalanceChangeEntry> {
        self.entries
    }
}

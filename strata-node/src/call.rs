use serde::Serialize;
use strata_precompiles::dispatch::Log;
use strata_precompiles::journal::BalanceChangeEntry;
use strata_precompiles::setup::Contract;
use strata_precompiles::Precompile;
use strata_types::primitives::{address_to_hex, Address};
use tracing::{info, warn};

use crate::genesis::Ledger;

/// A call as the VM would submit it.
#[derive(Debug, Clone)]
pub struct CallRequest {
    pub caller: Address,
    pub origin: Address,
    pub input: Vec<u8>,
    pub gas: u64,
    pub read_only: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogView {
    pub address: String,
    pub topics: Vec<String>,
    pub data: String,
}

impl From<&Log> for LogView {
    fn from(log: &Log) -> Self {
        Self {
            address: address_to_hex(&log.address),
            topics: log
                .topics
                .iter()
                .map(|t| format!("0x{}", hex::encode(t)))
                .collect(),
            data: format!("0x{}", hex::encode(&log.data)),
        }
    }
}

/// Outcome printed by `strata call`.
#[derive(Debug, Clone, Serialize)]
pub struct CallReport {
    pub precompile: String,
    pub address: String,
    pub success: bool,
    /// Return data on success, the `Error(string)` payload on revert.
    pub output: String,
    pub gas_used: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub logs: Vec<LogView>,
    pub balance_changes: Vec<BalanceChangeEntry>,
}

/// Run one call against the ledger. Successful calls are committed; a
/// revert leaves the ledger untouched and is reported, not returned as an
/// error.
pub fn execute_call(
    ledger: &Ledger,
    precompile: &dyn Precompile,
    request: CallRequest,
) -> CallReport {
    let ctx = ledger.ctx();
    let mut contract = Contract::new(
        request.caller,
        precompile.address(),
        request.input,
        request.gas,
    );
    let result = precompile.run(&ctx, &mut contract, request.origin, request.read_only);
    let gas_used = request.gas.saturating_sub(contract.gas);

    let mut report = CallReport {
        precompile: precompile.name().to_string(),
        address: address_to_hex(&precompile.address()),
        success: false,
        output: String::new(),
        gas_used,
        error: None,
        logs: Vec::new(),
        balance_changes: Vec::new(),
    };
    match result {
        Ok(output) => {
            info!(
                precompile = precompile.name(),
                gas_used,
                logs = output.logs.len(),
                "call committed"
            );
            report.success = true;
            report.output = format!("0x{}", hex::encode(&output.data));
            report.logs = output.logs.iter().map(LogView::from).collect();
            report.balance_changes = output.balance_changes;
        }
        Err(err) => {
            warn!(precompile = precompile.name(), error = %err, "call reverted");
            report.output = format!("0x{}", hex::encode(err.revert_data()));
            report.error = Some(err.to_string());
        }
    }
    report
}

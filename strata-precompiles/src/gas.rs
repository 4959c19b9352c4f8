use strata_ledger::context::Context;
use strata_ledger::gas::GasMeter;
use tracing::warn;

use crate::descriptor::OperationDescriptor;
use crate::error::PrecompileError;
use crate::setup::Contract;

/// Reconciles the VM's gas budget with native ledger gas consumption.
///
/// The native meter handed to the handler is capped at the contract's
/// remaining gas, so native exhaustion surfaces as an error inside the
/// handler and the branched store is never written.
#[derive(Debug, Clone, Copy)]
pub struct GasAccountant {
    initial_gas: u64,
}

impl GasAccountant {
    /// Reject early when the static cost alone exceeds the budget. The static
    /// cost is not deducted; only metered consumption is.
    pub fn pre_check<Op>(
        desc: &OperationDescriptor<Op>,
        contract: &Contract,
    ) -> Result<(), PrecompileError> {
        if desc.gas > contract.gas {
            warn!(
                method = desc.name,
                cost = desc.gas,
                gas = contract.gas,
                "static cost exceeds gas budget"
            );
            return Err(PrecompileError::OutOfGas);
        }
        Ok(())
    }

    /// Native meter bounded by the contract's remaining gas.
    pub fn meter_for(contract: &Contract) -> GasMeter {
        GasMeter::new(contract.gas)
    }

    /// Snapshot the native meter before the handler runs.
    pub fn start(ctx: &Context) -> Self {
        Self {
            initial_gas: ctx.gas_meter().used(),
        }
    }

    pub fn initial_gas(&self) -> u64 {
        self.initial_gas
    }

    /// Charge the contract for what the handler consumed.
    ///
    /// Returns the handler's value and the gas charged. Native exhaustion
    /// drains the contract and stays an out-of-gas error; other failures
    /// pass through untouched.
    pub fn settle<T>(
        &self,
        ctx: &Context,
        contract: &mut Contract,
        result: Result<T, PrecompileError>,
    ) -> Result<(T, u64), PrecompileError> {
        let consumed = ctx.gas_meter().used().saturating_sub(self.initial_gas);
        match result {
            Ok(value) => {
                if !contract.use_gas(consumed) {
                    warn!(cost = consumed, gas = contract.gas, "gas reconciliation failed");
                    return Err(PrecompileError::OutOfGas);
                }
                Ok((value, consumed))
            }
            Err(PrecompileError::OutOfGas) => {
                let drained = consumed.min(contract.gas);
                contract.use_gas(drained);
                warn!(cost = consumed, "native gas exhausted");
                Err(PrecompileError::OutOfGas)
            }
            Err(err) => Err(err),
        }
    }
}

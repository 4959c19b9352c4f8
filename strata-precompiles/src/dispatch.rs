use strata_ledger::context::Context;
use strata_ledger::error::LedgerError;
use strata_types::primitives::{address_to_hex, Address, Hash};
use tracing::{debug, info, warn};

use crate::abi::Selector;
use crate::authorization::Authorized;
use crate::descriptor::{DescriptorTable, MethodKind};
use crate::error::PrecompileError;
use crate::journal::{BalanceChangeEntry, BalanceChangeJournal};
use crate::setup::{run_setup, CallArgs, Contract, Setup};

/// A VM log record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Log {
    pub address: Address,
    pub topics: Vec<Hash>,
    pub data: Vec<u8>,
}

/// What a successful call hands back to the VM.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrecompileOutput {
    pub data: Vec<u8>,
    pub logs: Vec<Log>,
    pub balance_changes: Vec<BalanceChangeEntry>,
    pub gas_used: u64,
}

/// One in-flight call as seen by an operation handler.
pub struct Call<'c> {
    /// Branched, gas-capped ledger context.
    pub ctx: &'c mut Context,
    pub method: &'static str,
    pub caller: Address,
    /// Transaction origin.
    pub origin: Address,
    /// Address of the precompile being called.
    pub address: Address,
    pub args: CallArgs,
}

/// Stages of a call. Any failure jumps to `Failed` with nothing emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallStage {
    Decoded,
    Authorized,
    Executed,
    Journaled,
    Emitted,
    Completed,
    Failed,
}

impl std::fmt::Display for CallStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CallStage::Decoded => "decoded",
            CallStage::Authorized => "authorized",
            CallStage::Executed => "executed",
            CallStage::Journaled => "journaled",
            CallStage::Emitted => "emitted",
            CallStage::Completed => "completed",
            CallStage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Observable effects of a completed operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Completed {
    pub data: Vec<u8>,
    pub logs: Vec<Log>,
    pub balance_changes: Vec<BalanceChangeEntry>,
}

/// One exposed operation of a capability `P`.
///
/// [`drive`] calls the stages in order and only reaches `journal` and `emit`
/// once `execute` has returned `Ok`.
pub trait OperationHandler<P: ?Sized> {
    /// Validated request built from the call arguments.
    type Request;
    /// What execution produced.
    type Effect;

    fn validate(&self, precompile: &P, call: &mut Call<'_>)
        -> Result<Self::Request, PrecompileError>;

    fn authorize(
        &self,
        _precompile: &P,
        _call: &mut Call<'_>,
        _request: &Self::Request,
    ) -> Result<Authorized, PrecompileError> {
        Ok(Authorized::NotRequired)
    }

    fn execute(
        &self,
        precompile: &P,
        call: &mut Call<'_>,
        request: &Self::Request,
        authorized: &Authorized,
    ) -> Result<Self::Effect, PrecompileError>;

    fn journal(
        &self,
        _precompile: &P,
        _request: &Self::Request,
        _effect: &Self::Effect,
        _journal: &mut BalanceChangeJournal,
    ) {
    }

    fn emit(
        &self,
        _precompile: &P,
        _call: &Call<'_>,
        _request: &Self::Request,
        _effect: &Self::Effect,
    ) -> Vec<Log> {
        Vec::new()
    }

    fn output(&self, request: &Self::Request, effect: &Self::Effect) -> Vec<u8>;
}

fn run_stages<P, H>(
    handler: &H,
    precompile: &P,
    call: &mut Call<'_>,
) -> Result<Completed, PrecompileError>
where
    P: Capability + ?Sized,
    H: OperationHandler<P>,
{
    let method = call.method;
    let request = handler.validate(precompile, call)?;
    debug!(method, stage = %CallStage::Decoded);

    let authorized = handler.authorize(precompile, call, &request)?;
    debug!(method, stage = %CallStage::Authorized);

    let effect = handler.execute(precompile, call, &request, &authorized)?;
    debug!(method, stage = %CallStage::Executed);

    let mut journal = BalanceChangeJournal::new(precompile.evm_denom());
    handler.journal(precompile, &request, &effect, &mut journal);
    debug!(method, stage = %CallStage::Journaled, entries = journal.entries().len());

    let logs = handler.emit(precompile, call, &request, &effect);
    debug!(method, stage = %CallStage::Emitted, logs = logs.len());

    Ok(Completed {
        data: handler.output(&request, &effect),
        logs,
        balance_changes: journal.into_entries(),
    })
}

/// Drive one handler through the call state machine.
pub fn drive<P, H>(
    handler: &H,
    precompile: &P,
    call: &mut Call<'_>,
) -> Result<Completed, PrecompileError>
where
    P: Capability + ?Sized,
    H: OperationHandler<P>,
{
    let method = call.method;
    match run_stages(handler, precompile, call) {
        Ok(completed) => {
            debug!(method, stage = %CallStage::Completed);
            Ok(completed)
        }
        Err(err) => {
            debug!(method, stage = %CallStage::Failed, error = %err);
            Err(err)
        }
    }
}

/// A family of operations exposed at one address.
pub trait Capability: Send + Sync {
    /// Closed set of operations, one per descriptor.
    type Op: Copy + Eq + std::fmt::Debug;

    fn name(&self) -> &'static str;

    fn address(&self) -> Address;

    /// Denom the VM treats as its native currency.
    fn evm_denom(&self) -> &str;

    fn descriptors(&self) -> &DescriptorTable<Self::Op>;

    /// Route `op` to its handler. Implementations match exhaustively.
    fn handle(&self, op: Self::Op, call: &mut Call<'_>) -> Result<Completed, PrecompileError>;
}

/// A method as listed to users.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MethodInfo {
    pub selector: Selector,
    pub signature: &'static str,
    pub kind: MethodKind,
    pub gas: u64,
}

/// Object-safe face of a capability, used by hosts that keep precompiles
/// keyed by address.
pub trait Precompile: Send + Sync {
    fn name(&self) -> &'static str;

    fn address(&self) -> Address;

    fn required_gas(&self, input: &[u8]) -> u64;

    fn methods(&self) -> Vec<MethodInfo>;

    fn run(
        &self,
        ctx: &Context,
        contract: &mut Contract,
        origin: Address,
        read_only: bool,
    ) -> Result<PrecompileOutput, PrecompileError>;
}

impl<C: Capability> Precompile for C {
    fn name(&self) -> &'static str {
        Capability::name(self)
    }

    fn address(&self) -> Address {
        Capability::address(self)
    }

    fn required_gas(&self, input: &[u8]) -> u64 {
        self.descriptors().required_gas(input)
    }

    fn methods(&self) -> Vec<MethodInfo> {
        self.descriptors()
            .iter()
            .map(|d| MethodInfo {
                selector: d.selector,
                signature: d.signature,
                kind: d.kind,
                gas: d.gas,
            })
            .collect()
    }

    fn run(
        &self,
        ctx: &Context,
        contract: &mut Contract,
        origin: Address,
        read_only: bool,
    ) -> Result<PrecompileOutput, PrecompileError> {
        run(self, ctx, contract, origin, read_only)
    }
}

/// Execute one VM call against `capability`.
///
/// Ledger writes happen in a branch of `ctx` that is written back only when
/// the handler and the gas reconciliation both succeed. On failure the VM
/// receives the error and no logs or balance changes.
pub fn run<C: Capability + ?Sized>(
    capability: &C,
    ctx: &Context,
    contract: &mut Contract,
    origin: Address,
    read_only: bool,
) -> Result<PrecompileOutput, PrecompileError> {
    let Setup {
        ctx: mut branch,
        cache,
        descriptor,
        accountant,
        args,
    } = run_setup(Capability::descriptors(capability), ctx, contract, read_only)?;

    let result = {
        let mut call = Call {
            ctx: &mut branch,
            method: descriptor.name,
            caller: contract.caller,
            origin,
            address: Capability::address(capability),
            args,
        };
        capability.handle(descriptor.op, &mut call)
    };

    let (completed, gas_used) = match accountant.settle(&branch, contract, result) {
        Ok(settled) => settled,
        Err(err) => {
            warn!(
                precompile = Capability::name(capability),
                method = descriptor.name,
                caller = %address_to_hex(&contract.caller),
                error = %err,
                "precompile call reverted"
            );
            return Err(err);
        }
    };

    cache.write().map_err(LedgerError::from)?;
    info!(
        precompile = Capability::name(capability),
        method = descriptor.name,
        caller = %address_to_hex(&contract.caller),
        gas = gas_used,
        logs = completed.logs.len(),
        "precompile call completed"
    );
    Ok(PrecompileOutput {
        data: completed.data,
        logs: completed.logs,
        balance_changes: completed.balance_changes,
        gas_used,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use primitive_types::U256;
    use strata_ledger::memory::MemoryStore;

    use super::*;
    use crate::abi::{encode, encode_call, ParamType, Token};
    use crate::descriptor::OperationDescriptor;

    const KEY: &[u8] = b"counter";

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum CounterOp {
        Add,
        Get,
    }

    /// Stores a counter; `add` fails when the result would exceed a cap,
    /// after having written to the store.
    struct Counter {
        table: DescriptorTable<CounterOp>,
    }

    impl Counter {
        fn new() -> Self {
            let table = DescriptorTable::new(vec![
                OperationDescriptor::new(
                    CounterOp::Add,
                    "add(uint256)",
                    &[ParamType::Uint256],
                    MethodKind::Transaction,
                    100,
                ),
                OperationDescriptor::new(CounterOp::Get, "get()", &[], MethodKind::Query, 10),
            ])
            .unwrap();
            Self { table }
        }
    }

    struct AddHandler;

    impl OperationHandler<Counter> for AddHandler {
        type Request = u128;
        type Effect = u128;

        fn validate(&self, _: &Counter, call: &mut Call<'_>) -> Result<u128, PrecompileError> {
            call.args.expect_len(1)?;
            call.args.amount(0, "amount")
        }

        fn execute(
            &self,
            _: &Counter,
            call: &mut Call<'_>,
            amount: &u128,
            _: &Authorized,
        ) -> Result<u128, PrecompileError> {
            let current: u128 = call.ctx.get_borsh(KEY)?.unwrap_or(0);
            let next = current + amount;
            call.ctx.set_borsh(KEY, &next)?;
            if next > 100 {
                return Err(PrecompileError::validation("cap exceeded"));
            }
            Ok(next)
        }

        fn emit(&self, _: &Counter, call: &Call<'_>, _: &u128, next: &u128) -> Vec<Log> {
            vec![Log {
                address: call.address,
                topics: vec![],
                data: encode(&[Token::Uint(U256::from(*next))]),
            }]
        }

        fn output(&self, _: &u128, next: &u128) -> Vec<u8> {
            encode(&[Token::Uint(U256::from(*next))])
        }
    }

    struct GetHandler;

    impl OperationHandler<Counter> for GetHandler {
        type Request = ();
        type Effect = u128;

        fn validate(&self, _: &Counter, call: &mut Call<'_>) -> Result<(), PrecompileError> {
            call.args.expect_len(0)
        }

        fn execute(
            &self,
            _: &Counter,
            call: &mut Call<'_>,
            _: &(),
            _: &Authorized,
        ) -> Result<u128, PrecompileError> {
            Ok(call.ctx.get_borsh(KEY)?.unwrap_or(0))
        }

        fn output(&self, _: &(), value: &u128) -> Vec<u8> {
            encode(&[Token::Uint(U256::from(*value))])
        }
    }

    impl Capability for Counter {
        type Op = CounterOp;

        fn name(&self) -> &'static str {
            "counter"
        }

        fn address(&self) -> Address {
            [0x0C; 20]
        }

        fn evm_denom(&self) -> &str {
            "abridge"
        }

        fn descriptors(&self) -> &DescriptorTable<CounterOp> {
            &self.table
        }

        fn handle(&self, op: CounterOp, call: &mut Call<'_>) -> Result<Completed, PrecompileError> {
            match op {
                CounterOp::Add => drive(&AddHandler, self, call),
                CounterOp::Get => drive(&GetHandler, self, call),
            }
        }
    }

    fn add(amount: u64, gas: u64) -> Contract {
        Contract::new(
            [1u8; 20],
            [0x0C; 20],
            encode_call("add(uint256)", &[Token::Uint(U256::from(amount))]),
            gas,
        )
    }

    fn stored(store: &Arc<MemoryStore>) -> u128 {
        let mut ctx = Context::new(store.clone(), 1, 0);
        ctx.get_borsh(KEY).unwrap().unwrap_or(0)
    }

    #[test]
    fn test_success_commits_and_charges() {
        let store = Arc::new(MemoryStore::new());
        let ctx = Context::new(store.clone(), 1, 0);
        let counter = Counter::new();

        let mut contract = add(40, 100_000);
        let out = Precompile::run(&counter, &ctx, &mut contract, [1u8; 20], false).unwrap();
        assert_eq!(out.logs.len(), 1);
        assert!(out.gas_used > 0);
        assert_eq!(contract.gas, 100_000 - out.gas_used);
        assert_eq!(stored(&store), 40);
    }

    #[test]
    fn test_failure_discards_writes() {
        let store = Arc::new(MemoryStore::new());
        let ctx = Context::new(store.clone(), 1, 0);
        let counter = Counter::new();

        let mut contract = add(101, 100_000);
        let err = Precompile::run(&counter, &ctx, &mut contract, [1u8; 20], false).unwrap_err();
        assert_eq!(err.to_string(), "cap exceeded");
        assert_eq!(stored(&store), 0);
    }

    #[test]
    fn test_native_exhaustion_reverts_cleanly() {
        let store = Arc::new(MemoryStore::new());
        let ctx = Context::new(store.clone(), 1, 0);
        let counter = Counter::new();

        // Enough for the static cost and the read, not for the write.
        let mut contract = add(1, 1_500);
        let err = Precompile::run(&counter, &ctx, &mut contract, [1u8; 20], false).unwrap_err();
        assert_eq!(err, PrecompileError::OutOfGas);
        assert_eq!(contract.gas, 0);
        assert_eq!(stored(&store), 0);
    }

    #[test]
    fn test_query_in_read_only_frame() {
        let store = Arc::new(MemoryStore::new());
        let ctx = Context::new(store.clone(), 1, 0);
        let counter = Counter::new();

        let mut contract = Contract::new([1u8; 20], [0x0C; 20], encode_call("get()", &[]), 50_000);
        let out = Precompile::run(&counter, &ctx, &mut contract, [1u8; 20], true).unwrap();
        assert_eq!(out.data, encode(&[Token::Uint(U256::zero())]));
        assert!(out.logs.is_empty());

        let mut contract = add(1, 50_000);
        assert_eq!(
            Precompile::run(&counter, &ctx, &mut contract, [1u8; 20], true),
            Err(PrecompileError::WriteProtection)
        );
    }

    #[test]
    fn test_methods_listing() {
        let counter = Counter::new();
        let methods = Precompile::methods(&counter);
        assert_eq!(methods.len(), 2);
        assert!(methods.iter().any(|m| m.signature == "add(uint256)" && m.gas == 100));
        assert_eq!(
            Precompile::required_gas(&counter, &encode_call("get()", &[])),
            10
        );
    }
}

use std::sync::Arc;

use primitive_types::U256;
use strata_ledger::cache::CacheStore;
use strata_ledger::context::Context;
use strata_types::primitives::{Address, Amount};
use tracing::debug;

use crate::abi::{self, Token};
use crate::descriptor::{DescriptorTable, OperationDescriptor};
use crate::error::PrecompileError;
use crate::gas::GasAccountant;

/// The VM's view of the frame invoking a precompile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Contract {
    /// Immediate caller of the precompile.
    pub caller: Address,
    /// Address the call was made to.
    pub address: Address,
    pub input: Vec<u8>,
    /// Gas remaining in the frame.
    pub gas: u64,
}

impl Contract {
    pub fn new(caller: Address, address: Address, input: Vec<u8>, gas: u64) -> Self {
        Self {
            caller,
            address,
            input,
            gas,
        }
    }

    /// Deduct gas; `false` (and no deduction) when the frame cannot pay.
    pub fn use_gas(&mut self, amount: u64) -> bool {
        if self.gas < amount {
            return false;
        }
        self.gas -= amount;
        true
    }
}

/// Decoded positional arguments with typed accessors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallArgs {
    tokens: Vec<Token>,
}

impl CallArgs {
    pub fn new(tokens: Vec<Token>) -> Self {
        Self { tokens }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn expect_len(&self, expected: usize) -> Result<(), PrecompileError> {
        if self.tokens.len() != expected {
            return Err(PrecompileError::InvalidNumberOfArgs {
                expected,
                actual: self.tokens.len(),
            });
        }
        Ok(())
    }

    fn get(&self, index: usize) -> Result<&Token, PrecompileError> {
        self.tokens
            .get(index)
            .ok_or(PrecompileError::InvalidNumberOfArgs {
                expected: index + 1,
                actual: self.tokens.len(),
            })
    }

    pub fn address(&self, index: usize, name: &str) -> Result<Address, PrecompileError> {
        match self.get(index)? {
            Token::Address(addr) => Ok(*addr),
            other => Err(PrecompileError::invalid_argument(name, format!("{other:?}"))),
        }
    }

    pub fn uint(&self, index: usize, name: &str) -> Result<U256, PrecompileError> {
        match self.get(index)? {
            Token::Uint(value) => Ok(*value),
            other => Err(PrecompileError::invalid_argument(name, format!("{other:?}"))),
        }
    }

    /// A `uint256` argument that must fit a ledger amount.
    pub fn amount(&self, index: usize, name: &str) -> Result<Amount, PrecompileError> {
        let value = self.uint(index, name)?;
        if value > U256::from(Amount::MAX) {
            return Err(PrecompileError::invalid_argument(name, value));
        }
        Ok(value.low_u128())
    }

    pub fn string(&self, index: usize, name: &str) -> Result<String, PrecompileError> {
        match self.get(index)? {
            Token::String(s) => Ok(s.clone()),
            other => Err(PrecompileError::invalid_argument(name, format!("{other:?}"))),
        }
    }
}

/// Everything a handler needs, extracted from one VM call.
pub struct Setup<'t, Op> {
    /// Branched context with a meter capped at the contract's gas.
    pub ctx: Context,
    /// Buffered writes of `ctx`; written back only when the call succeeds.
    pub cache: Arc<CacheStore>,
    pub descriptor: &'t OperationDescriptor<Op>,
    pub accountant: GasAccountant,
    pub args: CallArgs,
}

/// Resolve the method, enforce read-only frames, run the static gas check,
/// decode arguments and branch the ledger context.
pub fn run_setup<'t, Op>(
    table: &'t DescriptorTable<Op>,
    ctx: &Context,
    contract: &Contract,
    read_only: bool,
) -> Result<Setup<'t, Op>, PrecompileError> {
    let unknown = || PrecompileError::UnknownMethod {
        selector: format!("0x{}", hex::encode(&contract.input[..contract.input.len().min(4)])),
    };
    if contract.input.len() < 4 {
        return Err(unknown());
    }
    let mut sel = [0u8; 4];
    sel.copy_from_slice(&contract.input[..4]);
    let descriptor = table.lookup(&sel).ok_or_else(unknown)?;

    if read_only && descriptor.kind.is_transaction() {
        return Err(PrecompileError::WriteProtection);
    }
    GasAccountant::pre_check(descriptor, contract)?;

    let args = CallArgs::new(abi::decode(descriptor.inputs, &contract.input[4..])?);

    let (mut branch, cache) = ctx.cache_context();
    branch.set_gas_meter(GasAccountant::meter_for(contract));
    let accountant = GasAccountant::start(&branch);

    debug!(
        method = descriptor.name,
        kind = %descriptor.kind,
        args = args.len(),
        gas = contract.gas,
        "call decoded"
    );
    Ok(Setup {
        ctx: branch,
        cache,
        descriptor,
        accountant,
        args,
    })
}

#[cfg(test)]
mod tests {
    use strata_ledger::memory::MemoryStore;

    use super::*;
    use crate::abi::{encode_call, selector, ParamType};
    use crate::descriptor::MethodKind;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Op {
        Read,
        Write,
    }

    fn table() -> DescriptorTable<Op> {
        DescriptorTable::new(vec![
            OperationDescriptor::new(
                Op::Read,
                "read(address)",
                &[ParamType::Address],
                MethodKind::Query,
                100,
            ),
            OperationDescriptor::new(
                Op::Write,
                "write(uint256)",
                &[ParamType::Uint256],
                MethodKind::Transaction,
                1_000,
            ),
        ])
        .unwrap()
    }

    fn ctx() -> Context {
        Context::new(Arc::new(MemoryStore::new()), 1, 0)
    }

    #[test]
    fn test_use_gas() {
        let mut contract = Contract::new([0u8; 20], [0u8; 20], vec![], 10);
        assert!(contract.use_gas(4));
        assert!(!contract.use_gas(7));
        assert_eq!(contract.gas, 6);
    }

    #[test]
    fn test_short_input_is_unknown_method() {
        let contract = Contract::new([1u8; 20], [2u8; 20], vec![0xab, 0xcd], 10_000);
        let err = run_setup(&table(), &ctx(), &contract, false).err().unwrap();
        assert_eq!(
            err,
            PrecompileError::UnknownMethod {
                selector: "0xabcd".to_string()
            }
        );
    }

    #[test]
    fn test_write_protection() {
        let input = encode_call("write(uint256)", &[Token::Uint(U256::from(1u8))]);
        let contract = Contract::new([1u8; 20], [2u8; 20], input, 10_000);
        let err = run_setup(&table(), &ctx(), &contract, true).err().unwrap();
        assert_eq!(err, PrecompileError::WriteProtection);

        let input = encode_call("read(address)", &[Token::Address([3u8; 20])]);
        let contract = Contract::new([1u8; 20], [2u8; 20], input, 10_000);
        assert!(run_setup(&table(), &ctx(), &contract, true).is_ok());
    }

    #[test]
    fn test_setup_caps_native_meter() {
        let input = encode_call("read(address)", &[Token::Address([3u8; 20])]);
        let contract = Contract::new([1u8; 20], [2u8; 20], input, 4_321);
        let table = table();
        let setup = run_setup(&table, &ctx(), &contract, false).unwrap();
        assert_eq!(setup.ctx.gas_meter().limit, 4_321);
        assert_eq!(setup.accountant.initial_gas(), 0);
        assert_eq!(setup.args.address(0, "account").unwrap(), [3u8; 20]);
    }

    #[test]
    fn test_empty_arguments_decode_to_nothing() {
        let contract = Contract::new(
            [1u8; 20],
            [2u8; 20],
            selector("read(address)").to_vec(),
            10_000,
        );
        let table = table();
        let setup = run_setup(&table, &ctx(), &contract, false).unwrap();
        assert_eq!(
            setup.args.expect_len(1),
            Err(PrecompileError::InvalidNumberOfArgs {
                expected: 1,
                actual: 0
            })
        );
    }

    #[test]
    fn test_amount_overflow() {
        let args = CallArgs::new(vec![Token::Uint(U256::MAX)]);
        assert!(matches!(
            args.amount(0, "amount"),
            Err(PrecompileError::InvalidArgument { .. })
        ));
        let args = CallArgs::new(vec![Token::Uint(U256::from(5u8))]);
        assert_eq!(args.amount(0, "amount").unwrap(), 5);
    }
}

//! ERC-20 facade over a native denomination.
//!
//! One instance is registered per token pair, at the pair's ERC-20 address.
//! Balances and supply live in the bank; allowances are send grants in the
//! authz store keyed by (owner, spender, `MsgSend`).

mod approve;
pub mod events;
mod query;
mod tx;

use std::sync::Arc;

use strata_ledger::authz::AuthzKeeper;
use strata_ledger::bank::BankKeeper;
use strata_types::constants::DEFAULT_APPROVAL_EXPIRATION;
use strata_types::primitives::{Address, Timestamp};
use strata_types::token::{Metadata, TokenPair};

use crate::abi::ParamType;
use crate::descriptor::{DescriptorTable, MethodKind, OperationDescriptor};
use crate::dispatch::{drive, Call, Capability, Completed};
use crate::error::PrecompileError;

use approve::{AllowanceChange, ApproveHandler};
use query::{
    AllowanceHandler, BalanceOfHandler, MetadataField, MetadataHandler, TotalSupplyHandler,
};
use tx::{BurnHandler, MintHandler, TransferHandler, TransferMode};

pub const TRANSFER_GAS: u64 = 3_000_000;
pub const TRANSFER_FROM_GAS: u64 = 3_000_000;
pub const APPROVE_GAS: u64 = 30_956;
pub const INCREASE_ALLOWANCE_GAS: u64 = 34_605;
pub const DECREASE_ALLOWANCE_GAS: u64 = 34_519;
pub const MINT_GAS: u64 = 3_000_000;
pub const BURN_GAS: u64 = 3_000_000;
pub const NAME_GAS: u64 = 3_421;
pub const SYMBOL_GAS: u64 = 3_464;
pub const DECIMALS_GAS: u64 = 427;
pub const TOTAL_SUPPLY_GAS: u64 = 2_477;
pub const BALANCE_OF_GAS: u64 = 2_851;
pub const ALLOWANCE_GAS: u64 = 3_246;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Erc20Op {
    Transfer,
    TransferFrom,
    Approve,
    IncreaseAllowance,
    DecreaseAllowance,
    Mint,
    Burn,
    Name,
    Symbol,
    Decimals,
    TotalSupply,
    BalanceOf,
    Allowance,
}

fn descriptors() -> Result<DescriptorTable<Erc20Op>, PrecompileError> {
    use MethodKind::{Query, Transaction};
    use ParamType::{Address as A, Uint256 as U};

    DescriptorTable::new(vec![
        OperationDescriptor::new(
            Erc20Op::Transfer,
            "transfer(address,uint256)",
            &[A, U],
            Transaction,
            TRANSFER_GAS,
        ),
        OperationDescriptor::new(
            Erc20Op::TransferFrom,
            "transferFrom(address,address,uint256)",
            &[A, A, U],
            Transaction,
            TRANSFER_FROM_GAS,
        ),
        OperationDescriptor::new(
            Erc20Op::Approve,
            "approve(address,uint256)",
            &[A, U],
            Transaction,
            APPROVE_GAS,
        ),
        OperationDescriptor::new(
            Erc20Op::IncreaseAllowance,
            "increaseAllowance(address,uint256)",
            &[A, U],
            Transaction,
            INCREASE_ALLOWANCE_GAS,
        ),
        OperationDescriptor::new(
            Erc20Op::DecreaseAllowance,
            "decreaseAllowance(address,uint256)",
            &[A, U],
            Transaction,
            DECREASE_ALLOWANCE_GAS,
        ),
        OperationDescriptor::new(
            Erc20Op::Mint,
            "mint(address,uint256)",
            &[A, U],
            Transaction,
            MINT_GAS,
        ),
        OperationDescriptor::new(Erc20Op::Burn, "burn(uint256)", &[U], Transaction, BURN_GAS),
        OperationDescriptor::new(Erc20Op::Name, "name()", &[], Query, NAME_GAS),
        OperationDescriptor::new(Erc20Op::Symbol, "symbol()", &[], Query, SYMBOL_GAS),
        OperationDescriptor::new(Erc20Op::Decimals, "decimals()", &[], Query, DECIMALS_GAS),
        OperationDescriptor::new(
            Erc20Op::TotalSupply,
            "totalSupply()",
            &[],
            Query,
            TOTAL_SUPPLY_GAS,
        ),
        OperationDescriptor::new(
            Erc20Op::BalanceOf,
            "balanceOf(address)",
            &[A],
            Query,
            BALANCE_OF_GAS,
        ),
        OperationDescriptor::new(
            Erc20Op::Allowance,
            "allowance(address,address)",
            &[A, A],
            Query,
            ALLOWANCE_GAS,
        ),
    ])
}

/// ERC-20 precompile for one token pair.
pub struct Erc20Precompile {
    pair: TokenPair,
    /// Used when the bank holds no metadata for the denom.
    metadata: Metadata,
    evm_denom: String,
    approval_expiration: Timestamp,
    bank: Arc<dyn BankKeeper>,
    authz: Arc<dyn AuthzKeeper>,
    table: DescriptorTable<Erc20Op>,
}

impl Erc20Precompile {
    pub fn new(
        pair: TokenPair,
        metadata: Metadata,
        evm_denom: impl Into<String>,
        bank: Arc<dyn BankKeeper>,
        authz: Arc<dyn AuthzKeeper>,
    ) -> Result<Self, PrecompileError> {
        pair.validate()
            .map_err(|e| PrecompileError::validation(e.to_string()))?;
        Ok(Self {
            pair,
            metadata,
            evm_denom: evm_denom.into(),
            approval_expiration: DEFAULT_APPROVAL_EXPIRATION,
            bank,
            authz,
            table: descriptors()?,
        })
    }

    /// Lifetime, in seconds, of grants created by `approve`.
    pub fn with_approval_expiration(mut self, seconds: Timestamp) -> Self {
        self.approval_expiration = seconds;
        self
    }

    /// The pair's ERC-20 address, where this precompile answers.
    pub fn address(&self) -> Address {
        self.pair.erc20_address
    }

    pub fn token_pair(&self) -> &TokenPair {
        &self.pair
    }

    pub fn denom(&self) -> &str {
        &self.pair.denom
    }
}

impl Capability for Erc20Precompile {
    type Op = Erc20Op;

    fn name(&self) -> &'static str {
        "erc20"
    }

    fn address(&self) -> Address {
        Erc20Precompile::address(self)
    }

    fn evm_denom(&self) -> &str {
        &self.evm_denom
    }

    fn descriptors(&self) -> &DescriptorTable<Erc20Op> {
        &self.table
    }

    fn handle(&self, op: Erc20Op, call: &mut Call<'_>) -> Result<Completed, PrecompileError> {
        if !self.pair.enabled {
            return Err(PrecompileError::validation(format!(
                "token pair for denom {} is disabled",
                self.pair.denom
            )));
        }
        match op {
            Erc20Op::Transfer => drive(&TransferHandler(TransferMode::Direct), self, call),
            Erc20Op::TransferFrom => drive(&TransferHandler(TransferMode::From), self, call),
            Erc20Op::Approve => drive(&ApproveHandler(AllowanceChange::Set), self, call),
            Erc20Op::IncreaseAllowance => {
                drive(&ApproveHandler(AllowanceChange::Increase), self, call)
            }
            Erc20Op::DecreaseAllowance => {
                drive(&ApproveHandler(AllowanceChange::Decrease), self, call)
            }
            Erc20Op::Mint => drive(&MintHandler, self, call),
            Erc20Op::Burn => drive(&BurnHandler, self, call),
            Erc20Op::Name => drive(&MetadataHandler(MetadataField::Name), self, call),
            Erc20Op::Symbol => drive(&MetadataHandler(MetadataField::Symbol), self, call),
            Erc20Op::Decimals => drive(&MetadataHandler(MetadataField::Decimals), self, call),
            Erc20Op::TotalSupply => drive(&TotalSupplyHandler, self, call),
            Erc20Op::BalanceOf => drive(&BalanceOfHandler, self, call),
            Erc20Op::Allowance => drive(&AllowanceHandler, self, call),
        }
    }
}

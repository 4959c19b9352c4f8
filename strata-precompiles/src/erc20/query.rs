use primitive_types::U256;
use strata_types::primitives::Address;

use super::Erc20Precompile;
use crate::abi::{encode, Token};
use crate::authorization::{AuthorizationGateway, Authorized};
use crate::dispatch::{Call, OperationHandler};
use crate::error::PrecompileError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum MetadataField {
    Name,
    Symbol,
    Decimals,
}

/// `name()`, `symbol()` and `decimals()`, read from bank metadata with the
/// pair's configured values as fallback.
pub(super) struct MetadataHandler(pub MetadataField);

impl OperationHandler<Erc20Precompile> for MetadataHandler {
    type Request = ();
    type Effect = Token;

    fn validate(&self, _: &Erc20Precompile, call: &mut Call<'_>) -> Result<(), PrecompileError> {
        call.args.expect_len(0)
    }

    fn execute(
        &self,
        p: &Erc20Precompile,
        call: &mut Call<'_>,
        _: &(),
        _: &Authorized,
    ) -> Result<Token, PrecompileError> {
        let metadata = p
            .bank
            .denom_metadata(call.ctx, p.denom())?
            .unwrap_or_else(|| p.metadata.clone());
        Ok(match self.0 {
            MetadataField::Name => Token::String(metadata.name),
            MetadataField::Symbol => Token::String(metadata.symbol),
            MetadataField::Decimals => Token::Uint(U256::from(metadata.decimals)),
        })
    }

    fn output(&self, _: &(), value: &Token) -> Vec<u8> {
        encode(std::slice::from_ref(value))
    }
}

pub(super) struct TotalSupplyHandler;

impl OperationHandler<Erc20Precompile> for TotalSupplyHandler {
    type Request = ();
    type Effect = U256;

    fn validate(&self, _: &Erc20Precompile, call: &mut Call<'_>) -> Result<(), PrecompileError> {
        call.args.expect_len(0)
    }

    fn execute(
        &self,
        p: &Erc20Precompile,
        call: &mut Call<'_>,
        _: &(),
        _: &Authorized,
    ) -> Result<U256, PrecompileError> {
        Ok(U256::from(p.bank.supply(call.ctx, p.denom())?))
    }

    fn output(&self, _: &(), supply: &U256) -> Vec<u8> {
        encode(&[Token::Uint(*supply)])
    }
}

pub(super) struct BalanceOfHandler;

impl OperationHandler<Erc20Precompile> for BalanceOfHandler {
    type Request = Address;
    type Effect = U256;

    fn validate(
        &self,
        _: &Erc20Precompile,
        call: &mut Call<'_>,
    ) -> Result<Self::Request, PrecompileError> {
        call.args.expect_len(1)?;
        call.args.address(0, "account address")
    }

    fn execute(
        &self,
        p: &Erc20Precompile,
        call: &mut Call<'_>,
        account: &Self::Request,
        _: &Authorized,
    ) -> Result<U256, PrecompileError> {
        Ok(U256::from(p.bank.balance(call.ctx, account, p.denom())?))
    }

    fn output(&self, _: &Self::Request, balance: &U256) -> Vec<u8> {
        encode(&[Token::Uint(*balance)])
    }
}

pub(super) struct AllowanceHandler;

impl OperationHandler<Erc20Precompile> for AllowanceHandler {
    /// (owner, spender)
    type Request = (Address, Address);
    type Effect = U256;

    fn validate(
        &self,
        _: &Erc20Precompile,
        call: &mut Call<'_>,
    ) -> Result<Self::Request, PrecompileError> {
        call.args.expect_len(2)?;
        Ok((
            call.args.address(0, "owner address")?,
            call.args.address(1, "spender address")?,
        ))
    }

    fn execute(
        &self,
        p: &Erc20Precompile,
        call: &mut Call<'_>,
        (owner, spender): &Self::Request,
        _: &Authorized,
    ) -> Result<U256, PrecompileError> {
        let allowance = AuthorizationGateway::new(p.authz.as_ref())
            .allowance(call.ctx, owner, spender, p.denom())?;
        Ok(allowance.to_u256())
    }

    fn output(&self, _: &Self::Request, allowance: &U256) -> Vec<u8> {
        encode(&[Token::Uint(*allowance)])
    }
}

use strata_ledger::bank::module_address;
use strata_ledger::msgs::{Msg, MsgSend};
use strata_types::constants::ERC20_MODULE_NAME;
use strata_types::primitives::{Address, Amount, Coin};

use super::events::{approval_log, transfer_log};
use super::Erc20Precompile;
use crate::abi::{encode, Token};
use crate::authorization::{Allowance, AuthorizationGateway, Authorized};
use crate::dispatch::{Call, Log, OperationHandler};
use crate::error::{erc20_error, PrecompileError};
use crate::journal::BalanceChangeJournal;

fn success() -> Vec<u8> {
    encode(&[Token::Bool(true)])
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum TransferMode {
    /// `transfer(to, amount)`: the caller moves its own funds.
    Direct,
    /// `transferFrom(from, to, amount)`: the caller spends `from`'s funds.
    From,
}

pub(super) struct TransferHandler(pub TransferMode);

pub(super) struct TransferRequest {
    from: Address,
    to: Address,
    amount: Amount,
    msg: Msg,
}

impl OperationHandler<Erc20Precompile> for TransferHandler {
    type Request = TransferRequest;
    /// Spender's allowance after the move; only reported for `transferFrom`.
    type Effect = Allowance;

    fn validate(
        &self,
        p: &Erc20Precompile,
        call: &mut Call<'_>,
    ) -> Result<TransferRequest, PrecompileError> {
        let (from, to, amount) = match self.0 {
            TransferMode::Direct => {
                call.args.expect_len(2)?;
                (
                    call.caller,
                    call.args.address(0, "to address")?,
                    call.args.amount(1, "amount")?,
                )
            }
            TransferMode::From => {
                call.args.expect_len(3)?;
                (
                    call.args.address(0, "from address")?,
                    call.args.address(1, "to address")?,
                    call.args.amount(2, "amount")?,
                )
            }
        };
        let msg = Msg::Send(MsgSend::new(from, to, vec![Coin::new(p.denom(), amount)]));
        msg.validate_basic()?;
        Ok(TransferRequest {
            from,
            to,
            amount,
            msg,
        })
    }

    fn authorize(
        &self,
        p: &Erc20Precompile,
        call: &mut Call<'_>,
        req: &TransferRequest,
    ) -> Result<Authorized, PrecompileError> {
        AuthorizationGateway::new(p.authz.as_ref())
            .authorize(call.ctx, &call.caller, &req.from, &req.msg)
            .map_err(erc20_error)
    }

    fn execute(
        &self,
        p: &Erc20Precompile,
        call: &mut Call<'_>,
        req: &TransferRequest,
        authorized: &Authorized,
    ) -> Result<Allowance, PrecompileError> {
        let Msg::Send(send) = &req.msg else {
            return Err(PrecompileError::validation("expected a send message"));
        };
        p.bank
            .send(call.ctx, &send.from_address, &send.to_address, &send.amount)
            .map_err(erc20_error)?;
        AuthorizationGateway::new(p.authz.as_ref()).settle(call.ctx, authorized)?;

        Ok(match authorized {
            Authorized::Delegated(delegated) => {
                Allowance::Limited(delegated.remaining_spend(p.denom()))
            }
            _ => Allowance::Unlimited,
        })
    }

    fn journal(
        &self,
        p: &Erc20Precompile,
        req: &TransferRequest,
        _: &Allowance,
        journal: &mut BalanceChangeJournal,
    ) {
        journal.transfer(p.denom(), req.from, req.to, req.amount);
    }

    fn emit(
        &self,
        _: &Erc20Precompile,
        call: &Call<'_>,
        req: &TransferRequest,
        allowance: &Allowance,
    ) -> Vec<Log> {
        let mut logs = vec![transfer_log(call.address, &req.from, &req.to, req.amount)];
        if self.0 == TransferMode::From {
            logs.push(approval_log(
                call.address,
                &req.from,
                &call.caller,
                allowance.to_u256(),
            ));
        }
        logs
    }

    fn output(&self, _: &TransferRequest, _: &Allowance) -> Vec<u8> {
        success()
    }
}

/// Only the pair's owner may mint or burn; a pair without one cannot.
fn require_owner(p: &Erc20Precompile, caller: &Address, role: &str) -> Result<(), PrecompileError> {
    match p.pair.owner {
        Some(owner) if owner == *caller => Ok(()),
        _ => Err(PrecompileError::authorization(format!(
            "{role} is not the owner"
        ))),
    }
}

fn positive(amount: Amount) -> Result<Amount, PrecompileError> {
    if amount == 0 {
        return Err(PrecompileError::invalid_argument("amount", amount));
    }
    Ok(amount)
}

pub(super) struct MintHandler;

pub(super) struct MintRequest {
    to: Address,
    amount: Amount,
}

impl OperationHandler<Erc20Precompile> for MintHandler {
    type Request = MintRequest;
    type Effect = ();

    fn validate(&self, _: &Erc20Precompile, call: &mut Call<'_>) -> Result<MintRequest, PrecompileError> {
        call.args.expect_len(2)?;
        Ok(MintRequest {
            to: call.args.address(0, "to address")?,
            amount: positive(call.args.amount(1, "amount")?)?,
        })
    }

    fn authorize(
        &self,
        p: &Erc20Precompile,
        call: &mut Call<'_>,
        _: &MintRequest,
    ) -> Result<Authorized, PrecompileError> {
        require_owner(p, &call.caller, "minter")?;
        Ok(Authorized::SelfDirected)
    }

    fn execute(
        &self,
        p: &Erc20Precompile,
        call: &mut Call<'_>,
        req: &MintRequest,
        _: &Authorized,
    ) -> Result<(), PrecompileError> {
        let coins = [Coin::new(p.denom(), req.amount)];
        p.bank.mint_coins(call.ctx, ERC20_MODULE_NAME, &coins)?;
        p.bank
            .send_coins_from_module_to_account(call.ctx, ERC20_MODULE_NAME, &req.to, &coins)?;
        Ok(())
    }

    fn journal(
        &self,
        p: &Erc20Precompile,
        req: &MintRequest,
        _: &(),
        journal: &mut BalanceChangeJournal,
    ) {
        journal.credit(p.denom(), req.to, req.amount);
    }

    fn emit(&self, _: &Erc20Precompile, call: &Call<'_>, req: &MintRequest, _: &()) -> Vec<Log> {
        vec![transfer_log(
            call.address,
            &module_address(ERC20_MODULE_NAME),
            &req.to,
            req.amount,
        )]
    }

    fn output(&self, _: &MintRequest, _: &()) -> Vec<u8> {
        success()
    }
}

pub(super) struct BurnHandler;

pub(super) struct BurnRequest {
    burner: Address,
    amount: Amount,
}

impl OperationHandler<Erc20Precompile> for BurnHandler {
    type Request = BurnRequest;
    type Effect = ();

    fn validate(&self, _: &Erc20Precompile, call: &mut Call<'_>) -> Result<BurnRequest, PrecompileError> {
        call.args.expect_len(1)?;
        Ok(BurnRequest {
            burner: call.caller,
            amount: positive(call.args.amount(0, "amount")?)?,
        })
    }

    fn authorize(
        &self,
        p: &Erc20Precompile,
        _: &mut Call<'_>,
        req: &BurnRequest,
    ) -> Result<Authorized, PrecompileError> {
        require_owner(p, &req.burner, "burner")?;
        Ok(Authorized::SelfDirected)
    }

    fn execute(
        &self,
        p: &Erc20Precompile,
        call: &mut Call<'_>,
        req: &BurnRequest,
        _: &Authorized,
    ) -> Result<(), PrecompileError> {
        let coins = [Coin::new(p.denom(), req.amount)];
        p.bank
            .send_coins_from_account_to_module(call.ctx, &req.burner, ERC20_MODULE_NAME, &coins)
            .map_err(erc20_error)?;
        p.bank.burn_coins(call.ctx, ERC20_MODULE_NAME, &coins)?;
        Ok(())
    }

    fn journal(
        &self,
        p: &Erc20Precompile,
        req: &BurnRequest,
        _: &(),
        journal: &mut BalanceChangeJournal,
    ) {
        journal.debit(p.denom(), req.burner, req.amount);
    }

    fn emit(&self, _: &Erc20Precompile, call: &Call<'_>, req: &BurnRequest, _: &()) -> Vec<Log> {
        vec![transfer_log(
            call.address,
            &req.burner,
            &module_address(ERC20_MODULE_NAME),
            req.amount,
        )]
    }

    fn output(&self, _: &BurnRequest, _: &()) -> Vec<u8> {
        success()
    }
}

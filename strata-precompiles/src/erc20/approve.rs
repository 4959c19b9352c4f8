use primitive_types::U256;
use strata_ledger::authz::{Authorization, Grant, SendAuthorization};
use strata_ledger::context::Context;
use strata_types::constants::SEND_MSG_URL;
use strata_types::primitives::{address_to_hex, Address, Amount, Coin};
use tracing::debug;

use super::events::approval_log;
use super::Erc20Precompile;
use crate::abi::{encode, Token};
use crate::authorization::Authorized;
use crate::dispatch::{Call, Log, OperationHandler};
use crate::error::PrecompileError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum AllowanceChange {
    Set,
    Increase,
    Decrease,
}

/// `approve`, `increaseAllowance` and `decreaseAllowance`.
///
/// These manage the caller's own grants. They never move value and so never
/// journal anything.
pub(super) struct ApproveHandler(pub AllowanceChange);

pub(super) struct ApproveRequest {
    owner: Address,
    spender: Address,
    amount: Amount,
}

fn does_not_exist(denom: &str) -> PrecompileError {
    PrecompileError::validation(format!("allowance for token {denom} does not exist"))
}

impl ApproveHandler {
    fn next_allowance(
        &self,
        denom: &str,
        current: Option<Amount>,
        amount: Amount,
    ) -> Result<Amount, PrecompileError> {
        match (self.0, current) {
            (AllowanceChange::Set, None) | (AllowanceChange::Increase, None) if amount == 0 => {
                Err(does_not_exist(denom))
            }
            (AllowanceChange::Set, _) => Ok(amount),
            (AllowanceChange::Increase, None) => Ok(amount),
            (AllowanceChange::Increase, Some(current)) => current.checked_add(amount).ok_or_else(|| {
                PrecompileError::validation(format!("amount {amount} causes integer overflow"))
            }),
            (AllowanceChange::Decrease, None) => Err(does_not_exist(denom)),
            (AllowanceChange::Decrease, Some(current)) => {
                if amount > current {
                    return Err(PrecompileError::validation(format!(
                        "subtracted value cannot be greater than existing allowance for denom {denom}: {amount} > {current}"
                    )));
                }
                Ok(current - amount)
            }
        }
    }
}

/// Write `allowance` for `denom` into the owner's send grant, creating,
/// updating or deleting the grant as needed.
fn store_allowance(
    p: &Erc20Precompile,
    ctx: &mut Context,
    req: &ApproveRequest,
    existing: Option<Grant>,
    allowance: Amount,
) -> Result<(), PrecompileError> {
    let denom = p.denom();
    let grant = match existing {
        Some(Grant {
            authorization: Authorization::Send(mut send),
            expiration,
        }) => {
            send.set_spend_limit(denom, allowance);
            if send.spend_limit.is_empty() {
                p.authz
                    .delete_grant(ctx, &req.owner, &req.spender, SEND_MSG_URL)?;
                return Ok(());
            }
            Grant::new(Authorization::Send(send), expiration)
        }
        Some(_) => {
            return Err(PrecompileError::validation(format!(
                "grant for {SEND_MSG_URL} is not a send authorization"
            )))
        }
        None => {
            let expiration = ctx.block_time().saturating_add(p.approval_expiration);
            Grant::new(
                Authorization::Send(SendAuthorization::new(vec![Coin::new(denom, allowance)])),
                Some(expiration),
            )
        }
    };
    p.authz.save_grant(ctx, &req.owner, &req.spender, &grant)?;
    Ok(())
}

impl OperationHandler<Erc20Precompile> for ApproveHandler {
    type Request = ApproveRequest;
    /// Allowance after the change.
    type Effect = Amount;

    fn validate(&self, _: &Erc20Precompile, call: &mut Call<'_>) -> Result<ApproveRequest, PrecompileError> {
        call.args.expect_len(2)?;
        let spender = call.args.address(0, "spender address")?;
        let amount = call.args.amount(1, "amount")?;
        if spender == call.caller {
            return Err(PrecompileError::validation(format!(
                "spender cannot be the owner: {}",
                address_to_hex(&spender)
            )));
        }
        Ok(ApproveRequest {
            owner: call.caller,
            spender,
            amount,
        })
    }

    fn execute(
        &self,
        p: &Erc20Precompile,
        call: &mut Call<'_>,
        req: &ApproveRequest,
        _: &Authorized,
    ) -> Result<Amount, PrecompileError> {
        let existing = p
            .authz
            .get_grant(call.ctx, &req.owner, &req.spender, SEND_MSG_URL)?;
        let current = match &existing {
            Some(Grant {
                authorization: Authorization::Send(send),
                ..
            }) => send.limit_for(p.denom()),
            _ => None,
        };
        let next = self.next_allowance(p.denom(), current, req.amount)?;
        store_allowance(p, call.ctx, req, existing, next)?;
        debug!(
            owner = %address_to_hex(&req.owner),
            spender = %address_to_hex(&req.spender),
            allowance = %next,
            "allowance updated"
        );
        Ok(next)
    }

    fn emit(
        &self,
        _: &Erc20Precompile,
        call: &Call<'_>,
        req: &ApproveRequest,
        allowance: &Amount,
    ) -> Vec<Log> {
        vec![approval_log(
            call.address,
            &req.owner,
            &req.spender,
            U256::from(*allowance),
        )]
    }

    fn output(&self, _: &ApproveRequest, _: &Amount) -> Vec<u8> {
        encode(&[Token::Bool(true)])
    }
}

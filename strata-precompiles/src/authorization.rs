use primitive_types::U256;
use strata_ledger::authz::{AcceptResponse, Authorization, AuthzKeeper, Grant};
use strata_ledger::context::Context;
use strata_ledger::error::LedgerError;
use strata_ledger::msgs::Msg;
use strata_types::constants::SEND_MSG_URL;
use strata_types::primitives::{address_to_hex, Address, Amount};
use tracing::{debug, info};

/// Remaining allowance a spender holds over an owner's funds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Allowance {
    Limited(Amount),
    /// The spender is the owner.
    Unlimited,
}

impl Allowance {
    /// ABI value: the numeric remainder, or `uint256` max when unlimited.
    pub fn to_u256(self) -> U256 {
        match self {
            Allowance::Limited(amount) => U256::from(amount),
            Allowance::Unlimited => U256::MAX,
        }
    }
}

/// A grant that accepted a message and the state it moves to once the
/// message has executed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelegatedGrant {
    pub granter: Address,
    pub grantee: Address,
    pub grant: Grant,
    pub response: AcceptResponse,
}

impl DelegatedGrant {
    /// Send-limit left for `denom` after the message runs.
    pub fn remaining_spend(&self, denom: &str) -> Amount {
        match &self.response.updated {
            Some(Authorization::Send(send)) if !self.response.delete => send.spend_limit_of(denom),
            _ => 0,
        }
    }
}

/// Result of the authorization stage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Authorized {
    /// Read-only or grant-management operation; no grant involved.
    NotRequired,
    /// The caller acts on its own funds.
    SelfDirected,
    /// The caller spends through a grant, settled after execution.
    Delegated(Box<DelegatedGrant>),
}

/// Decides self-directed vs delegated execution and owns every grant
/// mutation tied to moving value.
pub struct AuthorizationGateway<'a> {
    authz: &'a dyn AuthzKeeper,
}

impl<'a> AuthorizationGateway<'a> {
    pub fn new(authz: &'a dyn AuthzKeeper) -> Self {
        Self { authz }
    }

    /// Authorize `msg`, which moves `owner`'s funds on behalf of `caller`.
    ///
    /// A caller acting for itself never touches the grant store. Otherwise the
    /// grant keyed by (owner, caller, msg type) must exist, be unexpired and
    /// accept the message; nothing is persisted here.
    pub fn authorize(
        &self,
        ctx: &mut Context,
        caller: &Address,
        owner: &Address,
        msg: &Msg,
    ) -> Result<Authorized, LedgerError> {
        if caller == owner {
            return Ok(Authorized::SelfDirected);
        }
        let grant = self
            .authz
            .get_grant(ctx, owner, caller, msg.type_url())?
            .ok_or(LedgerError::NoAuthorizationFound)?;
        let response = grant.authorization.accept(msg)?;
        if !response.accept {
            return Err(LedgerError::Unauthorized {
                reason: format!("authorization rejected {}", msg.type_url()),
            });
        }
        debug!(
            granter = %address_to_hex(owner),
            grantee = %address_to_hex(caller),
            msg_type = msg.type_url(),
            "grant accepted"
        );
        Ok(Authorized::Delegated(Box::new(DelegatedGrant {
            granter: *owner,
            grantee: *caller,
            grant,
            response,
        })))
    }

    /// Persist the post-execution grant. Call only after the message it
    /// accepted has executed successfully.
    pub fn settle(&self, ctx: &mut Context, authorized: &Authorized) -> Result<(), LedgerError> {
        let Authorized::Delegated(delegated) = authorized else {
            return Ok(());
        };
        let msg_type = delegated.grant.authorization.msg_type_url();
        match (&delegated.response.updated, delegated.response.delete) {
            (Some(updated), false) => {
                let grant = Grant::new(updated.clone(), delegated.grant.expiration);
                self.authz
                    .save_grant(ctx, &delegated.granter, &delegated.grantee, &grant)?;
            }
            _ => {
                self.authz
                    .delete_grant(ctx, &delegated.granter, &delegated.grantee, msg_type)?;
            }
        }
        info!(
            granter = %address_to_hex(&delegated.granter),
            grantee = %address_to_hex(&delegated.grantee),
            msg_type,
            exhausted = delegated.response.delete,
            "grant updated"
        );
        Ok(())
    }

    /// Current send allowance of `spender` over `owner`'s `denom`.
    pub fn allowance(
        &self,
        ctx: &mut Context,
        owner: &Address,
        spender: &Address,
        denom: &str,
    ) -> Result<Allowance, LedgerError> {
        if owner == spender {
            return Ok(Allowance::Unlimited);
        }
        let amount = match self.authz.get_grant(ctx, owner, spender, SEND_MSG_URL)? {
            Some(Grant {
                authorization: Authorization::Send(send),
                ..
            }) => send.spend_limit_of(denom),
            _ => 0,
        };
        Ok(Allowance::Limited(amount))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use strata_ledger::authz::{Authz, SendAuthorization};
    use strata_ledger::memory::MemoryStore;
    use strata_ledger::msgs::MsgSend;
    use strata_types::primitives::Coin;

    use super::*;

    const OWNER: Address = [1u8; 20];
    const SPENDER: Address = [2u8; 20];

    fn setup(limit: Option<Amount>) -> (Authz, Context) {
        let authz = Authz::new();
        let mut ctx = Context::new(Arc::new(MemoryStore::new()), 1, 100);
        if let Some(limit) = limit {
            let grant = Grant::new(
                Authorization::Send(SendAuthorization::new(vec![Coin::new("abridge", limit)])),
                Some(1_000),
            );
            authz.save_grant(&mut ctx, &OWNER, &SPENDER, &grant).unwrap();
        }
        (authz, ctx)
    }

    fn send(amount: Amount) -> Msg {
        Msg::Send(MsgSend::new(
            OWNER,
            [3u8; 20],
            vec![Coin::new("abridge", amount)],
        ))
    }

    #[test]
    fn test_self_directed_skips_lookup() {
        let (authz, mut ctx) = setup(None);
        let gateway = AuthorizationGateway::new(&authz);
        let before = ctx.gas_meter().used();
        let auth = gateway.authorize(&mut ctx, &OWNER, &OWNER, &send(5)).unwrap();
        assert_eq!(auth, Authorized::SelfDirected);
        assert_eq!(ctx.gas_meter().used(), before);
    }

    #[test]
    fn test_missing_grant() {
        let (authz, mut ctx) = setup(None);
        let gateway = AuthorizationGateway::new(&authz);
        assert_eq!(
            gateway.authorize(&mut ctx, &SPENDER, &OWNER, &send(5)),
            Err(LedgerError::NoAuthorizationFound)
        );
    }

    #[test]
    fn test_authorize_does_not_persist() {
        let (authz, mut ctx) = setup(Some(50));
        let gateway = AuthorizationGateway::new(&authz);
        let auth = gateway.authorize(&mut ctx, &SPENDER, &OWNER, &send(20)).unwrap();
        assert_eq!(
            gateway.allowance(&mut ctx, &OWNER, &SPENDER, "abridge").unwrap(),
            Allowance::Limited(50)
        );

        gateway.settle(&mut ctx, &auth).unwrap();
        assert_eq!(
            gateway.allowance(&mut ctx, &OWNER, &SPENDER, "abridge").unwrap(),
            Allowance::Limited(30)
        );
        let Authorized::Delegated(delegated) = auth else {
            panic!("expected delegated");
        };
        assert_eq!(delegated.remaining_spend("abridge"), 30);
        // expiration survives the update
        let grant = authz
            .get_grant(&mut ctx, &OWNER, &SPENDER, SEND_MSG_URL)
            .unwrap()
            .unwrap();
        assert_eq!(grant.expiration, Some(1_000));
    }

    #[test]
    fn test_exhausted_grant_is_deleted() {
        let (authz, mut ctx) = setup(Some(50));
        let gateway = AuthorizationGateway::new(&authz);
        let auth = gateway.authorize(&mut ctx, &SPENDER, &OWNER, &send(50)).unwrap();
        gateway.settle(&mut ctx, &auth).unwrap();
        assert!(authz
            .get_grant(&mut ctx, &OWNER, &SPENDER, SEND_MSG_URL)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_over_limit_rejected() {
        let (authz, mut ctx) = setup(Some(50));
        let gateway = AuthorizationGateway::new(&authz);
        assert!(matches!(
            gateway.authorize(&mut ctx, &SPENDER, &OWNER, &send(60)),
            Err(LedgerError::SpendLimitExceeded { .. })
        ));
    }

    #[test]
    fn test_unlimited_sentinel() {
        let (authz, mut ctx) = setup(None);
        let gateway = AuthorizationGateway::new(&authz);
        let allowance = gateway.allowance(&mut ctx, &OWNER, &OWNER, "abridge").unwrap();
        assert_eq!(allowance, Allowance::Unlimited);
        assert_eq!(allowance.to_u256(), U256::MAX);
        assert_eq!(Allowance::Limited(9).to_u256(), U256::from(9u8));
    }
}

use borsh::{BorshDeserialize, BorshSerialize};
use strata_types::constants::{SEND_MSG_URL, TRANSFER_MSG_URL};
use strata_types::primitives::{address_to_hex, Address, Amount, Coin, Timestamp};
use tracing::debug;

use crate::context::Context;
use crate::error::LedgerError;
use crate::msgs::Msg;

const GRANT_PREFIX: &[u8] = b"authz/";

fn grant_key(granter: &Address, grantee: &Address, msg_type: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(GRANT_PREFIX.len() + 40 + msg_type.len());
    key.extend_from_slice(GRANT_PREFIX);
    key.extend_from_slice(granter);
    key.extend_from_slice(grantee);
    key.extend_from_slice(msg_type.as_bytes());
    key
}

/// Outcome of asking an authorization to accept a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcceptResponse {
    pub accept: bool,
    /// The grant is used up and should be removed.
    pub delete: bool,
    /// Replacement authorization to persist when the grant survives.
    pub updated: Option<Authorization>,
}

/// Spend limit over plain sends, keyed by denom.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct SendAuthorization {
    pub spend_limit: Vec<Coin>,
}

impl SendAuthorization {
    pub fn new(spend_limit: Vec<Coin>) -> Self {
        Self { spend_limit }
    }

    /// Remaining limit for `denom`, zero when the denom is not covered.
    pub fn spend_limit_of(&self, denom: &str) -> Amount {
        self.limit_for(denom).unwrap_or(0)
    }

    /// Limit for `denom`, or `None` when the grant does not cover it.
    pub fn limit_for(&self, denom: &str) -> Option<Amount> {
        self.spend_limit
            .iter()
            .find(|c| c.denom == denom)
            .map(|c| c.amount)
    }

    /// Replace the limit for `denom`; a zero amount removes the entry.
    pub fn set_spend_limit(&mut self, denom: &str, amount: Amount) {
        self.spend_limit.retain(|c| c.denom != denom);
        if amount > 0 {
            self.spend_limit.push(Coin::new(denom, amount));
            self.spend_limit.sort_by(|a, b| a.denom.cmp(&b.denom));
        }
    }

    fn accept(&self, coins: &[Coin]) -> Result<AcceptResponse, LedgerError> {
        let mut updated = self.clone();
        for coin in coins {
            let limit = updated.spend_limit_of(&coin.denom);
            if coin.amount > limit {
                return Err(LedgerError::SpendLimitExceeded {
                    requested: coin.amount,
                    limit,
                });
            }
            updated.set_spend_limit(&coin.denom, limit - coin.amount);
        }
        let delete = updated.spend_limit.is_empty();
        Ok(AcceptResponse {
            accept: true,
            delete,
            updated: (!delete).then_some(Authorization::Send(updated)),
        })
    }
}

/// Per-channel spend limit for outbound transfers.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Allocation {
    pub source_port: String,
    pub source_channel: String,
    pub spend_limit: Vec<Coin>,
    /// Receivers allowed on the counterparty chain. Empty allows any.
    pub allow_list: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct TransferAuthorization {
    pub allocations: Vec<Allocation>,
}

impl TransferAuthorization {
    pub fn new(allocations: Vec<Allocation>) -> Self {
        Self { allocations }
    }

    fn accept(
        &self,
        port: &str,
        channel: &str,
        token: &Coin,
        receiver: &str,
    ) -> Result<AcceptResponse, LedgerError> {
        let mut updated = self.clone();
        let index = updated
            .allocations
            .iter()
            .position(|a| a.source_port == port && a.source_channel == channel)
            .ok_or_else(|| LedgerError::Unauthorized {
                reason: "requested port and channel allocation does not exist".to_string(),
            })?;

        let allocation = &mut updated.allocations[index];
        if !allocation.allow_list.is_empty() && !allocation.allow_list.iter().any(|r| r == receiver)
        {
            return Err(LedgerError::Unauthorized {
                reason: format!("not allowed receiver address for transfer: {receiver}"),
            });
        }

        let limit = allocation
            .spend_limit
            .iter()
            .find(|c| c.denom == token.denom)
            .map(|c| c.amount)
            .unwrap_or(0);
        if token.amount > limit {
            return Err(LedgerError::SpendLimitExceeded {
                requested: token.amount,
                limit,
            });
        }
        allocation.spend_limit.retain(|c| c.denom != token.denom);
        if limit > token.amount {
            allocation
                .spend_limit
                .push(Coin::new(token.denom.clone(), limit - token.amount));
            allocation.spend_limit.sort_by(|a, b| a.denom.cmp(&b.denom));
        }
        if allocation.spend_limit.is_empty() {
            updated.allocations.remove(index);
        }

        let delete = updated.allocations.is_empty();
        Ok(AcceptResponse {
            accept: true,
            delete,
            updated: (!delete).then_some(Authorization::Transfer(updated)),
        })
    }
}

/// A delegated permission, discriminated by the message type it covers.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub enum Authorization {
    Send(SendAuthorization),
    Transfer(TransferAuthorization),
}

impl Authorization {
    pub fn msg_type_url(&self) -> &'static str {
        match self {
            Authorization::Send(_) => SEND_MSG_URL,
            Authorization::Transfer(_) => TRANSFER_MSG_URL,
        }
    }

    /// Decide whether `msg` may run under this authorization and what the
    /// authorization becomes afterwards. Pure: nothing is persisted here.
    pub fn accept(&self, msg: &Msg) -> Result<AcceptResponse, LedgerError> {
        match (self, msg) {
            (Authorization::Send(auth), Msg::Send(send)) => auth.accept(&send.amount),
            (Authorization::Transfer(auth), Msg::Transfer(transfer)) => auth.accept(
                &transfer.source_port,
                &transfer.source_channel,
                &transfer.token,
                &transfer.receiver,
            ),
            (auth, msg) => Err(LedgerError::InvalidMessage {
                reason: format!(
                    "type mismatch: authorization for {} cannot accept {}",
                    auth.msg_type_url(),
                    msg.type_url()
                ),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct Grant {
    pub authorization: Authorization,
    pub expiration: Option<Timestamp>,
}

impl Grant {
    pub fn new(authorization: Authorization, expiration: Option<Timestamp>) -> Self {
        Self {
            authorization,
            expiration,
        }
    }

    pub fn is_expired(&self, block_time: Timestamp) -> bool {
        self.expiration.is_some_and(|exp| exp <= block_time)
    }
}

/// Grant storage keyed by (granter, grantee, message type).
pub trait AuthzKeeper: Send + Sync {
    /// Current grant, or `None` when absent or expired at the context's
    /// block time.
    fn get_grant(
        &self,
        ctx: &mut Context,
        granter: &Address,
        grantee: &Address,
        msg_type: &str,
    ) -> Result<Option<Grant>, LedgerError>;

    fn save_grant(
        &self,
        ctx: &mut Context,
        granter: &Address,
        grantee: &Address,
        grant: &Grant,
    ) -> Result<(), LedgerError>;

    fn delete_grant(
        &self,
        ctx: &mut Context,
        granter: &Address,
        grantee: &Address,
        msg_type: &str,
    ) -> Result<(), LedgerError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Authz;

impl Authz {
    pub fn new() -> Self {
        Self
    }
}

impl AuthzKeeper for Authz {
    fn get_grant(
        &self,
        ctx: &mut Context,
        granter: &Address,
        grantee: &Address,
        msg_type: &str,
    ) -> Result<Option<Grant>, LedgerError> {
        let grant: Option<Grant> = ctx.get_borsh(&grant_key(granter, grantee, msg_type))?;
        Ok(grant.filter(|g| !g.is_expired(ctx.block_time())))
    }

    fn save_grant(
        &self,
        ctx: &mut Context,
        granter: &Address,
        grantee: &Address,
        grant: &Grant,
    ) -> Result<(), LedgerError> {
        if grant.is_expired(ctx.block_time()) {
            return Err(LedgerError::InvalidMessage {
                reason: "expiration must be after the current block time".to_string(),
            });
        }
        let msg_type = grant.authorization.msg_type_url();
        ctx.set_borsh(&grant_key(granter, grantee, msg_type), grant)?;
        debug!(
            granter = %address_to_hex(granter),
            grantee = %address_to_hex(grantee),
            msg_type,
            "grant saved"
        );
        Ok(())
    }

    fn delete_grant(
        &self,
        ctx: &mut Context,
        granter: &Address,
        grantee: &Address,
        msg_type: &str,
    ) -> Result<(), LedgerError> {
        let key = grant_key(granter, grantee, msg_type);
        if !ctx.has(&key)? {
            return Err(LedgerError::NoAuthorizationFound);
        }
        ctx.delete(&key)?;
        debug!(
            granter = %address_to_hex(granter),
            grantee = %address_to_hex(grantee),
            msg_type,
            "grant deleted"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::memory::MemoryStore;
    use crate::msgs::{Height, MsgSend, MsgTransfer};

    const OWNER: Address = [1u8; 20];
    const SPENDER: Address = [2u8; 20];

    fn send_msg(amount: Amount) -> Msg {
        Msg::Send(MsgSend::new(
            OWNER,
            [3u8; 20],
            vec![Coin::new("abridge", amount)],
        ))
    }

    fn transfer_msg(channel: &str, amount: Amount, receiver: &str) -> Msg {
        Msg::Transfer(MsgTransfer {
            source_port: "transfer".to_string(),
            source_channel: channel.to_string(),
            token: Coin::new("abridge", amount),
            sender: OWNER,
            receiver: receiver.to_string(),
            timeout_height: Height::new(100, 100),
            timeout_timestamp: 0,
            memo: String::new(),
        })
    }

    fn send_auth(limit: Amount) -> Authorization {
        Authorization::Send(SendAuthorization::new(vec![Coin::new("abridge", limit)]))
    }

    #[test]
    fn test_send_accept_decrements() {
        let resp = send_auth(100).accept(&send_msg(40)).unwrap();
        assert!(resp.accept);
        assert!(!resp.delete);
        assert_eq!(resp.updated, Some(send_auth(60)));
    }

    #[test]
    fn test_send_accept_exhausts() {
        let resp = send_auth(100).accept(&send_msg(100)).unwrap();
        assert!(resp.delete);
        assert!(resp.updated.is_none());
    }

    #[test]
    fn test_send_accept_over_limit() {
        let err = send_auth(50).accept(&send_msg(60)).unwrap_err();
        assert_eq!(
            err,
            LedgerError::SpendLimitExceeded {
                requested: 60,
                limit: 50
            }
        );
    }

    #[test]
    fn test_type_mismatch_rejected() {
        let err = send_auth(50)
            .accept(&transfer_msg("channel-0", 1, "r"))
            .unwrap_err();
        assert!(matches!(err, LedgerError::InvalidMessage { .. }));
    }

    #[test]
    fn test_transfer_accept() {
        let auth = Authorization::Transfer(TransferAuthorization::new(vec![Allocation {
            source_port: "transfer".to_string(),
            source_channel: "channel-0".to_string(),
            spend_limit: vec![Coin::new("abridge", 100)],
            allow_list: vec!["osmo1dest".to_string()],
        }]));

        let resp = auth
            .accept(&transfer_msg("channel-0", 30, "osmo1dest"))
            .unwrap();
        match resp.updated {
            Some(Authorization::Transfer(t)) => {
                assert_eq!(t.allocations[0].spend_limit, vec![Coin::new("abridge", 70)]);
            }
            other => panic!("unexpected: {other:?}"),
        }

        assert!(matches!(
            auth.accept(&transfer_msg("channel-9", 30, "osmo1dest")),
            Err(LedgerError::Unauthorized { .. })
        ));
        assert!(matches!(
            auth.accept(&transfer_msg("channel-0", 30, "osmo1other")),
            Err(LedgerError::Unauthorized { .. })
        ));

        let resp = auth
            .accept(&transfer_msg("channel-0", 100, "osmo1dest"))
            .unwrap();
        assert!(resp.delete);
    }

    #[test]
    fn test_keeper_round_trip() {
        let keeper = Authz::new();
        let mut ctx = Context::new(Arc::new(MemoryStore::new()), 1, 1_000);
        let grant = Grant::new(send_auth(10), Some(2_000));
        keeper.save_grant(&mut ctx, &OWNER, &SPENDER, &grant).unwrap();

        assert_eq!(
            keeper
                .get_grant(&mut ctx, &OWNER, &SPENDER, SEND_MSG_URL)
                .unwrap(),
            Some(grant.clone())
        );
        // Direction matters.
        assert!(keeper
            .get_grant(&mut ctx, &SPENDER, &OWNER, SEND_MSG_URL)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_grant_expires_at_block_time() {
        let keeper = Authz::new();
        let store = Arc::new(MemoryStore::new());
        let mut ctx = Context::new(store.clone(), 1, 1_000);
        keeper
            .save_grant(&mut ctx, &OWNER, &SPENDER, &Grant::new(send_auth(10), Some(1_500)))
            .unwrap();

        let mut at_expiry = Context::new(store, 2, 1_500);
        assert!(keeper
            .get_grant(&mut at_expiry, &OWNER, &SPENDER, SEND_MSG_URL)
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_delete_missing_grant() {
        let keeper = Authz::new();
        let mut ctx = Context::new(Arc::new(MemoryStore::new()), 1, 1_000);
        assert_eq!(
            keeper.delete_grant(&mut ctx, &OWNER, &SPENDER, SEND_MSG_URL),
            Err(LedgerError::NoAuthorizationFound)
        );
    }
}

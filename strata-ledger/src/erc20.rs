use strata_types::primitives::{address_to_hex, Address};
use strata_types::token::TokenPair;
use tracing::info;

use crate::context::Context;
use crate::error::LedgerError;

const PAIR_PREFIX: &[u8] = b"erc20/pair/";
const ADDRESS_PREFIX: &[u8] = b"erc20/addr/";

fn pair_key(denom: &str) -> Vec<u8> {
    [PAIR_PREFIX, denom.as_bytes()].concat()
}

fn address_key(addr: &Address) -> Vec<u8> {
    [ADDRESS_PREFIX, addr.as_slice()].concat()
}

/// Token-pair lookups needed by callers that only resolve pairs.
pub trait Erc20Keeper: Send + Sync {
    fn token_pair_by_denom(
        &self,
        ctx: &mut Context,
        denom: &str,
    ) -> Result<Option<TokenPair>, LedgerError>;

    fn token_pair_by_address(
        &self,
        ctx: &mut Context,
        addr: &Address,
    ) -> Result<Option<TokenPair>, LedgerError>;
}

/// Registry of denom <-> ERC-20 address bindings.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokenPairRegistry;

impl TokenPairRegistry {
    pub fn new() -> Self {
        Self
    }

    /// Register a pair. Both the denom and the address must be unused.
    pub fn register(&self, ctx: &mut Context, pair: &TokenPair) -> Result<(), LedgerError> {
        pair.validate()?;
        if ctx.has(&pair_key(&pair.denom))? {
            return Err(LedgerError::InvalidMessage {
                reason: format!("token pair for denom {} already registered", pair.denom),
            });
        }
        if ctx.has(&address_key(&pair.erc20_address))? {
            return Err(LedgerError::InvalidMessage {
                reason: format!(
                    "token pair for address {} already registered",
                    address_to_hex(&pair.erc20_address)
                ),
            });
        }
        ctx.set_borsh(&pair_key(&pair.denom), pair)?;
        ctx.set(&address_key(&pair.erc20_address), pair.denom.as_bytes())?;
        info!(
            denom = %pair.denom,
            address = %address_to_hex(&pair.erc20_address),
            "token pair registered"
        );
        Ok(())
    }

    pub fn token_pairs(&self, ctx: &mut Context) -> Result<Vec<TokenPair>, LedgerError> {
        ctx.prefix_scan(PAIR_PREFIX)?
            .into_iter()
            .map(|(_, value)| {
                borsh::from_slice(&value).map_err(|e| {
                    LedgerError::from(crate::error::StorageError::DeserializationError {
                        reason: e.to_string(),
                    })
                })
            })
            .collect()
    }
}

impl Erc20Keeper for TokenPairRegistry {
    fn token_pair_by_denom(
        &self,
        ctx: &mut Context,
        denom: &str,
    ) -> Result<Option<TokenPair>, LedgerError> {
        ctx.get_borsh(&pair_key(denom))
    }

    fn token_pair_by_address(
        &self,
        ctx: &mut Context,
        addr: &Address,
    ) -> Result<Option<TokenPair>, LedgerError> {
        match ctx.get(&address_key(addr))? {
            Some(denom) => {
                let denom = String::from_utf8_lossy(&denom).into_owned();
                self.token_pair_by_denom(ctx, &denom)
            }
            None => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::memory::MemoryStore;

    #[test]
    fn test_register_and_lookup() {
        let registry = TokenPairRegistry::new();
        let mut ctx = Context::new(Arc::new(MemoryStore::new()), 1, 0);
        let pair = TokenPair::new("abridge", Some([9u8; 20]));
        registry.register(&mut ctx, &pair).unwrap();

        assert_eq!(
            registry
                .token_pair_by_address(&mut ctx, &pair.erc20_address)
                .unwrap(),
            Some(pair.clone())
        );
        assert_eq!(
            registry.token_pair_by_denom(&mut ctx, "abridge").unwrap(),
            Some(pair.clone())
        );
        assert!(registry
            .token_pair_by_address(&mut ctx, &[1u8; 20])
            .unwrap()
            .is_none());
        assert_eq!(registry.token_pairs(&mut ctx).unwrap(), vec![pair]);
    }

    #[test]
    fn test_duplicate_rejected() {
        let registry = TokenPairRegistry::new();
        let mut ctx = Context::new(Arc::new(MemoryStore::new()), 1, 0);
        let pair = TokenPair::new("abridge", None);
        registry.register(&mut ctx, &pair).unwrap();
        assert!(registry.register(&mut ctx, &pair).is_err());
    }
}

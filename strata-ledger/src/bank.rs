use strata_types::primitives::{keccak256, Address, Amount, Coin};
use strata_types::token::Metadata;
use tracing::debug;

use crate::context::Context;
use crate::error::LedgerError;

// ─── Key Layout ──────────────────────────────────────────────────────────────

const BALANCE_PREFIX: &[u8] = b"bank/bal/";
const SUPPLY_PREFIX: &[u8] = b"bank/supply/";
const METADATA_PREFIX: &[u8] = b"bank/meta/";

fn balance_key(addr: &Address, denom: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(BALANCE_PREFIX.len() + 20 + 1 + denom.len());
    key.extend_from_slice(BALANCE_PREFIX);
    key.extend_from_slice(addr);
    key.push(b'/');
    key.extend_from_slice(denom.as_bytes());
    key
}

fn supply_key(denom: &str) -> Vec<u8> {
    [SUPPLY_PREFIX, denom.as_bytes()].concat()
}

fn metadata_key(denom: &str) -> Vec<u8> {
    [METADATA_PREFIX, denom.as_bytes()].concat()
}

/// Deterministic account address of a named module: the last 20 bytes of
/// `keccak256("module/" ++ name)`.
pub fn module_address(name: &str) -> Address {
    let hash = keccak256(format!("module/{name}").as_bytes());
    let mut addr = [0u8; 20];
    addr.copy_from_slice(&hash[12..]);
    addr
}

/// Balance, supply and module-account operations.
pub trait BankKeeper: Send + Sync {
    fn balance(&self, ctx: &mut Context, addr: &Address, denom: &str)
        -> Result<Amount, LedgerError>;

    fn supply(&self, ctx: &mut Context, denom: &str) -> Result<Amount, LedgerError>;

    fn denom_metadata(
        &self,
        ctx: &mut Context,
        denom: &str,
    ) -> Result<Option<Metadata>, LedgerError>;

    /// Move coins between two accounts. Fails without partial effect if the
    /// sender lacks any of the coins.
    fn send(
        &self,
        ctx: &mut Context,
        from: &Address,
        to: &Address,
        coins: &[Coin],
    ) -> Result<(), LedgerError>;

    fn mint_coins(&self, ctx: &mut Context, module: &str, coins: &[Coin])
        -> Result<(), LedgerError>;

    fn burn_coins(&self, ctx: &mut Context, module: &str, coins: &[Coin])
        -> Result<(), LedgerError>;

    fn send_coins_from_module_to_account(
        &self,
        ctx: &mut Context,
        module: &str,
        to: &Address,
        coins: &[Coin],
    ) -> Result<(), LedgerError> {
        self.send(ctx, &module_address(module), to, coins)
    }

    fn send_coins_from_account_to_module(
        &self,
        ctx: &mut Context,
        from: &Address,
        module: &str,
        coins: &[Coin],
    ) -> Result<(), LedgerError> {
        self.send(ctx, from, &module_address(module), coins)
    }
}

/// Store-backed bank module. Amounts are borsh-encoded `u128`s.
#[derive(Debug, Default, Clone, Copy)]
pub struct Bank;

impl Bank {
    pub fn new() -> Self {
        Self
    }

    fn set_balance(
        &self,
        ctx: &mut Context,
        addr: &Address,
        denom: &str,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let key = balance_key(addr, denom);
        if amount == 0 {
            ctx.delete(&key)
        } else {
            ctx.set_borsh(&key, &amount)
        }
    }

    fn set_supply(&self, ctx: &mut Context, denom: &str, amount: Amount) -> Result<(), LedgerError> {
        ctx.set_borsh(&supply_key(denom), &amount)
    }

    /// Credit an account and grow the supply. Used when applying genesis.
    pub fn init_balance(
        &self,
        ctx: &mut Context,
        addr: &Address,
        coin: &Coin,
    ) -> Result<(), LedgerError> {
        coin.validate()?;
        let balance = self.balance(ctx, addr, &coin.denom)?;
        let supply = self.supply(ctx, &coin.denom)?;
        let new_balance = balance
            .checked_add(coin.amount)
            .ok_or(LedgerError::BalanceOverflow)?;
        let new_supply = supply
            .checked_add(coin.amount)
            .ok_or(LedgerError::BalanceOverflow)?;
        self.set_balance(ctx, addr, &coin.denom, new_balance)?;
        self.set_supply(ctx, &coin.denom, new_supply)
    }

    pub fn set_denom_metadata(
        &self,
        ctx: &mut Context,
        metadata: &Metadata,
    ) -> Result<(), LedgerError> {
        metadata.validate()?;
        ctx.set_borsh(&metadata_key(&metadata.base), metadata)
    }

    /// Every non-zero balance held by `addr`.
    pub fn all_balances(&self, ctx: &mut Context, addr: &Address) -> Result<Vec<Coin>, LedgerError> {
        let mut prefix = BALANCE_PREFIX.to_vec();
        prefix.extend_from_slice(addr);
        prefix.push(b'/');
        let mut coins = Vec::new();
        for (key, value) in ctx.prefix_scan(&prefix)? {
            let denom = String::from_utf8_lossy(&key[prefix.len()..]).into_owned();
            let amount: Amount = borsh::from_slice(&value).map_err(|e| {
                crate::error::StorageError::DeserializationError {
                    reason: e.to_string(),
                }
            })?;
            coins.push(Coin::new(denom, amount));
        }
        Ok(coins)
    }

    fn sub_balance(&self, ctx: &mut Context, addr: &Address, coin: &Coin) -> Result<(), LedgerError> {
        let available = self.balance(ctx, addr, &coin.denom)?;
        if available < coin.amount {
            return Err(LedgerError::InsufficientFunds {
                available,
                required: coin.amount,
                denom: coin.denom.clone(),
            });
        }
        self.set_balance(ctx, addr, &coin.denom, available - coin.amount)
    }

    fn add_balance(&self, ctx: &mut Context, addr: &Address, coin: &Coin) -> Result<(), LedgerError> {
        let current = self.balance(ctx, addr, &coin.denom)?;
        let updated = current
            .checked_add(coin.amount)
            .ok_or(LedgerError::BalanceOverflow)?;
        self.set_balance(ctx, addr, &coin.denom, updated)
    }
}

fn validate_coins(coins: &[Coin]) -> Result<(), LedgerError> {
    for coin in coins {
        coin.validate()?;
    }
    Ok(())
}

impl BankKeeper for Bank {
    fn balance(
        &self,
        ctx: &mut Context,
        addr: &Address,
        denom: &str,
    ) -> Result<Amount, LedgerError> {
        Ok(ctx.get_borsh(&balance_key(addr, denom))?.unwrap_or(0))
    }

    fn supply(&self, ctx: &mut Context, denom: &str) -> Result<Amount, LedgerError> {
        Ok(ctx.get_borsh(&supply_key(denom))?.unwrap_or(0))
    }

    fn denom_metadata(
        &self,
        ctx: &mut Context,
        denom: &str,
    ) -> Result<Option<Metadata>, LedgerError> {
        ctx.get_borsh(&metadata_key(denom))
    }

    fn send(
        &self,
        ctx: &mut Context,
        from: &Address,
        to: &Address,
        coins: &[Coin],
    ) -> Result<(), LedgerError> {
        validate_coins(coins)?;
        // Check every debit before writing anything.
        for coin in coins {
            let available = self.balance(ctx, from, &coin.denom)?;
            if available < coin.amount {
                return Err(LedgerError::InsufficientFunds {
                    available,
                    required: coin.amount,
                    denom: coin.denom.clone(),
                });
            }
        }
        for coin in coins {
            self.sub_balance(ctx, from, coin)?;
            self.add_balance(ctx, to, coin)?;
        }
        debug!(
            from = %hex::encode(from),
            to = %hex::encode(to),
            coins = coins.len(),
            "bank send"
        );
        Ok(())
    }

    fn mint_coins(
        &self,
        ctx: &mut Context,
        module: &str,
        coins: &[Coin],
    ) -> Result<(), LedgerError> {
        validate_coins(coins)?;
        let module_addr = module_address(module);
        for coin in coins {
            let supply = self.supply(ctx, &coin.denom)?;
            let new_supply = supply
                .checked_add(coin.amount)
                .ok_or(LedgerError::BalanceOverflow)?;
            self.add_balance(ctx, &module_addr, coin)?;
            self.set_supply(ctx, &coin.denom, new_supply)?;
        }
        debug!(module, coins = coins.len(), "minted coins");
        Ok(())
    }

    fn burn_coins(
        &self,
        ctx: &mut Context,
        module: &str,
        coins: &[Coin],
    ) -> Result<(), LedgerError> {
        validate_coins(coins)?;
        let module_addr = module_address(module);
        for coin in coins {
            self.sub_balance(ctx, &module_addr, coin)?;
            let supply = self.supply(ctx, &coin.denom)?;
            self.set_supply(ctx, &coin.denom, supply.saturating_sub(coin.amount))?;
        }
        debug!(module, coins = coins.len(), "burned coins");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::memory::MemoryStore;

    const ALICE: Address = [0xAA; 20];
    const BOB: Address = [0xBB; 20];

    fn setup() -> (Bank, Context) {
        let bank = Bank::new();
        let mut ctx = Context::new(Arc::new(MemoryStore::new()), 1, 1_000);
        bank.init_balance(&mut ctx, &ALICE, &Coin::new("abridge", 1_000))
            .unwrap();
        (bank, ctx)
    }

    #[test]
    fn test_send_moves_funds() {
        let (bank, mut ctx) = setup();
        bank.send(&mut ctx, &ALICE, &BOB, &[Coin::new("abridge", 100)])
            .unwrap();
        assert_eq!(bank.balance(&mut ctx, &ALICE, "abridge").unwrap(), 900);
        assert_eq!(bank.balance(&mut ctx, &BOB, "abridge").unwrap(), 100);
        assert_eq!(bank.supply(&mut ctx, "abridge").unwrap(), 1_000);
    }

    #[test]
    fn test_send_insufficient_funds() {
        let (bank, mut ctx) = setup();
        let err = bank
            .send(&mut ctx, &ALICE, &BOB, &[Coin::new("abridge", 1_001)])
            .unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientFunds {
                available: 1_000,
                required: 1_001,
                denom: "abridge".to_string(),
            }
        );
        assert_eq!(bank.balance(&mut ctx, &ALICE, "abridge").unwrap(), 1_000);
    }

    #[test]
    fn test_multi_coin_send_is_all_or_nothing() {
        let (bank, mut ctx) = setup();
        let coins = [Coin::new("abridge", 10), Coin::new("uatom", 1)];
        assert!(bank.send(&mut ctx, &ALICE, &BOB, &coins).is_err());
        assert_eq!(bank.balance(&mut ctx, &ALICE, "abridge").unwrap(), 1_000);
        assert_eq!(bank.balance(&mut ctx, &BOB, "abridge").unwrap(), 0);
    }

    #[test]
    fn test_mint_and_burn_track_supply() {
        let (bank, mut ctx) = setup();
        let coins = [Coin::new("abridge", 50)];
        bank.mint_coins(&mut ctx, "erc20", &coins).unwrap();
        assert_eq!(bank.supply(&mut ctx, "abridge").unwrap(), 1_050);

        bank.send_coins_from_module_to_account(&mut ctx, "erc20", &BOB, &coins)
            .unwrap();
        assert_eq!(bank.balance(&mut ctx, &BOB, "abridge").unwrap(), 50);

        bank.send_coins_from_account_to_module(&mut ctx, &BOB, "erc20", &coins)
            .unwrap();
        bank.burn_coins(&mut ctx, "erc20", &coins).unwrap();
        assert_eq!(bank.supply(&mut ctx, "abridge").unwrap(), 1_000);
        assert_eq!(
            bank.balance(&mut ctx, &module_address("erc20"), "abridge")
                .unwrap(),
            0
        );
    }

    #[test]
    fn test_all_balances() {
        let (bank, mut ctx) = setup();
        bank.init_balance(&mut ctx, &ALICE, &Coin::new("uatom", 7))
            .unwrap();
        let coins = bank.all_balances(&mut ctx, &ALICE).unwrap();
        assert_eq!(
            coins,
            vec![Coin::new("abridge", 1_000), Coin::new("uatom", 7)]
        );
    }

    #[test]
    fn test_module_addresses_are_distinct() {
        assert_ne!(module_address("erc20"), module_address("transfer"));
        assert_eq!(module_address("erc20"), module_address("erc20"));
    }

    #[test]
    fn test_denom_metadata() {
        let (bank, mut ctx) = setup();
        assert!(bank.denom_metadata(&mut ctx, "abridge").unwrap().is_none());
        let meta = Metadata {
            base: "abridge".to_string(),
            name: "Bridge".to_string(),
            symbol: "BRDG".to_string(),
            decimals: 18,
        };
        bank.set_denom_metadata(&mut ctx, &meta).unwrap();
        assert_eq!(
            bank.denom_metadata(&mut ctx, "abridge").unwrap(),
            Some(meta)
        );
    }
}

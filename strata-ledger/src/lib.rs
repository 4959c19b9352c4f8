//! Native ledger modules for the Strata precompile bridge.
//!
//! Every module reads and writes through a gas-metered [`context::Context`].
//! A call runs against a [`cache::CacheStore`] branch that is only written
//! back when the whole call succeeds.

pub mod authz;
pub mod bank;
pub mod cache;
pub mod context;
pub mod erc20;
pub mod error;
pub mod gas;
pub mod memory;
pub mod msgs;
pub mod staking;
pub mod traits;
pub mod transfer;

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use proptest::prelude::*;
    use strata_types::primitives::{Address, Coin};

    use crate::bank::{Bank, BankKeeper};
    use crate::context::Context;
    use crate::memory::MemoryStore;

    const A: Address = [0x0A; 20];
    const B: Address = [0x0B; 20];

    proptest! {
        #[test]
        fn send_conserves_supply(initial in 0u128..1_000_000, amount in 0u128..2_000_000) {
            let bank = Bank::new();
            let mut ctx = Context::new(Arc::new(MemoryStore::new()), 1, 0);
            bank.init_balance(&mut ctx, &A, &Coin::new("abridge", initial)).unwrap();

            let result = bank.send(&mut ctx, &A, &B, &[Coin::new("abridge", amount)]);
            let a = bank.balance(&mut ctx, &A, "abridge").unwrap();
            let b = bank.balance(&mut ctx, &B, "abridge").unwrap();

            prop_assert_eq!(a + b, initial);
            if amount <= initial {
                prop_assert!(result.is_ok());
                prop_assert_eq!(b, amount);
            } else {
                prop_assert!(result.is_err());
                prop_assert_eq!(a, initial);
            }
        }

        #[test]
        fn discarded_branch_leaves_parent_untouched(amount in 1u128..1_000) {
            let bank = Bank::new();
            let mut ctx = Context::new(Arc::new(MemoryStore::new()), 1, 0);
            bank.init_balance(&mut ctx, &A, &Coin::new("abridge", 1_000)).unwrap();

            let (mut branch, _cache) = ctx.cache_context();
            bank.send(&mut branch, &A, &B, &[Coin::new("abridge", amount)]).unwrap();
            drop(branch);

            prop_assert_eq!(bank.balance(&mut ctx, &A, "abridge").unwrap(), 1_000);
            prop_assert_eq!(bank.balance(&mut ctx, &B, "abridge").unwrap(), 0);
        }
    }
}

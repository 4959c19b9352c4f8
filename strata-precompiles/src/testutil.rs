//! In-memory chain for precompile tests.

use std::sync::Arc;

use strata_ledger::authz::{
    Allocation, Authorization, Authz, AuthzKeeper, Grant, SendAuthorization, TransferAuthorization,
};
use strata_ledger::bank::{Bank, BankKeeper};
use strata_ledger::context::Context;
use strata_ledger::erc20::TokenPairRegistry;
use strata_ledger::memory::MemoryStore;
use strata_ledger::staking::Staking;
use strata_ledger::transfer::{ChannelEnd, IbcTransfer};
use strata_types::primitives::{Address, Amount, Coin, Timestamp};
use strata_types::token::{Metadata, TokenPair};

use crate::authorization::{Allowance, AuthorizationGateway};
use crate::dispatch::{Precompile, PrecompileOutput};
use crate::erc20::Erc20Precompile;
use crate::error::PrecompileError;
use crate::outpost::{OutpostConfig, SwapOutpost};
use crate::setup::Contract;

pub const DENOM: &str = "abridge";
pub const ALICE: Address = [0xA1; 20];
pub const BOB: Address = [0xB0; 20];
pub const SPENDER: Address = [0x5E; 20];
pub const OWNER: Address = [0x0E; 20];
pub const BLOCK_TIME: Timestamp = 1_700_000_000;
pub const GAS: u64 = 10_000_000;

pub struct TestChain {
    pub store: Arc<MemoryStore>,
    pub bank: Arc<Bank>,
    pub authz: Arc<Authz>,
    pub registry: Arc<TokenPairRegistry>,
    pub staking: Arc<Staking>,
    pub transfer: Arc<IbcTransfer>,
}

impl TestChain {
    pub fn new() -> Self {
        let bank = Arc::new(Bank::new());
        Self {
            store: Arc::new(MemoryStore::new()),
            transfer: Arc::new(IbcTransfer::new(bank.clone())),
            bank,
            authz: Arc::new(Authz::new()),
            registry: Arc::new(TokenPairRegistry::new()),
            staking: Arc::new(Staking::new()),
        }
    }

    pub fn ctx(&self) -> Context {
        Context::new(self.store.clone(), 10, BLOCK_TIME)
    }

    pub fn fund(&self, addr: &Address, denom: &str, amount: Amount) {
        self.bank
            .init_balance(&mut self.ctx(), addr, &Coin::new(denom, amount))
            .unwrap();
    }

    pub fn balance(&self, addr: &Address, denom: &str) -> Amount {
        self.bank.balance(&mut self.ctx(), addr, denom).unwrap()
    }

    pub fn supply(&self, denom: &str) -> Amount {
        self.bank.supply(&mut self.ctx(), denom).unwrap()
    }

    pub fn register_pair(&self, denom: &str, owner: Option<Address>) -> TokenPair {
        let pair = TokenPair::new(denom, owner);
        self.registry.register(&mut self.ctx(), &pair).unwrap();
        pair
    }

    pub fn erc20(&self, denom: &str, owner: Option<Address>) -> Erc20Precompile {
        let pair = self.register_pair(denom, owner);
        let metadata = Metadata {
            base: denom.to_string(),
            name: "Bridge".to_string(),
            symbol: "BRG".to_string(),
            decimals: 18,
        };
        Erc20Precompile::new(pair, metadata, DENOM, self.bank.clone(), self.authz.clone()).unwrap()
    }

    pub fn outpost(&self, config: OutpostConfig) -> SwapOutpost {
        self.transfer
            .open_channel(
                &mut self.ctx(),
                &config.port,
                &config.channel,
                &ChannelEnd {
                    counterparty_port: "transfer".to_string(),
                    counterparty_channel: "channel-204".to_string(),
                },
            )
            .unwrap();
        SwapOutpost::new(
            config,
            DENOM,
            self.registry.clone(),
            self.staking.clone(),
            self.transfer.clone(),
            self.authz.clone(),
        )
        .unwrap()
    }

    pub fn grant_send(&self, granter: &Address, grantee: &Address, limit: Amount) {
        let grant = Grant::new(
            Authorization::Send(SendAuthorization::new(vec![Coin::new(DENOM, limit)])),
            Some(BLOCK_TIME + 3_600),
        );
        self.authz
            .save_grant(&mut self.ctx(), granter, grantee, &grant)
            .unwrap();
    }

    pub fn grant_transfer(
        &self,
        granter: &Address,
        grantee: &Address,
        port: &str,
        channel: &str,
        coin: Coin,
    ) {
        let grant = Grant::new(
            Authorization::Transfer(TransferAuthorization::new(vec![Allocation {
                source_port: port.to_string(),
                source_channel: channel.to_string(),
                spend_limit: vec![coin],
                allow_list: vec![],
            }])),
            None,
        );
        self.authz
            .save_grant(&mut self.ctx(), granter, grantee, &grant)
            .unwrap();
    }

    pub fn allowance(&self, granter: &Address, grantee: &Address) -> Amount {
        AuthorizationGateway::new(self.authz.as_ref())
            .allowance(&mut self.ctx(), granter, grantee, DENOM)
            .map(|a| match a {
                Allowance::Limited(amount) => amount,
                Allowance::Unlimited => Amount::MAX,
            })
            .unwrap()
    }

    /// Run one call with `origin == caller`.
    pub fn call(
        &self,
        precompile: &dyn Precompile,
        caller: Address,
        input: Vec<u8>,
    ) -> Result<PrecompileOutput, PrecompileError> {
        self.call_from(precompile, caller, caller, input, GAS)
    }

    pub fn call_from(
        &self,
        precompile: &dyn Precompile,
        caller: Address,
        origin: Address,
        input: Vec<u8>,
        gas: u64,
    ) -> Result<PrecompileOutput, PrecompileError> {
        let mut contract = Contract::new(caller, precompile.address(), input, gas);
        precompile.run(&self.ctx(), &mut contract, origin, false)
    }
}

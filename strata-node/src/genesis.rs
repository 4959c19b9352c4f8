use std::sync::Arc;

use strata_ledger::authz::{
    Allocation, Authorization, Authz, AuthzKeeper, Grant, SendAuthorization, TransferAuthorization,
};
use strata_ledger::bank::Bank;
use strata_ledger::context::Context;
use strata_ledger::erc20::TokenPairRegistry;
use strata_ledger::memory::MemoryStore;
use strata_ledger::staking::{Staking, StakingParams};
use strata_ledger::transfer::{ChannelEnd, IbcTransfer};
use strata_precompiles::erc20::Erc20Precompile;
use strata_precompiles::outpost::SwapOutpost;
use strata_precompiles::vm::PrecompileSet;
use strata_precompiles::Precompile;
use strata_types::constants::SWAP_OUTPOST_ADDRESS;
use strata_types::primitives::{address_to_hex, parse_address, Coin};
use strata_types::token::{erc20_address_for_denom, Metadata, TokenPair};
use tracing::info;

use crate::config::{GrantKind, NodeConfig, TokenPairConfig};
use crate::error::NodeError;

/// In-memory ledger built from a config's genesis section.
pub struct Ledger {
    pub store: Arc<MemoryStore>,
    pub bank: Arc<Bank>,
    pub authz: Arc<Authz>,
    pub registry: Arc<TokenPairRegistry>,
    pub staking: Arc<Staking>,
    pub transfer: Arc<IbcTransfer>,
    block_height: u64,
    block_time: u64,
}

impl Ledger {
    fn new(config: &NodeConfig) -> Self {
        let bank = Arc::new(Bank::new());
        Self {
            store: Arc::new(MemoryStore::new()),
            transfer: Arc::new(IbcTransfer::new(bank.clone())),
            bank,
            authz: Arc::new(Authz::new()),
            registry: Arc::new(TokenPairRegistry::new()),
            staking: Arc::new(Staking::new()),
            block_height: config.chain.block_height,
            block_time: config.chain.block_time,
        }
    }

    /// Unmetered context at the configured block.
    pub fn ctx(&self) -> Context {
        Context::new(self.store.clone(), self.block_height, self.block_time)
    }
}

fn token_pair(cfg: &TokenPairConfig) -> TokenPair {
    let mut pair = TokenPair::new(&cfg.denom, cfg.owner);
    pair.enabled = cfg.enabled;
    pair
}

fn metadata(cfg: &TokenPairConfig) -> Metadata {
    Metadata {
        base: cfg.denom.clone(),
        name: cfg.name.clone(),
        symbol: cfg.symbol.clone(),
        decimals: cfg.decimals,
    }
}

/// Apply the genesis section: staking params, token pairs and their
/// metadata, the outpost channel, balances, then grants.
pub fn apply_genesis(config: &NodeConfig) -> Result<Ledger, NodeError> {
    let ledger = Ledger::new(config);
    let mut ctx = ledger.ctx();

    ledger.staking.set_params(
        &mut ctx,
        &StakingParams {
            bond_denom: config.chain.bond_denom.clone(),
        },
    )?;

    for cfg in &config.token_pairs {
        let pair = token_pair(cfg);
        ledger.registry.register(&mut ctx, &pair)?;
        ledger.bank.set_denom_metadata(&mut ctx, &metadata(cfg))?;
        info!(
            denom = %pair.denom,
            address = %address_to_hex(&pair.erc20_address),
            enabled = pair.enabled,
            "token pair registered"
        );
    }

    let outpost = &config.outpost;
    ledger.transfer.open_channel(
        &mut ctx,
        &outpost.port,
        &outpost.channel,
        &ChannelEnd {
            counterparty_port: outpost.port.clone(),
            counterparty_channel: config.genesis.counterparty_channel.clone(),
        },
    )?;

    for balance in &config.genesis.balances {
        ledger.bank.init_balance(
            &mut ctx,
            &balance.address,
            &Coin::new(&balance.denom, balance.amount),
        )?;
    }

    for grant in &config.genesis.grants {
        let limit = vec![Coin::new(&grant.denom, grant.spend_limit)];
        let authorization = match grant.kind {
            GrantKind::Send => Authorization::Send(SendAuthorization::new(limit)),
            GrantKind::Transfer => {
                Authorization::Transfer(TransferAuthorization::new(vec![Allocation {
                    source_port: outpost.port.clone(),
                    source_channel: outpost.channel.clone(),
                    spend_limit: limit,
                    allow_list: vec![],
                }]))
            }
        };
        if grant.expiration.is_some_and(|exp| exp <= config.chain.block_time) {
            return Err(NodeError::GenesisError {
                reason: format!(
                    "grant from {} to {} expires before genesis",
                    address_to_hex(&grant.granter),
                    address_to_hex(&grant.grantee)
                ),
            });
        }
        ledger.authz.save_grant(
            &mut ctx,
            &grant.granter,
            &grant.grantee,
            &Grant::new(authorization, grant.expiration),
        )?;
    }

    info!(
        chain_id = %config.chain.chain_id,
        pairs = config.token_pairs.len(),
        balances = config.genesis.balances.len(),
        grants = config.genesis.grants.len(),
        "genesis applied"
    );
    Ok(ledger)
}

/// One ERC-20 precompile per configured pair, plus the swap outpost.
pub fn build_precompiles(
    config: &NodeConfig,
    ledger: &Ledger,
) -> Result<PrecompileSet, NodeError> {
    let mut set = PrecompileSet::new();
    for cfg in &config.token_pairs {
        let erc20 = Erc20Precompile::new(
            token_pair(cfg),
            metadata(cfg),
            &config.chain.evm_denom,
            ledger.bank.clone(),
            ledger.authz.clone(),
        )?
        .with_approval_expiration(config.erc20.approval_expiration);
        set.register(Arc::new(erc20))?;
    }
    let outpost = SwapOutpost::new(
        config.outpost.clone(),
        &config.chain.evm_denom,
        ledger.registry.clone(),
        ledger.staking.clone(),
        ledger.transfer.clone(),
        ledger.authz.clone(),
    )?;
    set.register(Arc::new(outpost))?;
    Ok(set)
}

/// Find a precompile by `erc20:<denom>`, `outpost`, or a hex address.
pub fn resolve_precompile(
    set: &PrecompileSet,
    name: &str,
) -> Result<Arc<dyn Precompile>, NodeError> {
    let address = if name == "outpost" {
        SWAP_OUTPOST_ADDRESS
    } else if let Some(denom) = name.strip_prefix("erc20:") {
        erc20_address_for_denom(denom)
    } else {
        parse_address(name).map_err(|e| NodeError::ConfigError {
            reason: format!("unknown precompile '{}': {}", name, e),
        })?
    };
    set.get(&address)
        .cloned()
        .ok_or_else(|| NodeError::ConfigError {
            reason: format!(
                "no precompile registered for '{}' at {}",
                name,
                address_to_hex(&address)
            ),
        })
}

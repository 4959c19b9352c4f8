use std::path::Path;

use serde::{Deserialize, Serialize};
use strata_ledger::transfer::compute_ibc_denom;
use strata_precompiles::outpost::OutpostConfig;
use strata_types::constants::{
    DEFAULT_APPROVAL_EXPIRATION, DEFAULT_BOND_DENOM, DEFAULT_EVM_DENOM,
};
use strata_types::primitives::{Address, Amount, Timestamp};

use crate::error::NodeError;

/// File written by `strata init`.
pub const CONFIG_FILE_NAME: &str = "strata.toml";

/// Account funded by the default genesis.
pub const DEV_ACCOUNT: Address = [
    0x3c, 0x44, 0xcd, 0xdd, 0xb6, 0xa9, 0x00, 0xfa, 0x2b, 0x58, 0x5d, 0xd2, 0x99, 0xe0, 0x3d, 0x12,
    0xfa, 0x42, 0x93, 0xbc,
];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub chain: ChainConfig,
    pub outpost: OutpostConfig,
    pub erc20: Erc20Config,
    pub token_pairs: Vec<TokenPairConfig>,
    pub genesis: GenesisConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    pub chain_id: String,
    /// Denomination backing the VM's native currency.
    pub evm_denom: String,
    pub bond_denom: String,
    pub block_height: u64,
    pub block_time: Timestamp,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            chain_id: "strata-dev-1".to_string(),
            evm_denom: DEFAULT_EVM_DENOM.to_string(),
            bond_denom: DEFAULT_BOND_DENOM.to_string(),
            block_height: 1,
            block_time: 1_700_000_000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Erc20Config {
    /// Lifetime in seconds of grants created through `approve`.
    pub approval_expiration: Timestamp,
}

impl Default for Erc20Config {
    fn default() -> Self {
        Self {
            approval_expiration: DEFAULT_APPROVAL_EXPIRATION,
        }
    }
}

/// A denom exposed through an ERC-20 precompile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPairConfig {
    pub denom: String,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    #[serde(
        default,
        with = "strata_types::primitives::serde_opt_address",
        skip_serializing_if = "Option::is_none"
    )]
    pub owner: Option<Address>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenesisConfig {
    /// Channel on the counter-chain paired with the outpost channel.
    pub counterparty_channel: String,
    pub balances: Vec<GenesisBalance>,
    pub grants: Vec<GenesisGrant>,
}

impl Default for GenesisConfig {
    fn default() -> Self {
        Self {
            counterparty_channel: "channel-0".to_string(),
            balances: Vec::new(),
            grants: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisBalance {
    #[serde(with = "strata_types::primitives::serde_address")]
    pub address: Address,
    pub denom: String,
    #[serde(with = "strata_types::primitives::serde_amount")]
    pub amount: Amount,
}

/// Which authorization a genesis grant carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantKind {
    Send,
    /// Cross-chain transfer over the outpost's port and channel.
    Transfer,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenesisGrant {
    pub kind: GrantKind,
    #[serde(with = "strata_types::primitives::serde_address")]
    pub granter: Address,
    #[serde(with = "strata_types::primitives::serde_address")]
    pub grantee: Address,
    pub denom: String,
    #[serde(with = "strata_types::primitives::serde_amount")]
    pub spend_limit: Amount,
    /// Unix seconds; absent means the grant never expires.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiration: Option<Timestamp>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl NodeConfig {
    /// The configuration `strata init` writes: the native denom and the
    /// counter-chain voucher as token pairs, and a funded dev account.
    pub fn dev() -> Self {
        let mut config = Self::default();
        let outpost = &config.outpost;
        let voucher = compute_ibc_denom(&outpost.port, &outpost.channel, &outpost.counter_denom);
        config.outpost.swap_contract = "osmo1xcsswapcontract".to_string();
        config.token_pairs = vec![
            TokenPairConfig {
                denom: config.chain.evm_denom.clone(),
                name: "Strata".to_string(),
                symbol: "STRATA".to_string(),
                decimals: 18,
                owner: None,
                enabled: true,
            },
            TokenPairConfig {
                denom: voucher,
                name: "Osmosis".to_string(),
                symbol: "OSMO".to_string(),
                decimals: 6,
                owner: None,
                enabled: true,
            },
        ];
        config.genesis.balances = vec![GenesisBalance {
            address: DEV_ACCOUNT,
            denom: config.chain.evm_denom.clone(),
            amount: 1_000_000_000_000_000_000_000,
        }];
        config
    }

    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self, NodeError> {
        let contents = std::fs::read_to_string(path).map_err(|e| NodeError::ConfigError {
            reason: format!("failed to read config file '{}': {}", path, e),
        })?;
        let config: NodeConfig = toml::from_str(&contents).map_err(|e| NodeError::ConfigError {
            reason: format!("failed to parse config file '{}': {}", path, e),
        })?;
        Ok(config)
    }

    /// Write the dev configuration to `strata.toml` in `dir`.
    pub fn init(dir: &str) -> Result<(), NodeError> {
        let dir_path = Path::new(dir);
        if !dir_path.exists() {
            std::fs::create_dir_all(dir_path)?;
        }

        let toml_str =
            toml::to_string_pretty(&NodeConfig::dev()).map_err(|e| NodeError::ConfigError {
                reason: format!("failed to serialize default config: {}", e),
            })?;
        std::fs::write(dir_path.join(CONFIG_FILE_NAME), toml_str)?;
        Ok(())
    }
}

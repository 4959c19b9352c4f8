use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};

use crate::error::TypesError;
use crate::primitives::{keccak256, validate_denom, Address};

/// Maximum length of a token name.
pub const MAX_TOKEN_NAME_LEN: usize = 64;

/// Maximum length of a token symbol.
pub const MAX_TOKEN_SYMBOL_LEN: usize = 12;

/// Maximum decimals for a token.
pub const MAX_TOKEN_DECIMALS: u8 = 18;

/// Binding between a native ledger denomination and its ERC-20 facade.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct TokenPair {
    /// Address of the ERC-20 precompile for this denom.
    #[serde(with = "crate::primitives::serde_address")]
    pub erc20_address: Address,
    /// Native ledger denomination.
    pub denom: String,
    /// Whether the pair accepts calls.
    pub enabled: bool,
    /// Account allowed to mint and burn. `None` disables both.
    #[serde(default, with = "crate::primitives::serde_opt_address")]
    pub owner: Option<Address>,
}

impl TokenPair {
    /// Build an enabled pair whose ERC-20 address is derived from the denom.
    pub fn new(denom: impl Into<String>, owner: Option<Address>) -> Self {
        let denom = denom.into();
        Self {
            erc20_address: erc20_address_for_denom(&denom),
            denom,
            enabled: true,
            owner,
        }
    }

    pub fn validate(&self) -> Result<(), TypesError> {
        validate_denom(&self.denom)
    }
}

/// Display metadata for a denomination.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct Metadata {
    pub base: String,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
}

impl Metadata {
    pub fn validate(&self) -> Result<(), TypesError> {
        validate_denom(&self.base)?;
        validate_token_name(&self.name)?;
        validate_token_symbol(&self.symbol)?;
        if self.decimals > MAX_TOKEN_DECIMALS {
            return Err(TypesError::InvalidTokenDefinition(format!(
                "decimals must be <= {MAX_TOKEN_DECIMALS}, got {}",
                self.decimals
            )));
        }
        Ok(())
    }
}

/// Deterministic ERC-20 address for a denom: the last 20 bytes of
/// `keccak256("erc20/" ++ denom)`.
pub fn erc20_address_for_denom(denom: &str) -> Address {
    let hash = keccak256(format!("erc20/{denom}").as_bytes());
    let mut addr = [0u8; 20];
    addr.copy_from_slice(&hash[12..]);
    addr
}

/// Validate a token symbol: alphanumeric, 1-12 chars.
pub fn validate_token_symbol(symbol: &str) -> Result<(), TypesError> {
    if symbol.is_empty() || symbol.len() > MAX_TOKEN_SYMBOL_LEN {
        return Err(TypesError::InvalidTokenDefinition(format!(
            "symbol must be 1-{MAX_TOKEN_SYMBOL_LEN} characters, got {}",
            symbol.len()
        )));
    }
    if let Some(c) = symbol.chars().find(|c| !c.is_ascii_alphanumeric()) {
        return Err(TypesError::InvalidTokenDefinition(format!(
            "symbol must be alphanumeric, found '{c}'"
        )));
    }
    Ok(())
}

/// Validate a token name: printable ASCII, 1-64 chars.
pub fn validate_token_name(name: &str) -> Result<(), TypesError> {
    if name.is_empty() || name.len() > MAX_TOKEN_NAME_LEN {
        return Err(TypesError::InvalidTokenDefinition(format!(
            "name must be 1-{MAX_TOKEN_NAME_LEN} characters, got {}",
            name.len()
        )));
    }
    for c in name.chars() {
        if !c.is_ascii() || c.is_ascii_control() {
            return Err(TypesError::InvalidTokenDefinition(format!(
                "name must be printable ASCII, found '{c}'"
            )));
        }
    }
    Ok(())
}

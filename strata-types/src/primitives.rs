use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

use crate::error::TypesError;

/// 32-byte Keccak-256 hash.
pub type Hash = [u8; 32];

/// 20-byte account address, shared by the VM and the native ledger.
pub type Address = [u8; 20];

/// Amount of a single denomination in base units.
pub type Amount = u128;

/// Unix timestamp in seconds.
pub type Timestamp = u64;

/// The all-zero address.
pub const ZERO_ADDRESS: Address = [0u8; 20];

/// Keccak-256 of arbitrary bytes.
pub fn keccak256(data: &[u8]) -> Hash {
    let mut hasher = Keccak256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Render an address as `0x`-prefixed lowercase hex.
pub fn address_to_hex(addr: &Address) -> String {
    format!("0x{}", hex::encode(addr))
}

/// Parse a `0x`-prefixed (or bare) 40-character hex address.
pub fn parse_address(s: &str) -> Result<Address, TypesError> {
    let stripped = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(stripped).map_err(|e| TypesError::InvalidAddress {
        reason: format!("{s}: {e}"),
    })?;
    bytes.try_into().map_err(|v: Vec<u8>| TypesError::InvalidAddress {
        reason: format!("{s}: expected 20 bytes, got {}", v.len()),
    })
}

/// A quantity of a single denomination.
#[derive(
    Debug, Clone, PartialEq, Eq, Hash, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub struct Coin {
    pub denom: String,
    pub amount: Amount,
}

impl Coin {
    pub fn new(denom: impl Into<String>, amount: Amount) -> Self {
        Self {
            denom: denom.into(),
            amount,
        }
    }

    /// A coin is valid when its denom is well-formed. Zero amounts are valid
    /// coins but not valid transfer amounts.
    pub fn validate(&self) -> Result<(), TypesError> {
        validate_denom(&self.denom)
    }

    pub fn is_positive(&self) -> bool {
        self.amount > 0
    }
}

impl std::fmt::Display for Coin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}{}", self.amount, self.denom)
    }
}

/// Validate a denomination: 3-128 chars, starts with a letter, then
/// alphanumerics or one of `/:._-`.
pub fn validate_denom(denom: &str) -> Result<(), TypesError> {
    if denom.len() < 3 || denom.len() > 128 {
        return Err(TypesError::InvalidDenom {
            denom: denom.to_string(),
            reason: "length must be between 3 and 128".to_string(),
        });
    }
    let mut chars = denom.chars();
    if !chars.next().is_some_and(|c| c.is_ascii_alphabetic()) {
        return Err(TypesError::InvalidDenom {
            denom: denom.to_string(),
            reason: "must start with a letter".to_string(),
        });
    }
    if let Some(c) = chars.find(|c| !c.is_ascii_alphanumeric() && !"/:._-".contains(*c)) {
        return Err(TypesError::InvalidDenom {
            denom: denom.to_string(),
            reason: format!("invalid character '{c}'"),
        });
    }
    Ok(())
}

/// Serde helper: addresses as `0x` hex strings in config and JSON output.
pub mod serde_address {
    use serde::{self, Deserialize, Deserializer, Serializer};

    use super::{address_to_hex, parse_address, Address};

    pub fn serialize<S>(value: &Address, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&address_to_hex(value))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Address, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        parse_address(&s).map_err(serde::de::Error::custom)
    }
}

/// Serde helper for `Option<Address>` fields.
pub mod serde_opt_address {
    use serde::{self, Deserialize, Deserializer, Serializer};

    use super::{address_to_hex, parse_address, Address};

    pub fn serialize<S>(value: &Option<Address>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(addr) => serializer.serialize_some(&address_to_hex(addr)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Address>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s: Option<String> = Option::deserialize(deserializer)?;
        s.map(|s| parse_address(&s).map_err(serde::de::Error::custom))
            .transpose()
    }
}

/// Serde helper: amounts as decimal strings, since TOML integers stop at i64.
pub mod serde_amount {
    use serde::{self, Deserialize, Deserializer, Serializer};

    use super::Amount;

    pub fn serialize<S>(value: &Amount, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Amount, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse::<Amount>().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_hex_roundtrip() {
        let addr = [0xabu8; 20];
        let s = address_to_hex(&addr);
        assert_eq!(s.len(), 42);
        assert_eq!(parse_address(&s).unwrap(), addr);
        // Bare hex without prefix is accepted too.
        assert_eq!(parse_address(&s[2..]).unwrap(), addr);
    }

    #[test]
    fn test_parse_address_wrong_length() {
        let err = parse_address("0x0102").unwrap_err();
        assert!(err.to_string().contains("expected 20 bytes"));
    }

    #[test]
    fn test_parse_address_not_hex() {
        assert!(parse_address("0xzz").is_err());
    }

    #[test]
    fn test_keccak_known_vector() {
        // keccak256("") is a well-known constant.
        assert_eq!(
            hex::encode(keccak256(b"")),
            "c5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
    }

    #[test]
    fn test_validate_denom() {
        assert!(validate_denom("abridge").is_ok());
        assert!(validate_denom("ibc/27394FB092D2ECCD56123C74F36E4C1F926001CEADA9CA97EA622B25F41E5EB2").is_ok());
        assert!(validate_denom("ab").is_err());
        assert!(validate_denom("1abc").is_err());
        assert!(validate_denom("abc def").is_err());
    }

    #[test]
    fn test_coin_display() {
        assert_eq!(Coin::new("uosmo", 42).to_string(), "42uosmo");
    }
}

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use strata_types::constants::{SEND_MSG_URL, TRANSFER_MSG_URL};
use strata_types::primitives::{address_to_hex, Address, Coin, Timestamp, ZERO_ADDRESS};

use crate::error::LedgerError;

/// Maximum length of a port or channel identifier.
pub const MAX_IDENTIFIER_LEN: usize = 64;

/// Maximum memo size carried by an outbound transfer.
pub const MAX_MEMO_LEN: usize = 32_768;

/// Counterparty block height used as a packet timeout.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize,
)]
pub struct Height {
    pub revision_number: u64,
    pub revision_height: u64,
}

impl Height {
    pub fn new(revision_number: u64, revision_height: u64) -> Self {
        Self {
            revision_number,
            revision_height,
        }
    }

    pub fn is_zero(&self) -> bool {
        self.revision_number == 0 && self.revision_height == 0
    }
}

/// Move coins between two accounts.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct MsgSend {
    pub from_address: Address,
    pub to_address: Address,
    pub amount: Vec<Coin>,
}

impl MsgSend {
    pub fn new(from_address: Address, to_address: Address, amount: Vec<Coin>) -> Self {
        Self {
            from_address,
            to_address,
            amount,
        }
    }

    pub fn validate_basic(&self) -> Result<(), LedgerError> {
        if self.from_address == ZERO_ADDRESS {
            return Err(LedgerError::InvalidAddress {
                reason: "invalid from address: empty address".to_string(),
            });
        }
        if self.to_address == ZERO_ADDRESS {
            return Err(LedgerError::InvalidAddress {
                reason: "invalid to address: empty address".to_string(),
            });
        }
        validate_send_coins(&self.amount)
    }
}

/// Send a fungible token to another chain over a channel.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize)]
pub struct MsgTransfer {
    pub source_port: String,
    pub source_channel: String,
    pub token: Coin,
    pub sender: Address,
    /// Receiver on the counterparty chain, in that chain's address format.
    pub receiver: String,
    pub timeout_height: Height,
    pub timeout_timestamp: Timestamp,
    pub memo: String,
}

impl MsgTransfer {
    pub fn validate_basic(&self) -> Result<(), LedgerError> {
        validate_identifier("port", &self.source_port)?;
        validate_identifier("channel", &self.source_channel)?;
        self.token.validate()?;
        if !self.token.is_positive() {
            return Err(LedgerError::InvalidCoins {
                reason: format!("{}: amount must be positive", self.token),
            });
        }
        if self.sender == ZERO_ADDRESS {
            return Err(LedgerError::InvalidAddress {
                reason: "missing sender address".to_string(),
            });
        }
        if self.receiver.trim().is_empty() {
            return Err(LedgerError::InvalidAddress {
                reason: "missing recipient address".to_string(),
            });
        }
        if self.memo.len() > MAX_MEMO_LEN {
            return Err(LedgerError::InvalidMessage {
                reason: format!(
                    "memo must not exceed {MAX_MEMO_LEN} bytes, got {}",
                    self.memo.len()
                ),
            });
        }
        if self.timeout_height.is_zero() && self.timeout_timestamp == 0 {
            return Err(LedgerError::InvalidMessage {
                reason: "packet timeout height and packet timeout timestamp cannot both be 0"
                    .to_string(),
            });
        }
        Ok(())
    }
}

/// Messages an authorization can be asked to accept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    Send(MsgSend),
    Transfer(MsgTransfer),
}

impl Msg {
    pub fn type_url(&self) -> &'static str {
        match self {
            Msg::Send(_) => SEND_MSG_URL,
            Msg::Transfer(_) => TRANSFER_MSG_URL,
        }
    }

    /// The account whose funds the message moves.
    pub fn signer(&self) -> Address {
        match self {
            Msg::Send(m) => m.from_address,
            Msg::Transfer(m) => m.sender,
        }
    }

    pub fn validate_basic(&self) -> Result<(), LedgerError> {
        match self {
            Msg::Send(m) => m.validate_basic(),
            Msg::Transfer(m) => m.validate_basic(),
        }
    }
}

impl std::fmt::Display for Msg {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} from {}", self.type_url(), address_to_hex(&self.signer()))
    }
}

fn validate_send_coins(coins: &[Coin]) -> Result<(), LedgerError> {
    if coins.is_empty() {
        return Err(LedgerError::InvalidCoins {
            reason: "empty coins".to_string(),
        });
    }
    for coin in coins {
        coin.validate()?;
        if !coin.is_positive() {
            return Err(LedgerError::InvalidCoins {
                reason: format!("{coin}: amount must be positive"),
            });
        }
    }
    Ok(())
}

/// Port and channel identifiers: 2-64 chars of `[a-zA-Z0-9._+-#[]<>]`.
pub fn validate_identifier(kind: &str, id: &str) -> Result<(), LedgerError> {
    if id.len() < 2 || id.len() > MAX_IDENTIFIER_LEN {
        return Err(LedgerError::InvalidMessage {
            reason: format!(
                "invalid {kind} identifier {id:?}: length must be between 2 and {MAX_IDENTIFIER_LEN}"
            ),
        });
    }
    if let Some(c) = id
        .chars()
        .find(|c| !c.is_ascii_alphanumeric() && !"._+-#[]<>".contains(*c))
    {
        return Err(LedgerError::InvalidMessage {
            reason: format!("invalid {kind} identifier {id:?}: invalid character '{c}'"),
        });
    }
    Ok(())
}

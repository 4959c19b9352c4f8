use strata_ledger::error::LedgerError;
use thiserror::Error;

use crate::abi::{self, Token};

/// Selector of the standard `Error(string)` revert payload.
pub const REVERT_SELECTOR: [u8; 4] = [0x08, 0xc3, 0x79, 0xa0];

/// Coarse classification callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Argument,
    Authorization,
    Validation,
    Ledger,
    GasExhaustion,
    Dispatch,
}

/// Every way a precompile call can fail. Each one reverts the call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PrecompileError {
    #[error("invalid number of arguments; expected {expected}; got: {actual}")]
    InvalidNumberOfArgs { expected: usize, actual: usize },

    #[error("invalid {name}: {value}")]
    InvalidArgument { name: String, value: String },

    #[error("{reason}")]
    Authorization { reason: String },

    #[error("{reason}")]
    Validation { reason: String },

    #[error("{reason}")]
    Ledger { reason: String },

    #[error("out of gas")]
    OutOfGas,

    #[error("unknown method: {selector}")]
    UnknownMethod { selector: String },

    #[error("write protection")]
    WriteProtection,

    #[error("invalid input: {reason}")]
    InvalidInput { reason: String },
}

impl PrecompileError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidNumberOfArgs { .. } | Self::InvalidArgument { .. } => ErrorKind::Argument,
            Self::Authorization { .. } => ErrorKind::Authorization,
            Self::Validation { .. } => ErrorKind::Validation,
            Self::Ledger { .. } => ErrorKind::Ledger,
            Self::OutOfGas => ErrorKind::GasExhaustion,
            Self::UnknownMethod { .. } | Self::WriteProtection | Self::InvalidInput { .. } => {
                ErrorKind::Dispatch
            }
        }
    }

    pub fn invalid_argument(name: &str, value: impl std::fmt::Display) -> Self {
        Self::InvalidArgument {
            name: name.to_string(),
            value: value.to_string(),
        }
    }

    pub fn authorization(reason: impl Into<String>) -> Self {
        Self::Authorization {
            reason: reason.into(),
        }
    }

    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }

    /// ABI-encoded `Error(string)` carrying this error's message.
    pub fn revert_data(&self) -> Vec<u8> {
        let mut out = REVERT_SELECTOR.to_vec();
        out.extend(abi::encode(&[Token::String(self.to_string())]));
        out
    }
}

/// Translate a native ledger failure. Native types never cross this line.
impl From<LedgerError> for PrecompileError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::OutOfGas { .. } => PrecompileError::OutOfGas,
            LedgerError::NoAuthorizationFound
            | LedgerError::SpendLimitExceeded { .. }
            | LedgerError::Unauthorized { .. } => PrecompileError::Authorization {
                reason: err.to_string(),
            },
            LedgerError::InvalidCoins { .. }
            | LedgerError::InvalidAddress { .. }
            | LedgerError::InvalidMessage { .. } => PrecompileError::Validation {
                reason: err.to_string(),
            },
            LedgerError::InsufficientFunds { .. }
            | LedgerError::ChannelNotFound { .. }
            | LedgerError::BalanceOverflow
            | LedgerError::Storage(_) => PrecompileError::Ledger {
                reason: err.to_string(),
            },
        }
    }
}

/// ERC-20 flavoured translation: balance and allowance failures use the
/// messages token contracts conventionally revert with.
pub fn erc20_error(err: LedgerError) -> PrecompileError {
    match err {
        LedgerError::InsufficientFunds { .. } => PrecompileError::Ledger {
            reason: "ERC20: transfer amount exceeds balance".to_string(),
        },
        LedgerError::NoAuthorizationFound | LedgerError::SpendLimitExceeded { .. } => {
            PrecompileError::Authorization {
                reason: "ERC20: insufficient allowance".to_string(),
            }
        }
        other => other.into(),
    }
}

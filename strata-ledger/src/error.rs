use strata_types::error::TypesError;
use thiserror::Error;

/// Errors that can occur during storage operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("Write error: {reason}")]
    WriteError { reason: String },

    #[error("Read error: {reason}")]
    ReadError { reason: String },

    #[error("Serialization error: {reason}")]
    SerializationError { reason: String },

    #[error("Deserialization error: {reason}")]
    DeserializationError { reason: String },

    #[error("Batch error: {reason}")]
    BatchError { reason: String },
}

/// Errors raised by the native ledger modules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("insufficient funds: {available}{denom} is smaller than {required}{denom}")]
    InsufficientFunds {
        available: u128,
        required: u128,
        denom: String,
    },

    #[error("invalid coins: {reason}")]
    InvalidCoins { reason: String },

    #[error("invalid address: {reason}")]
    InvalidAddress { reason: String },

    #[error("invalid message: {reason}")]
    InvalidMessage { reason: String },

    #[error("authorization not found")]
    NoAuthorizationFound,

    #[error("requested amount is more than spend limit: {requested} > {limit}")]
    SpendLimitExceeded { requested: u128, limit: u128 },

    #[error("unauthorized: {reason}")]
    Unauthorized { reason: String },

    #[error("out of gas in location: {descriptor}; gasWanted: {limit}, gasUsed: {used}")]
    OutOfGas {
        descriptor: String,
        used: u64,
        limit: u64,
    },

    #[error("channel not found: port {port}, channel {channel}")]
    ChannelNotFound { port: String, channel: String },

    #[error("balance overflow")]
    BalanceOverflow,

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),
}

impl From<TypesError> for LedgerError {
    fn from(err: TypesError) -> Self {
        match err {
            TypesError::InvalidAddress { reason } => LedgerError::InvalidAddress { reason },
            other => LedgerError::InvalidCoins {
                reason: other.to_string(),
            },
        }
    }
}

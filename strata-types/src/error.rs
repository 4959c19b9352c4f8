use thiserror::Error;

/// Validation errors for shared types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TypesError {
    #[error("invalid address: {reason}")]
    InvalidAddress { reason: String },

    #[error("invalid denom {denom}: {reason}")]
    InvalidDenom { denom: String, reason: String },

    #[error("invalid token definition: {0}")]
    InvalidTokenDefinition(String),
}

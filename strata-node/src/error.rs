use strata_ledger::error::LedgerError;
use strata_precompiles::PrecompileError;
use thiserror::Error;

/// Errors surfaced by the `strata` binary.
#[derive(Debug, Error)]
#[allow(clippy::enum_variant_names)]
pub enum NodeError {
    #[error("config error: {reason}")]
    ConfigError { reason: String },

    #[error("genesis error: {reason}")]
    GenesisError { reason: String },

    #[error("ledger error: {0}")]
    LedgerError(#[from] LedgerError),

    #[error("precompile error: {0}")]
    PrecompileError(#[from] PrecompileError),

    /// The call ran and reverted. The reason has already been reported.
    #[error("call reverted: {reason}")]
    Reverted { reason: String },

    #[error("io error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("json error: {0}")]
    JsonError(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_display() {
        let err = NodeError::ConfigError {
            reason: "missing field".to_string(),
        };
        assert_eq!(err.to_string(), "config error: missing field");
    }

    #[test]
    fn test_ledger_error_from() {
        let err: NodeError = LedgerError::BalanceOverflow.into();
        assert!(matches!(err, NodeError::LedgerError(_)));
    }

    #[test]
    fn test_io_error_from() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let node_err: NodeError = io_err.into();
        assert!(matches!(node_err, NodeError::IoError(_)));
    }
}

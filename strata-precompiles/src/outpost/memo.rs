//! Instruction memo attached to outbound swap transfers, read by the swap
//! contract's hook on the destination chain.

use serde::{Deserialize, Serialize};
use strata_types::constants::{
    MAX_SLIPPAGE_PERCENT, MAX_WINDOW_SECONDS, ON_FAILED_DELIVERY_DO_NOTHING,
};

use crate::error::PrecompileError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Twap {
    /// Decimal percentage, kept as a string on the wire.
    pub slippage_percentage: String,
    pub window_seconds: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Slippage {
    pub twap: Twap,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapInstruction {
    pub output_denom: String,
    pub slippage: Slippage,
    pub receiver: String,
    pub on_failed_delivery: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_memo: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractMsg {
    pub osmosis_swap: SwapInstruction,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractCall {
    pub contract: String,
    pub msg: ContractMsg,
}

/// Top-level memo document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SwapMemo {
    pub memo: ContractCall,
}

impl SwapMemo {
    pub fn new(
        output_denom: &str,
        receiver: &str,
        contract: &str,
        slippage_percentage: &str,
        window_seconds: u64,
    ) -> Self {
        Self {
            memo: ContractCall {
                contract: contract.to_string(),
                msg: ContractMsg {
                    osmosis_swap: SwapInstruction {
                        output_denom: output_denom.to_string(),
                        slippage: Slippage {
                            twap: Twap {
                                slippage_percentage: slippage_percentage.to_string(),
                                window_seconds,
                            },
                        },
                        receiver: receiver.to_string(),
                        on_failed_delivery: ON_FAILED_DELIVERY_DO_NOTHING.to_string(),
                        next_memo: None,
                    },
                },
            },
        }
    }

    pub fn instruction(&self) -> &SwapInstruction {
        &self.memo.msg.osmosis_swap
    }

    /// Check the embedded slippage parameters against the outpost bounds.
    pub fn validate(&self) -> Result<(), PrecompileError> {
        let twap = &self.instruction().slippage.twap;
        let slippage: u64 = twap
            .slippage_percentage
            .parse()
            .map_err(|_| slippage_error())?;
        if slippage > MAX_SLIPPAGE_PERCENT {
            return Err(slippage_error());
        }
        if twap.window_seconds > MAX_WINDOW_SECONDS {
            return Err(window_error());
        }
        Ok(())
    }

    /// Pretty-printed JSON with two-space indentation.
    pub fn to_json(&self) -> Result<String, PrecompileError> {
        serde_json::to_string_pretty(self).map_err(|e| PrecompileError::InvalidInput {
            reason: e.to_string(),
        })
    }
}

pub(crate) fn slippage_error() -> PrecompileError {
    PrecompileError::validation(format!(
        "slippage percentage must be a value between 0 and {MAX_SLIPPAGE_PERCENT}"
    ))
}

pub(crate) fn window_error() -> PrecompileError {
    PrecompileError::validation(format!(
        "window seconds must be a value between 0 and {MAX_WINDOW_SECONDS}"
    ))
}

/// Build the memo document for a swap.
pub fn create_memo(
    output_denom: &str,
    receiver: &str,
    contract: &str,
    slippage_percentage: &str,
    window_seconds: u64,
) -> Result<String, PrecompileError> {
    SwapMemo::new(
        output_denom,
        receiver,
        contract,
        slippage_percentage,
        window_seconds,
    )
    .to_json()
}

/// Parse a memo produced by [`create_memo`].
pub fn parse_memo(document: &str) -> Result<SwapMemo, PrecompileError> {
    serde_json::from_str(document).map_err(|e| PrecompileError::InvalidInput {
        reason: format!("malformed swap memo: {e}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memo_round_trip() {
        let json = create_memo("uosmo", "R", "C", "5", 10).unwrap();
        let memo = parse_memo(&json).unwrap();
        let swap = memo.instruction();
        assert_eq!(memo.memo.contract, "C");
        assert_eq!(swap.output_denom, "uosmo");
        assert_eq!(swap.receiver, "R");
        assert_eq!(swap.slippage.twap.slippage_percentage, "5");
        assert_eq!(swap.slippage.twap.window_seconds, 10);
        assert_eq!(swap.on_failed_delivery, "do_nothing");
        assert_eq!(swap.next_memo, None);
    }

    #[test]
    fn test_memo_layout() {
        let json = create_memo("uosmo", "R", "C", "5", 10).unwrap();
        let expected = r#"{
  "memo": {
    "contract": "C",
    "msg": {
      "osmosis_swap": {
        "output_denom": "uosmo",
        "slippage": {
          "twap": {
            "slippage_percentage": "5",
            "window_seconds": 10
          }
        },
        "receiver": "R",
        "on_failed_delivery": "do_nothing"
      }
    }
  }
}"#;
        assert_eq!(json, expected);
    }

    #[test]
    fn test_next_memo_preserved() {
        let mut memo = SwapMemo::new("uosmo", "R", "C", "5", 10);
        memo.memo.msg.osmosis_swap.next_memo = Some("{}".to_string());
        let parsed = parse_memo(&memo.to_json().unwrap()).unwrap();
        assert_eq!(parsed, memo);
    }

    #[test]
    fn test_memo_validate() {
        assert!(SwapMemo::new("uosmo", "R", "C", "20", 60).validate().is_ok());
        assert_eq!(
            SwapMemo::new("uosmo", "R", "C", "21", 10).validate(),
            Err(slippage_error())
        );
        assert_eq!(
            SwapMemo::new("uosmo", "R", "C", "five", 10).validate(),
            Err(slippage_error())
        );
        assert_eq!(
            SwapMemo::new("uosmo", "R", "C", "5", 61).validate(),
            Err(window_error())
        );
    }

    #[test]
    fn test_parse_garbage() {
        assert!(matches!(
            parse_memo("not json"),
            Err(PrecompileError::InvalidInput { .. })
        ));
    }
}

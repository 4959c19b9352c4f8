use strata_ledger::transfer::compute_ibc_denom;
use strata_types::constants::{MAX_SLIPPAGE_PERCENT, MAX_WINDOW_SECONDS};
use strata_types::primitives::{Address, Amount};

use super::memo::{slippage_error, window_error};
use crate::error::PrecompileError;

/// A swap request, validated before any transfer message is built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapPacket {
    pub sender: Address,
    pub input_denom: String,
    pub output_denom: String,
    pub amount: Amount,
    pub receiver: String,
    pub slippage_percent: u64,
    pub window_seconds: u64,
}

/// Denoms accepted as swap input: the bond denom and the voucher of the
/// counter-chain's native denom over the outpost channel.
pub fn supported_inputs(
    bond_denom: &str,
    port: &str,
    channel: &str,
    counter_denom: &str,
) -> Vec<String> {
    vec![
        bond_denom.to_string(),
        compute_ibc_denom(port, channel, counter_denom),
    ]
}

impl SwapPacket {
    pub fn validate(&self, supported: &[String]) -> Result<(), PrecompileError> {
        if self.input_denom == self.output_denom {
            return Err(PrecompileError::validation(format!(
                "input and output token cannot be the same: {}",
                self.input_denom
            )));
        }
        if !supported.contains(&self.input_denom) {
            return Err(PrecompileError::validation(format!(
                "input not supported, supported tokens: [{}]",
                supported.join(" ")
            )));
        }
        if self.slippage_percent > MAX_SLIPPAGE_PERCENT {
            return Err(slippage_error());
        }
        if self.window_seconds > MAX_WINDOW_SECONDS {
            return Err(window_error());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn supported() -> Vec<String> {
        supported_inputs("abridge", "transfer", "channel-0", "uosmo")
    }

    fn packet(input: &str, output: &str, slippage: u64, window: u64) -> SwapPacket {
        SwapPacket {
            sender: [1u8; 20],
            input_denom: input.to_string(),
            output_denom: output.to_string(),
            amount: 10,
            receiver: "osmo1receiver".to_string(),
            slippage_percent: slippage,
            window_seconds: window,
        }
    }

    #[test]
    fn test_same_token_rejected() {
        let err = packet("abridge", "abridge", 5, 10)
            .validate(&supported())
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "input and output token cannot be the same: abridge"
        );
    }

    #[test]
    fn test_unsupported_input_lists_allowed() {
        let allowed = supported();
        let err = packet("uatom", "abridge", 5, 10)
            .validate(&allowed)
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            format!(
                "input not supported, supported tokens: [abridge {}]",
                allowed[1]
            )
        );
    }

    #[test]
    fn test_voucher_input_accepted() {
        let allowed = supported();
        assert!(packet(&allowed[1], "abridge", 5, 10).validate(&allowed).is_ok());
    }

    #[test]
    fn test_bounds_are_inclusive() {
        let allowed = supported();
        assert!(packet("abridge", "uosmo", 20, 60).validate(&allowed).is_ok());
        assert_eq!(
            packet("abridge", "uosmo", 21, 60).validate(&allowed),
            Err(slippage_error())
        );
        assert_eq!(
            packet("abridge", "uosmo", 20, 61).validate(&allowed),
            Err(window_error())
        );
    }

    proptest! {
        #[test]
        fn prop_bounds(slippage in 0u64..200, window in 0u64..600) {
            let result = packet("abridge", "uosmo", slippage, window).validate(&supported());
            let within = slippage <= MAX_SLIPPAGE_PERCENT && window <= MAX_WINDOW_SECONDS;
            prop_assert_eq!(result.is_ok(), within);
        }
    }
}

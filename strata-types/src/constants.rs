use crate::primitives::{Address, Timestamp};

// ─── Denominations ───────────────────────────────────────────────────────────

/// Default denomination backing the VM's native currency.
pub const DEFAULT_EVM_DENOM: &str = "abridge";

/// Default staking (bond) denomination.
pub const DEFAULT_BOND_DENOM: &str = "abridge";

/// Native denomination of the counter-chain reached by the swap outpost.
pub const DEFAULT_COUNTER_DENOM: &str = "uosmo";

// ─── Module Accounts ─────────────────────────────────────────────────────────

/// Module account that mints and burns ERC-20 facade tokens.
pub const ERC20_MODULE_NAME: &str = "erc20";

/// Module account owning cross-chain transfer escrows.
pub const TRANSFER_MODULE_NAME: &str = "transfer";

// ─── Message Type URLs ───────────────────────────────────────────────────────

/// Authorization message type for bank sends.
pub const SEND_MSG_URL: &str = "/cosmos.bank.v1beta1.MsgSend";

/// Authorization message type for cross-chain transfers.
pub const TRANSFER_MSG_URL: &str = "/ibc.applications.transfer.v1.MsgTransfer";

// ─── Native Store Gas Schedule ───────────────────────────────────────────────

/// Flat cost of a store read.
pub const GAS_READ_FLAT: u64 = 1_000;

/// Cost per byte returned by a store read.
pub const GAS_READ_PER_BYTE: u64 = 3;

/// Flat cost of a store write.
pub const GAS_WRITE_FLAT: u64 = 2_000;

/// Cost per byte written (key + value).
pub const GAS_WRITE_PER_BYTE: u64 = 30;

/// Cost of an existence check.
pub const GAS_HAS: u64 = 1_000;

/// Cost of a delete.
pub const GAS_DELETE: u64 = 1_000;

// ─── Precompile Parameters ───────────────────────────────────────────────────

/// Upper bound on the swap slippage percentage accepted by the outpost.
pub const MAX_SLIPPAGE_PERCENT: u64 = 20;

/// Upper bound on the TWAP window accepted by the outpost.
pub const MAX_WINDOW_SECONDS: u64 = 60;

/// Slippage percentage used for outbound swaps unless configured otherwise.
pub const DEFAULT_SLIPPAGE_PERCENT: u64 = 5;

/// TWAP window used for outbound swaps unless configured otherwise.
pub const DEFAULT_WINDOW_SECONDS: u64 = 10;

/// Lifetime of a grant created through `approve` (one year).
pub const DEFAULT_APPROVAL_EXPIRATION: Timestamp = 365 * 24 * 60 * 60;

/// Well-known address of the swap outpost precompile.
pub const SWAP_OUTPOST_ADDRESS: Address = {
    let mut addr = [0u8; 20];
    addr[18] = 0x09;
    addr[19] = 0x01;
    addr
};

/// Default IBC port for outbound transfers.
pub const DEFAULT_TRANSFER_PORT: &str = "transfer";

/// Default channel towards the counter-chain.
pub const DEFAULT_TRANSFER_CHANNEL: &str = "channel-0";

/// Action taken by the destination swap contract when delivery fails.
pub const ON_FAILED_DELIVERY_DO_NOTHING: &str = "do_nothing";

#[cfg(test)]
mod tests {
    use super::*;
    use crate::primitives::address_to_hex;

    #[test]
    fn test_outpost_address() {
        assert_eq!(
            address_to_hex(&SWAP_OUTPOST_ADDRESS),
            "0x0000000000000000000000000000000000000901"
        );
    }

    #[test]
    fn test_bounds_ordering() {
        assert!(DEFAULT_SLIPPAGE_PERCENT <= MAX_SLIPPAGE_PERCENT);
        assert!(DEFAULT_WINDOW_SECONDS <= MAX_WINDOW_SECONDS);
    }
}

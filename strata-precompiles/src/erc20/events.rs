use primitive_types::U256;
use strata_types::primitives::{Address, Amount};

use crate::abi::{address_topic, encode, event_topic, Token};
use crate::dispatch::Log;

pub const TRANSFER_EVENT: &str = "Transfer(address,address,uint256)";
pub const APPROVAL_EVENT: &str = "Approval(address,address,uint256)";

/// `Transfer(address indexed from, address indexed to, uint256 value)`
pub fn transfer_log(token: Address, from: &Address, to: &Address, amount: Amount) -> Log {
    Log {
        address: token,
        topics: vec![
            event_topic(TRANSFER_EVENT),
            address_topic(from),
            address_topic(to),
        ],
        data: encode(&[Token::Uint(U256::from(amount))]),
    }
}

/// `Approval(address indexed owner, address indexed spender, uint256 value)`
pub fn approval_log(token: Address, owner: &Address, spender: &Address, value: U256) -> Log {
    Log {
        address: token,
        topics: vec![
            event_topic(APPROVAL_EVENT),
            address_topic(owner),
            address_topic(spender),
        ],
        data: encode(&[Token::Uint(value)]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_approval_topic() {
        assert_eq!(
            hex::encode(event_topic(APPROVAL_EVENT)),
            "8c5be1e5ebec7d5bd14f71427d1e84f3dd0314c0f7b2291e5b200ac8c7c3b925"
        );
    }

    #[test]
    fn test_transfer_log_layout() {
        let log = transfer_log([9u8; 20], &[1u8; 20], &[2u8; 20], 100);
        assert_eq!(log.topics.len(), 3);
        assert_eq!(&log.topics[1][12..], &[1u8; 20]);
        assert_eq!(log.data.len(), 32);
        assert_eq!(log.data[31], 100);
    }
}

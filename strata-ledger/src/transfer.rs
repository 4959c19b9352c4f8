use std::sync::Arc;

use borsh::{BorshDeserialize, BorshSerialize};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use strata_types::constants::TRANSFER_MODULE_NAME;
use strata_types::primitives::{address_to_hex, Address, Timestamp};
use tracing::info;

use crate::bank::BankKeeper;
use crate::context::Context;
use crate::error::LedgerError;
use crate::msgs::{validate_identifier, Height, MsgTransfer};

/// ICS-20 application version, mixed into escrow address derivation.
pub const ICS20_VERSION: &str = "ics20-1";

const CHANNEL_PREFIX: &[u8] = b"transfer/channel/";
const SEQUENCE_PREFIX: &[u8] = b"transfer/seq/";
const PACKET_PREFIX: &[u8] = b"transfer/packet/";

fn path_key(prefix: &[u8], port: &str, channel: &str) -> Vec<u8> {
    [prefix, port.as_bytes(), b"/", channel.as_bytes()].concat()
}

fn packet_key(port: &str, channel: &str, sequence: u64) -> Vec<u8> {
    let mut key = path_key(PACKET_PREFIX, port, channel);
    key.push(b'/');
    key.extend_from_slice(&sequence.to_be_bytes());
    key
}

/// Voucher denom for `base` received over `port/channel`:
/// `ibc/` followed by the uppercase hex SHA-256 of the trace path.
pub fn compute_ibc_denom(port: &str, channel: &str, base: &str) -> String {
    let hash = Sha256::digest(format!("{port}/{channel}/{base}").as_bytes());
    format!("ibc/{}", hex::encode_upper(hash))
}

/// Escrow account for native tokens leaving over `port/channel`.
pub fn escrow_address(port: &str, channel: &str) -> Address {
    let mut hasher = Sha256::new();
    hasher.update(ICS20_VERSION.as_bytes());
    hasher.update([0u8]);
    hasher.update(format!("{port}/{channel}").as_bytes());
    let hash = hasher.finalize();
    let mut addr = [0u8; 20];
    addr.copy_from_slice(&hash[..20]);
    addr
}

/// Where an outbound transfer of `denom` over `port/channel` puts the funds:
/// native denoms go to the channel escrow, vouchers are burned (`None`).
pub fn outbound_destination(port: &str, channel: &str, denom: &str) -> Option<Address> {
    if denom.starts_with("ibc/") {
        None
    } else {
        Some(escrow_address(port, channel))
    }
}

/// Local end of an open channel.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct ChannelEnd {
    pub counterparty_port: String,
    pub counterparty_channel: String,
}

/// A packet queued for relaying. Nothing relays it in this process; it is
/// recorded so callers can observe what left the chain.
#[derive(Debug, Clone, PartialEq, Eq, BorshSerialize, BorshDeserialize, Serialize, Deserialize)]
pub struct OutboundPacket {
    pub sequence: u64,
    pub source_port: String,
    pub source_channel: String,
    pub denom: String,
    #[serde(with = "strata_types::primitives::serde_amount")]
    pub amount: u128,
    pub sender: String,
    pub receiver: String,
    pub memo: String,
    pub timeout_height: Height,
    pub timeout_timestamp: Timestamp,
}

/// Cross-chain transfer submission.
pub trait TransferKeeper: Send + Sync {
    /// Escrow or burn the token and queue the outbound packet. Returns the
    /// packet sequence.
    fn transfer(&self, ctx: &mut Context, msg: &MsgTransfer) -> Result<u64, LedgerError>;
}

/// ICS-20 style transfer module over the bank.
pub struct IbcTransfer {
    bank: Arc<dyn BankKeeper>,
}

impl IbcTransfer {
    pub fn new(bank: Arc<dyn BankKeeper>) -> Self {
        Self { bank }
    }

    pub fn open_channel(
        &self,
        ctx: &mut Context,
        port: &str,
        channel: &str,
        end: &ChannelEnd,
    ) -> Result<(), LedgerError> {
        validate_identifier("port", port)?;
        validate_identifier("channel", channel)?;
        ctx.set_borsh(&path_key(CHANNEL_PREFIX, port, channel), end)?;
        info!(port, channel, "channel opened");
        Ok(())
    }

    pub fn channel(
        &self,
        ctx: &mut Context,
        port: &str,
        channel: &str,
    ) -> Result<Option<ChannelEnd>, LedgerError> {
        ctx.get_borsh(&path_key(CHANNEL_PREFIX, port, channel))
    }

    /// Sequence the next packet on this channel will carry.
    pub fn next_sequence(
        &self,
        ctx: &mut Context,
        port: &str,
        channel: &str,
    ) -> Result<u64, LedgerError> {
        Ok(ctx
            .get_borsh(&path_key(SEQUENCE_PREFIX, port, channel))?
            .unwrap_or(1))
    }

    pub fn packet(
        &self,
        ctx: &mut Context,
        port: &str,
        channel: &str,
        sequence: u64,
    ) -> Result<Option<OutboundPacket>, LedgerError> {
        ctx.get_borsh(&packet_key(port, channel, sequence))
    }

    /// All packets queued on a channel, in sequence order.
    pub fn outbound_packets(
        &self,
        ctx: &mut Context,
        port: &str,
        channel: &str,
    ) -> Result<Vec<OutboundPacket>, LedgerError> {
        let mut prefix = path_key(PACKET_PREFIX, port, channel);
        prefix.push(b'/');
        ctx.prefix_scan(&prefix)?
            .into_iter()
            .map(|(_, value)| {
                borsh::from_slice(&value).map_err(|e| {
                    LedgerError::from(crate::error::StorageError::DeserializationError {
                        reason: e.to_string(),
                    })
                })
            })
            .collect()
    }
}

impl TransferKeeper for IbcTransfer {
    fn transfer(&self, ctx: &mut Context, msg: &MsgTransfer) -> Result<u64, LedgerError> {
        msg.validate_basic()?;
        let port = msg.source_port.as_str();
        let channel = msg.source_channel.as_str();
        if self.channel(ctx, port, channel)?.is_none() {
            return Err(LedgerError::ChannelNotFound {
                port: port.to_string(),
                channel: channel.to_string(),
            });
        }

        let coins = [msg.token.clone()];
        match outbound_destination(port, channel, &msg.token.denom) {
            Some(escrow) => self.bank.send(ctx, &msg.sender, &escrow, &coins)?,
            None => {
                // Vouchers returning to their source are destroyed here.
                self.bank.send_coins_from_account_to_module(
                    ctx,
                    &msg.sender,
                    TRANSFER_MODULE_NAME,
                    &coins,
                )?;
                self.bank.burn_coins(ctx, TRANSFER_MODULE_NAME, &coins)?;
            }
        }

        let sequence = self.next_sequence(ctx, port, channel)?;
        let packet = OutboundPacket {
            sequence,
            source_port: port.to_string(),
            source_channel: channel.to_string(),
            denom: msg.token.denom.clone(),
            amount: msg.token.amount,
            sender: address_to_hex(&msg.sender),
            receiver: msg.receiver.clone(),
            memo: msg.memo.clone(),
            timeout_height: msg.timeout_height,
            timeout_timestamp: msg.timeout_timestamp,
        };
        ctx.set_borsh(&packet_key(port, channel, sequence), &packet)?;
        ctx.set_borsh(&path_key(SEQUENCE_PREFIX, port, channel), &(sequence + 1))?;

        info!(
            port,
            channel,
            sequence,
            token = %msg.token,
            receiver = %msg.receiver,
            "outbound transfer queued"
        );
        Ok(sequence)
    }
}

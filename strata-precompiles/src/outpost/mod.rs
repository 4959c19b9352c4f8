//! Swap outpost: packages a cross-chain transfer with a memo instructing the
//! destination chain's swap contract.

pub mod memo;
pub mod swap;

use std::sync::Arc;

use primitive_types::U256;
use serde::{Deserialize, Serialize};
use strata_ledger::authz::AuthzKeeper;
use strata_ledger::erc20::Erc20Keeper;
use strata_ledger::error::LedgerError;
use strata_ledger::msgs::{Height, Msg, MsgTransfer};
use strata_ledger::staking::StakingKeeper;
use strata_ledger::transfer::{outbound_destination, TransferKeeper};
use strata_types::constants::{
    DEFAULT_COUNTER_DENOM, DEFAULT_SLIPPAGE_PERCENT, DEFAULT_TRANSFER_CHANNEL,
    DEFAULT_TRANSFER_PORT, DEFAULT_WINDOW_SECONDS, SWAP_OUTPOST_ADDRESS, TRANSFER_MSG_URL,
};
use strata_types::primitives::{address_to_hex, Address, Coin};
use tracing::info;

use crate::abi::{address_topic, encode, event_topic, string_topic, ParamType, Token};
use crate::authorization::{AuthorizationGateway, Authorized};
use crate::descriptor::{DescriptorTable, MethodKind, OperationDescriptor};
use crate::dispatch::{drive, Call, Capability, Completed, Log, OperationHandler};
use crate::error::PrecompileError;
use crate::journal::BalanceChangeJournal;

use memo::SwapMemo;
use swap::{supported_inputs, SwapPacket};

pub const SWAP_GAS: u64 = 1_500_000;

pub const IBC_TRANSFER_EVENT: &str =
    "IBCTransfer(address,string,string,string,string,uint256,string)";
pub const SWAP_EVENT: &str = "Swap(address,address,address,uint256,string)";

/// Timeout attached to every outbound swap transfer.
pub const SWAP_TIMEOUT_HEIGHT: Height = Height {
    revision_number: 100,
    revision_height: 100,
};

/// Where swaps go and with which parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutpostConfig {
    pub port: String,
    pub channel: String,
    /// Swap contract on the destination chain; receives the transfer.
    pub swap_contract: String,
    /// Native denom of the destination chain.
    pub counter_denom: String,
    pub slippage_percent: u64,
    pub window_seconds: u64,
}

impl Default for OutpostConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_TRANSFER_PORT.to_string(),
            channel: DEFAULT_TRANSFER_CHANNEL.to_string(),
            swap_contract: String::new(),
            counter_denom: DEFAULT_COUNTER_DENOM.to_string(),
            slippage_percent: DEFAULT_SLIPPAGE_PERCENT,
            window_seconds: DEFAULT_WINDOW_SECONDS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutpostOp {
    Swap,
}

pub struct SwapOutpost {
    config: OutpostConfig,
    evm_denom: String,
    erc20: Arc<dyn Erc20Keeper>,
    staking: Arc<dyn StakingKeeper>,
    transfer: Arc<dyn TransferKeeper>,
    authz: Arc<dyn AuthzKeeper>,
    table: DescriptorTable<OutpostOp>,
}

impl SwapOutpost {
    pub fn new(
        config: OutpostConfig,
        evm_denom: impl Into<String>,
        erc20: Arc<dyn Erc20Keeper>,
        staking: Arc<dyn StakingKeeper>,
        transfer: Arc<dyn TransferKeeper>,
        authz: Arc<dyn AuthzKeeper>,
    ) -> Result<Self, PrecompileError> {
        let table = DescriptorTable::new(vec![OperationDescriptor::new(
            OutpostOp::Swap,
            "swap(address,address,address,uint256,string)",
            &[
                ParamType::Address,
                ParamType::Address,
                ParamType::Address,
                ParamType::Uint256,
                ParamType::String,
            ],
            MethodKind::Transaction,
            SWAP_GAS,
        )])?;
        Ok(Self {
            config,
            evm_denom: evm_denom.into(),
            erc20,
            staking,
            transfer,
            authz,
            table,
        })
    }

    pub fn config(&self) -> &OutpostConfig {
        &self.config
    }

    fn denom_of(&self, call: &mut Call<'_>, token: &Address) -> Result<String, PrecompileError> {
        self.erc20
            .token_pair_by_address(call.ctx, token)?
            .map(|pair| pair.denom)
            .ok_or_else(|| {
                PrecompileError::validation(format!(
                    "token pair for address {} not found",
                    address_to_hex(token)
                ))
            })
    }
}

impl Capability for SwapOutpost {
    type Op = OutpostOp;

    fn name(&self) -> &'static str {
        "swap-outpost"
    }

    fn address(&self) -> Address {
        SWAP_OUTPOST_ADDRESS
    }

    fn evm_denom(&self) -> &str {
        &self.evm_denom
    }

    fn descriptors(&self) -> &DescriptorTable<OutpostOp> {
        &self.table
    }

    fn handle(&self, op: OutpostOp, call: &mut Call<'_>) -> Result<Completed, PrecompileError> {
        match op {
            OutpostOp::Swap => drive(&SwapHandler, self, call),
        }
    }
}

/// Resolve the effective sender. A contract naming itself as sender acts for
/// the transaction origin; anything else must name the origin.
pub fn check_origin_and_sender(
    caller: &Address,
    origin: &Address,
    sender: &Address,
) -> Result<Address, PrecompileError> {
    if caller == sender {
        return Ok(*origin);
    }
    if origin != sender {
        return Err(PrecompileError::validation(format!(
            "origin address {} is not the same as sender address {}",
            address_to_hex(origin),
            address_to_hex(sender)
        )));
    }
    Ok(*sender)
}

struct SwapHandler;

struct SwapRequest {
    input: Address,
    output: Address,
    packet: SwapPacket,
    msg: Msg,
}

impl SwapRequest {
    fn transfer(&self) -> Result<&MsgTransfer, PrecompileError> {
        match &self.msg {
            Msg::Transfer(transfer) => Ok(transfer),
            other => Err(PrecompileError::validation(format!(
                "expected a transfer message, got {}",
                other.type_url()
            ))),
        }
    }
}

impl OperationHandler<SwapOutpost> for SwapHandler {
    type Request = SwapRequest;
    /// Sequence of the queued packet.
    type Effect = u64;

    fn validate(&self, p: &SwapOutpost, call: &mut Call<'_>) -> Result<SwapRequest, PrecompileError> {
        call.args.expect_len(5)?;
        let sender = call.args.address(0, "sender address")?;
        let input = call.args.address(1, "input denom")?;
        let output = call.args.address(2, "output denom")?;
        let amount = call.args.amount(3, "amount")?;
        let receiver = call.args.string(4, "receiver address")?;

        let input_denom = p.denom_of(call, &input)?;
        let output_denom = p.denom_of(call, &output)?;
        let bond_denom = p.staking.bond_denom(call.ctx)?;

        let config = &p.config;
        let supported = supported_inputs(
            &bond_denom,
            &config.port,
            &config.channel,
            &config.counter_denom,
        );
        let mut packet = SwapPacket {
            sender,
            input_denom,
            output_denom,
            amount,
            receiver,
            slippage_percent: config.slippage_percent,
            window_seconds: config.window_seconds,
        };
        packet.validate(&supported)?;
        packet.sender = check_origin_and_sender(&call.caller, &call.origin, &packet.sender)?;

        let memo = SwapMemo::new(
            &packet.output_denom,
            &packet.receiver,
            &config.swap_contract,
            &packet.slippage_percent.to_string(),
            packet.window_seconds,
        )
        .to_json()?;
        let msg = Msg::Transfer(MsgTransfer {
            source_port: config.port.clone(),
            source_channel: config.channel.clone(),
            token: Coin::new(packet.input_denom.clone(), packet.amount),
            sender: packet.sender,
            receiver: config.swap_contract.clone(),
            timeout_height: SWAP_TIMEOUT_HEIGHT,
            timeout_timestamp: 0,
            memo,
        });
        msg.validate_basic()?;

        Ok(SwapRequest {
            input,
            output,
            packet,
            msg,
        })
    }

    fn authorize(
        &self,
        p: &SwapOutpost,
        call: &mut Call<'_>,
        req: &SwapRequest,
    ) -> Result<Authorized, PrecompileError> {
        // The sender is the origin at this point, so a caller other than the
        // origin needs a transfer grant from it.
        AuthorizationGateway::new(p.authz.as_ref())
            .authorize(call.ctx, &call.caller, &req.packet.sender, &req.msg)
            .map_err(|err| match err {
                LedgerError::NoAuthorizationFound => PrecompileError::authorization(format!(
                    "authorization to {} for address {} does not exist or is expired",
                    address_to_hex(&call.caller),
                    address_to_hex(&call.origin)
                )),
                other => other.into(),
            })
    }

    fn execute(
        &self,
        p: &SwapOutpost,
        call: &mut Call<'_>,
        req: &SwapRequest,
        authorized: &Authorized,
    ) -> Result<u64, PrecompileError> {
        let sequence = p.transfer.transfer(call.ctx, req.transfer()?)?;
        AuthorizationGateway::new(p.authz.as_ref()).settle(call.ctx, authorized)?;
        info!(
            sender = %address_to_hex(&req.packet.sender),
            input = %req.packet.input_denom,
            output = %req.packet.output_denom,
            amount = %req.packet.amount,
            sequence,
            msg_type = TRANSFER_MSG_URL,
            "swap submitted"
        );
        Ok(sequence)
    }

    fn journal(
        &self,
        p: &SwapOutpost,
        req: &SwapRequest,
        _: &u64,
        journal: &mut BalanceChangeJournal,
    ) {
        let packet = &req.packet;
        match outbound_destination(&p.config.port, &p.config.channel, &packet.input_denom) {
            Some(escrow) => {
                journal.transfer(&packet.input_denom, packet.sender, escrow, packet.amount)
            }
            None => journal.debit(&packet.input_denom, packet.sender, packet.amount),
        }
    }

    fn emit(&self, _: &SwapOutpost, call: &Call<'_>, req: &SwapRequest, _: &u64) -> Vec<Log> {
        let packet = &req.packet;
        let mut logs = Vec::with_capacity(2);
        if let Ok(transfer) = req.transfer() {
            logs.push(Log {
                address: call.address,
                topics: vec![
                    event_topic(IBC_TRANSFER_EVENT),
                    address_topic(&transfer.sender),
                    string_topic(&transfer.receiver),
                ],
                data: encode(&[
                    Token::String(transfer.source_port.clone()),
                    Token::String(transfer.source_channel.clone()),
                    Token::String(transfer.token.denom.clone()),
                    Token::Uint(U256::from(transfer.token.amount)),
                    Token::String(transfer.memo.clone()),
                ]),
            });
        }
        logs.push(Log {
            address: call.address,
            topics: vec![
                event_topic(SWAP_EVENT),
                address_topic(&packet.sender),
                address_topic(&req.input),
                address_topic(&req.output),
            ],
            data: encode(&[
                Token::Uint(U256::from(packet.amount)),
                Token::String(packet.receiver.clone()),
            ]),
        });
        logs
    }

    fn output(&self, _: &SwapRequest, _: &u64) -> Vec<u8> {
        encode(&[Token::Bool(true)])
    }
}

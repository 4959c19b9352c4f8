//! Minimal contract-ABI codec for the parameter types the precompiles use.
//!
//! Arguments are 32-byte head words; `string` values live in a tail section
//! referenced by an offset in their head word.

use primitive_types::U256;
use strata_types::primitives::{keccak256, Address, Hash};

use crate::error::PrecompileError;

/// Width of one ABI word.
pub const WORD: usize = 32;

/// 4-byte method selector.
pub type Selector = [u8; 4];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamType {
    Address,
    Uint256,
    Uint8,
    Bool,
    String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Address(Address),
    Uint(U256),
    Bool(bool),
    String(String),
}

/// Selector of a canonical signature such as `transfer(address,uint256)`.
pub fn selector(signature: &str) -> Selector {
    let hash = keccak256(signature.as_bytes());
    [hash[0], hash[1], hash[2], hash[3]]
}

/// Topic of an event signature.
pub fn event_topic(signature: &str) -> Hash {
    keccak256(signature.as_bytes())
}

/// Indexed address topic: the address left-padded to a word.
pub fn address_topic(addr: &Address) -> Hash {
    let mut topic = [0u8; 32];
    topic[12..].copy_from_slice(addr);
    topic
}

/// Indexed string topic: the hash of the string.
pub fn string_topic(value: &str) -> Hash {
    keccak256(value.as_bytes())
}

fn uint_word(value: U256) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    value.to_big_endian(&mut word);
    word
}

fn padded_len(len: usize) -> usize {
    len.div_ceil(WORD) * WORD
}

/// Encode a tuple of tokens.
pub fn encode(tokens: &[Token]) -> Vec<u8> {
    let head_len = tokens.len() * WORD;
    let mut head = Vec::with_capacity(head_len);
    let mut tail = Vec::new();
    for token in tokens {
        match token {
            Token::Address(addr) => {
                let mut word = [0u8; WORD];
                word[12..].copy_from_slice(addr);
                head.extend_from_slice(&word);
            }
            Token::Uint(value) => head.extend_from_slice(&uint_word(*value)),
            Token::Bool(b) => head.extend_from_slice(&uint_word(U256::from(u8::from(*b)))),
            Token::String(s) => {
                head.extend_from_slice(&uint_word(U256::from(head_len + tail.len())));
                tail.extend_from_slice(&uint_word(U256::from(s.len())));
                let mut bytes = s.as_bytes().to_vec();
                bytes.resize(padded_len(s.len()), 0);
                tail.extend_from_slice(&bytes);
            }
        }
    }
    head.extend_from_slice(&tail);
    head
}

/// Decode arguments of the given types.
///
/// Only complete head words are decoded, so a short payload yields fewer
/// tokens than `types` and the caller reports the arity mismatch. A word that
/// does not hold a value of its declared type is an argument error; an address
/// word with dirty high bytes is a validation error.
pub fn decode(types: &[ParamType], data: &[u8]) -> Result<Vec<Token>, PrecompileError> {
    let available = (data.len() / WORD).min(types.len());
    types
        .iter()
        .take(available)
        .enumerate()
        .map(|(i, ty)| decode_param(i, *ty, &data[i * WORD..(i + 1) * WORD], data))
        .collect()
}

fn bad_arg(index: usize, reason: impl std::fmt::Display) -> PrecompileError {
    PrecompileError::invalid_argument(&format!("argument {index}"), reason)
}

fn word_to_usize(index: usize, word: &[u8]) -> Result<usize, PrecompileError> {
    if word[..WORD - 8].iter().any(|b| *b != 0) {
        return Err(bad_arg(index, "offset or length out of range"));
    }
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&word[WORD - 8..]);
    usize::try_from(u64::from_be_bytes(bytes)).map_err(|_| bad_arg(index, "offset out of range"))
}

fn decode_param(
    index: usize,
    ty: ParamType,
    word: &[u8],
    data: &[u8],
) -> Result<Token, PrecompileError> {
    match ty {
        ParamType::Address => {
            if word[..12].iter().any(|b| *b != 0) {
                return Err(PrecompileError::validation(format!(
                    "invalid address encoding for argument {index}: non-zero high bytes"
                )));
            }
            let mut addr = [0u8; 20];
            addr.copy_from_slice(&word[12..]);
            Ok(Token::Address(addr))
        }
        ParamType::Uint256 => Ok(Token::Uint(U256::from_big_endian(word))),
        ParamType::Uint8 => {
            let value = U256::from_big_endian(word);
            if value > U256::from(u8::MAX) {
                return Err(bad_arg(index, format!("{value} overflows uint8")));
            }
            Ok(Token::Uint(value))
        }
        ParamType::Bool => match U256::from_big_endian(word) {
            v if v.is_zero() => Ok(Token::Bool(false)),
            v if v == U256::one() => Ok(Token::Bool(true)),
            v => Err(bad_arg(index, format!("{v} is not a bool"))),
        },
        ParamType::String => {
            let offset = word_to_usize(index, word)?;
            let len_end = offset
                .checked_add(WORD)
                .filter(|end| *end <= data.len())
                .ok_or_else(|| bad_arg(index, "string offset out of bounds"))?;
            let len = word_to_usize(index, &data[offset..len_end])?;
            let end = len_end
                .checked_add(len)
                .filter(|end| *end <= data.len())
                .ok_or_else(|| bad_arg(index, "string length out of bounds"))?;
            let s = std::str::from_utf8(&data[len_end..end])
                .map_err(|e| bad_arg(index, format!("string is not utf-8: {e}")))?;
            Ok(Token::String(s.to_string()))
        }
    }
}

/// Encode a call: selector followed by the encoded arguments.
pub fn encode_call(signature: &str, args: &[Token]) -> Vec<u8> {
    let mut data = selector(signature).to_vec();
    data.extend(encode(args));
    data
}

use crate::abi::encode_admin_withdraw_call;
use crate::config::{TokenConfig, TokenKind};
use alloy_primitives::{Address, Bytes, U256};
use std::str::FromStr;
use thiserror::Error;

pub const WORD: usize = 32;

/// Words before the first dynamic array of an ERC1155 batch payload:
/// token, recipient and three offsets.
const ERC1155_HEAD_WORDS: usize = 5;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EncodeError {
    #[error("invalid {field} address {value}")]
    InvalidAddress { field: &'static str, value: String },
    #[error("invalid {field} value {value:?}: expected a base-10 integer")]
    InvalidNumber { field: &'static str, value: String },
    #[error("erc1155 batch has {token_ids} token ids but {amounts} amounts")]
    LengthMismatch { token_ids: usize, amounts: usize },
    #[error("{kind} withdrawal expects exactly one amount or token id, got {found}")]
    ExpectedSingleAmount { kind: TokenKind, found: usize },
}

/// Sequential writer of 32-byte big-endian ABI words.
#[derive(Debug, Default)]
pub struct WordWriter {
    buf: Vec<u8>,
}

impl WordWriter {
    pub fn with_words(words: usize) -> Self {
        Self {
            buf: Vec::with_capacity(words * WORD),
        }
    }

    pub fn address(&mut self, address: Address) -> &mut Self {
        self.buf.extend_from_slice(&[0u8; 12]);
        self.buf.extend_from_slice(address.as_slice());
        self
    }

    pub fn uint(&mut self, value: U256) -> &mut Self {
        self.buf.extend_from_slice(&value.to_be_bytes::<32>());
        self
    }

    pub fn usize(&mut self, value: usize) -> &mut Self {
        self.uint(U256::from(value))
    }

    pub fn finish(self) -> Bytes {
        Bytes::from(self.buf)
    }
}

/// `token ‖ recipient ‖ amountOrTokenID`, 96 bytes.
pub fn encode_fungible_withdrawal(token: Address, recipient: Address, amount: U256) -> Bytes {
    let mut writer = WordWriter::with_words(3);
    writer.address(token).address(recipient).uint(amount);
    writer.finish()
}

/// Build the ERC1155 batch payload expected by the handler's `withdraw`.
///
/// Layout, one 32-byte word per line:
///
/// ```text
/// token
/// recipient
/// offset(tokenIDs)  = 5 * 32
/// offset(amounts)   = offset(tokenIDs) + 32 * (1 + len(tokenIDs))
/// offset(data)      = offset(amounts)  + 32 * (1 + len(amounts))
/// len(tokenIDs), tokenIDs...
/// len(amounts), amounts...
/// 0                 (empty transfer data)
/// ```
pub fn encode_erc1155_withdrawal(
    token: Address,
    recipient: Address,
    token_ids: &[U256],
    amounts: &[U256],
) -> Result<Bytes, EncodeError> {
    if token_ids.len() != amounts.len() {
        return Err(EncodeError::LengthMismatch {
            token_ids: token_ids.len(),
            amounts: amounts.len(),
        });
    }

    let ids_offset = ERC1155_HEAD_WORDS * WORD;
    let amounts_offset = ids_offset + WORD * (1 + token_ids.len());
    let data_offset = amounts_offset + WORD * (1 + amounts.len());
    let total_words = data_offset / WORD + 1;

    let mut writer = WordWriter::with_words(total_words);
    writer
        .address(token)
        .address(recipient)
        .usize(ids_offset)
        .usize(amounts_offset)
        .usize(data_offset);

    writer.usize(token_ids.len());
    for id in token_ids {
        writer.uint(*id);
    }
    writer.usize(amounts.len());
    for amount in amounts {
        writer.uint(*amount);
    }
    writer.usize(0);

    Ok(writer.finish())
}

/// Encode the handler payload for one configured withdrawal.
pub fn encode_withdrawal_payload(token: &TokenConfig) -> Result<Bytes, EncodeError> {
    let token_address = parse_field_address("token", &token.token_address)?;
    let recipient = parse_field_address("recipient", &token.recipient)?;
    let values = token.amount_or_token_id.values();

    match token.kind {
        TokenKind::Erc1155 => {
            let token_ids = parse_numbers("token id", values)?;
            let amounts = parse_numbers("amount", &token.amounts)?;
            encode_erc1155_withdrawal(token_address, recipient, &token_ids, &amounts)
        }
        kind => {
            let [value] = values else {
                return Err(EncodeError::ExpectedSingleAmount {
                    kind,
                    found: values.len(),
                });
            };
            let amount = parse_decimal("amount or token id", value)?;
            Ok(encode_fungible_withdrawal(token_address, recipient, amount))
        }
    }
}

/// Full `adminWithdraw(handler, payload)` calldata for one configured withdrawal.
pub fn encode_withdraw_calldata(token: &TokenConfig) -> Result<Bytes, EncodeError> {
    let handler = parse_field_address("handler", &token.handler_address)?;
    let payload = encode_withdrawal_payload(token)?;
    Ok(encode_admin_withdraw_call(handler, payload))
}

pub fn parse_decimal(field: &'static str, value: &str) -> Result<U256, EncodeError> {
    let invalid = || EncodeError::InvalidNumber {
        field,
        value: value.to_string(),
    };
    let trimmed = value.trim();
    if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    U256::from_str_radix(trimmed, 10).map_err(|_| invalid())
}

fn parse_numbers(field: &'static str, values: &[String]) -> Result<Vec<U256>, EncodeError> {
    values
        .iter()
        .map(|value| parse_decimal(field, value))
        .collect()
}

fn parse_field_address(field: &'static str, value: &str) -> Result<Address, EncodeError> {
    Address::from_str(value.trim()).map_err(|_| EncodeError::InvalidAddress {
        field,
        value: value.to_string(),
    })
}

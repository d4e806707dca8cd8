use crate::types::{ProposalStatus, PROPOSAL_EVENT_NAME};
use alloy_primitives::{keccak256, Address, Bytes, B256};
use alloy_rpc_types::Log;
use alloy_sol_types::{SolCall, SolValue};
use thiserror::Error;

alloy_sol_types::sol! {
    struct ProposalEventData {
        bytes32 resourceID;
        bytes32 dataHash;
    }

    function adminPauseTransfers();
    function adminWithdraw(address handlerAddress, bytes data);
}

pub const PROPOSAL_EVENT_SIGNATURE: &str = "ProposalEvent(uint8,uint64,uint8,bytes32,bytes32)";

#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("{event} log at block {block:?} has {found} topics, expected 4")]
    MissingTopics {
        event: &'static str,
        block: Option<u64>,
        found: usize,
    },
    #[error("unable to unpack {event} data in tx {tx}: {source}")]
    Data {
        event: &'static str,
        tx: String,
        #[source]
        source: alloy_sol_types::Error,
    },
}

/// A decoded `ProposalEvent` together with the metadata of the log it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalEvent {
    pub origin_chain_id: u8,
    pub deposit_nonce: u64,
    /// Raw status byte; values outside the bridge enum are kept so callers can ignore them.
    pub status: u8,
    pub resource_id: B256,
    pub data_hash: B256,
    pub tx_hash: Option<B256>,
    pub block_number: Option<u64>,
    pub log_index: Option<u64>,
}

impl ProposalEvent {
    pub fn proposal_status(&self) -> Option<ProposalStatus> {
        ProposalStatus::from_u8(self.status)
    }
}

pub fn event_topic(signature: &str) -> B256 {
    keccak256(signature.as_bytes())
}

pub fn proposal_event_topic() -> B256 {
    event_topic(PROPOSAL_EVENT_SIGNATURE)
}

/// Decode a bridge log into a proposal event.
///
/// Logs of any other event (or without topics) yield `Ok(None)`. A
/// `ProposalEvent` log that cannot be decoded is an error: the caller must not
/// trust a partially folded scan.
pub fn decode_proposal_log(log: &Log) -> Result<Option<ProposalEvent>, DecodeError> {
    let topics = log.topics();
    let Some(topic0) = topics.first() else {
        return Ok(None);
    };
    if *topic0 != proposal_event_topic() {
        return Ok(None);
    }
    if topics.len() < 4 {
        return Err(DecodeError::MissingTopics {
            event: PROPOSAL_EVENT_NAME,
            block: log.block_number,
            found: topics.len(),
        });
    }

    let data = ProposalEventData::abi_decode_params(&log.data().data).map_err(|source| {
        DecodeError::Data {
            event: PROPOSAL_EVENT_NAME,
            tx: log
                .transaction_hash
                .map(|hash| format!("{hash:#x}"))
                .unwrap_or_else(|| "unknown".to_string()),
            source,
        }
    })?;

    Ok(Some(ProposalEvent {
        origin_chain_id: topic_u8(&topics[1]),
        deposit_nonce: topic_u64(&topics[2]),
        status: topic_u8(&topics[3]),
        resource_id: data.resourceID,
        data_hash: data.dataHash,
        tx_hash: log.transaction_hash,
        block_number: log.block_number,
        log_index: log.log_index,
    }))
}

// Indexed integers are read from the low-order bytes; wider values truncate.
fn topic_u8(topic: &B256) -> u8 {
    topic[31]
}

fn topic_u64(topic: &B256) -> u64 {
    let mut buf = [0u8; 8];
    buf.copy_from_slice(&topic[24..32]);
    u64::from_be_bytes(buf)
}

pub fn encode_pause_transfers_call() -> Bytes {
    Bytes::from(adminPauseTransfersCall {}.abi_encode())
}

pub fn encode_admin_withdraw_call(handler: Address, data: Bytes) -> Bytes {
    let call = adminWithdrawCall {
        handlerAddress: handler,
        data,
    };
    Bytes::from(call.abi_encode())
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::*;
    use alloy_primitives::{LogData, U256};

    pub fn topic_from_u64(value: u64) -> B256 {
        B256::from(U256::from(value).to_be_bytes::<32>())
    }

    pub fn proposal_log(
        origin: u8,
        nonce: u64,
        status: u8,
        resource_id: B256,
        block_number: u64,
    ) -> Log {
        let data = ProposalEventData {
            resourceID: resource_id,
            dataHash: B256::repeat_byte(0xdd),
        }
        .abi_encode_params();
        raw_log(
            vec![
                proposal_event_topic(),
                topic_from_u64(origin as u64),
                topic_from_u64(nonce),
                topic_from_u64(status as u64),
            ],
            data.into(),
            block_number,
        )
    }

    pub fn raw_log(topics: Vec<B256>, data: Bytes, block_number: u64) -> Log {
        Log {
            inner: alloy_primitives::Log {
                address: Address::repeat_byte(0xbb),
                data: LogData::new_unchecked(topics, data),
            },
            block_number: Some(block_number),
            transaction_hash: Some(B256::repeat_byte(block_number as u8)),
            log_index: Some(0),
            ..Default::default()
        }
    }
}

use crate::abi::ProposalEvent;
use crate::types::{ProposalStatus, PROPOSAL_EVENT_NAME};
use alloy_primitives::B256;
use std::collections::BTreeMap;

/// Identity of one cross-chain transfer proposal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ProposalKey {
    pub origin_chain_id: u8,
    pub resource_id: B256,
    pub deposit_nonce: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProposalRecord {
    pub status: ProposalStatus,
    pub data_hash: B256,
    pub event_name: String,
    pub tx_hash: Option<B256>,
    pub block_number: Option<u64>,
}

/// Last-seen status of every non-terminal proposal within one scan window.
///
/// The ledger is rebuilt from scratch for each chain on each polling round.
#[derive(Debug, Default)]
pub struct ProposalLedger {
    entries: BTreeMap<ProposalKey, ProposalRecord>,
}

impl ProposalLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one decoded event into the ledger. Events must be applied in log order.
    pub fn apply(&mut self, event: &ProposalEvent) {
        let key = ProposalKey {
            origin_chain_id: event.origin_chain_id,
            resource_id: event.resource_id,
            deposit_nonce: event.deposit_nonce,
        };
        match event.proposal_status() {
            Some(status) if status.is_pending() => {
                self.entries.insert(
                    key,
                    ProposalRecord {
                        status,
                        data_hash: event.data_hash,
                        event_name: PROPOSAL_EVENT_NAME.to_string(),
                        tx_hash: event.tx_hash,
                        block_number: event.block_number,
                    },
                );
            }
            Some(status) if status.is_terminal() => {
                self.entries.remove(&key);
            }
            _ => {}
        }
    }

    pub fn has_pending(&self) -> bool {
        !self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, key: &ProposalKey) -> Option<&ProposalRecord> {
        self.entries.get(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ProposalKey, &ProposalRecord)> {
        self.entries.iter()
    }
}

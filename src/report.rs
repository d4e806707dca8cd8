use crate::ledger::{ProposalKey, ProposalRecord};
use crate::poller::ChainScan;
use serde::Serialize;
use std::fmt::Write as _;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingProposalView {
    pub status: String,
    pub origin_chain_id: u8,
    pub deposit_nonce: u64,
    pub resource_id: String,
    pub data_hash: String,
    pub event: String,
    pub block_number: Option<u64>,
    pub tx_hash: Option<String>,
}

impl PendingProposalView {
    pub fn new(key: &ProposalKey, record: &ProposalRecord) -> Self {
        Self {
            status: record.status.to_string(),
            origin_chain_id: key.origin_chain_id,
            deposit_nonce: key.deposit_nonce,
            resource_id: format!("{:#x}", key.resource_id),
            data_hash: format!("{:#x}", record.data_hash),
            event: record.event_name.clone(),
            block_number: record.block_number,
            tx_hash: record.tx_hash.map(|hash| format!("{hash:#x}")),
        }
    }

    pub fn display_line(&self) -> String {
        format!(
            "Status: {} OriginChainID: {} DepositNonce: {} ResourceID: {} DataHash: {}",
            self.status, self.origin_chain_id, self.deposit_nonce, self.resource_id, self.data_hash
        )
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainScanView {
    pub chain_id: String,
    pub chain_name: String,
    pub from_block: u64,
    pub pending: Vec<PendingProposalView>,
}

impl From<&ChainScan> for ChainScanView {
    fn from(scan: &ChainScan) -> Self {
        Self {
            chain_id: scan.chain_id.clone(),
            chain_name: scan.chain_name.clone(),
            from_block: scan.from_block,
            pending: scan
                .ledger
                .iter()
                .map(|(key, record)| PendingProposalView::new(key, record))
                .collect(),
        }
    }
}

/// Human-readable listing of a chain's pending proposals.
pub fn render_chain_scan(scan: &ChainScanView) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} pending proposals on chain {} ({}) from block {}",
        scan.pending.len(),
        scan.chain_name,
        scan.chain_id,
        scan.from_block
    );
    for (index, proposal) in scan.pending.iter().enumerate() {
        let _ = writeln!(out, "[{index}] {}", proposal.display_line());
        let block = proposal
            .block_number
            .map(|block| block.to_string())
            .unwrap_or_else(|| "-".to_string());
        let tx = proposal.tx_hash.as_deref().unwrap_or("-");
        let _ = writeln!(
            out,
            "    => Event: {} BlockNumber: {block} TxHash: {tx}",
            proposal.event
        );
    }
    out
}

pub fn print_chain_scan(scan: &ChainScan) {
    print!("{}", render_chain_scan(&ChainScanView::from(scan)));
}

/// Outcome of one batch of admin transactions.
#[derive(Debug, Default, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DispatchSummary {
    pub submitted: Vec<String>,
    pub failed: usize,
    pub skipped: usize,
}

impl DispatchSummary {
    pub fn record_submitted(&mut self, tx_hash: impl Into<String>) {
        self.submitted.push(tx_hash.into());
    }

    pub fn record_failed(&mut self) {
        self.failed += 1;
    }

    pub fn record_skipped(&mut self) {
        self.skipped += 1;
    }

    pub fn merge(&mut self, other: DispatchSummary) {
        self.submitted.extend(other.submitted);
        self.failed += other.failed;
        self.skipped += other.skipped;
    }
}

impl std::fmt::Display for DispatchSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "submitted: {} failed: {} skipped: {}",
            self.submitted.len(),
            self.failed,
            self.skipped
        )
    }
}

use crate::abi::decode_proposal_log;
use crate::config::{ChainConfig, Config};
use crate::ledger::ProposalLedger;
use crate::rpc::BridgeRpc;
use alloy_primitives::Address;
use anyhow::{Context, Result};
use std::future::Future;
use std::time::Duration;

/// Pause between polling rounds.
pub trait Backoff {
    fn wait(&mut self, interval: Duration) -> impl Future<Output = Result<()>>;
}

/// Sleeps on the tokio timer, giving up early on Ctrl-C.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioBackoff;

impl Backoff for TokioBackoff {
    async fn wait(&mut self, interval: Duration) -> Result<()> {
        tokio::select! {
            _ = tokio::time::sleep(interval) => Ok(()),
            signal = tokio::signal::ctrl_c() => {
                signal.context("failed to listen for ctrl-c")?;
                anyhow::bail!("interrupted while waiting for pending proposals to settle")
            }
        }
    }
}

/// A chain prepared for scanning: resolved bridge address and start block.
pub struct WatchedChain<'a, C> {
    pub chain: &'a ChainConfig,
    pub bridge: Address,
    pub from_block: u64,
    pub client: C,
}

impl<'a, C> WatchedChain<'a, C> {
    pub fn new(config: &Config, chain: &'a ChainConfig, client: C) -> Result<Self> {
        let from_block = config.starting_block(&chain.id)?;
        let bridge = chain.bridge_address()?;
        Ok(Self {
            chain,
            bridge,
            from_block,
            client,
        })
    }
}

/// Result of scanning one chain in one round.
#[derive(Debug)]
pub struct ChainScan {
    pub chain_id: String,
    pub chain_name: String,
    pub from_block: u64,
    pub ledger: ProposalLedger,
}

impl ChainScan {
    pub fn has_pending(&self) -> bool {
        self.ledger.has_pending()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AllClear {
    pub rounds: u64,
}

/// Fetch the bridge's logs from the configured start block and fold them into
/// a fresh ledger.
pub async fn scan_chain<C: BridgeRpc>(watched: &WatchedChain<'_, C>) -> Result<ChainScan> {
    let chain = watched.chain;
    let mut logs = watched
        .client
        .fetch_logs(watched.bridge, watched.from_block)
        .await
        .with_context(|| format!("failed to fetch bridge logs for chain {}", chain.name))?;
    logs.sort_by_key(|log| (log.block_number, log.log_index));

    let mut ledger = ProposalLedger::new();
    for log in &logs {
        let event = decode_proposal_log(log)
            .with_context(|| format!("failed to decode bridge logs for chain {}", chain.name))?;
        if let Some(event) = event {
            ledger.apply(&event);
        }
    }

    tracing::debug!(
        chain = %chain.name,
        from_block = watched.from_block,
        logs = logs.len(),
        pending = ledger.len(),
        "scanned bridge logs"
    );

    Ok(ChainScan {
        chain_id: chain.id.clone(),
        chain_name: chain.name.clone(),
        from_block: watched.from_block,
        ledger,
    })
}

/// Polls every chain until a round finds no pending proposal anywhere.
///
/// Each round rescans from the configured start blocks and recomputes every
/// chain's flag from scratch. A provider that lags behind the chain head can
/// therefore report a chain as clear while a proposal is still open on it.
pub struct QuiescencePoller<'a, C, B> {
    chains: Vec<WatchedChain<'a, C>>,
    backoff: B,
    interval: Duration,
}

impl<'a, C: BridgeRpc, B: Backoff> QuiescencePoller<'a, C, B> {
    pub fn new(chains: Vec<WatchedChain<'a, C>>, backoff: B, interval: Duration) -> Self {
        Self {
            chains,
            backoff,
            interval,
        }
    }

    pub fn chains(&self) -> &[WatchedChain<'a, C>] {
        &self.chains
    }

    /// Scan every chain once, in configuration order. Stops at the first error.
    pub async fn scan_round<F>(&self, mut on_scan: F) -> Result<bool>
    where
        F: FnMut(&ChainScan),
    {
        let mut any_pending = false;
        for watched in &self.chains {
            let scan = scan_chain(watched).await?;
            on_scan(&scan);
            any_pending |= scan.has_pending();
        }
        Ok(any_pending)
    }

    /// Run rounds until all chains are clear. `on_scan` sees every chain scan.
    pub async fn run<F>(&mut self, mut on_scan: F) -> Result<AllClear>
    where
        F: FnMut(u64, &ChainScan),
    {
        let mut round = 0u64;
        loop {
            round += 1;
            tracing::info!(round, chains = self.chains.len(), "checking for pending proposals");

            let any_pending = self.scan_round(|scan| on_scan(round, scan)).await?;
            if !any_pending {
                tracing::info!(round, "no pending proposals on any chain");
                return Ok(AllClear { rounds: round });
            }

            tracing::info!(
                round,
                wait_secs = self.interval.as_secs(),
                "pending proposals remain, waiting before next round"
            );
            self.backoff.wait(self.interval).await?;
        }
    }
}

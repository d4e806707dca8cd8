use crate::abi::encode_pause_transfers_call;
use crate::cli::StopBridgeArgs;
use crate::config::Config;
use crate::dispatch::dispatch;
use crate::poller::{QuiescencePoller, TokioBackoff, WatchedChain};
use crate::report::{print_chain_scan, DispatchSummary};
use crate::rpc::{BridgeRpc, RpcClient};
use crate::signer::load_chain_signer;
use crate::types::format_hex;
use anyhow::Result;
use std::time::Duration;

pub async fn run(args: StopBridgeArgs, config: Config) -> Result<()> {
    let interval = args
        .poll_interval_secs
        .map(Duration::from_secs)
        .unwrap_or_else(|| config.poll_interval());
    if interval.is_zero() {
        anyhow::bail!("--poll-interval-secs must be greater than zero");
    }

    let mut watched = Vec::new();
    for chain in config.ethereum_chains() {
        let client = RpcClient::new(&chain.endpoint).await?;
        watched.push(WatchedChain::new(&config, chain, client)?);
    }

    let mut poller = QuiescencePoller::new(watched, TokioBackoff, interval);
    let outcome = poller
        .run(|round, scan| {
            println!("round {round}:");
            print_chain_scan(scan);
        })
        .await?;
    println!("no pending proposals after {} round(s)", outcome.rounds);

    if !(args.auto_pause || config.auto_pause_bridge) {
        tracing::info!("auto pause disabled, leaving bridges running");
        return Ok(());
    }

    let summary = pause_chains(&config, poller.chains(), args.dry_run).await;
    println!("pause {summary}");
    for tx_hash in &summary.submitted {
        println!("  {tx_hash}");
    }
    if summary.failed > 0 {
        anyhow::bail!("failed to pause {} chain(s)", summary.failed);
    }
    Ok(())
}

/// Submit `adminPauseTransfers()` to every watched bridge.
///
/// A chain without an admin key is skipped and the remaining chains still get
/// their pause transaction.
pub async fn pause_chains<C: BridgeRpc>(
    config: &Config,
    chains: &[WatchedChain<'_, C>],
    dry_run: bool,
) -> DispatchSummary {
    let calldata = encode_pause_transfers_call();
    let mut summary = DispatchSummary::default();

    for watched in chains {
        let chain = watched.chain;
        if dry_run {
            println!(
                "chain {} ({}): to {:#x} data {}",
                chain.name,
                chain.id,
                watched.bridge,
                format_hex(&calldata)
            );
            summary.record_skipped();
            continue;
        }

        let signer = match load_chain_signer(config, chain) {
            Ok(Some(signer)) => signer,
            Ok(None) => {
                tracing::warn!(chain = %chain.name, "no admin key configured, skipping pause");
                summary.record_skipped();
                continue;
            }
            Err(err) => {
                tracing::error!(chain = %chain.name, error = %format!("{err:#}"), "unable to load admin key");
                summary.record_failed();
                continue;
            }
        };

        match dispatch(&watched.client, chain, &signer, calldata.clone()).await {
            Ok(tx_hash) => {
                tracing::info!(chain = %chain.name, tx_hash = %tx_hash, "pause submitted");
                summary.record_submitted(format!("{tx_hash:#x}"));
            }
            Err(err) => {
                tracing::error!(chain = %chain.name, error = %format!("{err:#}"), "pause failed");
                summary.record_failed();
            }
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ChainConfig;
    use crate::rpc::mock::MockChain;

    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn chain(id: &str) -> ChainConfig {
        let mut chain = ChainConfig {
            id: id.to_string(),
            name: format!("chain-{id}"),
            chain_type: "ethereum".to_string(),
            endpoint: "http://localhost:8545".to_string(),
            ..Default::default()
        };
        chain.opts.insert(
            "bridge".to_string(),
            "0x62877dDCd49aD22f5eDfc6ac108e9a4b5D2bD88B".to_string(),
        );
        chain
    }

    fn config_with_keys(ids: &[&str]) -> Config {
        let mut config = Config::default();
        config.signer = Some(crate::config::SignerConfig {
            private_key_env: Some("BRIDGE_ADMIN_PAUSE_TEST_UNSET".to_string()),
        });
        for id in ids {
            config.private_keys.insert(id.to_string(), DEV_KEY.to_string());
        }
        config
    }

    #[tokio::test]
    async fn missing_key_skips_only_that_chain() {
        let (a, b) = (chain("0"), chain("1"));
        let config = config_with_keys(&["1"]);
        let watched = vec![
            WatchedChain::new(&config, &a, MockChain::new(5)).unwrap(),
            WatchedChain::new(&config, &b, MockChain::new(6)).unwrap(),
        ];

        let summary = pause_chains(&config, &watched, false).await;

        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.submitted.len(), 1);
        assert!(watched[0].client.sent.borrow().is_empty());
        let sent = watched[1].client.sent.borrow();
        assert_eq!(sent.len(), 1);
    }

    #[tokio::test]
    async fn failed_submission_does_not_stop_other_chains() {
        let (a, b) = (chain("0"), chain("1"));
        let config = config_with_keys(&["0", "1"]);
        let mut failing = MockChain::new(5);
        failing.fail_send = true;
        let watched = vec![
            WatchedChain::new(&config, &a, failing).unwrap(),
            WatchedChain::new(&config, &b, MockChain::new(6)).unwrap(),
        ];

        let summary = pause_chains(&config, &watched, false).await;
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.submitted.len(), 1);
    }

    #[tokio::test]
    async fn dry_run_sends_nothing() {
        let a = chain("0");
        let config = config_with_keys(&["0"]);
        let watched = vec![WatchedChain::new(&config, &a, MockChain::new(5)).unwrap()];

        let summary = pause_chains(&config, &watched, true).await;
        assert_eq!(summary.skipped, 1);
        assert!(watched[0].client.sent.borrow().is_empty());
    }
}

use crate::cli::PendingArgs;
use crate::config::Config;
use crate::poller::{scan_chain, WatchedChain};
use crate::report::{render_chain_scan, ChainScanView};
use crate::rpc::{BridgeRpc, RpcClient};
use anyhow::Result;

pub async fn run(args: PendingArgs, config: Config) -> Result<()> {
    let mut watched = Vec::new();
    for chain in config.ethereum_chains() {
        let client = RpcClient::new(&chain.endpoint).await?;
        watched.push(WatchedChain::new(&config, chain, client)?);
    }

    let views = scan_all(&watched).await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&views)?);
        return Ok(());
    }
    for view in &views {
        print!("{}", render_chain_scan(view));
    }
    Ok(())
}

/// One scan of every chain, without waiting for anything to settle.
pub async fn scan_all<C: BridgeRpc>(chains: &[WatchedChain<'_, C>]) -> Result<Vec<ChainScanView>> {
    let mut views = Vec::with_capacity(chains.len());
    for watched in chains {
        let scan = scan_chain(watched).await?;
        views.push(ChainScanView::from(&scan));
    }
    Ok(views)
}

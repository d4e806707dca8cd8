use crate::cli::TransferTokensArgs;
use crate::config::{ChainConfig, Config, TokenConfig};
use crate::dispatch::dispatch;
use crate::encode::encode_withdraw_calldata;
use crate::report::DispatchSummary;
use crate::rpc::{BridgeRpc, RpcClient};
use crate::signer::load_chain_signer;
use crate::types::format_hex;
use anyhow::{Context, Result};
use std::future::Future;

pub async fn run(args: TransferTokensArgs, config: Config) -> Result<()> {
    let summary = transfer_all(&config, &args, |endpoint| async move {
        RpcClient::new(&endpoint).await
    })
    .await?;

    println!("total {summary}");
    for tx_hash in &summary.submitted {
        println!("  {tx_hash}");
    }
    if summary.failed > 0 {
        anyhow::bail!("{} withdrawal(s) failed", summary.failed);
    }
    Ok(())
}

/// Run the configured withdrawals chain by chain.
///
/// A chain whose endpoint cannot be reached counts all of its requests as
/// failed; later chains are still processed.
pub async fn transfer_all<C, F, Fut>(
    config: &Config,
    args: &TransferTokensArgs,
    connect: F,
) -> Result<DispatchSummary>
where
    C: BridgeRpc,
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<C>>,
{
    let tokens = config.tokens.as_ref().context("tokens mapping not defined")?;
    if let Some(id) = args.chain.as_deref() {
        if config.chain(id).is_none() {
            anyhow::bail!("unknown chain id {id}");
        }
    }

    let mut summary = DispatchSummary::default();
    for chain in config.ethereum_chains() {
        if args.chain.as_deref().is_some_and(|id| id != chain.id) {
            continue;
        }
        let Some(requests) = tokens.get(&chain.id).filter(|requests| !requests.is_empty()) else {
            tracing::info!(chain = %chain.name, "no withdrawals configured");
            continue;
        };

        let client = match connect(chain.endpoint.clone()).await {
            Ok(client) => client,
            Err(err) => {
                tracing::error!(
                    chain = %chain.name,
                    requests = requests.len(),
                    error = %format!("{err:#}"),
                    "unable to connect, skipping withdrawals"
                );
                println!("chain {} ({}): unable to connect", chain.name, chain.id);
                summary.failed += requests.len();
                continue;
            }
        };
        let chain_summary = withdraw_chain(config, chain, &client, requests, args.dry_run).await;
        println!("chain {} ({}): {chain_summary}", chain.name, chain.id);
        summary.merge(chain_summary);
    }
    Ok(summary)
}

/// Submit every configured withdrawal for one chain, in order.
///
/// A request that fails to encode or submit is counted and the next one is
/// still attempted. Without an admin key the whole batch is skipped.
pub async fn withdraw_chain<C: BridgeRpc>(
    config: &Config,
    chain: &ChainConfig,
    client: &C,
    requests: &[TokenConfig],
    dry_run: bool,
) -> DispatchSummary {
    let mut summary = DispatchSummary::default();

    let signer = if dry_run {
        None
    } else {
        match load_chain_signer(config, chain) {
            Ok(Some(signer)) => Some(signer),
            Ok(None) => {
                tracing::warn!(
                    chain = %chain.name,
                    requests = requests.len(),
                    "no admin key configured, skipping withdrawals"
                );
                summary.skipped += requests.len();
                return summary;
            }
            Err(err) => {
                tracing::error!(chain = %chain.name, error = %format!("{err:#}"), "unable to load admin key");
                summary.failed += requests.len();
                return summary;
            }
        }
    };

    for (index, request) in requests.iter().enumerate() {
        let calldata = match encode_withdraw_calldata(request) {
            Ok(calldata) => calldata,
            Err(err) => {
                tracing::error!(
                    chain = %chain.name,
                    index,
                    kind = %request.kind,
                    error = %err,
                    "unable to encode withdrawal"
                );
                summary.record_failed();
                continue;
            }
        };

        tracing::info!(
            chain = %chain.name,
            index,
            kind = %request.kind,
            token = %request.token_address,
            recipient = %request.recipient,
            amount_or_token_id = %request.amount_or_token_id,
            "withdrawing tokens"
        );

        let Some(signer) = signer.as_ref() else {
            println!("chain {} [{index}] {}: data {}", chain.name, request.kind, format_hex(&calldata));
            summary.record_skipped();
            continue;
        };

        match dispatch(client, chain, signer, calldata).await {
            Ok(tx_hash) => summary.record_submitted(format!("{tx_hash:#x}")),
            Err(err) => {
                tracing::error!(chain = %chain.name, index, error = %format!("{err:#}"), "withdrawal failed");
                summary.record_failed();
            }
        }
    }

    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{AmountOrTokenIds, SignerConfig, TokenKind};
    use crate::rpc::mock::MockChain;

    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn chain() -> ChainConfig {
        let mut chain = ChainConfig {
            id: "0".to_string(),
            name: "goerli".to_string(),
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

    fn config(with_key: bool) -> Config {
        let mut config = Config::default();
        config.signer = Some(SignerConfig {
            private_key_env: Some("BRIDGE_ADMIN_WITHDRAW_TEST_UNSET".to_string()),
        });
        if with_key {
            config.private_keys.insert("0".to_string(), DEV_KEY.to_string());
        }
        config
    }

    fn erc20(amount: &str) -> TokenConfig {
        TokenConfig {
            kind: TokenKind::Erc20,
            handler_address: "0x3167776db165D8eA0f51790CA2bbf44Db5105ADF".to_string(),
            token_address: "0x21605f71845f372A9ed84253d2D024B7B10999f4".to_string(),
            recipient: "0x8e0a907331554AF72563Bd8D43051C2E64Be5d35".to_string(),
            amount_or_token_id: AmountOrTokenIds::One(amount.to_string()),
            amounts: Vec::new(),
        }
    }

    #[tokio::test]
    async fn bad_entry_is_skipped_and_later_entries_submitted() {
        let client = MockChain::new(5);
        let requests = vec![erc20("100"), erc20("12abc"), erc20("300")];

        let summary = withdraw_chain(&config(true), &chain(), &client, &requests, false).await;

        assert_eq!(summary.failed, 1);
        assert_eq!(summary.submitted.len(), 2);
        assert_eq!(client.sent.borrow().len(), 2);
    }

    #[tokio::test]
    async fn missing_key_skips_whole_batch() {
        let client = MockChain::new(5);
        let requests = vec![erc20("1"), erc20("2")];

        let summary = withdraw_chain(&config(false), &chain(), &client, &requests, false).await;

        assert_eq!(summary.skipped, 2);
        assert!(summary.submitted.is_empty());
        assert!(client.sent.borrow().is_empty());
    }

    #[tokio::test]
    async fn dry_run_needs_no_key() {
        let client = MockChain::new(5);
        let requests = vec![erc20("1")];

        let summary = withdraw_chain(&config(false), &chain(), &client, &requests, true).await;

        assert_eq!(summary.skipped, 1);
        assert_eq!(summary.failed, 0);
        assert!(client.sent.borrow().is_empty());
    }

    #[tokio::test]
    async fn submission_failure_moves_to_next_request() {
        let mut client = MockChain::new(5);
        client.fail_send = true;
        let requests = vec![erc20("1"), erc20("2")];

        let summary = withdraw_chain(&config(true), &chain(), &client, &requests, false).await;
        assert_eq!(summary.failed, 2);
    }

    #[tokio::test]
    async fn unreachable_chain_does_not_stop_later_chains() {
        let mut config = config(true);
        config.private_keys.insert("1".to_string(), DEV_KEY.to_string());
        let mut broken = chain();
        broken.endpoint = "http://unreachable.invalid".to_string();
        let mut second = chain();
        second.id = "1".to_string();
        second.name = "sepolia".to_string();
        config.chains = vec![broken, second];
        config.tokens = Some(
            [
                ("0".to_string(), vec![erc20("1"), erc20("2")]),
                ("1".to_string(), vec![erc20("3")]),
            ]
            .into_iter()
            .collect(),
        );
        let args = TransferTokensArgs {
            dry_run: false,
            chain: None,
        };

        let summary = transfer_all(&config, &args, |endpoint| async move {
            if endpoint.contains("unreachable") {
                anyhow::bail!("connection refused");
            }
            Ok(MockChain::new(11155111))
        })
        .await
        .unwrap();

        assert_eq!(summary.failed, 2);
        assert_eq!(summary.submitted.len(), 1);
    }

    #[tokio::test]
    async fn missing_tokens_mapping_is_an_error() {
        let mut config = config(true);
        config.chains.push(chain());
        let args = TransferTokensArgs {
            dry_run: true,
            chain: None,
        };
        let err = run(args, config).await.unwrap_err();
        assert_eq!(err.to_string(), "tokens mapping not defined");
    }
}

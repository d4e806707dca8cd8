use alloy_primitives::{Address, Bytes, B256};
use alloy_provider::{Provider, RootProvider};
use alloy_rpc_types::{Filter, Log};
use anyhow::{Context, Result};
use std::future::Future;

/// EIP-1559 fee caps suggested by the node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FeeParams {
    pub max_fee_per_gas: u128,
    pub max_priority_fee_per_gas: u128,
}

/// The chain operations the admin flows need from an RPC endpoint.
pub trait BridgeRpc {
    /// Logs emitted by `bridge` from `from_block` up to the chain head.
    fn fetch_logs(&self, bridge: Address, from_block: u64) -> impl Future<Output = Result<Vec<Log>>>;

    fn pending_nonce(&self, account: Address) -> impl Future<Output = Result<u64>>;

    fn fee_params(&self) -> impl Future<Output = Result<FeeParams>>;

    fn chain_id(&self) -> impl Future<Output = Result<u64>>;

    fn send_raw_transaction(&self, raw_tx: Bytes) -> impl Future<Output = Result<B256>>;
}

#[derive(Clone)]
pub struct RpcClient {
    pub url: String,
    pub provider: RootProvider,
}

pub const SUPPORTED_SCHEMES: [&str; 4] = ["http", "https", "ws", "wss"];

impl RpcClient {
    /// Connect to `url`, picking the HTTP or websocket transport by scheme.
    pub async fn new(url: &str) -> Result<Self> {
        let parsed: url::Url = url
            .parse()
            .with_context(|| format!("invalid rpc url {}", redact_url(url)))?;
        if !SUPPORTED_SCHEMES.contains(&parsed.scheme()) {
            anyhow::bail!(
                "unsupported rpc url scheme {} in {}",
                parsed.scheme(),
                redact_url(url)
            );
        }
        let provider = RootProvider::connect(parsed.as_str())
            .await
            .with_context(|| format!("failed to connect to {}", redact_url(url)))?;
        Ok(Self {
            url: url.to_string(),
            provider,
        })
    }
}

impl BridgeRpc for RpcClient {
    async fn fetch_logs(&self, bridge: Address, from_block: u64) -> Result<Vec<Log>> {
        let filter = Filter::new().address(bridge).from_block(from_block);
        tracing::debug!(rpc = %redact_url(&self.url), bridge = %bridge, from_block, "eth_getLogs");
        self.provider
            .get_logs(&filter)
            .await
            .context("eth_getLogs failed")
    }

    async fn pending_nonce(&self, account: Address) -> Result<u64> {
        self.provider
            .get_transaction_count(account)
            .pending()
            .await
            .context("failed to fetch pending nonce")
    }

    async fn fee_params(&self) -> Result<FeeParams> {
        let max_fee_per_gas = self
            .provider
            .get_gas_price()
            .await
            .context("failed to fetch gas price")?;
        let max_priority_fee_per_gas = self
            .provider
            .get_max_priority_fee_per_gas()
            .await
            .context("failed to fetch priority fee")?;
        Ok(FeeParams {
            max_fee_per_gas,
            max_priority_fee_per_gas,
        })
    }

    async fn chain_id(&self) -> Result<u64> {
        self.provider
            .get_chain_id()
            .await
            .context("failed to fetch eth_chainId")
    }

    async fn send_raw_transaction(&self, raw_tx: Bytes) -> Result<B256> {
        let pending = self
            .provider
            .send_raw_transaction(&raw_tx)
            .await
            .context("eth_sendRawTransaction failed")?;
        Ok(*pending.tx_hash())
    }
}

/// Redact credentials from a URL string for display.
pub fn redact_url(value: &str) -> String {
    match url::Url::parse(value) {
        Ok(mut parsed) => {
            let has_user = !parsed.username().is_empty();
            let has_password = parsed.password().is_some();
            if has_user {
                let _ = parsed.set_username("REDACTED");
            }
            if has_password {
                let _ = parsed.set_password(Some("REDACTED"));
            }
            parsed.to_string()
        }
        Err(_) => value.to_string(),
    }
}

use crate::rpc::{redact_url, SUPPORTED_SCHEMES};
use crate::types::{parse_address, parse_block_number};
use alloy_primitives::Address;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_POLL_INTERVAL_SECS: u64 = 60;
pub const DEFAULT_STARTING_BLOCK: u64 = 0;
pub const DEFAULT_SIGNER_ENV: &str = "BRIDGE_ADMIN_KEY";
pub const ETHEREUM_CHAIN_TYPE: &str = "ethereum";
pub const BRIDGE_OPT: &str = "bridge";

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// ChainBridge relayer configuration (JSON) to read chains from.
    pub bridge_config: Option<PathBuf>,
    #[serde(default)]
    pub chains: Vec<ChainConfig>,
    #[serde(default)]
    pub private_keys: BTreeMap<String, String>,
    #[serde(default)]
    pub starting_blocks: BTreeMap<String, String>,
    pub tokens: Option<BTreeMap<String, Vec<TokenConfig>>>,
    #[serde(default)]
    pub auto_pause_bridge: bool,
    #[serde(default = "default_poll_interval_secs")]
    pub poll_interval_secs: u64,
    pub signer: Option<SignerConfig>,
    #[serde(skip)]
    pub path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bridge_config: None,
            chains: Vec::new(),
            private_keys: BTreeMap::new(),
            starting_blocks: BTreeMap::new(),
            tokens: None,
            auto_pause_bridge: false,
            poll_interval_secs: DEFAULT_POLL_INTERVAL_SECS,
            signer: None,
            path: PathBuf::new(),
        }
    }
}

/// One bridge chain, in the shape used by ChainBridge relayer configs.
#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct ChainConfig {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default = "default_chain_type")]
    pub chain_type: String,
    pub endpoint: String,
    #[serde(default)]
    pub from: String,
    #[serde(default)]
    pub opts: BTreeMap<String, String>,
}

/// ChainBridge relayer configuration file.
#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct RelayerConfig {
    pub chains: Vec<ChainConfig>,
    #[serde(rename = "keystorePath", default)]
    pub keystore_path: Option<String>,
}

#[derive(Debug, Default, Deserialize, Serialize, Clone)]
pub struct SignerConfig {
    pub private_key_env: Option<String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Erc20,
    Erc721,
    Erc1155,
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Erc20 => "ERC20",
            Self::Erc721 => "ERC721",
            Self::Erc1155 => "ERC1155",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum AmountOrTokenIds {
    One(String),
    Many(Vec<String>),
}

impl AmountOrTokenIds {
    pub fn values(&self) -> &[String] {
        match self {
            Self::One(value) => std::slice::from_ref(value),
            Self::Many(values) => values,
        }
    }
}

impl fmt::Display for AmountOrTokenIds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.values().join(","))
    }
}

/// A single admin withdrawal to perform on a chain.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct TokenConfig {
    #[serde(rename = "type")]
    pub kind: TokenKind,
    pub handler_address: String,
    pub token_address: String,
    pub recipient: String,
    pub amount_or_token_id: AmountOrTokenIds,
    /// Per-id amounts, erc1155 only.
    #[serde(default)]
    pub amounts: Vec<String>,
}

impl Config {
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => default_config_path(),
        };

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let mut config: Config = toml::from_str(&contents)
            .with_context(|| format!("failed to parse config {}", path.display()))?;
        config.path = path;

        if let Some(relayer_path) = config.bridge_config.clone() {
            let relayer_path = config.resolve_relative(&relayer_path);
            tracing::info!(path = %relayer_path.display(), "loading bridge relayer config");
            let relayer = load_relayer_config(&relayer_path)?;
            config.apply_relayer_config(relayer)?;
        }

        config.validate()?;
        Ok(config)
    }

    pub fn apply_relayer_config(&mut self, relayer: RelayerConfig) -> Result<()> {
        if !self.chains.is_empty() {
            anyhow::bail!("cannot set both bridge_config and inline [[chains]]");
        }
        self.chains = relayer.chains;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.chains.is_empty() {
            anyhow::bail!("no chains configured (set bridge_config or add [[chains]])");
        }
        let mut seen = BTreeSet::new();
        for chain in &self.chains {
            if chain.id.is_empty() {
                anyhow::bail!("required field chain.id empty for chain {}", chain.name);
            }
            if chain.name.is_empty() {
                anyhow::bail!("required field chain.name empty for chain {}", chain.id);
            }
            if chain.chain_type.is_empty() {
                anyhow::bail!("required field chain.type empty for chain {}", chain.id);
            }
            if chain.endpoint.is_empty() {
                anyhow::bail!("required field chain.endpoint empty for chain {}", chain.id);
            }
            if chain.is_ethereum() {
                validate_endpoint(chain)?;
            }
            if !seen.insert(chain.id.as_str()) {
                anyhow::bail!("duplicate chain id {}", chain.id);
            }
        }
        if self.poll_interval_secs == 0 {
            anyhow::bail!("poll_interval_secs must be greater than zero");
        }
        Ok(())
    }

    /// Chains the tool can act on, in configuration order.
    pub fn ethereum_chains(&self) -> Vec<&ChainConfig> {
        self.chains
            .iter()
            .filter(|chain| {
                let supported = chain.is_ethereum();
                if !supported {
                    tracing::warn!(
                        chain = %chain.name,
                        chain_type = %chain.chain_type,
                        "skipping chain with unsupported type"
                    );
                }
                supported
            })
            .collect()
    }

    pub fn chain(&self, id: &str) -> Option<&ChainConfig> {
        self.chains.iter().find(|chain| chain.id == id)
    }

    pub fn starting_block(&self, chain_id: &str) -> Result<u64> {
        match self.starting_blocks.get(chain_id).map(|value| value.trim()) {
            None | Some("") => Ok(DEFAULT_STARTING_BLOCK),
            Some(value) => parse_block_number(value)
                .with_context(|| format!("unable to parse starting block for chain {chain_id}")),
        }
    }

    pub fn tokens_for(&self, chain_id: &str) -> Option<&[TokenConfig]> {
        self.tokens.as_ref()?.get(chain_id).map(Vec::as_slice)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll_interval_secs)
    }

    pub fn signer_env(&self) -> String {
        self.signer
            .as_ref()
            .and_then(|cfg| cfg.private_key_env.clone())
            .unwrap_or_else(|| DEFAULT_SIGNER_ENV.to_string())
    }

    fn resolve_relative(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            return path.to_path_buf();
        }
        match self.path.parent() {
            Some(dir) => dir.join(path),
            None => path.to_path_buf(),
        }
    }
}

impl ChainConfig {
    pub fn is_ethereum(&self) -> bool {
        self.chain_type.eq_ignore_ascii_case(ETHEREUM_CHAIN_TYPE)
    }

    pub fn bridge_address(&self) -> Result<Address> {
        let value = self
            .opts
            .get(BRIDGE_OPT)
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
            .ok_or_else(|| anyhow::anyhow!("bridge address not defined for chain {}", self.name))?;
        parse_address(value).with_context(|| format!("invalid bridge address for chain {}", self.name))
    }

    /// Expected admin address, if the relayer config names one.
    pub fn from_address(&self) -> Result<Option<Address>> {
        if self.from.trim().is_empty() {
            return Ok(None);
        }
        parse_address(&self.from).map(Some)
    }
}

pub fn load_relayer_config(path: &Path) -> Result<RelayerConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read bridge config {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("failed to parse bridge config {}", path.display()))
}

fn validate_endpoint(chain: &ChainConfig) -> Result<()> {
    let url = url::Url::parse(chain.endpoint.trim()).with_context(|| {
        format!(
            "invalid endpoint {} for chain {}",
            redact_url(&chain.endpoint),
            chain.name
        )
    })?;
    if !SUPPORTED_SCHEMES.contains(&url.scheme()) {
        anyhow::bail!(
            "unsupported endpoint scheme {} for chain {} (expected http, https, ws or wss)",
            url.scheme(),
            chain.name
        );
    }
    Ok(())
}

fn default_poll_interval_secs() -> u64 {
    DEFAULT_POLL_INTERVAL_SECS
}

fn default_chain_type() -> String {
    ETHEREUM_CHAIN_TYPE.to_string()
}

fn default_config_path() -> PathBuf {
    if let Some(dir) = dirs::config_dir() {
        return dir.join("bridge-admin").join("config.toml");
    }
    PathBuf::from("./config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
auto_pause_bridge = true

[[chains]]
id = "0"
name = "goerli"
type = "ethereum"
endpoint = "http://localhost:8545"
opts = { bridge = "0x62877dDCd49aD22f5eDfc6ac108e9a4b5D2bD88B" }

[[chains]]
id = "1"
name = "rococo"
type = "substrate"
endpoint = "ws://localhost:9944"

[starting_blocks]
"0" = "1200"
"1" = "twelve"

[[tokens."0"]]
type = "erc20"
handler_address = "0x3167776db165D8eA0f51790CA2bbf44Db5105ADF"
token_address = "0x21605f71845f372A9ed84253d2D024B7B10999f4"
recipient = "0x8e0a907331554AF72563Bd8D43051C2E64Be5d35"
amount_or_token_id = "1000"

[[tokens."0"]]
type = "erc1155"
handler_address = "0x3167776db165D8eA0f51790CA2bbf44Db5105ADF"
token_address = "0x21605f71845f372A9ed84253d2D024B7B10999f4"
recipient = "0x8e0a907331554AF72563Bd8D43051C2E64Be5d35"
amount_or_token_id = ["1", "2"]
amounts = ["10", "20"]
"#;

    fn sample() -> Config {
        let config: Config = toml::from_str(SAMPLE).unwrap();
        config.validate().unwrap();
        config
    }

    #[test]
    fn parses_sample_config() {
        let config = sample();

        assert!(config.auto_pause_bridge);
        assert_eq!(config.poll_interval(), Duration::from_secs(60));
        assert_eq!(config.chains.len(), 2);
        assert_eq!(config.ethereum_chains().len(), 1);
        assert_eq!(config.signer_env(), DEFAULT_SIGNER_ENV);

        let tokens = config.tokens_for("0").expect("tokens for chain 0");
        assert_eq!(tokens.len(), 2);
        assert_eq!(tokens[0].kind, TokenKind::Erc20);
        assert_eq!(tokens[0].amount_or_token_id.values(), ["1000".to_string()]);
        assert_eq!(tokens[1].kind, TokenKind::Erc1155);
        assert_eq!(tokens[1].amount_or_token_id.to_string(), "1,2");
        assert!(config.tokens_for("1").is_none());
    }

    #[test]
    fn starting_blocks_default_to_genesis() {
        let config = sample();
        assert_eq!(config.starting_block("0").unwrap(), 1200);
        assert_eq!(config.starting_block("7").unwrap(), DEFAULT_STARTING_BLOCK);

        let err = config.starting_block("1").unwrap_err();
        assert!(err.to_string().contains("unable to parse starting block for chain 1"));
    }

    #[test]
    fn bridge_address_is_required() {
        let config = sample();
        let goerli = config.chain("0").unwrap();
        assert!(goerli.bridge_address().is_ok());

        let rococo = config.chain("1").unwrap();
        let err = rococo.bridge_address().unwrap_err();
        assert!(err.to_string().contains("bridge address not defined"));
    }

    #[test]
    fn relayer_config_supplies_chains() {
        let relayer: RelayerConfig = serde_json::from_str(
            r#"{
                "chains": [
                    {
                        "name": "eth",
                        "type": "ethereum",
                        "id": "0",
                        "endpoint": "ws://localhost:8545",
                        "from": "0xff93B45308FD417dF303D6515aB04D9e89a750Ca",
                        "opts": { "bridge": "0x62877dDCd49aD22f5eDfc6ac108e9a4b5D2bD88B", "http": "true" }
                    }
                ],
                "keystorePath": "/keys"
            }"#,
        )
        .unwrap();

        let mut config = Config::default();
        config.apply_relayer_config(relayer).unwrap();
        config.validate().unwrap();

        let chain = config.chain("0").unwrap();
        assert!(chain.from_address().unwrap().is_some());
        assert!(chain.bridge_address().is_ok());

        let mut inline = sample();
        assert!(inline.apply_relayer_config(RelayerConfig::default()).is_err());
    }

    #[test]
    fn validation_reports_missing_fields() {
        let mut config = sample();
        config.chains[0].endpoint.clear();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("chain.endpoint empty for chain 0"));

        let mut config = sample();
        config.chains[1].id = "0".to_string();
        assert!(config.validate().is_err());

        assert!(Config::default().validate().is_err());
    }

    #[test]
    fn endpoints_need_a_supported_scheme() {
        let mut config = sample();
        config.chains[0].endpoint = "wss://goerli.example.org/ws".to_string();
        config.validate().unwrap();

        config.chains[0].endpoint = "ipc:///tmp/geth.ipc".to_string();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("unsupported endpoint scheme ipc for chain goerli"));

        config.chains[0].endpoint = "localhost:8545".to_string();
        assert!(config.validate().is_err());
    }
}

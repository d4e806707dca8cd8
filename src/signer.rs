use crate::config::{ChainConfig, Config};
use alloy_signer_local::PrivateKeySigner;
use anyhow::{anyhow, Result};

/// Resolve the admin key for a chain.
///
/// Looks at `private_keys[<chain id>]` first, then the `<signer_env>_<chain id>`
/// environment variable. Returns `Ok(None)` when neither is set.
pub fn load_chain_signer(config: &Config, chain: &ChainConfig) -> Result<Option<PrivateKeySigner>> {
    if let Some(key) = config
        .private_keys
        .get(&chain.id)
        .filter(|key| !key.trim().is_empty())
    {
        return load_wallet(key, chain).map(Some);
    }

    let env = format!("{}_{}", config.signer_env(), chain.id);
    match std::env::var(&env) {
        Ok(key) if !key.trim().is_empty() => load_wallet(&key, chain).map(Some),
        _ => Ok(None),
    }
}

fn load_wallet(key: &str, chain: &ChainConfig) -> Result<PrivateKeySigner> {
    let pk_signer: PrivateKeySigner = key
        .trim()
        .parse()
        .map_err(|err| anyhow!("invalid private key for chain {}: {err}", chain.name))?;

    if let Ok(Some(expected)) = chain.from_address() {
        if expected != pk_signer.address() {
            tracing::warn!(
                chain = %chain.name,
                expected = %expected,
                actual = %pk_signer.address(),
                "admin key does not match the chain's configured from address"
            );
        }
    }
    Ok(pk_signer)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Anvil's first development key.
    const DEV_KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn chain(id: &str) -> ChainConfig {
        ChainConfig {
            id: id.to_string(),
            name: format!("chain-{id}"),
            chain_type: "ethereum".to_string(),
            endpoint: "http://localhost:8545".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn loads_key_from_config() {
        let mut config = Config::default();
        config
            .private_keys
            .insert("5".to_string(), DEV_KEY.to_string());

        let signer = load_chain_signer(&config, &chain("5")).unwrap().unwrap();
        assert_eq!(
            format!("{:#x}", signer.address()),
            "0xf39fd6e51aad88f6f4ce6ab8827279cfffb92266"
        );
    }

    #[test]
    fn missing_key_is_none() {
        let mut config = Config::default();
        config.signer = Some(crate::config::SignerConfig {
            private_key_env: Some("BRIDGE_ADMIN_TEST_UNSET".to_string()),
        });
        assert!(load_chain_signer(&config, &chain("42")).unwrap().is_none());
    }

    #[test]
    fn malformed_key_is_an_error() {
        let mut config = Config::default();
        config
            .private_keys
            .insert("1".to_string(), "0x1234".to_string());
        assert!(load_chain_signer(&config, &chain("1")).is_err());
    }
}

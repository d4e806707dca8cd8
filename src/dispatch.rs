use crate::config::ChainConfig;
use crate::rpc::{BridgeRpc, FeeParams};
use alloy_consensus::{SignableTransaction, TxEip1559, TxEnvelope};
use alloy_eips::eip2718::Encodable2718;
use alloy_primitives::{Address, Bytes, TxKind, B256, U256};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use anyhow::{Context, Result};

pub const ADMIN_GAS_LIMIT: u64 = 2_100_000;

/// Sign and broadcast one admin call to the chain's bridge contract.
///
/// Exactly one transaction is broadcast on success. Failures are returned to
/// the caller, which decides whether to move on; nothing is retried here.
pub async fn dispatch<C: BridgeRpc>(
    client: &C,
    chain: &ChainConfig,
    signer: &PrivateKeySigner,
    calldata: Bytes,
) -> Result<B256> {
    let from = signer.address();
    let nonce = client.pending_nonce(from).await?;
    let fees = client.fee_params().await?;
    let bridge = chain.bridge_address()?;
    let chain_id = client.chain_id().await?;

    let tx = build_admin_transaction(chain_id, nonce, fees, bridge, calldata);
    let raw_tx = sign_transaction(tx, signer)?;

    tracing::debug!(
        chain = %chain.name,
        from = %from,
        to = %bridge,
        nonce,
        chain_id,
        max_fee_per_gas = fees.max_fee_per_gas,
        max_priority_fee_per_gas = fees.max_priority_fee_per_gas,
        "submitting admin transaction"
    );

    let tx_hash = client
        .send_raw_transaction(raw_tx)
        .await
        .with_context(|| format!("failed to submit transaction on chain {}", chain.name))?;
    tracing::info!(chain = %chain.name, tx_hash = %tx_hash, "admin transaction submitted");
    Ok(tx_hash)
}

pub fn build_admin_transaction(
    chain_id: u64,
    nonce: u64,
    fees: FeeParams,
    bridge: Address,
    calldata: Bytes,
) -> TxEip1559 {
    TxEip1559 {
        chain_id,
        nonce,
        gas_limit: ADMIN_GAS_LIMIT,
        // A fee cap below the tip is rejected by nodes.
        max_fee_per_gas: fees.max_fee_per_gas.max(fees.max_priority_fee_per_gas),
        max_priority_fee_per_gas: fees.max_priority_fee_per_gas,
        to: TxKind::Call(bridge),
        value: U256::ZERO,
        input: calldata,
        ..Default::default()
    }
}

/// Sign with the EIP-155 chain id embedded in the transaction and return the
/// EIP-2718 encoding ready for `eth_sendRawTransaction`.
pub fn sign_transaction(tx: TxEip1559, signer: &PrivateKeySigner) -> Result<Bytes> {
    let signature = signer
        .sign_hash_sync(&tx.signature_hash())
        .context("failed to sign transaction")?;
    let envelope = TxEnvelope::from(tx.into_signed(signature));
    Ok(Bytes::from(envelope.encoded_2718()))
}

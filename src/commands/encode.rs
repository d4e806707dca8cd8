use crate::abi::encode_pause_transfers_call;
use crate::cli::{EncodePauseArgs, EncodeWithdrawArgs};
use crate::config::Config;
use crate::encode::encode_withdraw_calldata;
use crate::types::format_hex;
use anyhow::{Context, Result};
use serde::Serialize;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CalldataOutput {
    chain_id: Option<String>,
    to: Option<String>,
    description: String,
    data: Option<String>,
    error: Option<String>,
}

pub fn run_pause(args: EncodePauseArgs) -> Result<()> {
    let output = CalldataOutput {
        chain_id: None,
        to: None,
        description: "adminPauseTransfers()".to_string(),
        data: Some(format_hex(&encode_pause_transfers_call())),
        error: None,
    };
    if args.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", output.data.as_deref().unwrap_or_default());
    }
    Ok(())
}

pub fn run_withdraw(args: EncodeWithdrawArgs, config: Config) -> Result<()> {
    let outputs = withdraw_outputs(&config, &args.chain)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&outputs)?);
    } else {
        for (index, output) in outputs.iter().enumerate() {
            println!("[{index}] {}", output.description);
            match (&output.data, &output.error) {
                (Some(data), _) => println!("    to: {}\n    data: {data}", output.to.as_deref().unwrap_or("-")),
                (None, Some(error)) => println!("    error: {error}"),
                (None, None) => {}
            }
        }
    }

    let failed = outputs.iter().filter(|output| output.error.is_some()).count();
    if failed > 0 {
        anyhow::bail!("{failed} withdrawal(s) could not be encoded");
    }
    Ok(())
}

fn withdraw_outputs(config: &Config, chain_id: &str) -> Result<Vec<CalldataOutput>> {
    let tokens = config.tokens.as_ref().context("tokens mapping not defined")?;
    let chain = config
        .chain(chain_id)
        .with_context(|| format!("unknown chain id {chain_id}"))?;
    let bridge = chain.bridge_address().ok().map(|address| format!("{address:#x}"));
    let requests = tokens.get(chain_id).map(Vec::as_slice).unwrap_or_default();

    Ok(requests
        .iter()
        .map(|request| {
            let description = format!(
                "{} withdraw {} to {} via handler {}",
                request.kind, request.amount_or_token_id, request.recipient, request.handler_address
            );
            let (data, error) = match encode_withdraw_calldata(request) {
                Ok(calldata) => (Some(format_hex(&calldata)), None),
                Err(err) => (None, Some(err.to_string())),
            };
            CalldataOutput {
                chain_id: Some(chain.id.clone()),
                to: bridge.clone(),
                description,
                data,
                error,
            }
        })
        .collect())
}

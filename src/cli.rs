use crate::commands;
use crate::config::Config;
use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "bridge-admin",
    version,
    about = "Admin tool for draining and pausing a ChainBridge deployment"
)]
pub struct Cli {
    #[arg(long, global = true)]
    pub config_path: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Run the selected command, loading the config only for commands that use it.
    pub async fn run(self) -> Result<()> {
        let config_path = self.config_path;
        let load = || -> Result<Config> {
            let config = Config::load(config_path.as_deref())?;
            tracing::debug!(path = %config.path.display(), chains = config.chains.len(), "config loaded");
            Ok(config)
        };

        match self.command {
            Command::StopBridge(args) => commands::stop_bridge::run(args, load()?).await,
            Command::TransferTokens(args) => commands::transfer_tokens::run(args, load()?).await,
            Command::Pending(args) => commands::pending::run(args, load()?).await,
            Command::Encode(cmd) => match cmd.command {
                EncodeSubcommand::Pause(args) => commands::encode::run_pause(args),
                EncodeSubcommand::Withdraw(args) => commands::encode::run_withdraw(args, load()?),
            },
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Wait until no proposal is pending on any chain, then optionally pause the bridges.
    StopBridge(StopBridgeArgs),
    /// Withdraw the configured tokens from the bridge handlers.
    TransferTokens(TransferTokensArgs),
    /// Scan every chain once and list pending proposals.
    Pending(PendingArgs),
    /// Print admin calldata without touching any chain.
    Encode(EncodeCommand),
}

#[derive(Args, Debug, Clone)]
pub struct StopBridgeArgs {
    /// Print the pause calldata instead of submitting it.
    #[arg(long)]
    pub dry_run: bool,

    /// Pause every bridge once quiet, regardless of `auto_pause_bridge`.
    #[arg(long)]
    pub auto_pause: bool,

    #[arg(long)]
    pub poll_interval_secs: Option<u64>,
}

#[derive(Args, Debug, Clone)]
pub struct TransferTokensArgs {
    #[arg(long)]
    pub dry_run: bool,

    /// Only process withdrawals for this chain id.
    #[arg(long)]
    pub chain: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct PendingArgs {
    #[arg(long)]
    pub json: bool,
}

#[derive(Parser, Debug)]
pub struct EncodeCommand {
    #[command(subcommand)]
    pub command: EncodeSubcommand,
}

#[derive(Subcommand, Debug)]
pub enum EncodeSubcommand {
    Pause(EncodePauseArgs),
    Withdraw(EncodeWithdrawArgs),
}

#[derive(Args, Debug, Clone)]
pub struct EncodePauseArgs {
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct EncodeWithdrawArgs {
    #[arg(long)]
    pub chain: String,

    #[arg(long)]
    pub json: bool,
}

use alloy_primitives::Address;
use anyhow::{anyhow, Result};
use std::fmt;
use std::str::FromStr;

pub const PROPOSAL_EVENT_NAME: &str = "ProposalEvent";

/// On-chain state of a bridge proposal, as emitted in the `status` topic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProposalStatus {
    Inactive,
    Active,
    Passed,
    Executed,
    Cancelled,
}

impl ProposalStatus {
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Inactive),
            1 => Some(Self::Active),
            2 => Some(Self::Passed),
            3 => Some(Self::Executed),
            4 => Some(Self::Cancelled),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inactive => "Inactive",
            Self::Active => "Active",
            Self::Passed => "Passed",
            Self::Executed => "Executed",
            Self::Cancelled => "Cancelled",
        }
    }

    /// Active and Passed proposals still wait for relayer action.
    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Active | Self::Passed)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Executed | Self::Cancelled)
    }
}

impl fmt::Display for ProposalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn parse_address(value: &str) -> Result<Address> {
    Address::from_str(value.trim()).map_err(|err| anyhow!("invalid address {value}: {err}"))
}

/// Parse a base-10 block number.
pub fn parse_block_number(value: &str) -> Result<u64> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|err| anyhow!("invalid block number {value}: {err}"))
}

pub fn format_hex(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

//! Core identifier types: execution contexts and stable call identities.

use alloy_primitives::Address;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// The chain-state snapshot a call is evaluated against.
///
/// `BlockId` doubles as the partition key of the batching engine. Parsing
/// canonicalizes equivalent spellings, so `"16"`, `"0x10"` and
/// `BlockId::Number(16)` all compare equal and calls intending the same
/// snapshot land in the same partition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BlockId {
    Latest,
    Earliest,
    Pending,
    Safe,
    Finalized,
    Number(u64),
}

impl Default for BlockId {
    fn default() -> Self {
        BlockId::Latest
    }
}

/// Failed to parse a block tag or height.
#[derive(Debug, Clone, Error)]
#[error("Invalid block identifier: {0}")]
pub struct InvalidBlockId(String);

impl FromStr for BlockId {
    type Err = InvalidBlockId;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "latest" => return Ok(BlockId::Latest),
            "earliest" => return Ok(BlockId::Earliest),
            "pending" => return Ok(BlockId::Pending),
            "safe" => return Ok(BlockId::Safe),
            "finalized" => return Ok(BlockId::Finalized),
            _ => {}
        }

        if let Some(hex_digits) = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
            return u64::from_str_radix(hex_digits, 16)
                .map(BlockId::Number)
                .map_err(|_| InvalidBlockId(s.to_string()));
        }

        if !trimmed.is_empty() && trimmed.bytes().all(|b| b.is_ascii_digit()) {
            return trimmed
                .parse::<u64>()
                .map(BlockId::Number)
                .map_err(|_| InvalidBlockId(s.to_string()));
        }

        Err(InvalidBlockId(s.to_string()))
    }
}

impl fmt::Display for BlockId {
    /// JSON-RPC block parameter form: named tags as-is, heights as 0x quantities.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockId::Latest => write!(f, "latest"),
            BlockId::Earliest => write!(f, "earliest"),
            BlockId::Pending => write!(f, "pending"),
            BlockId::Safe => write!(f, "safe"),
            BlockId::Finalized => write!(f, "finalized"),
            BlockId::Number(n) => write!(f, "0x{:x}", n),
        }
    }
}

impl TryFrom<String> for BlockId {
    type Error = InvalidBlockId;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BlockId> for String {
    fn from(value: BlockId) -> Self {
        value.to_string()
    }
}

impl From<u64> for BlockId {
    fn from(value: u64) -> Self {
        BlockId::Number(value)
    }
}

/// Stable identifier for one call: target address plus canonical function
/// signature. Two failing calls in the same aggregate request are always
/// distinguishable by their `CallId`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallId {
    pub target: Address,
    pub signature: String,
}

impl CallId {
    pub fn new(target: Address, signature: impl Into<String>) -> Self {
        Self {
            target,
            signature: signature.into(),
        }
    }
}

impl fmt::Display for CallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.target, self.signature)
    }
}

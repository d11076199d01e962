//! Error types for the call batching engine.
//!
//! The taxonomy mirrors the blast radius of each failure: `CallError` settles
//! a single caller's future, `BatchError` rejects every call in one partition,
//! and configuration failures surface before any batching is affected.

use crate::types::CallId;
use thiserror::Error;

/// Codec boundary errors, keyed by the canonical function signature.
#[derive(Debug, Clone, Error)]
pub enum CodecError {
    #[error("Encoding failed for {signature}: {reason}")]
    Encode { signature: String, reason: String },

    #[error("Decoding failed for {signature}: {reason}")]
    Decode { signature: String, reason: String },

    #[error("Unknown function signature: {0}")]
    UnknownSignature(String),
}

/// Transport-level errors surfaced by an execution channel.
#[derive(Debug, Clone, Error)]
pub enum ChannelError {
    #[error("HTTP error: {0}")]
    Http(String),

    #[error("RPC error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Invalid RPC response: {0}")]
    InvalidResponse(String),
}

/// Partition- or configuration-scoped failures.
///
/// Cloneable so that one structural failure can reject every pending call in
/// its partition with the same error.
#[derive(Debug, Clone, Error)]
pub enum BatchError {
    #[error("Unexpected aggregate response length: received {received}; expected {expected}")]
    LengthMismatch { expected: usize, received: usize },

    #[error("Aggregate response decoding failed: {0}")]
    AggregateDecode(String),

    #[error("Aggregate call reverted: {0}")]
    AggregateReverted(String),

    #[error("Transport error: {0}")]
    Transport(#[from] ChannelError),

    #[error("No aggregator deployment known for chain {0}")]
    UnsupportedChain(u64),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Call was dropped before completion")]
    ChannelClosed,
}

impl From<config::ConfigError> for BatchError {
    fn from(err: config::ConfigError) -> Self {
        BatchError::Config(err.to_string())
    }
}

/// Call-scoped failure returned from `Multicaller::submit`.
///
/// `Reverted` and `Codec` affect only the call they name; siblings in the
/// same aggregate request settle independently. `Batch` wraps a failure that
/// rejected the whole partition.
#[derive(Debug, Clone, Error)]
pub enum CallError {
    #[error("Call failed for {id}: {}", reason.as_deref().unwrap_or("execution reverted"))]
    Reverted {
        id: CallId,
        reason: Option<String>,
        origin: Option<String>,
    },

    #[error("Call codec failed for {id}: {source}")]
    Codec {
        id: CallId,
        #[source]
        source: CodecError,
        origin: Option<String>,
    },

    #[error(transparent)]
    Batch(#[from] BatchError),
}

impl CallError {
    /// The identity of the failing call, when the failure is call-scoped.
    pub fn call_id(&self) -> Option<&CallId> {
        match self {
            CallError::Reverted { id, .. } | CallError::Codec { id, .. } => Some(id),
            CallError::Batch(_) => None,
        }
    }

    /// Captured provenance of the originating call site, if any.
    pub fn origin(&self) -> Option<&str> {
        match self {
            CallError::Reverted { origin, .. } | CallError::Codec { origin, .. } => {
                origin.as_deref()
            }
            CallError::Batch(_) => None,
        }
    }
}

//! Execution channel boundary: the opaque request/response transport to a node.
//!
//! The engine treats the channel as a black box and never manages retries or
//! connection state on it. The channel's tri-state result (success, decoded
//! revert, transport error) is what lets the dispatcher tell a per-call revert
//! from a structural aggregate failure without pattern-matching error internals.

use crate::error::ChannelError;
use crate::types::BlockId;
use alloy_primitives::{Address, Bytes, U256};
use async_trait::async_trait;

pub mod http;

/// A single `eth_call`-shaped request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallRequest {
    pub to: Address,
    pub data: Bytes,
    pub from: Option<Address>,
    pub gas: Option<u64>,
    pub gas_price: Option<U256>,
}

impl CallRequest {
    pub fn new(to: Address, data: Bytes) -> Self {
        Self {
            to,
            data,
            ..Self::default()
        }
    }
}

/// Evaluation result of a call that reached the node.
///
/// Transport failures are the `Err` arm of [`ExecutionChannel::call`]; this
/// type only distinguishes a successful evaluation from a revert.
#[derive(Debug, Clone, PartialEq)]
pub enum ChannelResponse {
    Success(Bytes),
    Revert {
        data: Bytes,
        reason: Option<String>,
    },
}

impl ChannelResponse {
    /// Revert with empty payload and no decodable reason.
    ///
    /// This is the structural signature the degradation path keys on: an
    /// aggregator that cannot evaluate the batch at all answers this way,
    /// while an ordinary per-call revert is reported inside the aggregate
    /// response with its revert data attached.
    pub fn is_opaque_revert(&self) -> bool {
        matches!(
            self,
            ChannelResponse::Revert { data, reason: None } if data.is_empty()
        )
    }
}

/// Decode a Solidity `Error(string)` revert payload into its reason.
///
/// Returns `None` for empty payloads, custom errors, and panics; those
/// surface as reasonless reverts carrying the raw bytes.
pub fn revert_reason(data: &[u8]) -> Option<String> {
    use alloy_sol_types::SolError;
    alloy_sol_types::Revert::abi_decode(data, true)
        .ok()
        .map(|revert| revert.reason)
}

/// Opaque request/response channel to a blockchain node.
#[async_trait]
pub trait ExecutionChannel: Send + Sync {
    /// Evaluate one read-only call at the given block.
    async fn call(
        &self,
        request: &CallRequest,
        block: &BlockId,
    ) -> Result<ChannelResponse, ChannelError>;

    /// Network identifier of the connected node.
    async fn chain_id(&self) -> Result<u64, ChannelError>;
}

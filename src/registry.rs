//! Aggregator deployment registry keyed by chain id.

use crate::aggregator::AggregatorDeployment;
use crate::error::BatchError;
use alloy_primitives::{address, Address};
use std::collections::HashMap;

/// Canonical Multicall deployment address, shared by nearly every chain.
pub const DEFAULT_AGGREGATOR_ADDRESS: Address =
    address!("cA11bde05977b3631167028862bE2a173976CA11");

/// Maps a network identifier to its aggregator deployment.
///
/// The default registry answers every chain with the canonical deployment in
/// tolerant mode, plus explicit entries for the common networks. A registry
/// without a fallback rejects unknown chains at reconfiguration time, before
/// any batching is affected.
#[derive(Debug, Clone)]
pub struct AggregatorRegistry {
    entries: HashMap<u64, AggregatorDeployment>,
    fallback: Option<AggregatorDeployment>,
}

impl AggregatorRegistry {
    /// Registry with no entries and no fallback; every chain must be
    /// registered explicitly.
    pub fn empty() -> Self {
        Self {
            entries: HashMap::new(),
            fallback: None,
        }
    }

    pub fn register(&mut self, chain_id: u64, deployment: AggregatorDeployment) {
        self.entries.insert(chain_id, deployment);
    }

    /// Drop the any-chain fallback, keeping only explicit entries.
    pub fn without_fallback(mut self) -> Self {
        self.fallback = None;
        self
    }

    pub fn resolve(&self, chain_id: u64) -> Result<AggregatorDeployment, BatchError> {
        self.entries
            .get(&chain_id)
            .copied()
            .or(self.fallback)
            .ok_or(BatchError::UnsupportedChain(chain_id))
    }

    /// The deployment used before any chain has been resolved.
    pub fn bootstrap(&self) -> AggregatorDeployment {
        self.fallback
            .unwrap_or_else(|| AggregatorDeployment::tolerant(DEFAULT_AGGREGATOR_ADDRESS))
    }
}

impl Default for AggregatorRegistry {
    fn default() -> Self {
        let canonical = AggregatorDeployment::tolerant(DEFAULT_AGGREGATOR_ADDRESS);
        let mut entries = HashMap::new();
        // Explicit entries for the common networks; all of them host the
        // canonical deployment.
        for chain_id in [1u64, 10, 56, 100, 137, 8453, 42161, 43114] {
            entries.insert(chain_id, canonical);
        }
        Self {
            entries,
            fallback: Some(canonical),
        }
    }
}

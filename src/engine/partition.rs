//! Aggregation-key resolution and batch partitioning.

use super::PendingCall;
use crate::call::CallRecord;
use crate::types::BlockId;

/// Execution-context partition a call belongs to: the call-level override
/// wins, otherwise the engine default captured at flush time.
///
/// Canonicalization happens when a `BlockId` is constructed, so two spellings
/// of the same snapshot already compare equal here.
pub(super) fn resolve_key(record: &CallRecord, default_block: BlockId) -> BlockId {
    record.block_override().unwrap_or(default_block)
}

/// Group a flushed batch by execution context.
///
/// Arrival order is preserved within each partition, and partitions appear in
/// first-arrival order. No call lands in more than one partition.
pub(super) fn partition(
    batch: Vec<PendingCall>,
    default_block: BlockId,
) -> Vec<(BlockId, Vec<PendingCall>)> {
    let mut partitions: Vec<(BlockId, Vec<PendingCall>)> = Vec::new();
    for call in batch {
        let key = resolve_key(&call.record, default_block);
        match partitions.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, calls)) => calls.push(call),
            None => partitions.push((key, vec![call])),
        }
    }
    partitions
}

//! Result demultiplexer: maps positional aggregate results back to their
//! originating calls and settles each pending future exactly once.

use super::PendingCall;
use crate::aggregator::AggregateResult;
use crate::call::{CallRecord, CallValue};
use crate::channel::revert_reason;
use crate::codec::CallCodec;
use crate::error::{BatchError, CallError};
use tracing::trace;

/// Per-call outcome of a partition dispatch, in partition order.
pub(super) enum Outcome {
    /// Positional element from the aggregate response (or its degraded
    /// synthesis).
    Result(AggregateResult),
    /// A failure scoped to this call alone, e.g. a transport error on one
    /// direct call during degradation.
    Failure(BatchError),
}

/// Settle every call in partition order against its positional outcome.
pub(super) fn settle(codec: &dyn CallCodec, calls: Vec<PendingCall>, outcomes: Vec<Outcome>) {
    debug_assert_eq!(calls.len(), outcomes.len());
    for (call, outcome) in calls.into_iter().zip(outcomes) {
        let result = settle_one(codec, &call.record, outcome);
        trace!(
            sequence = call.sequence,
            id = %call.record.id(),
            ok = result.is_ok(),
            "Settling call"
        );
        // A dropped receiver means the caller abandoned interest; the call
        // still ran, only the result is discarded.
        let _ = call.tx.send(result);
    }
}

fn settle_one(
    codec: &dyn CallCodec,
    record: &CallRecord,
    outcome: Outcome,
) -> Result<CallValue, CallError> {
    let element = match outcome {
        Outcome::Failure(err) => return Err(CallError::Batch(err)),
        Outcome::Result(element) => element,
    };

    if !element.success {
        return Err(CallError::Reverted {
            id: record.id(),
            reason: revert_reason(&element.return_data),
            origin: record.origin.clone(),
        });
    }

    codec
        .decode(&record.callable, &element.return_data)
        .map(|values| CallValue::from_outputs(record.callable.outputs(), values))
        .map_err(|source| CallError::Codec {
            id: record.id(),
            source,
            origin: record.origin.clone(),
        })
}

/// Reject every call in the partition with the same partition-scoped error.
pub(super) fn reject_all(calls: Vec<PendingCall>, err: BatchError) {
    for call in calls {
        let _ = call.tx.send(Err(CallError::Batch(err.clone())));
    }
}

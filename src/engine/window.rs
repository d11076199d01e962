//! Batching window state: the pending-call table and flush scheduling.

use crate::call::{CallRecord, CallValue};
use crate::error::CallError;
use tokio::sync::oneshot;

/// One submitted call awaiting its result.
///
/// The oneshot sender is the pending-result slot; sending consumes it, which
/// makes twice-settlement unrepresentable.
pub(super) struct PendingCall {
    /// Arrival index, restores submission order after partitioning.
    pub sequence: u64,
    pub record: CallRecord,
    pub tx: oneshot::Sender<Result<CallValue, CallError>>,
}

/// What a submission requires of the caller.
pub(super) enum SubmitAction {
    /// Batch-size limit reached; dispatch this batch now.
    Flush(Vec<PendingCall>),
    /// First call of a new window; schedule a flush at the end of the tick.
    Schedule,
    /// A flush is already scheduled; nothing to do.
    Wait,
}

#[derive(Default)]
pub(super) struct WindowState {
    pending: Vec<PendingCall>,
    flush_scheduled: bool,
}

impl WindowState {
    pub(super) fn push(&mut self, call: PendingCall, max_batch_size: usize) -> SubmitAction {
        self.pending.push(call);
        if self.pending.len() >= max_batch_size {
            // A previously scheduled flush task, if any, keeps the flag and
            // will collect whatever arrives after this early flush.
            SubmitAction::Flush(std::mem::take(&mut self.pending))
        } else if !self.flush_scheduled {
            self.flush_scheduled = true;
            SubmitAction::Schedule
        } else {
            SubmitAction::Wait
        }
    }

    /// Close the current window, returning its batch.
    pub(super) fn take(&mut self) -> Vec<PendingCall> {
        self.flush_scheduled = false;
        std::mem::take(&mut self.pending)
    }
}

//! Aggregate dispatcher and the degradation path.
//!
//! One aggregate request goes out per partition. When the aggregation
//! mechanism itself is structurally unavailable (the aggregator answered
//! with an empty or uninterpretable response) the partition degrades to
//! direct per-call round trips that synthesize the same response shape. Any
//! other dispatch failure rejects the partition as a whole.

use super::demux::{self, Outcome};
use super::{partition, Multicaller, PendingCall};
use crate::aggregator::{self, AggregateResult, AggregatorDeployment};
use crate::call::CallOverrides;
use crate::channel::{revert_reason, CallRequest, ChannelResponse, ExecutionChannel};
use crate::error::{BatchError, CallError};
use crate::types::BlockId;
use alloy_primitives::{Address, Bytes};
use std::sync::Arc;
use tracing::{debug, warn};

/// Empty or uninterpretable aggregate response: the only signature treated
/// as "the aggregation mechanism is unavailable for this partition".
fn is_structural_failure(response: &ChannelResponse) -> bool {
    match response {
        ChannelResponse::Success(data) => data.is_empty(),
        revert => revert.is_opaque_revert(),
    }
}

impl Multicaller {
    pub(super) async fn dispatch_batch(&self, batch: Vec<PendingCall>) {
        // Captured once per flush, channel and deployment from the same lock
        // guard; a concurrent swap never tears an in-flight dispatch.
        let (channel, deployment) = {
            let state = self.inner.state.read();
            (Arc::clone(&state.channel), state.deployment)
        };
        let default_block = *self.inner.default_block.read();

        let partitions = partition::partition(batch, default_block);
        debug!(partitions = partitions.len(), "Flushing call window");

        let dispatches = partitions.into_iter().map(|(block, calls)| {
            let channel = Arc::clone(&channel);
            async move {
                self.dispatch_partition(channel, deployment, block, calls)
                    .await;
            }
        });
        futures::future::join_all(dispatches).await;
    }

    async fn dispatch_partition(
        &self,
        channel: Arc<dyn ExecutionChannel>,
        deployment: AggregatorDeployment,
        block: BlockId,
        calls: Vec<PendingCall>,
    ) {
        // Encode up front. An encoding failure is call-scoped: it settles
        // only its own call and drops out of the aggregate request.
        let mut live = Vec::with_capacity(calls.len());
        let mut elements = Vec::with_capacity(calls.len());
        for call in calls {
            match self.inner.codec.encode(&call.record.callable) {
                Ok(data) => {
                    elements.push((call.record.target, data));
                    live.push(call);
                }
                Err(source) => {
                    let rejection = CallError::Codec {
                        id: call.record.id(),
                        source,
                        origin: call.record.origin.clone(),
                    };
                    let _ = call.tx.send(Err(rejection));
                }
            }
        }
        if live.is_empty() {
            return;
        }

        // At most one non-context override set is honored per partition;
        // the first one encountered wins (documented limitation).
        let overrides = live.iter().find_map(|call| {
            call.record
                .overrides
                .as_ref()
                .filter(|o| o.has_execution_overrides())
                .cloned()
        });

        let mut request = CallRequest::new(
            deployment.address,
            aggregator::encode_request(deployment.mode, &elements),
        );
        apply_overrides(&mut request, overrides.as_ref());

        debug!(
            partition = %block,
            calls = live.len(),
            mode = ?deployment.mode,
            "Dispatching aggregate request"
        );

        match channel.call(&request, &block).await {
            Err(err) => demux::reject_all(live, BatchError::Transport(err)),
            Ok(response) if is_structural_failure(&response) => {
                warn!(
                    partition = %block,
                    calls = live.len(),
                    "Aggregator unavailable, degrading to direct calls"
                );
                self.degrade(channel, block, overrides, live, elements)
                    .await;
            }
            Ok(ChannelResponse::Success(data)) => {
                let expected = live.len();
                match aggregator::decode_response(deployment.mode, &data) {
                    Ok(results) if results.len() == expected => {
                        let outcomes = results.into_iter().map(Outcome::Result).collect();
                        demux::settle(self.inner.codec.as_ref(), live, outcomes);
                    }
                    Ok(results) => demux::reject_all(
                        live,
                        BatchError::LengthMismatch {
                            expected,
                            received: results.len(),
                        },
                    ),
                    Err(err) => demux::reject_all(live, err),
                }
            }
            Ok(ChannelResponse::Revert { data, reason }) => {
                let reason = reason
                    .or_else(|| revert_reason(&data))
                    .unwrap_or_else(|| "no revert reason".to_string());
                demux::reject_all(live, BatchError::AggregateReverted(reason));
            }
        }
    }

    /// Direct per-call round trips, still concurrent and in the same
    /// execution context, synthesizing the tolerant response shape so the
    /// demultiplexer never learns a fallback occurred.
    async fn degrade(
        &self,
        channel: Arc<dyn ExecutionChannel>,
        block: BlockId,
        overrides: Option<CallOverrides>,
        live: Vec<PendingCall>,
        elements: Vec<(Address, Bytes)>,
    ) {
        let direct = elements.into_iter().map(|(target, data)| {
            let channel = Arc::clone(&channel);
            let mut request = CallRequest::new(target, data);
            apply_overrides(&mut request, overrides.as_ref());
            async move {
                match channel.call(&request, &block).await {
                    Ok(ChannelResponse::Success(data)) => Outcome::Result(AggregateResult {
                        success: true,
                        return_data: data,
                    }),
                    Ok(ChannelResponse::Revert { data, .. }) => Outcome::Result(AggregateResult {
                        success: false,
                        return_data: data,
                    }),
                    Err(err) => Outcome::Failure(BatchError::Transport(err)),
                }
            }
        });
        let outcomes = futures::future::join_all(direct).await;
        demux::settle(self.inner.codec.as_ref(), live, outcomes);
    }
}

fn apply_overrides(request: &mut CallRequest, overrides: Option<&CallOverrides>) {
    if let Some(overrides) = overrides {
        request.from = overrides.from;
        request.gas = overrides.gas;
        request.gas_price = overrides.gas_price;
    }
}

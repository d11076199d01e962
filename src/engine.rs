//! Batching engine: collects read-only calls issued in one scheduling window
//! and dispatches them as aggregate requests, one per execution context.
//!
//! A [`Multicaller`] is an explicit engine instance; several independent
//! engines (e.g. one per network) can coexist in one process. Handles are
//! cheap to clone and all clones share the same window and pending-call
//! table.

use crate::aggregator::AggregatorDeployment;
use crate::call::{CallRecord, CallValue};
use crate::channel::ExecutionChannel;
use crate::codec::CallCodec;
use crate::error::{BatchError, CallError};
use crate::registry::AggregatorRegistry;
use crate::types::BlockId;
use alloy_primitives::Address;
use parking_lot::{Mutex, RwLock};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::info;

mod demux;
mod dispatch;
mod partition;
mod window;

use window::{PendingCall, SubmitAction, WindowState};

/// Engine tuning knobs.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Window flushes immediately once this many calls are pending.
    pub max_batch_size: usize,
    /// Execution context for calls without an explicit override.
    pub default_block: BlockId,
    /// Aggregator deployments by chain id.
    pub registry: AggregatorRegistry,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_batch_size: 512,
            default_block: BlockId::Latest,
            registry: AggregatorRegistry::default(),
        }
    }
}

/// Channel and its resolved deployment, swapped as one unit so a flush
/// never pairs a new aggregator address with an old transport.
struct ChannelState {
    channel: Arc<dyn ExecutionChannel>,
    deployment: AggregatorDeployment,
}

struct EngineInner {
    state: RwLock<ChannelState>,
    default_block: RwLock<BlockId>,
    codec: Arc<dyn CallCodec>,
    registry: AggregatorRegistry,
    max_batch_size: usize,
    window: Mutex<WindowState>,
    sequence: AtomicU64,
}

/// Handle to a batching engine instance.
#[derive(Clone)]
pub struct Multicaller {
    inner: Arc<EngineInner>,
}

impl Multicaller {
    pub fn new(channel: Arc<dyn ExecutionChannel>, codec: Arc<dyn CallCodec>) -> Self {
        Self::with_config(channel, codec, EngineConfig::default())
    }

    pub fn with_config(
        channel: Arc<dyn ExecutionChannel>,
        codec: Arc<dyn CallCodec>,
        config: EngineConfig,
    ) -> Self {
        let deployment = config.registry.bootstrap();
        Self {
            inner: Arc::new(EngineInner {
                state: RwLock::new(ChannelState {
                    channel,
                    deployment,
                }),
                default_block: RwLock::new(config.default_block),
                codec,
                registry: config.registry,
                max_batch_size: config.max_batch_size.max(1),
                window: Mutex::new(WindowState::default()),
                sequence: AtomicU64::new(0),
            }),
        }
    }

    /// Enqueue one call and await its result.
    ///
    /// All calls submitted before the window flushes are candidates for the
    /// same aggregate request. The window flushes when the configured batch
    /// size is reached, or once the current scheduling tick ends with no
    /// further synchronous submissions pending. Every submitted call settles
    /// exactly once.
    ///
    /// End-of-tick coalescing requires a current-thread runtime; on a
    /// multi-threaded runtime the flush task can run on another worker and
    /// split same-tick calls across windows. Results stay correct either
    /// way, only the batching efficiency degrades.
    pub async fn submit(&self, record: CallRecord) -> Result<CallValue, CallError> {
        let (tx, rx) = oneshot::channel();
        let sequence = self.inner.sequence.fetch_add(1, Ordering::Relaxed);
        let action = {
            let mut window = self.inner.window.lock();
            window.push(
                PendingCall {
                    sequence,
                    record,
                    tx,
                },
                self.inner.max_batch_size,
            )
        };

        match action {
            SubmitAction::Flush(batch) => {
                let engine = self.clone();
                tokio::spawn(async move {
                    engine.dispatch_batch(batch).await;
                });
            }
            SubmitAction::Schedule => {
                let engine = self.clone();
                tokio::spawn(async move {
                    // Let every currently-runnable task enqueue its calls
                    // before the window closes.
                    tokio::task::yield_now().await;
                    let batch = engine.inner.window.lock().take();
                    if !batch.is_empty() {
                        engine.dispatch_batch(batch).await;
                    }
                });
            }
            SubmitAction::Wait => {}
        }

        match rx.await {
            Ok(result) => result,
            Err(_) => Err(CallError::Batch(BatchError::ChannelClosed)),
        }
    }

    /// Default execution context for calls without an override.
    pub fn default_block(&self) -> BlockId {
        *self.inner.default_block.read()
    }

    /// Change the default execution context for later flushes.
    pub fn set_default_block(&self, block: BlockId) {
        *self.inner.default_block.write() = block;
    }

    /// Swap the execution channel, resolving the aggregator deployment for
    /// the channel's network.
    ///
    /// Fails fast on an unsupported chain, before any batching is affected.
    /// In-flight dispatches keep the channel they captured at flush time.
    pub async fn set_channel(
        &self,
        channel: Arc<dyn ExecutionChannel>,
        chain_id: Option<u64>,
    ) -> Result<(), BatchError> {
        let chain_id = match chain_id {
            Some(id) => id,
            None => channel.chain_id().await.map_err(BatchError::Transport)?,
        };
        let deployment = self.inner.registry.resolve(chain_id)?;
        *self.inner.state.write() = ChannelState {
            channel,
            deployment,
        };
        info!(
            chain_id,
            aggregator = %deployment.address,
            mode = ?deployment.mode,
            "Execution channel reconfigured"
        );
        Ok(())
    }

    /// Address of the aggregator contract currently in use.
    pub fn aggregator_address(&self) -> Address {
        self.inner.state.read().deployment.address
    }

    /// The aggregator deployment currently in use.
    pub fn deployment(&self) -> AggregatorDeployment {
        self.inner.state.read().deployment
    }
}

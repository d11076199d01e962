//! Contract-surface decorator that forwards calls through a batching engine.
//!
//! Instead of mutating an existing client's shape, a [`ContractHandle`] is an
//! explicit adapter: it holds the target address and an engine handle, and
//! each call constructs a [`CallRecord`] and awaits `submit`. Calls issued
//! through several handles in the same scheduling window still coalesce into
//! one aggregate request per execution context.

use crate::call::{CallOverrides, CallRecord, CallValue, Callable};
use crate::engine::Multicaller;
use crate::error::CallError;
use crate::types::BlockId;
use alloy_primitives::Address;

#[derive(Clone)]
pub struct ContractHandle {
    address: Address,
    engine: Multicaller,
}

impl ContractHandle {
    pub fn new(address: Address, engine: Multicaller) -> Self {
        Self { address, engine }
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Issue one read call through the engine's batching window.
    pub async fn call(&self, callable: Callable) -> Result<CallValue, CallError> {
        self.engine
            .submit(CallRecord::new(self.address, callable))
            .await
    }

    /// Issue one read call with explicit overrides.
    pub async fn call_with(
        &self,
        callable: Callable,
        overrides: CallOverrides,
    ) -> Result<CallValue, CallError> {
        self.engine
            .submit(CallRecord::new(self.address, callable).with_overrides(overrides))
            .await
    }

    /// Issue one read call against a specific chain snapshot.
    pub async fn call_at(
        &self,
        callable: Callable,
        block: BlockId,
    ) -> Result<CallValue, CallError> {
        self.call_with(callable, CallOverrides::at_block(block)).await
    }
}

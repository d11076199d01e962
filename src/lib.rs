//! Callmux: Read-Call Batching and Aggregation
//!
//! Collects read-only contract calls submitted close together in time,
//! partitions them by execution context, and dispatches each partition as a
//! single aggregate request to an on-chain aggregator contract. Results are
//! demultiplexed back to each caller with per-call error isolation, and a
//! degradation path falls back to direct calls when an aggregator is absent.

pub mod aggregator;
pub mod call;
pub mod channel;
pub mod codec;
pub mod config;
pub mod contract;
pub mod engine;
pub mod error;
pub mod logging;
pub mod registry;
pub mod types;

pub use call::{CallOverrides, CallRecord, CallValue, Callable};
pub use engine::{EngineConfig, Multicaller};
pub use types::{BlockId, CallId};

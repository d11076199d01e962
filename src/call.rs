//! Call data model: callables, records, overrides, and decoded values.

use crate::types::{BlockId, CallId};
use alloy_primitives::{Address, U256};
use serde_json::Value;

/// Opaque description of a function to invoke: canonical signature plus
/// JSON-typed arguments and the declared number of return values.
///
/// A `Callable` is immutable once created; the codec keyed by its signature
/// owns the binary representation on both directions of the wire.
#[derive(Debug, Clone, PartialEq)]
pub struct Callable {
    signature: String,
    args: Vec<Value>,
    outputs: usize,
}

impl Callable {
    pub fn new(signature: impl Into<String>, args: Vec<Value>, outputs: usize) -> Self {
        Self {
            signature: signature.into(),
            args,
            outputs,
        }
    }

    /// Canonical function signature, e.g. `balanceOf(address)`.
    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn args(&self) -> &[Value] {
        &self.args
    }

    /// Number of declared return values; drives the single-output unwrap.
    pub fn outputs(&self) -> usize {
        self.outputs
    }
}

/// Per-call overrides forwarded with the aggregate request.
///
/// `block` is the execution-context override and decides partition
/// membership. The remaining fields are non-context overrides; at most one
/// such set is honored per aggregate request, first-encountered wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallOverrides {
    pub block: Option<BlockId>,
    pub from: Option<Address>,
    pub gas: Option<u64>,
    pub gas_price: Option<U256>,
}

impl CallOverrides {
    pub fn at_block(block: BlockId) -> Self {
        Self {
            block: Some(block),
            ..Self::default()
        }
    }

    /// True when any non-context field is set.
    pub fn has_execution_overrides(&self) -> bool {
        self.from.is_some() || self.gas.is_some() || self.gas_price.is_some()
    }
}

/// One pending remote read request plus its identity metadata.
///
/// Immutable after creation; the arrival sequence and partition membership
/// are derived by the engine, never stored on the record.
#[derive(Debug, Clone)]
pub struct CallRecord {
    pub target: Address,
    pub callable: Callable,
    pub overrides: Option<CallOverrides>,
    /// Debug provenance attached to rejections, never affects behavior.
    pub origin: Option<String>,
}

impl CallRecord {
    pub fn new(target: Address, callable: Callable) -> Self {
        Self {
            target,
            callable,
            overrides: None,
            origin: None,
        }
    }

    pub fn with_overrides(mut self, overrides: CallOverrides) -> Self {
        self.overrides = Some(overrides);
        self
    }

    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = Some(origin.into());
        self
    }

    pub fn id(&self) -> CallId {
        CallId::new(self.target, self.callable.signature())
    }

    /// The execution-context override, if the caller requested one.
    pub fn block_override(&self) -> Option<BlockId> {
        self.overrides.as_ref().and_then(|o| o.block)
    }
}

/// Decoded call result.
///
/// A function declared with exactly one return value resolves to the
/// unwrapped value; zero or multiple return values resolve to the full tuple,
/// preserving positional access.
#[derive(Debug, Clone, PartialEq)]
pub enum CallValue {
    Single(Value),
    Tuple(Vec<Value>),
}

impl CallValue {
    /// Apply the single-output unwrap rule to a decoded value list.
    pub fn from_outputs(outputs: usize, mut values: Vec<Value>) -> Self {
        if outputs == 1 && values.len() == 1 {
            CallValue::Single(values.remove(0))
        } else {
            CallValue::Tuple(values)
        }
    }

    pub fn as_single(&self) -> Option<&Value> {
        match self {
            CallValue::Single(value) => Some(value),
            CallValue::Tuple(_) => None,
        }
    }

    pub fn as_tuple(&self) -> Option<&[Value]> {
        match self {
            CallValue::Tuple(values) => Some(values),
            CallValue::Single(_) => None,
        }
    }
}

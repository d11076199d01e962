//! Codec boundary: binary encoding and decoding of individual calls.
//!
//! The engine never interprets call payloads itself; it hands each
//! `Callable` to a codec keyed by the canonical function signature. The
//! aggregate request envelope has its own fixed codec in [`crate::aggregator`].

use crate::call::Callable;
use crate::error::CodecError;
use alloy_primitives::Bytes;
use serde_json::Value;

pub mod erc20;

/// Encodes and decodes individual function calls by signature.
///
/// Implementations must be pure with respect to the callable: encoding the
/// same callable twice yields the same bytes, and a decode failure carries
/// the signature so rejected calls stay identifiable.
pub trait CallCodec: Send + Sync {
    /// Encode the callable's selector and arguments into calldata.
    fn encode(&self, callable: &Callable) -> Result<Bytes, CodecError>;

    /// Decode raw return bytes into one value per declared output.
    fn decode(&self, callable: &Callable, data: &[u8]) -> Result<Vec<Value>, CodecError>;
}

//! ERC-20 call codec and callable constructors.
//!
//! Covers the read-only token surface (`name`, `symbol`, `decimals`,
//! `totalSupply`, `balanceOf`) with `alloy-sol-types` generated bindings.
//! Amounts decode to decimal strings to avoid silent precision loss in JSON;
//! `decimals` stays numeric.

use crate::call::Callable;
use crate::codec::CallCodec;
use crate::error::CodecError;
use alloy_primitives::{Address, Bytes};
use alloy_sol_types::SolCall;
use serde_json::{json, Value};
use std::str::FromStr;

mod abi {
    use alloy_sol_types::sol;

    sol! {
        function name() external view returns (string value);
        function symbol() external view returns (string value);
        function decimals() external view returns (uint8 value);
        function totalSupply() external view returns (uint256 value);
        function balanceOf(address owner) external view returns (uint256 value);
    }
}

pub const NAME: &str = "name()";
pub const SYMBOL: &str = "symbol()";
pub const DECIMALS: &str = "decimals()";
pub const TOTAL_SUPPLY: &str = "totalSupply()";
pub const BALANCE_OF: &str = "balanceOf(address)";

/// `name()` callable.
pub fn name() -> Callable {
    Callable::new(NAME, vec![], 1)
}

/// `symbol()` callable.
pub fn symbol() -> Callable {
    Callable::new(SYMBOL, vec![], 1)
}

/// `decimals()` callable.
pub fn decimals() -> Callable {
    Callable::new(DECIMALS, vec![], 1)
}

/// `totalSupply()` callable.
pub fn total_supply() -> Callable {
    Callable::new(TOTAL_SUPPLY, vec![], 1)
}

/// `balanceOf(owner)` callable.
pub fn balance_of(owner: Address) -> Callable {
    Callable::new(BALANCE_OF, vec![json!(owner.to_string())], 1)
}

/// Codec for the read-only ERC-20 surface.
#[derive(Debug, Clone, Copy, Default)]
pub struct Erc20Codec;

impl Erc20Codec {
    fn address_arg(callable: &Callable, index: usize) -> Result<Address, CodecError> {
        let raw = callable
            .args()
            .get(index)
            .and_then(Value::as_str)
            .ok_or_else(|| CodecError::Encode {
                signature: callable.signature().to_string(),
                reason: format!("argument {} must be an address string", index),
            })?;
        Address::from_str(raw).map_err(|e| CodecError::Encode {
            signature: callable.signature().to_string(),
            reason: format!("invalid address argument: {}", e),
        })
    }
}

impl CallCodec for Erc20Codec {
    fn encode(&self, callable: &Callable) -> Result<Bytes, CodecError> {
        let data = match callable.signature() {
            NAME => abi::nameCall {}.abi_encode(),
            SYMBOL => abi::symbolCall {}.abi_encode(),
            DECIMALS => abi::decimalsCall {}.abi_encode(),
            TOTAL_SUPPLY => abi::totalSupplyCall {}.abi_encode(),
            BALANCE_OF => abi::balanceOfCall {
                owner: Self::address_arg(callable, 0)?,
            }
            .abi_encode(),
            other => return Err(CodecError::UnknownSignature(other.to_string())),
        };
        Ok(data.into())
    }

    fn decode(&self, callable: &Callable, data: &[u8]) -> Result<Vec<Value>, CodecError> {
        let signature = callable.signature();
        let decode_err = |e: alloy_sol_types::Error| CodecError::Decode {
            signature: signature.to_string(),
            reason: e.to_string(),
        };

        let value = match signature {
            NAME => json!(abi::nameCall::abi_decode_returns(data, true)
                .map_err(decode_err)?
                .value),
            SYMBOL => json!(abi::symbolCall::abi_decode_returns(data, true)
                .map_err(decode_err)?
                .value),
            DECIMALS => json!(abi::decimalsCall::abi_decode_returns(data, true)
                .map_err(decode_err)?
                .value),
            TOTAL_SUPPLY => json!(abi::totalSupplyCall::abi_decode_returns(data, true)
                .map_err(decode_err)?
                .value
                .to_string()),
            BALANCE_OF => json!(abi::balanceOfCall::abi_decode_returns(data, true)
                .map_err(decode_err)?
                .value
                .to_string()),
            other => return Err(CodecError::UnknownSignature(other.to_string())),
        };
        Ok(vec![value])
    }
}

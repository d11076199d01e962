//! Multicall aggregator ABI and the aggregate request/response wire forms.
//!
//! Two entry points exist on deployed aggregators. The tolerant one,
//! `tryAggregate`, takes a strictness flag and reports a per-call success
//! flag next to each result, so a reverting call does not abort the batch.
//! The strict one, `aggregate`, returns only the block number and raw
//! results and aborts on the first failing call. The engine prefers the
//! tolerant entry point whenever the deployment supports it.

use crate::error::BatchError;
use alloy_primitives::{Address, Bytes};
use alloy_sol_types::SolCall;
use serde::{Deserialize, Serialize};

mod abi {
    use alloy_sol_types::sol;

    sol! {
        struct Call {
            address target;
            bytes callData;
        }

        struct Result {
            bool success;
            bytes returnData;
        }

        function tryAggregate(bool requireSuccess, Call[] calldata calls)
            public
            returns (Result[] memory returnData);

        function aggregate(Call[] calldata calls)
            public
            returns (uint256 blockNumber, bytes[] memory returnData);
    }
}

/// Which aggregate entry point a deployment is driven through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AggregationMode {
    /// `tryAggregate`: per-call success flags, preferred.
    Tolerant,
    /// `aggregate`: no per-call flags, first failure aborts the batch.
    Strict,
}

/// A known aggregator contract deployment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AggregatorDeployment {
    pub address: Address,
    pub mode: AggregationMode,
}

impl AggregatorDeployment {
    pub fn tolerant(address: Address) -> Self {
        Self {
            address,
            mode: AggregationMode::Tolerant,
        }
    }

    pub fn strict(address: Address) -> Self {
        Self {
            address,
            mode: AggregationMode::Strict,
        }
    }
}

/// One positional result element: success flag plus raw return bytes.
///
/// The strict entry point has no flags; its elements synthesize as
/// successful, which matches its abort-on-failure contract.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateResult {
    pub success: bool,
    pub return_data: Bytes,
}

/// Encode an ordered list of `(target, calldata)` elements into the
/// aggregate request body for the given mode.
pub fn encode_request(mode: AggregationMode, elements: &[(Address, Bytes)]) -> Bytes {
    let calls: Vec<abi::Call> = elements
        .iter()
        .map(|(target, data)| abi::Call {
            target: *target,
            callData: data.clone(),
        })
        .collect();

    match mode {
        AggregationMode::Tolerant => abi::tryAggregateCall {
            requireSuccess: false,
            calls,
        }
        .abi_encode()
        .into(),
        AggregationMode::Strict => abi::aggregateCall { calls }.abi_encode().into(),
    }
}

/// Decode an aggregate request body back into its elements.
///
/// The inverse of [`encode_request`]; used by mock transports and for
/// inspecting outgoing requests. Returns `None` when the calldata is not an
/// aggregate call.
pub fn decode_request(data: &[u8]) -> Option<(AggregationMode, Vec<(Address, Bytes)>)> {
    if let Ok(call) = abi::tryAggregateCall::abi_decode(data, true) {
        let elements = call
            .calls
            .into_iter()
            .map(|c| (c.target, c.callData))
            .collect();
        return Some((AggregationMode::Tolerant, elements));
    }
    if let Ok(call) = abi::aggregateCall::abi_decode(data, true) {
        let elements = call
            .calls
            .into_iter()
            .map(|c| (c.target, c.callData))
            .collect();
        return Some((AggregationMode::Strict, elements));
    }
    None
}

/// Decode an aggregate response body into positional result elements.
pub fn decode_response(
    mode: AggregationMode,
    data: &[u8],
) -> Result<Vec<AggregateResult>, BatchError> {
    match mode {
        AggregationMode::Tolerant => abi::tryAggregateCall::abi_decode_returns(data, true)
            .map(|ret| {
                ret.returnData
                    .into_iter()
                    .map(|item| AggregateResult {
                        success: item.success,
                        return_data: item.returnData,
                    })
                    .collect()
            })
            .map_err(|e| BatchError::AggregateDecode(e.to_string())),
        AggregationMode::Strict => abi::aggregateCall::abi_decode_returns(data, true)
            .map(|ret| {
                ret.returnData
                    .into_iter()
                    .map(|data| AggregateResult {
                        success: true,
                        return_data: data,
                    })
                    .collect()
            })
            .map_err(|e| BatchError::AggregateDecode(e.to_string())),
    }
}

/// Encode positional result elements into an aggregate response body.
///
/// The inverse of [`decode_response`]; used by mock transports. In strict
/// mode the per-element success flags are discarded and the block number is
/// zeroed, mirroring what that entry point reports.
pub fn encode_response(mode: AggregationMode, results: &[AggregateResult]) -> Bytes {
    match mode {
        AggregationMode::Tolerant => {
            let return_data: Vec<abi::Result> = results
                .iter()
                .map(|r| abi::Result {
                    success: r.success,
                    returnData: r.return_data.clone(),
                })
                .collect();
            abi::tryAggregateCall::abi_encode_returns(&(return_data,)).into()
        }
        AggregationMode::Strict => {
            let return_data: Vec<Bytes> = results.iter().map(|r| r.return_data.clone()).collect();
            abi::aggregateCall::abi_encode_returns(&(alloy_primitives::U256::ZERO, return_data))
                .into()
        }
    }
}

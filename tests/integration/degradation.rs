//! Degradation path: a structurally unavailable aggregator falls back to
//! direct per-call requests in the same execution context.

use super::test_utils::{abi_string, abi_u8, engine, AggregateBehavior, MockChannel};
use alloy_primitives::address;
use callmux::call::CallValue;
use callmux::codec::erc20;
use callmux::contract::ContractHandle;
use callmux::error::{BatchError, CallError};
use callmux::types::BlockId;
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn opaque_revert_falls_back_to_direct_calls() {
    let token = address!("1f9840a85d5aF5bf1D1762F925BDADdC4201F984");
    let channel = Arc::new(MockChannel::new(1));
    channel.behave(BlockId::Latest, AggregateBehavior::OpaqueRevert);
    channel.stub_success(token, &erc20::name(), abi_string("Uniswap"));
    channel.stub_success(token, &erc20::symbol(), abi_string("UNI"));
    channel.stub_success(token, &erc20::decimals(), abi_u8(18));

    let handle = ContractHandle::new(token, engine(channel.clone()));
    let (name, symbol, decimals) = tokio::join!(
        handle.call(erc20::name()),
        handle.call(erc20::symbol()),
        handle.call(erc20::decimals()),
    );

    assert_eq!(name.unwrap(), CallValue::Single(json!("Uniswap")));
    assert_eq!(symbol.unwrap(), CallValue::Single(json!("UNI")));
    assert_eq!(decimals.unwrap(), CallValue::Single(json!(18)));

    assert_eq!(channel.aggregate_requests().len(), 1);
    let directs = channel.direct_requests();
    assert_eq!(directs.len(), 3, "one direct round trip per call");
    assert!(directs.iter().all(|(request, block)| {
        request.to == token && *block == BlockId::Latest
    }));
}

#[tokio::test]
async fn empty_success_body_also_degrades() {
    let token = address!("1f9840a85d5aF5bf1D1762F925BDADdC4201F984");
    let channel = Arc::new(MockChannel::new(1));
    channel.behave(BlockId::Latest, AggregateBehavior::EmptyBody);
    channel.stub_success(token, &erc20::symbol(), abi_string("UNI"));

    let handle = ContractHandle::new(token, engine(channel.clone()));
    let symbol = handle.call(erc20::symbol()).await.unwrap();

    assert_eq!(symbol, CallValue::Single(json!("UNI")));
    assert_eq!(channel.direct_requests().len(), 1);
}

#[tokio::test]
async fn degraded_revert_stays_call_scoped() {
    let token = address!("1f9840a85d5aF5bf1D1762F925BDADdC4201F984");
    let channel = Arc::new(MockChannel::new(1));
    channel.behave(BlockId::Latest, AggregateBehavior::OpaqueRevert);
    channel.stub_success(token, &erc20::name(), abi_string("Uniswap"));
    channel.stub_revert(token, &erc20::symbol(), "token paused");

    let handle = ContractHandle::new(token, engine(channel.clone()));
    let (name, symbol) = tokio::join!(
        handle.call(erc20::name()),
        handle.call(erc20::symbol()),
    );

    assert_eq!(name.unwrap(), CallValue::Single(json!("Uniswap")));
    match symbol.unwrap_err() {
        CallError::Reverted { id, reason, .. } => {
            assert_eq!(id.signature, "symbol()");
            assert_eq!(reason.as_deref(), Some("token paused"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn reasoned_aggregate_revert_rejects_the_partition() {
    let token = address!("1f9840a85d5aF5bf1D1762F925BDADdC4201F984");
    let channel = Arc::new(MockChannel::new(1));
    channel.behave(
        BlockId::Latest,
        AggregateBehavior::RevertWith("out of gas"),
    );
    channel.stub_success(token, &erc20::name(), abi_string("Uniswap"));

    let handle = ContractHandle::new(token, engine(channel.clone()));
    let (name, symbol) = tokio::join!(
        handle.call(erc20::name()),
        handle.call(erc20::symbol()),
    );

    for result in [name, symbol] {
        match result.unwrap_err() {
            CallError::Batch(BatchError::AggregateReverted(reason)) => {
                assert_eq!(reason, "out of gas");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    assert!(
        channel.direct_requests().is_empty(),
        "a reasoned revert must not trigger the fallback"
    );
}

#[tokio::test]
async fn only_the_failing_partition_degrades() {
    let token = address!("1f9840a85d5aF5bf1D1762F925BDADdC4201F984");
    let channel = Arc::new(MockChannel::new(1));
    channel.behave(BlockId::Number(100), AggregateBehavior::OpaqueRevert);
    channel.stub_success(token, &erc20::name(), abi_string("Uniswap"));
    channel.stub_success(token, &erc20::symbol(), abi_string("UNI"));

    let handle = ContractHandle::new(token, engine(channel.clone()));
    let (latest, pinned) = tokio::join!(
        handle.call(erc20::name()),
        handle.call_at(erc20::symbol(), BlockId::Number(100)),
    );

    assert_eq!(latest.unwrap(), CallValue::Single(json!("Uniswap")));
    assert_eq!(pinned.unwrap(), CallValue::Single(json!("UNI")));

    assert_eq!(channel.aggregate_requests().len(), 2);
    let directs = channel.direct_requests();
    assert_eq!(directs.len(), 1);
    assert_eq!(directs[0].1, BlockId::Number(100));
}

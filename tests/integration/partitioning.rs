//! Execution-context partitioning: one aggregate request per distinct chain
//! snapshot, with canonicalized context spellings.

use super::test_utils::{abi_string, abi_u8, engine, MockChannel};
use alloy_primitives::address;
use callmux::aggregator;
use callmux::call::CallOverrides;
use callmux::codec::erc20;
use callmux::contract::ContractHandle;
use callmux::types::BlockId;
use std::sync::Arc;

#[tokio::test]
async fn distinct_contexts_get_distinct_requests() {
    let token = address!("1f9840a85d5aF5bf1D1762F925BDADdC4201F984");
    let channel = Arc::new(MockChannel::new(1));
    channel.stub_success(token, &erc20::symbol(), abi_string("UNI"));
    channel.stub_success(token, &erc20::decimals(), abi_u8(18));

    let handle = ContractHandle::new(token, engine(channel.clone()));
    let (a, b, c, d) = tokio::join!(
        handle.call(erc20::symbol()),
        handle.call_at(erc20::symbol(), BlockId::Number(18_000_000)),
        handle.call(erc20::decimals()),
        handle.call_at(erc20::decimals(), BlockId::Number(18_000_000)),
    );
    assert!(a.is_ok() && b.is_ok() && c.is_ok() && d.is_ok());

    let aggregates = channel.aggregate_requests();
    assert_eq!(aggregates.len(), 2, "one request per execution context");

    let blocks: Vec<BlockId> = aggregates.iter().map(|(_, block)| *block).collect();
    assert_eq!(blocks, vec![BlockId::Latest, BlockId::Number(18_000_000)]);

    for (request, _) in &aggregates {
        let (_, elements) = aggregator::decode_request(&request.data).unwrap();
        assert_eq!(elements.len(), 2, "partition members stay together");
    }
}

#[tokio::test]
async fn context_spellings_are_canonicalized() {
    let token = address!("1f9840a85d5aF5bf1D1762F925BDADdC4201F984");
    let channel = Arc::new(MockChannel::new(1));
    channel.stub_success(token, &erc20::symbol(), abi_string("UNI"));
    channel.stub_success(token, &erc20::name(), abi_string("Uniswap"));

    let hex: BlockId = "0x64".parse().unwrap();
    let decimal: BlockId = "100".parse().unwrap();
    assert_eq!(hex, decimal);

    let handle = ContractHandle::new(token, engine(channel.clone()));
    let (a, b) = tokio::join!(
        handle.call_at(erc20::symbol(), hex),
        handle.call_at(erc20::name(), decimal),
    );
    assert!(a.is_ok() && b.is_ok());

    let aggregates = channel.aggregate_requests();
    assert_eq!(aggregates.len(), 1, "same snapshot, same partition");
    assert_eq!(aggregates[0].1, BlockId::Number(100));
}

#[tokio::test]
async fn explicit_default_context_joins_the_implicit_partition() {
    let token = address!("1f9840a85d5aF5bf1D1762F925BDADdC4201F984");
    let channel = Arc::new(MockChannel::new(1));
    channel.stub_success(token, &erc20::symbol(), abi_string("UNI"));
    channel.stub_success(token, &erc20::name(), abi_string("Uniswap"));

    let handle = ContractHandle::new(token, engine(channel.clone()));
    let (a, b) = tokio::join!(
        handle.call(erc20::symbol()),
        handle.call_at(erc20::name(), BlockId::Latest),
    );
    assert!(a.is_ok() && b.is_ok());

    assert_eq!(channel.aggregate_requests().len(), 1);
}

#[tokio::test]
async fn first_execution_override_wins_per_request() {
    let token = address!("1f9840a85d5aF5bf1D1762F925BDADdC4201F984");
    let first = address!("0000000000000000000000000000000000000aaa");
    let second = address!("0000000000000000000000000000000000000bbb");
    let channel = Arc::new(MockChannel::new(1));
    channel.stub_success(token, &erc20::name(), abi_string("Uniswap"));
    channel.stub_success(token, &erc20::symbol(), abi_string("UNI"));
    channel.stub_success(token, &erc20::decimals(), abi_u8(18));

    let handle = ContractHandle::new(token, engine(channel.clone()));
    let overrides_a = CallOverrides {
        from: Some(first),
        ..CallOverrides::default()
    };
    let overrides_b = CallOverrides {
        from: Some(second),
        ..CallOverrides::default()
    };

    let (a, b, c) = tokio::join!(
        handle.call(erc20::name()),
        handle.call_with(erc20::symbol(), overrides_a),
        handle.call_with(erc20::decimals(), overrides_b),
    );
    assert!(a.is_ok() && b.is_ok() && c.is_ok());

    let aggregates = channel.aggregate_requests();
    assert_eq!(aggregates.len(), 1);
    assert_eq!(aggregates[0].0.from, Some(first));
}

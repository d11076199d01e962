//! Failure isolation: call-scoped errors settle one caller, structural
//! errors reject a whole partition, configuration errors surface up front.

use super::test_utils::{
    abi_string, abi_u8, engine, engine_with, AggregateBehavior, MockChannel,
};
use alloy_primitives::{address, Bytes};
use callmux::aggregator::{self, AggregationMode, AggregatorDeployment};
use callmux::call::CallValue;
use callmux::channel::ChannelResponse;
use callmux::codec::erc20;
use callmux::contract::ContractHandle;
use callmux::error::{BatchError, CallError};
use callmux::registry::{AggregatorRegistry, DEFAULT_AGGREGATOR_ADDRESS};
use callmux::types::BlockId;
use callmux::EngineConfig;
use serde_json::json;
use std::sync::Arc;

#[tokio::test]
async fn length_mismatch_rejects_the_whole_partition() {
    let token = address!("1f9840a85d5aF5bf1D1762F925BDADdC4201F984");
    let channel = Arc::new(MockChannel::new(1));
    channel.behave(BlockId::Latest, AggregateBehavior::Truncate(1));
    channel.stub_success(token, &erc20::name(), abi_string("Uniswap"));
    channel.stub_success(token, &erc20::symbol(), abi_string("UNI"));
    channel.stub_success(token, &erc20::decimals(), abi_u8(18));

    let handle = ContractHandle::new(token, engine(channel.clone()));
    let (name, symbol, decimals) = tokio::join!(
        handle.call(erc20::name()),
        handle.call(erc20::symbol()),
        handle.call(erc20::decimals()),
    );

    for result in [name, symbol, decimals] {
        let err = result.unwrap_err();
        match &err {
            CallError::Batch(BatchError::LengthMismatch { expected, received }) => {
                assert_eq!((*expected, *received), (3, 2));
            }
            other => panic!("unexpected error: {:?}", other),
        }
        assert_eq!(
            err.to_string(),
            "Unexpected aggregate response length: received 2; expected 3"
        );
    }
}

#[tokio::test]
async fn per_call_revert_is_isolated_from_siblings() {
    let token = address!("1f9840a85d5aF5bf1D1762F925BDADdC4201F984");
    let channel = Arc::new(MockChannel::new(1));
    channel.stub_success(token, &erc20::name(), abi_string("Uniswap"));
    channel.stub_revert(token, &erc20::symbol(), "symbol unavailable");

    let handle = ContractHandle::new(token, engine(channel.clone()));
    let (name, symbol) = tokio::join!(
        handle.call(erc20::name()),
        handle.call(erc20::symbol()),
    );

    assert_eq!(name.unwrap(), CallValue::Single(json!("Uniswap")));
    match symbol.unwrap_err() {
        CallError::Reverted { id, reason, .. } => {
            assert_eq!(id.target, token);
            assert_eq!(id.signature, "symbol()");
            assert_eq!(reason.as_deref(), Some("symbol unavailable"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(channel.aggregate_requests().len(), 1);
}

#[tokio::test]
async fn decode_failure_is_call_scoped_and_identified() {
    let token = address!("1f9840a85d5aF5bf1D1762F925BDADdC4201F984");
    let channel = Arc::new(MockChannel::new(1));
    channel.stub_success(token, &erc20::name(), abi_string("Uniswap"));
    channel.stub(
        token,
        &erc20::decimals(),
        ChannelResponse::Success(Bytes::from(vec![0x01, 0x02, 0x03])),
    );

    let handle = ContractHandle::new(token, engine(channel.clone()));
    let (name, decimals) = tokio::join!(
        handle.call(erc20::name()),
        handle.call(erc20::decimals()),
    );

    assert!(name.is_ok());
    let err = decimals.unwrap_err();
    assert!(matches!(err, CallError::Codec { .. }));
    assert_eq!(err.call_id().unwrap().signature, "decimals()");
}

#[tokio::test]
async fn encoding_failure_settles_only_its_own_call() {
    let token = address!("1f9840a85d5aF5bf1D1762F925BDADdC4201F984");
    let channel = Arc::new(MockChannel::new(1));
    channel.stub_success(token, &erc20::name(), abi_string("Uniswap"));

    let handle = ContractHandle::new(token, engine(channel.clone()));
    let unknown = callmux::call::Callable::new("sideEffect(uint256)", vec![], 1);
    let (name, bad) = tokio::join!(handle.call(erc20::name()), handle.call(unknown));

    assert_eq!(name.unwrap(), CallValue::Single(json!("Uniswap")));
    match bad.unwrap_err() {
        CallError::Codec { id, .. } => assert_eq!(id.signature, "sideEffect(uint256)"),
        other => panic!("unexpected error: {:?}", other),
    }

    // The rejected call never reaches the wire.
    let (_, elements) =
        aggregator::decode_request(&channel.aggregate_requests()[0].0.data).unwrap();
    assert_eq!(elements.len(), 1);
}

#[tokio::test]
async fn transport_failure_rejects_the_partition() {
    let token = address!("1f9840a85d5aF5bf1D1762F925BDADdC4201F984");
    let channel = Arc::new(MockChannel::new(1));
    channel.behave(BlockId::Latest, AggregateBehavior::Transport);

    let handle = ContractHandle::new(token, engine(channel.clone()));
    let (a, b) = tokio::join!(handle.call(erc20::name()), handle.call(erc20::symbol()));

    for result in [a, b] {
        assert!(matches!(
            result.unwrap_err(),
            CallError::Batch(BatchError::Transport(_))
        ));
    }
}

#[tokio::test]
async fn unsupported_chain_fails_at_reconfiguration() {
    let mut registry = AggregatorRegistry::empty();
    registry.register(1, AggregatorDeployment::tolerant(DEFAULT_AGGREGATOR_ADDRESS));
    let config = EngineConfig {
        registry,
        ..EngineConfig::default()
    };

    let mainnet = Arc::new(MockChannel::new(1));
    let engine = engine_with(mainnet.clone(), config);

    engine.set_channel(mainnet, None).await.unwrap();
    assert_eq!(engine.aggregator_address(), DEFAULT_AGGREGATOR_ADDRESS);

    let unknown = Arc::new(MockChannel::new(777_777));
    let err = engine.set_channel(unknown, None).await.unwrap_err();
    assert!(matches!(err, BatchError::UnsupportedChain(777_777)));

    // The failed swap left the previous deployment in place.
    assert_eq!(engine.aggregator_address(), DEFAULT_AGGREGATOR_ADDRESS);
}

#[tokio::test]
async fn strict_mode_uses_the_strict_entry_point() {
    let token = address!("1f9840a85d5aF5bf1D1762F925BDADdC4201F984");
    let mut registry = AggregatorRegistry::empty();
    registry.register(
        31_337,
        AggregatorDeployment::strict(DEFAULT_AGGREGATOR_ADDRESS),
    );
    let config = EngineConfig {
        registry,
        ..EngineConfig::default()
    };

    let channel = Arc::new(MockChannel::new(31_337));
    channel.stub_success(token, &erc20::name(), abi_string("Uniswap"));
    channel.stub_success(token, &erc20::symbol(), abi_string("UNI"));

    let engine = engine_with(channel.clone(), config);
    engine.set_channel(channel.clone(), Some(31_337)).await.unwrap();

    let handle = ContractHandle::new(token, engine);
    let (name, symbol) = tokio::join!(
        handle.call(erc20::name()),
        handle.call(erc20::symbol()),
    );
    assert_eq!(name.unwrap(), CallValue::Single(json!("Uniswap")));
    assert_eq!(symbol.unwrap(), CallValue::Single(json!("UNI")));

    let aggregates = channel.aggregate_requests();
    assert_eq!(aggregates.len(), 1);
    let (mode, elements) = aggregator::decode_request(&aggregates[0].0.data).unwrap();
    assert_eq!(mode, AggregationMode::Strict);
    assert_eq!(elements.len(), 2);
}

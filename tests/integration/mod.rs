//! Integration tests for the call batching engine

mod degradation;
mod failures;
mod partitioning;

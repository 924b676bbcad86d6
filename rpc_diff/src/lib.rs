//! JSON-RPC plumbing for [`chain_diff`]: an alloy backed
//! [`ChainDataSource`](chain_diff::ChainDataSource), reporters and the
//! process setup shared by the `chain-diff` binary.

pub mod env;
pub mod provider;
pub mod report;
pub mod rpc;
pub mod tracing;

/// Default number of heights compared at the same time by `scan`.
pub const DEFAULT_SCAN_CONCURRENCY: usize = 8;

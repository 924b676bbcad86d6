//! Read-only snapshots of the chain data fetched from one endpoint.
//!
//! Every view is owned by the fetch that produced it and is never mutated by
//! the comparators. Receipts and traces are keyed by transaction hash, which
//! is the only join key used between a header's transaction list and the
//! auxiliary records.

use alloy::primitives::{Address, Bloom, Bytes, TxHash, B256, B64, U256};
use serde::{Deserialize, Serialize};

/// The header fields of a block together with its ordered transaction hashes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeaderView {
    /// Canonical block hash, used as the agreement oracle.
    pub hash: B256,
    pub parent_hash: B256,
    pub uncle_hash: B256,
    pub state_root: B256,
    pub transactions_root: B256,
    pub receipts_root: B256,
    pub logs_bloom: Bloom,
    pub difficulty: U256,
    pub number: u64,
    pub gas_limit: u64,
    pub gas_used: u64,
    pub timestamp: u64,
    pub mix_digest: B256,
    pub nonce: B64,
    /// Absent before London.
    pub base_fee: Option<U256>,
    /// Transaction hashes in block order.
    pub transactions: Vec<TxHash>,
}

/// A transaction receipt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptView {
    pub tx_hash: TxHash,
    /// Absent on pre-Byzantium receipts, which carry `post_state` instead.
    pub status: Option<u64>,
    pub cumulative_gas_used: u64,
    /// Legacy intermediate state root. Empty when the endpoint omits it.
    pub post_state: Bytes,
    pub contract_address: Option<Address>,
    pub gas_used: u64,
    pub logs_bloom: Bloom,
    pub logs: Vec<LogView>,
}

/// A single event log emitted by a transaction.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogView {
    pub address: Address,
    pub data: Bytes,
    pub topics: Vec<B256>,
    /// Position of the log in its block as reported by the endpoint. Only
    /// carried for reporting, never compared.
    pub log_index: u64,
}

/// Opcode level execution trace of one transaction, as returned by
/// `debug_traceTransaction` with the default struct logger.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TraceView {
    pub tx_hash: TxHash,
    pub failed: bool,
    pub gas: u64,
    /// Opaque, compared structurally.
    pub return_value: serde_json::Value,
    pub steps: Vec<OpStepView>,
}

/// One executed instruction.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OpStepView {
    pub pc: u64,
    pub op: String,
    pub gas: u64,
    pub gas_cost: u64,
    pub depth: u64,
    pub stack: Vec<String>,
    pub refund: u64,
}

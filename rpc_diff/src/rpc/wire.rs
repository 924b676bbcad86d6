//! Mapping of alloy's RPC types onto the views.
//!
//! Blocks and receipts arrive as alloy's typed responses. Traces are decoded
//! into alloy's [`DefaultFrame`] through [`compat`], which also accepts
//! Erigon's struct logs.

use alloy::consensus::{Eip658Value, Receipt, ReceiptEnvelope};
use alloy::primitives::{Bytes, TxHash, U256};
use alloy::rpc::types::eth::ReceiptWithBloom;
use alloy::rpc::types::trace::geth::{DefaultFrame, StructLog};
use alloy::rpc::types::{Block, BlockTransactions, Log, TransactionReceipt};
use chain_diff::views::{HeaderView, LogView, OpStepView, ReceiptView, TraceView};
use chain_diff::FetchError;

pub(crate) use compat::Trace;

pub(crate) fn header_view(block: Block) -> Result<HeaderView, FetchError> {
    let Block {
        header,
        transactions,
        ..
    } = block;
    let transactions = match transactions {
        BlockTransactions::Hashes(hashes) => hashes,
        BlockTransactions::Full(txs) => txs.into_iter().map(|tx| tx.hash).collect(),
        _ => Vec::new(),
    };

    Ok(HeaderView {
        hash: header.hash,
        parent_hash: header.parent_hash,
        uncle_hash: header.uncles_hash,
        state_root: header.state_root,
        transactions_root: header.transactions_root,
        receipts_root: header.receipts_root,
        logs_bloom: header.logs_bloom,
        difficulty: header.difficulty,
        number: header.number,
        gas_limit: narrow("gasLimit", header.gas_limit)?,
        gas_used: narrow("gasUsed", header.gas_used)?,
        timestamp: narrow("timestamp", header.timestamp)?,
        mix_digest: header.mix_hash.unwrap_or_default(),
        nonce: header.nonce.unwrap_or_default(),
        base_fee: header.base_fee_per_gas.map(U256::from),
        transactions,
    })
}

pub(crate) fn receipt_view(receipt: TransactionReceipt) -> Result<ReceiptView, FetchError> {
    let ReceiptWithBloom {
        receipt:
            Receipt {
                status,
                cumulative_gas_used,
                logs,
            },
        logs_bloom,
    } = match receipt.inner {
        ReceiptEnvelope::Legacy(it)
        | ReceiptEnvelope::Eip2930(it)
        | ReceiptEnvelope::Eip1559(it)
        | ReceiptEnvelope::Eip4844(it) => it,
        other => {
            return Err(FetchError::Malformed(format!(
                "unsupported receipt type of {}: {other:?}",
                receipt.transaction_hash
            )))
        }
    };
    let (status, post_state) = match status {
        Eip658Value::Eip658(success) => (Some(u64::from(success)), Bytes::new()),
        Eip658Value::PostState(root) => (None, Bytes::copy_from_slice(root.as_slice())),
    };

    Ok(ReceiptView {
        tx_hash: receipt.transaction_hash,
        status,
        cumulative_gas_used: narrow("cumulativeGasUsed", cumulative_gas_used)?,
        post_state,
        contract_address: receipt.contract_address,
        gas_used: narrow("gasUsed", receipt.gas_used)?,
        logs_bloom,
        logs: logs.into_iter().enumerate().map(log_view).collect(),
    })
}

fn log_view((position, log): (usize, Log)) -> LogView {
    let topics = log.inner.data.topics().to_vec();
    LogView {
        address: log.inner.address,
        data: log.inner.data.data,
        topics,
        // Pending logs carry no index, fall back to the position.
        log_index: log.log_index.unwrap_or(position as u64),
    }
}

pub(crate) fn trace_view(tx_hash: TxHash, frame: DefaultFrame) -> TraceView {
    TraceView {
        tx_hash,
        failed: frame.failed,
        gas: frame.gas,
        return_value: serde_json::Value::String(frame.return_value.to_string()),
        steps: frame.struct_logs.into_iter().map(step_view).collect(),
    }
}

fn step_view(log: StructLog) -> OpStepView {
    OpStepView {
        pc: log.pc,
        op: log.op,
        gas: log.gas,
        gas_cost: log.gas_cost,
        depth: log.depth,
        stack: log
            .stack
            .unwrap_or_default()
            .iter()
            .map(|word| format!("{word:#x}"))
            .collect(),
        refund: log.refund_counter.unwrap_or_default(),
    }
}

fn narrow<T>(field: &str, value: T) -> Result<u64, FetchError>
where
    T: TryInto<u64> + Copy + std::fmt::Display,
{
    value
        .try_into()
        .map_err(|_| FetchError::Malformed(format!("{field} {value} does not fit in 64 bits")))
}

/// Erigon reports a failed step's `error` as an object where geth and alloy
/// expect a string.
mod compat {
    use std::collections::BTreeMap;

    use alloy::primitives::{Bytes, B256, U256};
    use alloy::rpc::types::trace::geth::{DefaultFrame, StructLog};
    use serde::{Deserialize, Deserializer};

    /// A `debug_traceTransaction` result produced by the struct logger.
    #[derive(Debug, Deserialize)]
    pub(crate) struct Trace(#[serde(with = "DefaultFrameDef")] pub(crate) DefaultFrame);

    #[derive(Deserialize)]
    #[serde(remote = "DefaultFrame", rename_all = "camelCase")]
    struct DefaultFrameDef {
        failed: bool,
        gas: u64,
        #[serde(default)]
        return_value: Bytes,
        #[serde(default, deserialize_with = "struct_logs")]
        struct_logs: Vec<StructLog>,
    }

    fn struct_logs<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<StructLog>, D::Error> {
        #[derive(Deserialize)]
        struct Step(#[serde(with = "StructLogDef")] StructLog);

        Ok(Vec::<Step>::deserialize(d)?
            .into_iter()
            .map(|Step(it)| it)
            .collect())
    }

    #[derive(Deserialize)]
    #[serde(remote = "StructLog", rename_all = "camelCase")]
    struct StructLogDef {
        pc: u64,
        op: String,
        gas: u64,
        gas_cost: u64,
        depth: u64,
        #[serde(default, deserialize_with = "error")]
        error: Option<String>,
        #[serde(default)]
        stack: Option<Vec<U256>>,
        #[serde(default)]
        return_data: Option<Bytes>,
        #[serde(default)]
        memory: Option<Vec<String>>,
        #[serde(default, rename = "memSize")]
        memory_size: Option<u64>,
        #[serde(default)]
        storage: Option<BTreeMap<B256, B256>>,
        #[serde(default, rename = "refund")]
        refund_counter: Option<u64>,
    }

    fn error<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Object(serde_json::Map<String, serde_json::Value>),
        }

        Ok(match Option::<Raw>::deserialize(d)? {
            Some(Raw::Text(it)) => Some(it),
            Some(Raw::Object(it)) => Some(serde_json::Value::Object(it).to_string()),
            None => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::{Address, Bloom, B256};
    use serde_json::json;

    use super::*;
    use crate::rpc::tests::{block_json, receipt_json};

    #[test]
    fn header() {
        let block = serde_json::from_value::<Block>(block_json(500)).unwrap();

        let view = header_view(block).unwrap();
        assert_eq!(view.number, 500);
        assert_eq!(view.gas_used, 21_000);
        assert_eq!(view.gas_limit, 30_000_000);
        assert_eq!(view.uncle_hash, B256::repeat_byte(0x02));
        assert_eq!(view.base_fee, Some(U256::from(7)));
        assert_eq!(view.transactions, [B256::repeat_byte(0x10)]);
    }

    #[test]
    fn receipt_logs_fall_back_to_position() {
        let tx = B256::repeat_byte(0x10);
        let mut raw = receipt_json(tx);
        raw["logs"] = json!([
            {
                "address": Address::repeat_byte(1),
                "topics": [B256::repeat_byte(0xdd)],
                "data": "0xabcd",
                "logIndex": "0x7",
                "removed": false,
            },
            {
                "address": Address::repeat_byte(2),
                "topics": [],
                "data": "0x",
                "removed": false,
            },
        ]);

        let view = receipt_view(serde_json::from_value(raw).unwrap()).unwrap();
        assert_eq!(view.tx_hash, tx);
        assert_eq!(view.status, Some(1));
        assert!(view.post_state.is_empty());
        assert_eq!(view.cumulative_gas_used, 42_000);
        assert_eq!(view.logs_bloom, Bloom::ZERO);
        assert_eq!(view.logs[0].topics, [B256::repeat_byte(0xdd)]);
        assert_eq!(view.logs[0].data, Bytes::from(vec![0xab, 0xcd]));
        assert_eq!(view.logs[0].log_index, 7);
        assert_eq!(view.logs[1].address, Address::repeat_byte(2));
        assert_eq!(view.logs[1].log_index, 1);
    }

    #[test]
    fn struct_logger_trace() {
        let raw = json!({
            "gas": 21000,
            "failed": false,
            "returnValue": "",
            "structLogs": [
                { "pc": 0, "op": "PUSH1", "gas": 79000, "gasCost": 3, "depth": 1, "stack": [] },
                {
                    "pc": 2,
                    "op": "MSTORE",
                    "gas": 78997,
                    "gasCost": 12,
                    "depth": 1,
                    "stack": ["0x80", "0x40"],
                    "refund": 4800,
                },
            ],
        });

        let Trace(frame) = serde_json::from_value(raw).unwrap();
        let view = trace_view(B256::ZERO, frame);
        assert_eq!(view.gas, 21_000);
        assert_eq!(view.return_value, json!("0x"));
        assert_eq!(view.steps.len(), 2);
        assert_eq!(view.steps[0].refund, 0);
        assert_eq!(view.steps[1].refund, 4800);
        assert_eq!(view.steps[1].stack, ["0x80", "0x40"]);
    }

    #[test]
    fn erigon_error_object() {
        let raw = json!({
            "gas": 30000,
            "failed": true,
            "returnValue": "0x08c379a0",
            "structLogs": [
                { "pc": 7, "op": "REVERT", "gas": 100, "gasCost": 0, "depth": 1, "error": {} },
            ],
        });

        let Trace(frame) = serde_json::from_value(raw).unwrap();
        assert_eq!(frame.struct_logs[0].error.as_deref(), Some("{}"));
        let view = trace_view(B256::ZERO, frame);
        assert!(view.failed);
        assert_eq!(view.return_value, json!("0x08c379a0"));
        assert!(view.steps[0].stack.is_empty());
    }

    #[test]
    fn malformed_trace() {
        let raw = json!({ "gas": "lots", "failed": false });
        assert!(serde_json::from_value::<Trace>(raw).is_err());
    }
}

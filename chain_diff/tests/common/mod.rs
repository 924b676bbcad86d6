//! An in-memory [`ChainDataSource`] with knobs for making two chains differ.

#![allow(dead_code)]

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

use alloy::primitives::{Address, Bloom, Bytes, TxHash, B256, B64, U256};
use chain_diff::views::{HeaderView, LogView, OpStepView, ReceiptView, TraceView};
use chain_diff::{ChainDataSource, FetchError};
use serde_json::json;

pub const TXS_PER_BLOCK: u8 = 2;
pub const TRACE_STEPS: u64 = 10;

pub fn tx_hash(height: u64, index: u8) -> TxHash {
    let mut bytes = [0u8; 32];
    bytes[..8].copy_from_slice(&height.to_be_bytes());
    bytes[8] = index;
    bytes[31] = 0x01;
    TxHash::from(bytes)
}

fn block_hash(height: u64, fork: u8) -> B256 {
    let mut bytes = [0u8; 32];
    bytes[..8].copy_from_slice(&height.to_be_bytes());
    bytes[30] = fork;
    bytes[31] = 0x02;
    B256::from(bytes)
}

pub fn header(height: u64) -> HeaderView {
    HeaderView {
        hash: block_hash(height, 0),
        parent_hash: block_hash(height.saturating_sub(1), 0),
        uncle_hash: B256::repeat_byte(0x1d),
        state_root: B256::repeat_byte(0x5a),
        transactions_root: B256::repeat_byte(0x7a),
        receipts_root: B256::repeat_byte(0x4e),
        logs_bloom: Bloom::ZERO,
        difficulty: U256::ZERO,
        number: height,
        gas_limit: 30_000_000,
        gas_used: 42_000,
        timestamp: 1_700_000_000 + 12 * height,
        mix_digest: B256::ZERO,
        nonce: B64::ZERO,
        base_fee: Some(U256::from(1_000_000_000u64)),
        transactions: (0..TXS_PER_BLOCK).map(|i| tx_hash(height, i)).collect(),
    }
}

pub fn receipt(tx_hash: TxHash) -> ReceiptView {
    ReceiptView {
        tx_hash,
        status: Some(1),
        cumulative_gas_used: 21_000,
        post_state: Bytes::new(),
        contract_address: None,
        gas_used: 21_000,
        logs_bloom: Bloom::ZERO,
        logs: (0..3)
            .map(|i| LogView {
                address: Address::repeat_byte(0xc0),
                data: Bytes::from(vec![i as u8; 32]),
                topics: vec![B256::repeat_byte(0xdd)],
                log_index: i,
            })
            .collect(),
    }
}

pub fn trace(tx_hash: TxHash) -> TraceView {
    TraceView {
        tx_hash,
        failed: false,
        gas: 21_000,
        return_value: json!(""),
        steps: (0..TRACE_STEPS)
            .map(|i| OpStepView {
                pc: i,
                op: "PUSH1".to_string(),
                gas: 79_000 - 3 * i,
                gas_cost: 3,
                depth: 1,
                stack: (0..i).map(|v| format!("{v:#x}")).collect(),
                refund: 0,
            })
            .collect(),
    }
}

#[derive(Debug)]
pub struct FakeChain {
    pub head: u64,
    headers: BTreeMap<u64, HeaderView>,
    receipts: HashMap<TxHash, ReceiptView>,
    traces: HashMap<TxHash, TraceView>,
    failing_heights: HashSet<u64>,
    failing_txs: HashSet<TxHash>,
    header_fetches: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl FakeChain {
    /// A chain of `head + 1` blocks with [`TXS_PER_BLOCK`] transactions each.
    pub fn new(head: u64) -> Self {
        let headers = (0..=head).map(|h| (h, header(h))).collect::<BTreeMap<_, _>>();
        let txs = headers
            .values()
            .flat_map(|h| h.transactions.clone())
            .collect::<Vec<_>>();
        Self {
            head,
            receipts: txs.iter().map(|tx| (*tx, receipt(*tx))).collect(),
            traces: txs.iter().map(|tx| (*tx, trace(*tx))).collect(),
            headers,
            failing_heights: HashSet::new(),
            failing_txs: HashSet::new(),
            header_fetches: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Forks the chain at `height`: every block from there on has a
    /// different hash and state root.
    pub fn diverge_from(mut self, height: u64) -> Self {
        for (h, header) in self.headers.range_mut(height..) {
            header.hash = block_hash(*h, 1);
            header.state_root = B256::repeat_byte(0x5b);
        }
        self
    }

    pub fn header_mut(&mut self, height: u64) -> &mut HeaderView {
        self.headers.get_mut(&height).expect("height within the chain")
    }

    /// Changes `height` in place and gives it a different hash.
    pub fn alter(mut self, height: u64, f: impl FnOnce(&mut HeaderView)) -> Self {
        let header = self.header_mut(height);
        header.hash = block_hash(height, 2);
        f(header);
        self
    }

    pub fn alter_receipt(mut self, tx: TxHash, f: impl FnOnce(&mut ReceiptView)) -> Self {
        f(self.receipts.get_mut(&tx).expect("known transaction"));
        self
    }

    pub fn alter_trace(mut self, tx: TxHash, f: impl FnOnce(&mut TraceView)) -> Self {
        f(self.traces.get_mut(&tx).expect("known transaction"));
        self
    }

    pub fn fail_at(mut self, height: u64) -> Self {
        self.failing_heights.insert(height);
        self
    }

    pub fn fail_tx(mut self, tx: TxHash) -> Self {
        self.failing_txs.insert(tx);
        self
    }

    /// Number of header fetches served so far.
    pub fn header_fetches(&self) -> usize {
        self.header_fetches.load(Ordering::SeqCst)
    }

    /// Largest number of header fetches that were pending at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn unreachable() -> FetchError {
        FetchError::Network("connection refused".into())
    }
}

impl ChainDataSource for FakeChain {
    async fn latest_height(&self) -> Result<u64, FetchError> {
        Ok(self.head)
    }

    async fn fetch_header(&self, height: u64) -> Result<HeaderView, FetchError> {
        self.header_fetches.fetch_add(1, Ordering::SeqCst);
        let pending = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(pending, Ordering::SeqCst);
        tokio::task::yield_now().await;
        self.in_flight.fetch_sub(1, Ordering::SeqCst);

        if self.failing_heights.contains(&height) {
            return Err(Self::unreachable());
        }
        self.headers
            .get(&height)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(format!("block {height}")))
    }

    async fn fetch_receipt(&self, tx_hash: TxHash) -> Result<ReceiptView, FetchError> {
        if self.failing_txs.contains(&tx_hash) {
            return Err(Self::unreachable());
        }
        self.receipts
            .get(&tx_hash)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(format!("receipt {tx_hash}")))
    }

    async fn fetch_trace(&self, tx_hash: TxHash) -> Result<TraceView, FetchError> {
        if self.failing_txs.contains(&tx_hash) {
            return Err(Self::unreachable());
        }
        self.traces
            .get(&tx_hash)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(format!("trace {tx_hash}")))
    }
}

//! Compares the execution traces of every transaction in one block.

use alloy::primitives::TxHash;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::block;
use crate::error::DriverError;
use crate::pair::EndpointPair;
use crate::report::{self, Reporter, Unit};
use crate::source::ChainDataSource;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TraceRunSummary {
    pub height: u64,
    /// Both blocks list the same number of transactions.
    pub counts_match: bool,
    /// Transactions whose traces were compared.
    pub compared: usize,
    pub mismatching: Vec<TxHash>,
    pub failed: Vec<TxHash>,
    pub cancelled: bool,
}

/// Traces every transaction of the reference block at `height` on both
/// endpoints and compares them.
///
/// A differing transaction count is reported for the block without stopping
/// the run. Nothing is compared if either block is empty. A failed trace
/// fetch only skips that transaction.
pub async fn compare_block_traces<A, B>(
    pair: &EndpointPair<A, B>,
    height: u64,
    cancel: &CancellationToken,
    reporter: &mut impl Reporter,
) -> Result<TraceRunSummary, DriverError>
where
    A: ChainDataSource,
    B: ChainDataSource,
{
    let (a, b) = pair.headers(height).await?;
    let mut summary = TraceRunSummary {
        height,
        counts_match: a.transactions.len() == b.transactions.len(),
        ..Default::default()
    };

    if let Some(record) = block::transaction_count_mismatch(&a, &b) {
        warn!(
            height,
            reference = a.transactions.len(),
            candidate = b.transactions.len(),
            "transaction count mismatch"
        );
        report::forward(reporter, Unit::Block { height }, &[record]);
    }

    if a.transactions.is_empty() || b.transactions.is_empty() {
        info!(height, "block has no transactions to trace");
        return Ok(summary);
    }

    info!(height, txs = a.transactions.len(), "comparing traces");
    for tx_hash in a.transactions {
        if cancel.is_cancelled() {
            summary.cancelled = true;
            break;
        }
        let unit = Unit::Trace { tx_hash };
        match pair.compare_trace(tx_hash).await {
            Ok(records) => {
                summary.compared += 1;
                if report::forward(reporter, unit, &records) {
                    warn!(%tx_hash, mismatches = records.len(), "trace mismatch");
                    summary.mismatching.push(tx_hash);
                }
            }
            Err(e) => {
                error!(%tx_hash, error = %e, "could not compare traces");
                reporter.failure(unit, &e);
                summary.failed.push(tx_hash);
            }
        }
    }

    Ok(summary)
}

use alloy::primitives::{BlockHash, TxHash};
use futures::TryFutureExt as _;
use tracing::debug;

use crate::error::{DriverError, Endpoint};
use crate::mismatch::MismatchRecord;
use crate::report::{self, Reporter, Unit};
use crate::source::ChainDataSource;
use crate::views::{HeaderView, ReceiptView, TraceView};
use crate::{block, receipt, trace};

/// The reference and the candidate endpoint.
///
/// Each paired fetch issues both requests concurrently and only returns once
/// both records are available.
#[derive(Clone, Debug)]
pub struct EndpointPair<A, B> {
    pub reference: A,
    pub candidate: B,
}

/// The full comparison of one block height.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockComparison {
    pub height: u64,
    pub reference_hash: BlockHash,
    pub candidate_hash: BlockHash,
    pub header: Vec<MismatchRecord>,
    /// Receipt diffs keyed by the transaction hash, in reference block order.
    /// Only populated when the receipts roots differ.
    pub receipts: Vec<(TxHash, Vec<MismatchRecord>)>,
}

impl BlockComparison {
    /// No field of the header or of any compared receipt differs.
    pub fn is_match(&self) -> bool {
        self.header.is_empty() && self.receipts.iter().all(|(_, records)| records.is_empty())
    }

    /// Forwards the non-empty mismatch sequences to `reporter`.
    pub fn report(&self, reporter: &mut impl Reporter) {
        report::forward(reporter, Unit::Block { height: self.height }, &self.header);
        for (tx_hash, records) in &self.receipts {
            report::forward(
                reporter,
                Unit::Receipt {
                    height: self.height,
                    tx_hash: *tx_hash,
                },
                records,
            );
        }
    }
}

impl<A, B> EndpointPair<A, B>
where
    A: ChainDataSource,
    B: ChainDataSource,
{
    pub fn new(reference: A, candidate: B) -> Self {
        Self {
            reference,
            candidate,
        }
    }

    /// The highest block both endpoints know about.
    pub async fn working_height(&self) -> Result<u64, DriverError> {
        let (a, b) = futures::try_join!(
            self.reference
                .latest_height()
                .map_err(DriverError::fetch(Endpoint::Reference)),
            self.candidate
                .latest_height()
                .map_err(DriverError::fetch(Endpoint::Candidate)),
        )?;
        debug!(reference = a, candidate = b, "endpoint heads");
        Ok(a.min(b))
    }

    pub async fn headers(&self, height: u64) -> Result<(HeaderView, HeaderView), DriverError> {
        futures::try_join!(
            self.reference
                .fetch_header(height)
                .map_err(DriverError::fetch(Endpoint::Reference)),
            self.candidate
                .fetch_header(height)
                .map_err(DriverError::fetch(Endpoint::Candidate)),
        )
    }

    pub async fn receipts(
        &self,
        tx_hash: TxHash,
    ) -> Result<(ReceiptView, ReceiptView), DriverError> {
        futures::try_join!(
            self.reference
                .fetch_receipt(tx_hash)
                .map_err(DriverError::fetch(Endpoint::Reference)),
            self.candidate
                .fetch_receipt(tx_hash)
                .map_err(DriverError::fetch(Endpoint::Candidate)),
        )
    }

    pub async fn traces(&self, tx_hash: TxHash) -> Result<(TraceView, TraceView), DriverError> {
        futures::try_join!(
            self.reference
                .fetch_trace(tx_hash)
                .map_err(DriverError::fetch(Endpoint::Reference)),
            self.candidate
                .fetch_trace(tx_hash)
                .map_err(DriverError::fetch(Endpoint::Candidate)),
        )
    }

    /// Whether both endpoints report the same canonical hash at `height`.
    pub async fn agrees_at(&self, height: u64) -> Result<bool, DriverError> {
        let (a, b) = self.headers(height).await?;
        let agrees = block::hashes_agree(&a, &b);
        debug!(height, agrees, "probe");
        Ok(agrees)
    }

    /// Compares the headers at `height` and, if the receipts roots differ,
    /// the receipt of every transaction of the reference block.
    ///
    /// Any failed fetch fails the whole height.
    pub async fn compare_block(&self, height: u64) -> Result<BlockComparison, DriverError> {
        let (a, b) = self.headers(height).await?;
        let header = block::compare(&a, &b);

        let mut receipts = Vec::new();
        if block::needs_receipt_cascade(&a, &b) {
            debug!(height, txs = a.transactions.len(), "receipts root differs, comparing receipts");
            for tx_hash in &a.transactions {
                let (receipt_a, receipt_b) = self.receipts(*tx_hash).await?;
                receipts.push((*tx_hash, receipt::compare(&receipt_a, &receipt_b)));
            }
        }

        Ok(BlockComparison {
            height,
            reference_hash: a.hash,
            candidate_hash: b.hash,
            header,
            receipts,
        })
    }

    pub async fn compare_trace(&self, tx_hash: TxHash) -> Result<Vec<MismatchRecord>, DriverError> {
        let (a, b) = self.traces(tx_hash).await?;
        Ok(trace::compare(&a, &b))
    }
}

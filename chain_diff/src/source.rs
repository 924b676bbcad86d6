use std::future::Future;
use std::sync::Arc;

use alloy::primitives::TxHash;

use crate::error::FetchError;
use crate::views::{HeaderView, ReceiptView, TraceView};

/// Read access to the chain data of a single endpoint.
///
/// Implementations must not cache: every call observes the endpoint's
/// current state.
pub trait ChainDataSource {
    /// Height of the latest block known to the endpoint.
    fn latest_height(&self) -> impl Future<Output = Result<u64, FetchError>> + Send;

    fn fetch_header(
        &self,
        height: u64,
    ) -> impl Future<Output = Result<HeaderView, FetchError>> + Send;

    fn fetch_receipt(
        &self,
        tx_hash: TxHash,
    ) -> impl Future<Output = Result<ReceiptView, FetchError>> + Send;

    fn fetch_trace(
        &self,
        tx_hash: TxHash,
    ) -> impl Future<Output = Result<TraceView, FetchError>> + Send;
}

impl<T: ChainDataSource> ChainDataSource for &T {
    fn latest_height(&self) -> impl Future<Output = Result<u64, FetchError>> + Send {
        (**self).latest_height()
    }

    fn fetch_header(
        &self,
        height: u64,
    ) -> impl Future<Output = Result<HeaderView, FetchError>> + Send {
        (**self).fetch_header(height)
    }

    fn fetch_receipt(
        &self,
        tx_hash: TxHash,
    ) -> impl Future<Output = Result<ReceiptView, FetchError>> + Send {
        (**self).fetch_receipt(tx_hash)
    }

    fn fetch_trace(
        &self,
        tx_hash: TxHash,
    ) -> impl Future<Output = Result<TraceView, FetchError>> + Send {
        (**self).fetch_trace(tx_hash)
    }
}

impl<T: ChainDataSource> ChainDataSource for Arc<T> {
    fn latest_height(&self) -> impl Future<Output = Result<u64, FetchError>> + Send {
        (**self).latest_height()
    }

    fn fetch_header(
        &self,
        height: u64,
    ) -> impl Future<Output = Result<HeaderView, FetchError>> + Send {
        (**self).fetch_header(height)
    }

    fn fetch_receipt(
        &self,
        tx_hash: TxHash,
    ) -> impl Future<Output = Result<ReceiptView, FetchError>> + Send {
        (**self).fetch_receipt(tx_hash)
    }

    fn fetch_trace(
        &self,
        tx_hash: TxHash,
    ) -> impl Future<Output = Result<TraceView, FetchError>> + Send {
        (**self).fetch_trace(tx_hash)
    }
}

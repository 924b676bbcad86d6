use std::ops::Deref;
use std::sync::Arc;

use alloy::primitives::TxHash;
use alloy::{providers::Provider, transports::Transport};
use chain_diff::views::{HeaderView, ReceiptView, TraceView};
use chain_diff::{ChainDataSource, FetchError};
use tokio::sync::{Semaphore, SemaphorePermit};

use crate::rpc;

pub const MAX_NUMBER_OF_PARALLEL_REQUESTS: usize = 128;

/// A [`ChainDataSource`] backed by an alloy provider.
///
/// Nothing is cached: every call goes to the endpoint.
pub struct RpcSource<ProviderT, TransportT> {
    provider: Arc<ProviderT>,
    // `Alloy` provider is using `Reqwest` http client under the hood. It has an unbounded
    // connection pool. We need to limit the number of parallel connections by ourselves, so we
    // use semaphore to count the number of parallel RPC requests happening at any moment.
    semaphore: Arc<Semaphore>,
    _phantom: std::marker::PhantomData<TransportT>,
}

pub struct ProviderGuard<'a, ProviderT> {
    provider: Arc<ProviderT>,
    _permit: SemaphorePermit<'a>,
}

impl<ProviderT> Deref for ProviderGuard<'_, ProviderT> {
    type Target = ProviderT;

    fn deref(&self) -> &Self::Target {
        &self.provider
    }
}

impl<ProviderT, TransportT> RpcSource<ProviderT, TransportT>
where
    ProviderT: Provider<TransportT>,
    TransportT: Transport + Clone,
{
    pub fn new(provider: ProviderT, max_parallel_requests: usize) -> Self {
        Self {
            provider: provider.into(),
            semaphore: Arc::new(Semaphore::new(max_parallel_requests.max(1))),
            _phantom: std::marker::PhantomData,
        }
    }

    pub async fn get_provider(&self) -> Result<ProviderGuard<'_, ProviderT>, FetchError> {
        Ok(ProviderGuard {
            provider: self.provider.clone(),
            _permit: self
                .semaphore
                .acquire()
                .await
                .map_err(|e| FetchError::Network(e.to_string()))?,
        })
    }
}

impl<ProviderT, TransportT> ChainDataSource for RpcSource<ProviderT, TransportT>
where
    ProviderT: Provider<TransportT>,
    TransportT: Transport + Clone,
{
    async fn latest_height(&self) -> Result<u64, FetchError> {
        rpc::latest_height(&*self.get_provider().await?).await
    }

    async fn fetch_header(&self, height: u64) -> Result<HeaderView, FetchError> {
        rpc::header(&*self.get_provider().await?, height).await
    }

    async fn fetch_receipt(&self, tx_hash: TxHash) -> Result<ReceiptView, FetchError> {
        rpc::receipt(&*self.get_provider().await?, tx_hash).await
    }

    async fn fetch_trace(&self, tx_hash: TxHash) -> Result<TraceView, FetchError> {
        rpc::trace(&*self.get_provider().await?, tx_hash).await
    }
}

#[cfg(test)]
mod tests {
    use alloy::primitives::B256;
    use chain_diff::finder::find_divergence;
    use chain_diff::{Collect, EndpointPair};
    use tokio_util::sync::CancellationToken;

    use super::*;
    use crate::rpc::tests::{block_json, Canned};

    #[tokio::test]
    async fn limits_parallel_requests() {
        let source = RpcSource::new(Canned::new().into_provider(), 1);
        let first = source.get_provider().await.unwrap();
        assert_eq!(source.semaphore.available_permits(), 0);
        drop(first);
        assert_eq!(source.semaphore.available_permits(), 1);
    }

    #[tokio::test]
    async fn identical_endpoints_do_not_diverge() {
        let endpoint = || {
            let provider = Canned::new()
                .respond("eth_blockNumber", "0x10")
                .respond("eth_getBlockByNumber", block_json(3))
                .into_provider();
            RpcSource::new(provider, MAX_NUMBER_OF_PARALLEL_REQUESTS)
        };
        let pair = EndpointPair::new(endpoint(), endpoint());
        assert_eq!(pair.working_height().await.unwrap(), 16);

        let mut reporter = Collect::new();
        let divergence = find_divergence(&pair, 0..=16, &CancellationToken::new(), &mut reporter)
            .await
            .unwrap();
        assert_eq!(divergence.bisection.height, 17);
        assert!(reporter.mismatches.is_empty());
    }

    #[tokio::test]
    async fn diverging_endpoints_report_the_header_diff() {
        let mut other = block_json(3);
        other["hash"] = serde_json::to_value(B256::repeat_byte(0xbb)).unwrap();
        other["gasUsed"] = "0x5209".into();

        let reference = RpcSource::new(
            Canned::new()
                .respond("eth_getBlockByNumber", block_json(3))
                .into_provider(),
            4,
        );
        let candidate = RpcSource::new(
            Canned::new()
                .respond("eth_getBlockByNumber", other)
                .into_provider(),
            4,
        );
        let pair = EndpointPair::new(reference, candidate);

        let mut reporter = Collect::new();
        let divergence = find_divergence(&pair, 0..=16, &CancellationToken::new(), &mut reporter)
            .await
            .unwrap();
        // Every height answers with the same canned block.
        assert_eq!(divergence.bisection.height, 0);
        let paths = reporter
            .mismatches
            .iter()
            .flat_map(|(_, records)| records)
            .map(|r| r.field_path.as_str())
            .collect::<Vec<_>>();
        assert_eq!(paths, ["gasUsed"]);
    }
}

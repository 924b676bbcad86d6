//! The JSON-RPC calls backing a [`ChainDataSource`](chain_diff::ChainDataSource).

use alloy::{
    primitives::TxHash,
    providers::Provider,
    rpc::types::BlockTransactionsKind,
    transports::{RpcError, Transport, TransportError},
};
use chain_diff::views::{HeaderView, ReceiptView, TraceView};
use chain_diff::FetchError;

mod wire;

/// Height of the latest block of the endpoint.
pub async fn latest_height<ProviderT, TransportT>(provider: &ProviderT) -> Result<u64, FetchError>
where
    ProviderT: Provider<TransportT>,
    TransportT: Transport + Clone,
{
    provider.get_block_number().await.map_err(fetch_error)
}

/// Fetches the header of block `height` with transaction hashes only.
pub async fn header<ProviderT, TransportT>(
    provider: &ProviderT,
    height: u64,
) -> Result<HeaderView, FetchError>
where
    ProviderT: Provider<TransportT>,
    TransportT: Transport + Clone,
{
    let block = provider
        .get_block(height.into(), BlockTransactionsKind::Hashes)
        .await
        .map_err(fetch_error)?
        .ok_or_else(|| FetchError::NotFound(format!("block {height}")))?;
    wire::header_view(block)
}

pub async fn receipt<ProviderT, TransportT>(
    provider: &ProviderT,
    tx_hash: TxHash,
) -> Result<ReceiptView, FetchError>
where
    ProviderT: Provider<TransportT>,
    TransportT: Transport + Clone,
{
    let receipt = provider
        .get_transaction_receipt(tx_hash)
        .await
        .map_err(fetch_error)?
        .ok_or_else(|| FetchError::NotFound(format!("receipt of {tx_hash}")))?;
    wire::receipt_view(receipt)
}

/// Opcode level trace of `tx_hash`, using the node's default tracer.
pub async fn trace<ProviderT, TransportT>(
    provider: &ProviderT,
    tx_hash: TxHash,
) -> Result<TraceView, FetchError>
where
    ProviderT: Provider<TransportT>,
    TransportT: Transport + Clone,
{
    provider
        .raw_request::<_, Option<wire::Trace>>("debug_traceTransaction".into(), (tx_hash,))
        .await
        .map_err(fetch_error)?
        .map(|wire::Trace(frame)| wire::trace_view(tx_hash, frame))
        .ok_or_else(|| FetchError::NotFound(format!("trace of {tx_hash}")))
}

/// Sorts a failed call into the fetch error taxonomy. An error object in
/// the response is a protocol error whatever its code.
pub fn fetch_error(e: TransportError) -> FetchError {
    match e {
        RpcError::ErrorResp(payload) => FetchError::Protocol {
            code: payload.code,
            message: payload.message.to_string(),
        },
        RpcError::NullResp => FetchError::NotFound("null response".into()),
        RpcError::SerError(e) => FetchError::Malformed(e.to_string()),
        RpcError::DeserError { err, .. } => FetchError::Malformed(err.to_string()),
        RpcError::Transport(kind) => FetchError::Network(kind.to_string()),
        other => FetchError::Network(other.to_string()),
    }
}

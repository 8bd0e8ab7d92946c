//! Blockchain RPC client with timeout and error handling.
//!
//! # Responsibilities
//! - Connect to the JSON-RPC endpoint
//! - Query chain state (block number, latest header, receipts, nonces)
//! - Broadcast signed transaction envelopes
//! - Bound every call with the configured timeout and classify failures
//!
//! Calls are attempted once. Retrying is the caller's decision.

use alloy::eips::eip2718::Encodable2718;
use alloy::eips::BlockNumberOrTag;
use alloy::consensus::TxEnvelope;
use alloy::primitives::{Address, TxHash};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;
use std::future::IntoFuture;
use std::time::Duration;
use tokio::time::timeout;

use crate::blockchain::transaction::ReceiptSource;
use crate::blockchain::types::{
    BlockInfo, BlockchainConfig, BlockchainError, BlockchainResult, ChainId, TxReceipt,
};
use crate::observability::metrics;

/// Blockchain RPC client wrapper.
#[derive(Clone)]
pub struct BlockchainClient {
    provider: DynProvider,
    /// Configuration.
    config: BlockchainConfig,
    /// Request timeout duration.
    timeout_duration: Duration,
}

impl BlockchainClient {
    /// Create a new blockchain client.
    ///
    /// When the configuration pins a chain ID it is verified against the node.
    /// A node that cannot be reached yet is tolerated; a node on the wrong
    /// chain is not.
    pub async fn new(config: BlockchainConfig) -> BlockchainResult<Self> {
        let timeout_duration = Duration::from_secs(config.rpc_timeout_secs);

        let url: url::Url = config.rpc_url.parse().map_err(|e| {
            BlockchainError::InvalidConfig(format!("Invalid RPC URL '{}': {}", config.rpc_url, e))
        })?;
        let provider = ProviderBuilder::new().connect_http(url).erased();

        let client = Self {
            provider,
            config: config.clone(),
            timeout_duration,
        };

        match client.verify_chain_id().await {
            Ok(()) => {
                tracing::info!(
                    rpc_url = %config.rpc_url,
                    chain_id = ?config.chain_id,
                    "Blockchain client initialized"
                );
            }
            Err(e @ BlockchainError::ChainMismatch { .. }) => return Err(e),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    "Blockchain client initialized but chain verification failed"
                );
            }
        }

        Ok(client)
    }

    /// Run one RPC future under the configured timeout and classify its error.
    pub(crate) async fn rpc<T, E, F>(
        &self,
        method: &'static str,
        call: F,
        classify: fn(E) -> BlockchainError,
    ) -> BlockchainResult<T>
    where
        F: IntoFuture<Output = Result<T, E>>,
    {
        let outcome = match timeout(self.timeout_duration, call).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => Err(classify(e)),
            Err(_) => Err(BlockchainError::Timeout(self.config.rpc_timeout_secs)),
        };

        metrics::record_rpc_call(method, outcome.is_ok());
        if let Err(e) = &outcome {
            if e.is_transient() {
                tracing::warn!(method = method, error = %e, "RPC call failed");
            } else {
                tracing::debug!(method = method, error = %e, "RPC call rejected");
            }
        }
        outcome
    }

    /// Verify the connected chain ID matches configuration.
    pub async fn verify_chain_id(&self) -> BlockchainResult<()> {
        let Some(expected) = self.config.chain_id else {
            return Ok(());
        };
        let chain_id = self.get_chain_id().await?;
        if chain_id.0 != expected {
            return Err(BlockchainError::ChainMismatch {
                expected,
                actual: chain_id.0,
            });
        }
        Ok(())
    }

    /// Get the chain ID from the RPC.
    pub async fn get_chain_id(&self) -> BlockchainResult<ChainId> {
        self.rpc("eth_chainId", self.provider.get_chain_id(), BlockchainError::from_transport)
            .await
            .map(ChainId)
    }

    /// Get the latest block number.
    pub async fn get_block_number(&self) -> BlockchainResult<u64> {
        self.rpc("eth_blockNumber", self.provider.get_block_number(), BlockchainError::from_transport)
            .await
    }

    /// Number and timestamp of the latest block.
    pub async fn latest_block(&self) -> BlockchainResult<BlockInfo> {
        let block = self
            .rpc(
                "eth_getBlockByNumber",
                self.provider.get_block_by_number(BlockNumberOrTag::Latest),
                BlockchainError::from_transport,
            )
            .await?
            .ok_or_else(|| BlockchainError::InvalidResponse("latest block not available".to_string()))?;

        Ok(BlockInfo {
            number: block.header.number,
            timestamp: block.header.timestamp,
        })
    }

    /// Nonce for the next transaction from `address`, counting pending ones.
    pub async fn get_pending_nonce(&self, address: Address) -> BlockchainResult<u64> {
        self.rpc(
            "eth_getTransactionCount",
            self.provider.get_transaction_count(address).pending(),
            BlockchainError::from_transport,
        )
        .await
    }

    /// Estimate gas for a transaction. Contract reverts surface as `RemoteRevert`.
    pub async fn estimate_gas(&self, tx: TransactionRequest) -> BlockchainResult<u64> {
        self.rpc("eth_estimateGas", self.provider.estimate_gas(tx), BlockchainError::from_transport)
            .await
    }

    /// Get current gas price in wei.
    pub async fn get_gas_price(&self) -> BlockchainResult<u128> {
        self.rpc("eth_gasPrice", self.provider.get_gas_price(), BlockchainError::from_transport)
            .await
    }

    /// Broadcast a signed envelope.
    ///
    /// A node that answers with an error rejected the transaction itself
    /// (nonce, funds, fee), so that maps to `Submission`.
    pub async fn send_envelope(&self, envelope: TxEnvelope) -> BlockchainResult<TxHash> {
        let encoded = envelope.encoded_2718();
        let pending = self
            .rpc(
                "eth_sendRawTransaction",
                self.provider.send_raw_transaction(&encoded),
                |e: alloy::transports::TransportError| match BlockchainError::from_transport(e) {
                    BlockchainError::RemoteRevert(msg) => BlockchainError::Submission(msg),
                    other => other,
                },
            )
            .await?;
        Ok(*pending.tx_hash())
    }

    /// Get a transaction receipt by hash.
    pub async fn get_transaction_receipt(&self, tx_hash: TxHash) -> BlockchainResult<Option<TxReceipt>> {
        let receipt = self
            .rpc(
                "eth_getTransactionReceipt",
                self.provider.get_transaction_receipt(tx_hash),
                BlockchainError::from_transport,
            )
            .await?;
        Ok(receipt.as_ref().map(TxReceipt::from))
    }

    /// Get the underlying provider.
    pub fn provider(&self) -> DynProvider {
        self.provider.clone()
    }

    /// Get the configuration.
    pub fn config(&self) -> &BlockchainConfig {
        &self.config
    }
}

#[async_trait]
impl ReceiptSource for BlockchainClient {
    async fn transaction_receipt(&self, tx_hash: TxHash) -> BlockchainResult<Option<TxReceipt>> {
        self.get_transaction_receipt(tx_hash).await
    }
}

impl std::fmt::Debug for BlockchainClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlockchainClient")
            .field("rpc_url", &self.config.rpc_url)
            .field("chain_id", &self.config.chain_id)
            .field("timeout_secs", &self.config.rpc_timeout_secs)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> BlockchainConfig {
        BlockchainConfig {
            // Nothing listens on port 9 (discard); connections are refused fast.
            rpc_url: "http://127.0.0.1:9".to_string(),
            chain_id: Some(1337),
            rpc_timeout_secs: 2,
            contract_address: "0x0202020000000000000000000000000000000000".to_string(),
        }
    }

    #[tokio::test]
    async fn test_client_creation_tolerates_unreachable_node() {
        let result = BlockchainClient::new(test_config()).await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_url_rejected() {
        let mut config = test_config();
        config.rpc_url = "not a url".to_string();
        let err = BlockchainClient::new(config).await.unwrap_err();
        assert!(matches!(err, BlockchainError::InvalidConfig(_)));
        assert!(!err.is_transient());
        assert!(err.to_string().contains("Invalid RPC URL"));
    }

    #[tokio::test]
    async fn test_unreachable_node_is_transient() {
        let client = BlockchainClient::new(test_config()).await.unwrap();
        let err = client.get_block_number().await.unwrap_err();
        assert!(err.is_transient(), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn test_debug_hides_provider() {
        let client = BlockchainClient::new(test_config()).await.unwrap();
        let debug = format!("{:?}", client);
        assert!(debug.contains("127.0.0.1:9"));
    }
}

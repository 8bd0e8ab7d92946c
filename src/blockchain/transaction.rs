//! Transaction building, signing, and confirmation monitoring.
//!
//! # Responsibilities
//! - Build and sign contract calls for a wallet
//! - Broadcast them once (no retry)
//! - Poll for the receipt until it is mined, cancelled or past its deadline
//! - Treat a mined-but-reverted receipt as a failure

use alloy::consensus::TxEnvelope;
use alloy::network::TransactionBuilder;
use alloy::primitives::{Address, Bytes, TxHash};
use alloy::rpc::types::TransactionRequest;
use async_trait::async_trait;

use crate::blockchain::client::BlockchainClient;
use crate::blockchain::types::{BlockchainError, BlockchainResult, PendingTx, TxReceipt};
use crate::blockchain::wallet::Wallet;
use crate::observability::metrics;
use crate::resilience::{poll_until, PollPolicy, WaitControl};

/// Anything that can look up transaction receipts.
#[async_trait]
pub trait ReceiptSource: Send + Sync {
    /// `Ok(None)` while the transaction is not mined yet.
    async fn transaction_receipt(&self, tx_hash: TxHash) -> BlockchainResult<Option<TxReceipt>>;
}

/// The node calls a submission needs.
#[async_trait]
pub trait TxTransport: Send + Sync {
    async fn pending_nonce(&self, address: Address) -> BlockchainResult<u64>;

    async fn estimate_gas(&self, tx: TransactionRequest) -> BlockchainResult<u64>;

    async fn gas_price(&self) -> BlockchainResult<u128>;

    async fn send_envelope(&self, envelope: TxEnvelope) -> BlockchainResult<TxHash>;
}

#[async_trait]
impl TxTransport for BlockchainClient {
    async fn pending_nonce(&self, address: Address) -> BlockchainResult<u64> {
        self.get_pending_nonce(address).await
    }

    async fn estimate_gas(&self, tx: TransactionRequest) -> BlockchainResult<u64> {
        BlockchainClient::estimate_gas(self, tx).await
    }

    async fn gas_price(&self) -> BlockchainResult<u128> {
        self.get_gas_price().await
    }

    async fn send_envelope(&self, envelope: TxEnvelope) -> BlockchainResult<TxHash> {
        BlockchainClient::send_envelope(self, envelope).await
    }
}

/// Signs and broadcasts contract calls.
#[derive(Debug, Clone)]
pub struct TxBuilder<T = BlockchainClient> {
    client: T,
}

impl<T: TxTransport> TxBuilder<T> {
    /// Create a new transaction builder.
    pub fn new(client: T) -> Self {
        Self { client }
    }

    /// Sign `input` as a call to `to` from `wallet` and broadcast it.
    ///
    /// The wallet's submission lock is held from nonce lookup until the node
    /// has accepted the raw transaction.
    pub async fn submit(&self, wallet: &Wallet, to: Address, input: Bytes) -> BlockchainResult<PendingTx> {
        let _guard = wallet.lock_submission().await;

        let from = wallet.address();
        let nonce = self.client.pending_nonce(from).await?;

        let request = TransactionRequest::default()
            .with_from(from)
            .with_to(to)
            .with_input(input)
            .with_nonce(nonce)
            .with_chain_id(wallet.chain_id());

        let gas_limit = self.client.estimate_gas(request.clone()).await?;
        let gas_price = self.client.gas_price().await?;
        let request = request.with_gas_limit(gas_limit).with_gas_price(gas_price);

        let envelope = request
            .build(&wallet.ethereum_wallet())
            .await
            .map_err(|e| BlockchainError::Submission(format!("Failed to sign transaction: {}", e)))?;

        let tx_hash = self.client.send_envelope(envelope).await?;

        tracing::info!(
            tx_hash = %tx_hash,
            from = %from,
            nonce = nonce,
            gas_limit = gas_limit,
            "Transaction broadcast"
        );

        Ok(PendingTx { tx_hash })
    }
}

/// Wait for a transaction to be mined.
///
/// Returns `ExecutionReverted` when the receipt reports failure.
/// Cancellation and deadline expiry return no receipt.
pub async fn await_confirmation<S>(
    source: &S,
    pending: PendingTx,
    control: &WaitControl,
    policy: &PollPolicy,
) -> BlockchainResult<TxReceipt>
where
    S: ReceiptSource + ?Sized,
{
    let tx_hash = pending.tx_hash;
    let receipt = poll_until(control, policy, || async move {
        let receipt = source.transaction_receipt(tx_hash).await?;
        if receipt.is_none() {
            tracing::debug!(tx_hash = %tx_hash, "Transaction pending");
        }
        Ok(receipt)
    })
    .await;

    let receipt = match receipt {
        Ok(receipt) => receipt,
        Err(e) => {
            tracing::warn!(tx_hash = %tx_hash, error = %e, "Stopped waiting for transaction");
            return Err(e);
        }
    };

    if !receipt.success {
        tracing::warn!(tx_hash = %tx_hash, block = ?receipt.block_number, "Transaction reverted");
        return Err(BlockchainError::ExecutionReverted { tx_hash });
    }

    tracing::debug!(tx_hash = %tx_hash, block = ?receipt.block_number, "Transaction confirmed");
    Ok(receipt)
}

/// Record the outcome of a submitted call.
pub(crate) fn record_outcome<T>(call: &'static str, result: &BlockchainResult<T>) {
    let outcome = match result {
        Ok(_) => "confirmed",
        Err(BlockchainError::ExecutionReverted { .. }) => "reverted",
        Err(BlockchainError::DeadlineExceeded) => "timeout",
        Err(BlockchainError::Cancelled) => "cancelled",
        Err(_) => "failed",
    };
    metrics::record_transaction(call, outcome);
}

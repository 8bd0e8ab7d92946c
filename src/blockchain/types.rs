//! Chain-specific types and error definitions.

use alloy::primitives::{Log, TxHash};
use alloy::transports::TransportError;
use thiserror::Error;

// Re-export BlockchainConfig from config module to avoid duplication
pub use crate::config::schema::BlockchainConfig;

/// Chain ID type for strong typing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChainId(pub u64);

impl From<u64> for ChainId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl From<ChainId> for u64 {
    fn from(id: ChainId) -> Self {
        id.0
    }
}

/// Errors that can occur during blockchain operations.
#[derive(Debug, Error)]
pub enum BlockchainError {
    /// RPC call failed to reach the ledger.
    #[error("RPC error: {0}")]
    TransientNetwork(String),

    /// A single RPC request timed out.
    #[error("RPC timeout after {0} seconds")]
    Timeout(u64),

    /// A call or gas estimate was rejected by contract logic.
    #[error("Remote revert: {0}")]
    RemoteRevert(String),

    /// Signing or broadcasting a transaction failed.
    #[error("Submission failed: {0}")]
    Submission(String),

    /// Transaction was mined but its receipt reports failure.
    #[error("Transaction {tx_hash} mined but execution reverted")]
    ExecutionReverted { tx_hash: TxHash },

    /// No withdrawal record exists for the party.
    #[error("no pending withdrawals")]
    NoPendingWithdrawals,

    /// A bounded wait reached its deadline.
    #[error("deadline exceeded")]
    DeadlineExceeded,

    /// A bounded wait was cancelled by the caller.
    #[error("operation cancelled")]
    Cancelled,

    /// The ledger returned data outside the expected domain.
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// A connection setting (RPC URL, contract address) cannot be used.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Invalid private key format or derivation error.
    #[error("Wallet error: {0}")]
    Wallet(String),

    /// Chain configuration mismatch.
    #[error("Chain ID mismatch: expected {expected}, got {actual}")]
    ChainMismatch { expected: u64, actual: u64 },
}

impl BlockchainError {
    /// Whether the caller may reasonably retry the operation as-is.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientNetwork(_) | Self::Timeout(_))
    }

    /// Classify a transport failure.
    ///
    /// A JSON-RPC error response means the node evaluated the request and
    /// refused it (for `eth_call`/`eth_estimateGas` that is a contract revert).
    /// Anything else never reached a verdict.
    pub fn from_transport(err: TransportError) -> Self {
        match err.as_error_resp() {
            Some(payload) => Self::RemoteRevert(payload.message.to_string()),
            None => Self::TransientNetwork(err.to_string()),
        }
    }

    /// Classify a failure returned by a generated contract call.
    pub fn from_contract(err: alloy::contract::Error) -> Self {
        match err {
            alloy::contract::Error::TransportError(e) => Self::from_transport(e),
            other => Self::InvalidResponse(other.to_string()),
        }
    }
}

/// Result type for blockchain operations.
pub type BlockchainResult<T> = Result<T, BlockchainError>;

/// Header fields of the latest block that callers care about.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockInfo {
    pub number: u64,
    pub timestamp: u64,
}

/// Handle to a broadcast transaction that has not been confirmed yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTx {
    pub tx_hash: TxHash,
}

/// The parts of a mined receipt the client inspects.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxReceipt {
    pub tx_hash: TxHash,
    pub block_number: Option<u64>,
    /// Receipt status flag; `false` means the transaction was mined but reverted.
    pub success: bool,
    pub logs: Vec<Log>,
}

impl From<&alloy::rpc::types::TransactionReceipt> for TxReceipt {
    fn from(receipt: &alloy::rpc::types::TransactionReceipt) -> Self {
        Self {
            tx_hash: receipt.transaction_hash,
            block_number: receipt.block_number,
            success: receipt.status(),
            logs: receipt.inner.logs().iter().map(|log| log.inner.clone()).collect(),
        }
    }
}

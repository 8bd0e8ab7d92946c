//! Blockchain integration subsystem.
//!
//! # Data Flow
//! ```text
//! Keystore file or private key
//!     → wallet.rs (key loading, submission lock)
//!     → client.rs (RPC connection with timeouts)
//!     → transaction.rs (build, sign, broadcast, confirm)
//! ```
//!
//! # Security Constraints
//! - Never log private keys or passwords
//! - All RPC calls have configurable timeouts
//! - Nothing is retried except receipt polling

pub mod client;
pub mod transaction;
pub mod types;
pub mod wallet;

pub use client::BlockchainClient;
pub use transaction::{await_confirmation, ReceiptSource, TxBuilder, TxTransport};
pub use types::{BlockInfo, BlockchainConfig, BlockchainError, BlockchainResult, ChainId, PendingTx, TxReceipt};
pub use wallet::Wallet;

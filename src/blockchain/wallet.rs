//! Wallet management and transaction signing.
//!
//! # Security
//! - Keys come from an encrypted JSON keystore or an environment variable
//! - Keys are never logged or serialized
//!
//! # Sequencing
//! The ledger accepts one transaction per nonce per account. Every clone of a
//! wallet shares one submission lock; submitters hold it across
//! "fetch nonce, sign, broadcast" so concurrent submissions from the same key
//! serialize instead of racing for a nonce.

use alloy::network::EthereumWallet;
use alloy::primitives::Address;
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::Signer;
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

use crate::blockchain::types::{BlockchainError, BlockchainResult};
use crate::config::schema::WalletConfig;

/// Environment variable carrying a raw hex private key.
pub const PRIVATE_KEY_ENV_VAR: &str = "ETH_PRIVATEKEY";

/// Wallet for transaction signing with per-key submission sequencing.
#[derive(Debug, Clone)]
pub struct Wallet {
    /// The underlying signer (private key).
    signer: PrivateKeySigner,
    /// Chain ID for EIP-155 replay protection.
    chain_id: u64,
    /// Held while a transaction for this key is being prepared and broadcast.
    submission: Arc<Mutex<()>>,
}

impl Wallet {
    /// Wrap an already constructed signer.
    pub fn from_signer(signer: PrivateKeySigner, chain_id: u64) -> Self {
        let signer = signer.with_chain_id(Some(chain_id));
        Self {
            signer,
            chain_id,
            submission: Arc::new(Mutex::new(())),
        }
    }

    /// Create a wallet from a hex-encoded private key string.
    ///
    /// # Arguments
    /// * `private_key_hex` - Hex string (with or without 0x prefix)
    /// * `chain_id` - Chain ID for transaction signing
    pub fn from_private_key(private_key_hex: &str, chain_id: u64) -> BlockchainResult<Self> {
        let key_hex = private_key_hex.strip_prefix("0x").unwrap_or(private_key_hex);

        let signer: PrivateKeySigner = key_hex
            .parse()
            .map_err(|e| BlockchainError::Wallet(format!("Invalid private key format: {}", e)))?;

        tracing::info!(
            address = %signer.address(),
            chain_id = chain_id,
            "Wallet initialized"
        );

        Ok(Self::from_signer(signer, chain_id))
    }

    /// Decrypt an encrypted JSON keystore file.
    pub fn from_keystore(path: &Path, password: &str, chain_id: u64) -> BlockchainResult<Self> {
        let signer = PrivateKeySigner::decrypt_keystore(path, password).map_err(|e| {
            BlockchainError::Wallet(format!(
                "Failed to decrypt keystore '{}': {}",
                path.display(),
                e
            ))
        })?;

        tracing::info!(
            address = %signer.address(),
            keystore = %path.display(),
            chain_id = chain_id,
            "Wallet decrypted from keystore"
        );

        Ok(Self::from_signer(signer, chain_id))
    }

    /// Load the wallet described by configuration.
    ///
    /// A keystore file takes precedence over a raw private key.
    pub fn from_config(config: &WalletConfig, chain_id: u64) -> BlockchainResult<Self> {
        if let Some(key_file) = &config.key_file {
            let password = config.password.as_deref().unwrap_or_default();
            return Self::from_keystore(Path::new(key_file), password, chain_id);
        }
        match &config.private_key {
            Some(key) => Self::from_private_key(key, chain_id),
            None => Err(BlockchainError::Wallet(format!(
                "No signing key configured (set ETH_KEY or {})",
                PRIVATE_KEY_ENV_VAR
            ))),
        }
    }

    /// Get the wallet's address.
    pub fn address(&self) -> Address {
        self.signer.address()
    }

    /// Get the chain ID this wallet is configured for.
    pub fn chain_id(&self) -> u64 {
        self.chain_id
    }

    /// Network wallet used by alloy to sign transaction envelopes.
    pub fn ethereum_wallet(&self) -> EthereumWallet {
        EthereumWallet::from(self.signer.clone())
    }

    /// Acquire the submission lock for this key.
    ///
    /// Hold the guard until the signed transaction has been broadcast.
    pub async fn lock_submission(&self) -> MutexGuard<'_, ()> {
        self.submission.lock().await
    }
}

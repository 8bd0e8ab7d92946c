//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the staking
//! client. All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the staking client.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct StakingConfig {
    /// Ledger connection and contract location.
    pub blockchain: BlockchainConfig,

    /// Signing key source.
    pub wallet: WalletConfig,

    /// Poll intervals and deadlines for bounded waits.
    pub polling: PollingConfig,

    /// One-shot operator actions performed by the main binary.
    pub operator: OperatorConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Blockchain connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BlockchainConfig {
    /// JSON-RPC endpoint URL.
    pub rpc_url: String,

    /// Expected chain ID. When unset the node's chain ID is trusted.
    pub chain_id: Option<u64>,

    /// RPC request timeout in seconds.
    pub rpc_timeout_secs: u64,

    /// Address of the StakingManager contract.
    pub contract_address: String,
}

impl Default for BlockchainConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8545".to_string(),
            chain_id: None,
            rpc_timeout_secs: 10,
            contract_address: String::new(),
        }
    }
}

/// Signing key configuration.
///
/// Never serialized back out; `password` and `private_key` are secrets.
#[derive(Clone, Deserialize, Default)]
#[serde(default)]
pub struct WalletConfig {
    /// Path to an encrypted JSON keystore.
    pub key_file: Option<String>,

    /// Keystore password.
    pub password: Option<String>,

    /// Raw hex private key, used when no keystore is configured.
    pub private_key: Option<String>,
}

impl Serialize for WalletConfig {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;
        let mut state = serializer.serialize_struct("WalletConfig", 1)?;
        state.serialize_field("key_file", &self.key_file)?;
        state.end()
    }
}

impl std::fmt::Debug for WalletConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WalletConfig")
            .field("key_file", &self.key_file)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Polling configuration shared by receipt confirmation and withdrawal waits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Base interval between polls in milliseconds.
    pub poll_interval_ms: u64,

    /// Upper bound on the interval when backoff is enabled.
    pub max_poll_interval_ms: u64,

    /// Grow the interval exponentially between polls.
    pub backoff: bool,

    /// Deadline for a submitted transaction to be mined, in seconds.
    pub confirmation_timeout_secs: u64,

    /// Read every entry of an enumeration at one block number.
    pub pin_enumeration_block: bool,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: 1000,
            max_poll_interval_ms: 8000,
            backoff: false,
            confirmation_timeout_secs: 60,
            pin_enumeration_block: true,
        }
    }
}

/// Operator actions. Each enabled action is one confirmed transaction.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct OperatorConfig {
    /// Update the withdrawal approval period.
    pub update_approval: bool,

    /// New approval period (`90`, `90s`, `15m`, `2h`).
    pub approval_period: Option<String>,

    /// Update the minimum self stake.
    pub update_min_stake: bool,

    /// New minimum self stake (decimal or 0x hex).
    pub min_stake: Option<String>,

    /// Transcoder addresses to slash.
    pub slashed: Vec<String>,
}

impl OperatorConfig {
    /// Whether any action needs a signing key.
    pub fn has_actions(&self) -> bool {
        self.update_approval || self.update_min_stake || !self.slashed.is_empty()
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Default filter directive when `RUST_LOG` is unset.
    pub log_level: String,

    /// Log line format.
    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "staking_client=info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}

#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Pretty,
    Compact,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = StakingConfig::default();
        assert_eq!(config.blockchain.rpc_url, "http://localhost:8545");
        assert_eq!(config.polling.poll_interval_ms, 1000);
        assert!(config.polling.pin_enumeration_block);
        assert!(!config.operator.has_actions());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: StakingConfig = toml::from_str(
            r#"
            [blockchain]
            contract_address = "0x0000000000000000000000000000000000000002"

            [polling]
            backoff = true

            [observability]
            log_format = "compact"
            "#,
        )
        .unwrap();

        assert_eq!(config.blockchain.rpc_timeout_secs, 10);
        assert!(config.polling.backoff);
        assert_eq!(config.polling.confirmation_timeout_secs, 60);
        assert_eq!(config.observability.log_format, LogFormat::Compact);
    }

    #[test]
    fn test_wallet_secrets_redacted() {
        let wallet = WalletConfig {
            key_file: Some("/keys/operator.json".into()),
            password: Some("hunter2".into()),
            private_key: Some("deadbeef".into()),
        };
        let debug = format!("{:?}", wallet);
        assert!(!debug.contains("hunter2"));
        assert!(!debug.contains("deadbeef"));

        let json = serde_json::to_string(&wallet).unwrap();
        assert!(json.contains("operator.json"));
        assert!(!json.contains("hunter2"));
    }

    #[test]
    fn test_operator_actions() {
        let config = OperatorConfig {
            slashed: vec!["0x0000000000000000000000000000000000000001".into()],
            ..OperatorConfig::default()
        };
        assert!(config.has_actions());
    }
}
